//! Image content parts and detail-mode token accounting.

use crate::{Error, ErrorContext, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest local image accepted for inline base64 encoding.
pub const IMAGE_SIZE_LIMIT: u64 = 20 * 1024 * 1024;

/// Extensions accepted by [`ImageUrl::from_file`].
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Tile edge in pixels.
pub const TILE_SIZE: u32 = 512;
/// Base cost of any image; the whole cost in `low` mode.
pub const BASE_IMAGE_TOKENS: u32 = 85;
/// Extra cost of every tile in `high` mode.
pub const TOKENS_PER_TILE: u32 = 170;
/// `high` mode fits the short side into this bound...
pub const HIGH_DETAIL_SHORT_SIDE: u32 = 768;
/// ...and the long side into this one.
pub const HIGH_DETAIL_LONG_SIDE: u32 = 2000;

/// Image resolution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    /// One fixed 512×512 tile.
    #[default]
    Low,
    /// Tiled at 512×512 granularity after fitting into 768×2000.
    High,
}

impl ImageDetail {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }

    /// Number of 512×512 tiles billed for an image of the given size.
    pub fn tile_count(&self, width: u32, height: u32) -> u32 {
        match self {
            Self::Low => 1,
            Self::High => {
                let (w, h) = fit_high_detail(width, height);
                if w == 0 || h == 0 {
                    return 0;
                }
                w.div_ceil(TILE_SIZE) * h.div_ceil(TILE_SIZE)
            }
        }
    }

    /// Estimated prompt tokens for an image of the given size.
    pub fn estimate_tokens(&self, width: u32, height: u32) -> u32 {
        match self {
            Self::Low => BASE_IMAGE_TOKENS,
            Self::High => BASE_IMAGE_TOKENS + TOKENS_PER_TILE * self.tile_count(width, height),
        }
    }
}

/// Downscale (never upscale) so the short side is at most 768 and the long side at most 2000,
/// preserving aspect ratio.
pub fn fit_high_detail(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let (long, short) = if width >= height {
        (width, height)
    } else {
        (height, width)
    };
    let scale = f64::min(
        1.0,
        f64::min(
            HIGH_DETAIL_LONG_SIDE as f64 / long as f64,
            HIGH_DETAIL_SHORT_SIDE as f64 / short as f64,
        ),
    );
    let w = ((width as f64 * scale).floor() as u32).max(1);
    let h = ((height as f64 * scale).floor() as u32).max(1);
    (w, h)
}

/// `image_url` content part payload: a remote URL or a `data:` URL with base64 content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(default)]
    pub detail: ImageDetail,
}

impl ImageUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            detail: ImageDetail::Low,
        }
    }

    pub fn with_detail(mut self, detail: ImageDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn is_inline(&self) -> bool {
        self.url.starts_with("data:")
    }

    /// Read a local image and inline it as a base64 `data:` URL.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        let media_type = media_type_for(&ext).ok_or_else(|| {
            Error::validation_with_context(
                format!("Unsupported image type: '{}'", ext),
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_details(format!("supported: {:?}", SUPPORTED_IMAGE_EXTENSIONS))
                    .with_source("image_encoder"),
            )
        })?;

        let size = std::fs::metadata(path)?.len();
        if size > IMAGE_SIZE_LIMIT {
            return Err(Error::validation_with_context(
                format!("Image too large: {} bytes (limit {})", size, IMAGE_SIZE_LIMIT),
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_source("image_encoder"),
            ));
        }

        let bytes = std::fs::read(path)?;
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(Self::new(format!("data:{};base64,{}", media_type, data)))
    }
}

fn media_type_for(ext: &str) -> Option<&'static str> {
    let mt = match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => return None,
    };
    Some(mt)
}
