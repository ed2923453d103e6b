use crate::client::core::Client;
use crate::jsonl::{ResultKind, CHAT_COMPLETIONS_URL, EMBEDDINGS_URL};
use crate::batch::DEFAULT_COMPLETION_WINDOW;
use crate::request::DEFAULT_MODEL;
use crate::transport::{HttpTransport, TransportConfig};
use crate::{CallContext, Error, ErrorContext, Result};
use keyring::Entry;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const KEYRING_SERVICE: &str = "ai-batch";
const KEYRING_USER: &str = "openai";

/// Endpoint every submitted batch targets. Fixed per client, not per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchEndpoint {
    #[default]
    ChatCompletions,
    Embeddings,
}

impl BatchEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            BatchEndpoint::ChatCompletions => CHAT_COMPLETIONS_URL,
            BatchEndpoint::Embeddings => EMBEDDINGS_URL,
        }
    }

    /// Result body shape produced by this endpoint.
    pub fn result_kind(&self) -> ResultKind {
        match self {
            BatchEndpoint::ChatCompletions => ResultKind::Completions,
            BatchEndpoint::Embeddings => ResultKind::Embeddings,
        }
    }
}

/// Resolved, immutable client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub batch_endpoint: BatchEndpoint,
    pub completion_window: String,
    /// Model used by [`Client::request`].
    pub default_model: String,
}

/// Builder for [`Client`].
///
/// Unset values fall back to the environment:
/// - API key: OS keyring (`ai-batch` / `openai`), then `OPENAI_API_KEY`
/// - `AI_BATCH_BASE_URL` (default `https://api.openai.com`)
/// - `AI_BATCH_HTTP_TIMEOUT_SECS` (default 60)
/// - `AI_PROXY_URL`
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Duration,
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Duration,
    proxy_url: Option<String>,
    batch_endpoint: BatchEndpoint,
    default_model: Option<String>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            pool_max_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            proxy_url: None,
            batch_endpoint: BatchEndpoint::default(),
            default_model: None,
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the service root, e.g. a mock server in tests.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Timeout for each JSON round trip (job calls, file metadata, chat completions).
    ///
    /// File uploads, result downloads and streamed completions are bounded only by
    /// [`CallContext`] deadlines.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn pool_max_idle_per_host(mut self, n: usize) -> Self {
        self.pool_max_idle_per_host = n;
        self
    }

    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    pub fn batch_endpoint(mut self, endpoint: BatchEndpoint) -> Self {
        self.batch_endpoint = endpoint;
        self
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn build(self) -> Result<Client> {
        let api_key = self
            .api_key
            .or_else(key_from_keyring)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "API key required",
                    ErrorContext::new()
                        .with_field_path("api_key")
                        .with_details("set it on the builder, in the OS keyring, or OPENAI_API_KEY"),
                )
            })?;

        let base_url = self
            .base_url
            .or_else(|| std::env::var("AI_BATCH_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let parsed = url::Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid base URL '{}': {}", base_url, e),
                ErrorContext::new().with_field_path("base_url"),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                format!("Unsupported base URL scheme '{}'", parsed.scheme()),
                ErrorContext::new().with_field_path("base_url"),
            ));
        }

        let timeout = self
            .timeout
            .or_else(|| {
                std::env::var("AI_BATCH_HTTP_TIMEOUT_SECS")
                    .ok()?
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .map(Duration::from_secs)
            })
            .unwrap_or(DEFAULT_TIMEOUT);

        let proxy_url = self
            .proxy_url
            .or_else(|| std::env::var("AI_PROXY_URL").ok())
            .filter(|p| !p.trim().is_empty());

        let transport = HttpTransport::new(&TransportConfig {
            base_url: base_url.clone(),
            api_key,
            timeout,
            connect_timeout: self.connect_timeout,
            pool_max_idle_per_host: self.pool_max_idle_per_host,
            pool_idle_timeout: self.pool_idle_timeout,
            proxy_url,
        })?;

        let config = ClientConfig {
            base_url: transport.base_url().to_string(),
            timeout,
            connect_timeout: self.connect_timeout,
            batch_endpoint: self.batch_endpoint,
            completion_window: DEFAULT_COMPLETION_WINDOW.to_string(),
            default_model: self
                .default_model
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };
        debug!(
            base_url = %config.base_url,
            endpoint = config.batch_endpoint.path(),
            timeout_secs = timeout.as_secs(),
            "client configured"
        );

        Ok(Client::from_parts(
            Arc::new(transport),
            Arc::new(config),
            CallContext::default(),
        ))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn key_from_keyring() -> Option<String> {
    let entry = Entry::new(KEYRING_SERVICE, KEYRING_USER).ok()?;
    entry.get_password().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_settings() {
        let client = ClientBuilder::new()
            .api_key("sk-test")
            .base_url("http://127.0.0.1:9/")
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(2))
            .batch_endpoint(BatchEndpoint::Embeddings)
            .build()
            .unwrap();
        let cfg = client.config();
        assert_eq!(cfg.base_url, "http://127.0.0.1:9");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(2));
        assert_eq!(cfg.batch_endpoint.path(), "/v1/embeddings");
        assert_eq!(cfg.batch_endpoint.result_kind(), ResultKind::Embeddings);
        assert_eq!(cfg.completion_window, "24h");
        assert_eq!(cfg.default_model, "gpt-4o-mini");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ClientBuilder::new()
            .api_key("sk-test")
            .base_url("not a url")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration { .. }));

        let err = ClientBuilder::new()
            .api_key("sk-test")
            .base_url("ftp://example.com")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_blank_api_key_rejected() {
        // An explicit blank key wins over the environment and is then rejected.
        let err = ClientBuilder::new().api_key("  ").build().err().unwrap();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
