use crate::client::CallContext;
use crate::error::ApiError;
use crate::{BoxStream, Error, ErrorContext, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::{Proxy, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub api_key: String,
    /// Deadline for one JSON round trip. Uploads, downloads and streams are not bounded by it.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub proxy_url: Option<String>,
}

/// Thin bearer-authenticated JSON/multipart client.
///
/// Performs exactly one round trip per call. Connection pooling, TLS and connect timeouts
/// belong to reqwest; retries and whole-call deadlines belong to the caller's [`CallContext`].
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Some(config.pool_idle_timeout))
            // Conservative HTTP/2 keepalive defaults for long-lived connections.
            .http2_adaptive_window(true)
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid proxy URL: {}", e),
                    ErrorContext::new().with_field_path("proxy_url"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        // Our own correlation id. The service may ignore it; logs use it for linkage.
        req.bearer_auth(&self.api_key)
            .header("x-client-request-id", Uuid::new_v4().to_string())
    }

    /// Send and turn any non-2xx status into [`Error::Api`].
    async fn send(&self, ctx: &CallContext, req: RequestBuilder, path: &str) -> Result<Response> {
        let req = self.authorize(req);
        ctx.run(async move {
            let resp = req
                .send()
                .await
                .map_err(|e| Error::Transport(TransportError::Http(e)))?;
            let status = resp.status();
            debug!(http_status = status.as_u16(), path, "response received");
            if status.is_success() {
                return Ok(resp);
            }
            let body = resp
                .text()
                .await
                .map_err(|e| Error::Transport(TransportError::Http(e)))?;
            let api = parse_api_error(status.as_u16(), &body);
            warn!(
                http_status = api.status,
                code = api.code.as_deref().unwrap_or(""),
                path,
                "remote rejected request: {}",
                api.message
            );
            Err(Error::Api(api))
        })
        .await
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        resp: Response,
        path: &str,
    ) -> Result<T> {
        let bytes = ctx
            .run(async move {
                resp.bytes()
                    .await
                    .map_err(|e| Error::Transport(TransportError::Http(e)))
            })
            .await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            Error::decode_with_context(
                format!("Unexpected response body: {}", e),
                ErrorContext::new()
                    .with_field_path(path.to_string())
                    .with_source("http_transport"),
            )
        })
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let req = self
            .client
            .get(self.url(path))
            .query(query)
            .timeout(self.request_timeout);
        let resp = self.send(ctx, req, path).await?;
        self.read_json(ctx, resp, path).await
    }

    /// POST with an optional JSON body.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let mut req = self.client.post(self.url(path)).timeout(self.request_timeout);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = self.send(ctx, req, path).await?;
        self.read_json(ctx, resp, path).await
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, ctx: &CallContext, path: &str) -> Result<T> {
        let req = self
            .client
            .delete(self.url(path))
            .timeout(self.request_timeout);
        let resp = self.send(ctx, req, path).await?;
        self.read_json(ctx, resp, path).await
    }

    /// Raw response body, e.g. file content. Result files can be large, so only the
    /// context deadline applies.
    pub async fn get_bytes(&self, ctx: &CallContext, path: &str) -> Result<Bytes> {
        let req = self.client.get(self.url(path));
        let resp = self.send(ctx, req, path).await?;
        ctx.run(async move {
            resp.bytes()
                .await
                .map_err(|e| Error::Transport(TransportError::Http(e)))
        })
        .await
    }

    /// Multipart upload. Only the context deadline applies.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let req = self.client.post(self.url(path)).multipart(form);
        let resp = self.send(ctx, req, path).await?;
        self.read_json(ctx, resp, path).await
    }

    /// POST a JSON body and hand back the response body as an incremental byte stream.
    ///
    /// The stream may outlive the JSON timeout; cancel through the context or by dropping it.
    pub async fn post_stream<B: Serialize + ?Sized>(
        &self,
        ctx: &CallContext,
        path: &str,
        body: &B,
    ) -> Result<BoxStream<'static, Bytes>> {
        let req = self
            .client
            .post(self.url(path))
            .header("accept", "text/event-stream")
            .json(body);
        let resp = self.send(ctx, req, path).await?;
        let byte_stream = resp
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));
        Ok(Box::pin(byte_stream))
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    param: Option<String>,
    #[serde(default, deserialize_with = "crate::error::lenient_code")]
    code: Option<String>,
}

/// Map a non-2xx body to [`ApiError`]. Bodies that are not the `{"error": {...}}` envelope
/// keep their raw text as the message.
fn parse_api_error(status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => ApiError {
            status,
            code: env.error.code,
            message: env.error.message.unwrap_or_default(),
            param: env.error.param,
            error_type: env.error.error_type,
        },
        Err(_) => ApiError {
            status,
            message: body.trim().to_string(),
            ..Default::default()
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("call cancelled")]
    Cancelled,

    #[error("call deadline exceeded")]
    DeadlineExceeded,

    #[error("Transport error: {0}")]
    Other(String),
}
