use crate::batch::Batches;
use crate::chat::Chat;
use crate::client::builder::{ClientBuilder, ClientConfig};
use crate::client::CallContext;
use crate::files::Files;
use crate::request::RequestBuilder;
use crate::transport::HttpTransport;
use crate::Result;
use std::sync::Arc;

/// Entry point for batch, file and chat operations against one service.
///
/// Cloning is cheap; clones share the connection pool. The client holds no remote state, so
/// concurrent calls from many tasks are safe.
#[derive(Clone)]
pub struct Client {
    transport: Arc<HttpTransport>,
    config: Arc<ClientConfig>,
    context: CallContext,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client configured entirely from the environment.
    pub fn from_env() -> Result<Self> {
        ClientBuilder::new().build()
    }

    pub(crate) fn from_parts(
        transport: Arc<HttpTransport>,
        config: Arc<ClientConfig>,
        context: CallContext,
    ) -> Self {
        Self {
            transport,
            config,
            context,
        }
    }

    /// Clone whose every network call observes `ctx`'s cancellation token and deadline.
    pub fn with_context(&self, ctx: CallContext) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
            context: ctx,
        }
    }

    pub fn context(&self) -> &CallContext {
        &self.context
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Request builder preset with the configured default model.
    pub fn request(&self) -> RequestBuilder {
        RequestBuilder::new(self.config.default_model.clone())
    }

    pub fn batches(&self) -> Batches<'_> {
        Batches::new(self)
    }

    pub fn files(&self) -> Files<'_> {
        Files::new(self)
    }

    pub fn chat(&self) -> Chat<'_> {
        Chat::new(self)
    }

    pub(crate) fn transport(&self) -> &HttpTransport {
        &self.transport
    }
}
