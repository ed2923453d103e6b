//! Client entry point, configuration and per-call context.
//!
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod context;
pub mod core;
pub(crate) mod validation;

pub use builder::{
    BatchEndpoint, ClientBuilder, ClientConfig, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_TIMEOUT,
};
pub use context::CallContext;
pub use self::core::Client;
