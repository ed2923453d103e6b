//! HTTP transport collaborator.

mod http;

pub use http::{HttpTransport, TransportConfig, TransportError};
