//! Per-call cancellation and deadline propagation.

use crate::transport::TransportError;
use crate::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token and deadline applied to every network round trip made through a
/// [`Client`](crate::Client) carrying it.
///
/// The context is passed through, never interpreted by the remote side: a cancelled or
/// expired call fails locally with [`TransportError::Cancelled`] or
/// [`TransportError::DeadlineExceeded`].
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|t| t.is_cancelled()).unwrap_or(false)
    }

    /// Drive `fut` to completion unless the token fires or the deadline passes first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let cancel = self.cancel.clone();
        let deadline = self.deadline;

        tokio::select! {
            biased;
            _ = wait_cancelled(cancel) => Err(TransportError::Cancelled.into()),
            _ = wait_deadline(deadline) => Err(TransportError::DeadlineExceeded.into()),
            res = fut => res,
        }
    }
}

async fn wait_cancelled(token: Option<CancellationToken>) {
    match token {
        Some(t) => t.cancelled().await,
        None => std::future::pending().await,
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}
