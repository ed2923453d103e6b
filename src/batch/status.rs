//! Batch job state machine.
//!
//! ```text
//! Created -> InProgress -> Finalizing -> { Completed | Failed | Expired }
//!    \___________\_____________\________-> Cancelling -> Cancelled
//! ```
//!
//! Status only moves forward. Observers may skip intermediate states (polling is sparse)
//! but never move backwards or leave a terminal state.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Input file is being validated.
    #[serde(rename = "validating", alias = "created")]
    Created,
    InProgress,
    /// Results are being written to the output file.
    Finalizing,
    Completed,
    Failed,
    Expired,
    Cancelling,
    Cancelled,
}

impl BatchStatus {
    pub const ALL: [BatchStatus; 8] = [
        BatchStatus::Created,
        BatchStatus::InProgress,
        BatchStatus::Finalizing,
        BatchStatus::Completed,
        BatchStatus::Failed,
        BatchStatus::Expired,
        BatchStatus::Cancelling,
        BatchStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Created => "validating",
            BatchStatus::InProgress => "in_progress",
            BatchStatus::Finalizing => "finalizing",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed => "failed",
            BatchStatus::Expired => "expired",
            BatchStatus::Cancelling => "cancelling",
            BatchStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchStatus::Completed
                | BatchStatus::Failed
                | BatchStatus::Expired
                | BatchStatus::Cancelled
        )
    }

    /// Position on the main path; `None` on the cancellation branch.
    fn rank(&self) -> Option<u8> {
        match self {
            BatchStatus::Created => Some(0),
            BatchStatus::InProgress => Some(1),
            BatchStatus::Finalizing => Some(2),
            BatchStatus::Completed | BatchStatus::Failed | BatchStatus::Expired => Some(3),
            BatchStatus::Cancelling | BatchStatus::Cancelled => None,
        }
    }

    /// Whether an observer that last saw `self` may next see `next`.
    /// Staying put is always allowed.
    pub fn can_transition_to(&self, next: BatchStatus) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next) {
            (_, BatchStatus::Cancelling) | (_, BatchStatus::Cancelled) => true,
            // Cancelling only resolves to Cancelled.
            (None, _) => false,
            (Some(from), to) => to.rank().map_or(false, |r| r > from),
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of feeding one observed status to a [`StatusTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First observation.
    Initial(BatchStatus),
    Unchanged(BatchStatus),
    Advanced { from: BatchStatus, to: BatchStatus },
}

/// Checks a sequence of observed statuses for one job against the state machine.
///
/// A backward move means the remote reported something contradictory; it surfaces as
/// [`Error::Decode`] rather than being silently accepted.
#[derive(Debug, Clone)]
pub struct StatusTracker {
    job_id: String,
    current: Option<BatchStatus>,
}

impl StatusTracker {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            current: None,
        }
    }

    pub fn current(&self) -> Option<BatchStatus> {
        self.current
    }

    pub fn observe(&mut self, next: BatchStatus) -> Result<Transition> {
        let transition = match self.current {
            None => Transition::Initial(next),
            Some(prev) if prev == next => Transition::Unchanged(next),
            Some(prev) if prev.can_transition_to(next) => Transition::Advanced {
                from: prev,
                to: next,
            },
            Some(prev) => {
                return Err(Error::decode_with_context(
                    format!(
                        "batch {} moved backwards from '{}' to '{}'",
                        self.job_id, prev, next
                    ),
                    ErrorContext::new()
                        .with_field_path("status")
                        .with_source("status_tracker"),
                ));
            }
        };
        if let Transition::Advanced { from, to } = transition {
            info!(job_id = %self.job_id, %from, %to, "batch status changed");
        }
        self.current = Some(next);
        Ok(transition)
    }
}
