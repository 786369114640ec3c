use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::EventId;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Event '{id}' ends before it starts ({end} < {start})")]
    EndBeforeStart {
        id: EventId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Event '{id}' stops recurring before it starts ({recurrence_end} < {start})")]
    RecurrenceEndBeforeStart {
        id: EventId,
        start: DateTime<Utc>,
        recurrence_end: DateTime<Utc>,
    },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid event record #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

impl CoreError {
    /// Returns true for errors raised by the `BaseEvent` construction boundary.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            CoreError::EndBeforeStart { .. }
                | CoreError::RecurrenceEndBeforeStart { .. }
                | CoreError::InvalidInput(_)
        )
    }
}
