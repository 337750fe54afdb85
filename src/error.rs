//! Error types for task-relay operations.
//!
//! Every fallible service operation returns [`FlowResult`]. The variants map
//! one-to-one onto the outcomes callers need to distinguish: missing
//! references, permission failures, bad input, illegal transitions, and
//! storage faults. Guards run before any mutation, so every variant except
//! `Internal` implies nothing was written; `Internal` implies the enclosing
//! transaction rolled back in full.

use crate::types::TaskStatus;
use thiserror::Error;

/// Result alias for service operations.
pub type FlowResult<T> = std::result::Result<T, FlowError>;

/// Tagged error returned by lifecycle, statistics, and directory operations.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Referenced task or user id does not resolve.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Actor lacks the role or ownership the operation requires.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Input rejected before any mutation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Requested transition is not legal from the current status.
    #[error("cannot {action} a task in status {current}")]
    InvalidState {
        action: &'static str,
        current: TaskStatus,
    },

    /// Storage failure or other unexpected condition.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl FlowError {
    pub fn task_not_found(id: i64) -> Self {
        FlowError::NotFound { entity: "task", id }
    }

    pub fn user_not_found(id: i64) -> Self {
        FlowError::NotFound { entity: "user", id }
    }

    pub fn comment_not_found(id: i64) -> Self {
        FlowError::NotFound {
            entity: "comment",
            id,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        FlowError::Forbidden(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        FlowError::InvalidArgument(message.into())
    }

    pub fn invalid_state(action: &'static str, current: TaskStatus) -> Self {
        FlowError::InvalidState { action, current }
    }
}

impl From<rusqlite::Error> for FlowError {
    fn from(err: rusqlite::Error) -> Self {
        FlowError::Internal(err.into())
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Internal(err.into())
    }
}
