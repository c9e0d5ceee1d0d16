//! Error taxonomy for the food board.
//!
//! Lifecycle errors are local and recoverable; the caller decides what to show
//! (e.g. an "already claimed" toast). Store and board errors wrap them for the
//! HTTP layer, which maps each variant to a status code in `api`.

use thiserror::Error;

use crate::notification::NotificationId;

/// Failures of the pure lifecycle operations (`create`, `claim`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("notification {0} is already claimed")]
    AlreadyClaimed(NotificationId),

    #[error("notification {0} has expired")]
    Expired(NotificationId),
}

/// Failures of the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("notification {0} already exists")]
    Duplicate(NotificationId),

    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot format: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failures of the student-facing side: feedback, leftover reports, polls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommunityError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("poll {0} not found")]
    PollNotFound(String),

    #[error("poll {poll} has no option {option}")]
    UnknownOption { poll: String, option: String },

    #[error("poll {0} is closed")]
    PollClosed(String),

    #[error("{voter} already voted in poll {poll}")]
    AlreadyVoted { poll: String, voter: String },
}

/// Failures surfaced by [`crate::board::FoodBoard`].
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("notification {0} not found")]
    NotFound(NotificationId),

    #[error("unknown source location '{0}'")]
    UnknownLocation(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Community(#[from] CommunityError),
}
