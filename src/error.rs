//! Error types for the timer and the Redmine boundary.

use std::path::PathBuf;

/// Failures reported by a [`Tracker`](crate::tracker::Tracker).
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("authentication failed or insufficient permissions (HTTP {status})")]
    Unauthorized { status: u16 },

    /// The server understood the request and refused it (HTTP 422).
    #[error("request rejected: {}", .0.join("; "))]
    Rejected(Vec<String>),

    #[error("connection failed: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the timer manager.
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    #[error("{0}")]
    Validation(String),

    #[error("Issue #{0} not found. Please check the issue ID.")]
    IssueNotFound(i64),

    #[error("No timer is currently running.")]
    NoActiveTimer,

    #[error("Redmine unavailable: {0}")]
    RemoteUnavailable(String),

    #[error(
        "Timer state file {path} is corrupt ({details}). \
         Inspect it and remove it manually to reset the timer."
    )]
    CorruptState { path: PathBuf, details: String },

    #[error("Failed to access timer state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TimerError {
    /// Maps a tracker failure seen while looking up `issue_id`.
    pub fn from_issue_lookup(issue_id: i64, err: TrackerError) -> Self {
        match err {
            TrackerError::NotFound { .. } => TimerError::IssueNotFound(issue_id),
            other => TimerError::from(other),
        }
    }
}

impl From<TrackerError> for TimerError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Rejected(_) => TimerError::Validation(err.to_string()),
            TrackerError::NotFound { .. } => TimerError::Validation(err.to_string()),
            TrackerError::Unauthorized { .. } | TrackerError::Unavailable(_) => {
                TimerError::RemoteUnavailable(err.to_string())
            }
        }
    }
}
