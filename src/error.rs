use thiserror::Error;

/// Failures the synchronizer can report.
///
/// Transport and storage failures are recoverable whenever a usable cached
/// copy exists; decode and validation failures on the payload being served
/// are always surfaced. Nothing here is fatal to the process.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("unknown question bank: {0:?}")]
    UnknownName(String),

    #[error("network error: {0}")]
    Transport(String),

    #[error("cache storage error: {0}")]
    Storage(#[source] std::io::Error),

    #[error("no cached copy of {0}")]
    NotFound(String),

    #[error("malformed question data: {0}")]
    MalformedContent(String),

    #[error("invalid question {id}: {reason}")]
    InvalidRecord { id: String, reason: String },
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::Transport(e.to_string())
    }
}
