use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while rescuing a recording.
#[derive(Debug, Error)]
pub enum RescueError {
    /// No live row exists for the identifier
    #[error("No data found for recording {0}")]
    NotFound(i64),

    /// The index holds more than one live row for the identifier
    #[error("Multiple entries ({count}) found for recording {id}")]
    DuplicateRecord { id: i64, count: usize },

    /// The embedded JSON document could not be parsed
    #[error("Malformed embedded payload: {0}")]
    MalformedPayload(String),

    /// The segment directory holds no `.ts` files
    #[error("No ts segments found in {}", .0.display())]
    NoSegments(PathBuf),

    /// A segment's duration could not be determined
    #[error("Probe failed for {}: {message}", path.display())]
    ProbeFailure { path: PathBuf, message: String },

    /// The merge tool could not be run or exited unsuccessfully
    #[error("Merge failed: {0}")]
    MergeToolFailure(String),

    /// The tagging tool could not be run or exited unsuccessfully
    #[error("Tagging failed: {0}")]
    TagToolFailure(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Index database error
    #[error("Database error: {0}")]
    Database(String),
}

impl RescueError {
    pub fn probe_failure(path: &Path, msg: impl Into<String>) -> Self {
        Self::ProbeFailure {
            path: path.to_path_buf(),
            message: msg.into(),
        }
    }

    pub fn merge_failure(msg: impl Into<String>) -> Self {
        Self::MergeToolFailure(msg.into())
    }

    pub fn tag_failure(msg: impl Into<String>) -> Self {
        Self::TagToolFailure(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }
}
