//! Snapshot artifact output.

pub mod json;

pub use json::{Snapshot, SnapshotStats};

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Filesystem write failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot serialization failed
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
