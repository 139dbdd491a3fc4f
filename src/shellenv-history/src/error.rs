//! Error types for history operations.

use std::path::PathBuf;
use std::time::Duration;

use shellenv_common::GlobError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("history log not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("history log {} is locked by another process (lock held for {}s)", .path.display(), .age.as_secs())]
    Locked { path: PathBuf, age: Duration },

    /// Compaction would have left an empty log; the original was kept.
    #[error("compaction of {} produced no records; original log kept", .0.display())]
    EmptyResult(PathBuf),

    #[error("invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: GlobError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HistoryError>;
