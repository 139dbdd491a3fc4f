//! Error types for PATH resolution.

use shellenv_common::{ExpandError, GlobError};
use thiserror::Error;

/// Errors that can occur while building a search path.
///
/// None of these abort a resolution pass; the resolver logs them and skips
/// the offending candidate.
#[derive(Debug, Error)]
pub enum PathError {
    /// Template referenced an unset variable or was malformed
    #[error("template expansion failed: {0}")]
    Expand(#[from] ExpandError),

    /// Template contained an invalid glob segment
    #[error(transparent)]
    Glob(#[from] GlobError),

    /// Two rules in one table share a name
    #[error("duplicate rule name: {0}")]
    DuplicateRule(String),

    /// Expanded candidate is not an absolute path
    #[error("rule '{rule}' produced a relative path: {path}")]
    RelativeCandidate { rule: String, path: String },
}

/// Result type for PATH operations.
pub type Result<T> = std::result::Result<T, PathError>;
