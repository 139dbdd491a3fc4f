//! Configuration for history filtering and compaction.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HistoryError;
use crate::patterns::{IgnorePattern, PatternCategory, PatternSet, default_patterns};

// ============================================================================
// Constants
// ============================================================================

/// A lock older than this is considered abandoned (5 minutes).
pub const DEFAULT_LOCK_STALE_SECS: u64 = 300;

/// Suffix of the lock directory next to the log.
pub const LOCK_SUFFIX: &str = ".lock";

/// Temp file suffix for atomic writes.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Backup file suffix.
pub const BACKUP_SUFFIX: &str = ".bak";

// ============================================================================
// Configuration
// ============================================================================

/// The `[history]` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Log file; defaults to `$HISTFILE`.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Include the built-in ignore table.
    #[serde(default = "default_true")]
    pub use_default_patterns: bool,

    /// Additional globs, checked after the built-ins.
    #[serde(default)]
    pub extra_ignore_patterns: Vec<String>,

    /// Treat commands typed with a leading space as private.
    #[serde(default = "default_true")]
    pub respect_leading_space: bool,

    /// Age in seconds after which a compaction lock is reclaimed.
    #[serde(default = "default_lock_stale_secs")]
    pub lock_stale_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_lock_stale_secs() -> u64 {
    DEFAULT_LOCK_STALE_SECS
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            file: None,
            use_default_patterns: true,
            extra_ignore_patterns: Vec::new(),
            respect_leading_space: true,
            lock_stale_secs: DEFAULT_LOCK_STALE_SECS,
        }
    }
}

impl HistoryConfig {
    pub fn lock_stale_after(&self) -> Duration {
        Duration::from_secs(self.lock_stale_secs)
    }

    /// Compile the effective pattern table; invalid entries are skipped and returned.
    pub fn pattern_set(&self) -> (PatternSet, Vec<HistoryError>) {
        let builtin = if self.use_default_patterns {
            default_patterns()
        } else {
            Vec::new()
        };
        let extra = self
            .extra_ignore_patterns
            .iter()
            .map(|p| IgnorePattern::new(PatternCategory::Custom, p.clone()));

        PatternSet::compile(builtin.into_iter().chain(extra))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: HistoryConfig = toml::from_str("").unwrap();
        assert_eq!(config, HistoryConfig::default());
        assert_eq!(config.lock_stale_after(), Duration::from_secs(300));
    }

    #[test]
    fn test_extra_patterns_only() {
        let config: HistoryConfig = toml::from_str(
            r#"
            use_default_patterns = false
            extra_ignore_patterns = ["deploy --prod*", "[bad"]
            "#,
        )
        .unwrap();

        let (set, errors) = config.pattern_set();
        assert_eq!(set.len(), 1);
        let hit = set.first_match("deploy --prod now").unwrap();
        assert_eq!(hit.category, PatternCategory::Custom);
        // An unterminated class is reported and skipped
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], HistoryError::InvalidPattern { pattern, .. } if pattern == "[bad"));
    }
}
