//! Write-time classification of commands.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::HistoryConfig;
use crate::error::{HistoryError, Result};
use crate::patterns::{IgnorePattern, PatternCategory, PatternSet};
use crate::record::HistoryRecord;

/// Why a command is not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DiscardReason {
    Empty,
    LeadingSpace,
    Matched {
        category: PatternCategory,
        pattern: String,
    },
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscardReason::Empty => write!(f, "empty command"),
            DiscardReason::LeadingSpace => write!(f, "leading space marks it private"),
            DiscardReason::Matched { category, pattern } => {
                write!(f, "matches {category} pattern '{pattern}'")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Classification {
    Store,
    Discard(DiscardReason),
}

impl Classification {
    pub fn is_store(&self) -> bool {
        matches!(self, Classification::Store)
    }
}

impl From<&IgnorePattern> for Classification {
    fn from(pattern: &IgnorePattern) -> Self {
        Classification::Discard(DiscardReason::Matched {
            category: pattern.category,
            pattern: pattern.pattern.clone(),
        })
    }
}

/// Classify `command` against `patterns`.
///
/// Deterministic: the result depends only on the two inputs.
pub fn classify(command: &str, patterns: &PatternSet) -> Classification {
    let trimmed = command.trim();
    if trimmed.is_empty() {
        return Classification::Discard(DiscardReason::Empty);
    }
    match patterns.first_match(trimmed) {
        Some(pattern) => pattern.into(),
        None => Classification::Store,
    }
}

/// Decides which commands are recorded.
#[derive(Debug, Clone)]
pub struct Classifier {
    patterns: PatternSet,
    respect_leading_space: bool,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(PatternSet::defaults())
    }
}

impl Classifier {
    pub fn new(patterns: PatternSet) -> Self {
        Self {
            patterns,
            respect_leading_space: true,
        }
    }

    /// Build from configuration; invalid patterns are skipped and returned.
    pub fn from_config(config: &HistoryConfig) -> (Self, Vec<HistoryError>) {
        let (patterns, errors) = config.pattern_set();
        let classifier = Self::new(patterns).with_leading_space(config.respect_leading_space);
        (classifier, errors)
    }

    #[must_use]
    pub fn with_leading_space(mut self, respect: bool) -> Self {
        self.respect_leading_space = respect;
        self
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Classify raw input as received from the shell's history hook.
    pub fn classify(&self, raw: &str) -> Classification {
        if raw.trim().is_empty() {
            return Classification::Discard(DiscardReason::Empty);
        }
        if self.respect_leading_space && raw.starts_with([' ', '\t']) {
            return Classification::Discard(DiscardReason::LeadingSpace);
        }
        classify(raw, &self.patterns)
    }

    /// Classify `record` and append it to `log_path` if it is stored.
    ///
    /// The line is written with a single append so concurrent shells do not
    /// interleave partial records. No lock is taken.
    pub fn record(&self, log_path: &Path, record: &HistoryRecord) -> Result<Classification> {
        let classification = self.classify(&record.command);
        if let Classification::Discard(reason) = &classification {
            debug!(%reason, "history entry discarded");
            return Ok(classification);
        }

        let line = format!("{}\n", record.to_log_line());
        let mut file = OpenOptions::new().create(true).append(true).open(log_path)?;
        file.write_all(line.as_bytes())?;
        trace!(path = %log_path.display(), bytes = line.len(), "appended history entry");

        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_classify_scenarios() {
        let classifier = Classifier::default();
        assert!(matches!(
            classifier.classify("export AWS_SECRET_ACCESS_KEY=abc"),
            Classification::Discard(DiscardReason::Matched {
                category: PatternCategory::CloudProviderCredential,
                ..
            })
        ));
        assert_eq!(classifier.classify("git status"), Classification::Store);
    }

    #[test]
    fn test_empty_and_whitespace() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(""), Classification::Discard(DiscardReason::Empty));
        assert_eq!(classifier.classify("  \t "), Classification::Discard(DiscardReason::Empty));
    }

    #[test]
    fn test_leading_space_convention() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.classify(" git status"),
            Classification::Discard(DiscardReason::LeadingSpace)
        );

        let classifier = classifier.with_leading_space(false);
        assert_eq!(classifier.classify(" git status"), Classification::Store);
    }

    #[test]
    fn test_trailing_whitespace_is_trimmed_before_matching() {
        let classifier = Classifier::default();
        assert!(!classifier.classify("ls   ").is_store());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = Classifier::default();
        for command in ["git push", "export PASSWORD=x", "", " secret", "op read op://x"] {
            assert_eq!(classifier.classify(command), classifier.classify(command));
        }
    }

    #[test]
    fn test_record_appends_only_stored_commands() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("history");
        let classifier = Classifier::default();

        let stored = classifier.record(&log, &HistoryRecord::new(100, 2, "git status")).unwrap();
        let dropped = classifier
            .record(&log, &HistoryRecord::new(101, 0, "export PASSWORD=x"))
            .unwrap();
        classifier.record(&log, &HistoryRecord::new(102, 0, "echo a\necho b")).unwrap();

        assert!(stored.is_store());
        assert!(!dropped.is_store());
        assert_eq!(
            std::fs::read_to_string(&log).unwrap(),
            ": 100:2;git status\n: 102:0;echo a\\\necho b\n"
        );
    }

    #[test]
    fn test_serialize_explanation() {
        let json = serde_json::to_value(Classification::Discard(DiscardReason::Matched {
            category: PatternCategory::AuthHeader,
            pattern: "*Bearer *".to_string(),
        }))
        .unwrap();
        assert_eq!(json["decision"], "discard");
    }
}
