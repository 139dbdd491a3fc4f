//! Configuration for PATH resolution.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::defaults::builtin_rules;
use crate::error::PathError;
use crate::resolver::FALLBACK_PATH;
use crate::rule::{PathRule, RuleTable};

// ============================================================================
// Constants
// ============================================================================

/// Subdirectories of the working directory added as transient entries.
pub const DEFAULT_TRANSIENT_SUBDIRS: &[&str] = &["bin", "node_modules/.bin"];

/// Environment variable that carries transient entries between invocations.
pub const TRANSIENT_VAR: &str = "SHELLENV_TRANSIENT";

// ============================================================================
// Configuration
// ============================================================================

/// The `[path]` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Start from the built-in rule table.
    #[serde(default = "default_true")]
    pub use_builtin_rules: bool,

    /// Seed the list with the current `PATH`.
    #[serde(default = "default_true")]
    pub inherit: bool,

    /// User rules. A rule named like a built-in replaces it in place.
    #[serde(default)]
    pub rules: Vec<PathRule>,

    /// Names of rules to drop.
    #[serde(default)]
    pub disabled_rules: Vec<String>,

    /// Used when resolution produces an empty list.
    #[serde(default = "default_fallback")]
    pub fallback: Vec<String>,

    /// Working-directory subdirectories added on directory change.
    #[serde(default = "default_transient_subdirs")]
    pub transient_subdirs: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_fallback() -> Vec<String> {
    FALLBACK_PATH.iter().map(|s| s.to_string()).collect()
}

fn default_transient_subdirs() -> Vec<String> {
    DEFAULT_TRANSIENT_SUBDIRS.iter().map(|s| s.to_string()).collect()
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            use_builtin_rules: true,
            inherit: true,
            rules: Vec::new(),
            disabled_rules: Vec::new(),
            fallback: default_fallback(),
            transient_subdirs: default_transient_subdirs(),
        }
    }
}

impl PathConfig {
    /// Build the effective rule table.
    ///
    /// A name repeated within `rules` is a configuration error: the later
    /// entry is skipped with a warning.
    pub fn rule_table(&self) -> RuleTable {
        let mut table = if self.use_builtin_rules {
            builtin_rules()
        } else {
            RuleTable::new()
        };

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.name.as_str()) {
                let error = PathError::DuplicateRule(rule.name.clone());
                warn!(%error, "ignoring rule");
                continue;
            }
            table.insert(rule.clone());
        }

        for name in &self.disabled_rules {
            if table.remove(name).is_none() {
                warn!(rule = %name, "disabled rule does not exist");
            }
        }

        table
    }
}
