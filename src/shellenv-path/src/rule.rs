//! PATH rules and their activation conditions.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use shellenv_common::{Environment, Platform, SessionMode};

use crate::error::{PathError, Result};
use crate::probe::{CommandProbe, FsProbe};

/// Which end of the search path a rule inserts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Higher priority than everything already present.
    #[default]
    Prepend,
    /// Lower priority than everything already present.
    Append,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Prepend => write!(f, "prepend"),
            Position::Append => write!(f, "append"),
        }
    }
}

/// When a rule applies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    #[default]
    Always,
    ExistsOnDisk,
    OsEquals { os: Platform },
    NotMinimalMode,
    CommandExists { command: String },
    VarIsSet { var: String },
    VarEquals { var: String, value: String },
}

/// Everything a condition may consult.
pub struct EvalContext<'a> {
    pub env: &'a dyn Environment,
    pub fs: &'a dyn FsProbe,
    pub commands: &'a dyn CommandProbe,
    pub mode: &'a SessionMode,
    pub platform: Platform,
}

impl Condition {
    /// Whether the outcome depends on the expanded candidate directory.
    pub fn needs_candidate(&self) -> bool {
        matches!(self, Condition::ExistsOnDisk)
    }

    /// Evaluate the condition for `candidate`. Pure: no side effects.
    pub fn evaluate(&self, candidate: &Path, ctx: &EvalContext<'_>) -> bool {
        match self {
            Condition::Always => true,
            Condition::ExistsOnDisk => ctx.fs.is_dir(candidate),
            Condition::OsEquals { os } => ctx.platform.satisfies(*os),
            Condition::NotMinimalMode => !ctx.mode.is_minimal(),
            Condition::CommandExists { command } => ctx.commands.command_exists(command),
            Condition::VarIsSet { var } => ctx.env.is_set(var),
            Condition::VarEquals { var, value } => ctx.env.var(var).as_deref() == Some(value.as_str()),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Always => write!(f, "always"),
            Condition::ExistsOnDisk => write!(f, "exists on disk"),
            Condition::OsEquals { os } => write!(f, "os = {os}"),
            Condition::NotMinimalMode => write!(f, "not minimal mode"),
            Condition::CommandExists { command } => write!(f, "command '{command}' exists"),
            Condition::VarIsSet { var } => write!(f, "${var} is set"),
            Condition::VarEquals { var, value } => write!(f, "${var} = '{value}'"),
        }
    }
}

/// One candidate directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRule {
    pub name: String,
    pub template: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub condition: Condition,
}

impl PathRule {
    /// A prepended rule that always applies.
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            position: Position::Prepend,
            condition: Condition::Always,
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn append(self) -> Self {
        self.with_position(Position::Append)
    }

    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }
}

/// Ordered, name-unique collection of rules.
///
/// Iteration follows insertion order; later rules may override earlier ones
/// through the list's move-on-prepend behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: IndexMap<String, PathRule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, rejecting duplicate names.
    pub fn from_rules(rules: impl IntoIterator<Item = PathRule>) -> Result<Self> {
        let mut table = Self::new();
        for rule in rules {
            table.push(rule)?;
        }
        Ok(table)
    }

    /// Add a rule at the end; fails if the name is taken.
    pub fn push(&mut self, rule: PathRule) -> Result<()> {
        if self.rules.contains_key(&rule.name) {
            return Err(PathError::DuplicateRule(rule.name));
        }
        self.rules.insert(rule.name.clone(), rule);
        Ok(())
    }

    /// Add a rule, replacing a same-named rule in its original slot.
    pub fn insert(&mut self, rule: PathRule) -> Option<PathRule> {
        self.rules.insert(rule.name.clone(), rule)
    }

    pub fn remove(&mut self, name: &str) -> Option<PathRule> {
        self.rules.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&PathRule> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathRule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Serialize for RuleTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rules.values())
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a PathRule;
    type IntoIter = indexmap::map::Values<'a, String, PathRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.values()
    }
}
