//! Shell type detection and export statement rendering.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::env::Environment;

/// Shells whose syntax shellenv can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellType {
    /// Z Shell (zsh).
    Zsh,

    /// Bourne Again Shell (bash).
    Bash,

    /// POSIX Shell (sh, dash, ash).
    Sh,

    /// Fish shell.
    Fish,
}

impl ShellType {
    /// Detect shell type from the `SHELL` variable.
    pub fn detect(env: &dyn Environment) -> Option<Self> {
        Self::from_path(&env.var("SHELL")?)
    }

    /// Parse shell type from a path.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = Path::new(path);
        let name = path.file_name()?.to_str()?;

        Self::from_name(name)
    }

    /// Parse shell type from a name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().trim_start_matches('-') {
            "zsh" => Some(ShellType::Zsh),
            "bash" => Some(ShellType::Bash),
            "sh" | "dash" | "ash" | "ksh" => Some(ShellType::Sh),
            "fish" => Some(ShellType::Fish),
            _ => None,
        }
    }

    /// Get the shell name.
    pub fn name(&self) -> &'static str {
        match self {
            ShellType::Zsh => "zsh",
            ShellType::Bash => "bash",
            ShellType::Sh => "sh",
            ShellType::Fish => "fish",
        }
    }

    /// Statement that sets and exports `var` to `value`.
    ///
    /// For fish, a separator-joined `value` is split back into a list so that
    /// `PATH` stays a proper fish list variable.
    pub fn export_statement(&self, var: &str, value: &str, separator: char) -> String {
        match self {
            ShellType::Fish => {
                let items: Vec<String> = value
                    .split(separator)
                    .filter(|s| !s.is_empty())
                    .map(shell_quote)
                    .collect();
                if items.is_empty() {
                    format!("set -gx {var} ''")
                } else {
                    format!("set -gx {var} {}", items.join(" "))
                }
            }
            _ => format!("export {var}={}", shell_quote(value)),
        }
    }

    /// Statement that removes `var` from the environment.
    pub fn unset_statement(&self, var: &str) -> String {
        match self {
            ShellType::Fish => format!("set -e {var}"),
            _ => format!("unset {var}"),
        }
    }
}

impl std::fmt::Display for ShellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ShellType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown shell type: {}", s))
    }
}

impl Default for ShellType {
    fn default() -> Self {
        ShellType::Zsh
    }
}

/// Quote a string for safe use in shell source.
///
/// Single quotes inside the value are escaped with the `'"'"'` technique:
/// close the quoted string, emit a double-quoted quote, reopen.
pub fn shell_quote(value: &str) -> String {
    if value.contains('\'') {
        format!("'{}'", value.replace('\'', "'\"'\"'"))
    } else {
        format!("'{}'", value)
    }
}
