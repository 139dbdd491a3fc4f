//! Configuration file loading.
//!
//! The file is TOML with optional `[path]` and `[history]` tables. A missing
//! default file means built-in defaults; a missing file named explicitly with
//! `--config` is an error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use shellenv_common::{AppDirs, Environment, expand_template};
use shellenv_history::HistoryConfig;
use shellenv_path::PathConfig;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub path: PathConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse configuration")
    }

    /// Load the configuration for this invocation.
    pub fn load(explicit: Option<&Path>, env: &dyn Environment) -> Result<Self> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => match AppDirs::new(env) {
                Some(dirs) => (dirs.config_file, false),
                None => {
                    debug!("No home directory, using default configuration");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            if required {
                bail!("Configuration file not found: {}", path.display());
            }
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml(&text).with_context(|| format!("Invalid configuration in {}", path.display()))?;
        debug!(path = %path.display(), rules = config.path.rules.len(), "Loaded configuration");
        Ok(config)
    }

    /// The history log to operate on.
    ///
    /// `--file` wins over the configured file, which wins over `$HISTFILE`.
    /// A configured file may use `~` and `$VAR`.
    pub fn history_file(&self, explicit: Option<&Path>, env: &dyn Environment) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Some(configured) = &self.history.file {
            let expanded = expand_template(&configured.to_string_lossy(), env)
                .with_context(|| format!("Invalid history file {}", configured.display()))?;
            return Ok(PathBuf::from(expanded));
        }
        match AppDirs::new(env) {
            Some(dirs) => Ok(dirs.history_file),
            None => bail!("Cannot determine the history file: set HISTFILE or pass --file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use shellenv_common::{MapEnv, SystemEnv};
    use shellenv_path::{Condition, Position};
    use tempfile::TempDir;

    #[test]
    fn test_full_config() {
        let config = Config::from_toml(
            r#"
            [path]
            inherit = false
            disabled_rules = ["snap"]

            [[path.rules]]
            name = "work-tools"
            template = "$HOME/work/bin"
            position = "append"
            condition = { kind = "var_is_set", var = "WORK" }

            [history]
            extra_ignore_patterns = ["deploy --prod*"]
            lock_stale_secs = 60
            "#,
        )
        .unwrap();

        assert!(!config.path.inherit);
        assert!(config.path.use_builtin_rules);
        assert_eq!(config.path.rules[0].position, Position::Append);
        assert_eq!(
            config.path.rules[0].condition,
            Condition::VarIsSet {
                var: "WORK".to_string()
            }
        );
        assert_eq!(config.history.extra_ignore_patterns, vec!["deploy --prod*"]);
        assert_eq!(config.history.lock_stale_secs, 60);
        assert!(config.history.respect_leading_space);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_missing_default_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let env = MapEnv::new()
            .with("HOME", tmp.path().to_string_lossy())
            .with("XDG_CONFIG_HOME", tmp.path().join("cfg").to_string_lossy());
        assert_eq!(Config::load(None, &env).unwrap(), Config::default());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load(Some(&tmp.path().join("nope.toml")), &MapEnv::new()).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_file_names_path() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("config.toml");
        std::fs::write(&file, "[path]\ninherit = \"sometimes\"\n").unwrap();

        let err = Config::load(Some(&file), &MapEnv::new()).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn test_history_file_precedence() {
        let env = MapEnv::new().with("HOME", "/home/dev").with("HISTFILE", "/home/dev/.histfile");
        let mut config = Config::default();

        assert_eq!(
            config.history_file(None, &env).unwrap(),
            PathBuf::from("/home/dev/.histfile")
        );

        config.history.file = Some(PathBuf::from("~/.zsh/history"));
        assert_eq!(
            config.history_file(None, &env).unwrap(),
            PathBuf::from("/home/dev/.zsh/history")
        );

        assert_eq!(
            config.history_file(Some(Path::new("/tmp/h")), &env).unwrap(),
            PathBuf::from("/tmp/h")
        );
    }

    #[test]
    #[serial]
    fn test_load_from_shellenv_config_variable() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("custom.toml");
        std::fs::write(&file, "[history]\nrespect_leading_space = false\n").unwrap();

        let previous = std::env::var_os("SHELLENV_CONFIG");
        // SAFETY: serialized with every other test that touches the process environment
        unsafe { std::env::set_var("SHELLENV_CONFIG", &file) };
        let loaded = Config::load(None, &SystemEnv);
        match previous {
            Some(value) => unsafe { std::env::set_var("SHELLENV_CONFIG", value) },
            None => unsafe { std::env::remove_var("SHELLENV_CONFIG") },
        }

        assert!(!loaded.unwrap().history.respect_leading_space);
    }
}
