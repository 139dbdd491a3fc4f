//! Default file locations for shellenv.
//!
//! - Config: `$SHELLENV_CONFIG`, else `<config_dir>/shellenv/config.toml`
//! - History log: `$HISTFILE`, else `~/.zsh_history`
//! - State: `$SHELLENV_STATE_DIR`, else `<data_dir>/shellenv`

use std::path::PathBuf;

use crate::env::Environment;

/// Application name for directory paths
pub const APP_NAME: &str = "shellenv";

/// Config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// History file used when `HISTFILE` is not set
pub const DEFAULT_HISTORY_FILE: &str = ".zsh_history";

/// Application directories structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    /// Configuration file path
    pub config_file: PathBuf,
    /// Shell history log path
    pub history_file: PathBuf,
    /// Directory for per-session state
    pub state_dir: PathBuf,
}

impl AppDirs {
    /// Resolve directories, respecting environment variable overrides.
    ///
    /// Returns `None` if no home directory can be determined.
    pub fn new(env: &dyn Environment) -> Option<Self> {
        let home_dir = env
            .var("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir)?;

        let config_file = env.var("SHELLENV_CONFIG").map(PathBuf::from).unwrap_or_else(|| {
            env.var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(dirs::config_dir)
                .unwrap_or_else(|| home_dir.join(".config"))
                .join(APP_NAME)
                .join(CONFIG_FILE_NAME)
        });

        let history_file = env
            .var("HISTFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| home_dir.join(DEFAULT_HISTORY_FILE));

        let state_dir = env
            .var("SHELLENV_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .unwrap_or_else(|| home_dir.join(".local").join("share"))
                    .join(APP_NAME)
            });

        Some(Self {
            config_file,
            history_file,
            state_dir,
        })
    }
}
