//! shellenv CLI library module.
//!
//! - `cli/` - argument parsing and command dispatch
//! - `config` - TOML configuration loading
//! - `path_cmd` - search path commands
//! - `history_cmd` - history filtering and compaction commands

pub mod cli;
pub mod config;
pub mod history_cmd;
pub mod path_cmd;

pub use config::Config;
