//! CLI argument parsing and command dispatch.
//!
//! - `args` - Command-line argument structures
//! - `handlers` - Command execution handlers

pub mod args;
pub mod handlers;

pub use args::{
    ChdirArgs, ClassifyArgs, CleanArgs, Cli, Commands, CompactArgs, HistoryCommand, JsonArgs, ListArgs, LogLevel,
    PathCommand, RecordArgs, ResolveArgs, ShellArg, TopArgs,
};
pub use handlers::dispatch_command;
