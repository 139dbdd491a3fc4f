//! Command-line argument structures.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shellenv_common::ShellType;

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Shells accepted by `--shell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ShellArg {
    Zsh,
    Bash,
    Sh,
    Fish,
}

impl From<ShellArg> for ShellType {
    fn from(arg: ShellArg) -> Self {
        match arg {
            ShellArg::Zsh => ShellType::Zsh,
            ShellArg::Bash => ShellType::Bash,
            ShellArg::Sh => ShellType::Sh,
            ShellArg::Fish => ShellType::Fish,
        }
    }
}

/// shellenv - search path resolution and shell history hygiene
#[derive(Debug, Parser)]
#[command(name = "shellenv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: $SHELLENV_CONFIG or ~/.config/shellenv/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output (same as --log-level debug)
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Set log verbosity level (overrides SHELLENV_LOG)
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build and maintain the executable search path
    #[command(subcommand)]
    Path(PathCommand),

    /// Filter and compact the shell history log
    #[command(subcommand)]
    History(HistoryCommand),
}

// ============================================================================
// path
// ============================================================================

#[derive(Debug, Subcommand)]
pub enum PathCommand {
    /// Resolve the configured rules and print the export statement
    Resolve(ResolveArgs),

    /// Print PATH without entries that no longer exist
    Clean(CleanArgs),

    /// Print the resolved PATH, one numbered entry per line
    List(ListArgs),

    /// Show the session mode and platform used for rule conditions
    Mode(JsonArgs),

    /// Print the effective rule table
    Rules(JsonArgs),

    /// Directory-change hook: swap directory-local PATH entries
    Chdir(ChdirArgs),
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Shell syntax to emit (default: detected from $SHELL)
    #[arg(long, value_enum)]
    pub shell: Option<ShellArg>,

    /// Start from an empty list instead of the current PATH
    #[arg(long)]
    pub no_inherit: bool,

    /// Output the resolved list as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// PATH value to clean (default: $PATH)
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Start from an empty list instead of the current PATH
    #[arg(long)]
    pub no_inherit: bool,
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ChdirArgs {
    /// The directory just entered
    pub dir: PathBuf,

    /// Shell syntax to emit (default: detected from $SHELL)
    #[arg(long, value_enum)]
    pub shell: Option<ShellArg>,
}

// ============================================================================
// history
// ============================================================================

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// Decide whether a command belongs in history (exit 0 = store, 1 = discard)
    Classify(ClassifyArgs),

    /// Classify a command and append it to the log if it should be stored
    Record(RecordArgs),

    /// Remove secrets and superseded duplicates from the log
    Compact(CompactArgs),

    /// Show the most frequently used commands
    Top(TopArgs),
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Print the decision and the reason for it
    #[arg(long)]
    pub explain: bool,

    /// Print the decision as JSON
    #[arg(long)]
    pub json: bool,

    /// The command line as typed
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// History log (default: configured file, then $HISTFILE)
    #[arg(long, value_name = "LOG")]
    pub file: Option<PathBuf>,

    /// Elapsed run time in seconds
    #[arg(long, default_value = "0")]
    pub duration: u64,

    /// The command line as typed
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CompactArgs {
    /// History log (default: configured file, then $HISTFILE)
    #[arg(long, value_name = "LOG")]
    pub file: Option<PathBuf>,

    /// Dry run - show what would be removed without rewriting the log
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TopArgs {
    /// History log (default: configured file, then $HISTFILE)
    #[arg(long, value_name = "LOG")]
    pub file: Option<PathBuf>,

    /// Number of commands to show (default: all)
    #[arg(short = 'n', long = "limit")]
    pub n: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_level_from_str_loose() {
        assert_eq!(LogLevel::from_str_loose("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str_loose(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str_loose("loud"), None);
    }

    #[test]
    fn test_classify_keeps_hyphenated_words() {
        let cli = Cli::parse_from(["shellenv", "history", "classify", "ls", "-la"]);
        match cli.command {
            Commands::History(HistoryCommand::Classify(args)) => {
                assert_eq!(args.command, vec!["ls", "-la"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["shellenv", "path", "mode", "-v", "--config", "/tmp/c.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }
}
