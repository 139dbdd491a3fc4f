//! Command execution handlers.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Result;
use shellenv_common::{Environment, SystemEnv};

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::{history_cmd, path_cmd};

/// Load configuration and run the selected command against the process
/// environment, writing results to stdout.
pub fn dispatch_command(cli: Cli) -> Result<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let code = dispatch_with(cli, &SystemEnv, &mut out)?;
    out.flush()?;
    Ok(code)
}

/// Dispatch with an explicit environment and output sink.
pub fn dispatch_with(cli: Cli, env: &dyn Environment, out: &mut dyn Write) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref(), env)?;

    match cli.command {
        Commands::Path(command) => path_cmd::run(command, &config, env, out),
        Commands::History(command) => history_cmd::run(command, &config, env, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use shellenv_common::MapEnv;
    use tempfile::TempDir;

    #[test]
    fn test_dispatch_reads_explicit_config() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("shellenv.toml");
        std::fs::write(
            &config,
            "[path]\nuse_builtin_rules = false\n\n[[path.rules]]\nname = \"tools\"\ntemplate = \"/opt/tools/bin\"\n",
        )
        .unwrap();

        let config = config.to_string_lossy().into_owned();
        let cli = Cli::parse_from(["shellenv", "--config", config.as_str(), "path", "rules"]);
        let mut out = Vec::new();
        let code = dispatch_with(cli, &MapEnv::new(), &mut out).unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        let output = String::from_utf8(out).unwrap();
        assert!(output.starts_with("tools"), "{output}");
    }

    #[test]
    fn test_dispatch_fails_on_missing_config() {
        let cli = Cli::parse_from(["shellenv", "--config", "/nonexistent/shellenv.toml", "path", "rules"]);
        let mut out = Vec::new();
        assert!(dispatch_with(cli, &MapEnv::new(), &mut out).is_err());
        assert!(out.is_empty());
    }
}
