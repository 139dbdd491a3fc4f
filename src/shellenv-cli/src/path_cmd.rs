//! `shellenv path` commands.
//!
//! Everything written to `out` is meant to be consumed by the calling shell
//! (usually through `eval`), so diagnostics go through `tracing` to stderr.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use shellenv_common::{Environment, SessionMode, ShellType, shell_quote};
use shellenv_path::{PathResolver, Position, SystemCommands, SystemFs, TRANSIENT_VAR, export_line};
use tracing::{debug, warn};

use crate::cli::{ChdirArgs, CleanArgs, JsonArgs, ListArgs, PathCommand, ResolveArgs, ShellArg};
use crate::config::Config;

/// Run a `path` subcommand.
pub fn run(command: PathCommand, config: &Config, env: &dyn Environment, out: &mut dyn Write) -> Result<ExitCode> {
    let commands = command_probe(env);
    let probes = Probes {
        env,
        commands: &commands,
    };

    match command {
        PathCommand::Resolve(args) => run_resolve(args, config, &probes, out)?,
        PathCommand::Clean(args) => run_clean(args, config, &probes, out)?,
        PathCommand::List(args) => run_list(args, config, &probes, out)?,
        PathCommand::Mode(args) => run_mode(args, &probes, out)?,
        PathCommand::Rules(args) => run_rules(args, config, out)?,
        PathCommand::Chdir(args) => run_chdir(args, config, &probes, out)?,
    }
    Ok(ExitCode::SUCCESS)
}

static SYSTEM_FS: SystemFs = SystemFs;

struct Probes<'a> {
    env: &'a dyn Environment,
    commands: &'a SystemCommands,
}

impl<'a> Probes<'a> {
    fn resolver(&self, config: &Config) -> PathResolver<'a> {
        PathResolver::new(self.env, &SYSTEM_FS, self.commands).with_fallback(config.path.fallback.clone())
    }
}

/// Look commands up on the `PATH` of `env` rather than the process.
fn command_probe(env: &dyn Environment) -> SystemCommands {
    match env.var("PATH") {
        Some(path) => SystemCommands::with_search_path(path),
        None => SystemCommands::new(),
    }
}

fn shell_for(arg: Option<ShellArg>, env: &dyn Environment) -> ShellType {
    arg.map(ShellType::from)
        .or_else(|| ShellType::detect(env))
        .unwrap_or_default()
}

/// Export a single string value; fish would otherwise split it into a list.
fn export_scalar(shell: ShellType, var: &str, value: &str) -> String {
    match shell {
        ShellType::Fish => format!("set -gx {var} {}", shell_quote(value)),
        _ => format!("export {var}={}", shell_quote(value)),
    }
}

// ============================================================================
// Commands
// ============================================================================

fn run_resolve(args: ResolveArgs, config: &Config, probes: &Probes<'_>, out: &mut dyn Write) -> Result<()> {
    let rules = config.path.rule_table();
    let mut resolver = probes.resolver(config);
    if config.path.inherit && !args.no_inherit {
        resolver = resolver.inherit();
    }
    let separator = resolver.platform().path_separator();
    let list = resolver.resolve(&rules);

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(list)?)?;
    } else {
        let shell = shell_for(args.shell, probes.env);
        writeln!(out, "{}", export_line(shell, list, separator))?;
    }
    Ok(())
}

fn run_clean(args: CleanArgs, config: &Config, probes: &Probes<'_>, out: &mut dyn Write) -> Result<()> {
    let value = match args.path.or_else(|| probes.env.var("PATH")) {
        Some(value) => value,
        None => bail!("PATH is not set; pass --path"),
    };

    let mut resolver = probes.resolver(config).with_inherited(&value);
    let separator = resolver.platform().path_separator();
    if resolver.clean() {
        debug!("Removed missing directories from PATH");
    }
    writeln!(out, "{}", resolver.path_list().to_env_string(separator))?;
    Ok(())
}

fn run_list(args: ListArgs, config: &Config, probes: &Probes<'_>, out: &mut dyn Write) -> Result<()> {
    let rules = config.path.rule_table();
    let mut resolver = probes.resolver(config);
    if config.path.inherit && !args.no_inherit {
        resolver = resolver.inherit();
    }

    for (index, dir) in resolver.resolve(&rules).iter().enumerate() {
        writeln!(out, "{:>3}  {}", index + 1, dir)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct ModeReport<'a> {
    session: &'a SessionMode,
    platform: &'static str,
    path_separator: char,
}

fn run_mode(args: JsonArgs, probes: &Probes<'_>, out: &mut dyn Write) -> Result<()> {
    let resolver = probes.resolver(&Config::default());
    let report = ModeReport {
        session: resolver.mode(),
        platform: resolver.platform().name(),
        path_separator: resolver.platform().path_separator(),
    };

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(out, "Session:  {}", report.session)?;
    writeln!(out, "Platform: {}", report.platform)?;
    if report.session.is_minimal() {
        writeln!(out)?;
        writeln!(out, "Rules requiring full mode are skipped. Set SHELLENV_FULL=1 to override.")?;
    }
    Ok(())
}

fn run_rules(args: JsonArgs, config: &Config, out: &mut dyn Write) -> Result<()> {
    let rules = config.path.rule_table();

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&rules)?)?;
        return Ok(());
    }

    let width = rules.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for rule in &rules {
        writeln!(
            out,
            "{:<width$}  {:<7}  {}  [{}]",
            rule.name, rule.position, rule.template, rule.condition
        )?;
    }
    Ok(())
}

fn run_chdir(args: ChdirArgs, config: &Config, probes: &Probes<'_>, out: &mut dyn Write) -> Result<()> {
    let dir = std::path::absolute(&args.dir)
        .with_context(|| format!("Cannot resolve directory {}", args.dir.display()))?;

    let mut resolver = probes.resolver(config).inherit();
    let separator = resolver.platform().path_separator();

    let previous: Vec<String> = probes
        .env
        .var(TRANSIENT_VAR)
        .map(|value| {
            value
                .split(separator)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    resolver = resolver.with_transients(&previous);
    for old in &previous {
        resolver.remove_transient(Path::new(old));
    }

    // Prepend in reverse so the first configured subdirectory ends up first
    for subdir in config.path.transient_subdirs.iter().rev() {
        let candidate = dir.join(subdir);
        if let Err(e) = resolver.add_transient(&candidate, Position::Prepend) {
            warn!(dir = %candidate.display(), error = %e, "Skipping transient directory");
        }
    }

    let shell = shell_for(args.shell, probes.env);
    writeln!(out, "{}", export_line(shell, resolver.path_list(), separator))?;

    let transients = resolver.transient_entries().join(&separator.to_string());
    if transients.is_empty() {
        writeln!(out, "{}", shell.unset_statement(TRANSIENT_VAR))?;
    } else {
        writeln!(out, "{}", export_scalar(shell, TRANSIENT_VAR, &transients))?;
    }
    Ok(())
}
