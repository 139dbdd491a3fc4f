//! `shellenv history` commands.
//!
//! `classify` follows the zsh `zshaddhistory` hook contract: exit status 0
//! stores the command, 1 discards it.

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use shellenv_common::Environment;
use shellenv_history::{Classification, Classifier, Compactor, HistoryError, HistoryRecord, top_commands_with};
use tracing::{debug, warn};

use crate::cli::{ClassifyArgs, CompactArgs, HistoryCommand, RecordArgs, TopArgs};
use crate::config::Config;

/// Exit status telling zsh to drop the command.
const DISCARD_EXIT: u8 = 1;

/// Run a `history` subcommand.
pub fn run(command: HistoryCommand, config: &Config, env: &dyn Environment, out: &mut dyn Write) -> Result<ExitCode> {
    match command {
        HistoryCommand::Classify(args) => run_classify(args, config, out),
        HistoryCommand::Record(args) => run_record(args, config, env),
        HistoryCommand::Compact(args) => run_compact(args, config, env, out),
        HistoryCommand::Top(args) => run_top(args, config, env, out),
    }
}

/// Invalid configured patterns are reported and skipped.
fn classifier(config: &Config) -> Classifier {
    let (classifier, errors) = Classifier::from_config(&config.history);
    report_pattern_errors(&errors);
    classifier
}

fn compactor(config: &Config) -> Compactor {
    let (compactor, errors) = Compactor::from_config(&config.history);
    report_pattern_errors(&errors);
    compactor
}

fn report_pattern_errors(errors: &[HistoryError]) {
    for error in errors {
        warn!(%error, "Ignoring history pattern");
    }
}

fn run_classify(args: ClassifyArgs, config: &Config, out: &mut dyn Write) -> Result<ExitCode> {
    let command = args.command.join(" ");
    let decision = classifier(config).classify(&command);

    if args.json {
        writeln!(out, "{}", serde_json::to_string(&decision)?)?;
    } else if args.explain {
        match &decision {
            Classification::Store => writeln!(out, "store")?,
            Classification::Discard(reason) => writeln!(out, "discard: {reason}")?,
        }
    }

    Ok(match decision {
        Classification::Store => ExitCode::SUCCESS,
        Classification::Discard(_) => ExitCode::from(DISCARD_EXIT),
    })
}

fn run_record(args: RecordArgs, config: &Config, env: &dyn Environment) -> Result<ExitCode> {
    let log_path = config.history_file(args.file.as_deref(), env)?;
    let record = HistoryRecord::now(args.duration, args.command.join(" "));

    let decision = classifier(config)
        .record(&log_path, &record)
        .with_context(|| format!("Failed to record to {}", log_path.display()))?;

    if let Classification::Discard(reason) = &decision {
        debug!(%reason, "Command not recorded");
    }
    Ok(ExitCode::SUCCESS)
}

fn run_compact(args: CompactArgs, config: &Config, env: &dyn Environment, out: &mut dyn Write) -> Result<ExitCode> {
    let log_path = config.history_file(args.file.as_deref(), env)?;
    let compactor = compactor(config);

    let result = if args.dry_run {
        compactor.plan(&log_path)
    } else {
        compactor.compact(&log_path)
    }
    .with_context(|| format!("Failed to compact {}", log_path.display()))?;

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
        return Ok(ExitCode::SUCCESS);
    }

    if result.dry_run {
        writeln!(out, "Dry run - no changes made to {}", log_path.display())?;
    } else {
        writeln!(out, "Compacted {}", log_path.display())?;
    }
    writeln!(out, "  Records:    {}", result.original_count)?;
    writeln!(out, "  Retained:   {}", result.retained_count)?;
    writeln!(out, "  Discarded:  {}", result.discarded_count)?;
    writeln!(out, "  Duplicates: {}", result.duplicate_count)?;
    Ok(ExitCode::SUCCESS)
}

fn run_top(args: TopArgs, config: &Config, env: &dyn Environment, out: &mut dyn Write) -> Result<ExitCode> {
    let log_path = config.history_file(args.file.as_deref(), env)?;
    let counts = top_commands_with(&log_path, classifier(config).patterns(), args.n)
        .with_context(|| format!("Failed to read {}", log_path.display()))?;

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&counts)?)?;
        return Ok(ExitCode::SUCCESS);
    }

    let width = counts.first().map(|c| c.count.to_string().len()).unwrap_or(1);
    for entry in &counts {
        writeln!(out, "{:>width$}  {}", entry.count, entry.command)?;
    }
    Ok(ExitCode::SUCCESS)
}
