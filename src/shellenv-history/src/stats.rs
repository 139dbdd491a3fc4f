//! Command frequency statistics.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::compactor::{read_snapshot, select_survivors};
use crate::error::Result;
use crate::patterns::PatternSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandCount {
    pub command: String,
    pub count: usize,
}

/// Most frequent command names in the log, highest count first.
///
/// Counts the records a compaction with the default ignore table would keep.
/// See [`top_commands_with`].
pub fn top_commands(log_path: &Path, n: Option<usize>) -> Result<Vec<CommandCount>> {
    top_commands_with(log_path, &PatternSet::defaults(), n)
}

/// Most frequent command names among the records surviving compaction with
/// `patterns`, highest count first.
///
/// The command name is the first whitespace-delimited token of each record.
/// Ties are broken by name. `n = None` returns every name. Reads a snapshot
/// of the log without locking.
pub fn top_commands_with(log_path: &Path, patterns: &PatternSet, n: Option<usize>) -> Result<Vec<CommandCount>> {
    let (entries, _) = read_snapshot(log_path)?;
    let (survivors, _) = select_survivors(entries, patterns);

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in &survivors {
        if let Some(name) = entry.command().split_whitespace().next() {
            *counts.entry(name).or_default() += 1;
        }
    }

    let mut ranked: Vec<CommandCount> = counts
        .into_iter()
        .map(|(command, count)| CommandCount {
            command: command.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.command.cmp(&b.command)));

    if let Some(n) = n {
        ranked.truncate(n);
    }
    Ok(ranked)
}
