//! Offline compaction of a history log.
//!
//! Compaction drops records matching an ignore pattern and every record whose
//! exact command text appears again later. Survivors keep their original
//! relative order.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::atomic_ops::{
    append_tail, backup_path_for, commit, copy_permissions, remove_if_exists, temp_path_for, timestamp_now, write_entries,
};
use crate::classifier::{Classifier, classify};
use crate::config::{DEFAULT_LOCK_STALE_SECS, HistoryConfig};
use crate::error::{HistoryError, Result};
use crate::lock::HistoryLock;
use crate::patterns::PatternSet;
use crate::record::{LogEntry, LogReader};

/// Counts from one compaction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompactionResult {
    pub original_count: usize,
    pub retained_count: usize,
    /// `discarded_count + duplicate_count`
    pub removed_count: usize,
    pub discarded_count: usize,
    pub duplicate_count: usize,
    pub dry_run: bool,
}

/// Rewrites history logs under an exclusive lock.
#[derive(Debug, Clone)]
pub struct Compactor {
    classifier: Classifier,
    lock_stale_after: Duration,
}

impl Default for Compactor {
    fn default() -> Self {
        Self::new(Classifier::default())
    }
}

impl Compactor {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            lock_stale_after: Duration::from_secs(DEFAULT_LOCK_STALE_SECS),
        }
    }

    /// Build from configuration; invalid patterns are skipped and returned.
    pub fn from_config(config: &HistoryConfig) -> (Self, Vec<HistoryError>) {
        let (classifier, errors) = Classifier::from_config(config);
        let compactor = Self::new(classifier).with_lock_stale_after(config.lock_stale_after());
        (compactor, errors)
    }

    #[must_use]
    pub fn with_lock_stale_after(mut self, stale_after: Duration) -> Self {
        self.lock_stale_after = stale_after;
        self
    }

    /// Compute what [`compact`](Self::compact) would do without writing anything.
    pub fn plan(&self, log_path: &Path) -> Result<CompactionResult> {
        let (entries, _) = read_snapshot(log_path)?;
        let (_, mut result) = select_survivors(entries, self.classifier.patterns());
        result.dry_run = true;
        Ok(result)
    }

    /// Compact `log_path` in place.
    ///
    /// Fails with [`HistoryError::Locked`] if another process holds a fresh
    /// lock, and with [`HistoryError::EmptyResult`] if the rewritten log would
    /// be empty. On any failure the original log is left as it was.
    pub fn compact(&self, log_path: &Path) -> Result<CompactionResult> {
        let _lock = HistoryLock::acquire(log_path, self.lock_stale_after)?;

        let (entries, snapshot_len) = read_snapshot(log_path)?;
        let (survivors, result) = select_survivors(entries, self.classifier.patterns());

        if result.removed_count == 0 {
            info!(path = %log_path.display(), records = result.original_count, "Nothing to compact");
            return Ok(result);
        }

        let backup = backup_path_for(log_path, timestamp_now());
        fs::copy(log_path, &backup)?;
        let temp = temp_path_for(log_path);

        match replace_log(log_path, &temp, &survivors, snapshot_len) {
            Ok(()) => {
                if let Err(e) = remove_if_exists(&backup) {
                    warn!(error = %e, backup = %backup.display(), "Failed to remove compaction backup");
                }
                info!(
                    path = %log_path.display(),
                    original = result.original_count,
                    retained = result.retained_count,
                    discarded = result.discarded_count,
                    duplicates = result.duplicate_count,
                    "Compacted history log"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, path = %log_path.display(), "Compaction failed, restoring original log");
                if let Err(cleanup) = remove_if_exists(&temp) {
                    warn!(error = %cleanup, "Failed to remove compaction temp file");
                }
                restore_backup(log_path, &backup, snapshot_len)?;
                Err(e)
            }
        }
    }
}

/// Write survivors to `temp`, then swap it in for the log.
fn replace_log(log_path: &Path, temp: &Path, survivors: &[LogEntry], snapshot_len: u64) -> Result<()> {
    let written = write_entries(temp, survivors)?;
    if written == 0 {
        return Err(HistoryError::EmptyResult(log_path.to_path_buf()));
    }
    copy_permissions(log_path, temp)?;
    append_tail(log_path, snapshot_len, temp)?;
    commit(temp, log_path)?;
    Ok(())
}

/// Put the backup back as the active log unless the log is still intact.
fn restore_backup(log_path: &Path, backup: &Path, snapshot_len: u64) -> Result<()> {
    let intact = fs::metadata(log_path).map(|m| m.len() >= snapshot_len).unwrap_or(false);
    if intact {
        remove_if_exists(backup)?;
    } else {
        fs::rename(backup, log_path)?;
        debug!(path = %log_path.display(), "Restored history log from backup");
    }
    Ok(())
}

/// Read every record present when the file was opened.
///
/// Returns the entries and the byte length they were read from.
pub fn read_snapshot(log_path: &Path) -> Result<(Vec<LogEntry>, u64)> {
    let file = match File::open(log_path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HistoryError::NotFound(log_path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    let len = file.metadata()?.len();
    let entries = LogReader::new(BufReader::new(file.take(len))).collect::<std::io::Result<Vec<_>>>()?;
    debug!(path = %log_path.display(), records = entries.len(), bytes = len, "Read history snapshot");
    Ok((entries, len))
}

/// Drop discardable records and all but the last occurrence of each command.
///
/// Survivors come back in ascending original position.
pub fn select_survivors(entries: Vec<LogEntry>, patterns: &PatternSet) -> (Vec<LogEntry>, CompactionResult) {
    let mut result = CompactionResult {
        original_count: entries.len(),
        ..Default::default()
    };

    let mut kept: Vec<Option<LogEntry>> = Vec::with_capacity(entries.len());
    // Keyed on raw bytes so distinct non-UTF-8 commands never collapse
    let mut last_seen: HashMap<Vec<u8>, usize> = HashMap::new();

    for entry in entries {
        if !classify(entry.command(), patterns).is_store() {
            result.discarded_count += 1;
            continue;
        }
        if let Some(previous) = last_seen.insert(entry.command_bytes().to_vec(), kept.len()) {
            kept[previous] = None;
            result.duplicate_count += 1;
        }
        kept.push(Some(entry));
    }

    let survivors: Vec<LogEntry> = kept.into_iter().flatten().collect();
    result.retained_count = survivors.len();
    result.removed_count = result.discarded_count + result.duplicate_count;
    (survivors, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn entries(lines: &[&str]) -> Vec<LogEntry> {
        lines.iter().map(|l| LogEntry::from_bytes(l.as_bytes().to_vec())).collect()
    }

    fn commands(entries: &[LogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.command()).collect()
    }

    #[test]
    fn test_last_occurrence_wins_in_original_order() {
        let (survivors, result) = select_survivors(
            entries(&[
                ": 1:0;ls -la",
                ": 2:0;git status",
                ": 3:0;export PASSWORD=x",
                ": 4:0;make",
                ": 5:0;ls -la",
                ": 6:0;git status",
            ]),
            &PatternSet::defaults(),
        );

        assert_eq!(commands(&survivors), vec!["make", "ls -la", "git status"]);
        assert_eq!(
            survivors.iter().map(|e| e.as_bytes()).collect::<Vec<_>>(),
            vec![&b": 4:0;make"[..], &b": 5:0;ls -la"[..], &b": 6:0;git status"[..]]
        );
        assert_eq!(
            result,
            CompactionResult {
                original_count: 6,
                retained_count: 3,
                removed_count: 3,
                discarded_count: 1,
                duplicate_count: 2,
                dry_run: false,
            }
        );
    }

    #[test]
    fn test_dedup_is_exact_text() {
        let (survivors, _) = select_survivors(
            entries(&[": 1:0;git  status", ": 2:0;git status", "git status"]),
            &PatternSet::new(),
        );
        assert_eq!(commands(&survivors), vec!["git  status", "git status"]);
    }

    #[test]
    fn test_dedup_distinguishes_invalid_utf8() {
        let raw: Vec<LogEntry> = [&b": 1:0;echo \x83"[..], &b": 2:0;echo \x84"[..], &b": 3:0;make"[..], &b": 4:0;make"[..]]
            .into_iter()
            .map(|line| LogEntry::from_bytes(line.to_vec()))
            .collect();

        let (survivors, result) = select_survivors(raw, &PatternSet::new());

        assert_eq!(
            survivors.iter().map(|e| e.as_bytes()).collect::<Vec<_>>(),
            vec![&b": 1:0;echo \x83"[..], &b": 2:0;echo \x84"[..], &b": 4:0;make"[..]]
        );
        assert_eq!(result.duplicate_count, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_compact_keeps_log_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("history");
        fs::write(&log, ": 1:0;ls\n: 2:0;ls\n").unwrap();
        fs::set_permissions(&log, fs::Permissions::from_mode(0o600)).unwrap();

        Compactor::default().compact(&log).unwrap();

        assert_eq!(fs::read_to_string(&log).unwrap(), ": 2:0;ls\n");
        assert_eq!(fs::metadata(&log).unwrap().permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn test_compact_rewrites_log() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("history");
        fs::write(&log, ": 1:0;ls -la\n: 2:0;export PASSWORD=x\n: 3:0;ls -la\n").unwrap();

        let result = Compactor::default().compact(&log).unwrap();

        assert_eq!(fs::read_to_string(&log).unwrap(), ": 3:0;ls -la\n");
        assert_eq!(result.removed_count, 2);
        assert!(!HistoryLock::path_for(&log).exists());
        assert!(!temp_path_for(&log).exists());
        let leftovers: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "backup should be removed");
    }

    #[test]
    fn test_plan_does_not_touch_file() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("history");
        let content = ": 1:0;ls -la\n: 2:0;ls -la\n";
        fs::write(&log, content).unwrap();

        let result = Compactor::default().plan(&log).unwrap();
        assert!(result.dry_run);
        assert_eq!(result.duplicate_count, 1);
        assert_eq!(fs::read_to_string(&log).unwrap(), content);
    }

    #[test]
    fn test_missing_log_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("missing");
        assert!(matches!(
            Compactor::default().compact(&log),
            Err(HistoryError::NotFound(_))
        ));
        assert!(!HistoryLock::path_for(&log).exists());
    }
}
