//! End-to-end tests for history classification and compaction.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use shellenv_history::{
    Classifier, CompactionResult, Compactor, HistoryConfig, HistoryError, HistoryLock, HistoryRecord,
    PatternSet, read_snapshot, top_commands,
};
use tempfile::TempDir;

fn log_with(content: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join(".zsh_history");
    fs::write(&log, content).unwrap();
    (tmp, log)
}

fn commands(log: &Path) -> Vec<String> {
    read_snapshot(log)
        .unwrap()
        .0
        .iter()
        .map(|e| e.command().to_string())
        .collect()
}

fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ============================================================================
// COMPACTION SCENARIOS
// ============================================================================

mod compaction {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_password_export_and_duplicate() {
        let (_tmp, log) = log_with(": 1700000001:0;ls -la\n: 1700000002:0;export PASSWORD=x\n: 1700000003:0;ls -la\n");

        let result = Compactor::default().compact(&log).unwrap();

        assert_eq!(fs::read_to_string(&log).unwrap(), ": 1700000003:0;ls -la\n");
        assert_eq!(
            result,
            CompactionResult {
                original_count: 3,
                retained_count: 1,
                removed_count: 2,
                discarded_count: 1,
                duplicate_count: 1,
                dry_run: false,
            }
        );
    }

    #[test]
    fn test_survivor_order_is_chronological() {
        let names = ["make", "cargo test", "git diff", "vim src/main.rs"];
        let mut content = String::new();
        for i in 0..20u64 {
            let name = names[(i as usize * 3) % names.len()];
            content.push_str(&format!(": {}:0;{}\n", 1000 + i, name));
        }
        let (_tmp, log) = log_with(&content);

        Compactor::default().compact(&log).unwrap();

        let snapshot = read_snapshot(&log).unwrap().0;
        let stamps: Vec<u64> = snapshot
            .iter()
            .map(|e| match e.line() {
                shellenv_history::LogLine::Extended(r) => r.timestamp,
                shellenv_history::LogLine::Plain(_) => unreachable!(),
            })
            .collect();
        let mut sorted = stamps.clone();
        sorted.sort_unstable();
        assert_eq!(stamps, sorted);
        assert_eq!(stamps.len(), names.len());

        // Only the last occurrence of each command survives
        assert_eq!(stamps, vec![1016, 1017, 1018, 1019]);
    }

    #[test]
    fn test_multiline_and_semicolon_records_survive_verbatim() {
        let content = ": 1:0;for f in *.rs; do\\\n  wc -l $f\\\ndone\n: 2:0;a; b; c\n: 3:0;a; b; c\n";
        let (_tmp, log) = log_with(content);

        Compactor::default().compact(&log).unwrap();

        assert_eq!(
            fs::read_to_string(&log).unwrap(),
            ": 1:0;for f in *.rs; do\\\n  wc -l $f\\\ndone\n: 3:0;a; b; c\n"
        );
    }

    #[test]
    fn test_non_utf8_bytes_are_preserved() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("history");
        fs::write(&log, b": 1:0;echo \x83\xa9\n: 2:0;ls -la\n: 3:0;ls -la\n").unwrap();

        Compactor::default().compact(&log).unwrap();
        assert_eq!(fs::read(&log).unwrap(), b": 1:0;echo \x83\xa9\n: 3:0;ls -la\n");
    }

    #[test]
    fn test_distinct_non_utf8_commands_are_not_duplicates() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("history");
        fs::write(&log, b": 1:0;echo \x83\n: 2:0;echo \x84\n: 3:0;make\n: 4:0;make\n").unwrap();

        let result = Compactor::default().compact(&log).unwrap();

        assert_eq!(result.retained_count, 3);
        assert_eq!(fs::read(&log).unwrap(), b": 1:0;echo \x83\n: 2:0;echo \x84\n: 4:0;make\n");
    }

    #[test]
    fn test_clean_log_is_left_alone() {
        let content = ": 1:0;git status\n: 2:0;make\n";
        let (tmp, log) = log_with(content);

        let result = Compactor::default().compact(&log).unwrap();
        assert_eq!(result.removed_count, 0);
        assert_eq!(fs::read_to_string(&log).unwrap(), content);
        assert_eq!(dir_names(tmp.path()), vec![".zsh_history"]);
    }

    #[test]
    fn test_all_discardable_keeps_original() {
        let content = ": 1:0;export PASSWORD=x\n: 2:0;pass show work\n";
        let (tmp, log) = log_with(content);

        let err = Compactor::default().compact(&log).unwrap_err();

        assert!(matches!(err, HistoryError::EmptyResult(_)));
        assert_eq!(fs::read_to_string(&log).unwrap(), content);
        assert_eq!(dir_names(tmp.path()), vec![".zsh_history"]);
    }

    #[test]
    fn test_extra_patterns_from_config() {
        let (_tmp, log) = log_with(": 1:0;deploy --prod\n: 2:0;deploy --staging\n");
        let config = HistoryConfig {
            extra_ignore_patterns: vec!["deploy --prod*".to_string()],
            ..Default::default()
        };

        let (compactor, errors) = Compactor::from_config(&config);
        assert!(errors.is_empty());
        compactor.compact(&log).unwrap();

        assert_eq!(commands(&log), vec!["deploy --staging"]);
    }
}

// ============================================================================
// LOCKING
// ============================================================================

mod locking {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_second_compactor_sees_fresh_lock() {
        let content = ": 1:0;ls -la\n: 2:0;ls -la\n";
        let (_tmp, log) = log_with(content);

        let held = HistoryLock::acquire(&log, Duration::from_secs(300)).unwrap();
        let err = Compactor::default().compact(&log).unwrap_err();

        assert!(matches!(err, HistoryError::Locked { .. }));
        assert!(err.to_string().contains("locked"));
        assert_eq!(fs::read_to_string(&log).unwrap(), content);

        drop(held);
        Compactor::default().compact(&log).unwrap();
        assert_eq!(commands(&log), vec!["ls -la"]);
    }

    #[test]
    fn test_stale_lock_does_not_block() {
        let (_tmp, log) = log_with(": 1:0;ls -la\n: 2:0;ls -la\n");
        fs::create_dir(HistoryLock::path_for(&log)).unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let compactor = Compactor::default().with_lock_stale_after(Duration::from_millis(1));
        compactor.compact(&log).unwrap();

        assert!(!HistoryLock::path_for(&log).exists());
        assert_eq!(commands(&log), vec!["ls -la"]);
    }

    #[test]
    fn test_concurrent_compactions_never_corrupt() {
        let mut content = String::new();
        for i in 0..200 {
            content.push_str(&format!(": {i}:0;echo {}\n", i % 10));
        }
        let (_tmp, log) = log_with(&content);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let log = log.clone();
                std::thread::spawn(move || Compactor::default().compact(&log))
            })
            .collect();

        for handle in handles {
            match handle.join().unwrap() {
                Ok(_) | Err(HistoryError::Locked { .. }) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        let expected: Vec<String> = (190..200).map(|i| format!("echo {}", i % 10)).collect();
        assert_eq!(commands(&log), expected);
    }
}

// ============================================================================
// RECORDING AND STATISTICS
// ============================================================================

mod recording {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_then_compact_then_top() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("history");
        let classifier = Classifier::new(PatternSet::defaults());

        for (ts, command) in [
            (1, "git status"),
            (2, "export GITHUB_TOKEN=ghp_abcdef"),
            (3, " secret-thing"),
            (4, "git commit -m wip"),
            (5, "git status"),
            (6, "cargo build"),
        ] {
            classifier.record(&log, &HistoryRecord::new(ts, 0, command)).unwrap();
        }

        assert_eq!(
            commands(&log),
            vec!["git status", "git commit -m wip", "git status", "cargo build"]
        );

        let result = Compactor::new(classifier).compact(&log).unwrap();
        assert_eq!(result.duplicate_count, 1);

        let top = top_commands(&log, Some(2)).unwrap();
        assert_eq!(top[0].command, "git");
        assert_eq!(top[0].count, 2);
        assert_eq!(top[1].command, "cargo");
    }
}
