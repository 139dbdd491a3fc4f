//! History filtering and compaction.
//!
//! - **Classification**: decides at write time whether a command reaches the
//!   log, using the leading-space convention and a table of ignore globs.
//! - **Compaction**: rewrites a log under an exclusive lock, removing
//!   discardable records and superseded duplicates while keeping survivors
//!   in their original order.
//! - **Statistics**: most frequent command names among surviving records.
//!
//! # Example
//!
//! ```rust,no_run
//! use shellenv_history::{Classifier, Compactor, HistoryRecord};
//! use std::path::Path;
//!
//! let log = Path::new("/home/dev/.zsh_history");
//! let classifier = Classifier::default();
//! classifier.record(log, &HistoryRecord::now(0, "git status")).expect("append failed");
//!
//! let result = Compactor::new(classifier).compact(log).expect("compaction failed");
//! println!("removed {} records", result.removed_count);
//! ```

pub mod atomic_ops;
pub mod classifier;
pub mod compactor;
pub mod config;
pub mod error;
pub mod lock;
pub mod patterns;
pub mod record;
pub mod stats;

pub use classifier::{Classification, Classifier, DiscardReason, classify};
pub use compactor::{CompactionResult, Compactor, read_snapshot, select_survivors};
pub use config::HistoryConfig;
pub use error::{HistoryError, Result};
pub use lock::HistoryLock;
pub use patterns::{IgnorePattern, PatternCategory, PatternSet, default_patterns};
pub use record::{HistoryRecord, LogEntry, LogLine, LogReader};
pub use stats::{CommandCount, top_commands, top_commands_with};
