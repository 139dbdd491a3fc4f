//! Directory-based lock for preventing concurrent compaction of a log.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use crate::config::LOCK_SUFFIX;
use crate::error::{HistoryError, Result};

/// File inside the lock directory naming the holder.
const OWNER_FILE: &str = "owner";

/// Makes the names stale locks are moved aside to unique within a process.
static RECLAIM_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Exclusive lock on a history log, held as the directory `<log>.lock`.
///
/// `create_dir` is atomic, so exactly one process can create the directory.
/// Its mtime is the staleness signal. The lock is released on drop, unless
/// another process has since reclaimed it as stale.
#[derive(Debug)]
pub struct HistoryLock {
    lock_dir: PathBuf,
    /// Contents of the owner file we wrote, if writing it succeeded.
    owner: Option<String>,
    acquired: bool,
}

impl HistoryLock {
    /// Lock path for `log_path`.
    pub fn path_for(log_path: &Path) -> PathBuf {
        let mut name = log_path.as_os_str().to_owned();
        name.push(LOCK_SUFFIX);
        PathBuf::from(name)
    }

    /// Acquire the lock for `log_path`.
    ///
    /// A lock older than `stale_after` is reclaimed and acquisition retried
    /// once. A fresh lock yields [`HistoryError::Locked`].
    pub fn acquire(log_path: &Path, stale_after: Duration) -> Result<Self> {
        let lock_dir = Self::path_for(log_path);

        for attempt in 0..2 {
            match fs::create_dir(&lock_dir) {
                Ok(()) => {
                    let owner = write_owner(&lock_dir);
                    debug!(lock_dir = %lock_dir.display(), pid = std::process::id(), "Acquired history lock");
                    return Ok(Self {
                        lock_dir,
                        owner,
                        acquired: true,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let age = lock_age(&lock_dir);
                    if age < stale_after || attempt > 0 {
                        debug!(
                            lock_dir = %lock_dir.display(),
                            owner = ?read_owner(&lock_dir),
                            "History lock held by another process"
                        );
                        return Err(HistoryError::Locked {
                            path: log_path.to_path_buf(),
                            age,
                        });
                    }
                    warn!(
                        lock_dir = %lock_dir.display(),
                        age_secs = age.as_secs(),
                        "Removing stale history lock"
                    );
                    if !reclaim(&lock_dir, stale_after)? {
                        return Err(HistoryError::Locked {
                            path: log_path.to_path_buf(),
                            age: Duration::ZERO,
                        });
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(HistoryError::Locked {
            path: log_path.to_path_buf(),
            age: Duration::ZERO,
        })
    }

    pub fn path(&self) -> &Path {
        &self.lock_dir
    }

    /// Release the lock.
    ///
    /// The directory is only removed while its owner file is still ours.
    pub fn release(&mut self) {
        if !self.acquired {
            return;
        }
        self.acquired = false;

        if let Some(owner) = &self.owner {
            let current = fs::read_to_string(self.lock_dir.join(OWNER_FILE)).ok();
            if current.as_deref() != Some(owner.as_str()) {
                warn!(
                    lock_dir = %self.lock_dir.display(),
                    "History lock was reclaimed by another process, leaving it in place"
                );
                return;
            }
        }

        if let Err(e) = fs::remove_dir_all(&self.lock_dir) {
            warn!(
                error = %e,
                lock_dir = %self.lock_dir.display(),
                "Failed to remove history lock"
            );
        } else {
            debug!(lock_dir = %self.lock_dir.display(), "Released history lock");
        }
    }
}

impl Drop for HistoryLock {
    fn drop(&mut self) {
        self.release();
    }
}

fn lock_age(lock_dir: &Path) -> Duration {
    fs::metadata(lock_dir)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .unwrap_or_default()
}

/// Move a stale lock aside, then delete it.
///
/// Only one process can rename a given directory, so two processes that both
/// saw the same stale lock cannot both reclaim it. If the directory moved
/// aside turns out to be fresh, someone took the lock in between and it is
/// put back. Returns whether the lock path is now free.
fn reclaim(lock_dir: &Path, stale_after: Duration) -> Result<bool> {
    let aside = aside_path(lock_dir);
    match fs::rename(lock_dir, &aside) {
        Ok(()) => {}
        // Already reclaimed by someone else
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e.into()),
    }

    if lock_age(&aside) < stale_after {
        debug!(lock_dir = %lock_dir.display(), "History lock was retaken during reclaim, restoring it");
        if let Err(e) = fs::rename(&aside, lock_dir) {
            warn!(error = %e, aside = %aside.display(), "Failed to restore history lock");
        }
        return Ok(false);
    }

    if let Err(e) = fs::remove_dir_all(&aside) {
        warn!(error = %e, aside = %aside.display(), "Failed to remove stale history lock");
    }
    Ok(true)
}

/// `<lock>.stale.<pid>.<n>`
fn aside_path(lock_dir: &Path) -> PathBuf {
    let mut name = lock_dir.as_os_str().to_owned();
    name.push(format!(
        ".stale.{}.{}",
        std::process::id(),
        RECLAIM_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    PathBuf::from(name)
}

/// Best effort: the lock is valid without the owner file.
fn write_owner(lock_dir: &Path) -> Option<String> {
    let acquired_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true);
    let content = format!("{}\n{}\n", std::process::id(), acquired_at);
    match fs::write(lock_dir.join(OWNER_FILE), &content) {
        Ok(()) => Some(content),
        Err(e) => {
            debug!(error = %e, "Could not write lock owner file");
            None
        }
    }
}

/// `(pid, acquired_at)` recorded by the holder, if readable.
pub fn read_owner(lock_dir: &Path) -> Option<(u32, String)> {
    let content = fs::read_to_string(lock_dir.join(OWNER_FILE)).ok()?;
    let mut lines = content.lines();
    let pid = lines.next()?.trim().parse().ok()?;
    let acquired_at = lines.next().unwrap_or_default().to_string();
    Some((pid, acquired_at))
}
