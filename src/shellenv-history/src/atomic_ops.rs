//! File operations used by compaction.
//!
//! The live log is only ever changed by one `rename` of a fully written and
//! synced temp file over it. Everything before that point works on copies.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{BACKUP_SUFFIX, TEMP_SUFFIX};
use crate::record::LogEntry;

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// `<log>.tmp`
pub fn temp_path_for(log_path: &Path) -> PathBuf {
    with_suffix(log_path, TEMP_SUFFIX)
}

/// `<log>.<unix_ts>.bak`
pub fn backup_path_for(log_path: &Path, timestamp: u64) -> PathBuf {
    with_suffix(log_path, &format!(".{timestamp}{BACKUP_SUFFIX}"))
}

/// Get current Unix timestamp.
pub fn timestamp_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

/// Write `entries`, one per line, to `path` and sync it to disk.
///
/// Returns the number of bytes written.
pub fn write_entries<'a>(path: &Path, entries: impl IntoIterator<Item = &'a LogEntry>) -> io::Result<u64> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut written = 0u64;

    for entry in entries {
        writer.write_all(entry.as_bytes())?;
        writer.write_all(b"\n")?;
        written += entry.as_bytes().len() as u64 + 1;
    }
    writer.flush()?;

    // Sync to disk for durability
    writer.get_ref().sync_all()?;

    debug!(path = %path.display(), bytes = written, "Wrote compacted entries");
    Ok(written)
}

/// Give `dst` the permission bits of `src`.
///
/// A private log must stay private once the rewritten copy replaces it.
pub fn copy_permissions(src: &Path, dst: &Path) -> io::Result<()> {
    let permissions = fs::metadata(src)?.permissions();
    fs::set_permissions(dst, permissions)
}

/// Append everything in `src` past `offset` to `dst`.
///
/// Picks up records that other shells appended after the log was read.
/// Returns the number of bytes copied.
pub fn append_tail(src: &Path, offset: u64, dst: &Path) -> io::Result<u64> {
    let mut source = File::open(src)?;
    if source.metadata()?.len() <= offset {
        return Ok(0);
    }
    source.seek(SeekFrom::Start(offset))?;

    let mut target = OpenOptions::new().append(true).open(dst)?;
    let copied = io::copy(&mut source, &mut target)?;
    target.sync_all()?;

    debug!(src = %src.display(), bytes = copied, "Carried over concurrently appended records");
    Ok(copied)
}

/// Replace `target` with `temp` in one atomic step.
pub fn commit(temp: &Path, target: &Path) -> io::Result<()> {
    fs::rename(temp, target)?;
    debug!(path = %target.display(), "Atomic replace completed");
    Ok(())
}

/// Remove `path`, ignoring a file that is already gone.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
