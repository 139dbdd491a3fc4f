//! Filesystem and command lookups consulted during resolution.
//!
//! The resolver only talks to the outside world through these traits, so
//! tests can substitute in-memory fakes.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use shellenv_common::{GlobError, GlobPattern};
use tracing::trace;

/// Read-only filesystem queries.
pub trait FsProbe {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Expand a pattern with wildcard segments into existing paths, in sorted order.
    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, GlobError>;

    /// Absolute, symlink-free form of `path`, or `None` if it cannot be resolved.
    fn canonicalize(&self, path: &Path) -> Option<PathBuf>;
}

/// Executable lookup.
pub trait CommandProbe {
    fn command_exists(&self, name: &str) -> bool;
}

impl<F> CommandProbe for F
where
    F: Fn(&str) -> bool,
{
    fn command_exists(&self, name: &str) -> bool {
        self(name)
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFs;

impl FsProbe for SystemFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, GlobError> {
        let matcher = GlobPattern::for_path(pattern)?;
        let paths = glob::glob_with(matcher.glob_pattern().as_str(), matcher.options()).map_err(|source| {
            GlobError::Invalid {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        let found: Vec<PathBuf> = paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    trace!(pattern, error = %e, "unreadable directory during glob");
                    None
                }
            })
            .collect();
        if found.is_empty() {
            trace!(pattern, "glob matched nothing");
        }
        Ok(found)
    }

    fn canonicalize(&self, path: &Path) -> Option<PathBuf> {
        dunce::canonicalize(path).ok()
    }
}

/// Executable lookup through `which`.
#[derive(Debug, Clone, Default)]
pub struct SystemCommands {
    search_path: Option<OsString>,
}

impl SystemCommands {
    /// Search the process `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Search an explicit `PATH`-style value instead of the process one.
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

impl CommandProbe for SystemCommands {
    fn command_exists(&self, name: &str) -> bool {
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
                which::which_in(name, Some(paths), cwd).is_ok()
            }
            None => which::which(name).is_ok(),
        };
        trace!(command = name, found, "command lookup");
        found
    }
}
