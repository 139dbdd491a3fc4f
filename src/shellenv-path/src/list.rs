//! The ordered, duplicate-free search path.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::rule::Position;

/// One directory in the search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    /// Directory as it will appear in `PATH`.
    pub dir: String,
    /// Canonical form used for duplicate detection.
    pub key: String,
}

/// What an insertion did to the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Inserted,
    /// Already present; moved to the front by a prepend.
    Moved,
    /// Already present and left where it was.
    Unchanged,
}

/// Ordered sequence of absolute directories with no duplicates.
///
/// `entries` and `index` always hold the same set of keys; every mutation
/// goes through methods that update both.
#[derive(Debug, Clone, Default)]
pub struct PathList {
    entries: Vec<PathEntry>,
    index: HashSet<String>,
}

impl PathList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `PATH`-style value.
    ///
    /// Empty and relative segments are dropped; of duplicate segments the
    /// first occurrence wins.
    pub fn from_env_string(value: &str, separator: char) -> Self {
        let mut list = Self::new();
        for segment in value.split(separator) {
            if segment.is_empty() || !Path::new(segment).is_absolute() {
                continue;
            }
            list.append(segment);
        }
        list
    }

    /// Insert `dir` under the duplicate key `key`.
    ///
    /// A prepend of an existing key moves it to the front; an append of an
    /// existing key leaves it in place.
    pub fn insert(&mut self, dir: impl Into<String>, key: impl Into<String>, position: Position) -> Insertion {
        let key = key.into();

        if self.index.contains(&key) {
            return match position {
                Position::Append => Insertion::Unchanged,
                Position::Prepend => {
                    let Some(at) = self.entries.iter().position(|e| e.key == key) else {
                        return Insertion::Unchanged;
                    };
                    if at == 0 {
                        return Insertion::Unchanged;
                    }
                    let entry = self.entries.remove(at);
                    self.entries.insert(0, entry);
                    Insertion::Moved
                }
            };
        }

        let entry = PathEntry { dir: dir.into(), key: key.clone() };
        match position {
            Position::Prepend => self.entries.insert(0, entry),
            Position::Append => self.entries.push(entry),
        }
        self.index.insert(key);
        Insertion::Inserted
    }

    /// Prepend `dir`, keyed by its lexical normal form.
    pub fn prepend(&mut self, dir: &str) -> Insertion {
        self.insert(dir, lexical_key(dir), Position::Prepend)
    }

    /// Append `dir`, keyed by its lexical normal form.
    pub fn append(&mut self, dir: &str) -> Insertion {
        self.insert(dir, lexical_key(dir), Position::Append)
    }

    /// Remove the entry whose key matches `dir`'s lexical form.
    pub fn remove(&mut self, dir: &str) -> bool {
        self.remove_key(&lexical_key(dir))
    }

    pub fn remove_key(&mut self, key: &str) -> bool {
        if !self.index.remove(key) {
            return false;
        }
        self.entries.retain(|e| e.key != key);
        true
    }

    /// Keep only entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&PathEntry) -> bool) {
        let index = &mut self.index;
        self.entries.retain(|entry| {
            let kept = keep(entry);
            if !kept {
                index.remove(&entry.key);
            }
            kept
        });
    }

    pub fn contains(&self, dir: &str) -> bool {
        self.index.contains(&lexical_key(dir))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains(key)
    }

    /// Directories in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.dir.as_str())
    }

    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_env_string(&self, separator: char) -> String {
        let mut out = String::new();
        for (i, dir) in self.iter().enumerate() {
            if i > 0 {
                out.push(separator);
            }
            out.push_str(dir);
        }
        out
    }
}

impl PartialEq for PathList {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for PathList {}

impl Serialize for PathList {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'a> FromIterator<&'a str> for PathList {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut list = Self::new();
        for dir in iter {
            list.append(dir);
        }
        list
    }
}

/// Lexically normalized form of `dir`: `.` segments, `..` segments and
/// trailing slashes removed without touching the filesystem.
pub fn lexical_key(dir: &str) -> String {
    normalize_path(Path::new(dir)).to_string_lossy().into_owned()
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                // Never climb above the root
                if !normalized.pop() && !path.is_absolute() {
                    normalized.push("..");
                }
            }
            Component::CurDir => {}
            _ => normalized.push(component),
        }
    }

    normalized
}
