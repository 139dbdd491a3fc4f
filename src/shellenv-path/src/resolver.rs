//! Search path resolution.
//!
//! A [`PathResolver`] owns one session's [`PathList`]. It is seeded with the
//! inherited `PATH` (optionally), applies a [`RuleTable`] on top, and then
//! tracks directory-local transient entries for the rest of the session.
//!
//! Per candidate, resolution is: expand the template, expand any glob
//! segment, evaluate the rule's condition, require an existing directory,
//! then insert at the rule's position. Every failure along the way skips
//! that candidate only. If nothing survives, [`FALLBACK_PATH`] is used so
//! the result is never empty.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use shellenv_common::{Environment, Platform, SessionMode, expand_glob_template, expand_template, has_wildcards};
use tracing::{debug, info, warn};

use crate::error::{PathError, Result};
use crate::list::{Insertion, PathList, lexical_key};
use crate::probe::{CommandProbe, FsProbe};
use crate::rule::{EvalContext, PathRule, Position, RuleTable};

/// Minimal system search path used when resolution produces nothing.
pub const FALLBACK_PATH: &[&str] = &["/usr/local/bin", "/usr/bin", "/bin", "/usr/sbin", "/sbin"];

/// Builds and maintains one session's search path.
pub struct PathResolver<'a> {
    env: &'a dyn Environment,
    fs: &'a dyn FsProbe,
    commands: &'a dyn CommandProbe,
    mode: SessionMode,
    platform: Platform,
    list: PathList,
    /// Transient entries added by this resolver: lexical dir -> duplicate key.
    transient: IndexMap<String, String>,
    fallback: Vec<String>,
}

impl<'a> PathResolver<'a> {
    /// Create a resolver with an empty list.
    ///
    /// Session mode and platform are detected once here; container markers
    /// are checked through `fs`.
    pub fn new(env: &'a dyn Environment, fs: &'a dyn FsProbe, commands: &'a dyn CommandProbe) -> Self {
        let mode = SessionMode::detect_with(env, &|p: &Path| fs.exists(p));
        let platform = Platform::detect(env);
        Self {
            env,
            fs,
            commands,
            mode,
            platform,
            list: PathList::new(),
            transient: IndexMap::new(),
            fallback: FALLBACK_PATH.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SessionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Replace the fallback used when resolution yields an empty list.
    ///
    /// An empty `fallback` is ignored.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Vec<String>) -> Self {
        if !fallback.is_empty() {
            self.fallback = fallback;
        }
        self
    }

    /// Seed the list with an existing `PATH`-style value.
    ///
    /// Entries are deduplicated by canonical form; the first occurrence wins.
    #[must_use]
    pub fn with_inherited(mut self, value: &str) -> Self {
        let separator = self.platform.path_separator();
        for dir in PathList::from_env_string(value, separator).iter() {
            let key = self.key_for(Path::new(dir));
            self.list.insert(dir, key, Position::Append);
        }
        debug!(entries = self.list.len(), "seeded from inherited PATH");
        self
    }

    /// Seed the list from the environment's `PATH`.
    #[must_use]
    pub fn inherit(self) -> Self {
        match self.env.var("PATH") {
            Some(path) => self.with_inherited(&path),
            None => self,
        }
    }

    /// Restore transient bookkeeping from a previous invocation.
    ///
    /// Directories already in the list are adopted as transient; others are
    /// added in front.
    #[must_use]
    pub fn with_transients<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let dirs: Vec<String> = dirs.into_iter().map(|d| d.as_ref().to_string()).collect();
        for dir in dirs.iter().rev() {
            let lexical = lexical_key(dir);
            let key = self.key_for(Path::new(dir));
            if self.list.contains_key(&key) {
                self.transient.insert(lexical, key);
            } else if let Err(e) = self.add_transient(Path::new(dir), Position::Prepend) {
                debug!(dir = %dir, error = %e, "dropping stale transient entry");
            }
        }
        self
    }

    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn path_list(&self) -> &PathList {
        &self.list
    }

    pub fn into_path_list(self) -> PathList {
        self.list
    }

    /// Apply `rules` in table order on top of the current list.
    pub fn resolve(&mut self, rules: &RuleTable) -> &PathList {
        for rule in rules {
            match self.apply_rule(rule) {
                Ok(0) => {}
                Ok(inserted) => debug!(rule = %rule.name, inserted, "applied path rule"),
                Err(e @ PathError::Expand(shellenv_common::ExpandError::Unresolved(_))) => {
                    debug!(rule = %rule.name, error = %e, "skipping path rule");
                }
                Err(e) => warn!(rule = %rule.name, error = %e, "skipping path rule"),
            }
        }

        if self.list.is_empty() {
            warn!("resolved PATH is empty, using fallback");
            for dir in &self.fallback {
                self.list.append(dir);
            }
        }

        info!(entries = self.list.len(), mode = %self.mode, platform = %self.platform, "PATH resolved");
        &self.list
    }

    /// Returns the number of candidates that changed the list.
    fn apply_rule(&mut self, rule: &PathRule) -> Result<usize> {
        let ctx = EvalContext {
            env: self.env,
            fs: self.fs,
            commands: self.commands,
            mode: &self.mode,
            platform: self.platform,
        };

        // Candidate-independent conditions are checked before expansion so a
        // disabled rule never reports an unset variable.
        if !rule.condition.needs_candidate() && !rule.condition.evaluate(Path::new(""), &ctx) {
            return Ok(0);
        }

        // Only the template itself can introduce wildcards; variable values match literally
        let is_glob = has_wildcards(&rule.template);
        let expanded = if is_glob {
            expand_glob_template(&rule.template, self.env)?
        } else {
            expand_template(&rule.template, self.env)?
        };
        if !Path::new(&expanded).is_absolute() {
            return Err(PathError::RelativeCandidate {
                rule: rule.name.clone(),
                path: expanded,
            });
        }

        let candidates: Vec<String> = if is_glob {
            self.fs
                .glob(&expanded)?
                .into_iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect()
        } else {
            vec![expanded]
        };

        let accepted: Vec<(String, String)> = candidates
            .into_iter()
            .filter(|dir| {
                let path = Path::new(dir);
                rule.condition.evaluate(path, &ctx) && self.fs.is_dir(path)
            })
            .map(|dir| {
                let key = self.key_for(Path::new(&dir));
                (dir, key)
            })
            .collect();

        // Prepend in reverse so a multi-match glob keeps its sorted order
        let ordered: Box<dyn Iterator<Item = (String, String)>> = match rule.position {
            Position::Prepend => Box::new(accepted.into_iter().rev()),
            Position::Append => Box::new(accepted.into_iter()),
        };

        let mut changed = 0;
        for (dir, key) in ordered {
            if self.list.insert(dir, key, rule.position) != Insertion::Unchanged {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Drop entries that no longer exist; see [`clean`].
    ///
    /// Returns true if the list changed.
    pub fn clean(&mut self) -> bool {
        let cleaned = clean(&self.list, self.fs);
        if cleaned == self.list {
            return false;
        }
        self.list = cleaned;
        let list = &self.list;
        self.transient.retain(|_, key| list.contains_key(key));
        true
    }

    /// Add a directory-local entry.
    ///
    /// Returns `Ok(false)` if `dir` does not exist or is already in the list;
    /// in the latter case the entry is not tracked, so [`remove_transient`]
    /// will never remove a path it did not add.
    ///
    /// [`remove_transient`]: PathResolver::remove_transient
    pub fn add_transient(&mut self, dir: &Path, position: Position) -> Result<bool> {
        let dir_str = dir.to_string_lossy().into_owned();
        if !dir.is_absolute() {
            return Err(PathError::RelativeCandidate {
                rule: "transient".to_string(),
                path: dir_str,
            });
        }
        if !self.fs.is_dir(dir) {
            debug!(dir = %dir.display(), "transient directory does not exist");
            return Ok(false);
        }

        let key = self.key_for(dir);
        if self.list.contains_key(&key) {
            debug!(dir = %dir.display(), "transient directory already in PATH");
            return Ok(false);
        }

        self.list.insert(dir_str.clone(), key.clone(), position);
        self.transient.insert(lexical_key(&dir_str), key);
        debug!(dir = %dir.display(), %position, "added transient entry");
        Ok(true)
    }

    /// Remove a directory previously added by [`add_transient`].
    ///
    /// [`add_transient`]: PathResolver::add_transient
    pub fn remove_transient(&mut self, dir: &Path) -> bool {
        let lexical = lexical_key(&dir.to_string_lossy());
        let key = match self.transient.shift_remove(&lexical) {
            Some(key) => key,
            None => {
                // Fall back to the canonical form in case `dir` was spelled differently
                let key = self.key_for(dir);
                let Some(found) = self.transient.iter().position(|(_, k)| *k == key) else {
                    return false;
                };
                self.transient.shift_remove_index(found);
                key
            }
        };
        let removed = self.list.remove_key(&key);
        debug!(dir = %dir.display(), removed, "removed transient entry");
        removed
    }

    /// Transient directories currently in the list, oldest first.
    pub fn transient_entries(&self) -> Vec<&str> {
        let keys: HashSet<&str> = self.transient.values().map(String::as_str).collect();
        self.list
            .entries()
            .iter()
            .filter(|e| keys.contains(e.key.as_str()))
            .map(|e| e.dir.as_str())
            .collect()
    }

    /// Canonical duplicate key, falling back to the lexical form.
    fn key_for(&self, dir: &Path) -> String {
        match self.fs.canonicalize(dir) {
            Some(canonical) => canonical.to_string_lossy().into_owned(),
            None => lexical_key(&dir.to_string_lossy()),
        }
    }
}

/// Remove entries that no longer exist on disk.
///
/// If that would leave the list empty the original is returned unchanged.
/// Idempotent.
pub fn clean(list: &PathList, fs: &dyn FsProbe) -> PathList {
    let mut cleaned = list.clone();
    cleaned.retain(|entry| fs.is_dir(Path::new(&entry.dir)));

    if cleaned.is_empty() && !list.is_empty() {
        warn!(entries = list.len(), "cleaning would empty PATH, keeping it unchanged");
        return list.clone();
    }

    let removed = list.len() - cleaned.len();
    if removed > 0 {
        info!(removed, "removed missing PATH entries");
    }
    cleaned
}

/// Resolve `rules` into a fresh list without inheriting the current `PATH`.
pub fn resolve(
    rules: &RuleTable,
    env: &dyn Environment,
    fs: &dyn FsProbe,
    commands: &dyn CommandProbe,
) -> PathList {
    let mut resolver = PathResolver::new(env, fs, commands);
    resolver.resolve(rules);
    resolver.into_path_list()
}
