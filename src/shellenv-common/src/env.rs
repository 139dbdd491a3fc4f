//! Read-only environment lookup.

use std::collections::HashMap;

/// Source of environment variable values.
///
/// Empty values are reported as absent, matching how shell configuration
/// treats `FOO=` the same as an unset `FOO`.
pub trait Environment {
    /// Value of `name`, or `None` if unset or empty.
    fn var(&self, name: &str) -> Option<String>;

    /// Whether `name` is set to a non-empty value.
    fn is_set(&self, name: &str) -> bool {
        self.var(name).is_some()
    }
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}

/// An in-memory environment.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a variable.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Environment for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).filter(|v| !v.is_empty()).cloned()
    }
}

impl<F> Environment for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        self(name).filter(|v| !v.is_empty())
    }
}

/// Interpret a flag-style variable value (`1`, `true`, `yes`, `on`).
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_env_treats_empty_as_unset() {
        let env = MapEnv::new().with("A", "1").with("B", "");
        assert_eq!(env.var("A").as_deref(), Some("1"));
        assert_eq!(env.var("B"), None);
        assert!(!env.is_set("B"));
        assert!(!env.is_set("C"));
    }

    #[test]
    fn test_closure_environment() {
        let env = |name: &str| (name == "HOME").then(|| "/home/me".to_string());
        assert_eq!(env.var("HOME").as_deref(), Some("/home/me"));
        assert_eq!(env.var("USER"), None);
    }

    #[test]
    fn test_is_truthy() {
        for v in ["1", "true", "TRUE", "yes", " on "] {
            assert!(is_truthy(v), "{v}");
        }
        for v in ["0", "false", "", "nope"] {
            assert!(!is_truthy(v), "{v}");
        }
    }
}
