//! Glob-style pattern compilation.
//!
//! Both the PATH rule templates and the history ignore table are written as
//! shell globs. They share this compiler, a thin layer over [`glob::Pattern`],
//! so the two engines agree on what a pattern means:
//!
//! - `*` matches any sequence of characters (including none)
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]`, `[!abc]` match one character from (or not from) a set
//! - `\x` matches `x` literally
//!
//! In path mode ([`GlobPattern::for_path`]) wildcards never match `/` and a
//! leading `.` must be written literally, so a pattern only expands within a
//! single path segment and skips hidden entries.

use glob::{MatchOptions, Pattern, PatternError};
use thiserror::Error;

/// Errors produced while compiling a glob.
#[derive(Debug, Error)]
pub enum GlobError {
    #[error("invalid glob pattern '{pattern}': {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: PatternError,
    },
}

fn path_options() -> MatchOptions {
    let mut options = MatchOptions::new();
    options.require_literal_separator = true;
    options.require_literal_leading_dot = true;
    options
}

/// A compiled, anchored glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    source: String,
    pattern: Pattern,
    options: MatchOptions,
}

impl GlobPattern {
    /// Compile a pattern for matching free text (command lines).
    pub fn new(pattern: &str) -> Result<Self, GlobError> {
        Self::compile(pattern, MatchOptions::new())
    }

    /// Compile a pattern whose wildcards stay within one path segment.
    pub fn for_path(pattern: &str) -> Result<Self, GlobError> {
        Self::compile(pattern, path_options())
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The compiled pattern in `glob` crate syntax.
    pub fn glob_pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn options(&self) -> MatchOptions {
        self.options
    }

    /// Whether the whole of `text` matches the pattern.
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.matches_with(text, self.options)
    }

    fn compile(pattern: &str, options: MatchOptions) -> Result<Self, GlobError> {
        let compiled = Pattern::new(&normalize(pattern)).map_err(|source| GlobError::Invalid {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            source: pattern.to_string(),
            pattern: compiled,
            options,
        })
    }
}

impl std::fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Returns true if `text` contains an unescaped glob metacharacter.
pub fn has_wildcards(text: &str) -> bool {
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '*' | '?' | '[' => return true,
            _ => {}
        }
    }
    false
}

/// Backslash-escape every character that is special in a glob.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '?' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Rewrite `\x` escapes into the bracket form `glob` understands and collapse
/// runs of `*`, which `glob` would otherwise read as a recursive wildcard.
fn normalize(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next @ ('*' | '?' | '[' | ']')) => {
                    out.push('[');
                    out.push(next);
                    out.push(']');
                }
                Some(next) => out.push(next),
                None => out.push('\\'),
            },
            '*' => {
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
                out.push('*');
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(pattern: &str, text: &str) -> bool {
        GlobPattern::new(pattern).unwrap().matches(text)
    }

    #[test]
    fn test_star_matches_any_sequence() {
        assert!(m("export *PASSWORD*=*", "export DB_PASSWORD=hunter2"));
        assert!(m("*", ""));
        assert!(m("git*", "git"));
        assert!(!m("git*", "gti status"));
        assert!(m("a**b", "a/x/b"));
    }

    #[test]
    fn test_question_mark_matches_one_char() {
        assert!(m("l?", "ls"));
        assert!(!m("l?", "l"));
        assert!(!m("l?", "lsa"));
    }

    #[test]
    fn test_match_is_anchored() {
        assert!(!m("ls", "ls -la"));
        assert!(!m("ls", "echo ls"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(m("a.b", "a.b"));
        assert!(!m("a.b", "axb"));
        assert!(m("(x)+{y}|$z", "(x)+{y}|$z"));
    }

    #[test]
    fn test_character_classes() {
        assert!(m("[abc]x", "bx"));
        assert!(!m("[abc]x", "dx"));
        assert!(m("[a-c]x", "cx"));
        assert!(m("[!abc]x", "dx"));
        assert!(!m("[!abc]x", "ax"));
        assert!(m("[]]", "]"));
    }

    #[test]
    fn test_unterminated_class_is_invalid() {
        let err = GlobPattern::new("[abc").unwrap_err();
        assert!(err.to_string().contains("[abc"));
    }

    #[test]
    fn test_escapes() {
        assert!(m(r"\*", "*"));
        assert!(!m(r"\*", "x"));
        assert!(m(r"\[x\]", "[x]"));
        assert!(m(r"a\\", r"a\"));
        assert!(m(r"a\", r"a\"));
    }

    #[test]
    fn test_escape_round_trips_through_matcher() {
        for text in [r"C:\odd[1]", "what?*", "plain"] {
            assert!(m(&escape(text), text), "{text}");
            assert!(!has_wildcards(&escape(text)), "{text}");
        }
    }

    #[test]
    fn test_star_spans_newlines() {
        assert!(m("*token*", "curl \\\n -H token"));
    }

    #[test]
    fn test_path_mode_stays_in_segment() {
        let p = GlobPattern::for_path("/opt/*/bin").unwrap();
        assert!(p.matches("/opt/node/bin"));
        assert!(!p.matches("/opt/a/b/bin"));
        assert!(!p.matches("/opt/.hidden/bin"));

        let free = GlobPattern::new("/opt/*/bin").unwrap();
        assert!(free.matches("/opt/a/b/bin"));
    }

    #[test]
    fn test_has_wildcards() {
        assert!(has_wildcards("~/.nvm/versions/node/*/bin"));
        assert!(has_wildcards("/opt/v?/bin"));
        assert!(has_wildcards("/opt/[ab]/bin"));
        assert!(!has_wildcards("/usr/local/bin"));
        assert!(!has_wildcards(r"/odd\*dir"));
    }
}
