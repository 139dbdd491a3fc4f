//! Shell-style variable expansion for path templates.
//!
//! Supported forms:
//! - `$NAME` and `${NAME}` - substitute the variable value
//! - `${NAME:-default}` - substitute the value, or the expanded `default` if unset/empty
//! - a leading `~` or `~/` - substitute `$HOME`
//!
//! A reference to an unset variable without a default is an error; callers
//! resolving PATH rules treat it as "skip this candidate".

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::env::Environment;

/// Group 1/2: braced name and optional default. Group 3: bare name.
static VAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("variable regex pattern is valid and tested")
});

/// Errors that can occur during template expansion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// Variable referenced without a default and not set.
    #[error("variable '{0}' is not set")]
    Unresolved(String),

    /// `${` without a matching `}` or an invalid name inside braces.
    #[error("malformed variable reference in '{0}'")]
    Malformed(String),
}

/// Expand `template` against `env`.
pub fn expand_template(template: &str, env: &dyn Environment) -> Result<String, ExpandError> {
    expand_with(template, env, &|value: &str| value.to_string())
}

/// Expand a template that is a glob, escaping substituted values so they
/// only ever match literally.
pub fn expand_glob_template(template: &str, env: &dyn Environment) -> Result<String, ExpandError> {
    expand_with(template, env, &crate::pattern::escape)
}

fn expand_with(template: &str, env: &dyn Environment, quote: &dyn Fn(&str) -> String) -> Result<String, ExpandError> {
    let template = expand_tilde(template, env, quote)?;

    // Anything still shaped like `${` once valid references are removed is broken
    if VAR_REGEX.replace_all(&template, "").contains("${") {
        return Err(ExpandError::Malformed(template));
    }

    let mut result = String::with_capacity(template.len());
    let mut last = 0;

    for cap in VAR_REGEX.captures_iter(&template) {
        let Some(whole) = cap.get(0) else { continue };
        result.push_str(&template[last..whole.start()]);

        let (name, default) = match (cap.get(1), cap.get(3)) {
            (Some(braced), _) => (braced.as_str(), cap.get(2).map(|d| d.as_str())),
            (None, Some(bare)) => (bare.as_str(), None),
            (None, None) => continue,
        };

        let value = match (env.var(name), default) {
            (Some(value), _) => quote(&value),
            (None, Some(default)) => expand_with(default, env, quote)?,
            (None, None) => return Err(ExpandError::Unresolved(name.to_string())),
        };
        result.push_str(&value);
        last = whole.end();
    }
    result.push_str(&template[last..]);

    Ok(result)
}

fn expand_tilde(template: &str, env: &dyn Environment, quote: &dyn Fn(&str) -> String) -> Result<String, ExpandError> {
    let rest = if template == "~" {
        ""
    } else if let Some(rest) = template.strip_prefix("~/") {
        rest
    } else {
        return Ok(template.to_string());
    };

    let home = env
        .var("HOME")
        .ok_or_else(|| ExpandError::Unresolved("HOME".to_string()))?;
    let home = quote(home.trim_end_matches('/'));

    if rest.is_empty() {
        Ok(if home.is_empty() { "/".to_string() } else { home })
    } else {
        Ok(format!("{home}/{rest}"))
    }
}
