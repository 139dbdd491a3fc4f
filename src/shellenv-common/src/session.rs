//! Session mode detection.
//!
//! A session runs in *minimal* mode when it is remote, containerized, or on CI,
//! or when the user forces it. Minimal mode restricts which PATH rules apply.
//! The mode is computed once at startup and never changes afterwards.

use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::env::{Environment, is_truthy};

/// Forces minimal mode when truthy.
pub const FORCE_MINIMAL_VAR: &str = "SHELLENV_MINIMAL";

/// Forces full mode when truthy; wins over every other signal.
pub const FORCE_FULL_VAR: &str = "SHELLENV_FULL";

const REMOTE_VARS: &[&str] = &["SSH_CONNECTION", "SSH_CLIENT", "SSH_TTY"];

const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "JENKINS_URL",
    "CIRCLECI",
    "TF_BUILD",
];

const CONTAINER_MARKERS: &[&str] = &["/.dockerenv", "/run/.containerenv"];

/// Why a session was put in minimal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MinimalReason {
    /// Logged in over SSH.
    Remote,
    /// Running inside a container.
    Container,
    /// Running under a CI system.
    Ci,
    /// `SHELLENV_MINIMAL` is set.
    Forced,
}

impl std::fmt::Display for MinimalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote session"),
            Self::Container => write!(f, "container"),
            Self::Ci => write!(f, "CI environment"),
            Self::Forced => write!(f, "forced via {FORCE_MINIMAL_VAR}"),
        }
    }
}

/// Session-wide mode consulted by PATH rule conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SessionMode {
    Full,
    Minimal { reasons: Vec<MinimalReason> },
}

impl SessionMode {
    /// Detect the mode from the environment and well-known container markers.
    pub fn detect(env: &dyn Environment) -> Self {
        Self::detect_with(env, &|path: &Path| path.exists())
    }

    /// Detect the mode using a custom existence check for container markers.
    pub fn detect_with(env: &dyn Environment, marker_exists: &dyn Fn(&Path) -> bool) -> Self {
        if env.var(FORCE_FULL_VAR).is_some_and(|v| is_truthy(&v)) {
            return SessionMode::Full;
        }

        let mut reasons = Vec::new();

        if env.var(FORCE_MINIMAL_VAR).is_some_and(|v| is_truthy(&v)) {
            reasons.push(MinimalReason::Forced);
        }
        if REMOTE_VARS.iter().any(|v| env.is_set(v)) {
            reasons.push(MinimalReason::Remote);
        }
        if env.is_set("container")
            || CONTAINER_MARKERS
                .iter()
                .any(|marker| marker_exists(Path::new(marker)))
        {
            reasons.push(MinimalReason::Container);
        }
        if CI_VARS
            .iter()
            .any(|v| env.var(v).is_some_and(|value| value != "false" && value != "0"))
        {
            reasons.push(MinimalReason::Ci);
        }

        let mode = if reasons.is_empty() {
            SessionMode::Full
        } else {
            SessionMode::Minimal { reasons }
        };
        debug!(%mode, "Detected session mode");
        mode
    }

    pub fn is_minimal(&self) -> bool {
        matches!(self, SessionMode::Minimal { .. })
    }

    /// Reasons for minimal mode; empty in full mode.
    pub fn reasons(&self) -> &[MinimalReason] {
        match self {
            SessionMode::Full => &[],
            SessionMode::Minimal { reasons } => reasons,
        }
    }
}

impl Default for SessionMode {
    fn default() -> Self {
        SessionMode::Full
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMode::Full => write!(f, "full"),
            SessionMode::Minimal { reasons } => {
                let reasons: Vec<String> = reasons.iter().map(ToString::to_string).collect();
                write!(f, "minimal ({})", reasons.join(", "))
            }
        }
    }
}
