//! Common utilities shared across shellenv crates.
//!
//! - [`pattern`]: the single glob-to-matcher compiler used for PATH templates and
//!   history ignore patterns
//! - [`expand`]: `$VAR`, `${VAR}`, `${VAR:-default}` and `~` expansion
//! - [`env`]: read-only environment lookup abstraction
//! - [`platform`] and [`session`]: host detection consulted by PATH rules
//! - [`shell_type`]: shell detection and `export` statement rendering
//! - [`dirs`]: default locations for config, history and state files

pub mod dirs;
pub mod env;
pub mod expand;
pub mod pattern;
pub mod platform;
pub mod session;
pub mod shell_type;

pub use dirs::{APP_NAME, AppDirs};
pub use env::{Environment, MapEnv, SystemEnv, is_truthy};
pub use expand::{ExpandError, expand_glob_template, expand_template};
pub use pattern::{GlobError, GlobPattern, escape as glob_escape, has_wildcards};
pub use platform::Platform;
pub use session::{MinimalReason, SessionMode};
pub use shell_type::{ShellType, shell_quote};
