//! PATH resolution engine.
//!
//! Turns a declarative [`RuleTable`] plus live environment and filesystem
//! state into an ordered, duplicate-free [`PathList`].
//!
//! # Example
//!
//! ```rust,ignore
//! use shellenv_common::SystemEnv;
//! use shellenv_path::{PathResolver, SystemCommands, SystemFs, builtin_rules};
//!
//! let env = SystemEnv;
//! let commands = SystemCommands::new();
//! let mut resolver = PathResolver::new(&env, &SystemFs, &commands).inherit();
//! let list = resolver.resolve(&builtin_rules());
//! println!("{}", list.to_env_string(':'));
//! ```

pub mod config;
pub mod defaults;
pub mod error;
pub mod list;
pub mod probe;
pub mod render;
pub mod resolver;
pub mod rule;

pub use config::{PathConfig, TRANSIENT_VAR};
pub use defaults::builtin_rules;
pub use error::{PathError, Result};
pub use list::{Insertion, PathEntry, PathList, lexical_key};
pub use probe::{CommandProbe, FsProbe, SystemCommands, SystemFs};
pub use render::export_line;
pub use resolver::{FALLBACK_PATH, PathResolver, clean, resolve};
pub use rule::{Condition, EvalContext, PathRule, Position, RuleTable};
