//! Host operating system detection.

use serde::{Deserialize, Serialize};

use crate::env::Environment;

/// Operating systems that PATH rules can be conditioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// macOS (Darwin).
    #[serde(alias = "darwin")]
    MacOs,

    /// Linux, not running under WSL.
    Linux,

    /// Windows Subsystem for Linux.
    Wsl,

    /// FreeBSD.
    FreeBsd,

    /// Native Windows.
    Windows,

    /// Anything else.
    Other,
}

impl Platform {
    /// Detect the platform the process is running on.
    pub fn detect(env: &dyn Environment) -> Self {
        Self::from_os(std::env::consts::OS, env)
    }

    /// Map a Rust target OS name to a platform, consulting `env` for WSL.
    pub fn from_os(os: &str, env: &dyn Environment) -> Self {
        match os {
            "macos" => Platform::MacOs,
            "linux" if env.is_set("WSL_DISTRO_NAME") || env.is_set("WSL_INTEROP") => {
                Platform::Wsl
            }
            "linux" => Platform::Linux,
            "freebsd" => Platform::FreeBsd,
            "windows" => Platform::Windows,
            _ => Platform::Other,
        }
    }

    /// Parse a platform from a name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "macos" | "darwin" | "osx" => Some(Platform::MacOs),
            "linux" => Some(Platform::Linux),
            "wsl" => Some(Platform::Wsl),
            "freebsd" => Some(Platform::FreeBsd),
            "windows" => Some(Platform::Windows),
            "other" => Some(Platform::Other),
            _ => None,
        }
    }

    /// Get the platform name.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::MacOs => "macos",
            Platform::Linux => "linux",
            Platform::Wsl => "wsl",
            Platform::FreeBsd => "freebsd",
            Platform::Windows => "windows",
            Platform::Other => "other",
        }
    }

    /// Whether a rule written for `wanted` applies on this platform.
    ///
    /// WSL is a Linux userland, so `linux` rules apply there too; `wsl` rules
    /// apply only under WSL.
    pub fn satisfies(&self, wanted: Platform) -> bool {
        *self == wanted || (wanted == Platform::Linux && *self == Platform::Wsl)
    }

    /// Separator used when joining search path entries.
    pub fn path_separator(&self) -> char {
        match self {
            Platform::Windows => ';',
            _ => ':',
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown platform: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;

    #[test]
    fn test_from_os() {
        let env = MapEnv::new();
        assert_eq!(Platform::from_os("macos", &env), Platform::MacOs);
        assert_eq!(Platform::from_os("linux", &env), Platform::Linux);
        assert_eq!(Platform::from_os("freebsd", &env), Platform::FreeBsd);
        assert_eq!(Platform::from_os("haiku", &env), Platform::Other);
    }

    #[test]
    fn test_wsl_detection() {
        let env = MapEnv::new().with("WSL_DISTRO_NAME", "Ubuntu");
        assert_eq!(Platform::from_os("linux", &env), Platform::Wsl);
        // Not meaningful outside Linux
        assert_eq!(Platform::from_os("macos", &env), Platform::MacOs);
    }

    #[test]
    fn test_satisfies() {
        assert!(Platform::Wsl.satisfies(Platform::Linux));
        assert!(Platform::Wsl.satisfies(Platform::Wsl));
        assert!(!Platform::Linux.satisfies(Platform::Wsl));
        assert!(!Platform::MacOs.satisfies(Platform::Linux));
    }

    #[test]
    fn test_from_name() {
        assert_eq!("Darwin".parse::<Platform>(), Ok(Platform::MacOs));
        assert_eq!(Platform::from_name("linux"), Some(Platform::Linux));
        assert!("beos".parse::<Platform>().is_err());
    }
}
