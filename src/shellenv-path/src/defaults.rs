//! Built-in rule table.
//!
//! Table order matters: later prepends end up earlier in `PATH`, so the
//! user's own bin directories come last here and first in the result.

use shellenv_common::Platform;

use crate::rule::{Condition, PathRule, RuleTable};

fn on(os: Platform) -> Condition {
    Condition::OsEquals { os }
}

/// Rules applied before any user configuration.
pub fn builtin_rules() -> RuleTable {
    let rules = [
        // System directories some distributions leave out
        PathRule::new("usr-local-sbin", "/usr/local/sbin").append(),
        PathRule::new("snap", "/snap/bin").append().when(on(Platform::Linux)),
        // Homebrew; Apple Silicon listed last so it wins over Intel
        PathRule::new("homebrew-intel", "/usr/local/bin").when(on(Platform::MacOs)),
        PathRule::new("homebrew-sbin", "/opt/homebrew/sbin").when(on(Platform::MacOs)),
        PathRule::new("homebrew", "/opt/homebrew/bin").when(on(Platform::MacOs)),
        PathRule::new("linuxbrew", "/home/linuxbrew/.linuxbrew/bin").when(on(Platform::Linux)),
        // Language toolchains
        PathRule::new("go-root", "/usr/local/go/bin").append(),
        PathRule::new("go", "${GOPATH:-$HOME/go}/bin")
            .append()
            .when(Condition::NotMinimalMode),
        PathRule::new("cargo", "${CARGO_HOME:-$HOME/.cargo}/bin"),
        PathRule::new("pyenv", "${PYENV_ROOT:-$HOME/.pyenv}/bin").when(Condition::NotMinimalMode),
        PathRule::new("pyenv-shims", "${PYENV_ROOT:-$HOME/.pyenv}/shims")
            .when(Condition::NotMinimalMode),
        PathRule::new("rbenv-shims", "${RBENV_ROOT:-$HOME/.rbenv}/shims")
            .when(Condition::NotMinimalMode),
        PathRule::new("nvm", "${NVM_DIR:-$HOME/.nvm}/versions/node/*/bin")
            .when(Condition::NotMinimalMode),
        PathRule::new("bun", "${BUN_INSTALL:-$HOME/.bun}/bin").when(Condition::NotMinimalMode),
        PathRule::new("deno", "${DENO_INSTALL:-$HOME/.deno}/bin").when(Condition::NotMinimalMode),
        PathRule::new("pnpm", "$PNPM_HOME").when(Condition::VarIsSet {
            var: "PNPM_HOME".to_string(),
        }),
        PathRule::new("npm-global", "$HOME/.npm-global/bin").append(),
        PathRule::new("composer", "$HOME/.composer/vendor/bin")
            .append()
            .when(Condition::NotMinimalMode),
        PathRule::new("dotnet-tools", "$HOME/.dotnet/tools")
            .append()
            .when(Condition::NotMinimalMode),
        PathRule::new("krew", "${KREW_ROOT:-$HOME/.krew}/bin")
            .append()
            .when(Condition::CommandExists {
                command: "kubectl".to_string(),
            }),
        PathRule::new("android-platform-tools", "${ANDROID_HOME:-$HOME/Library/Android/sdk}/platform-tools")
            .append()
            .when(Condition::NotMinimalMode),
        // Desktop applications
        PathRule::new(
            "jetbrains-toolbox",
            "$HOME/Library/Application Support/JetBrains/Toolbox/scripts",
        )
        .append()
        .when(on(Platform::MacOs)),
        PathRule::new("jetbrains-toolbox-linux", "$HOME/.local/share/JetBrains/Toolbox/scripts")
            .append()
            .when(on(Platform::Linux)),
        PathRule::new("postgres-app", "/Applications/Postgres.app/Contents/Versions/latest/bin")
            .append()
            .when(on(Platform::MacOs)),
        PathRule::new(
            "vscode",
            "/Applications/Visual Studio Code.app/Contents/Resources/app/bin",
        )
        .append()
        .when(on(Platform::MacOs)),
        // Personal bin directories, highest priority
        PathRule::new("home-bin", "$HOME/bin"),
        PathRule::new("local-bin", "$HOME/.local/bin"),
    ];

    let mut table = RuleTable::new();
    for rule in rules {
        table.insert(rule);
    }
    table
}
