//! Rendering a resolved list for the surrounding shell.

use shellenv_common::ShellType;

use crate::list::PathList;

/// Shell statement that sets `PATH` to `list`.
pub fn export_line(shell: ShellType, list: &PathList, separator: char) -> String {
    shell.export_statement("PATH", &list.to_env_string(separator), separator)
}
