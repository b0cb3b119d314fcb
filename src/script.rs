//! Shell commands that carry out a selection
//!
//! The picker itself never touches the filesystem. The binary prints these
//! commands and the user's shell wrapper evaluates them.

use crate::domain::{DeletePath, SelectionResult};
use std::path::Path;

/// First line of every script, so running `try` without its alias explains itself.
pub const SCRIPT_HEADER: &str =
    "# if you can read this, you didn't launch try from an alias. run try --help.";

/// Single-quotes `text` for POSIX shells.
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r#"'"'"'"#))
}

fn quote_path(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

fn cd(path: &Path) -> Vec<String> {
    vec![
        format!("touch {}", quote_path(path)),
        format!("cd {}", quote_path(path)),
    ]
}

fn mkdir_cd(path: &Path) -> Vec<String> {
    let mut commands = vec![format!("mkdir -p {}", quote_path(path))];
    commands.extend(cd(path));
    commands
}

fn rename(base_path: &Path, old_name: &str, new_name: &str) -> Vec<String> {
    let new_path = base_path.join(new_name);
    vec![
        format!("cd {}", quote_path(base_path)),
        format!("mv {} {}", quote(old_name), quote(new_name)),
        format!("echo {}", quote_path(&new_path)),
        format!("cd {}", quote_path(&new_path)),
    ]
}

/// Deletes by basename from inside the base, then returns to `cwd` if it survived.
fn delete(base_path: &Path, paths: &[DeletePath], cwd: &Path) -> Vec<String> {
    let mut commands = vec![format!("cd {}", quote_path(base_path))];
    for item in paths {
        let name = quote(&item.basename);
        commands.push(format!("test -d {} && rm -rf {}", name, name));
    }
    commands.push(format!(
        "( cd {} 2>/dev/null || cd \"$HOME\" )",
        quote_path(cwd)
    ));
    commands
}

/// Commands for `result`. `cwd` is where a delete should leave the shell.
/// A cancelled session has no commands.
pub fn commands_for(result: &SelectionResult, cwd: &Path) -> Vec<String> {
    match result {
        SelectionResult::Cd { path } => cd(path),
        SelectionResult::Mkdir { path } => mkdir_cd(path),
        SelectionResult::Rename {
            base_path,
            old_name,
            new_name,
        } => rename(base_path, old_name, new_name),
        SelectionResult::Delete { base_path, paths } => delete(base_path, paths, cwd),
        SelectionResult::Cancelled => Vec::new(),
    }
}

/// Joins commands into the printed script: header line, then one command per
/// line chained with `&& \`.
pub fn render_script(commands: &[String]) -> String {
    let mut out = String::from(SCRIPT_HEADER);
    out.push('\n');

    let last = commands.len().saturating_sub(1);
    for (i, command) in commands.iter().enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        out.push_str(command);
        if i < last {
            out.push_str(" && \\");
        }
        out.push('\n');
    }
    out
}
