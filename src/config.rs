//! Session configuration derived from the command line and environment

use crate::cli::Args;
use crate::tui::{Key, ViewportOverrides};
use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

/// Everything one picker session needs besides the terminal itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionConfig {
    /// Directory holding the tries
    pub base_path: PathBuf,
    /// Initial query from the positional arguments
    pub query: String,
    /// Pre-filled search text; wins over `query`
    pub and_type: Option<String>,
    /// Draw one frame and stop
    pub render_once: bool,
    /// Synthetic keys replacing the keyboard
    pub keys: Option<Vec<Key>>,
    /// Delete confirmation used when the keys run out
    pub confirm: Option<String>,
    pub viewport: ViewportOverrides,
    pub colors: bool,
    /// Print the result as JSON rather than shell commands
    pub json: bool,
}

impl SessionConfig {
    /// Text the search box starts with
    pub fn initial_input(&self) -> &str {
        self.and_type.as_deref().unwrap_or(&self.query)
    }
}

/// Colors are on unless disabled by flag, by a non-empty `NO_COLOR`, or
/// because stderr is not a terminal.
pub fn colors_enabled(no_colors_flag: bool, no_color_env: Option<OsString>, stderr_tty: bool) -> bool {
    let env_disabled = no_color_env.is_some_and(|value| !value.is_empty());
    !no_colors_flag && !env_disabled && stderr_tty
}

impl From<Args> for SessionConfig {
    fn from(args: Args) -> Self {
        // An unparseable script still means "not the keyboard"; it ends at once
        let keys = args.key_script().unwrap_or_else(|_| Some(Vec::new()));

        SessionConfig {
            base_path: args.base_path(),
            query: args.query_text(),
            and_type: args.and_type.filter(|text| !text.is_empty()),
            render_once: args.and_exit,
            keys,
            confirm: args.and_confirm.filter(|text| !text.is_empty()),
            viewport: ViewportOverrides {
                width: args.width,
                height: args.height,
            },
            colors: colors_enabled(
                args.no_colors,
                std::env::var_os("NO_COLOR"),
                io::stderr().is_terminal(),
            ),
            json: args.json,
        }
    }
}
