// CLI module for argument parsing

use crate::tui::{parse_key_script, Key};
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};

/// try - fuzzy finder for dated experiment directories
///
/// Prints a shell script on stdout. Run it through a shell function that
/// evals the output so the selected directory becomes your working directory.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "try")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Initial search query
    ///
    /// Multiple words are joined with spaces, which turn into hyphens.
    pub query: Vec<String>,

    /// Directory that holds the tries
    ///
    /// Defaults to ~/src/tries. A leading ~ is expanded.
    #[arg(long = "path", env = "TRY_PATH", value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Pre-fill the search box, taking precedence over the query
    #[arg(long = "and-type", value_name = "TEXT")]
    pub and_type: Option<String>,

    /// Render a single frame and exit
    #[arg(long = "and-exit", action = ArgAction::SetTrue)]
    pub and_exit: bool,

    /// Drive the picker with a key script instead of the keyboard
    ///
    /// Either comma-separated tokens (UP, DOWN, ENTER, ESC, BACKSPACE,
    /// CTRL-D, TYPE=text, single characters) or raw terminal input.
    #[arg(long = "and-keys", value_name = "KEYS")]
    pub and_keys: Option<String>,

    /// Text submitted to the delete confirmation once the key script runs out
    #[arg(long = "and-confirm", value_name = "TEXT")]
    pub and_confirm: Option<String>,

    /// Disable colors (NO_COLOR is honoured as well)
    #[arg(long = "no-colors", alias = "no-expand-tokens", action = ArgAction::SetTrue)]
    pub no_colors: bool,

    /// Force the screen width
    #[arg(long, env = "TRY_WIDTH", hide = true)]
    pub width: Option<u16>,

    /// Force the screen height
    #[arg(long, env = "TRY_HEIGHT", hide = true)]
    pub height: Option<u16>,

    /// Print the selection as JSON instead of a shell script
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,
}

/// `~/src/tries`, or a relative `src/tries` when there is no home directory.
pub fn default_base_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join("src").join("tries"),
        None => PathBuf::from("src").join("tries"),
    }
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// The positional words joined into one query string
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }

    /// Base directory after `~` expansion, falling back to the default
    pub fn base_path(&self) -> PathBuf {
        self.path
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(default_base_path)
    }

    /// Parsed `--and-keys`, if given
    pub fn key_script(&self) -> Result<Option<Vec<Key>>, String> {
        self.and_keys
            .as_deref()
            .map(parse_key_script)
            .transpose()
    }

    /// Validate the arguments and return any errors
    pub fn validate(&self) -> Result<(), String> {
        let base = self.base_path();
        if base.exists() && !base.is_dir() {
            return Err(format!("Path is not a directory: {}", base.display()));
        }

        self.key_script()?;

        if self.width == Some(0) || self.height == Some(0) {
            return Err("Screen size overrides must be greater than zero".to_string());
        }

        Ok(())
    }
}
