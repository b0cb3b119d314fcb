//! Color palette for the picker
//!
//! Every styled string goes through a `Palette`. A disabled palette returns the
//! text untouched so plain-text output stays free of escape sequences.

use crossterm::style::{Attribute, Color, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::Command;

/// Muted gray for secondary text
pub const MUTED: Color = Color::AnsiValue(245);
/// Matched characters
pub const HIGHLIGHT: Color = Color::DarkYellow;
/// Titles
pub const ACCENT: Color = Color::AnsiValue(214);
/// Background of the row under the cursor
pub const SELECTED_BG: Color = Color::AnsiValue(238);
/// Background of rows marked for deletion
pub const DANGER_BG: Color = Color::AnsiValue(52);

fn ansi(command: impl Command) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = command.write_ansi(&mut out);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    fn wrap(&self, text: &str, prefix: String, suffix: String) -> String {
        if text.is_empty() || !self.enabled {
            return text.to_string();
        }
        format!("{}{}{}", prefix, text, suffix)
    }

    /// Sequence emitted only when colors are on.
    fn seq(&self, command: impl Command) -> String {
        if self.enabled {
            ansi(command)
        } else {
            String::new()
        }
    }

    pub fn dim(&self, text: &str) -> String {
        self.wrap(
            text,
            ansi(SetForegroundColor(MUTED)),
            ansi(SetForegroundColor(Color::Reset)),
        )
    }

    pub fn bold(&self, text: &str) -> String {
        self.wrap(
            text,
            ansi(SetAttribute(Attribute::Bold)),
            ansi(SetAttribute(Attribute::Reset)),
        )
    }

    /// Bold + yellow. Resets only foreground and intensity so row backgrounds survive.
    pub fn highlight(&self, text: &str) -> String {
        self.wrap(
            text,
            ansi(SetAttribute(Attribute::Bold)) + &ansi(SetForegroundColor(HIGHLIGHT)),
            ansi(SetForegroundColor(Color::Reset)) + &ansi(SetAttribute(Attribute::NormalIntensity)),
        )
    }

    pub fn accent(&self, text: &str) -> String {
        self.wrap(
            text,
            ansi(SetAttribute(Attribute::Bold)) + &ansi(SetForegroundColor(ACCENT)),
            ansi(SetForegroundColor(Color::Reset)) + &ansi(SetAttribute(Attribute::NormalIntensity)),
        )
    }

    pub fn reverse_on(&self) -> String {
        self.seq(SetAttribute(Attribute::Reverse))
    }

    pub fn reverse_off(&self) -> String {
        self.seq(SetAttribute(Attribute::NoReverse))
    }

    pub fn selected_bg(&self) -> String {
        self.seq(SetBackgroundColor(SELECTED_BG))
    }

    pub fn danger_bg(&self) -> String {
        self.seq(SetBackgroundColor(DANGER_BG))
    }

    pub fn reset(&self) -> String {
        self.seq(SetAttribute(Attribute::Reset))
    }
}
