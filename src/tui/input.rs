use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// A decoded keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Esc,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    /// Control chord, stored as the lowercase letter (`Ctrl('a')` is 0x01)
    Ctrl(char),
    Char(char),
}

impl Key {
    /// Maps a crossterm key event to a key. Releases and unsupported keys map to `None`.
    pub fn from_key_event(event: KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }

        match (event.code, event.modifiers) {
            (KeyCode::Char(c), m) if m.contains(KeyModifiers::CONTROL) => {
                Some(Key::Ctrl(c.to_ascii_lowercase()))
            }
            (KeyCode::Char(c), _) => Some(Key::Char(c)),
            (KeyCode::Enter, _) => Some(Key::Enter),
            (KeyCode::Esc, _) => Some(Key::Esc),
            (KeyCode::Backspace, _) => Some(Key::Backspace),
            (KeyCode::Up, _) => Some(Key::Up),
            (KeyCode::Down, _) => Some(Key::Down),
            (KeyCode::Left, _) => Some(Key::Left),
            (KeyCode::Right, _) => Some(Key::Right),
            _ => None,
        }
    }

    /// Decodes one raw key chunk as a terminal would send it.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b"\r" | b"\n" => Some(Key::Enter),
            b"\x1b" => Some(Key::Esc),
            b"\x7f" => Some(Key::Backspace),
            b"\x1b[A" => Some(Key::Up),
            b"\x1b[B" => Some(Key::Down),
            b"\x1b[C" => Some(Key::Right),
            b"\x1b[D" => Some(Key::Left),
            [b] if (0x01..=0x1a).contains(b) => Some(Key::Ctrl((b'a' + b - 1) as char)),
            _ => std::str::from_utf8(bytes).ok().and_then(|s| {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Key::Char(c)),
                    _ => None,
                }
            }),
        }
    }

    /// Ctrl-H arrives as 0x08 from some terminals; treat it as backspace.
    pub fn is_backspace(self) -> bool {
        matches!(self, Key::Backspace | Key::Ctrl('h'))
    }

    pub fn is_cancel(self) -> bool {
        matches!(self, Key::Esc | Key::Ctrl('c'))
    }
}

/// Characters accepted into the search buffer.
pub fn is_search_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ')
}

/// Characters accepted into the rename buffer. `/` is allowed here and rejected on submit.
pub fn is_rename_char(c: char) -> bool {
    is_search_char(c) || c == '/'
}

/// Characters accepted into the delete confirmation buffer.
pub fn is_confirm_char(c: char) -> bool {
    !c.is_control()
}

/// Parses a synthetic key script.
///
/// Token mode is used when the script contains a comma or is made only of
/// uppercase letters and hyphens, e.g. `"TYPE=beta,DOWN,ENTER"`. Otherwise
/// the script is raw terminal input where `ESC [ X` is one key and every
/// other char is its own key.
pub fn parse_key_script(script: &str) -> Result<Vec<Key>, String> {
    if script.is_empty() {
        return Ok(Vec::new());
    }

    let token_mode = script.contains(',')
        || script.chars().all(|c| c.is_ascii_uppercase() || c == '-');

    if token_mode {
        let mut keys = Vec::new();
        for token in script.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            keys.extend(parse_token(token)?);
        }
        Ok(keys)
    } else {
        Ok(parse_raw(script))
    }
}

fn parse_token(token: &str) -> Result<Vec<Key>, String> {
    let upper = token.to_ascii_uppercase();

    let key = match upper.as_str() {
        "UP" => Key::Up,
        "DOWN" => Key::Down,
        "LEFT" => Key::Left,
        "RIGHT" => Key::Right,
        "ENTER" | "RETURN" => Key::Enter,
        "ESC" | "ESCAPE" => Key::Esc,
        "BACKSPACE" | "BS" => Key::Backspace,
        _ => {
            if let Some(text) = upper.strip_prefix("TYPE=") {
                return Ok(text.chars().map(Key::Char).collect());
            }
            if let Some(letter) = upper
                .strip_prefix("CTRL-")
                .or_else(|| upper.strip_prefix("CTRL"))
            {
                return match letter.as_bytes() {
                    [c @ (b'A' | b'B' | b'C' | b'D' | b'E' | b'F' | b'H' | b'K' | b'N' | b'P'
                    | b'R' | b'T' | b'W')] => Ok(vec![Key::Ctrl(c.to_ascii_lowercase() as char)]),
                    _ => Err(format!("Unknown control key in key script: '{}'", token)),
                };
            }
            let mut chars = token.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(vec![Key::Char(c)]),
                _ => Err(format!("Unknown token in key script: '{}'", token)),
            };
        }
    };

    Ok(vec![key])
}

fn parse_raw(script: &str) -> Vec<Key> {
    let bytes = script.as_bytes();
    let mut keys = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == 0x1b && i + 2 < bytes.len() && bytes[i + 1] == b'[' {
            if let Some(key) = Key::from_bytes(&bytes[i..i + 3]) {
                keys.push(key);
            }
            i += 3;
            continue;
        }

        // Step over a whole UTF-8 char
        let width = script[i..].chars().next().map_or(1, char::len_utf8);
        if let Some(key) = Key::from_bytes(&bytes[i..i + width]) {
            keys.push(key);
        }
        i += width;
    }

    keys
}
