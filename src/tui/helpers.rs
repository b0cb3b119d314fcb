//! Width math and formatting helpers for ANSI-styled lines

use chrono::{DateTime, Utc};
use unicode_width::UnicodeWidthChar;

/// Columns a single char occupies on screen.
///
/// Variation selectors are zero width and the emoji block is always two
/// columns, whatever presentation the terminal picks.
pub fn char_width(c: char) -> usize {
    match c as u32 {
        0xFE00..=0xFE0F => 0,
        0x1F300..=0x1FAFF => 2,
        _ => c.width().unwrap_or(0),
    }
}

/// Splits `text` into escape sequences and visible chars.
enum Piece<'a> {
    Escape(&'a str),
    Visible(char),
}

fn pieces(text: &str) -> impl Iterator<Item = Piece<'_>> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let c = rest.chars().next()?;
        if c == '\x1b' {
            // An escape runs up to and including its final letter
            let end = rest[1..]
                .find(|ch: char| ch.is_ascii_alphabetic())
                .map_or(rest.len(), |i| i + 2);
            let (escape, tail) = rest.split_at(end);
            rest = tail;
            Some(Piece::Escape(escape))
        } else {
            rest = &rest[c.len_utf8()..];
            Some(Piece::Visible(c))
        }
    })
}

/// On-screen width of `text`, ignoring ANSI escape sequences.
pub fn visible_width(text: &str) -> usize {
    pieces(text)
        .map(|piece| match piece {
            Piece::Escape(_) => 0,
            Piece::Visible(c) => char_width(c),
        })
        .sum()
}

/// Removes ANSI escape sequences.
pub fn strip_ansi(text: &str) -> String {
    pieces(text)
        .filter_map(|piece| match piece {
            Piece::Escape(_) => None,
            Piece::Visible(c) => Some(c),
        })
        .collect()
}

/// Cuts `text` down to `max` visible columns.
///
/// Escape sequences are kept intact, including those past the cut, so styles
/// opened before the cut are still closed. Trailing spaces at the cut are dropped.
pub fn truncate_with_ansi(text: &str, max: usize) -> String {
    if visible_width(text) <= max {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    let mut cut = false;

    for piece in pieces(text) {
        match piece {
            Piece::Escape(escape) => out.push_str(escape),
            Piece::Visible(_) if cut => {}
            Piece::Visible(c) => {
                let w = char_width(c);
                if used + w > max {
                    cut = true;
                    let trimmed = out.trim_end_matches(' ').len();
                    out.truncate(trimmed);
                    continue;
                }
                out.push(c);
                used += w;
            }
        }
    }

    out
}

/// Fits a full-screen line into `width` columns, leaving the last column free.
pub fn truncate_line(line: &str, width: usize) -> String {
    if visible_width(line) < width {
        return line.to_string();
    }
    format!("{}…", truncate_with_ansi(line, width.saturating_sub(2)))
}

/// Left-pads `text` so it sits centered in `width` columns.
pub fn center_text(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(visible_width(text)) / 2;
    format!("{}{}", " ".repeat(padding), text)
}

/// Horizontal rule one column narrower than the screen.
pub fn rule(width: usize) -> String {
    "─".repeat(width.saturating_sub(1))
}

/// Coarse "time ago" label.
pub fn format_relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if seconds < 60 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if days < 7 {
        format!("{}d ago", days)
    } else {
        format!("{}w ago", days / 7)
    }
}
