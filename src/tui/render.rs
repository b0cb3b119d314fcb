//! Frame rendering for the selector and its dialogs
//!
//! Everything here is pure: state in, `Frame` out. Writing the frame to the
//! terminal happens in `Frame::write_to`.

use super::colors::Palette;
use super::helpers::{
    center_text, format_relative_time, rule, truncate_line, truncate_with_ansi, visible_width,
};
use super::line_edit::LineBuffer;
use crate::domain::{has_date_prefix, CandidateEntry};
use crate::fuzzy::ScoredMatch;
use chrono::{DateTime, NaiveDate, Utc};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};
use std::path::PathBuf;

/// Lines above the list: title, rule, search, rule
pub const HEADER_LINES: usize = 4;
/// Lines below the list: rule, status
pub const FOOTER_LINES: usize = 2;
/// The list never shrinks below this many rows
pub const MIN_BODY_ROWS: usize = 3;

const SEARCH_PREFIX: &str = "Search: ";
const HELP_TEXT: &str = "↑/↓: Navigate  Enter: Select  ^R: Rename  ^D: Delete  Esc: Cancel";
const DIALOG_HELP_TEXT: &str = "Enter: Confirm  Esc: Cancel";

/// Terminal size in columns and rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
        }
    }
}

/// Inputs shared by every frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    pub palette: Palette,
    pub viewport: Viewport,
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
}

/// A rendered screen: one string per terminal row plus where to park the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub lines: Vec<String>,
    /// Zero-based (column, row)
    pub cursor: Option<(u16, u16)>,
}

impl Frame {
    /// Paints the frame from the top-left corner, clearing each row first.
    ///
    /// The last row gets no newline so the screen never scrolls.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        queue!(out, MoveTo(0, 0))?;
        let last = self.lines.len().saturating_sub(1);
        for (i, line) in self.lines.iter().enumerate() {
            queue!(out, Print("\r"), Clear(ClearType::UntilNewLine), Print(line))?;
            if i < last {
                queue!(out, Print("\n"))?;
            }
        }
        match self.cursor {
            Some((col, row)) => queue!(out, MoveTo(col, row), Show)?,
            None => queue!(out, Hide)?,
        }
        out.flush()
    }

    /// The frame as plain text, escapes removed. Handy for assertions and logs.
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| super::helpers::strip_ansi(l))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Rows available to the list for a given terminal height.
pub fn body_rows(height: usize) -> usize {
    height
        .saturating_sub(HEADER_LINES + FOOTER_LINES)
        .max(MIN_BODY_ROWS)
}

/// Moves `offset` as little as possible so `cursor` stays inside `visible` rows.
pub fn adjust_scroll(cursor: usize, offset: usize, visible: usize) -> usize {
    if cursor < offset {
        cursor
    } else if cursor >= offset + visible {
        cursor + 1 - visible
    } else {
        offset
    }
}

/// Scroll offset for the list, counting the blank row drawn above
/// "create new" when entries precede it.
pub fn list_scroll(cursor: usize, offset: usize, visible: usize, entries: usize) -> usize {
    if entries > 0 && cursor == entries {
        adjust_scroll(cursor, offset, visible.saturating_sub(1).max(1))
    } else {
        adjust_scroll(cursor, offset, visible)
    }
}

/// Name of the directory the "create new" row would make.
pub fn new_directory_name(today: NaiveDate, input: &str) -> String {
    format!("{}-{}", today.format("%Y-%m-%d"), input.replace(' ', "-"))
}

/// Input text with the cursor cell drawn in reverse video.
pub fn render_input(palette: &Palette, buffer: &LineBuffer) -> String {
    if buffer.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = buffer.text().chars().collect();
    let cursor = buffer.cursor().min(chars.len());
    let before: String = chars[..cursor].iter().collect();
    let (at, after) = match chars.get(cursor) {
        Some(c) => (c.to_string(), chars[cursor + 1..].iter().collect::<String>()),
        None => (" ".to_string(), String::new()),
    };

    format!(
        "{}{}{}{}{}",
        before,
        palette.reverse_on(),
        at,
        palette.reverse_off(),
        after
    )
}

fn highlight_positions(palette: &Palette, text: &str, positions: &[usize], offset: usize) -> String {
    text.chars()
        .enumerate()
        .map(|(i, c)| {
            let s = c.to_string();
            if positions.contains(&(i + offset)) {
                palette.highlight(&s)
            } else {
                s
            }
        })
        .collect()
}

/// Entry name with the date prefix dimmed and matched characters highlighted.
fn formatted_name(palette: &Palette, entry: &CandidateEntry, positions: &[usize]) -> String {
    let name = &entry.basename;
    // has_date_prefix only accepts ASCII digits, so byte and char offsets agree
    if has_date_prefix(name) && name.len() > 11 {
        let date = &name[..10];
        let rest = &name[11..];
        let hyphen = if positions.contains(&10) {
            palette.highlight("-")
        } else {
            palette.dim("-")
        };
        return format!(
            "{}{}{}",
            palette.dim(date),
            hyphen,
            highlight_positions(palette, rest, positions, 11)
        );
    }
    highlight_positions(palette, name, positions, 0)
}

fn arrow(palette: &Palette, selected: bool) -> String {
    if selected {
        palette.highlight("→ ")
    } else {
        "  ".to_string()
    }
}

fn render_entry_line(
    ctx: &RenderContext,
    item: &ScoredMatch,
    selected: bool,
    marked: bool,
) -> String {
    let palette = &ctx.palette;
    let mut out = String::new();

    if marked {
        out.push_str(&palette.danger_bg());
    } else if selected {
        out.push_str(&palette.selected_bg());
    }

    out.push_str(&arrow(palette, selected));
    out.push_str(if marked { "🗑️ " } else { "📁 " });

    let mut name = formatted_name(palette, &item.entry, &item.positions);
    let meta = format!(
        "{}, {:.1}",
        format_relative_time(item.entry.modified_at, ctx.now),
        item.score
    );

    // Arrow, icon and space take five columns; keep the last column free
    let max_content = ctx.viewport.width.saturating_sub(1);
    let prefix_width = 5;
    let max_name = max_content.saturating_sub(prefix_width + 1);
    if visible_width(&item.entry.basename) > max_name && max_name > 2 {
        name = format!("{}…", truncate_with_ansi(&name, max_name - 1));
    }

    let left = prefix_width + visible_width(&name);
    let right_col = max_content.saturating_sub(visible_width(&meta));
    out.push_str(&name);
    out.push_str(&" ".repeat(right_col.saturating_sub(left).max(1)));
    out.push_str(&palette.dim(&meta));

    out
}

fn render_create_line(ctx: &RenderContext, input: &LineBuffer, selected: bool) -> String {
    let palette = &ctx.palette;
    let mut out = String::new();
    if selected {
        out.push_str(&palette.selected_bg());
    }
    out.push_str(&arrow(palette, selected));
    out.push_str(&format!(
        "📂 Create new: {}",
        new_directory_name(ctx.today, input.text())
    ));
    out
}

fn render_delete_mode_footer(palette: &Palette, marked: usize) -> String {
    format!(
        "{}{} {} marked  |  Ctrl-D: Toggle  Enter: Confirm  Esc: Cancel",
        palette.danger_bg(),
        palette.bold(" DELETE MODE "),
        marked
    )
}

/// State the main list view needs.
#[derive(Debug, Clone, Copy)]
pub struct MainView<'a> {
    pub matches: &'a [ScoredMatch],
    pub input: &'a LineBuffer,
    pub list_cursor: usize,
    /// Already adjusted with `list_scroll`
    pub scroll_offset: usize,
    pub marked: &'a [PathBuf],
    pub delete_mode: bool,
    /// One-shot message shown instead of the help line
    pub status: Option<&'a str>,
}

/// Renders the search screen: header, list, footer.
pub fn render_main(ctx: &RenderContext, view: &MainView) -> Frame {
    let palette = &ctx.palette;
    let width = ctx.viewport.width;

    let header = vec![
        format!("🏠{}", palette.accent(" Try Directory Selection")),
        palette.dim(&rule(width)),
        format!(
            "{}{}",
            palette.dim(SEARCH_PREFIX),
            render_input(palette, view.input)
        ),
        palette.dim(&rule(width)),
    ];

    let status_line = if let Some(status) = view.status {
        palette.bold(status)
    } else if view.delete_mode {
        render_delete_mode_footer(palette, view.marked.len())
    } else {
        center_text(&palette.dim(HELP_TEXT), width)
    };
    let footer = vec![palette.dim(&rule(width)), status_line];

    let visible = body_rows(ctx.viewport.height);
    let show_create = !view.input.is_empty();
    let entries = view.matches.len();
    let total = entries + usize::from(show_create);
    let end = (view.scroll_offset + visible).min(total);

    let mut body = Vec::with_capacity(visible);
    for idx in view.scroll_offset..end {
        // Blank separator between the list and the create row
        if idx == entries && entries > 0 {
            body.push(String::new());
            if body.len() >= visible {
                break;
            }
        }

        let selected = idx == view.list_cursor;
        let line = match view.matches.get(idx) {
            Some(item) => {
                let marked = view.marked.contains(&item.entry.path);
                render_entry_line(ctx, item, selected, marked)
            }
            None => render_create_line(ctx, view.input, selected),
        };
        body.push(line + &palette.reset());
    }
    body.resize(visible, String::new());

    let lines = header
        .into_iter()
        .chain(body)
        .chain(footer)
        .map(|line| truncate_line(&line, width))
        .collect();

    let cursor_col = SEARCH_PREFIX.len() + view.input.cursor();
    Frame {
        lines,
        cursor: Some((clamp_u16(cursor_col), 2)),
    }
}

fn clamp_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Pads a dialog body to full height and appends the shared dialog footer.
fn finish_dialog(ctx: &RenderContext, mut lines: Vec<String>) -> Frame {
    let palette = &ctx.palette;
    let width = ctx.viewport.width;
    let content_rows = ctx.viewport.height.saturating_sub(2);
    if lines.len() < content_rows {
        lines.resize(content_rows, String::new());
    }
    lines.push(palette.dim(&rule(width)));
    lines.push(center_text(&palette.dim(DIALOG_HELP_TEXT), width));

    Frame {
        lines: lines.iter().map(|l| truncate_line(l, width)).collect(),
        cursor: None,
    }
}

/// Batch delete confirmation: the marked entries and a `YES` prompt.
pub fn render_delete_dialog(
    ctx: &RenderContext,
    marked: &[CandidateEntry],
    confirmation: &LineBuffer,
    error: Option<&str>,
) -> Frame {
    let palette = &ctx.palette;
    let width = ctx.viewport.width;
    let noun = if marked.len() == 1 {
        "directory"
    } else {
        "directories"
    };

    let mut lines = vec![
        center_text(&format!("🗑️  Delete {} {}?", marked.len(), noun), width),
        palette.dim(&rule(width)),
    ];
    for entry in marked {
        lines.push(format!(
            "{}🗑️ {}{}",
            palette.danger_bg(),
            entry.basename,
            palette.reset()
        ));
    }
    lines.push(String::new());
    lines.push(String::new());
    lines.push(center_text(
        &format!(
            "{}{}",
            palette.dim("Type YES to confirm: "),
            render_input(palette, confirmation)
        ),
        width,
    ));
    if let Some(error) = error {
        lines.push(String::new());
        lines.push(center_text(&palette.bold(error), width));
    }

    finish_dialog(ctx, lines)
}

/// Rename prompt for a single entry.
pub fn render_rename_dialog(
    ctx: &RenderContext,
    current_name: &str,
    buffer: &LineBuffer,
    error: Option<&str>,
) -> Frame {
    let palette = &ctx.palette;
    let width = ctx.viewport.width;

    let mut lines = vec![
        center_text(&format!("✏️{}", palette.accent("  Rename directory")), width),
        palette.dim(&rule(width)),
        format!("📁 {}", current_name),
        String::new(),
        String::new(),
        center_text(
            &format!(
                "{}{}",
                palette.dim("New name: "),
                render_input(palette, buffer)
            ),
            width,
        ),
    ];
    if let Some(error) = error {
        lines.push(String::new());
        lines.push(center_text(&palette.bold(error), width));
    }

    finish_dialog(ctx, lines)
}
