//! The picker state machine
//!
//! A `Selector` owns everything a session needs: the candidate set, the
//! search buffer, list position, delete marks and dialog state. Keys go in
//! through `handle_key`; exactly one `SelectionResult` comes out.

use super::colors::Palette;
use super::input::{is_confirm_char, is_rename_char, is_search_char, Key};
use super::line_edit::{Edit, LineBuffer};
use super::render::{
    body_rows, list_scroll, new_directory_name, render_delete_dialog, render_main,
    render_rename_dialog, Frame, MainView, RenderContext, Viewport,
};
use super::terminal::{KeySource, ResizeWatch, ViewportOverrides};
use crate::domain::{discover_candidates, CandidateEntry, DeletePath, SelectionResult};
use crate::error::{DeleteError, RenameError};
use crate::fuzzy::{Matcher, ScoredMatch};
use chrono::{DateTime, Local, NaiveDate, Utc};
use crossterm::{
    queue,
    terminal::{Clear, ClearType},
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Exact text the delete dialog wants before it lets a batch through.
const CONFIRM_TOKEN: &str = "YES";

/// Which screen the selector is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Search list. Delete mode is this view with at least one mark
    Browsing,
    /// "Type YES to confirm" dialog for the marked entries
    DeleteConfirm,
    /// Rename prompt for one entry
    Rename,
}

pub struct Selector {
    base: PathBuf,
    /// Loaded on first use, dropped again after a delete
    matcher: Option<Matcher>,
    matches: Vec<ScoredMatch>,
    /// Query `matches` was computed for
    matched_query: Option<String>,
    input: LineBuffer,
    list_cursor: usize,
    scroll_offset: usize,
    /// Marked paths in the order they were marked
    marked: Vec<PathBuf>,
    view: ViewState,
    dialog: LineBuffer,
    dialog_error: Option<String>,
    rename_target: Option<CandidateEntry>,
    /// Shown in the footer on the next frame only
    status: Option<String>,
    overrides: ViewportOverrides,
    viewport: Viewport,
    palette: Palette,
    now: DateTime<Utc>,
    today: NaiveDate,
    /// Typed into the delete dialog once scripted keys run out
    confirmation: Option<String>,
}

fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

impl Selector {
    /// Creates a selector over the directories in `base`, with the search
    /// buffer seeded from `initial_input` (spaces become hyphens).
    pub fn new(base: impl Into<PathBuf>, initial_input: &str) -> Self {
        let overrides = ViewportOverrides::default();
        Self {
            base: base.into(),
            matcher: None,
            matches: Vec::new(),
            matched_query: None,
            input: LineBuffer::new(initial_input.replace(' ', "-")),
            list_cursor: 0,
            scroll_offset: 0,
            marked: Vec::new(),
            view: ViewState::Browsing,
            dialog: LineBuffer::default(),
            dialog_error: None,
            rename_target: None,
            status: None,
            overrides,
            viewport: Viewport::query(overrides),
            palette: Palette::plain(),
            now: Utc::now(),
            today: Local::now().date_naive(),
            confirmation: None,
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_viewport(mut self, overrides: ViewportOverrides) -> Self {
        self.overrides = overrides;
        self.viewport = Viewport::query(overrides);
        self
    }

    /// Sets the text the delete dialog submits once a scripted session runs dry.
    pub fn with_confirmation(mut self, confirmation: Option<String>) -> Self {
        self.confirmation = confirmation;
        self
    }

    /// Uses a fixed candidate set instead of listing `base` on first render.
    pub fn with_candidates(mut self, candidates: Vec<CandidateEntry>) -> Self {
        self.matcher = Some(Matcher::new(candidates));
        self.matched_query = None;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn input(&self) -> &str {
        self.input.text()
    }

    pub fn list_cursor(&self) -> usize {
        self.list_cursor
    }

    pub fn marked(&self) -> &[PathBuf] {
        &self.marked
    }

    pub fn is_delete_mode(&self) -> bool {
        !self.marked.is_empty()
    }

    pub fn dialog_error(&self) -> Option<&str> {
        self.dialog_error.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Current ranked matches for the search buffer.
    pub fn matches(&mut self) -> &[ScoredMatch] {
        self.sync();
        &self.matches
    }

    fn ensure_loaded(&mut self) {
        if self.matcher.is_some() {
            return;
        }

        let candidates = match discover_candidates(&self.base, self.now) {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(base = %self.base.display(), "cannot list base directory: {}", e);
                Vec::new()
            }
        };
        let matcher = Matcher::new(candidates);
        if matcher.is_empty() {
            tracing::debug!(base = %self.base.display(), "no candidates under base");
        } else {
            tracing::debug!(count = matcher.len(), "candidates loaded");
        }
        self.matcher = Some(matcher);
        self.matched_query = None;
    }

    fn invalidate_candidates(&mut self) {
        self.matcher = None;
        self.matched_query = None;
        self.matches.clear();
    }

    /// Brings matches up to date with the buffer and clamps the list cursor.
    fn sync(&mut self) {
        self.ensure_loaded();

        if self.matched_query.as_deref() != Some(self.input.text()) {
            let query = self.input.text().to_string();
            self.matches = self
                .matcher
                .as_ref()
                .map(|matcher| matcher.matches(&query))
                .unwrap_or_default();
            self.matched_query = Some(query);
        }

        self.list_cursor = self.list_cursor.min(self.total_rows().saturating_sub(1));
    }

    /// Entries plus the "create new" row when there is input.
    fn total_rows(&self) -> usize {
        self.matches.len() + usize::from(!self.input.is_empty())
    }

    fn refresh_viewport(&mut self, resize: &dyn ResizeWatch) {
        let viewport = resize.measure(self.overrides);
        if viewport != self.viewport {
            tracing::debug!(width = viewport.width, height = viewport.height, "viewport changed");
            self.viewport = viewport;
        }
    }

    fn marked_entries(&self) -> Vec<CandidateEntry> {
        let Some(matcher) = &self.matcher else {
            return Vec::new();
        };
        self.marked
            .iter()
            .filter_map(|path| matcher.find(path).cloned())
            .collect()
    }

    /// Renders the current view. A pending status message is consumed.
    pub fn frame(&mut self) -> Frame {
        self.sync();

        let ctx = RenderContext {
            palette: self.palette,
            viewport: self.viewport,
            now: self.now,
            today: self.today,
        };

        match self.view {
            ViewState::Browsing => {
                self.scroll_offset = list_scroll(
                    self.list_cursor,
                    self.scroll_offset,
                    body_rows(self.viewport.height),
                    self.matches.len(),
                );
                let status = self.status.take();
                render_main(
                    &ctx,
                    &MainView {
                        matches: &self.matches,
                        input: &self.input,
                        list_cursor: self.list_cursor,
                        scroll_offset: self.scroll_offset,
                        marked: &self.marked,
                        delete_mode: self.is_delete_mode(),
                        status: status.as_deref(),
                    },
                )
            }
            ViewState::DeleteConfirm => render_delete_dialog(
                &ctx,
                &self.marked_entries(),
                &self.dialog,
                self.dialog_error.as_deref(),
            ),
            ViewState::Rename => {
                let current = self
                    .rename_target
                    .as_ref()
                    .map_or("", |entry| entry.basename.as_str());
                render_rename_dialog(&ctx, current, &self.dialog, self.dialog_error.as_deref())
            }
        }
    }

    /// Applies one key. Returns the session outcome once there is one.
    pub fn handle_key(&mut self, key: Key) -> Option<SelectionResult> {
        self.sync();

        let result = match self.view {
            ViewState::Browsing => self.handle_browsing_key(key),
            ViewState::DeleteConfirm => self.handle_delete_key(key),
            ViewState::Rename => self.handle_rename_key(key),
        };

        match &result {
            Some(result) => tracing::debug!(?result, "selection made"),
            None => self.sync(),
        }
        result
    }

    fn handle_browsing_key(&mut self, key: Key) -> Option<SelectionResult> {
        match key {
            Key::Enter => {
                if self.is_delete_mode() {
                    self.open_delete_confirm();
                    None
                } else {
                    self.select_current()
                }
            }
            Key::Up | Key::Ctrl('p') => {
                self.list_cursor = self.list_cursor.saturating_sub(1);
                None
            }
            Key::Down | Key::Ctrl('n') => {
                if self.list_cursor + 1 < self.total_rows() {
                    self.list_cursor += 1;
                }
                None
            }
            Key::Left | Key::Right => None,
            Key::Ctrl('d') => {
                self.toggle_mark();
                None
            }
            Key::Ctrl('t') => self.create_new(),
            Key::Ctrl('r') => {
                self.open_rename();
                None
            }
            k if k.is_cancel() => {
                if self.is_delete_mode() {
                    tracing::debug!("delete mode left");
                    self.marked.clear();
                    None
                } else {
                    Some(SelectionResult::Cancelled)
                }
            }
            k if k.is_backspace() => {
                self.input.backspace();
                self.list_cursor = 0;
                None
            }
            k => {
                if self.input.apply(k, is_search_char) == Edit::Changed {
                    self.list_cursor = 0;
                }
                None
            }
        }
    }

    fn select_current(&self) -> Option<SelectionResult> {
        match self.matches.get(self.list_cursor) {
            Some(item) => Some(SelectionResult::Cd {
                path: item.entry.path.clone(),
            }),
            None => self.create_new(),
        }
    }

    fn create_new(&self) -> Option<SelectionResult> {
        if self.input.is_empty() {
            return None;
        }
        Some(SelectionResult::Mkdir {
            path: self
                .base
                .join(new_directory_name(self.today, self.input.text())),
        })
    }

    fn toggle_mark(&mut self) {
        let Some(item) = self.matches.get(self.list_cursor) else {
            return;
        };
        let path = item.entry.path.clone();

        match self.marked.iter().position(|marked| *marked == path) {
            Some(i) => {
                self.marked.remove(i);
            }
            None => self.marked.push(path),
        }
        tracing::debug!(marked = self.marked.len(), "delete marks changed");
    }

    fn open_delete_confirm(&mut self) {
        tracing::debug!(marked = self.marked.len(), "delete confirmation opened");
        self.view = ViewState::DeleteConfirm;
        self.dialog = LineBuffer::default();
        self.dialog_error = None;
    }

    fn open_rename(&mut self) {
        let Some(item) = self.matches.get(self.list_cursor) else {
            return;
        };
        let entry = item.entry.clone();
        tracing::debug!(name = %entry.basename, "rename opened");

        self.marked.clear();
        self.dialog = LineBuffer::new(entry.basename.clone());
        self.dialog_error = None;
        self.rename_target = Some(entry);
        self.view = ViewState::Rename;
    }

    fn close_dialog(&mut self) {
        self.view = ViewState::Browsing;
        self.dialog = LineBuffer::default();
        self.dialog_error = None;
        self.rename_target = None;
    }

    fn handle_delete_key(&mut self, key: Key) -> Option<SelectionResult> {
        match key {
            Key::Enter if self.dialog.text() == CONFIRM_TOKEN => self.confirm_delete(),
            Key::Enter => {
                self.cancel_delete();
                None
            }
            k if k.is_cancel() => {
                self.cancel_delete();
                None
            }
            k => {
                if self.dialog.apply(k, is_confirm_char) == Edit::Changed {
                    self.dialog_error = None;
                }
                None
            }
        }
    }

    fn cancel_delete(&mut self) {
        tracing::debug!("delete cancelled");
        self.marked.clear();
        self.close_dialog();
        self.status = Some("Delete cancelled".to_string());
    }

    fn confirm_delete(&mut self) -> Option<SelectionResult> {
        match self.resolve_marked() {
            Ok((base_path, paths)) => {
                tracing::info!(count = paths.len(), "delete confirmed");
                self.invalidate_candidates();
                self.marked.clear();
                self.close_dialog();
                Some(SelectionResult::Delete { base_path, paths })
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.dialog_error = Some(e.to_string());
                None
            }
        }
    }

    /// Resolves symlinks on the base and every marked path. Any target that is
    /// not strictly inside the base rejects the whole batch.
    fn resolve_marked(&self) -> Result<(PathBuf, Vec<DeletePath>), DeleteError> {
        let base = resolve(&self.base);

        let mut paths = Vec::with_capacity(self.marked.len());
        for marked in &self.marked {
            let target = resolve(marked);
            if target == base || !target.starts_with(&base) {
                return Err(DeleteError::OutsideBase {
                    target,
                    base: base.clone(),
                });
            }

            let basename = self
                .matcher
                .as_ref()
                .and_then(|matcher| matcher.find(marked))
                .map(|entry| entry.basename.clone())
                .or_else(|| {
                    marked
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                })
                .unwrap_or_default();
            paths.push(DeletePath {
                path: target,
                basename,
            });
        }

        Ok((base, paths))
    }

    fn handle_rename_key(&mut self, key: Key) -> Option<SelectionResult> {
        match key {
            Key::Enter => match self.submit_rename() {
                Ok(Some(result)) => Some(result),
                Ok(None) => {
                    self.close_dialog();
                    None
                }
                Err(e) => {
                    tracing::debug!("rename rejected: {}", e);
                    self.dialog_error = Some(e.to_string());
                    None
                }
            },
            k if k.is_cancel() => {
                self.close_dialog();
                None
            }
            k => {
                if self.dialog.apply(k, is_rename_char) == Edit::Changed {
                    self.dialog_error = None;
                }
                None
            }
        }
    }

    /// `Ok(None)` means the name did not change.
    fn submit_rename(&self) -> Result<Option<SelectionResult>, RenameError> {
        let Some(target) = &self.rename_target else {
            return Ok(None);
        };

        let new_name = self.dialog.text().replace(' ', "-").trim().to_string();
        if new_name.is_empty() {
            return Err(RenameError::Empty);
        }
        if new_name.contains('/') {
            return Err(RenameError::PathSeparator);
        }
        if new_name == target.basename {
            return Ok(None);
        }
        if self.base.join(&new_name).exists() {
            return Err(RenameError::Exists(new_name));
        }

        Ok(Some(SelectionResult::Rename {
            base_path: self.base.clone(),
            old_name: target.basename.clone(),
            new_name,
        }))
    }

    /// Drives the session until it produces a result.
    ///
    /// Each turn redraws, then blocks on `keys`. A resize, whether signalled
    /// through `resize` or reported by the key source, re-queries the
    /// viewport before the next frame.
    pub fn run<W: Write>(
        &mut self,
        out: &mut W,
        keys: &mut dyn KeySource,
        resize: &dyn ResizeWatch,
    ) -> io::Result<SelectionResult> {
        tracing::info!(base = %self.base.display(), "selector started");

        loop {
            if resize.take_pending() {
                self.refresh_viewport(resize);
                queue!(out, Clear(ClearType::All))?;
            }
            self.frame().write_to(out)?;

            if self.view == ViewState::DeleteConfirm && keys.is_exhausted() {
                if let Some(text) = self.confirmation.take() {
                    self.dialog = LineBuffer::new(text);
                    if let Some(result) = self.handle_key(Key::Enter) {
                        return Ok(result);
                    }
                    continue;
                }
            }

            let Some(key) = keys.read_key()? else {
                self.refresh_viewport(resize);
                continue;
            };
            if let Some(result) = self.handle_key(key) {
                return Ok(result);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::terminal::{NoResize, ScriptedKeys};
    use chrono::Duration;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
    }

    fn fixed_viewport() -> ViewportOverrides {
        ViewportOverrides {
            width: Some(80),
            height: Some(24),
        }
    }

    /// Candidates under a fake base, newest first so rank follows `names`.
    fn selector_with(names: &[&str]) -> Selector {
        let base = PathBuf::from("/tries");
        let now = Utc::now();
        let candidates = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                CandidateEntry::new(&base, name, now - Duration::hours(i as i64 + 1), now)
            })
            .collect();
        Selector::new(&base, "")
            .with_candidates(candidates)
            .with_viewport(fixed_viewport())
            .with_today(today())
    }

    /// Selector over real directories in a temp base.
    fn selector_on_disk(names: &[&str]) -> (TempDir, Selector) {
        let dir = TempDir::new().unwrap();
        for name in names {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        let selector = Selector::new(dir.path(), "")
            .with_viewport(fixed_viewport())
            .with_today(today());
        (dir, selector)
    }

    fn press(selector: &mut Selector, keys: &[Key]) -> Option<SelectionResult> {
        let mut result = None;
        for key in keys {
            result = selector.handle_key(*key);
        }
        result
    }

    fn type_text(selector: &mut Selector, text: &str) -> Option<SelectionResult> {
        let keys: Vec<Key> = text.chars().map(Key::Char).collect();
        press(selector, &keys)
    }

    mod browsing_tests {
        use super::*;

        #[test]
        fn test_initial_input_replaces_spaces() {
            let selector = Selector::new("/tries", "my new idea");
            assert_eq!(selector.input(), "my-new-idea");
            assert_eq!(selector.view(), ViewState::Browsing);
        }

        #[test]
        fn test_enter_selects_entry_under_cursor() {
            let mut selector = selector_with(&["alpha", "beta"]);
            let result = press(&mut selector, &[Key::Down, Key::Enter]);
            assert_eq!(
                result,
                Some(SelectionResult::Cd {
                    path: PathBuf::from("/tries/beta")
                })
            );
        }

        #[test]
        fn test_cursor_clamps_at_both_ends() {
            let mut selector = selector_with(&["alpha", "beta"]);
            press(&mut selector, &[Key::Up, Key::Ctrl('p')]);
            assert_eq!(selector.list_cursor(), 0);
            press(&mut selector, &[Key::Down, Key::Ctrl('n'), Key::Down]);
            assert_eq!(selector.list_cursor(), 1);
        }

        #[test]
        fn test_typing_filters_and_resets_cursor() {
            let mut selector = selector_with(&["alpha", "beta", "bravo"]);
            press(&mut selector, &[Key::Down, Key::Down]);
            type_text(&mut selector, "b");
            assert_eq!(selector.list_cursor(), 0);
            let names: Vec<_> = selector
                .matches()
                .iter()
                .map(|m| m.entry.basename.clone())
                .collect();
            assert_eq!(names.len(), 2);
            assert!(names.iter().all(|n| n.starts_with('b')));
        }

        #[test]
        fn test_disallowed_chars_are_ignored() {
            let mut selector = selector_with(&["alpha"]);
            type_text(&mut selector, "a/!b");
            assert_eq!(selector.input(), "ab");
        }

        #[test]
        fn test_arrows_left_right_do_nothing() {
            let mut selector = Selector::new("/tries", "abc")
                .with_candidates(Vec::new())
                .with_viewport(fixed_viewport());
            press(&mut selector, &[Key::Left, Key::Left]);
            type_text(&mut selector, "d");
            assert_eq!(selector.input(), "abcd");
        }

        #[test]
        fn test_line_editing_keys() {
            let mut selector = selector_with(&[]);
            type_text(&mut selector, "foo-bar");
            press(&mut selector, &[Key::Ctrl('w')]);
            assert_eq!(selector.input(), "foo-");
            press(&mut selector, &[Key::Ctrl('a'), Key::Ctrl('f'), Key::Ctrl('k')]);
            assert_eq!(selector.input(), "f");
            press(&mut selector, &[Key::Ctrl('h')]);
            assert_eq!(selector.input(), "");
        }

        #[test]
        fn test_enter_on_create_row_makes_dated_directory() {
            let mut selector = selector_with(&["alpha"]);
            type_text(&mut selector, "new thing");
            let result = selector.handle_key(Key::Enter);
            assert_eq!(
                result,
                Some(SelectionResult::Mkdir {
                    path: PathBuf::from("/tries/2024-05-03-new-thing")
                })
            );
        }

        #[test]
        fn test_create_row_is_reachable_below_matches() {
            let mut selector = selector_with(&["alpha"]);
            type_text(&mut selector, "al");
            let result = press(&mut selector, &[Key::Down, Key::Enter]);
            assert_eq!(
                result,
                Some(SelectionResult::Mkdir {
                    path: PathBuf::from("/tries/2024-05-03-al")
                })
            );
        }

        #[test]
        fn test_ctrl_t_creates_only_with_input() {
            let mut selector = selector_with(&["alpha"]);
            assert_eq!(selector.handle_key(Key::Ctrl('t')), None);
            type_text(&mut selector, "al");
            assert_eq!(
                selector.handle_key(Key::Ctrl('t')),
                Some(SelectionResult::Mkdir {
                    path: PathBuf::from("/tries/2024-05-03-al")
                })
            );
        }

        #[test]
        fn test_enter_with_nothing_to_select() {
            let mut selector = selector_with(&[]);
            assert_eq!(selector.handle_key(Key::Enter), None);
        }

        #[test]
        fn test_escape_and_ctrl_c_cancel() {
            let mut selector = selector_with(&["alpha"]);
            assert_eq!(
                selector.handle_key(Key::Esc),
                Some(SelectionResult::Cancelled)
            );
            let mut selector = selector_with(&["alpha"]);
            assert_eq!(
                selector.handle_key(Key::Ctrl('c')),
                Some(SelectionResult::Cancelled)
            );
        }

        #[test]
        fn test_frame_lists_matches() {
            let mut selector = selector_with(&["alpha", "beta"]);
            let text = selector.frame().plain_text();
            assert!(text.contains("📁 alpha"));
            assert!(text.contains("📁 beta"));
        }

        #[test]
        fn test_unreadable_base_gives_empty_list() {
            let mut selector = Selector::new("/definitely/not/here", "")
                .with_viewport(fixed_viewport());
            assert!(selector.matches().is_empty());
            assert_eq!(selector.handle_key(Key::Enter), None);
        }

        #[test]
        fn test_selected_create_row_drawn_below_full_list() {
            let names: Vec<String> = (0..18).map(|i| format!("a{:02}", i)).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let (_dir, mut selector) = selector_on_disk(&refs);
            type_text(&mut selector, "a");
            press(&mut selector, &[Key::Down; 18]);

            assert_eq!(selector.list_cursor(), 18);
            assert!(selector.frame().plain_text().contains("Create new: 2024-05-03-a"));
        }

        #[test]
        fn test_non_ascii_digit_name_renders() {
            let (_dir, mut selector) = selector_on_disk(&["٢٠٢٤-٠١-٠١-foo"]);
            assert!(selector.frame().plain_text().contains("📁 ٢٠٢٤-٠١-٠١-foo"));
        }
    }

    mod delete_tests {
        use super::*;

        #[test]
        fn test_ctrl_d_toggles_marks_and_delete_mode() {
            let mut selector = selector_with(&["alpha", "beta"]);
            press(&mut selector, &[Key::Ctrl('d')]);
            assert!(selector.is_delete_mode());
            assert_eq!(selector.marked(), &[PathBuf::from("/tries/alpha")]);

            press(&mut selector, &[Key::Down, Key::Ctrl('d')]);
            assert_eq!(selector.marked().len(), 2);

            press(&mut selector, &[Key::Ctrl('d')]);
            press(&mut selector, &[Key::Up, Key::Ctrl('d')]);
            assert!(!selector.is_delete_mode());
        }

        #[test]
        fn test_escape_in_delete_mode_clears_marks() {
            let mut selector = selector_with(&["alpha"]);
            press(&mut selector, &[Key::Ctrl('d')]);
            assert_eq!(selector.handle_key(Key::Esc), None);
            assert!(!selector.is_delete_mode());
            assert_eq!(
                selector.handle_key(Key::Esc),
                Some(SelectionResult::Cancelled)
            );
        }

        #[test]
        fn test_enter_in_delete_mode_opens_dialog() {
            let mut selector = selector_with(&["alpha"]);
            press(&mut selector, &[Key::Ctrl('d'), Key::Enter]);
            assert_eq!(selector.view(), ViewState::DeleteConfirm);
            let text = selector.frame().plain_text();
            assert!(text.contains("Delete 1 directory?"));
            assert!(text.contains("🗑️ alpha"));
        }

        #[test]
        fn test_wrong_confirmation_cancels() {
            let mut selector = selector_with(&["alpha"]);
            press(&mut selector, &[Key::Ctrl('d'), Key::Enter]);
            type_text(&mut selector, "yes");
            assert_eq!(selector.handle_key(Key::Enter), None);
            assert_eq!(selector.view(), ViewState::Browsing);
            assert!(selector.marked().is_empty());
            assert_eq!(selector.status(), Some("Delete cancelled"));

            let text = selector.frame().plain_text();
            assert!(text.contains("Delete cancelled"));
            assert!(selector.status().is_none());
        }

        #[test]
        fn test_escape_in_dialog_cancels() {
            let mut selector = selector_with(&["alpha"]);
            press(&mut selector, &[Key::Ctrl('d'), Key::Enter, Key::Esc]);
            assert_eq!(selector.view(), ViewState::Browsing);
            assert!(selector.marked().is_empty());
        }

        #[test]
        fn test_confirmed_delete_resolves_paths_in_mark_order() {
            let (dir, mut selector) = selector_on_disk(&["alpha", "beta"]);
            // Rank follows mtimes, so pick entries by filtering on their names
            type_text(&mut selector, "beta");
            press(&mut selector, &[Key::Ctrl('d')]);
            press(&mut selector, &[Key::Ctrl('k'), Key::Ctrl('a'), Key::Ctrl('k')]);
            type_text(&mut selector, "alpha");
            press(&mut selector, &[Key::Ctrl('d'), Key::Enter]);
            type_text(&mut selector, "YES");

            let base = fs::canonicalize(dir.path()).unwrap();
            let result = selector.handle_key(Key::Enter);
            assert_eq!(
                result,
                Some(SelectionResult::Delete {
                    base_path: base.clone(),
                    paths: vec![
                        DeletePath {
                            path: base.join("beta"),
                            basename: "beta".to_string()
                        },
                        DeletePath {
                            path: base.join("alpha"),
                            basename: "alpha".to_string()
                        },
                    ],
                })
            );
        }

        #[test]
        fn test_safety_check_rejects_whole_batch() {
            let base = TempDir::new().unwrap();
            let outside = TempDir::new().unwrap();
            fs::create_dir(base.path().join("inside")).unwrap();
            fs::create_dir(outside.path().join("elsewhere")).unwrap();

            let now = Utc::now();
            let candidates = vec![
                CandidateEntry::new(base.path(), "inside", now, now),
                CandidateEntry::new(outside.path(), "elsewhere", now - Duration::hours(1), now),
            ];
            let mut selector = Selector::new(base.path(), "")
                .with_candidates(candidates)
                .with_viewport(fixed_viewport());

            press(&mut selector, &[Key::Ctrl('d'), Key::Down, Key::Ctrl('d'), Key::Enter]);
            type_text(&mut selector, "YES");
            assert_eq!(selector.handle_key(Key::Enter), None);

            assert_eq!(selector.view(), ViewState::DeleteConfirm);
            assert_eq!(selector.marked().len(), 2);
            let error = selector.dialog_error().unwrap();
            assert!(error.starts_with("Safety check failed:"));
            assert!(error.contains("elsewhere"));
            assert!(selector.frame().plain_text().contains("Safety check failed"));
        }

        #[cfg(unix)]
        #[test]
        fn test_symlink_escaping_base_is_rejected() {
            let base = TempDir::new().unwrap();
            let outside = TempDir::new().unwrap();
            std::os::unix::fs::symlink(outside.path(), base.path().join("sneaky")).unwrap();

            // Discovery skips links, so hand the entry in directly
            let now = Utc::now();
            let mut selector = Selector::new(base.path(), "")
                .with_candidates(vec![CandidateEntry::new(base.path(), "sneaky", now, now)])
                .with_viewport(fixed_viewport());
            press(&mut selector, &[Key::Ctrl('d'), Key::Enter]);
            type_text(&mut selector, "YES");
            assert_eq!(selector.handle_key(Key::Enter), None);
            assert!(selector.dialog_error().is_some());
        }

        #[test]
        fn test_delete_invalidates_candidate_cache() {
            let (dir, mut selector) = selector_on_disk(&["alpha", "beta"]);
            type_text(&mut selector, "beta");
            press(&mut selector, &[Key::Ctrl('d'), Key::Enter]);
            type_text(&mut selector, "YES");
            assert!(matches!(
                selector.handle_key(Key::Enter),
                Some(SelectionResult::Delete { .. })
            ));

            fs::remove_dir(dir.path().join("beta")).unwrap();
            press(&mut selector, &[Key::Ctrl('a'), Key::Ctrl('k')]);
            let names: Vec<_> = selector
                .matches()
                .iter()
                .map(|m| m.entry.basename.clone())
                .collect();
            assert_eq!(names, vec!["alpha"]);
        }
    }

    mod rename_tests {
        use super::*;

        fn open_rename_on(selector: &mut Selector, name: &str) {
            type_text(selector, name);
            press(selector, &[Key::Ctrl('r')]);
            assert_eq!(selector.view(), ViewState::Rename);
        }

        fn clear_dialog(selector: &mut Selector) {
            press(selector, &[Key::Ctrl('a'), Key::Ctrl('k')]);
        }

        #[test]
        fn test_rename_prefills_current_name() {
            let (_dir, mut selector) = selector_on_disk(&["foo"]);
            open_rename_on(&mut selector, "foo");
            let text = selector.frame().plain_text();
            assert!(text.contains("📁 foo"));
            assert!(text.contains("New name: foo "));
        }

        #[test]
        fn test_rename_to_existing_sibling_is_rejected() {
            let (_dir, mut selector) = selector_on_disk(&["foo", "bar"]);
            open_rename_on(&mut selector, "foo");
            clear_dialog(&mut selector);
            type_text(&mut selector, "bar");
            assert_eq!(selector.handle_key(Key::Enter), None);
            assert_eq!(selector.dialog_error(), Some("Directory exists: bar"));
            assert_eq!(selector.view(), ViewState::Rename);

            // Editing clears the error
            type_text(&mut selector, "2");
            assert_eq!(selector.dialog_error(), None);
        }

        #[test]
        fn test_rename_to_same_name_is_silent() {
            let (_dir, mut selector) = selector_on_disk(&["foo"]);
            open_rename_on(&mut selector, "foo");
            assert_eq!(selector.handle_key(Key::Enter), None);
            assert_eq!(selector.dialog_error(), None);
            assert_eq!(selector.view(), ViewState::Browsing);
        }

        #[test]
        fn test_rename_validation_errors() {
            let (_dir, mut selector) = selector_on_disk(&["foo"]);
            open_rename_on(&mut selector, "foo");

            clear_dialog(&mut selector);
            selector.handle_key(Key::Enter);
            assert_eq!(selector.dialog_error(), Some("Name cannot be empty"));

            type_text(&mut selector, "a/b");
            selector.handle_key(Key::Enter);
            assert_eq!(selector.dialog_error(), Some("Name cannot contain /"));
        }

        #[test]
        fn test_successful_rename() {
            let (dir, mut selector) = selector_on_disk(&["foo"]);
            open_rename_on(&mut selector, "foo");
            clear_dialog(&mut selector);
            type_text(&mut selector, "new name");
            assert_eq!(
                selector.handle_key(Key::Enter),
                Some(SelectionResult::Rename {
                    base_path: dir.path().to_path_buf(),
                    old_name: "foo".to_string(),
                    new_name: "new-name".to_string(),
                })
            );
        }

        #[test]
        fn test_escape_aborts_rename() {
            let (_dir, mut selector) = selector_on_disk(&["foo"]);
            open_rename_on(&mut selector, "foo");
            assert_eq!(selector.handle_key(Key::Esc), None);
            assert_eq!(selector.view(), ViewState::Browsing);
            assert_eq!(selector.input(), "foo");
        }

        #[test]
        fn test_opening_rename_clears_marks() {
            let mut selector = selector_with(&["alpha", "beta"]);
            press(&mut selector, &[Key::Ctrl('d'), Key::Down, Key::Ctrl('r')]);
            assert_eq!(selector.view(), ViewState::Rename);
            assert!(selector.marked().is_empty());
        }

        #[test]
        fn test_ctrl_r_without_entry_does_nothing() {
            let mut selector = selector_with(&[]);
            press(&mut selector, &[Key::Ctrl('r')]);
            assert_eq!(selector.view(), ViewState::Browsing);
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_run_returns_first_result() {
            let mut selector = selector_with(&["alpha", "beta"]);
            let mut keys = ScriptedKeys::new(vec![Key::Down, Key::Enter]);
            let mut out = Vec::new();
            let result = selector.run(&mut out, &mut keys, &NoResize).unwrap();
            assert_eq!(
                result,
                SelectionResult::Cd {
                    path: PathBuf::from("/tries/beta")
                }
            );
            assert!(!out.is_empty());
        }

        #[test]
        fn test_drained_script_cancels() {
            let mut selector = selector_with(&["alpha"]);
            let mut keys = ScriptedKeys::new(vec![Key::Char('z')]);
            let mut out = Vec::new();
            let result = selector.run(&mut out, &mut keys, &NoResize).unwrap();
            assert_eq!(result, SelectionResult::Cancelled);
        }

        #[test]
        fn test_confirmation_used_once_keys_run_out() {
            let (dir, selector) = selector_on_disk(&["alpha"]);
            let mut selector = selector.with_confirmation(Some("YES".to_string()));
            let mut keys = ScriptedKeys::new(vec![Key::Ctrl('d'), Key::Enter]);
            let mut out = Vec::new();
            let result = selector.run(&mut out, &mut keys, &NoResize).unwrap();

            let base = fs::canonicalize(dir.path()).unwrap();
            assert_eq!(
                result,
                SelectionResult::Delete {
                    base_path: base.clone(),
                    paths: vec![DeletePath {
                        path: base.join("alpha"),
                        basename: "alpha".to_string()
                    }],
                }
            );
        }

        #[test]
        fn test_wrong_confirmation_ends_in_cancel() {
            let (_dir, selector) = selector_on_disk(&["alpha"]);
            let mut selector = selector.with_confirmation(Some("no".to_string()));
            let mut keys = ScriptedKeys::new(vec![Key::Ctrl('d'), Key::Enter]);
            let mut out = Vec::new();
            let result = selector.run(&mut out, &mut keys, &NoResize).unwrap();
            assert_eq!(result, SelectionResult::Cancelled);
        }

        /// Reports one resize to a fixed 100x12 screen.
        struct OneResize(std::cell::Cell<bool>);

        impl ResizeWatch for OneResize {
            fn take_pending(&self) -> bool {
                self.0.replace(false)
            }

            fn measure(&self, _overrides: ViewportOverrides) -> Viewport {
                Viewport {
                    width: 100,
                    height: 12,
                }
            }
        }

        #[test]
        fn test_resize_requeries_viewport_and_clears() {
            let mut selector = selector_with(&["alpha"]);
            assert_eq!(selector.viewport(), Viewport { width: 80, height: 24 });

            let mut keys = ScriptedKeys::new(vec![Key::Enter]);
            let mut out = Vec::new();
            let resize = OneResize(std::cell::Cell::new(true));
            let result = selector.run(&mut out, &mut keys, &resize).unwrap();

            assert!(matches!(result, SelectionResult::Cd { .. }));
            assert_eq!(selector.viewport(), Viewport { width: 100, height: 12 });
            let text = String::from_utf8_lossy(&out);
            assert!(text.starts_with("\x1b[2J"));
            assert_eq!(selector.frame().lines.len(), 12);
        }

        #[test]
        fn test_no_resize_leaves_screen_uncleared() {
            let mut selector = selector_with(&["alpha"]);
            let mut keys = ScriptedKeys::new(vec![Key::Enter]);
            let mut out = Vec::new();
            selector.run(&mut out, &mut keys, &NoResize).unwrap();
            assert!(!String::from_utf8_lossy(&out).contains("\x1b[2J"));
        }
    }
}
