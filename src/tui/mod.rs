// TUI module: key decoding, line editing, rendering and the selector loop
pub mod colors;
pub mod helpers;
pub mod input;
pub mod line_edit;
pub mod render;
pub mod selector;
pub mod terminal;

// Re-exports
pub use colors::Palette;
pub use input::{parse_key_script, Key};
pub use line_edit::LineBuffer;
pub use render::{Frame, RenderContext, Viewport};
pub use selector::{Selector, ViewState};
pub use terminal::{
    is_interactive, subscribe_resize, KeySource, LiveKeys, NoResize, ResizeWatch, ScriptedKeys,
    TerminalGuard, ViewportOverrides,
};

use crate::config::SessionConfig;
use crate::domain::SelectionResult;
use crate::error::{Result, TryError};
use std::io::{self, Write};

/// Runs one picker session over `config.base_path` and returns its outcome.
///
/// # Modes
/// - `render_once`: draws a single frame and returns `Cancelled`
/// - scripted (`keys` set): reads keys from the script, leaves the terminal alone
/// - interactive: raw mode, alternate screen and live keys; needs a TTY
pub fn run_session(config: &SessionConfig) -> Result<SelectionResult> {
    let mut selector = Selector::new(&config.base_path, config.initial_input())
        .with_palette(Palette::new(config.colors))
        .with_viewport(config.viewport)
        .with_confirmation(config.confirm.clone());

    let stderr = io::stderr();

    if config.render_once && config.keys.is_none() {
        let mut out = stderr.lock();
        selector.frame().write_to(&mut out)?;
        writeln!(out)?;
        return Ok(SelectionResult::Cancelled);
    }

    if let Some(keys) = &config.keys {
        tracing::debug!(count = keys.len(), "running scripted session");
        let mut keys = ScriptedKeys::new(keys.iter().copied());
        let mut out = stderr.lock();
        let result = selector.run(&mut out, &mut keys, &NoResize)?;
        writeln!(out)?;
        return Ok(result);
    }

    if !is_interactive() {
        return Err(TryError::NotATty);
    }

    let guard = TerminalGuard::enter(true)?;
    let resize = subscribe_resize();
    let result = {
        let mut out = stderr.lock();
        selector.run(&mut out, &mut LiveKeys, resize.as_ref())
    };
    drop(resize);
    drop(guard);

    Ok(result?)
}
