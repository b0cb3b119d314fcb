//! Terminal I/O: raw mode, screen size, resize notification and key sources

use super::input::Key;
use super::render::Viewport;
use crossterm::{
    cursor::{SetCursorStyle, Show},
    event::{self, Event},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use std::collections::VecDeque;
use std::io::{self, IsTerminal};

/// Explicit screen size, usually from `TRY_WIDTH` / `TRY_HEIGHT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportOverrides {
    pub width: Option<u16>,
    pub height: Option<u16>,
}

impl Viewport {
    /// Resolves the screen size: overrides first, then the terminal, then 80x24.
    pub fn query(overrides: ViewportOverrides) -> Self {
        let measured = match (overrides.width, overrides.height) {
            (Some(_), Some(_)) => None,
            _ => terminal::size().ok(),
        };
        Self::resolve(overrides, measured)
    }

    fn resolve(overrides: ViewportOverrides, measured: Option<(u16, u16)>) -> Self {
        let fallback = Viewport::default();
        let pick = |explicit: Option<u16>, measured: Option<u16>, fallback: usize| {
            explicit
                .or(measured)
                .filter(|n| *n > 0)
                .map_or(fallback, usize::from)
        };

        Self {
            width: pick(overrides.width, measured.map(|(w, _)| w), fallback.width),
            height: pick(overrides.height, measured.map(|(_, h)| h), fallback.height),
        }
    }
}

/// True when both stdin and stderr are attached to a terminal.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Puts the terminal into picker mode and restores it on drop.
///
/// The UI is drawn on stderr so stdout stays free for the emitted script.
pub struct TerminalGuard {
    raw: bool,
    full_screen: bool,
}

impl TerminalGuard {
    /// `full_screen` switches to the alternate screen. Scripted sessions skip
    /// it so their output stays readable.
    pub fn enter(full_screen: bool) -> io::Result<Self> {
        let raw = io::stdin().is_terminal();
        if raw {
            enable_raw_mode()?;
        }

        let guard = Self { raw, full_screen };
        if full_screen {
            execute!(
                io::stderr(),
                EnterAlternateScreen,
                Clear(ClearType::All),
                SetCursorStyle::BlinkingBar
            )?;
        }
        tracing::debug!(raw, full_screen, "terminal entered");
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best effort; nothing useful can be done with a failure here
        if self.full_screen {
            let _ = execute!(
                io::stderr(),
                SetCursorStyle::DefaultUserShape,
                Show,
                LeaveAlternateScreen
            );
        }
        if self.raw {
            let _ = disable_raw_mode();
        }
        tracing::debug!("terminal restored");
    }
}

/// Source of pending resize notifications.
pub trait ResizeWatch {
    /// Returns true once per batch of resizes since the last call.
    fn take_pending(&self) -> bool;

    /// Current screen size after a resize.
    fn measure(&self, overrides: ViewportOverrides) -> Viewport {
        Viewport::query(overrides)
    }
}

/// Resize watcher for platforms without a resize signal.
#[derive(Debug, Default)]
pub struct NoResize;

impl ResizeWatch for NoResize {
    fn take_pending(&self) -> bool {
        false
    }
}

#[cfg(unix)]
pub use signal::SignalResize;

#[cfg(unix)]
mod signal {
    use super::ResizeWatch;
    use signal_hook::consts::signal::SIGWINCH;
    use signal_hook::iterator::{Handle, Signals};
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread::JoinHandle;

    /// SIGWINCH listener. A background thread flips a flag the main loop polls.
    /// Dropping it stops the thread and unregisters the handler.
    pub struct SignalResize {
        pending: Arc<AtomicBool>,
        handle: Handle,
        thread: Option<JoinHandle<()>>,
    }

    impl SignalResize {
        pub fn install() -> io::Result<Self> {
            let mut signals = Signals::new([SIGWINCH])?;
            let handle = signals.handle();
            let pending = Arc::new(AtomicBool::new(false));

            let flag = Arc::clone(&pending);
            let thread = std::thread::Builder::new()
                .name("try-resize".to_string())
                .spawn(move || {
                    for _ in signals.forever() {
                        tracing::debug!("SIGWINCH received");
                        flag.store(true, Ordering::SeqCst);
                    }
                })?;

            Ok(Self {
                pending,
                handle,
                thread: Some(thread),
            })
        }
    }

    impl ResizeWatch for SignalResize {
        fn take_pending(&self) -> bool {
            self.pending.swap(false, Ordering::SeqCst)
        }
    }

    impl Drop for SignalResize {
        fn drop(&mut self) {
            self.handle.close();
            if let Some(thread) = self.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

/// Subscribes to resize notifications, degrading to `NoResize` when the
/// platform or the signal registration does not allow it.
pub fn subscribe_resize() -> Box<dyn ResizeWatch> {
    #[cfg(unix)]
    {
        match SignalResize::install() {
            Ok(watch) => return Box::new(watch),
            Err(e) => tracing::warn!("resize notifications unavailable: {}", e),
        }
    }
    Box::new(NoResize)
}

/// Where keystrokes come from.
pub trait KeySource {
    /// Blocks for the next key. `Ok(None)` means the wait ended without a
    /// usable key, for example on a resize; callers should redraw and ask again.
    fn read_key(&mut self) -> io::Result<Option<Key>>;

    /// True once a finite source has nothing left to give.
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Keys read from the real terminal.
#[derive(Debug, Default)]
pub struct LiveKeys;

impl KeySource for LiveKeys {
    fn read_key(&mut self) -> io::Result<Option<Key>> {
        match event::read()? {
            Event::Key(key) => Ok(Key::from_key_event(key)),
            Event::Resize(width, height) => {
                tracing::debug!(width, height, "resize event");
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

/// A fixed queue of keys. Once drained it answers `Esc` forever so any
/// session driven by it is guaranteed to end.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeys {
    keys: VecDeque<Key>,
}

impl ScriptedKeys {
    pub fn new(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }
}

impl KeySource for ScriptedKeys {
    fn read_key(&mut self) -> io::Result<Option<Key>> {
        Ok(Some(self.keys.pop_front().unwrap_or(Key::Esc)))
    }

    fn is_exhausted(&self) -> bool {
        self.keys.is_empty()
    }
}
