// SPDX-License-Identifier: MIT
//
// Terminal session: the one type applications hold.
//
// A `Session` owns everything with a lifetime tied to "the terminal is in
// cell mode": the device (in raw mode), the capability table, the back and
// front buffers, the renderer state, the input multiplexer and the resize
// channel. Nothing is global, so several sessions against fake devices can
// coexist in one process.
//
// Setup switches to the alternate screen, enables keypad mode, hides the
// cursor and clears. Teardown runs on drop in the reverse direction: the
// restore escapes are written and flushed first, then the resize handler is
// unregistered, and the device restores its termios last as it drops.
//
// A resize event only raises a flag. The buffers are reallocated by the
// next `clear` or `present`, against the size at that moment.

use std::os::fd::OwnedFd;
use std::path::Path;
use std::time::Duration;
use std::{env, io};

use crate::buffer::{CellBuffer, Size};
use crate::caps::{self, Cap, Capabilities};
use crate::cell::Cell;
use crate::color::{OutputMode, Style};
use crate::device::{Device, Tty};
use crate::diff::{RenderStats, Renderer};
use crate::error::InitError;
use crate::event_loop::{DEFAULT_ESCAPE_DELAY, Multiplexer};
use crate::input::{Event, InputMode};
use crate::resize::{ResizeChannel, ResizeNotifier};

// ─── Options ────────────────────────────────────────────────────────────────

/// Session configuration.
#[derive(Debug, Clone)]
pub struct Options {
    /// Terminal name to resolve instead of `$TERM`.
    pub term: Option<String>,
    /// A ready-made capability table; skips name resolution entirely.
    pub capabilities: Option<Capabilities>,
    /// How long [`Session::poll_event`] waits for the rest of an escape
    /// sequence before reporting a lone ESC.
    pub escape_delay: Duration,
    /// Raise resize events on SIGWINCH.
    pub watch_sigwinch: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            term: None,
            capabilities: None,
            escape_delay: DEFAULT_ESCAPE_DELAY,
            watch_sigwinch: true,
        }
    }
}

impl Options {
    fn into_capabilities(self) -> Result<Capabilities, InitError> {
        if let Some(caps) = self.capabilities {
            return Ok(caps);
        }
        let term = self.term.or_else(|| env::var("TERM").ok()).unwrap_or_default();
        Ok(caps::resolve(&term)?)
    }
}

// ─── Session ────────────────────────────────────────────────────────────────

/// A terminal in cell mode.
///
/// # Example
///
/// ```no_run
/// use cellterm::{Cell, Event, Options, Session, Style};
///
/// let mut session = Session::open(Options::default())?;
/// session.put_cell(0, 0, Cell::styled('@', Style::YELLOW, Style::DEFAULT));
/// session.present()?;
/// while !matches!(session.poll_event(), Event::Key(_) | Event::Error) {}
/// // The terminal is restored when `session` drops.
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Session<D: Device = Tty> {
    caps: Capabilities,
    back: CellBuffer,
    front: CellBuffer,
    renderer: Renderer,
    mux: Multiplexer,
    cursor: Option<(u16, u16)>,
    input_mode: InputMode,
    clear_fg: Style,
    clear_bg: Style,
    resize_pending: bool,
    /// Whether the device was switched to raw mode and needs teardown.
    active: bool,
    // Drop order matters: the resize handler goes before the device.
    resize: ResizeChannel,
    device: D,
}

impl Session<Tty> {
    /// Start a session on the controlling terminal.
    ///
    /// # Errors
    ///
    /// See [`InitError`].
    pub fn open(options: Options) -> Result<Self, InitError> {
        let device = Tty::open().map_err(InitError::DeviceOpen)?;
        Self::with_device(device, options)
    }

    /// Start a session on the terminal device at `path`.
    ///
    /// # Errors
    ///
    /// See [`InitError`].
    pub fn open_path(path: impl AsRef<Path>, options: Options) -> Result<Self, InitError> {
        let device = Tty::open_path(path).map_err(InitError::DeviceOpen)?;
        Self::with_device(device, options)
    }

    /// Start a session on an already open terminal descriptor.
    ///
    /// # Errors
    ///
    /// See [`InitError`].
    pub fn from_fd(fd: OwnedFd, options: Options) -> Result<Self, InitError> {
        Self::with_device(Tty::from_fd(fd), options)
    }
}

impl<D: Device> Session<D> {
    /// Start a session on any [`Device`].
    ///
    /// # Errors
    ///
    /// See [`InitError`]. On failure everything acquired so far, the
    /// device included, has been released.
    pub fn with_device(device: D, options: Options) -> Result<Self, InitError> {
        let escape_delay = options.escape_delay;
        let watch_sigwinch = options.watch_sigwinch;
        let caps = options.into_capabilities()?;
        log::debug!("terminal capabilities resolved for {:?}", caps.name());

        let resize = ResizeChannel::new(watch_sigwinch).map_err(InitError::NotificationChannel)?;

        let blank = Cell::EMPTY;
        let mut session = Self {
            caps,
            back: CellBuffer::new(Size::new(1, 1), blank),
            front: CellBuffer::new(Size::new(1, 1), blank),
            renderer: Renderer::new(),
            mux: Multiplexer::new(escape_delay),
            cursor: None,
            input_mode: InputMode::default(),
            clear_fg: Style::DEFAULT,
            clear_bg: Style::DEFAULT,
            resize_pending: false,
            active: false,
            resize,
            device,
        };
        session.start().map_err(InitError::DeviceSetup)?;
        Ok(session)
    }

    fn start(&mut self) -> io::Result<()> {
        self.device.enter_raw_mode()?;
        self.active = true;

        for cap in [Cap::EnterCa, Cap::EnterKeypad, Cap::HideCursor] {
            self.renderer.cap(&self.caps, cap);
        }
        self.send_clear()?;

        let size = self.device.window_size()?.clamped();
        let blank = self.blank();
        self.back = CellBuffer::new(size, blank);
        self.front = CellBuffer::new(size, blank);
        log::debug!("session started at {}x{}", size.width, size.height);
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.back.width()
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.back.height()
    }

    /// Size of the cell buffers. Lags the window after a resize until the
    /// next [`clear`](Self::clear) or [`present`](Self::present).
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.back.size()
    }

    #[inline]
    #[must_use]
    pub const fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    #[inline]
    #[must_use]
    pub const fn output_mode(&self) -> OutputMode {
        self.renderer.mode()
    }

    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    #[inline]
    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Whether a resize was seen and not yet applied to the buffers.
    #[inline]
    #[must_use]
    pub const fn resize_pending(&self) -> bool {
        self.resize_pending
    }

    /// A handle that raises a resize event from anywhere.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be duplicated.
    pub fn resize_notifier(&self) -> io::Result<ResizeNotifier> {
        self.resize.notifier()
    }

    // ── Drawing ─────────────────────────────────────────────────────────

    /// Set one back buffer cell. Out-of-range positions are ignored.
    pub fn put_cell(&mut self, x: u16, y: u16, cell: Cell) {
        self.back.set(x, y, cell);
    }

    /// Set one back buffer cell from its parts.
    pub fn change_cell(&mut self, x: u16, y: u16, ch: char, fg: Style, bg: Style) {
        self.put_cell(x, y, Cell::styled(ch, fg, bg));
    }

    /// Copy a `w`×`h` row-major block into the back buffer at `(x, y)`,
    /// clipped to the buffer.
    pub fn blit(&mut self, x: i32, y: i32, w: u16, h: u16, cells: &[Cell]) {
        self.back.blit(x, y, w, h, cells);
    }

    /// The back buffer, row-major, `width() * height()` cells.
    pub fn cell_buffer(&mut self) -> &mut [Cell] {
        self.back.cells_mut()
    }

    /// Styles used by [`clear`](Self::clear) and for newly exposed cells.
    pub const fn set_clear_attributes(&mut self, fg: Style, bg: Style) {
        self.clear_fg = fg;
        self.clear_bg = bg;
    }

    /// Reset the back buffer to blanks in the clear styles, applying a
    /// pending resize first.
    ///
    /// # Errors
    ///
    /// Returns an error if the screen clear after a resize cannot be written.
    pub fn clear(&mut self) -> io::Result<()> {
        if std::mem::take(&mut self.resize_pending) {
            self.update_size()?;
        }
        self.back.fill(self.blank());
        Ok(())
    }

    /// Draw the differences between the back buffer and the screen.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the device fails.
    pub fn present(&mut self) -> io::Result<RenderStats> {
        if std::mem::take(&mut self.resize_pending) {
            self.update_size()?;
        }
        let stats = self.renderer.render(&self.back, &mut self.front, &self.caps, self.cursor);
        self.renderer.flush_to(&mut self.device)?;
        Ok(stats)
    }

    // ── Modes ───────────────────────────────────────────────────────────

    /// Show the cursor at `(x, y)`, or hide it with `None`.
    ///
    /// The change is written with the next [`present`](Self::present).
    pub fn set_cursor(&mut self, cursor: Option<(u16, u16)>) {
        match (self.cursor.is_some(), cursor.is_some()) {
            (false, true) => self.renderer.cap(&self.caps, Cap::ShowCursor),
            (true, false) => self.renderer.cap(&self.caps, Cap::HideCursor),
            _ => {}
        }
        self.cursor = cursor;
        self.renderer.place_cursor(cursor);
    }

    /// Switch input handling. Returns the mode actually in effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the mouse mode change cannot be written.
    pub fn select_input_mode(&mut self, mode: InputMode) -> io::Result<InputMode> {
        let mode = mode.normalized();
        self.input_mode = mode;
        let cap = if mode.mouse { Cap::EnterMouse } else { Cap::ExitMouse };
        self.renderer.cap(&self.caps, cap);
        self.renderer.flush_to(&mut self.device)?;
        Ok(mode)
    }

    /// Switch color encoding for subsequent output.
    pub const fn select_output_mode(&mut self, mode: OutputMode) {
        self.renderer.set_mode(mode);
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Wait for the next event.
    pub fn poll_event(&mut self) -> Event {
        self.wait(None)
    }

    /// Wait up to `timeout` for the next event; [`Event::None`] if none came.
    pub fn peek_event(&mut self, timeout: Duration) -> Event {
        self.wait(Some(timeout))
    }

    fn wait(&mut self, timeout: Option<Duration>) -> Event {
        let event = self.mux.wait(
            &mut self.device,
            &mut self.resize,
            self.input_mode,
            self.caps.keys(),
            timeout,
        );
        if let Event::Resize(size) = event {
            log::debug!("terminal resized to {}x{}", size.width, size.height);
            self.resize_pending = true;
        }
        event
    }

    // ── Internals ───────────────────────────────────────────────────────

    const fn blank(&self) -> Cell {
        Cell::blank(self.clear_fg, self.clear_bg)
    }

    fn send_clear(&mut self) -> io::Result<()> {
        self.renderer.clear_screen(&self.caps, self.clear_fg, self.clear_bg, self.cursor);
        self.renderer.flush_to(&mut self.device)
    }

    fn update_size(&mut self) -> io::Result<()> {
        let size = match self.device.window_size() {
            Ok(size) => size.clamped(),
            Err(e) => {
                log::warn!("window size query failed, keeping {:?}: {e}", self.size());
                self.size()
            }
        };
        let blank = self.blank();
        self.back.resize(size, blank);
        self.front.resize(size, blank);
        self.front.fill(blank);
        self.send_clear()
    }
}

impl<D: Device> Drop for Session<D> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        for cap in [
            Cap::ShowCursor,
            Cap::Sgr0,
            Cap::ClearScreen,
            Cap::ExitCa,
            Cap::ExitKeypad,
            Cap::ExitMouse,
        ] {
            self.renderer.cap(&self.caps, cap);
        }
        if let Err(e) = self.renderer.flush_to(&mut self.device) {
            log::warn!("failed to restore terminal screen: {e}");
        }
        log::debug!("session closed");
    }
}

impl<D: Device> std::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("terminal", &self.caps.name())
            .field("size", &self.size())
            .field("cursor", &self.cursor)
            .field("input_mode", &self.input_mode)
            .field("output_mode", &self.output_mode())
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
