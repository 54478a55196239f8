// SPDX-License-Identifier: MIT
//
// Output buffering and stateful cell writing.
//
// Two components work together to minimize terminal I/O:
//
//   OutputBuffer accumulates every escape and character byte in memory so
//   a whole frame goes out in one device write.
//
//   CellWriter remembers where the terminal cursor was left and which
//   (fg, bg) pair was last emitted, and skips what would not change
//   anything. Consecutive cells in a row need no cursor move; consecutive
//   cells with the same styles need no SGR.

use std::io::{self, Write};

use crate::ansi;
use crate::caps::Capabilities;
use crate::color::{OutputMode, Style};
use crate::utf8;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer that accumulates terminal output for a single write.
///
/// Default capacity: 32 KB.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 32 * 1024;

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append raw bytes.
    #[inline]
    pub fn put(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a codepoint as UTF-8.
    ///
    /// Codepoint 0 (a wide glyph's shadow) is written as a space; other
    /// non-scalar values as `?`.
    pub fn put_codepoint(&mut self, cp: u32) {
        let mut enc = [0u8; utf8::MAX_LEN];
        let n = if cp == 0 {
            enc[0] = b' ';
            1
        } else {
            utf8::encode(cp, &mut enc)
        };
        self.buf.extend_from_slice(&enc[..n]);
    }

    /// Discard accumulated bytes, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write everything to `w` and empty the buffer.
    ///
    /// Short writes are continued and interrupted writes retried. The
    /// buffer is emptied even when the write fails, so a broken frame is
    /// never sent twice.
    ///
    /// # Errors
    ///
    /// Returns the first error from `w`.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let result = w.write_all(&self.buf).and_then(|()| w.flush());
        self.buf.clear();
        result
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // No-op; real flushing goes through flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── CellWriter ──────────────────────────────────────────────────────────────

/// Tracks terminal state to skip redundant escapes.
///
/// - **Cursor**: the position escape is skipped when the next cell is at
///   `(last_x + 1, last_y)`; the terminal advanced there on its own.
///   Invalidated at the start of every frame and after a screen clear.
/// - **Style**: the last emitted `(fg, bg)` pair is kept across frames.
///   Invalidated when the output mode changes, since the same pair then
///   encodes differently.
#[allow(clippy::struct_field_names)]
pub struct CellWriter {
    last_x: i32,
    last_y: i32,
    last_style: Option<(Style, Style)>,
}

impl CellWriter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_x: -1,
            last_y: -1,
            last_style: None,
        }
    }

    /// Forget where the terminal cursor is.
    pub const fn invalidate_position(&mut self) {
        self.last_x = -1;
        self.last_y = -1;
    }

    /// Forget which styles were last emitted.
    pub const fn invalidate_style(&mut self) {
        self.last_style = None;
    }

    /// Emit a style change unless `(fg, bg)` is what was last emitted.
    ///
    /// Returns `true` when anything was written.
    pub fn send_style(
        &mut self,
        out: &mut OutputBuffer,
        caps: &Capabilities,
        mode: OutputMode,
        fg: Style,
        bg: Style,
    ) -> bool {
        if self.last_style == Some((fg, bg)) {
            return false;
        }
        ansi::style(out, caps, mode, fg, bg).ok();
        self.last_style = Some((fg, bg));
        true
    }

    /// Write one character at `(x, y)`, moving the cursor only if needed.
    pub fn send_char(&mut self, out: &mut OutputBuffer, x: u16, y: u16, ch: u32) {
        let (xi, yi) = (i32::from(x), i32::from(y));
        if yi != self.last_y || xi != self.last_x + 1 {
            ansi::cursor_to(out, x, y).ok();
        }
        self.last_x = xi;
        self.last_y = yi;
        out.put_codepoint(ch);
    }
}

impl Default for CellWriter {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
