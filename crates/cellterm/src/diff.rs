// SPDX-License-Identifier: MIT
//
// Differential renderer.
//
// Instead of redrawing the whole screen every frame, we compare the back
// buffer (what the caller painted) against the front buffer (what the
// terminal is showing) and emit escapes only for cells that differ.
//
// The pipeline per frame:
//
//   1. The caller paints into the back buffer.
//   2. Renderer::render() walks both grids row-major. Equal cells are
//      skipped; changed cells are copied into the front buffer and handed
//      to the CellWriter, which drops redundant cursor moves and styles.
//   3. Everything lands in one OutputBuffer.
//   4. Renderer::flush_to() issues a single write to the device.
//
// Wide glyphs advance the scan by two columns. One that would hang off the
// right edge is replaced by spaces; one that fits marks the next front
// cell as its shadow so a later write there is seen as a change.

use std::io::{self, Write};

use crate::ansi;
use crate::buffer::CellBuffer;
use crate::caps::{Cap, Capabilities};
use crate::cell::Cell;
use crate::color::{OutputMode, Style};
use crate::output::{CellWriter, OutputBuffer};

// ─── RenderStats ─────────────────────────────────────────────────────────────

/// Statistics from a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Cells that differed from the front buffer and were written.
    pub cells_rendered: usize,
    /// Cells that matched the front buffer and were skipped.
    pub cells_skipped: usize,
    /// Bytes of output generated.
    pub bytes_written: usize,
}

impl RenderStats {
    /// Total cells visited (rendered + skipped).
    #[inline]
    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.cells_rendered + self.cells_skipped
    }
}

// ─── Renderer ────────────────────────────────────────────────────────────────

/// Turns back/front buffer differences into terminal output.
///
/// Owns the staging buffer, the writer state and the output mode, so the
/// last emitted style survives from one frame to the next.
pub struct Renderer {
    output: OutputBuffer,
    writer: CellWriter,
    mode: OutputMode,
}

impl Renderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: OutputBuffer::new(),
            writer: CellWriter::new(),
            mode: OutputMode::Normal,
        }
    }

    #[inline]
    #[must_use]
    pub const fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Switch color encoding. Forces the next style to be re-emitted.
    pub const fn set_mode(&mut self, mode: OutputMode) {
        self.mode = mode;
        self.writer.invalidate_style();
    }

    /// The staging buffer, for writing capability strings between frames.
    #[inline]
    pub const fn output(&mut self) -> &mut OutputBuffer {
        &mut self.output
    }

    /// Bytes staged since the last flush.
    #[inline]
    #[must_use]
    pub fn output_bytes(&self) -> &[u8] {
        self.output.as_bytes()
    }

    /// Stage the terminal's sequence for `cap`.
    pub fn cap(&mut self, caps: &Capabilities, cap: Cap) {
        ansi::cap(&mut self.output, caps, cap).ok();
    }

    /// Emit a cursor position if the cursor is visible.
    pub fn place_cursor(&mut self, cursor: Option<(u16, u16)>) {
        if let Some((x, y)) = cursor {
            ansi::cursor_to(&mut self.output, x, y).ok();
        }
    }

    /// Clear the terminal screen in the clear styles.
    ///
    /// The cursor position is re-sent if visible and forgotten by the
    /// writer, since the clear moved it.
    pub fn clear_screen(
        &mut self,
        caps: &Capabilities,
        fg: Style,
        bg: Style,
        cursor: Option<(u16, u16)>,
    ) {
        self.writer.send_style(&mut self.output, caps, self.mode, fg, bg);
        ansi::cap(&mut self.output, caps, Cap::ClearScreen).ok();
        self.place_cursor(cursor);
        self.writer.invalidate_position();
    }

    /// Diff `back` against `front`, update `front`, and stage the output.
    ///
    /// Both buffers are expected to have the same size; only the area
    /// they share is visited.
    pub fn render(
        &mut self,
        back: &CellBuffer,
        front: &mut CellBuffer,
        caps: &Capabilities,
        cursor: Option<(u16, u16)>,
    ) -> RenderStats {
        let start = self.output.len();
        let mut stats = RenderStats::default();
        self.writer.invalidate_position();

        let width = front.width().min(back.width());
        let height = front.height().min(back.height());

        for y in 0..height {
            let mut x = 0;
            while x < width {
                let Some(&cell) = back.get(x, y) else { break };
                let step: u16 = if cell.width() > 1 { 2 } else { 1 };

                if front.get(x, y) == Some(&cell) {
                    stats.cells_skipped += 1;
                    x = x.saturating_add(step);
                    continue;
                }

                front.set(x, y, cell);
                self.writer.send_style(&mut self.output, caps, self.mode, cell.fg, cell.bg);

                if step > 1 && x >= width - (step - 1) {
                    for col in x..width {
                        self.writer.send_char(&mut self.output, col, y, u32::from(' '));
                    }
                } else {
                    self.writer.send_char(&mut self.output, x, y, cell.ch);
                    for col in x + 1..x + step {
                        front.set(col, y, Cell::shadow(cell.fg, cell.bg));
                    }
                }

                stats.cells_rendered += 1;
                x = x.saturating_add(step);
            }
        }

        self.place_cursor(cursor);
        stats.bytes_written = self.output.len() - start;
        stats
    }

    /// Write staged output to `w` and empty the staging buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        self.output.flush_to(w)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
