// SPDX-License-Identifier: MIT
//
// CellBuffer: the 2D cell grid.
//
// A session owns two of these. The back buffer is the canvas the caller
// paints into; the front buffer is a snapshot of what was last sent to the
// terminal. `present` diffs one against the other.
//
// Design:
//
//   - Flat `Vec<Cell>` with row-major indexing: `index = y * width + x`.
//     Rows are contiguous, so the renderer's left-to-right scan is linear
//     and callers can address the grid directly through `cells_mut`.
//
//   - The grid is never empty. Requested sizes are clamped to at least 1×1
//     so indexing arithmetic never has to special-case zero.
//
//   - Resizing keeps the top-left rectangle common to the old and new
//     sizes and fills everything newly exposed with the caller's blank cell.

use crate::cell::Cell;

// ─── Size ────────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    /// Number of columns.
    pub width: u16,
    /// Number of rows.
    pub height: u16,
}

impl Size {
    #[inline]
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// The same size with both dimensions raised to at least 1.
    #[inline]
    #[must_use]
    pub const fn clamped(self) -> Self {
        Self {
            width: if self.width == 0 { 1 } else { self.width },
            height: if self.height == 0 { 1 } else { self.height },
        }
    }

    /// Total number of cells (`width × height`).
    #[inline]
    #[must_use]
    pub const fn area(self) -> usize {
        self.width as usize * self.height as usize
    }
}

// ─── CellBuffer ──────────────────────────────────────────────────────────────

/// A row-major grid of cells.
///
/// ```
/// use cellterm::buffer::{CellBuffer, Size};
/// use cellterm::Cell;
///
/// let mut buf = CellBuffer::new(Size::new(80, 24), Cell::EMPTY);
/// buf.set(5, 3, Cell::new('X'));
/// assert_eq!(buf.get(5, 3).and_then(|c| c.character()), Some('X'));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CellBuffer {
    size: Size,
    cells: Vec<Cell>,
}

impl CellBuffer {
    /// A grid filled with `blank`. Zero dimensions are clamped to 1.
    #[must_use]
    pub fn new(size: Size, blank: Cell) -> Self {
        let size = size.clamped();
        Self {
            size,
            cells: vec![blank; size.area()],
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.size.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.size.height
    }

    /// Whether `(x, y)` is inside the grid.
    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.size.width && y < self.size.height
    }

    #[inline]
    const fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.size.width as usize + x as usize
    }

    /// The cell at `(x, y)`, or `None` when out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// Mutable access to the cell at `(x, y)`.
    #[inline]
    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// All cells, row-major.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// All cells, row-major, for direct painting.
    #[inline]
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// One row as a slice.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y < self.size.height {
            let start = self.index(0, y);
            Some(&self.cells[start..start + usize::from(self.size.width)])
        } else {
            None
        }
    }

    // ─── Writes ──────────────────────────────────────────────────────────

    /// Write one cell. Out-of-bounds writes are ignored.
    ///
    /// Returns `true` if the position was in bounds.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        let Some(slot) = self.get_mut(x, y) else {
            return false;
        };
        *slot = cell;
        true
    }

    /// Reset every cell to `blank`.
    pub fn fill(&mut self, blank: Cell) {
        self.cells.fill(blank);
    }

    /// Copy a `w × h` row-major block of `src` to `(x, y)`.
    ///
    /// The origin may be negative; whatever falls outside the grid is
    /// clipped. Rows that `src` is too short to supply are skipped.
    pub fn blit(&mut self, x: i32, y: i32, w: u16, h: u16, src: &[Cell]) {
        let (bw, bh) = (i32::from(self.size.width), i32::from(self.size.height));
        let (w, h) = (i32::from(w), i32::from(h));
        if x.saturating_add(w) < 0 || x >= bw || y.saturating_add(h) < 0 || y >= bh {
            return;
        }

        let (xo, yo) = ((-x).max(0), (-y).max(0));
        let (x, y) = (x.max(0), y.max(0));
        let ww = (w - xo).min(bw - x);
        let hh = (h - yo).min(bh - y);
        if ww <= 0 || hh <= 0 {
            return;
        }

        // All values below are non-negative and bounded by u16 ranges.
        let to_usize = |v: i32| usize::try_from(v).unwrap_or(0);
        let (w, ww, xo, yo) = (to_usize(w), to_usize(ww), to_usize(xo), to_usize(yo));
        let width = usize::from(self.size.width);
        let mut dst = to_usize(y) * width + to_usize(x);

        for row in 0..to_usize(hh) {
            let start = (yo + row) * w + xo;
            let Some(line) = src.get(start..start + ww) else {
                break;
            };
            self.cells[dst..dst + ww].copy_from_slice(line);
            dst += width;
        }
    }

    // ─── Resize ──────────────────────────────────────────────────────────

    /// Change dimensions, keeping the overlapping top-left rectangle.
    ///
    /// Newly exposed cells are set to `blank`. A no-op when the size is
    /// unchanged.
    pub fn resize(&mut self, size: Size, blank: Cell) {
        let size = size.clamped();
        if size == self.size {
            return;
        }

        let mut cells = vec![blank; size.area()];
        let keep_w = usize::from(size.width.min(self.size.width));
        let keep_h = usize::from(size.height.min(self.size.height));
        let (old_w, new_w) = (usize::from(self.size.width), usize::from(size.width));

        for row in 0..keep_h {
            let src = row * old_w;
            let dst = row * new_w;
            cells[dst..dst + keep_w].copy_from_slice(&self.cells[src..src + keep_w]);
        }

        self.size = size;
        self.cells = cells;
    }
}

impl std::fmt::Debug for CellBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CellBuffer({}×{})", self.size.width, self.size.height)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
