// SPDX-License-Identifier: MIT
//
// Cell: one character position on screen.
//
// A cell is a codepoint plus a foreground and a background `Style`. The
// whole rendering pipeline produces, diffs, and outputs grids of these.
//
// Size: 8 bytes per cell, `Copy`. Equality is plain field equality, which
// is exactly the comparison the diff renderer performs between the back
// and front grids.
//
// Wide characters (CJK, most emoji) occupy two columns. The first cell
// holds the codepoint. When the renderer draws a wide glyph it marks the
// following front cell as a shadow (`ch = 0`) carrying the glyph's colors,
// so a later write into that column is seen as a change.

use unicode_width::UnicodeWidthChar;

use crate::color::{Attr, Style};

/// Shadow marker for the second column of a wide glyph.
const SHADOW: u32 = 0;

/// Default character for empty cells.
const SPACE: u32 = b' ' as u32;

// ─── Cell ────────────────────────────────────────────────────────────────────

/// A single terminal cell.
///
/// `ch` is a raw codepoint rather than a `char` so that callers writing
/// straight into [`cell_buffer`](crate::Session::cell_buffer) may store any
/// value; codepoints that are not Unicode scalar values render as `?`.
///
/// ```
/// use cellterm::{Cell, Style};
///
/// let c = Cell::styled('x', Style::RED, Style::DEFAULT);
/// assert_eq!(c.character(), Some('x'));
/// assert_eq!(c.width(), 1);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Unicode codepoint to display. `0` is drawn as a space.
    pub ch: u32,
    /// Foreground color and attributes.
    pub fg: Style,
    /// Background color and attributes.
    pub bg: Style,
}

impl Cell {
    /// A space in the terminal's default colors.
    pub const EMPTY: Self = Self {
        ch: SPACE,
        fg: Style::DEFAULT,
        bg: Style::DEFAULT,
    };

    /// A character in the default colors.
    #[inline]
    #[must_use]
    pub const fn new(ch: char) -> Self {
        Self::styled(ch, Style::DEFAULT, Style::DEFAULT)
    }

    /// A character with explicit styles.
    #[inline]
    #[must_use]
    pub const fn styled(ch: char, fg: Style, bg: Style) -> Self {
        Self { ch: ch as u32, fg, bg }
    }

    /// A cell from a raw codepoint.
    #[inline]
    #[must_use]
    pub const fn raw(ch: u32, fg: Style, bg: Style) -> Self {
        Self { ch, fg, bg }
    }

    /// A blank cell in the given styles; what `clear` fills the grid with.
    #[inline]
    #[must_use]
    pub const fn blank(fg: Style, bg: Style) -> Self {
        Self { ch: SPACE, fg, bg }
    }

    /// The shadow placed after a wide glyph, carrying its colors.
    #[inline]
    #[must_use]
    pub const fn shadow(fg: Style, bg: Style) -> Self {
        Self { ch: SHADOW, fg, bg }
    }

    // ─── Queries ──────────────────────────────────────────────────────────

    /// Whether this is the shadow column of a wide glyph.
    #[inline]
    #[must_use]
    pub const fn is_shadow(self) -> bool {
        self.ch == SHADOW
    }

    /// The codepoint as a `char`, if it is a Unicode scalar value.
    #[inline]
    #[must_use]
    pub const fn character(self) -> Option<char> {
        char::from_u32(self.ch)
    }

    /// Display width in columns: 2 for wide glyphs, otherwise 1.
    ///
    /// Zero-width and control codepoints still advance one column so the
    /// renderer always makes progress.
    #[must_use]
    pub fn width(self) -> usize {
        self.character()
            .and_then(UnicodeWidthChar::width)
            .map_or(1, |w| w.max(1))
    }

    /// Whether the foreground or background carries `attr`.
    #[inline]
    #[must_use]
    pub const fn has_attr(self, attr: Attr) -> bool {
        self.fg.has(attr) || self.bg.has(attr)
    }

    // ─── Builders ─────────────────────────────────────────────────────────

    /// Replace the foreground style.
    #[inline]
    #[must_use]
    pub const fn with_fg(self, fg: Style) -> Self {
        Self { fg, ..self }
    }

    /// Replace the background style.
    #[inline]
    #[must_use]
    pub const fn with_bg(self, bg: Style) -> Self {
        Self { bg, ..self }
    }
}

impl Default for Cell {
    #[inline]
    fn default() -> Self {
        Self::EMPTY
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_shadow() {
            write!(f, "Cell(shadow")?;
        } else {
            let ch = self.character().unwrap_or('?');
            write!(f, "Cell({ch:?}")?;
        }
        if self.fg != Style::DEFAULT {
            write!(f, ", fg={:?}", self.fg)?;
        }
        if self.bg != Style::DEFAULT {
            write!(f, ", bg={:?}", self.bg)?;
        }
        write!(f, ")")
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
