// SPDX-License-Identifier: MIT
//
// Color indices, text attributes, and the output modes that map them.
//
// One side of a cell (foreground or background) is a 16-bit `Style`:
//
//   ┌────────────────────┬─────────────────────┐
//   │ high byte: Attr    │ low byte: index     │
//   │ bold/underline/rev │ 0 = terminal default│
//   └────────────────────┴─────────────────────┘
//
// Attributes and the color index never share bits, so a style holds
// exactly one color plus any combination of attributes. What the index
// *means* depends on the session's `OutputMode`: in `Normal` it is one of
// the eight base colors (1..=8), in `Palette256` a raw xterm palette
// entry, in `Cube216` an offset into the 6×6×6 cube and in `Grayscale`
// an offset into the 24-step gray ramp.

use std::fmt;

// ─── Attributes ──────────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text attributes carried in the high byte of a [`Style`].
    ///
    /// Foreground and background attributes are independent. On the
    /// foreground side `BOLD` renders as bold; on the background side it
    /// renders as blink. `REVERSE` on either side swaps the colors.
    ///
    /// ```
    /// use cellterm::color::Attr;
    ///
    /// let a = Attr::BOLD | Attr::UNDERLINE;
    /// assert!(a.contains(Attr::BOLD));
    /// assert!(!a.contains(Attr::REVERSE));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        const BOLD      = 1 << 0;
        const UNDERLINE = 1 << 1;
        const REVERSE   = 1 << 2;
    }
}

// ─── Style ───────────────────────────────────────────────────────────────────

/// A color index combined with attribute bits, packed into 16 bits.
///
/// ```
/// use cellterm::color::{Attr, Style};
///
/// let s = Style::RED.with_attrs(Attr::BOLD);
/// assert_eq!(s.index(), 2);
/// assert_eq!(s.attrs(), Attr::BOLD);
/// assert_eq!(s.bits(), 0x0102);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Style(u16);

impl Style {
    /// The terminal's own default color, no attributes.
    pub const DEFAULT: Self = Self(0);
    pub const BLACK: Self = Self(1);
    pub const RED: Self = Self(2);
    pub const GREEN: Self = Self(3);
    pub const YELLOW: Self = Self(4);
    pub const BLUE: Self = Self(5);
    pub const MAGENTA: Self = Self(6);
    pub const CYAN: Self = Self(7);
    pub const WHITE: Self = Self(8);

    /// Build a style from a color index and attributes.
    #[inline]
    #[must_use]
    pub const fn new(index: u8, attrs: Attr) -> Self {
        Self(((attrs.bits() as u16) << 8) | index as u16)
    }

    /// A plain color with no attributes.
    #[inline]
    #[must_use]
    pub const fn indexed(index: u8) -> Self {
        Self(index as u16)
    }

    /// Reinterpret a raw packed value.
    ///
    /// Undefined attribute bits are discarded.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self::new((bits & 0xFF) as u8, Attr::from_bits_truncate((bits >> 8) as u8))
    }

    /// The packed 16-bit value.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// The color index (low byte).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// The attribute bits (high byte).
    #[inline]
    #[must_use]
    pub const fn attrs(self) -> Attr {
        Attr::from_bits_truncate((self.0 >> 8) as u8)
    }

    /// Whether all of `attr` is set.
    #[inline]
    #[must_use]
    pub const fn has(self, attr: Attr) -> bool {
        self.attrs().contains(attr)
    }

    /// Replace the attributes, keeping the color.
    #[inline]
    #[must_use]
    pub const fn with_attrs(self, attrs: Attr) -> Self {
        Self::new(self.index(), attrs)
    }

    /// Replace the color, keeping the attributes.
    #[inline]
    #[must_use]
    pub const fn with_index(self, index: u8) -> Self {
        Self::new(index, self.attrs())
    }
}

impl From<u16> for Style {
    fn from(bits: u16) -> Self {
        Self::from_bits(bits)
    }
}

impl fmt::Debug for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Style({}", self.index())?;
        if !self.attrs().is_empty() {
            write!(f, ", {:?}", self.attrs())?;
        }
        write!(f, ")")
    }
}

// ─── Output Mode ─────────────────────────────────────────────────────────────

/// How a style's color index is turned into an SGR color parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Eight base colors: index 1..=8, `ESC[3Xm` / `ESC[4Xm`.
    #[default]
    Normal,
    /// The full xterm palette: index 0..=255, `ESC[38;5;Nm`.
    Palette256,
    /// The 6×6×6 color cube: index 0..=215, offset to 16..=231.
    Cube216,
    /// The 24-step gray ramp: index 0..=23, offset to 232..=255.
    Grayscale,
}

/// Start of the 216-color cube in the 256-entry palette.
const CUBE_OFFSET: u8 = 0x10;
/// Start of the gray ramp in the 256-entry palette.
const GRAY_OFFSET: u8 = 0xE8;

impl OutputMode {
    /// Map a `(fg, bg)` style pair to the palette indices this mode emits.
    ///
    /// A resulting index of 0 means "terminal default" and suppresses that
    /// half of the color escape. Out-of-range indices clamp to a fixed
    /// fallback: 7/0 in the cube, 23/0 on the gray ramp.
    #[must_use]
    pub const fn resolve(self, fg: Style, bg: Style) -> (u8, u8) {
        match self {
            Self::Normal => (normal_index(fg.index()), normal_index(bg.index())),
            Self::Palette256 => (fg.index(), bg.index()),
            Self::Cube216 => {
                let f = if fg.index() > 215 { 7 } else { fg.index() };
                let b = if bg.index() > 215 { 0 } else { bg.index() };
                (f + CUBE_OFFSET, b + CUBE_OFFSET)
            }
            Self::Grayscale => {
                let f = if fg.index() > 23 { 23 } else { fg.index() };
                let b = if bg.index() > 23 { 0 } else { bg.index() };
                (f + GRAY_OFFSET, b + GRAY_OFFSET)
            }
        }
    }

    /// Whether this mode emits extended (`38;5;N`) color parameters.
    #[inline]
    #[must_use]
    pub const fn is_extended(self) -> bool {
        !matches!(self, Self::Normal)
    }
}

/// Base colors use the low nibble; 9..=15 have no SGR base code and fall
/// back to the terminal default.
const fn normal_index(index: u8) -> u8 {
    let i = index & 0x0F;
    if i > 8 { 0 } else { i }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
