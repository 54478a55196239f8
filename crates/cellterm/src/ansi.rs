// SPDX-License-Identifier: MIT
//
// Escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit; that's the `CellWriter`'s job. Cursor
// positioning and color parameters are generated here; everything else a
// terminal might spell differently is looked up in its `Capabilities`.
//
// All cursor positions are 0-indexed in our API and converted to 1-indexed
// for the terminal.
//
// All functions return `io::Result` propagated from the underlying writer.
// In practice they never fail when writing to `OutputBuffer` (backed by a Vec).

use std::io::{self, Write};

use crate::caps::{Cap, Capabilities};
use crate::color::{Attr, OutputMode, Style};

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` using CUP.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

// ─── Capabilities ────────────────────────────────────────────────────────────

/// Write the terminal's sequence for `cap`.
#[inline]
pub fn cap(w: &mut impl Write, caps: &Capabilities, cap: Cap) -> io::Result<()> {
    w.write_all(caps.get(cap))
}

// ─── Colors ──────────────────────────────────────────────────────────────────

/// Emit the SGR color parameters for already-resolved palette indices.
///
/// An index of 0 leaves that side at the terminal default; when both are
/// 0 nothing is written. In `Normal` mode the base colors 1..=8 map to
/// SGR 30..=37 / 40..=47.
pub fn colors(w: &mut impl Write, mode: OutputMode, fg: u8, bg: u8) -> io::Result<()> {
    if fg == 0 && bg == 0 {
        return Ok(());
    }

    let (fg_lead, bg_lead) = if mode.is_extended() { ("38;5;", "48;5;") } else { ("3", "4") };
    let shift = |i: u8| if mode.is_extended() { i } else { i - 1 };

    w.write_all(b"\x1b[")?;
    if fg != 0 {
        write!(w, "{fg_lead}{}", shift(fg))?;
        if bg != 0 {
            w.write_all(b";")?;
        }
    }
    if bg != 0 {
        write!(w, "{bg_lead}{}", shift(bg))?;
    }
    w.write_all(b"m")
}

/// Full style change for a `(fg, bg)` pair.
///
/// Resets attributes, re-applies the attribute bits (foreground bold as
/// bold, background bold as blink, foreground underline, reverse from
/// either side), then sets the colors for `mode`.
pub fn style(
    w: &mut impl Write,
    caps: &Capabilities,
    mode: OutputMode,
    fg: Style,
    bg: Style,
) -> io::Result<()> {
    cap(w, caps, Cap::Sgr0)?;
    if fg.has(Attr::BOLD) {
        cap(w, caps, Cap::Bold)?;
    }
    if bg.has(Attr::BOLD) {
        cap(w, caps, Cap::Blink)?;
    }
    if fg.has(Attr::UNDERLINE) {
        cap(w, caps, Cap::Underline)?;
    }
    if fg.has(Attr::REVERSE) || bg.has(Attr::REVERSE) {
        cap(w, caps, Cap::Reverse)?;
    }
    let (f, b) = mode.resolve(fg, bg);
    colors(w, mode, f, b)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Helper: run an encoder and return its output as a string.
    fn emit<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn xterm() -> Capabilities {
        crate::caps::resolve("xterm").unwrap()
    }

    const SGR0: &str = "\x1b(B\x1b[m";

    // ── Cursor ──────────────────────────────────────────────────────────

    #[test]
    fn cursor_to_origin() {
        assert_eq!(emit(|w| cursor_to(w, 0, 0)), "\x1b[1;1H");
    }

    #[test]
    fn cursor_to_position() {
        assert_eq!(emit(|w| cursor_to(w, 10, 20)), "\x1b[21;11H");
    }

    #[test]
    fn cursor_to_max_does_not_overflow() {
        assert_eq!(emit(|w| cursor_to(w, u16::MAX, u16::MAX)), "\x1b[65536;65536H");
    }

    // ── Colors ──────────────────────────────────────────────────────────

    #[test]
    fn normal_both_sides() {
        assert_eq!(emit(|w| colors(w, OutputMode::Normal, 2, 5)), "\x1b[31;44m");
    }

    #[test]
    fn normal_one_side() {
        assert_eq!(emit(|w| colors(w, OutputMode::Normal, 8, 0)), "\x1b[37m");
        assert_eq!(emit(|w| colors(w, OutputMode::Normal, 0, 1)), "\x1b[40m");
    }

    #[test]
    fn both_default_writes_nothing() {
        assert_eq!(emit(|w| colors(w, OutputMode::Normal, 0, 0)), "");
        assert_eq!(emit(|w| colors(w, OutputMode::Palette256, 0, 0)), "");
    }

    #[test]
    fn extended_both_sides() {
        assert_eq!(
            emit(|w| colors(w, OutputMode::Palette256, 196, 17)),
            "\x1b[38;5;196;48;5;17m"
        );
    }

    #[test]
    fn extended_one_side() {
        assert_eq!(emit(|w| colors(w, OutputMode::Grayscale, 0, 232)), "\x1b[48;5;232m");
        assert_eq!(emit(|w| colors(w, OutputMode::Cube216, 16, 0)), "\x1b[38;5;16m");
    }

    // ── Style ───────────────────────────────────────────────────────────

    #[test]
    fn plain_style_is_reset_only() {
        let caps = xterm();
        let s = emit(|w| style(w, &caps, OutputMode::Normal, Style::DEFAULT, Style::DEFAULT));
        assert_eq!(s, SGR0);
    }

    #[test]
    fn style_attribute_order() {
        let caps = xterm();
        let fg = Style::RED.with_attrs(Attr::BOLD | Attr::UNDERLINE);
        let bg = Style::BLUE.with_attrs(Attr::BOLD | Attr::REVERSE);
        let s = emit(|w| style(w, &caps, OutputMode::Normal, fg, bg));
        assert_eq!(s, format!("{SGR0}\x1b[1m\x1b[5m\x1b[4m\x1b[7m\x1b[31;44m"));
    }

    #[test]
    fn background_underline_is_ignored() {
        let caps = xterm();
        let bg = Style::DEFAULT.with_attrs(Attr::UNDERLINE);
        let s = emit(|w| style(w, &caps, OutputMode::Normal, Style::DEFAULT, bg));
        assert_eq!(s, SGR0);
    }

    #[test]
    fn cube216_clamps_in_style() {
        let caps = xterm();
        let s = emit(|w| {
            style(w, &caps, OutputMode::Cube216, Style::indexed(250), Style::indexed(250))
        });
        assert_eq!(s, format!("{SGR0}\x1b[38;5;23;48;5;16m"));
    }

    #[test]
    fn grayscale_offsets_in_style() {
        let caps = xterm();
        let s = emit(|w| {
            style(w, &caps, OutputMode::Grayscale, Style::indexed(23), Style::indexed(0))
        });
        assert_eq!(s, format!("{SGR0}\x1b[38;5;255;48;5;232m"));
    }

    #[test]
    fn palette256_default_side_suppressed() {
        let caps = xterm();
        let s = emit(|w| {
            style(w, &caps, OutputMode::Palette256, Style::indexed(100), Style::DEFAULT)
        });
        assert_eq!(s, format!("{SGR0}\x1b[38;5;100m"));
    }

    #[test]
    fn cap_writes_table_entry() {
        let caps = xterm();
        assert_eq!(emit(|w| cap(w, &caps, Cap::HideCursor)), "\x1b[?25l");
    }
}
