// SPDX-License-Identifier: MIT
//
// Terminal input decoder.
//
// Turns the raw byte stream read from the terminal into structured events:
// keys, characters and mouse reports. Handles
//
// - key escape sequences from the terminal's capability table
// - X10 (`ESC [ M b x y`) and SGR (`ESC [ < b ; x ; y M`) mouse reports
// - ESC as a key on its own, or as an Alt prefix in alt input mode
// - ASCII control bytes as key codes
// - UTF-8 multi-byte characters
//
// # Design
//
// `Decoder` keeps a compacting byte buffer because a sequence can span
// several reads. `parse` is a pure function over that buffer which reports
// one of three outcomes: an event plus the bytes it used, "need more
// bytes", or "drop N bytes". The decoder yields at most one event per call.
//
// An ESC that begins some known sequence is ambiguous until either the
// rest of the sequence arrives or the caller decides the wait is over and
// asks for a *forced* decode, which treats the buffered prefix as final.

use bitflags::bitflags;

use crate::buffer::Size;
use crate::caps::KeySeq;
use crate::utf8::{self, Decoded};

const ESC: u8 = 0x1B;
const DEL: u8 = 0x7F;

/// X10 mouse report: `ESC [ M` followed by three raw bytes.
const X10_PREFIX: &[u8] = b"\x1b[M";
const X10_LEN: usize = 6;
/// SGR mouse report: `ESC [ <` then `b;x;y` then `M` or `m`.
const SGR_PREFIX: &[u8] = b"\x1b[<";
/// Longest SGR report we wait for before giving up on it.
const SGR_MAX_LEN: usize = 32;

// ─── Key Codes ──────────────────────────────────────────────────────────────

/// A key code: either an ASCII control code or a navigation/function key.
///
/// Control keys use their byte value (`Key::CTRL_C` is 0x03). Navigation
/// and function keys count down from 0xFFFF so they never collide with
/// a control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(u16);

impl Key {
    pub const F1: Self = Self(0xFFFF);
    pub const F2: Self = Self(0xFFFF - 1);
    pub const F3: Self = Self(0xFFFF - 2);
    pub const F4: Self = Self(0xFFFF - 3);
    pub const F5: Self = Self(0xFFFF - 4);
    pub const F6: Self = Self(0xFFFF - 5);
    pub const F7: Self = Self(0xFFFF - 6);
    pub const F8: Self = Self(0xFFFF - 7);
    pub const F9: Self = Self(0xFFFF - 8);
    pub const F10: Self = Self(0xFFFF - 9);
    pub const F11: Self = Self(0xFFFF - 10);
    pub const F12: Self = Self(0xFFFF - 11);
    pub const INSERT: Self = Self(0xFFFF - 12);
    pub const DELETE: Self = Self(0xFFFF - 13);
    pub const HOME: Self = Self(0xFFFF - 14);
    pub const END: Self = Self(0xFFFF - 15);
    pub const PAGE_UP: Self = Self(0xFFFF - 16);
    pub const PAGE_DOWN: Self = Self(0xFFFF - 17);
    pub const ARROW_UP: Self = Self(0xFFFF - 18);
    pub const ARROW_DOWN: Self = Self(0xFFFF - 19);
    pub const ARROW_LEFT: Self = Self(0xFFFF - 20);
    pub const ARROW_RIGHT: Self = Self(0xFFFF - 21);

    // ── Control codes ───────────────────────────────────────────
    pub const CTRL_TILDE: Self = Self(0x00);
    pub const CTRL_2: Self = Self(0x00);
    pub const CTRL_A: Self = Self(0x01);
    pub const CTRL_B: Self = Self(0x02);
    pub const CTRL_C: Self = Self(0x03);
    pub const CTRL_D: Self = Self(0x04);
    pub const CTRL_E: Self = Self(0x05);
    pub const CTRL_F: Self = Self(0x06);
    pub const CTRL_G: Self = Self(0x07);
    pub const BACKSPACE: Self = Self(0x08);
    pub const CTRL_H: Self = Self(0x08);
    pub const TAB: Self = Self(0x09);
    pub const CTRL_I: Self = Self(0x09);
    pub const CTRL_J: Self = Self(0x0A);
    pub const CTRL_K: Self = Self(0x0B);
    pub const CTRL_L: Self = Self(0x0C);
    pub const ENTER: Self = Self(0x0D);
    pub const CTRL_M: Self = Self(0x0D);
    pub const CTRL_N: Self = Self(0x0E);
    pub const CTRL_O: Self = Self(0x0F);
    pub const CTRL_P: Self = Self(0x10);
    pub const CTRL_Q: Self = Self(0x11);
    pub const CTRL_R: Self = Self(0x12);
    pub const CTRL_S: Self = Self(0x13);
    pub const CTRL_T: Self = Self(0x14);
    pub const CTRL_U: Self = Self(0x15);
    pub const CTRL_V: Self = Self(0x16);
    pub const CTRL_W: Self = Self(0x17);
    pub const CTRL_X: Self = Self(0x18);
    pub const CTRL_Y: Self = Self(0x19);
    pub const CTRL_Z: Self = Self(0x1A);
    pub const ESC: Self = Self(0x1B);
    pub const CTRL_LSQ_BRACKET: Self = Self(0x1B);
    pub const CTRL_3: Self = Self(0x1B);
    pub const CTRL_4: Self = Self(0x1C);
    pub const CTRL_BACKSLASH: Self = Self(0x1C);
    pub const CTRL_5: Self = Self(0x1D);
    pub const CTRL_RSQ_BRACKET: Self = Self(0x1D);
    pub const CTRL_6: Self = Self(0x1E);
    pub const CTRL_7: Self = Self(0x1F);
    pub const CTRL_SLASH: Self = Self(0x1F);
    pub const CTRL_UNDERSCORE: Self = Self(0x1F);
    pub const BACKSPACE2: Self = Self(0x7F);
    pub const CTRL_8: Self = Self(0x7F);

    /// The navigation and function keys, in capability-table order.
    pub const TABLE_ORDER: [Self; 22] = [
        Self::F1,
        Self::F2,
        Self::F3,
        Self::F4,
        Self::F5,
        Self::F6,
        Self::F7,
        Self::F8,
        Self::F9,
        Self::F10,
        Self::F11,
        Self::F12,
        Self::INSERT,
        Self::DELETE,
        Self::HOME,
        Self::END,
        Self::PAGE_UP,
        Self::PAGE_DOWN,
        Self::ARROW_UP,
        Self::ARROW_DOWN,
        Self::ARROW_LEFT,
        Self::ARROW_RIGHT,
    ];

    #[inline]
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        Self(code)
    }

    #[inline]
    #[must_use]
    pub const fn code(self) -> u16 {
        self.0
    }

    /// Whether this is an ASCII control code rather than a named key.
    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        self.0 < 0x20 || self.0 == 0x7F
    }
}

bitflags! {
    /// Modifiers attached to a key or mouse event.
    ///
    /// `ALT` comes from an ESC prefix in alt input mode or from the mouse
    /// report's meta bit. `MOTION` marks mouse movement with a button held.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const ALT    = 0b01;
        const MOTION = 0b10;
    }
}

// ─── Event Types ────────────────────────────────────────────────────────────

/// What a key event carries: a key code or a character, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Key(Key),
    Char(char),
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub modifiers: Modifiers,
    pub input: KeyInput,
}

impl KeyEvent {
    #[must_use]
    pub const fn key(key: Key) -> Self {
        Self { modifiers: Modifiers::empty(), input: KeyInput::Key(key) }
    }

    #[must_use]
    pub const fn char(ch: char) -> Self {
        Self { modifiers: Modifiers::empty(), input: KeyInput::Char(ch) }
    }

    #[must_use]
    pub const fn with_modifiers(self, modifiers: Modifiers) -> Self {
        Self { modifiers, ..self }
    }
}

/// Mouse button (or wheel direction) reported by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Release,
    WheelUp,
    WheelDown,
}

/// A mouse event with zero-based cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub modifiers: Modifiers,
    pub button: MouseButton,
    pub x: u16,
    pub y: u16,
}

/// An event delivered by `poll_event` / `peek_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The wait timed out.
    None,
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// The terminal window changed size.
    Resize(Size),
    /// Reading from the terminal failed.
    Error,
}

impl Event {
    /// Add modifiers to a key or mouse event; other events pass through.
    #[must_use]
    pub fn with_modifiers(self, extra: Modifiers) -> Self {
        match self {
            Self::Key(mut k) => {
                k.modifiers |= extra;
                Self::Key(k)
            }
            Self::Mouse(mut m) => {
                m.modifiers |= extra;
                Self::Mouse(m)
            }
            other => other,
        }
    }
}

// ─── Input Mode ─────────────────────────────────────────────────────────────

/// How ESC is interpreted and whether mouse reports are decoded.
///
/// Exactly one of `esc` and `alt` is in effect; see [`normalized`].
///
/// [`normalized`]: InputMode::normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputMode {
    /// A definitive ESC is reported as [`Key::ESC`].
    pub esc: bool,
    /// A definitive ESC adds [`Modifiers::ALT`] to the next token.
    pub alt: bool,
    /// Decode mouse reports (and enable them on the terminal).
    pub mouse: bool,
}

impl InputMode {
    pub const ESC: Self = Self { esc: true, alt: false, mouse: false };
    pub const ALT: Self = Self { esc: false, alt: true, mouse: false };

    #[must_use]
    pub const fn with_mouse(self, mouse: bool) -> Self {
        Self { mouse, ..self }
    }

    /// Resolve to exactly one ESC interpretation: esc wins when both are
    /// requested and is chosen when neither is.
    #[must_use]
    pub const fn normalized(self) -> Self {
        if self.esc || !self.alt {
            Self { esc: true, alt: false, mouse: self.mouse }
        } else {
            self
        }
    }
}

impl Default for InputMode {
    fn default() -> Self {
        Self::ESC
    }
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Buffered input decoder.
///
/// Feed raw bytes with [`feed`](Decoder::feed), then call
/// [`decode`](Decoder::decode) until it returns `None`.
#[derive(Debug, Default)]
pub struct Decoder {
    buf: Vec<u8>,
}

impl Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(128) }
    }

    /// Append bytes read from the terminal.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Whether any undecoded bytes remain.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Whether the buffer starts with an ESC that is still undecided.
    #[must_use]
    pub fn pending_escape(&self) -> bool {
        self.buf.first() == Some(&ESC)
    }

    /// Decode at most one event from the buffered bytes.
    ///
    /// Returns `None` when the buffer is empty or holds only an incomplete
    /// sequence. With `force`, a buffered escape prefix is treated as final.
    pub fn decode(&mut self, mode: InputMode, keys: &[KeySeq], force: bool) -> Option<Event> {
        while !self.buf.is_empty() {
            match parse(&self.buf, mode, keys, force) {
                Parsed::Event(event, used) => {
                    self.buf.drain(..used);
                    return Some(event);
                }
                Parsed::Incomplete => return None,
                Parsed::Skip(n) => {
                    log::trace!("dropping {n} undecodable input byte(s): {:02x?}", &self.buf[..n]);
                    self.buf.drain(..n);
                }
            }
        }
        None
    }
}

// ─── Stateless Parsing ──────────────────────────────────────────────────────

/// Result of trying to parse one event from the head of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parsed {
    /// An event and the number of bytes it consumed.
    Event(Event, usize),
    /// A valid prefix; more bytes are needed.
    Incomplete,
    /// Undecodable bytes to drop.
    Skip(usize),
}

/// Parse one event from the head of `buf`.
#[must_use]
pub fn parse(buf: &[u8], mode: InputMode, keys: &[KeySeq], force: bool) -> Parsed {
    let Some(&head) = buf.first() else {
        return Parsed::Incomplete;
    };

    if head == ESC {
        return parse_escape(buf, mode, keys, force);
    }
    if head < 0x20 || head == DEL {
        return Parsed::Event(Event::Key(KeyEvent::key(Key(u16::from(head)))), 1);
    }

    match utf8::decode(buf) {
        Decoded::Char(ch, n) => Parsed::Event(Event::Key(KeyEvent::char(ch)), n),
        Decoded::Incomplete => Parsed::Incomplete,
        Decoded::Invalid => Parsed::Skip(1),
    }
}

fn parse_escape(buf: &[u8], mode: InputMode, keys: &[KeySeq], force: bool) -> Parsed {
    let mut maybe_longer = false;

    // ── Mouse reports ────────────────────────────────────────────────
    if mode.mouse {
        match parse_mouse(buf) {
            Mouse::Event(event, n) => return Parsed::Event(event, n),
            Mouse::Incomplete => maybe_longer = true,
            Mouse::NotMouse => {}
        }
    }

    // ── Longest matching key sequence ────────────────────────────────
    let matched = keys
        .iter()
        .filter(|k| buf.starts_with(&k.seq))
        .max_by_key(|k| k.seq.len());
    if let Some(k) = matched {
        return Parsed::Event(Event::Key(KeyEvent::key(k.key)), k.seq.len());
    }

    maybe_longer |= keys
        .iter()
        .any(|k| k.seq.len() > buf.len() && k.seq.starts_with(buf));
    if maybe_longer && !force {
        return Parsed::Incomplete;
    }

    // ── Definitive ESC ───────────────────────────────────────────────
    let esc = Parsed::Event(Event::Key(KeyEvent::key(Key::ESC)), 1);
    if !mode.alt || buf.len() == 1 {
        return esc;
    }
    match parse(&buf[1..], mode, keys, force) {
        Parsed::Event(event, n) => Parsed::Event(event.with_modifiers(Modifiers::ALT), n + 1),
        Parsed::Incomplete if !force => Parsed::Incomplete,
        Parsed::Incomplete | Parsed::Skip(_) => esc,
    }
}

// ── Mouse ───────────────────────────────────────────────────────────────────

enum Mouse {
    Event(Event, usize),
    Incomplete,
    NotMouse,
}

fn parse_mouse(buf: &[u8]) -> Mouse {
    if buf.len() < X10_PREFIX.len() {
        let prefix = X10_PREFIX.starts_with(buf) || SGR_PREFIX.starts_with(buf);
        return if prefix { Mouse::Incomplete } else { Mouse::NotMouse };
    }
    if buf.starts_with(X10_PREFIX) {
        return parse_x10(buf);
    }
    if buf.starts_with(SGR_PREFIX) {
        return parse_sgr(buf);
    }
    Mouse::NotMouse
}

/// `ESC [ M b x y`, each of b/x/y offset by 32; coordinates one-based.
fn parse_x10(buf: &[u8]) -> Mouse {
    if buf.len() < X10_LEN {
        return Mouse::Incomplete;
    }
    let b = u16::from(buf[3].wrapping_sub(32));
    let x = u16::from(buf[4].saturating_sub(33));
    let y = u16::from(buf[5].saturating_sub(33));
    Mouse::Event(mouse_event(b, x, y, false), X10_LEN)
}

/// `ESC [ < b ; x ; y M` (press/motion) or `... m` (release).
fn parse_sgr(buf: &[u8]) -> Mouse {
    let body = &buf[SGR_PREFIX.len()..];
    let Some(end) = body.iter().position(|&c| c == b'M' || c == b'm') else {
        let plausible = body.iter().all(|&c| c.is_ascii_digit() || c == b';');
        return if plausible && buf.len() < SGR_MAX_LEN {
            Mouse::Incomplete
        } else {
            Mouse::NotMouse
        };
    };

    let mut fields = body[..end].split(|&c| c == b';').map(parse_u16);
    let (Some(Some(b)), Some(Some(x)), Some(Some(y)), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Mouse::NotMouse;
    };

    let release = body[end] == b'm';
    let event = mouse_event(b, x.saturating_sub(1), y.saturating_sub(1), release);
    Mouse::Event(event, SGR_PREFIX.len() + end + 1)
}

fn mouse_event(b: u16, x: u16, y: u16, release: bool) -> Event {
    let wheel = b & 64 != 0;
    let button = match (release, b & 3, wheel) {
        (true, _, false) | (false, 3, false) => MouseButton::Release,
        (_, 0, false) => MouseButton::Left,
        (_, 1, false) => MouseButton::Middle,
        (_, 0, true) => MouseButton::WheelUp,
        (_, 1, true) => MouseButton::WheelDown,
        (_, _, false) => MouseButton::Right,
        (_, _, true) => MouseButton::Release,
    };

    let mut modifiers = Modifiers::empty();
    if b & 8 != 0 {
        modifiers |= Modifiers::ALT;
    }
    if b & 32 != 0 {
        modifiers |= Modifiers::MOTION;
    }

    Event::Mouse(MouseEvent { modifiers, button, x, y })
}

/// Parse a non-empty run of ASCII digits, saturating at `u16::MAX`.
fn parse_u16(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(digits.iter().fold(0u16, |acc, &d| {
        acc.saturating_mul(10).saturating_add(u16::from(d - b'0'))
    }))
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::Capabilities;
    use pretty_assertions::assert_eq;

    fn xterm() -> Capabilities {
        crate::caps::resolve("xterm").unwrap()
    }

    fn decode_all(bytes: &[u8], mode: InputMode) -> Vec<Event> {
        let caps = xterm();
        let mut d = Decoder::new();
        d.feed(bytes);
        std::iter::from_fn(|| d.decode(mode, caps.keys(), false)).collect()
    }

    fn decode_one(bytes: &[u8]) -> Event {
        let events = decode_all(bytes, InputMode::ESC);
        assert_eq!(events.len(), 1, "expected one event from {bytes:02x?}, got {events:?}");
        events[0]
    }

    fn key(k: Key) -> Event {
        Event::Key(KeyEvent::key(k))
    }

    fn ch(c: char) -> Event {
        Event::Key(KeyEvent::char(c))
    }

    fn mouse(button: MouseButton, x: u16, y: u16, modifiers: Modifiers) -> Event {
        Event::Mouse(MouseEvent { modifiers, button, x, y })
    }

    // ── Key codes ───────────────────────────────────────────────────────

    #[test]
    fn key_code_values() {
        assert_eq!(Key::F1.code(), 0xFFFF);
        assert_eq!(Key::ARROW_RIGHT.code(), 0xFFFF - 21);
        assert_eq!(Key::CTRL_H, Key::BACKSPACE);
        assert_eq!(Key::ENTER.code(), 0x0D);
        assert!(Key::CTRL_C.is_control());
        assert!(Key::BACKSPACE2.is_control());
        assert!(!Key::F5.is_control());
    }

    #[test]
    fn table_order_counts_down() {
        for (i, k) in Key::TABLE_ORDER.iter().enumerate() {
            assert_eq!(usize::from(0xFFFF - k.code()), i);
        }
    }

    // ── Input mode ──────────────────────────────────────────────────────

    #[test]
    fn mode_normalization() {
        let both = InputMode { esc: true, alt: true, mouse: true };
        assert_eq!(both.normalized(), InputMode::ESC.with_mouse(true));
        let neither = InputMode { esc: false, alt: false, mouse: false };
        assert_eq!(neither.normalized(), InputMode::ESC);
        assert_eq!(InputMode::ALT.normalized(), InputMode::ALT);
        assert_eq!(InputMode::default(), InputMode::ESC);
    }

    // ── Characters ──────────────────────────────────────────────────────

    #[test]
    fn ascii_chars() {
        assert_eq!(decode_all(b"ab", InputMode::ESC), vec![ch('a'), ch('b')]);
    }

    #[test]
    fn space_is_a_char() {
        assert_eq!(decode_one(b" "), ch(' '));
    }

    #[test]
    fn multibyte_char() {
        assert_eq!(decode_one("é".as_bytes()), ch('é'));
        assert_eq!(decode_one("🔥".as_bytes()), ch('🔥'));
    }

    #[test]
    fn utf8_split_across_feeds() {
        let caps = xterm();
        let bytes = "中".as_bytes();
        let mut d = Decoder::new();
        d.feed(&bytes[..1]);
        assert_eq!(d.decode(InputMode::ESC, caps.keys(), false), None);
        d.feed(&bytes[1..2]);
        assert_eq!(d.decode(InputMode::ESC, caps.keys(), false), None);
        d.feed(&bytes[2..]);
        assert_eq!(d.decode(InputMode::ESC, caps.keys(), false), Some(ch('中')));
        assert!(!d.has_pending());
    }

    #[test]
    fn invalid_bytes_are_dropped_one_at_a_time() {
        assert_eq!(decode_all(&[0xFF, b'a', 0x80, b'b'], InputMode::ESC), vec![ch('a'), ch('b')]);
    }

    // ── Control keys ────────────────────────────────────────────────────

    #[test]
    fn ctrl_c() {
        assert_eq!(decode_one(&[0x03]), key(Key::CTRL_C));
    }

    #[test]
    fn del_is_backspace2() {
        assert_eq!(decode_one(&[0x7F]), key(Key::BACKSPACE2));
    }

    #[test]
    fn enter_and_tab() {
        assert_eq!(decode_one(b"\r"), key(Key::ENTER));
        assert_eq!(decode_one(b"\t"), key(Key::TAB));
        assert_eq!(decode_one(&[0x00]), key(Key::CTRL_TILDE));
    }

    // ── Key sequences ───────────────────────────────────────────────────

    #[test]
    fn arrow_up_csi() {
        // rxvt reports arrows in CSI form.
        let caps = crate::caps::resolve("rxvt-unicode").unwrap();
        let mut d = Decoder::new();
        d.feed(b"\x1b[A");
        assert_eq!(d.decode(InputMode::ESC, caps.keys(), false), Some(key(Key::ARROW_UP)));
    }

    #[test]
    fn xterm_sequences() {
        assert_eq!(decode_one(b"\x1bOA"), key(Key::ARROW_UP));
        assert_eq!(decode_one(b"\x1bOP"), key(Key::F1));
        assert_eq!(decode_one(b"\x1b[24~"), key(Key::F12));
        assert_eq!(decode_one(b"\x1b[3~"), key(Key::DELETE));
        assert_eq!(decode_one(b"\x1bOH"), key(Key::HOME));
    }

    #[test]
    fn sequence_followed_by_text() {
        assert_eq!(
            decode_all(b"\x1b[5~x", InputMode::ESC),
            vec![key(Key::PAGE_UP), ch('x')]
        );
    }

    #[test]
    fn longest_match_wins() {
        let keys = [
            KeySeq::new(Key::F1, b"\x1b[1".to_vec()),
            KeySeq::new(Key::F2, b"\x1b[15~".to_vec()),
        ];
        assert_eq!(
            parse(b"\x1b[15~", InputMode::ESC, &keys, false),
            Parsed::Event(key(Key::F2), 5)
        );
    }

    #[test]
    fn split_sequence_waits() {
        let caps = xterm();
        let mut d = Decoder::new();
        d.feed(b"\x1b[2");
        assert_eq!(d.decode(InputMode::ESC, caps.keys(), false), None);
        assert!(d.pending_escape());
        d.feed(b"1~");
        assert_eq!(d.decode(InputMode::ESC, caps.keys(), false), Some(key(Key::F10)));
    }

    // ── Lone ESC ────────────────────────────────────────────────────────

    #[test]
    fn lone_esc_is_incomplete_until_forced() {
        let caps = xterm();
        let mut d = Decoder::new();
        d.feed(&[ESC]);
        assert_eq!(d.decode(InputMode::ESC, caps.keys(), false), None);
        assert_eq!(d.decode(InputMode::ESC, caps.keys(), true), Some(key(Key::ESC)));
        assert!(!d.has_pending());
    }

    #[test]
    fn esc_before_unrelated_byte_is_definitive() {
        assert_eq!(decode_all(b"\x1bz", InputMode::ESC), vec![key(Key::ESC), ch('z')]);
    }

    #[test]
    fn forced_prefix_yields_esc_then_rest() {
        let caps = xterm();
        let mut d = Decoder::new();
        d.feed(b"\x1b[");
        assert_eq!(d.decode(InputMode::ESC, caps.keys(), true), Some(key(Key::ESC)));
        assert_eq!(d.decode(InputMode::ESC, caps.keys(), true), Some(ch('[')));
    }

    // ── Alt mode ────────────────────────────────────────────────────────

    #[test]
    fn alt_prefix_modifies_char() {
        let events = decode_all(b"\x1bz", InputMode::ALT);
        assert_eq!(
            events,
            vec![Event::Key(KeyEvent::char('z').with_modifiers(Modifiers::ALT))]
        );
    }

    #[test]
    fn alt_prefix_modifies_sequence() {
        let events = decode_all(b"\x1b\x1bOB", InputMode::ALT);
        assert_eq!(
            events,
            vec![Event::Key(KeyEvent::key(Key::ARROW_DOWN).with_modifiers(Modifiers::ALT))]
        );
    }

    #[test]
    fn lone_esc_in_alt_mode_is_esc_key() {
        let caps = xterm();
        let mut d = Decoder::new();
        d.feed(&[ESC]);
        assert_eq!(d.decode(InputMode::ALT, caps.keys(), false), None);
        assert_eq!(d.decode(InputMode::ALT, caps.keys(), true), Some(key(Key::ESC)));
    }

    // ── Mouse ───────────────────────────────────────────────────────────

    fn mouse_mode() -> InputMode {
        InputMode::ESC.with_mouse(true)
    }

    #[test]
    fn x10_left_press() {
        let events = decode_all(&[ESC, b'[', b'M', 32, 33 + 4, 33 + 2], mouse_mode());
        assert_eq!(events, vec![mouse(MouseButton::Left, 4, 2, Modifiers::empty())]);
    }

    #[test]
    fn x10_release_and_wheel() {
        let events = decode_all(
            &[ESC, b'[', b'M', 32 + 3, 33, 33, ESC, b'[', b'M', 32 + 65, 40, 41],
            mouse_mode(),
        );
        assert_eq!(
            events,
            vec![
                mouse(MouseButton::Release, 0, 0, Modifiers::empty()),
                mouse(MouseButton::WheelDown, 7, 8, Modifiers::empty()),
            ]
        );
    }

    #[test]
    fn x10_modifier_bits() {
        let events = decode_all(&[ESC, b'[', b'M', 32 + 2 + 8 + 32, 33, 33], mouse_mode());
        assert_eq!(
            events,
            vec![mouse(MouseButton::Right, 0, 0, Modifiers::ALT | Modifiers::MOTION)]
        );
    }

    #[test]
    fn x10_waits_for_all_bytes() {
        let caps = xterm();
        let mut d = Decoder::new();
        d.feed(&[ESC, b'[', b'M', 32]);
        assert_eq!(d.decode(mouse_mode(), caps.keys(), false), None);
        d.feed(&[40, 50]);
        assert_eq!(
            d.decode(mouse_mode(), caps.keys(), false),
            Some(mouse(MouseButton::Left, 7, 17, Modifiers::empty()))
        );
    }

    #[test]
    fn sgr_press_and_release() {
        let events = decode_all(b"\x1b[<0;10;5M\x1b[<0;10;5m", mouse_mode());
        assert_eq!(
            events,
            vec![
                mouse(MouseButton::Left, 9, 4, Modifiers::empty()),
                mouse(MouseButton::Release, 9, 4, Modifiers::empty()),
            ]
        );
    }

    #[test]
    fn sgr_wheel_and_drag() {
        let events = decode_all(b"\x1b[<64;1;1M\x1b[<32;3;4M", mouse_mode());
        assert_eq!(
            events,
            vec![
                mouse(MouseButton::WheelUp, 0, 0, Modifiers::empty()),
                mouse(MouseButton::Left, 2, 3, Modifiers::MOTION),
            ]
        );
    }

    #[test]
    fn sgr_shift_and_ctrl_bits_are_dropped() {
        let events = decode_all(b"\x1b[<20;2;2M", mouse_mode());
        assert_eq!(events, vec![mouse(MouseButton::Left, 1, 1, Modifiers::empty())]);
    }

    #[test]
    fn sgr_large_coordinates() {
        let events = decode_all(b"\x1b[<1;300;200M", mouse_mode());
        assert_eq!(events, vec![mouse(MouseButton::Middle, 299, 199, Modifiers::empty())]);
    }

    #[test]
    fn sgr_split_waits() {
        let caps = xterm();
        let mut d = Decoder::new();
        d.feed(b"\x1b[<0;1");
        assert_eq!(d.decode(mouse_mode(), caps.keys(), false), None);
        d.feed(b"2;3M");
        assert_eq!(
            d.decode(mouse_mode(), caps.keys(), false),
            Some(mouse(MouseButton::Left, 11, 2, Modifiers::empty()))
        );
    }

    #[test]
    fn mouse_reports_ignored_when_disabled() {
        let events = decode_all(b"\x1b[<0;1;1M", InputMode::ESC);
        assert_eq!(events[0], key(Key::ESC));
        assert!(events.iter().all(|e| !matches!(e, Event::Mouse(_))));
    }

    #[test]
    fn keys_still_decode_with_mouse_enabled() {
        assert_eq!(decode_all(b"\x1bOA", mouse_mode()), vec![key(Key::ARROW_UP)]);
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    #[test]
    fn parse_u16_saturates() {
        assert_eq!(parse_u16(b"65535"), Some(65535));
        assert_eq!(parse_u16(b"99999"), Some(u16::MAX));
        assert_eq!(parse_u16(b""), None);
        assert_eq!(parse_u16(b"1a"), None);
    }

    #[test]
    fn event_with_modifiers_passes_others_through() {
        assert_eq!(Event::None.with_modifiers(Modifiers::ALT), Event::None);
        assert_eq!(
            ch('x').with_modifiers(Modifiers::ALT | Modifiers::MOTION),
            Event::Key(KeyEvent::char('x').with_modifiers(Modifiers::ALT | Modifiers::MOTION))
        );
    }
}
