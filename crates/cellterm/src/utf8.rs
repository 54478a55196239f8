// SPDX-License-Identifier: MIT
//
// UTF-8 codec for the terminal's character encoding on the wire.
//
// Pure functions over byte slices. The decoder distinguishes three
// outcomes because terminal input arrives in arbitrary chunks: a complete
// scalar value, a valid-but-truncated prefix that may still grow, and a
// byte that can never start or continue a scalar value.
//
// Only Unicode scalar values are produced or accepted: no surrogates, no
// overlong forms, nothing above U+10FFFF.

/// Longest encoding of a Unicode scalar value.
pub const MAX_LEN: usize = 4;

/// Outcome of decoding one scalar value from the head of a byte slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A complete scalar value and the number of bytes it occupied.
    Char(char, usize),
    /// The bytes are a valid prefix; more input is needed.
    Incomplete,
    /// The head byte cannot begin a valid sequence here. Drop one byte.
    Invalid,
}

/// Expected encoded length from a lead byte, or 0 for bytes that cannot
/// lead a sequence (continuation bytes, 0xC0/0xC1, 0xF5..=0xFF).
#[inline]
#[must_use]
pub const fn char_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Valid range for the second byte given the lead byte.
///
/// The narrowed ranges reject overlong forms (E0, F0), surrogates (ED)
/// and values past U+10FFFF (F4) as early as the second byte, so an
/// invalid sequence is never mistaken for an incomplete one.
const fn second_byte_range(lead: u8) -> (u8, u8) {
    match lead {
        0xE0 => (0xA0, 0xBF),
        0xED => (0x80, 0x9F),
        0xF0 => (0x90, 0xBF),
        0xF4 => (0x80, 0x8F),
        _ => (0x80, 0xBF),
    }
}

/// Decode one scalar value from the head of `bytes`.
///
/// An empty slice is [`Decoded::Incomplete`].
#[must_use]
pub fn decode(bytes: &[u8]) -> Decoded {
    let Some(&lead) = bytes.first() else {
        return Decoded::Incomplete;
    };

    let len = char_len(lead);
    if len == 0 {
        return Decoded::Invalid;
    }
    if len == 1 {
        return Decoded::Char(char::from(lead), 1);
    }

    let available = bytes.len().min(len);
    for (i, &b) in bytes[1..available].iter().enumerate() {
        let (lo, hi) = if i == 0 { second_byte_range(lead) } else { (0x80, 0xBF) };
        if !(lo..=hi).contains(&b) {
            return Decoded::Invalid;
        }
    }
    if bytes.len() < len {
        return Decoded::Incomplete;
    }

    let mut cp = u32::from(lead) & (0x7F >> len);
    for &b in &bytes[1..len] {
        cp = (cp << 6) | u32::from(b & 0x3F);
    }

    char::from_u32(cp).map_or(Decoded::Invalid, |ch| Decoded::Char(ch, len))
}

/// Encode a codepoint into `out`, returning the number of bytes written.
///
/// Codepoints that are not Unicode scalar values are written as `?`.
pub fn encode(cp: u32, out: &mut [u8; MAX_LEN]) -> usize {
    match char::from_u32(cp) {
        Some(ch) => ch.encode_utf8(out).len(),
        None => {
            out[0] = b'?';
            1
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
