// SPDX-License-Identifier: MIT
//
// Terminal capability tables.
//
// Everything terminal-specific that the session emits (alternate screen,
// cursor visibility, attribute reset, keypad and mouse modes) comes from a
// `Capabilities` value, as do the escape sequences the terminal sends for
// function and navigation keys. Colors and cursor positioning are not
// capabilities; they are generated from the output mode.
//
// A table is immutable once built. Building one requires every `Cap` to be
// present; an empty string is a valid value and means "this terminal has
// no such sequence".
//
// Built-in tables cover the common terminal families. Lookup tries the
// exact `$TERM` name first, then a family match on the name.

use std::fmt;

use crate::input::Key;

// ─── Capability Set ─────────────────────────────────────────────────────────

/// A terminal function the session needs an escape string for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cap {
    EnterCa,
    ExitCa,
    ShowCursor,
    HideCursor,
    ClearScreen,
    Sgr0,
    Underline,
    Bold,
    Blink,
    Reverse,
    EnterKeypad,
    ExitKeypad,
    EnterMouse,
    ExitMouse,
}

impl Cap {
    pub const COUNT: usize = 14;

    pub const ALL: [Self; Self::COUNT] = [
        Self::EnterCa,
        Self::ExitCa,
        Self::ShowCursor,
        Self::HideCursor,
        Self::ClearScreen,
        Self::Sgr0,
        Self::Underline,
        Self::Bold,
        Self::Blink,
        Self::Reverse,
        Self::EnterKeypad,
        Self::ExitKeypad,
        Self::EnterMouse,
        Self::ExitMouse,
    ];

    #[inline]
    const fn slot(self) -> usize {
        self as usize
    }
}

/// One key escape sequence and the key it reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySeq {
    pub key: Key,
    pub seq: Vec<u8>,
}

impl KeySeq {
    #[must_use]
    pub fn new(key: Key, seq: impl Into<Vec<u8>>) -> Self {
        Self { key, seq: seq.into() }
    }
}

// ─── Errors ─────────────────────────────────────────────────────────────────

/// A table was built without a value for `Cap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("capability {0:?} is missing")]
pub struct MissingCapability(pub Cap);

/// No built-in table matches the terminal name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported terminal: {0:?}")]
pub struct UnsupportedTerminal(pub String);

// ─── Capabilities ───────────────────────────────────────────────────────────

/// Escape strings for one terminal type.
#[derive(Clone, PartialEq, Eq)]
pub struct Capabilities {
    name: String,
    funcs: [Vec<u8>; Cap::COUNT],
    keys: Vec<KeySeq>,
}

impl Capabilities {
    /// Build a table from explicit entries.
    ///
    /// Later entries for the same `Cap` replace earlier ones. Key sequences
    /// that are empty are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MissingCapability`] for the first `Cap` with no entry.
    pub fn new<F, K>(name: impl Into<String>, funcs: F, keys: K) -> Result<Self, MissingCapability>
    where
        F: IntoIterator<Item = (Cap, Vec<u8>)>,
        K: IntoIterator<Item = KeySeq>,
    {
        let mut slots: [Option<Vec<u8>>; Cap::COUNT] = Default::default();
        for (cap, seq) in funcs {
            slots[cap.slot()] = Some(seq);
        }

        let mut table: [Vec<u8>; Cap::COUNT] = Default::default();
        for cap in Cap::ALL {
            table[cap.slot()] = slots[cap.slot()].take().ok_or(MissingCapability(cap))?;
        }

        Ok(Self {
            name: name.into(),
            funcs: table,
            keys: keys.into_iter().filter(|k| !k.seq.is_empty()).collect(),
        })
    }

    /// The terminal name this table was built for.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The escape string for `cap`. May be empty.
    #[inline]
    #[must_use]
    pub fn get(&self, cap: Cap) -> &[u8] {
        &self.funcs[cap.slot()]
    }

    /// Key escape sequences the terminal sends.
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[KeySeq] {
        &self.keys
    }

    fn from_builtin(name: &str, table: &Builtin) -> Self {
        Self {
            name: name.to_owned(),
            funcs: table.funcs.map(|s| s.as_bytes().to_vec()),
            keys: Key::TABLE_ORDER
                .iter()
                .zip(table.keys)
                .filter(|(_, s)| !s.is_empty())
                .map(|(&key, s)| KeySeq::new(key, s))
                .collect(),
        }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("name", &self.name)
            .field("keys", &self.keys.len())
            .finish_non_exhaustive()
    }
}

// ─── Lookup ─────────────────────────────────────────────────────────────────

/// Resolve the built-in table for a terminal name.
///
/// ```
/// let caps = cellterm::caps::resolve("xterm-256color").unwrap();
/// assert_eq!(caps.name(), "xterm-256color");
/// assert!(cellterm::caps::resolve("vt52").is_err());
/// ```
///
/// # Errors
///
/// Returns [`UnsupportedTerminal`] when neither an exact nor a family
/// match exists.
pub fn resolve(term: &str) -> Result<Capabilities, UnsupportedTerminal> {
    let exact = BUILTINS.iter().find(|(name, _)| *name == term).map(|(_, t)| t);
    let table = exact
        .or_else(|| family(term))
        .ok_or_else(|| UnsupportedTerminal(term.to_owned()))?;
    Ok(Capabilities::from_builtin(term, table))
}

fn family(term: &str) -> Option<&'static Builtin> {
    if term.starts_with("xterm") {
        Some(&XTERM)
    } else if term.contains("rxvt") {
        Some(&RXVT_UNICODE)
    } else if term.starts_with("screen") || term.starts_with("tmux") {
        Some(&SCREEN)
    } else {
        None
    }
}

// ─── Built-in Tables ────────────────────────────────────────────────────────
//
// `funcs` follow `Cap::ALL`; `keys` follow `Key::TABLE_ORDER`
// (F1..F12, Insert, Delete, Home, End, PgUp, PgDn, Up, Down, Left, Right).

struct Builtin {
    funcs: [&'static str; Cap::COUNT],
    keys: [&'static str; 22],
}

const ENTER_MOUSE: &str = "\x1b[?1000h\x1b[?1002h\x1b[?1006h";
const EXIT_MOUSE: &str = "\x1b[?1006l\x1b[?1002l\x1b[?1000l";

static BUILTINS: [(&str, Builtin); 6] = [
    ("xterm", XTERM),
    ("linux", LINUX),
    ("screen", SCREEN),
    ("rxvt-unicode", RXVT_UNICODE),
    ("rxvt-256color", RXVT_256COLOR),
    ("Eterm", ETERM),
];

const RXVT_KEYS: [&str; 22] = [
    "\x1b[11~", "\x1b[12~", "\x1b[13~", "\x1b[14~", "\x1b[15~", "\x1b[17~", "\x1b[18~",
    "\x1b[19~", "\x1b[20~", "\x1b[21~", "\x1b[23~", "\x1b[24~", "\x1b[2~", "\x1b[3~",
    "\x1b[7~", "\x1b[8~", "\x1b[5~", "\x1b[6~", "\x1b[A", "\x1b[B", "\x1b[D", "\x1b[C",
];

const XTERM: Builtin = Builtin {
    funcs: [
        "\x1b[?1049h",
        "\x1b[?1049l",
        "\x1b[?12l\x1b[?25h",
        "\x1b[?25l",
        "\x1b[H\x1b[2J",
        "\x1b(B\x1b[m",
        "\x1b[4m",
        "\x1b[1m",
        "\x1b[5m",
        "\x1b[7m",
        "\x1b[?1h\x1b=",
        "\x1b[?1l\x1b>",
        ENTER_MOUSE,
        EXIT_MOUSE,
    ],
    keys: [
        "\x1bOP", "\x1bOQ", "\x1bOR", "\x1bOS", "\x1b[15~", "\x1b[17~", "\x1b[18~", "\x1b[19~",
        "\x1b[20~", "\x1b[21~", "\x1b[23~", "\x1b[24~", "\x1b[2~", "\x1b[3~", "\x1bOH", "\x1bOF",
        "\x1b[5~", "\x1b[6~", "\x1bOA", "\x1bOB", "\x1bOD", "\x1bOC",
    ],
};

const SCREEN: Builtin = Builtin {
    funcs: [
        "\x1b[?1049h",
        "\x1b[?1049l",
        "\x1b[34h\x1b[?25h",
        "\x1b[?25l",
        "\x1b[H\x1b[J",
        "\x1b[m\x0f",
        "\x1b[4m",
        "\x1b[1m",
        "\x1b[5m",
        "\x1b[7m",
        "\x1b[?1h\x1b=",
        "\x1b[?1l\x1b>",
        ENTER_MOUSE,
        EXIT_MOUSE,
    ],
    keys: [
        "\x1bOP", "\x1bOQ", "\x1bOR", "\x1bOS", "\x1b[15~", "\x1b[17~", "\x1b[18~", "\x1b[19~",
        "\x1b[20~", "\x1b[21~", "\x1b[23~", "\x1b[24~", "\x1b[2~", "\x1b[3~", "\x1b[1~", "\x1b[4~",
        "\x1b[5~", "\x1b[6~", "\x1bOA", "\x1bOB", "\x1bOD", "\x1bOC",
    ],
};

const LINUX: Builtin = Builtin {
    funcs: [
        "",
        "",
        "\x1b[?25h\x1b[?0c",
        "\x1b[?25l\x1b[?1c",
        "\x1b[H\x1b[J",
        "\x1b[0;10m",
        "\x1b[4m",
        "\x1b[1m",
        "\x1b[5m",
        "\x1b[7m",
        "",
        "",
        "",
        "",
    ],
    keys: [
        "\x1b[[A", "\x1b[[B", "\x1b[[C", "\x1b[[D", "\x1b[[E", "\x1b[17~", "\x1b[18~", "\x1b[19~",
        "\x1b[20~", "\x1b[21~", "\x1b[23~", "\x1b[24~", "\x1b[2~", "\x1b[3~", "\x1b[1~", "\x1b[4~",
        "\x1b[5~", "\x1b[6~", "\x1b[A", "\x1b[B", "\x1b[D", "\x1b[C",
    ],
};

const RXVT_UNICODE: Builtin = Builtin {
    funcs: [
        "\x1b[?1049h",
        "\x1b[r\x1b[?1049l",
        "\x1b[?25h",
        "\x1b[?25l",
        "\x1b[H\x1b[2J",
        "\x1b[m\x1b(B",
        "\x1b[4m",
        "\x1b[1m",
        "\x1b[5m",
        "\x1b[7m",
        "\x1b=",
        "\x1b>",
        ENTER_MOUSE,
        EXIT_MOUSE,
    ],
    keys: RXVT_KEYS,
};

const RXVT_256COLOR: Builtin = Builtin {
    funcs: [
        "\x1b7\x1b[?47h",
        "\x1b[2J\x1b[?47l\x1b8",
        "\x1b[?25h",
        "\x1b[?25l",
        "\x1b[H\x1b[2J",
        "\x1b[m\x0f",
        "\x1b[4m",
        "\x1b[1m",
        "\x1b[5m",
        "\x1b[7m",
        "\x1b=",
        "\x1b>",
        ENTER_MOUSE,
        EXIT_MOUSE,
    ],
    keys: RXVT_KEYS,
};

const ETERM: Builtin = Builtin {
    funcs: [
        "\x1b7\x1b[?47h",
        "\x1b[2J\x1b[?47l\x1b8",
        "\x1b[?25h",
        "\x1b[?25l",
        "\x1b[H\x1b[2J",
        "\x1b[m\x0f",
        "\x1b[4m",
        "\x1b[1m",
        "\x1b[5m",
        "\x1b[7m",
        "",
        "",
        ENTER_MOUSE,
        EXIT_MOUSE,
    ],
    keys: RXVT_KEYS,
};

// ─── Tests ──────────────────────────────────────────────────────────────────
