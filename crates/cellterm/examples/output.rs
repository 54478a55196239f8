// SPDX-License-Identifier: MIT
//
// Palette viewer: every color and attribute combination in every output
// mode.
//
// The top tables cross the eight base colors (plus default) with bold and
// underline on the foreground, and bold and reverse on the background.
// Below them come the grayscale ramp, the 216-color cube and the full
// 256-color palette. ESC quits; resizing redraws.
//
// Usage:
//   cargo run -p cellterm --example output

use std::io;

use cellterm::{Attr, Event, Key, KeyInput, OutputMode, Options, Session, Style};

const CHARS: &[u8] = b"nnnnnnnnnbbbbbbbbbuuuuuuuuuBBBBBBBBB";

const ALL_ATTRS: [Attr; 4] = [
    Attr::empty(),
    Attr::BOLD,
    Attr::UNDERLINE,
    Attr::BOLD.union(Attr::UNDERLINE),
];

/// Base color indices, default through white.
const BASE: std::ops::RangeInclusive<u8> = 0..=8;

fn draw_line(session: &mut Session, mut x: u16, y: u16, bg: Style) {
    let mut chars = CHARS.iter().cycle();
    for attrs in ALL_ATTRS {
        for c in BASE {
            let ch = chars.next().map_or(' ', |&b| char::from(b));
            session.change_cell(x, y, ch, Style::new(c, attrs), bg);
            x += 1;
        }
    }
}

fn print_combinations_table(session: &mut Session, x: u16, mut y: u16, attrs: &[Attr]) {
    for &attr in attrs {
        for c in BASE {
            draw_line(session, x, y, Style::new(c, attr));
            y += 1;
        }
    }
}

fn draw_all(session: &mut Session) -> io::Result<()> {
    session.clear()?;

    session.select_output_mode(OutputMode::Normal);
    print_combinations_table(session, 1, 1, &[Attr::empty(), Attr::BOLD]);
    #[allow(clippy::cast_possible_truncation)]
    let right = 2 + CHARS.len() as u16;
    print_combinations_table(session, right, 1, &[Attr::REVERSE]);
    session.present()?;

    session.select_output_mode(OutputMode::Grayscale);
    let mut y = 23;
    for (x, c) in (0..24u16).zip(0u8..) {
        session.change_cell(x, y, '@', Style::indexed(c), Style::DEFAULT);
        session.change_cell(x + 25, y, ' ', Style::DEFAULT, Style::indexed(c));
    }
    session.present()?;

    session.select_output_mode(OutputMode::Cube216);
    y += 1;
    let mut x = 0u16;
    for c in 0..216u8 {
        if x % 24 == 0 {
            x = 0;
            y += 1;
        }
        session.change_cell(x, y, '@', Style::indexed(c), Style::DEFAULT);
        session.change_cell(x + 25, y, ' ', Style::DEFAULT, Style::indexed(c));
        x += 1;
    }
    session.present()?;

    session.select_output_mode(OutputMode::Palette256);
    y += 1;
    x = 0;
    for c in 0..=255u8 {
        if x % 24 == 0 {
            x = 0;
            y += 1;
        }
        let attrs = if y & 1 == 1 { Attr::UNDERLINE } else { Attr::empty() };
        session.change_cell(x, y, '+', Style::new(c, attrs), Style::DEFAULT);
        session.change_cell(x + 25, y, ' ', Style::DEFAULT, Style::indexed(c));
        x += 1;
    }
    session.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(Options::default())?;
    draw_all(&mut session)?;

    loop {
        match session.poll_event() {
            Event::Key(k) if k.input == KeyInput::Key(Key::ESC) => break,
            Event::Resize(_) => draw_all(&mut session)?,
            Event::Error => return Err("terminal read failed".into()),
            _ => {}
        }
    }
    Ok(())
}
