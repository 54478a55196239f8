// SPDX-License-Identifier: MIT
//
// Mouse paint: pick a shade and a color, then click or drag to paint.
//
// The top row of buttons selects the shade, the bottom row the color; a
// row of carets marks the current choice. The painting lives in its own
// canvas that is blitted into the back buffer every frame, under the
// buttons. ESC quits.
//
// Usage:
//   cargo run -p cellterm --example paint

use cellterm::{
    Cell, Event, InputMode, Key, KeyInput, MouseButton, Options, Session, Size, Style,
};

const RUNES: [char; 5] = [' ', '\u{2591}', '\u{2592}', '\u{2593}', '\u{2588}'];

const COLORS: [Style; 8] = [
    Style::BLACK,
    Style::RED,
    Style::GREEN,
    Style::YELLOW,
    Style::BLUE,
    Style::MAGENTA,
    Style::CYAN,
    Style::WHITE,
];

const BUTTON_WIDTH: u16 = 4;

struct Paint {
    rune: usize,
    color: usize,
    size: Size,
    canvas: Vec<Cell>,
}

impl Paint {
    fn new(size: Size) -> Self {
        Self {
            rune: 0,
            color: 0,
            size,
            canvas: vec![Cell::EMPTY; size.area()],
        }
    }

    fn resize(&mut self, size: Size) {
        *self = Self { rune: self.rune, color: self.color, ..Self::new(size) };
    }

    fn paint_at(&mut self, x: u16, y: u16) {
        if x >= self.size.width || y >= self.size.height {
            return;
        }
        let i = usize::from(y) * usize::from(self.size.width) + usize::from(x);
        self.canvas[i] = Cell::styled(RUNES[self.rune], COLORS[self.color], Style::DEFAULT);
    }

    fn redraw(&mut self, session: &mut Session, mouse: Option<(u16, u16)>) -> std::io::Result<()> {
        session.clear()?;
        if let Some((x, y)) = mouse {
            self.paint_at(x, y);
        }
        session.blit(0, 0, self.size.width, self.size.height, &self.canvas);

        let bottom = session.height().saturating_sub(3);
        draw_buttons(session, &mut self.rune, 0, mouse, RUNES.len(), |i| {
            (RUNES[i], Style::DEFAULT, Style::DEFAULT)
        });
        draw_buttons(session, &mut self.color, bottom, mouse, COLORS.len(), |i| {
            (' ', Style::DEFAULT, COLORS[i])
        });
        session.present()?;
        Ok(())
    }
}

/// Draw a row of `n` 4×2 buttons at row `y`, select the one under a click,
/// and mark the selected one with carets underneath.
fn draw_buttons(
    session: &mut Session,
    current: &mut usize,
    y: u16,
    mouse: Option<(u16, u16)>,
    n: usize,
    look: impl Fn(usize) -> (char, Style, Style),
) {
    let mut x = 0u16;
    for i in 0..n {
        if let Some((mx, my)) = mouse {
            if (x..=x + BUTTON_WIDTH - 1).contains(&mx) && (y..=y + 1).contains(&my) {
                *current = i;
            }
        }
        let (ch, fg, bg) = look(i);
        for dy in 0..2 {
            for dx in 0..BUTTON_WIDTH {
                session.change_cell(x + dx, y + dy, ch, fg, bg);
            }
        }
        x += BUTTON_WIDTH;
    }

    let marker = Style::RED.with_attrs(cellterm::Attr::BOLD);
    #[allow(clippy::cast_possible_truncation)]
    let x = *current as u16 * BUTTON_WIDTH;
    for dx in 0..BUTTON_WIDTH {
        session.change_cell(x + dx, y + 2, '^', marker, Style::DEFAULT);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(Options::default())?;
    session.select_input_mode(InputMode::ESC.with_mouse(true))?;

    let mut paint = Paint::new(session.size());
    paint.redraw(&mut session, None)?;

    loop {
        let mut mouse = None;
        match session.poll_event() {
            Event::Key(k) if k.input == KeyInput::Key(Key::ESC) => return Ok(()),
            Event::Mouse(m) if m.button == MouseButton::Left => mouse = Some((m.x, m.y)),
            Event::Resize(size) => paint.resize(size),
            Event::Error => return Err("terminal read failed".into()),
            _ => {}
        }
        paint.redraw(&mut session, mouse)?;
    }
}
