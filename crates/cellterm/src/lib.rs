// SPDX-License-Identifier: MIT
//
// cellterm: a character terminal as a grid of cells.
//
// The caller paints into a back buffer of cells. `present` diffs it against
// a front buffer holding what the screen shows and writes only what
// changed, with escapes taken from the terminal's capability table. On the
// input side, raw bytes from the terminal are decoded into key, mouse and
// resize events, with SIGWINCH folded into the same wait as device input.
//
// Layers, bottom up:
//
//   utf8, color, cell, buffer     data model
//   caps, ansi, output, diff      rendering
//   input                         decoding
//   device, resize, event_loop    OS plumbing (unix)
//   session                       the façade that owns all of the above

pub mod ansi;
pub mod buffer;
pub mod caps;
pub mod cell;
pub mod color;
pub mod diff;
pub mod error;
pub mod input;
pub mod output;
pub mod utf8;

#[cfg(unix)]
pub mod device;
#[cfg(unix)]
pub mod event_loop;
#[cfg(unix)]
pub mod resize;
#[cfg(unix)]
pub mod session;

pub use buffer::{CellBuffer, Size};
pub use caps::{Cap, Capabilities};
pub use cell::Cell;
pub use color::{Attr, OutputMode, Style};
pub use diff::RenderStats;
pub use error::InitError;
pub use input::{Event, InputMode, Key, KeyEvent, KeyInput, Modifiers, MouseButton, MouseEvent};

#[cfg(unix)]
pub use device::{Device, Tty};
#[cfg(unix)]
pub use resize::ResizeNotifier;
#[cfg(unix)]
pub use session::{Options, Session};
