// SPDX-License-Identifier: MIT
//
// Terminal device access: raw mode and window size.
//
// Safety: termios (tcgetattr, tcsetattr) and ioctl (TIOCGWINSZ) have no
// safe std wrappers. Each unsafe block is one libc call on a descriptor
// this module owns.
#![allow(unsafe_code)]
//
// The session talks to the terminal through the `Device` trait so it can be
// driven by a real `/dev/tty` or, in tests, by one end of a socket pair.
// `Tty` saves the original termios when it enters raw mode and puts it back
// when dropped, which makes it the last thing restored at teardown.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::path::Path;

use crate::buffer::Size;

/// Path of the controlling terminal.
pub const DEFAULT_PATH: &str = "/dev/tty";

// ─── Device ─────────────────────────────────────────────────────────────────

/// A byte-oriented terminal device addressable by file descriptor.
pub trait Device: Read + Write + AsRawFd {
    /// Current window size in cells.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be queried.
    fn window_size(&self) -> io::Result<Size>;

    /// Switch the device to raw, non-canonical input.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the mode change.
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Tty ────────────────────────────────────────────────────────────────────

/// A real terminal device.
///
/// Restores the termios saved by [`enter_raw_mode`](Device::enter_raw_mode)
/// when dropped.
pub struct Tty {
    file: File,
    saved: Option<libc::termios>,
}

impl Tty {
    /// Open the controlling terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if `/dev/tty` cannot be opened.
    pub fn open() -> io::Result<Self> {
        Self::open_path(DEFAULT_PATH)
    }

    /// Open a terminal device by path, read-write.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be opened.
    pub fn open_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self::from_file(file))
    }

    /// Wrap an already open descriptor.
    #[must_use]
    pub fn from_fd(fd: OwnedFd) -> Self {
        Self::from_file(File::from(fd))
    }

    const fn from_file(file: File) -> Self {
        Self { file, saved: None }
    }

    /// Whether the descriptor refers to a terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        unsafe { libc::isatty(self.file.as_raw_fd()) != 0 }
    }

    fn restore(&mut self) -> io::Result<()> {
        if let Some(original) = self.saved.take() {
            let fd = self.file.as_raw_fd();
            if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const original) } != 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }
}

/// Apply the raw-mode flag changes to a copy of the current settings.
fn make_raw(mut t: libc::termios) -> libc::termios {
    t.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON);
    t.c_oflag &= !libc::OPOST;
    t.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    t.c_cflag &= !(libc::CSIZE | libc::PARENB);
    t.c_cflag |= libc::CS8;
    // Reads return immediately with whatever is available.
    t.c_cc[libc::VMIN] = 0;
    t.c_cc[libc::VTIME] = 0;
    t
}

impl Device for Tty {
    fn window_size(&self) -> io::Result<Size> {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), libc::TIOCGWINSZ, &raw mut ws) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Size::new(ws.ws_col, ws.ws_row))
    }

    fn enter_raw_mode(&mut self) -> io::Result<()> {
        let fd = self.file.as_raw_fd();
        let mut original: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &raw mut original) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let settings = make_raw(original);
        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const settings) } != 0 {
            return Err(io::Error::last_os_error());
        }
        // Only a successful switch needs undoing.
        if self.saved.is_none() {
            self.saved = Some(original);
        }
        Ok(())
    }
}

impl Read for Tty {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for Tty {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl AsRawFd for Tty {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl Drop for Tty {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            log::warn!("failed to restore terminal settings: {e}");
        }
    }
}

impl std::fmt::Debug for Tty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tty")
            .field("fd", &self.file.as_raw_fd())
            .field("raw", &self.saved.is_some())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
