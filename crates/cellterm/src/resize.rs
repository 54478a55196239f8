// SPDX-License-Identifier: MIT
//
// Resize notification channel.
//
// SIGWINCH arrives asynchronously, but the event loop only understands
// descriptor readiness. The bridge is a non-blocking Unix socket pair: the
// signal handler (installed through signal-hook's pipe registration) writes
// one byte into the write end, and the event loop polls the read end.
//
// Several signals between two waits leave several bytes behind; `drain`
// swallows them all, so they collapse into one resize event resolved
// against the size at that moment.

use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;

use signal_hook::SigId;
use signal_hook::consts::SIGWINCH;

// ─── ResizeChannel ──────────────────────────────────────────────────────────

/// Owned read end of the resize notification channel.
///
/// Dropping the channel removes its SIGWINCH registration.
pub struct ResizeChannel {
    reader: UnixStream,
    writer: UnixStream,
    registration: Option<SigId>,
}

impl ResizeChannel {
    /// Create the channel, optionally hooking it up to SIGWINCH.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket pair cannot be created or the signal
    /// handler cannot be registered.
    pub fn new(watch_sigwinch: bool) -> io::Result<Self> {
        let (reader, writer) = UnixStream::pair()?;
        reader.set_nonblocking(true)?;
        writer.set_nonblocking(true)?;

        let registration = if watch_sigwinch {
            Some(signal_hook::low_level::pipe::register(SIGWINCH, writer.try_clone()?)?)
        } else {
            None
        };

        Ok(Self { reader, writer, registration })
    }

    /// A handle that raises a resize notification without a signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the write end cannot be duplicated.
    pub fn notifier(&self) -> io::Result<ResizeNotifier> {
        Ok(ResizeNotifier { writer: self.writer.try_clone()? })
    }

    /// Whether SIGWINCH feeds this channel.
    #[must_use]
    pub const fn watches_sigwinch(&self) -> bool {
        self.registration.is_some()
    }

    /// Consume every pending notification. Returns how many there were.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the channel fails for a reason other
    /// than it being empty.
    pub fn drain(&mut self) -> io::Result<usize> {
        let mut total = 0;
        let mut scratch = [0u8; 32];
        loop {
            match self.reader.read(&mut scratch) {
                Ok(0) => return Ok(total),
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(total),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

impl AsRawFd for ResizeChannel {
    fn as_raw_fd(&self) -> RawFd {
        self.reader.as_raw_fd()
    }
}

impl Drop for ResizeChannel {
    fn drop(&mut self) {
        if let Some(id) = self.registration.take() {
            signal_hook::low_level::unregister(id);
        }
    }
}

impl std::fmt::Debug for ResizeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResizeChannel")
            .field("fd", &self.reader.as_raw_fd())
            .field("sigwinch", &self.registration.is_some())
            .finish()
    }
}

// ─── ResizeNotifier ─────────────────────────────────────────────────────────

/// Raises resize notifications on a [`ResizeChannel`] from any thread.
#[derive(Debug)]
pub struct ResizeNotifier {
    writer: UnixStream,
}

impl ResizeNotifier {
    /// Mark a resize as pending.
    ///
    /// A full channel already holds a pending notification, so that case
    /// succeeds without writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed.
    pub fn notify(&self) -> io::Result<()> {
        match (&self.writer).write(&[1]) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_channel_drains_nothing() {
        let mut ch = ResizeChannel::new(false).unwrap();
        assert_eq!(ch.drain().unwrap(), 0);
        assert!(!ch.watches_sigwinch());
    }

    #[test]
    fn notifications_coalesce_on_drain() {
        let mut ch = ResizeChannel::new(false).unwrap();
        let n = ch.notifier().unwrap();
        n.notify().unwrap();
        n.notify().unwrap();
        n.notify().unwrap();
        assert_eq!(ch.drain().unwrap(), 3);
        assert_eq!(ch.drain().unwrap(), 0);
    }

    #[test]
    fn notifier_works_from_another_thread() {
        let mut ch = ResizeChannel::new(false).unwrap();
        let n = ch.notifier().unwrap();
        std::thread::spawn(move || n.notify().unwrap()).join().unwrap();
        assert_eq!(ch.drain().unwrap(), 1);
    }

    #[test]
    fn sigwinch_lands_in_channel() {
        let mut ch = ResizeChannel::new(true).unwrap();
        assert!(ch.watches_sigwinch());
        signal_hook::low_level::raise(SIGWINCH).unwrap();
        assert!(ch.drain().unwrap() >= 1);
        drop(ch);
    }
}
