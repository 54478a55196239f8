// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Event multiplexer: one wait over terminal input and resize notices.
//
// A wait goes through these steps in order:
//
//   1. Decode from bytes already buffered.
//   2. One bounded read from the device (up to 64 bytes) and decode again.
//   3. Block in poll(2) on the device and the resize channel until one is
//      ready or the timeout runs out. A signal interrupting the poll
//      resumes it with whatever time is left.
//   4. Device ready: read, decode, keep waiting if nothing came of it.
//      Hang-up or error on the device ends the wait with Event::Error.
//   5. Resize ready: drain the channel and report the current size.
//
// # Escape timing
//
// A buffered ESC that begins some known sequence is undecided. With no
// timeout (`poll_event`) the multiplexer gives the rest of the sequence
// `escape_delay` to arrive and then decodes the ESC on its own. With a
// timeout (`peek_event`) the wait simply ends; the prefix is marked expired
// and the next wait resolves it if no new bytes arrived in between.

use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::time::{Duration, Instant};

use crate::caps::KeySeq;
use crate::device::Device;
use crate::input::{Decoder, Event, InputMode};
use crate::resize::ResizeChannel;

/// Largest single read from the device.
pub const READ_CHUNK: usize = 64;

/// How long a lone ESC waits for the rest of a sequence in `poll_event`.
pub const DEFAULT_ESCAPE_DELAY: Duration = Duration::from_millis(25);

// ─── Readiness ──────────────────────────────────────────────────────────────

/// Outcome of one poll over the two descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Readiness {
    device: bool,
    hangup: bool,
    failed: bool,
    resize: bool,
}

/// Poll timeout in milliseconds, rounded up so a wait never ends early.
fn timeout_ms(d: Duration) -> libc::c_int {
    let ms = d.as_millis() + u128::from(d.subsec_nanos() % 1_000_000 != 0);
    libc::c_int::try_from(ms).unwrap_or(libc::c_int::MAX)
}

/// Wait for input on `device` or a notice on `resize`.
///
/// Returns `Ok(None)` when `timeout` elapses first.
fn poll_ready(
    device: RawFd,
    resize: RawFd,
    timeout: Option<Duration>,
) -> io::Result<Option<Readiness>> {
    let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
    loop {
        let mut fds = [
            libc::pollfd { fd: device, events: libc::POLLIN, revents: 0 },
            libc::pollfd { fd: resize, events: libc::POLLIN, revents: 0 },
        ];
        let ms = deadline.map_or(-1, |d| timeout_ms(d.saturating_duration_since(Instant::now())));

        let rc = unsafe { libc::poll(fds.as_mut_ptr(), 2, ms) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if rc == 0 {
            return Ok(None);
        }

        let (dev, rsz) = (fds[0].revents, fds[1].revents);
        return Ok(Some(Readiness {
            device: dev & libc::POLLIN != 0,
            hangup: dev & libc::POLLHUP != 0,
            failed: dev & (libc::POLLERR | libc::POLLNVAL) != 0,
            resize: rsz & libc::POLLIN != 0,
        }));
    }
}

fn read_failed(err: &io::Error) -> Event {
    log::warn!("terminal read failed: {err}");
    Event::Error
}

// ─── Multiplexer ────────────────────────────────────────────────────────────

/// Turns device bytes and resize notices into [`Event`]s.
#[derive(Debug)]
pub struct Multiplexer {
    decoder: Decoder,
    escape_delay: Duration,
    /// A peek timed out with an escape prefix buffered.
    expired: bool,
}

impl Multiplexer {
    #[must_use]
    pub fn new(escape_delay: Duration) -> Self {
        Self {
            decoder: Decoder::new(),
            escape_delay,
            expired: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn escape_delay(&self) -> Duration {
        self.escape_delay
    }

    /// Wait up to `timeout` (forever if `None`) for the next event.
    ///
    /// Returns [`Event::None`] on timeout, [`Event::Error`] when the
    /// device fails, and [`Event::Resize`] with the device's current size
    /// when the resize channel fires.
    pub fn wait<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        resize: &mut ResizeChannel,
        mode: InputMode,
        keys: &[KeySeq],
        timeout: Option<Duration>,
    ) -> Event {
        let force = std::mem::take(&mut self.expired);

        if let Some(event) = self.decoder.decode(mode, keys, false) {
            return event;
        }
        match self.fill(device) {
            Ok(0) if force => {
                if let Some(event) = self.decoder.decode(mode, keys, true) {
                    return event;
                }
            }
            Ok(0) => {}
            Ok(_) => {
                if let Some(event) = self.decoder.decode(mode, keys, false) {
                    return event;
                }
            }
            Err(e) => return read_failed(&e),
        }

        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut escape_deadline = self.escape_deadline(timeout);

        loop {
            let limit = deadline.or(escape_deadline);
            let remaining = limit.map(|l| l.saturating_duration_since(Instant::now()));

            let ready = match poll_ready(device.as_raw_fd(), resize.as_raw_fd(), remaining) {
                Ok(Some(ready)) => ready,
                Ok(None) if escape_deadline.is_some() && deadline.is_none() => {
                    if let Some(event) = self.decoder.decode(mode, keys, true) {
                        return event;
                    }
                    escape_deadline = None;
                    continue;
                }
                Ok(None) => {
                    self.expired = self.decoder.pending_escape();
                    return Event::None;
                }
                Err(e) => {
                    log::warn!("poll on terminal failed: {e}");
                    return Event::Error;
                }
            };

            if ready.failed {
                log::warn!("terminal device reported an error condition");
                return Event::Error;
            }

            if ready.device || ready.hangup {
                match self.fill(device) {
                    Ok(0) if ready.hangup => {
                        log::warn!("terminal device hung up");
                        return Event::Error;
                    }
                    Ok(0) => {}
                    Ok(_) => {
                        if let Some(event) = self.decoder.decode(mode, keys, false) {
                            return event;
                        }
                        escape_deadline = self.escape_deadline(timeout);
                    }
                    Err(e) => return read_failed(&e),
                }
            }

            if ready.resize {
                if let Err(e) = resize.drain() {
                    log::warn!("resize channel read failed: {e}");
                    return Event::Error;
                }
                return match device.window_size() {
                    Ok(size) => Event::Resize(size.clamped()),
                    Err(e) => {
                        log::warn!("window size query failed: {e}");
                        Event::Error
                    }
                };
            }
        }
    }

    /// When the current escape prefix stops waiting, if one is buffered
    /// and the caller waits without a timeout.
    fn escape_deadline(&self, timeout: Option<Duration>) -> Option<Instant> {
        (timeout.is_none() && self.decoder.pending_escape())
            .then(|| Instant::now() + self.escape_delay)
    }

    /// One bounded read into the decoder. Would-block and interrupted
    /// reads count as zero bytes.
    fn fill<D: Device + ?Sized>(&mut self, device: &mut D) -> io::Result<usize> {
        let mut chunk = [0u8; READ_CHUNK];
        match device.read(&mut chunk) {
            Ok(n) => {
                self.decoder.feed(&chunk[..n]);
                Ok(n)
            }
            Err(e)
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) =>
            {
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }
}

impl Default for Multiplexer {
    fn default() -> Self {
        Self::new(DEFAULT_ESCAPE_DELAY)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Size;
    use crate::caps::{self, Capabilities};
    use crate::input::{Key, KeyEvent, Modifiers, MouseButton, MouseEvent};
    use pretty_assertions::assert_eq;
    use std::io::{Read, Write};
    use std::os::unix::net::UnixStream;

    /// One end of a socket pair standing in for a terminal.
    struct FakeTty {
        sock: UnixStream,
        size: Size,
    }

    impl Read for FakeTty {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.sock.read(buf)
        }
    }

    impl Write for FakeTty {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.sock.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl AsRawFd for FakeTty {
        fn as_raw_fd(&self) -> RawFd {
            self.sock.as_raw_fd()
        }
    }

    impl Device for FakeTty {
        fn window_size(&self) -> io::Result<Size> {
            Ok(self.size)
        }
    }

    struct Harness {
        mux: Multiplexer,
        tty: FakeTty,
        peer: UnixStream,
        resize: ResizeChannel,
        caps: Capabilities,
        mode: InputMode,
    }

    impl Harness {
        fn new() -> Self {
            let (sock, peer) = UnixStream::pair().unwrap();
            sock.set_nonblocking(true).unwrap();
            Self {
                mux: Multiplexer::default(),
                tty: FakeTty { sock, size: Size::new(80, 24) },
                peer,
                resize: ResizeChannel::new(false).unwrap(),
                caps: caps::resolve("rxvt-unicode").unwrap(),
                mode: InputMode::ESC,
            }
        }

        fn send(&mut self, bytes: &[u8]) {
            self.peer.write_all(bytes).unwrap();
        }

        fn wait(&mut self, timeout: Option<Duration>) -> Event {
            self.mux
                .wait(&mut self.tty, &mut self.resize, self.mode, self.caps.keys(), timeout)
        }

        fn peek(&mut self, ms: u64) -> Event {
            self.wait(Some(Duration::from_millis(ms)))
        }
    }

    fn key(k: Key) -> Event {
        Event::Key(KeyEvent::key(k))
    }

    fn ch(c: char) -> Event {
        Event::Key(KeyEvent::char(c))
    }

    // ── Timeouts ────────────────────────────────────────────────────────

    #[test]
    fn timeout_with_no_input_is_none() {
        let mut h = Harness::new();
        let start = Instant::now();
        assert_eq!(h.peek(30), Event::None);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn zero_timeout_returns_immediately() {
        let mut h = Harness::new();
        assert_eq!(h.peek(0), Event::None);
    }

    #[test]
    fn timeout_ms_rounds_up() {
        assert_eq!(timeout_ms(Duration::ZERO), 0);
        assert_eq!(timeout_ms(Duration::from_micros(1)), 1);
        assert_eq!(timeout_ms(Duration::from_millis(25)), 25);
        assert_eq!(timeout_ms(Duration::from_secs(u64::MAX)), libc::c_int::MAX);
    }

    // ── Keys ────────────────────────────────────────────────────────────

    #[test]
    fn arrow_sequence_is_one_event() {
        let mut h = Harness::new();
        h.send(b"\x1b[A");
        assert_eq!(h.peek(100), key(Key::ARROW_UP));
        assert_eq!(h.peek(0), Event::None);
    }

    #[test]
    fn control_bytes_are_keys() {
        let mut h = Harness::new();
        h.send(&[0x03, 0x7F]);
        assert_eq!(h.peek(100), key(Key::CTRL_C));
        assert_eq!(h.peek(100), key(Key::BACKSPACE2));
    }

    #[test]
    fn buffered_events_come_one_per_wait() {
        let mut h = Harness::new();
        h.send(b"ab");
        assert_eq!(h.peek(100), ch('a'));
        assert_eq!(h.peek(100), ch('b'));
        assert_eq!(h.peek(0), Event::None);
    }

    #[test]
    fn split_utf8_is_reassembled() {
        let mut h = Harness::new();
        let bytes = "中".as_bytes();
        h.send(&bytes[..2]);
        assert_eq!(h.peek(20), Event::None);
        h.send(&bytes[2..]);
        assert_eq!(h.peek(100), ch('中'));
    }

    #[test]
    fn split_escape_sequence_is_reassembled() {
        let mut h = Harness::new();
        h.send(b"\x1b[");
        assert_eq!(h.peek(5), Event::None);
        h.send(b"B");
        assert_eq!(h.peek(100), key(Key::ARROW_DOWN));
    }

    // ── Escape timing ───────────────────────────────────────────────────

    #[test]
    fn lone_escape_within_peek_is_none() {
        let mut h = Harness::new();
        h.send(b"\x1b");
        assert_eq!(h.peek(10), Event::None);
    }

    #[test]
    fn expired_escape_resolves_on_next_wait() {
        let mut h = Harness::new();
        h.send(b"\x1b");
        assert_eq!(h.peek(10), Event::None);
        assert_eq!(h.peek(10), key(Key::ESC));
    }

    #[test]
    fn poll_resolves_lone_escape_after_delay() {
        let mut h = Harness::new();
        h.send(b"\x1b");
        let start = Instant::now();
        assert_eq!(h.wait(None), key(Key::ESC));
        assert!(start.elapsed() >= h.mux.escape_delay());
    }

    #[test]
    fn alt_mode_escape_prefix() {
        let mut h = Harness::new();
        h.mode = InputMode::ALT;
        h.send(b"\x1bx");
        assert_eq!(h.peek(100), ch('x').with_modifiers(Modifiers::ALT));
    }

    // ── Mouse ───────────────────────────────────────────────────────────

    #[test]
    fn mouse_report_when_enabled() {
        let mut h = Harness::new();
        h.mode = InputMode::ESC.with_mouse(true);
        h.send(b"\x1b[<0;5;3M");
        assert_eq!(
            h.peek(100),
            Event::Mouse(MouseEvent {
                modifiers: Modifiers::empty(),
                button: MouseButton::Left,
                x: 4,
                y: 2,
            })
        );
    }

    // ── Resize ──────────────────────────────────────────────────────────

    #[test]
    fn resize_notice_reports_current_size() {
        let mut h = Harness::new();
        h.tty.size = Size::new(100, 40);
        h.resize.notifier().unwrap().notify().unwrap();
        assert_eq!(h.peek(100), Event::Resize(Size::new(100, 40)));
    }

    #[test]
    fn resize_notices_coalesce() {
        let mut h = Harness::new();
        let n = h.resize.notifier().unwrap();
        n.notify().unwrap();
        n.notify().unwrap();
        n.notify().unwrap();
        assert_eq!(h.peek(100), Event::Resize(Size::new(80, 24)));
        assert_eq!(h.peek(0), Event::None);
    }

    #[test]
    fn resize_during_blocking_wait() {
        let mut h = Harness::new();
        let n = h.resize.notifier().unwrap();
        let t = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            n.notify().unwrap();
        });
        assert_eq!(h.wait(None), Event::Resize(Size::new(80, 24)));
        t.join().unwrap();
    }

    #[test]
    fn input_wins_over_resize() {
        let mut h = Harness::new();
        h.resize.notifier().unwrap().notify().unwrap();
        h.send(b"q");
        assert_eq!(h.peek(100), ch('q'));
        assert_eq!(h.peek(100), Event::Resize(Size::new(80, 24)));
    }

    // ── Failure ─────────────────────────────────────────────────────────

    #[test]
    fn hangup_is_error() {
        let mut h = Harness::new();
        let peer = std::mem::replace(&mut h.peer, UnixStream::pair().unwrap().0);
        drop(peer);
        assert_eq!(h.peek(100), Event::Error);
    }
}
