//! Serial link to the IR receiver.
//!
//! # Wire format (for beginners)
//!
//! The receiver writes one ASCII line per accepted button press, e.g.
//! `0x08\n`.  The host may write single command bytes back (`S` for status,
//! `R` for reset) and the receiver answers with `OK:`, `STATUS:` or `RST`
//! lines on the same channel.  Anything else on the wire is noise and is
//! skipped.
//!
//! [`SerialLink`] is generic over any `Read + Write` so the tests drive it
//! from in-memory buffers; [`SerialLink::open`] builds one over a real port
//! with the `serialport` crate.
//!
//! # Timeouts
//!
//! Reads block for at most the port's read timeout.  A timeout is reported
//! as `Ok(None)`, never as an error, so the dispatch loop can check its stop
//! signal and emit idle releases between codes.

use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use irkey_core::protocol::parse_line;
use irkey_core::{NormalizedCode, ReceiverCommand, ReceiverLine};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::application::dispatch::{CodeSource, ConnectionError};
use crate::application::session::StopSignal;

/// Lines longer than this are garbage from a baud mismatch or line noise.
const MAX_LINE_BYTES: usize = 64;
/// Non-code lines skipped per `next_code` call before yielding a timeout.
const MAX_SKIPPED_LINES: usize = 32;
/// How long `query_status` / `reset_receiver` wait for the reply.
const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(2);
/// Granularity of backoff sleeps, so the stop signal is honoured promptly.
const BACKOFF_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("cannot open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("serial I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("serial port closed")]
    Closed,
    #[error("receiver did not reply in time")]
    Timeout,
    #[error("cancelled")]
    Cancelled,
}

impl From<LinkError> for ConnectionError {
    fn from(err: LinkError) -> Self {
        match err {
            LinkError::Closed | LinkError::Cancelled => ConnectionError::Closed,
            other => ConnectionError::Lost(other.to_string()),
        }
    }
}

/// How to open the port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

/// Reply to a status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverStatus {
    pub last_code: Option<NormalizedCode>,
    pub text: String,
}

pub struct SerialLink<P: Read + Write> {
    reader: BufReader<P>,
    /// Bytes of an incomplete line carried across read timeouts.
    pending: Vec<u8>,
    reply_timeout: Duration,
}

impl SerialLink<Box<dyn serialport::SerialPort>> {
    /// Opens a real serial port.
    ///
    /// # Errors
    ///
    /// [`LinkError::Open`] when the port is missing, busy, or not permitted.
    pub fn open(settings: &SerialSettings) -> Result<Self, LinkError> {
        let port = serialport::new(&settings.port, settings.baud_rate)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|source| LinkError::Open {
                port: settings.port.clone(),
                source,
            })?;
        if let Err(err) = port.clear(serialport::ClearBuffer::Input) {
            debug!("could not clear input buffer: {err}");
        }
        info!(port = %settings.port, baud = settings.baud_rate, "serial port open");
        Ok(Self::new(port))
    }
}

/// Names of the serial ports present on this machine.
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(err) => {
            debug!("cannot enumerate serial ports: {err}");
            Vec::new()
        }
    }
}

impl<P: Read + Write> SerialLink<P> {
    pub fn new(port: P) -> Self {
        Self {
            reader: BufReader::new(port),
            pending: Vec::new(),
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Reads one complete line, without its terminator.
    ///
    /// Returns `Ok(None)` when the read timed out before a newline arrived;
    /// the partial line is kept and completed by the next call.
    ///
    /// # Errors
    ///
    /// [`LinkError::Closed`] at end of stream, [`LinkError::Io`] on any other
    /// read failure.
    pub fn next_line(&mut self) -> Result<Option<String>, LinkError> {
        loop {
            match self.reader.read_until(b'\n', &mut self.pending) {
                Ok(0) => {
                    if !self.pending.is_empty() {
                        trace!("dropping partial line at end of stream");
                        self.pending.clear();
                    }
                    return Err(LinkError::Closed);
                }
                Ok(_) if self.pending.last() == Some(&b'\n') => {
                    let raw = std::mem::take(&mut self.pending);
                    if raw.len() > MAX_LINE_BYTES {
                        debug!(len = raw.len(), "discarding oversized line");
                        continue;
                    }
                    let line = String::from_utf8_lossy(&raw).trim().to_string();
                    return Ok(Some(line));
                }
                // End of stream right after a partial line; the next read
                // reports it.
                Ok(_) => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    if self.pending.len() > MAX_LINE_BYTES {
                        debug!(len = self.pending.len(), "discarding oversized partial line");
                        self.pending.clear();
                    }
                    return Ok(None);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(LinkError::Io(err)),
            }
        }
    }

    /// Reads lines until one carries a button code.
    ///
    /// Replies and noise are skipped.  Returns `Ok(None)` on timeout or after
    /// a long run of non-code lines.
    pub fn read_code(&mut self) -> Result<Option<NormalizedCode>, LinkError> {
        for _ in 0..MAX_SKIPPED_LINES {
            let Some(line) = self.next_line()? else {
                return Ok(None);
            };
            match parse_line(&line) {
                Some(ReceiverLine::Code(code)) => return Ok(Some(code)),
                Some(other) => debug!(?other, "ignoring reply line"),
                None if line.is_empty() => {}
                None => debug!(%line, "ignoring malformed line"),
            }
        }
        Ok(None)
    }

    /// Lazy sequence of codes.  Ends after the first error, which is yielded.
    pub fn codes(&mut self) -> Codes<'_, P> {
        Codes {
            link: self,
            done: false,
        }
    }

    pub fn send_command(&mut self, command: ReceiverCommand) -> Result<(), LinkError> {
        let port = self.reader.get_mut();
        port.write_all(&[command.as_byte()])?;
        port.flush()?;
        Ok(())
    }

    /// Sends `S` and collects the `OK:` and `STATUS:` replies.
    ///
    /// Codes arriving in between are dropped.
    pub fn query_status(&mut self) -> Result<ReceiverStatus, LinkError> {
        self.send_command(ReceiverCommand::Status)?;
        let deadline = Instant::now() + self.reply_timeout;
        let mut last_code = None;
        loop {
            match self.next_reply(deadline)? {
                ReceiverLine::LastCode(code) => last_code = Some(code),
                ReceiverLine::Status(text) => {
                    if let Some(last_code) = last_code {
                        return Ok(ReceiverStatus { last_code, text });
                    }
                    debug!("STATUS without preceding OK, waiting");
                }
                other => debug!(?other, "ignoring line while waiting for status"),
            }
        }
    }

    /// Sends `R` and waits for `RST`.
    pub fn reset_receiver(&mut self) -> Result<(), LinkError> {
        self.send_command(ReceiverCommand::Reset)?;
        let deadline = Instant::now() + self.reply_timeout;
        loop {
            if self.next_reply(deadline)? == ReceiverLine::ResetAck {
                info!("receiver reset");
                return Ok(());
            }
        }
    }

    fn next_reply(&mut self, deadline: Instant) -> Result<ReceiverLine, LinkError> {
        loop {
            if Instant::now() >= deadline {
                return Err(LinkError::Timeout);
            }
            if let Some(line) = self.next_line()? {
                if let Some(parsed) = parse_line(&line) {
                    return Ok(parsed);
                }
            }
        }
    }

    pub fn get_ref(&self) -> &P {
        self.reader.get_ref()
    }
}

impl<P: Read + Write> CodeSource for SerialLink<P> {
    fn next_code(&mut self) -> Result<Option<NormalizedCode>, ConnectionError> {
        self.read_code().map_err(ConnectionError::from)
    }
}

/// Iterator returned by [`SerialLink::codes`].
pub struct Codes<'a, P: Read + Write> {
    link: &'a mut SerialLink<P>,
    done: bool,
}

impl<P: Read + Write> Iterator for Codes<'_, P> {
    type Item = Result<NormalizedCode, LinkError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.link.read_code() {
                Ok(Some(code)) => return Some(Ok(code)),
                Ok(None) => continue,
                Err(LinkError::Closed) => self.done = true,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

// ── Reconnect ─────────────────────────────────────────────────────────────────

/// Exponential backoff between connection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// 0 means retry forever.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            max_attempts: 0,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (0-based): doubles each time, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn exhausted(&self, failures: u32) -> bool {
        self.max_attempts != 0 && failures >= self.max_attempts
    }
}

/// Calls `open` until it succeeds, backing off between failures.
///
/// # Errors
///
/// The last open error once `max_attempts` failures have happened, or
/// [`LinkError::Cancelled`] if `stop` fires while waiting.
pub fn connect_with_retry<T, F>(
    policy: &ReconnectPolicy,
    stop: &StopSignal,
    mut open: F,
) -> Result<T, LinkError>
where
    F: FnMut() -> Result<T, LinkError>,
{
    let mut failures = 0u32;
    loop {
        if stop.is_triggered() {
            return Err(LinkError::Cancelled);
        }
        match open() {
            Ok(link) => return Ok(link),
            Err(err) => {
                failures += 1;
                if policy.exhausted(failures) {
                    return Err(err);
                }
                let delay = policy.delay_for(failures - 1);
                warn!(attempt = failures, retry_in_ms = delay.as_millis() as u64, "{err}");
                if !sleep_unless_stopped(delay, stop) {
                    return Err(LinkError::Cancelled);
                }
            }
        }
    }
}

fn sleep_unless_stopped(duration: Duration, stop: &StopSignal) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if stop.is_triggered() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(BACKOFF_SLICE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// In-memory port: reads from a script, then times out (or reports end
    /// of stream when `closed`).
    struct ScriptedPort {
        input: Cursor<Vec<u8>>,
        written: Vec<u8>,
        closed: bool,
    }

    impl ScriptedPort {
        fn new(input: &str) -> Self {
            Self {
                input: Cursor::new(input.as_bytes().to_vec()),
                written: Vec::new(),
                closed: false,
            }
        }

        fn closed(input: &str) -> Self {
            Self {
                closed: true,
                ..Self::new(input)
            }
        }
    }

    impl Read for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.input.read(buf)?;
            if n == 0 && !self.closed {
                return Err(io::Error::new(ErrorKind::TimedOut, "timed out"));
            }
            Ok(n)
        }
    }

    impl Write for ScriptedPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn code(s: &str) -> NormalizedCode {
        NormalizedCode::new(s).unwrap()
    }

    #[test]
    fn test_read_code_skips_malformed_and_reply_lines() {
        // Arrange
        let mut link = SerialLink::new(ScriptedPort::new("garbage\nOK:NONE\n0xzz\n\r\n0x08\r\n"));

        // Act
        let first = link.read_code().unwrap();
        let second = link.read_code().unwrap();

        // Assert
        assert_eq!(first, Some(code("8")));
        assert_eq!(second, None, "timeout once input is drained");
    }

    #[test]
    fn test_partial_line_is_completed_after_timeout() {
        // Arrange: the first half arrives, then a timeout, then the rest.
        let mut link = SerialLink::new(ScriptedPort::new("0x"));

        // Act
        let before = link.read_code().unwrap();
        link.reader.get_mut().input = Cursor::new(b"2F\n".to_vec());
        let after = link.read_code().unwrap();

        // Assert
        assert_eq!(before, None);
        assert_eq!(after, Some(code("2F")));
    }

    #[test]
    fn test_oversized_line_is_discarded() {
        let noise = "x".repeat(200);
        let mut link = SerialLink::new(ScriptedPort::new(&format!("{noise}\n0x10\n")));

        assert_eq!(link.read_code().unwrap(), Some(code("10")));
    }

    #[test]
    fn test_end_of_stream_is_closed_and_maps_to_connection_closed() {
        // Arrange
        let mut link = SerialLink::new(ScriptedPort::closed("0x08\n0x0"));

        // Act
        let first = link.next_code();
        let second = link.next_code();

        // Assert
        assert_eq!(first, Ok(Some(code("8"))));
        assert_eq!(second, Err(ConnectionError::Closed));
    }

    #[test]
    fn test_codes_iterator_ends_when_stream_closes() {
        let mut link = SerialLink::new(ScriptedPort::closed("0x08\nSTATUS:x\n0xFF\n"));

        let codes: Vec<_> = link.codes().collect::<Result<_, _>>().unwrap();

        assert_eq!(codes, vec![code("8"), code("FF")]);
    }

    #[test]
    fn test_query_status_sends_s_and_parses_replies() {
        // Arrange
        let mut link =
            SerialLink::new(ScriptedPort::new("0x08\nOK:0x08\nSTATUS:signal=active\n"));

        // Act
        let status = link.query_status().unwrap();

        // Assert
        assert_eq!(link.get_ref().written, b"S");
        assert_eq!(status.last_code, Some(code("8")));
        assert_eq!(status.text, "signal=active");
    }

    #[test]
    fn test_reset_times_out_without_reply() {
        let mut link = SerialLink::new(ScriptedPort::new("0x08\n"))
            .with_reply_timeout(Duration::from_millis(20));

        let result = link.reset_receiver();

        assert!(matches!(result, Err(LinkError::Timeout)));
        assert_eq!(link.get_ref().written, b"R");
    }

    #[test]
    fn test_reset_waits_for_rst() {
        let mut link = SerialLink::new(ScriptedPort::new("0x08\nRST\n"));

        assert!(link.reset_receiver().is_ok());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = ReconnectPolicy::default();

        let delays: Vec<_> = (0..6).map(|n| policy.delay_for(n).as_millis()).collect();

        assert_eq!(delays, vec![500, 1000, 2000, 4000, 5000, 5000]);
        assert_eq!(policy.delay_for(200), Duration::from_secs(5));
    }

    #[test]
    fn test_connect_with_retry_gives_up_after_max_attempts() {
        // Arrange
        let policy = ReconnectPolicy {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            max_attempts: 3,
        };
        let mut calls = 0;

        // Act
        let result: Result<(), LinkError> = connect_with_retry(&policy, &StopSignal::new(), || {
            calls += 1;
            Err(LinkError::Closed)
        });

        // Assert
        assert!(matches!(result, Err(LinkError::Closed)));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_connect_with_retry_succeeds_after_failures() {
        let policy = ReconnectPolicy {
            initial_delay: Duration::from_millis(1),
            ..ReconnectPolicy::default()
        };
        let mut calls = 0;

        let result = connect_with_retry(&policy, &StopSignal::new(), || {
            calls += 1;
            if calls < 3 {
                Err(LinkError::Closed)
            } else {
                Ok(calls)
            }
        });

        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_connect_with_retry_honours_stop() {
        let stop = StopSignal::new();
        stop.trigger();

        let result: Result<(), LinkError> =
            connect_with_retry(&ReconnectPolicy::default(), &stop, || Ok(()));

        assert!(matches!(result, Err(LinkError::Cancelled)));
    }
}
