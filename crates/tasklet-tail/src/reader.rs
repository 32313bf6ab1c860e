//! Resumable line reading across `complete()` calls.
//!
//! Handles `CRLF` detection on an unbuffered stream without `mark`/`reset`:
//! [`PushbackByteReader`] guarantees a one-byte push-back on top of any
//! [`std::io::Read`], so the terminator scan never needs a seekable source. End-of-file
//! is `Ok(None)`, not a sentinel value.

use std::io::{self, Read};

/// Wraps a byte source with the ability to push exactly one byte back.
pub struct PushbackByteReader<R> {
    inner: R,
    pushed: Option<u8>,
    position: u64,
}

impl<R: Read> PushbackByteReader<R> {
    pub fn new(inner: R, start_position: u64) -> Self {
        Self {
            inner,
            pushed: None,
            position: start_position,
        }
    }

    /// Read the next byte, or `Ok(None)` at end-of-file.
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(byte) = self.pushed.take() {
            self.position += 1;
            return Ok(Some(byte));
        }
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf)? {
            0 => Ok(None),
            _ => {
                self.position += 1;
                Ok(Some(buf[0]))
            }
        }
    }

    /// Push `byte` back so the next [`PushbackByteReader::next_byte`] returns it again.
    ///
    /// At most one byte may be pending; callers never push back twice without an
    /// intervening read, since the line scanner only ever looks one byte ahead.
    pub fn push_back(&mut self, byte: u8) {
        debug_assert!(self.pushed.is_none(), "at most one byte may be pushed back");
        self.pushed = Some(byte);
        self.position -= 1;
    }

    /// Number of bytes logically consumed from the underlying source so far (a
    /// push-backed byte is not counted as consumed).
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Outcome of one [`LineReader::read_line`] call.
#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    /// A complete, terminator-stripped line.
    Line(String),
    /// End-of-file reached with no terminator seen. Whatever partial bytes were
    /// accumulated remain buffered and will prefix the next line read from this file.
    NoMore,
}

/// Reads one line at a time from a [`PushbackByteReader`], decoding each line's bytes
/// with a fixed charset and retaining a partial line across calls.
///
/// Terminator rule: a line ends at `LF`, `CR`, or `CRLF`. On seeing `CR` the reader
/// peeks one byte ahead; if it is `LF` both are consumed, otherwise the byte is pushed
/// back for the next read.
pub struct LineReader<R> {
    pushback: PushbackByteReader<R>,
    encoding: &'static encoding_rs::Encoding,
    buffer: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R, start_position: u64, encoding: &'static encoding_rs::Encoding) -> Self {
        Self {
            pushback: PushbackByteReader::new(inner, start_position),
            encoding,
            buffer: Vec::new(),
        }
    }

    pub fn read_line(&mut self) -> io::Result<LineOutcome> {
        loop {
            match self.pushback.next_byte()? {
                None => return Ok(LineOutcome::NoMore),
                Some(b'\n') => return Ok(self.flush_line()),
                Some(b'\r') => {
                    match self.pushback.next_byte()? {
                        Some(b'\n') => {}
                        Some(other) => self.pushback.push_back(other),
                        None => {}
                    }
                    return Ok(self.flush_line());
                }
                Some(byte) => self.buffer.push(byte),
            }
        }
    }

    /// Discard bytes up through (and including) the next line terminator, without
    /// decoding or returning them. Used when opening a file at a negative offset to
    /// skip the partial line straddling the size observed at first sight.
    ///
    /// Returns `true` if a terminator was consumed, `false` if end-of-file was reached
    /// first (nothing to skip, the whole remainder is a dangling partial line).
    pub fn skip_to_next_line(&mut self) -> io::Result<bool> {
        loop {
            match self.pushback.next_byte()? {
                None => return Ok(false),
                Some(b'\n') => return Ok(true),
                Some(b'\r') => {
                    match self.pushback.next_byte()? {
                        Some(b'\n') => {}
                        Some(other) => self.pushback.push_back(other),
                        None => {}
                    }
                    return Ok(true);
                }
                Some(_) => {}
            }
        }
    }

    fn flush_line(&mut self) -> LineOutcome {
        let bytes = std::mem::take(&mut self.buffer);
        let (decoded, _encoding_used, _had_errors) = self.encoding.decode(&bytes);
        LineOutcome::Line(decoded.into_owned())
    }

    pub fn position(&self) -> u64 {
        self.pushback.position()
    }

    pub fn into_inner(self) -> R {
        self.pushback.into_inner()
    }
}
