//! Line-oriented halves of the duplex pipe.
//!
//! Each half owns exactly one stream handle, so the halves can be moved to
//! different threads without any locking.

use crate::error::{BridgeError, Result};
use crate::protocol::{Frame, LINE_TERMINATOR};
use log::warn;
use std::io::{self, BufRead, BufReader, Read, Write};

/// Destination for encoded frames.
pub trait FrameSink {
    /// Write one frame plus terminator and flush.
    ///
    /// A failure is terminal: the sink stays broken afterwards.
    fn send(&mut self, frame: &Frame) -> Result<()>;
}

/// Write half: frames out, one per line.
#[derive(Debug)]
pub struct FrameWriter<W: Write> {
    /// `None` once closed or broken.
    inner: Option<W>,
    /// Frame plus terminator, assembled for a single write.
    scratch: Vec<u8>,
    /// Frames successfully flushed.
    frames_sent: u64,
}

impl<W: Write> FrameWriter<W> {
    /// Wrap a writable stream.
    pub const fn new(inner: W) -> Self {
        Self {
            inner: Some(inner),
            scratch: Vec::new(),
            frames_sent: 0,
        }
    }

    /// Close the write end. Idempotent.
    pub fn close(&mut self) {
        self.inner.take();
    }

    /// Whether the write end is closed or broken.
    pub const fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Frames flushed so far.
    pub const fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Take the stream back out, if still open.
    #[cfg(test)]
    fn into_inner(self) -> Option<W> {
        self.inner
    }
}

impl<W: Write> FrameSink for FrameWriter<W> {
    fn send(&mut self, frame: &Frame) -> Result<()> {
        let Some(inner) = self.inner.as_mut() else {
            return Err(BridgeError::input_closed());
        };

        self.scratch.clear();
        self.scratch.extend_from_slice(frame.as_str().as_bytes());
        self.scratch.push(LINE_TERMINATOR);

        let written = inner.write_all(&self.scratch).and_then(|()| inner.flush());
        if let Err(e) = written {
            self.inner = None;
            return Err(BridgeError::ChannelBroken(e));
        }

        self.frames_sent += 1;
        Ok(())
    }
}

/// Read half: one logical line at a time until end-of-input.
#[derive(Debug)]
pub struct LineSource<R: Read> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    /// Stream name used in log messages.
    label: &'static str,
}

impl<R: Read> LineSource<R> {
    /// Wrap a readable stream.
    pub fn new(inner: R, label: &'static str) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::with_capacity(256),
            label,
        }
    }

    /// Stream name used in log messages.
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Block until a full line is available.
    ///
    /// Returns `None` at end-of-input. A read error also ends the stream,
    /// since the peer behind it is gone either way. The terminator is
    /// stripped; invalid UTF-8 is replaced rather than rejected.
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            self.buf.clear();
            match self.reader.read_until(LINE_TERMINATOR, &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    if self.buf.last() == Some(&LINE_TERMINATOR) {
                        self.buf.pop();
                    }
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                    return Some(String::from_utf8_lossy(&self.buf).into_owned());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("Error reading renderer {}: {e}", self.label);
                    return None;
                }
            }
        }
    }
}

impl<R: Read> Iterator for LineSource<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.next_line()
    }
}
