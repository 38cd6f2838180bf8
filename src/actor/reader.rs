//! Event Reader Pair: one thread per renderer read stream.
//!
//! The output reader decodes and dispatches; the error reader only logs.
//! Neither can be interrupted mid-read: both end when their stream reaches
//! end-of-input, which happens once the renderer exits.

use super::dispatcher::Dispatcher;
use super::running::RunningFlag;
use crate::channel::LineSource;
use crate::protocol::Event;
use crossbeam_channel::{Sender, TrySendError};
use log::{debug, error, info, warn};
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Poll interval while joining under a deadline.
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Log target for renderer diagnostics.
pub const RENDERER_LOG_TARGET: &str = "renderlink::renderer";

/// A thread draining one line source.
#[derive(Debug)]
pub struct ReaderActor {
    /// Thread name, for logs.
    name: String,
    /// Handle to the reader thread; yields the number of lines read.
    handle: Option<JoinHandle<u64>>,
}

impl ReaderActor {
    /// Spawn a reader thread.
    ///
    /// `on_line` runs for every line in order; `on_end` runs once after
    /// end-of-input. A panic inside `on_line` is logged and the line is
    /// skipped, so later lines and `on_end` still run.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to spawn the thread.
    pub fn spawn<R, L, E>(name: &str, mut source: LineSource<R>, mut on_line: L, on_end: E) -> Self
    where
        R: Read + Send + 'static,
        L: FnMut(String) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut lines = 0u64;
                while let Some(line) = source.next_line() {
                    lines += 1;
                    if panic::catch_unwind(AssertUnwindSafe(|| on_line(line))).is_err() {
                        error!("Handler for renderer {} line {lines} panicked", source.label());
                    }
                }
                debug!("Renderer {} reached end-of-input after {lines} lines", source.label());
                on_end();
                lines
            })
            .expect("Failed to spawn reader thread");

        Self {
            name: name.to_string(),
            handle: Some(handle),
        }
    }

    /// Whether the thread has observed end-of-input and exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for end-of-input. Returns the number of lines read.
    pub fn join(mut self) -> u64 {
        self.wait()
    }

    fn wait(&mut self) -> u64 {
        let Some(handle) = self.handle.take() else {
            return 0;
        };
        handle.join().unwrap_or_else(|_| {
            warn!("Reader thread {} panicked", self.name);
            0
        })
    }
}

/// Spawn the output reader: decode each line and dispatch it.
///
/// Malformed lines are logged and skipped. With `stop_on_eof`, end-of-input
/// stops the bridge, since the renderer is gone.
pub fn spawn_output_reader<R>(
    source: LineSource<R>,
    mut dispatcher: Dispatcher,
    running: RunningFlag,
    stop_on_eof: bool,
) -> ReaderActor
where
    R: Read + Send + 'static,
{
    let on_line = move |line: String| {
        debug!("Renderer output: {line}");
        if line.trim().is_empty() {
            return;
        }
        match Event::decode(&line) {
            Ok(event) => {
                dispatcher.dispatch(&event);
            }
            Err(e) => warn!("Dropping renderer output: {e}"),
        }
    };
    let on_end = move || {
        if stop_on_eof && running.stop() {
            info!("Renderer closed its output stream, stopping bridge");
        }
    };
    ReaderActor::spawn("renderlink-stdout", source, on_line, on_end)
}

/// Spawn the error reader: log every non-empty line verbatim.
///
/// Lines are also forwarded to `diagnostics` when given.
pub fn spawn_error_reader<R>(source: LineSource<R>, diagnostics: Option<Sender<String>>) -> ReaderActor
where
    R: Read + Send + 'static,
{
    let on_line = move |line: String| {
        if line.trim().is_empty() {
            return;
        }
        warn!(target: RENDERER_LOG_TARGET, "{line}");
        if let Some(tx) = diagnostics.as_ref() {
            match tx.try_send(line) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => warn!("Diagnostics queue full, dropping renderer line"),
                Err(TrySendError::Disconnected(_)) => debug!("Diagnostics receiver hung up"),
            }
        }
    };
    ReaderActor::spawn("renderlink-stderr", source, on_line, || {})
}

/// The output and error readers of one renderer.
#[derive(Debug)]
pub struct EventReaders {
    output: ReaderActor,
    errors: ReaderActor,
}

impl EventReaders {
    /// Pair two running readers.
    pub const fn new(output: ReaderActor, errors: ReaderActor) -> Self {
        Self { output, errors }
    }

    /// Whether both readers have reached end-of-input.
    pub fn is_finished(&self) -> bool {
        self.output.is_finished() && self.errors.is_finished()
    }

    /// Wait for both streams to end. Returns `(output_lines, error_lines)`.
    pub fn join(self) -> (u64, u64) {
        (self.output.join(), self.errors.join())
    }

    /// Like [`join`](Self::join), but gives up after `limit`.
    ///
    /// On timeout both threads are detached and `None` is returned; they
    /// exit on their own once whatever still holds the streams lets go.
    pub fn join_within(self, limit: Duration) -> Option<(u64, u64)> {
        let deadline = Instant::now() + limit;
        while !self.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    "Renderer streams still open {}ms after shutdown, detaching readers",
                    limit.as_millis()
                );
                return None;
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }
        Some(self.join())
    }
}
