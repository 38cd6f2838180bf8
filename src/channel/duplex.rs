//! Duplex Channel: the renderer process and its three pipes.
//!
//! ```text
//! Starting ──spawn ok──▶ Running ──close()──▶ Draining ──mark_drained()──▶ Closed
//! ```
//!
//! `Draining` means the child has exited but detached readers may still be
//! consuming buffered output. A channel whose readers were never detached
//! goes straight to `Closed`.

use super::launch::prepare_binary;
use super::lines::{FrameSink, FrameWriter, LineSource};
use crate::error::{BridgeError, Result};
use crate::protocol::Frame;
use log::{debug, info, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Poll interval while waiting for exit under a deadline.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lifecycle of a [`DuplexChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    /// Process spawned, pipes not yet attached.
    Starting,
    /// Frames may be sent; readers may be live.
    Running,
    /// Child exited; detached readers are finishing.
    Draining,
    /// Everything released.
    Closed,
}

/// Read half for the renderer's output stream.
pub type OutputLines = LineSource<ChildStdout>;

/// Read half for the renderer's error stream.
pub type ErrorLines = LineSource<ChildStderr>;

/// A running renderer process with all three standard streams piped.
///
/// The write half stays here; the two read halves can be detached with
/// [`take_output`](Self::take_output) and [`take_errors`](Self::take_errors)
/// and moved to their own threads. Each stream is then owned by exactly one
/// path, so no locking is needed.
#[derive(Debug)]
pub struct DuplexChannel {
    /// Resolved binary path.
    path: PathBuf,
    /// The renderer process.
    child: Child,
    /// Input write end.
    writer: FrameWriter<ChildStdin>,
    /// Output read end, until detached.
    output: Option<OutputLines>,
    /// Error read end, until detached.
    errors: Option<ErrorLines>,
    /// Whether a read end was handed to another owner.
    readers_detached: bool,
    /// Lifecycle state.
    state: ChannelState,
    /// Exit status, once observed.
    exit_status: Option<ExitStatus>,
}

impl DuplexChannel {
    /// Resolve, fix permissions on, and spawn the renderer at `path`.
    ///
    /// The renderer gets no arguments and none of the controller's terminal
    /// streams.
    pub fn open(path: &Path) -> Result<Self> {
        let resolved = prepare_binary(path)?;
        let mut channel = Self::spawn(resolved)?;

        channel.state = ChannelState::Running;
        info!(
            "Renderer {} running (pid {})",
            channel.path.display(),
            channel.child.id()
        );
        Ok(channel)
    }

    fn spawn(path: PathBuf) -> Result<Self> {
        let mut command = Command::new(&path);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so teardown also reaches anything the renderer
        // started that still holds our pipes.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);

        let mut child = command
            .spawn()
            .map_err(|source| BridgeError::Spawn {
                path: path.clone(),
                source,
            })?;

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            force_kill(&mut child);
            let _ = child.wait();
            return Err(BridgeError::Spawn {
                path,
                source: io::Error::other("renderer pipes unavailable"),
            });
        };

        Ok(Self {
            path,
            child,
            writer: FrameWriter::new(stdin),
            output: Some(LineSource::new(stdout, "stdout")),
            errors: Some(LineSource::new(stderr, "stderr")),
            readers_detached: false,
            state: ChannelState::Starting,
            exit_status: None,
        })
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> ChannelState {
        self.state
    }

    /// OS process id of the renderer.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Resolved binary path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames flushed so far.
    pub const fn frames_sent(&self) -> u64 {
        self.writer.frames_sent()
    }

    /// Write one frame. See [`FrameSink::send`].
    pub fn send(&mut self, frame: &Frame) -> Result<()> {
        self.writer.send(frame)
    }

    /// Close only the input write end. Later sends fail with
    /// [`BridgeError::ChannelBroken`].
    pub fn close_input(&mut self) {
        if !self.writer.is_closed() {
            debug!("Closing renderer input stream");
        }
        self.writer.close();
    }

    /// Detach the output read half.
    pub fn take_output(&mut self) -> Option<OutputLines> {
        let output = self.output.take();
        self.readers_detached |= output.is_some();
        output
    }

    /// Detach the error read half.
    pub fn take_errors(&mut self) -> Option<ErrorLines> {
        let errors = self.errors.take();
        self.readers_detached |= errors.is_some();
        errors
    }

    /// Next output line, while the output half is still attached.
    pub fn next_output_line(&mut self) -> Option<String> {
        self.output.as_mut().and_then(LineSource::next_line)
    }

    /// Next error line, while the error half is still attached.
    pub fn next_error_line(&mut self) -> Option<String> {
        self.errors.as_mut().and_then(LineSource::next_line)
    }

    /// Non-blocking liveness check.
    pub fn is_alive(&mut self) -> bool {
        if self.exit_status.is_some() {
            return false;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.exit_status = Some(status);
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!("Failed to poll renderer: {e}");
                false
            }
        }
    }

    /// Exit status, once observed.
    pub const fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// Close input, ask the renderer to terminate, and wait for it.
    ///
    /// With `timeout == None` the wait is unbounded. With a timeout, the
    /// renderer is killed once it elapses. Calling this on a channel that
    /// is already draining or closed does nothing.
    pub fn close(&mut self, timeout: Option<Duration>) -> Result<Option<ExitStatus>> {
        if matches!(self.state, ChannelState::Draining | ChannelState::Closed) {
            return Ok(self.exit_status);
        }

        self.close_input();
        if self.is_alive() {
            terminate(&mut self.child);
        }

        let status = match (self.exit_status, timeout) {
            (Some(status), _) => status,
            (None, None) => self.child.wait().map_err(BridgeError::Wait)?,
            (None, Some(limit)) => self.wait_bounded(limit)?,
        };
        self.exit_status = Some(status);
        info!("Renderer exited with {status}");

        self.output = None;
        self.errors = None;
        self.state = if self.readers_detached {
            ChannelState::Draining
        } else {
            ChannelState::Closed
        };
        Ok(Some(status))
    }

    /// Record that every detached reader has observed end-of-input.
    pub fn mark_drained(&mut self) {
        if self.state == ChannelState::Draining {
            debug!("Renderer streams drained");
            self.state = ChannelState::Closed;
        }
    }

    fn wait_bounded(&mut self, limit: Duration) -> Result<ExitStatus> {
        let deadline = Instant::now() + limit;
        loop {
            if let Some(status) = self.child.try_wait().map_err(BridgeError::Wait)? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                warn!(
                    "Renderer did not exit within {}ms, killing it",
                    limit.as_millis()
                );
                force_kill(&mut self.child);
                return self.child.wait().map_err(BridgeError::Wait);
            }
            thread::sleep(EXIT_POLL_INTERVAL);
        }
    }
}

impl FrameSink for DuplexChannel {
    fn send(&mut self, frame: &Frame) -> Result<()> {
        self.writer.send(frame)
    }
}

impl Drop for DuplexChannel {
    fn drop(&mut self) {
        if self.state == ChannelState::Running || self.state == ChannelState::Starting {
            self.writer.close();
            if self.exit_status.is_none() {
                force_kill(&mut self.child);
                let _ = self.child.wait();
            }
        }
    }
}

/// Request graceful termination of the renderer's process group.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    signal_group(child, libc::SIGTERM);
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    force_kill(child);
}

/// Kill the renderer's process group, then the renderer itself.
fn force_kill(child: &mut Child) {
    #[cfg(unix)]
    signal_group(child, libc::SIGKILL);
    if let Err(e) = child.kill() {
        debug!("Kill of renderer failed: {e}");
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn signal_group(child: &Child, signal: libc::c_int) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: `kill` has no memory-safety preconditions. The group id is the
    // pid of a child we have not yet reaped, so it cannot have been recycled.
    let rc = unsafe { libc::kill(-pgid, signal) };
    if rc != 0 {
        debug!("Signal {signal} to renderer group {pgid} failed: {}", io::Error::last_os_error());
    }
}
