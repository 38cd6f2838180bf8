//! State Push Loop: one snapshot per tick, paced by a fixed sleep.
//!
//! ```text
//!   ┌────────── Active ◀─────────────┐
//!   │  flag set? ──no──▶ Stopped     │
//!   │  snapshot → encode → send      │
//!   │     send failed ──▶ Stopped    │
//!   └──▶ sleep(1 / fps) ─────────────┘
//! ```
//!
//! Pacing is a plain sleep after each send, not a deadline: drift under
//! load is accepted.

use super::running::RunningFlag;
use crate::channel::FrameSink;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::protocol::Frame;
use crate::state::StateSource;
use log::{debug, error, info};
use std::thread;
use std::time::Duration;

/// Why the push loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The running flag was cleared (quit event, renderer gone, or caller).
    Requested,
    /// A frame could not be written; the renderer is gone.
    ChannelBroken,
    /// A snapshot could not be encoded and the loop is configured to halt.
    EncodingFailed,
}

/// Loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// Keep ticking after sleeping for the given interval.
    Active(Duration),
    /// Terminal.
    Stopped(StopReason),
}

/// Result of a finished push loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushOutcome {
    /// Frames written successfully.
    pub frames_sent: u64,
    /// Snapshots that failed to encode.
    pub encode_failures: u64,
    /// Why the loop ended.
    pub reason: StopReason,
}

/// Drives snapshots from a [`StateSource`] into a [`FrameSink`].
#[derive(Debug)]
pub struct PushLoop {
    running: RunningFlag,
    default_fps: u32,
    halt_on_encode_error: bool,
    frames_sent: u64,
    encode_failures: u64,
}

impl PushLoop {
    /// Create a loop bound to the shared running flag.
    pub fn new(running: RunningFlag, config: &BridgeConfig) -> Self {
        Self {
            running,
            default_fps: config.default_fps.max(1),
            halt_on_encode_error: config.halt_on_encode_error,
            frames_sent: 0,
            encode_failures: 0,
        }
    }

    /// Sleep between ticks for a snapshot asking for `fps`.
    ///
    /// `fps == 0` falls back to the configured default.
    pub fn frame_interval(&self, fps: u32) -> Duration {
        let fps = if fps == 0 { self.default_fps } else { fps };
        Duration::from_secs(1) / fps
    }

    /// Run until stopped. Blocks the calling thread.
    pub fn run<S, K>(&mut self, source: &mut S, sink: &mut K) -> PushOutcome
    where
        S: StateSource + ?Sized,
        K: FrameSink + ?Sized,
    {
        info!("Push loop active");
        let reason = loop {
            match self.tick(source, sink) {
                LoopState::Active(interval) => thread::sleep(interval),
                LoopState::Stopped(reason) => break reason,
            }
        };
        info!(
            "Push loop stopped ({reason:?}) after {} frames",
            self.frames_sent
        );

        PushOutcome {
            frames_sent: self.frames_sent,
            encode_failures: self.encode_failures,
            reason,
        }
    }

    /// Perform one tick without sleeping.
    pub fn tick<S, K>(&mut self, source: &mut S, sink: &mut K) -> LoopState
    where
        S: StateSource + ?Sized,
        K: FrameSink + ?Sized,
    {
        if !self.running.is_running() {
            return LoopState::Stopped(StopReason::Requested);
        }

        let snapshot = source.snapshot();
        let interval = self.frame_interval(snapshot.fps);

        let frame = match Frame::from_snapshot(&snapshot) {
            Ok(frame) => frame,
            Err(e) => {
                self.encode_failures += 1;
                error!("Dropping frame {}: {e}", self.frames_sent + 1);
                if self.halt_on_encode_error {
                    self.running.stop();
                    return LoopState::Stopped(StopReason::EncodingFailed);
                }
                return LoopState::Active(interval);
            }
        };

        match sink.send(&frame) {
            Ok(()) => {
                self.frames_sent += 1;
                debug!("Sent frame {} ({} bytes)", self.frames_sent, frame.len());
                LoopState::Active(interval)
            }
            Err(BridgeError::ChannelBroken(e)) => {
                error!("Renderer terminated, unable to send state: {e}");
                self.running.stop();
                LoopState::Stopped(StopReason::ChannelBroken)
            }
            Err(e) => {
                error!("Failed to send state: {e}");
                self.running.stop();
                LoopState::Stopped(StopReason::ChannelBroken)
            }
        }
    }
}
