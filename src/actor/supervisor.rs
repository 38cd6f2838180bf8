//! Process Supervisor: ties the channel, readers, and push loop together.
//!
//! The supervisor is the only owner of the renderer process. Teardown is
//! always performed in the same order:
//!
//! 1. stop the writer (close the renderer's input)
//! 2. request exit (SIGTERM on unix)
//! 3. wait for exit (optionally bounded, then killed)
//! 4. join both readers once their streams reach end-of-input
//!
//! With a shutdown timeout, steps 3 and 4 are each bounded by it. Readers
//! still blocked when it passes are detached.

use super::dispatcher::{Dispatcher, EventObserver};
use super::pusher::{PushLoop, StopReason};
use super::reader::{spawn_error_reader, spawn_output_reader, EventReaders};
use super::running::RunningFlag;
use crate::channel::{ChannelState, DuplexChannel};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::state::StateSource;
use crossbeam_channel::Sender;
use log::{debug, info, warn};
use std::fmt;
use std::io;
use std::process::ExitStatus;

/// Optional controller hooks for a launch.
#[derive(Default)]
pub struct Hooks {
    observer: Option<Box<dyn EventObserver>>,
    diagnostics: Option<Sender<String>>,
}

impl Hooks {
    /// No observer, no diagnostics forwarding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive input events on the output reader's thread.
    #[must_use]
    pub fn observer(mut self, observer: impl EventObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Forward every renderer diagnostic line.
    #[must_use]
    pub fn diagnostics(mut self, tx: Sender<String>) -> Self {
        self.diagnostics = Some(tx);
        self
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("observer", &self.observer.is_some())
            .field("diagnostics", &self.diagnostics.is_some())
            .finish()
    }
}

/// What a finished [`Supervisor::run`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames written to the renderer.
    pub frames_sent: u64,
    /// Snapshots that failed to encode.
    pub encode_failures: u64,
    /// Why the push loop stopped.
    pub reason: StopReason,
    /// How the renderer exited, if observed.
    pub exit_status: Option<ExitStatus>,
}

/// Owns one renderer process for its whole life.
#[derive(Debug)]
pub struct Supervisor {
    /// Configuration.
    config: BridgeConfig,
    /// Shared running flag.
    running: RunningFlag,
    /// The renderer and its input stream.
    channel: DuplexChannel,
    /// Output and error readers, until joined.
    readers: Option<EventReaders>,
    /// The push loop.
    push: PushLoop,
}

impl Supervisor {
    /// Spawn the renderer with no hooks.
    pub fn launch(config: BridgeConfig) -> Result<Self> {
        Self::launch_with(config, Hooks::default())
    }

    /// Spawn the renderer and start both readers immediately.
    ///
    /// Startup errors ([`BridgeError::is_startup_fatal`]) mean no process
    /// is left running.
    pub fn launch_with(config: BridgeConfig, hooks: Hooks) -> Result<Self> {
        let running = RunningFlag::new();
        let mut channel = DuplexChannel::open(&config.renderer_path)?;

        let (Some(output), Some(errors)) = (channel.take_output(), channel.take_errors()) else {
            return Err(BridgeError::Spawn {
                path: channel.path().to_path_buf(),
                source: io::Error::other("renderer streams already detached"),
            });
        };

        let dispatcher = Dispatcher::new(running.clone()).with_boxed_observer(hooks.observer);
        let readers = EventReaders::new(
            spawn_output_reader(output, dispatcher, running.clone(), config.stop_on_output_eof),
            spawn_error_reader(errors, hooks.diagnostics),
        );
        let push = PushLoop::new(running.clone(), &config);

        Ok(Self {
            config,
            running,
            channel,
            readers: Some(readers),
            push,
        })
    }

    /// A handle to the shared running flag.
    pub fn running_flag(&self) -> RunningFlag {
        self.running.clone()
    }

    /// Whether the bridge should keep going.
    pub fn is_running(&self) -> bool {
        self.running.is_running()
    }

    /// Ask the bridge to stop at the next tick.
    pub fn stop(&self) {
        self.running.stop();
    }

    /// Renderer process id.
    pub fn pid(&self) -> u32 {
        self.channel.pid()
    }

    /// Channel lifecycle state.
    pub const fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    /// Non-blocking liveness check of the renderer.
    pub fn is_alive(&mut self) -> bool {
        self.channel.is_alive()
    }

    /// Configuration in use.
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Push snapshots until stopped, then tear everything down.
    ///
    /// A broken channel or quit event is a normal stop, not an error; only
    /// teardown failures are returned as `Err`.
    pub fn run<S>(&mut self, source: &mut S) -> Result<RunSummary>
    where
        S: StateSource + ?Sized,
    {
        let outcome = self.push.run(source, &mut self.channel);
        let exit_status = self.shutdown()?;

        Ok(RunSummary {
            frames_sent: outcome.frames_sent,
            encode_failures: outcome.encode_failures,
            reason: outcome.reason,
            exit_status,
        })
    }

    /// Ordered teardown. Idempotent.
    pub fn shutdown(&mut self) -> Result<Option<ExitStatus>> {
        self.running.stop();
        let status = self.channel.close(self.config.shutdown_timeout())?;

        if let Some(readers) = self.readers.take() {
            let joined = match self.config.shutdown_timeout() {
                Some(limit) => readers.join_within(limit),
                None => Some(readers.join()),
            };
            if let Some((output_lines, error_lines)) = joined {
                debug!("Readers joined: {output_lines} output lines, {error_lines} error lines");
            }
        }
        if self.channel.state() != ChannelState::Closed {
            self.channel.mark_drained();
            info!("Bridge closed");
        }
        Ok(status)
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if self.channel.state() != ChannelState::Closed {
            if let Err(e) = self.shutdown() {
                warn!("Renderer teardown failed: {e}");
            }
        }
    }
}
