//! Error taxonomy for the bridge.
//!
//! Startup errors (`BinaryNotFound`, `NotExecutable`, `Spawn`, `Config`) are
//! fatal before any frame is sent. `ChannelBroken` is terminal for the push
//! loop only. `Decode` is local to one output line and never stops a reader.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Every failure the bridge can report.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The renderer binary does not exist at the configured path.
    #[error("renderer binary not found at {}", path.display())]
    BinaryNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The renderer binary is not executable and could not be made so.
    #[error("renderer binary at {} is not executable", path.display())]
    NotExecutable {
        /// Path of the binary.
        path: PathBuf,
        /// Underlying permission error.
        #[source]
        source: io::Error,
    },

    /// The OS refused to start the renderer process.
    #[error("failed to spawn renderer {}", path.display())]
    Spawn {
        /// Path of the binary.
        path: PathBuf,
        /// Underlying spawn error.
        #[source]
        source: io::Error,
    },

    /// A snapshot could not be serialized into a frame.
    #[error("failed to encode snapshot: {0}")]
    Encoding(#[source] serde_json::Error),

    /// A line from the renderer was not structured text at all.
    #[error("malformed event line {line:?}: {source}")]
    Decode {
        /// The offending line, verbatim.
        line: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// A frame stored on the wire was not valid base64-wrapped JSON.
    #[error("malformed frame: {0}")]
    Frame(String),

    /// The renderer's input stream is closed or the renderer is gone.
    #[error("channel to renderer is broken: {0}")]
    ChannelBroken(#[source] io::Error),

    /// Waiting on or signalling the renderer process failed.
    #[error("failed to wait for renderer exit: {0}")]
    Wait(#[source] io::Error),

    /// A configuration file could not be read or parsed.
    #[error("invalid configuration {}: {message}", path.display())]
    Config {
        /// Path of the configuration file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
}

impl BridgeError {
    /// Whether this error must abort the controller before any process runs.
    pub const fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Self::BinaryNotFound { .. }
                | Self::NotExecutable { .. }
                | Self::Spawn { .. }
                | Self::Config { .. }
        )
    }

    /// Shorthand for a broken channel caused by a closed write end.
    pub(crate) fn input_closed() -> Self {
        Self::ChannelBroken(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "renderer input stream already closed",
        ))
    }
}
