//! # Renderlink
//!
//! A supervised bridge between a controller process that owns application
//! state and a separately built renderer process that owns the display.
//!
//! The controller streams a full state snapshot every tick; the renderer
//! streams back input and lifecycle events. Everything travels over the
//! renderer's three standard streams, one record per line.
//!
//! ## Core Concepts
//!
//! - **Frames**: base64-wrapped JSON snapshots, guaranteed single-line
//! - **Events**: one structured record per renderer output line
//! - **Actor model**: a push loop plus one reader thread per read stream
//! - **Running flag**: the only cross-thread cancellation signal
//!
//! ## Example
//!
//! ```rust,ignore
//! use renderlink::{BridgeConfig, Snapshot, Supervisor, WindowConfig};
//!
//! let mut bridge = Supervisor::launch(BridgeConfig::new("target/release/sdl2_rust"))?;
//! let window = WindowConfig::new(800, 600, "My Game", "background.jpeg", "icon.png");
//!
//! // Runs until the renderer quits or goes away.
//! let summary = bridge.run(&mut || Snapshot::new(window.clone(), 60))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod channel;
pub mod config;
pub mod error;
pub mod protocol;
pub mod state;

// Re-exports for convenience
pub use actor::{Dispatch, Dispatcher, EventObserver, Hooks, RunSummary, RunningFlag, StopReason, Supervisor};
pub use channel::{ChannelState, DuplexChannel, FrameSink};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use protocol::{Event, Frame};
pub use state::{Point, Rgba, Size, Snapshot, Sprite, StateSource, TextOverlay, WindowConfig};
