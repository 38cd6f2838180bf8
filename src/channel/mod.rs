//! Duplex Channel: process-boundary plumbing.
//!
//! ```text
//!                  ┌──────────────────────┐
//!  FrameWriter ───▶│ stdin                │
//!                  │   renderer process   │
//!  LineSource  ◀───│ stdout               │
//!  LineSource  ◀───│ stderr               │
//!                  └──────────────────────┘
//! ```

mod duplex;
mod launch;
mod lines;

pub use duplex::{ChannelState, DuplexChannel, ErrorLines, OutputLines};
pub use launch::prepare_binary;
pub use lines::{FrameSink, FrameWriter, LineSource};
