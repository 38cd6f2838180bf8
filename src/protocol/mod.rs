//! Wire protocol between controller and renderer.
//!
//! Line-delimited in both directions:
//!
//! ```text
//!              Frame (base64 JSON) + '\n'
//! Controller ─────────────────────────────▶ Renderer stdin
//!
//!              {"action": ...} + '\n'
//! Controller ◀───────────────────────────── Renderer stdout
//!
//!              free text + '\n'
//! Controller ◀───────────────────────────── Renderer stderr
//! ```

mod event;
mod frame;

pub use event::{action, Event};
pub use frame::Frame;

/// Line terminator appended to every frame.
pub const LINE_TERMINATOR: u8 = b'\n';
