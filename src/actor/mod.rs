//! Actor Model: the threads that keep the bridge moving.
//!
//! - **Push Loop**: runs on the caller's thread, one frame per tick
//! - **Output Reader**: decodes renderer events, hands them to the dispatcher
//! - **Error Reader**: logs renderer diagnostics
//! - **Supervisor**: owns the renderer process and tears everything down
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   Frame (stdin)    ┌──────────────┐
//! │  Push Loop   │ ─────────────────▶ │   Renderer   │
//! └──────────────┘                    │   process    │
//!        ▲                            └──────────────┘
//!        │                              │          │
//!        │ RunningFlag    Event (stdout)│          │text (stderr)
//!        │                              ▼          ▼
//!        │      ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//!        └───── │  Dispatcher  │◀─│Output Reader │  │ Error Reader │──▶ log
//!         quit  └──────────────┘  └──────────────┘  └──────────────┘
//! ```

mod dispatcher;
mod pusher;
mod reader;
mod running;
mod supervisor;

pub use dispatcher::{Dispatch, Dispatcher, EventObserver};
pub use pusher::{LoopState, PushLoop, PushOutcome, StopReason};
pub use reader::{spawn_error_reader, spawn_output_reader, EventReaders, ReaderActor, RENDERER_LOG_TARGET};
pub use running::RunningFlag;
pub use supervisor::{Hooks, RunSummary, Supervisor};
