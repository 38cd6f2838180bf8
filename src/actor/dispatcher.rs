//! Event Dispatcher: what each renderer event does.
//!
//! | Event                          | Action                                  |
//! |--------------------------------|-----------------------------------------|
//! | `Quit`                         | stop the [`RunningFlag`]                |
//! | mouse / key input              | hand to the observer, or log it         |
//! | `Unrecognized`                 | log and discard                         |

use super::running::RunningFlag;
use crate::protocol::Event;
use crossbeam_channel::{Sender, TrySendError};
use log::{debug, info, warn};
use std::fmt;

/// Receiver for input events, registered by the controller.
///
/// Called on the output reader's thread, in stream order.
pub trait EventObserver: Send {
    /// Handle one input event.
    fn observe(&mut self, event: &Event);
}

impl<F> EventObserver for F
where
    F: FnMut(&Event) + Send,
{
    fn observe(&mut self, event: &Event) {
        self(event);
    }
}

impl EventObserver for Sender<Event> {
    fn observe(&mut self, event: &Event) {
        match self.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Event observer queue full, dropping {event:?}");
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("Event observer hung up");
            }
        }
    }
}

/// What the dispatcher did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dispatch {
    /// The running flag was cleared.
    Stopped,
    /// The observer received the event.
    Observed,
    /// No observer is registered; the event was logged.
    Logged,
    /// The event was not understood and was dropped.
    Discarded,
}

/// Maps every [`Event`] variant to exactly one action.
pub struct Dispatcher {
    running: RunningFlag,
    observer: Option<Box<dyn EventObserver>>,
}

impl Dispatcher {
    /// Create a dispatcher that only logs input events.
    pub const fn new(running: RunningFlag) -> Self {
        Self {
            running,
            observer: None,
        }
    }

    /// Register the observer for input events.
    #[must_use]
    pub fn with_observer(mut self, observer: impl EventObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Register a boxed observer, if any.
    #[must_use]
    pub fn with_boxed_observer(mut self, observer: Option<Box<dyn EventObserver>>) -> Self {
        self.observer = observer;
        self
    }

    /// Whether an observer is registered.
    pub const fn has_observer(&self) -> bool {
        self.observer.is_some()
    }

    /// Apply the action for `event`.
    pub fn dispatch(&mut self, event: &Event) -> Dispatch {
        match event {
            Event::Quit => {
                info!("Received quit event from renderer");
                self.running.stop();
                Dispatch::Stopped
            }
            Event::MouseMotion { .. }
            | Event::KeyDown { .. }
            | Event::KeyUp { .. }
            | Event::MouseButtonDown { .. }
            | Event::MouseButtonUp { .. } => self.observe(event),
            Event::Unrecognized { raw } => {
                warn!("Discarding unrecognized renderer event: {raw}");
                Dispatch::Discarded
            }
        }
    }

    fn observe(&mut self, event: &Event) -> Dispatch {
        if let Some(observer) = self.observer.as_mut() {
            observer.observe(event);
            return Dispatch::Observed;
        }

        match event {
            Event::MouseMotion { x, y } => info!("Mouse moved to ({x}, {y})"),
            Event::KeyDown { keycode } => info!("Key pressed: {keycode}"),
            Event::KeyUp { keycode } => info!("Key released: {keycode}"),
            Event::MouseButtonDown { button, x, y } => {
                info!("Mouse button {button} down at ({x}, {y})");
            }
            Event::MouseButtonUp { button, x, y } => {
                info!("Mouse button {button} up at ({x}, {y})");
            }
            Event::Quit | Event::Unrecognized { .. } => {}
        }
        Dispatch::Logged
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("running", &self.running)
            .field("has_observer", &self.has_observer())
            .finish()
    }
}
