//! Events reported by the renderer on its output stream.
//!
//! Each output line is one structured record, minimally
//! `{"action": "<name>", ...}`. Fields an action does not carry, or carries
//! with the wrong type, take their defaults instead of failing the line.

use crate::error::{BridgeError, Result};
use serde_json::{Map, Value};

/// Wire names of the recognized actions.
pub mod action {
    /// The renderer window was closed.
    pub const QUIT: &str = "quit";
    /// The pointer moved.
    pub const MOUSE_MOTION: &str = "mouse_motion";
    /// A key was pressed.
    pub const KEY_DOWN: &str = "key_down";
    /// A key was released.
    pub const KEY_UP: &str = "key_up";
    /// A mouse button was pressed.
    pub const MOUSE_BUTTON_DOWN: &str = "mouse_button_down";
    /// A mouse button was released.
    pub const MOUSE_BUTTON_UP: &str = "mouse_button_up";
}

/// One discrete occurrence reported by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    /// The user asked to close the renderer.
    Quit,

    /// Pointer moved.
    MouseMotion {
        /// X coordinate in window pixels.
        x: i32,
        /// Y coordinate in window pixels.
        y: i32,
    },

    /// Key pressed.
    KeyDown {
        /// Renderer-specific key name; empty when absent.
        keycode: String,
    },

    /// Key released.
    KeyUp {
        /// Renderer-specific key name; empty when absent.
        keycode: String,
    },

    /// Mouse button pressed.
    MouseButtonDown {
        /// Button index (1 = left, 2 = middle, 3 = right).
        button: u8,
        /// X coordinate in window pixels.
        x: i32,
        /// Y coordinate in window pixels.
        y: i32,
    },

    /// Mouse button released.
    MouseButtonUp {
        /// Button index (1 = left, 2 = middle, 3 = right).
        button: u8,
        /// X coordinate in window pixels.
        x: i32,
        /// Y coordinate in window pixels.
        y: i32,
    },

    /// Structured text with an unknown or missing action.
    Unrecognized {
        /// The line as received.
        raw: String,
    },
}

impl Event {
    /// Decode one output line.
    ///
    /// Only text that is not structured at all is an error; the caller logs
    /// it and moves on to the next line.
    pub fn decode(line: &str) -> Result<Self> {
        let trimmed = line.trim();
        let value: Value = serde_json::from_str(trimmed).map_err(|source| BridgeError::Decode {
            line: line.to_string(),
            source,
        })?;

        let unrecognized = || Self::Unrecognized {
            raw: line.to_string(),
        };

        let Some(record) = value.as_object() else {
            return Ok(unrecognized());
        };
        let Some(name) = record.get("action").and_then(Value::as_str) else {
            return Ok(unrecognized());
        };

        let event = match name {
            action::QUIT => Self::Quit,
            action::MOUSE_MOTION => Self::MouseMotion {
                x: int_field(record, "x"),
                y: int_field(record, "y"),
            },
            action::KEY_DOWN => Self::KeyDown {
                keycode: text_field(record, "keycode"),
            },
            action::KEY_UP => Self::KeyUp {
                keycode: text_field(record, "keycode"),
            },
            action::MOUSE_BUTTON_DOWN => Self::MouseButtonDown {
                button: button_field(record),
                x: int_field(record, "x"),
                y: int_field(record, "y"),
            },
            action::MOUSE_BUTTON_UP => Self::MouseButtonUp {
                button: button_field(record),
                x: int_field(record, "x"),
                y: int_field(record, "y"),
            },
            _ => unrecognized(),
        };

        Ok(event)
    }

    /// The wire action name, or `None` for [`Event::Unrecognized`].
    pub const fn action(&self) -> Option<&'static str> {
        match self {
            Self::Quit => Some(action::QUIT),
            Self::MouseMotion { .. } => Some(action::MOUSE_MOTION),
            Self::KeyDown { .. } => Some(action::KEY_DOWN),
            Self::KeyUp { .. } => Some(action::KEY_UP),
            Self::MouseButtonDown { .. } => Some(action::MOUSE_BUTTON_DOWN),
            Self::MouseButtonUp { .. } => Some(action::MOUSE_BUTTON_UP),
            Self::Unrecognized { .. } => None,
        }
    }

    /// Whether this event stops the bridge.
    pub const fn is_quit(&self) -> bool {
        matches!(self, Self::Quit)
    }

    /// Render the event as it would appear on the renderer's output stream.
    ///
    /// [`Event::Unrecognized`] is written back verbatim.
    pub fn to_line(&self) -> String {
        let mut record = Map::new();
        match self {
            Self::Unrecognized { raw } => return raw.clone(),
            Self::Quit => {}
            Self::MouseMotion { x, y } => {
                record.insert("x".into(), (*x).into());
                record.insert("y".into(), (*y).into());
            }
            Self::KeyDown { keycode } | Self::KeyUp { keycode } => {
                record.insert("keycode".into(), keycode.clone().into());
            }
            Self::MouseButtonDown { button, x, y } | Self::MouseButtonUp { button, x, y } => {
                record.insert("button".into(), (*button).into());
                record.insert("x".into(), (*x).into());
                record.insert("y".into(), (*y).into());
            }
        }
        if let Some(name) = self.action() {
            record.insert("action".into(), name.into());
        }
        Value::Object(record).to_string()
    }
}

/// Integer field, accepting floats (truncated) and saturating to `i32`.
fn int_field(record: &Map<String, Value>, key: &str) -> i32 {
    let Some(value) = record.get(key) else {
        return 0;
    };
    #[allow(clippy::cast_possible_truncation)]
    let wide = value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .unwrap_or(0);
    i32::try_from(wide).unwrap_or(if wide < 0 { i32::MIN } else { i32::MAX })
}

fn button_field(record: &Map<String, Value>) -> u8 {
    u8::try_from(int_field(record, "button")).unwrap_or(0)
}

/// Text field, accepting numbers (rendered as text).
fn text_field(record: &Map<String, Value>, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
