//! Frame codec: snapshot → single-line wire payload.
//!
//! ```text
//! Snapshot ──serde_json──▶ compact JSON ──base64 (standard, padded)──▶ Frame
//! ```
//!
//! The base64 alphabet has no line terminators, so a frame is always exactly
//! one line no matter what the snapshot's strings contain.

use crate::error::{BridgeError, Result};
use crate::state::Snapshot;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// One encoded snapshot, as it appears on the wire (without terminator).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame(String);

impl Frame {
    /// Encode any serializable state into a frame.
    ///
    /// Serializer failures (non-string map keys, paths that are not valid
    /// UTF-8, custom `Serialize` errors) are surfaced as
    /// [`BridgeError::Encoding`].
    pub fn encode<T: Serialize + ?Sized>(state: &T) -> Result<Self> {
        let json = serde_json::to_vec(state).map_err(BridgeError::Encoding)?;
        Ok(Self(STANDARD.encode(json)))
    }

    /// Encode a snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        Self::encode(snapshot)
    }

    /// Wrap a line received from the wire. Trailing terminators are removed.
    pub fn from_line(line: &str) -> Self {
        Self(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// The encoded payload.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Payload length in bytes, excluding the terminator.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Strip the base64 wrapper, yielding the structured JSON bytes.
    pub fn unwrap_json(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.0.as_bytes())
            .map_err(|e| BridgeError::Frame(format!("invalid base64: {e}")))
    }

    /// Decode into any deserializable state type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let json = self.unwrap_json()?;
        serde_json::from_slice(&json).map_err(|e| BridgeError::Frame(format!("invalid JSON: {e}")))
    }

    /// Decode into a generic record, preserving every field.
    pub fn to_record(&self) -> Result<serde_json::Value> {
        self.decode()
    }

    /// Decode into a [`Snapshot`]. Used by renderer peers.
    pub fn decode_snapshot(&self) -> Result<Snapshot> {
        self.decode()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}
