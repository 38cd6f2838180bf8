//! Bridge configuration.

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for a [`Supervisor`](crate::Supervisor).
///
/// Loaded from JSON; every field is optional and falls back to
/// [`BridgeConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Path of the renderer binary.
    pub renderer_path: PathBuf,
    /// Pacing used when a snapshot asks for 0 fps.
    pub default_fps: u32,
    /// Upper bound on waiting for the renderer to exit before killing it.
    /// `None` waits indefinitely.
    pub shutdown_timeout_ms: Option<u64>,
    /// Stop the push loop when a snapshot fails to encode, instead of
    /// skipping that tick.
    pub halt_on_encode_error: bool,
    /// Stop the bridge when the renderer closes its output stream.
    pub stop_on_output_eof: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            renderer_path: ["target", "release", "sdl2_rust"].iter().collect(),
            default_fps: 60,
            shutdown_timeout_ms: None,
            halt_on_encode_error: true,
            stop_on_output_eof: true,
        }
    }
}

impl BridgeConfig {
    /// Create a configuration for the renderer at `path`.
    pub fn new(renderer_path: impl Into<PathBuf>) -> Self {
        Self {
            renderer_path: renderer_path.into(),
            ..Self::default()
        }
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let invalid = |message: String| BridgeError::Config {
            path: path.to_path_buf(),
            message,
        };
        let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))
    }

    /// Set the renderer path.
    #[must_use]
    pub fn with_renderer_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.renderer_path = path.into();
        self
    }

    /// Set the fallback frame rate.
    #[must_use]
    pub fn with_default_fps(mut self, fps: u32) -> Self {
        self.default_fps = fps;
        self
    }

    /// Bound the shutdown wait.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.shutdown_timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Choose whether encoding failures halt the push loop.
    #[must_use]
    pub fn with_halt_on_encode_error(mut self, halt: bool) -> Self {
        self.halt_on_encode_error = halt;
        self
    }

    /// Choose whether output end-of-input stops the bridge.
    #[must_use]
    pub fn with_stop_on_output_eof(mut self, stop: bool) -> Self {
        self.stop_on_output_eof = stop;
        self
    }

    /// The shutdown bound, if any.
    pub const fn shutdown_timeout(&self) -> Option<Duration> {
        match self.shutdown_timeout_ms {
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.renderer_path, Path::new("target/release/sdl2_rust"));
        assert_eq!(config.default_fps, 60);
        assert_eq!(config.shutdown_timeout(), None);
        assert!(config.halt_on_encode_error);
        assert!(config.stop_on_output_eof);
    }

    #[test]
    fn test_partial_file_takes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        fs::write(&path, r#"{"renderer_path": "bin/renderer", "shutdown_timeout_ms": 250}"#).unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.renderer_path, Path::new("bin/renderer"));
        assert_eq!(config.shutdown_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.default_fps, 60);
    }

    #[test]
    fn test_bad_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        fs::write(&path, "{ nope").unwrap();

        let err = BridgeConfig::load(&path).unwrap_err();
        assert!(matches!(err, BridgeError::Config { .. }));
        assert!(BridgeConfig::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = BridgeConfig::new("r").with_shutdown_timeout(Some(Duration::from_secs(2)));
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: BridgeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
