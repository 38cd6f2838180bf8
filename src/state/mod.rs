//! State model: what the controller shows the renderer.
//!
//! A [`Snapshot`] is captured once per tick and fully replaces the previous
//! one on the renderer side. There is no diffing or patching. Field names
//! match the wire record the renderer expects.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default per-sprite animation rate.
pub const DEFAULT_SPRITE_FRAME_RATE: u32 = 60;

/// A position in window pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal offset from the left edge.
    pub x: i32,
    /// Vertical offset from the top edge.
    pub y: i32,
}

impl Point {
    /// Create a new point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// An RGBA color, each channel 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba {
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Create a color from all four channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Window configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window width in pixels.
    pub width: u32,
    /// Window height in pixels.
    pub height: u32,
    /// Title bar text.
    pub title: String,
    /// Background image path.
    pub background: PathBuf,
    /// Window icon path.
    pub icon_path: PathBuf,
}

impl WindowConfig {
    /// Create a window configuration.
    pub fn new(
        width: u32,
        height: u32,
        title: impl Into<String>,
        background: impl Into<PathBuf>,
        icon_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            width,
            height,
            title: title.into(),
            background: background.into(),
            icon_path: icon_path.into(),
        }
    }
}

/// A drawable, optionally animated entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    /// Stable identifier.
    pub id: String,
    /// Animation frames, cycled at `frame_rate`.
    pub images: Vec<PathBuf>,
    /// Top-left corner.
    pub location: Point,
    /// Drawn size; images are scaled to fit.
    pub size: Size,
    /// Animation frames per second.
    pub frame_rate: u32,
}

impl Sprite {
    /// Create a sprite with the default animation rate.
    pub fn new<I, P>(id: impl Into<String>, images: I, location: Point, size: Size) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            id: id.into(),
            images: images.into_iter().map(Into::into).collect(),
            location,
            size,
            frame_rate: DEFAULT_SPRITE_FRAME_RATE,
        }
    }

    /// Set the animation rate.
    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Move the sprite to a new location.
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.location = Point::new(x, y);
    }
}

/// A text overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextOverlay {
    /// Stable identifier.
    pub id: String,
    /// Font family or font file name.
    pub font_family: String,
    /// Text to draw.
    pub content: String,
    /// Point size.
    pub size: u32,
    /// Text color; the renderer picks one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    /// Top-left corner.
    pub location: Point,
}

impl TextOverlay {
    /// Create a text overlay without an explicit color.
    pub fn new(
        id: impl Into<String>,
        font_family: impl Into<String>,
        content: impl Into<String>,
        size: u32,
        location: Point,
    ) -> Self {
        Self {
            id: id.into(),
            font_family: font_family.into(),
            content: content.into(),
            size,
            color: None,
            location,
        }
    }

    /// Set the text color.
    #[must_use]
    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = Some(color);
        self
    }
}

/// One complete state payload, ready for encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Window configuration.
    pub window: WindowConfig,
    /// Drawable entities, in draw order.
    #[serde(default)]
    pub sprites: Vec<Sprite>,
    /// Text overlays, drawn after sprites.
    #[serde(default)]
    pub text: Vec<TextOverlay>,
    /// Target frame rate for both sides.
    pub fps: u32,
    /// Font used by overlays that name no loadable family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_font: Option<String>,
}

impl Snapshot {
    /// Create an empty scene for the given window.
    pub fn new(window: WindowConfig, fps: u32) -> Self {
        Self {
            window,
            sprites: Vec::new(),
            text: Vec::new(),
            fps,
            default_font: None,
        }
    }

    /// Add a sprite.
    #[must_use]
    pub fn with_sprite(mut self, sprite: Sprite) -> Self {
        self.sprites.push(sprite);
        self
    }

    /// Add a text overlay.
    #[must_use]
    pub fn with_text(mut self, text: TextOverlay) -> Self {
        self.text.push(text);
        self
    }

    /// Set the default font.
    #[must_use]
    pub fn with_default_font(mut self, font: impl Into<String>) -> Self {
        self.default_font = Some(font.into());
        self
    }
}

/// The controller-owned producer of snapshots.
///
/// The push loop calls [`snapshot`](StateSource::snapshot) exactly once per
/// tick, on its own thread. Implementations may mutate their scene between
/// calls; the bridge never writes back.
pub trait StateSource {
    /// Capture the current state.
    fn snapshot(&mut self) -> Snapshot;
}

impl<F> StateSource for F
where
    F: FnMut() -> Snapshot,
{
    fn snapshot(&mut self) -> Snapshot {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_omitted() {
        let snapshot = Snapshot::new(WindowConfig::new(800, 600, "T", "bg.png", "ic.png"), 30)
            .with_text(TextOverlay::new("t", "Mono", "hi", 12, Point::new(1, 2)));
        let value = serde_json::to_value(&snapshot).unwrap();

        assert!(value.get("default_font").is_none());
        assert!(value["text"][0].get("color").is_none());
        assert_eq!(value["window"]["icon_path"], "ic.png");
    }

    #[test]
    fn test_missing_optional_fields_deserialize() {
        let json = r#"{
            "window": {"width": 1, "height": 2, "title": "", "background": "", "icon_path": ""},
            "fps": 5
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();

        assert!(snapshot.sprites.is_empty());
        assert!(snapshot.text.is_empty());
        assert_eq!(snapshot.default_font, None);
        assert_eq!(snapshot.fps, 5);
    }

    #[test]
    fn test_sprite_move() {
        let mut sprite = Sprite::new("a", ["i.png"], Point::new(10, 10), Size::new(32, 32));
        assert_eq!(sprite.frame_rate, DEFAULT_SPRITE_FRAME_RATE);

        sprite.move_to(11, 12);
        assert_eq!(sprite.location, Point::new(11, 12));
    }

    #[test]
    fn test_closure_is_state_source() {
        let mut ticks = 0;
        let mut source = || {
            ticks += 1;
            Snapshot::new(WindowConfig::default(), ticks)
        };

        assert_eq!(source.snapshot().fps, 1);
        assert_eq!(source.snapshot().fps, 2);
    }
}
