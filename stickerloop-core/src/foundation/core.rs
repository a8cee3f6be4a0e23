use std::fmt;
use std::str::FromStr;

use image::RgbaImage;

use crate::foundation::error::{StickerError, StickerResult};

/// One raster frame of an animation, keyed by its stable filename.
///
/// Stages never mutate a frame in place; each produces a new [`Frame`] that keeps the
/// source ordinal and key.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Ordinal position in the animation (0-based).
    pub index: usize,
    /// Stable filename key, e.g. `frame_000.png`.
    pub key: String,
    /// Straight (non-premultiplied) RGBA8 pixels.
    pub image: RgbaImage,
}

impl Frame {
    /// Build a frame from its parts.
    pub fn new(index: usize, key: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            index,
            key: key.into(),
            image,
        }
    }

    /// Canonical filename key for the frame at `index`: `frame_000.png`, `frame_001.png`, ...
    pub fn key_for(index: usize) -> String {
        format!("frame_{index:03}.png")
    }

    /// Derive a new frame with the same identity but different pixels.
    pub fn with_image(&self, image: RgbaImage) -> Self {
        Self {
            index: self.index,
            key: self.key.clone(),
            image,
        }
    }

    /// Pixel dimensions `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Tight rectangle around the foreground of a frame.
///
/// Half-open: `x2`/`y2` are exclusive, so `width = x2 - x1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    /// Left edge (inclusive).
    pub x1: u32,
    /// Top edge (inclusive).
    pub y1: u32,
    /// Right edge (exclusive).
    pub x2: u32,
    /// Bottom edge (exclusive).
    pub y2: u32,
}

impl BoundingBox {
    /// Build a bounding box, rejecting inverted edges.
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> StickerResult<Self> {
        if x1 > x2 || y1 > y2 {
            return Err(StickerError::validation(format!(
                "bounding box edges inverted: ({x1},{y1},{x2},{y2})"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Horizontal extent in pixels.
    pub fn width(self) -> u32 {
        self.x2 - self.x1
    }

    /// Vertical extent in pixels.
    pub fn height(self) -> u32 {
        self.y2 - self.y1
    }

    /// Geometric center in source pixel space.
    pub fn center(self) -> (f64, f64) {
        (
            f64::from(self.x1) + f64::from(self.width()) / 2.0,
            f64::from(self.y1) + f64::from(self.height()) / 2.0,
        )
    }

    /// Edges after applying a paste offset, as signed coordinates.
    pub fn translated(self, offset: PasteOffset) -> (i64, i64, i64, i64) {
        (
            i64::from(self.x1) + offset.dx,
            i64::from(self.y1) + offset.dy,
            i64::from(self.x2) + offset.dx,
            i64::from(self.y2) + offset.dy,
        )
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{},{})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Translation applied to a whole source frame when compositing onto the canvas.
///
/// Source pixel `(x, y)` lands at canvas pixel `(x + dx, y + dy)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PasteOffset {
    /// Horizontal shift in pixels.
    pub dx: i64,
    /// Vertical shift in pixels.
    pub dy: i64,
}

impl fmt::Display for PasteOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.dx, self.dy)
    }
}

/// Opaque sRGB color, used for chroma keys and estimated backgrounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as `[r, g, b]`.
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl FromStr for Rgb8 {
    type Err = StickerError;

    /// Parse `#RRGGBB` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(StickerError::validation(format!(
                "color '{s}' is not #RRGGBB"
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| StickerError::validation(format!("color '{s}' is not #RRGGBB")))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
