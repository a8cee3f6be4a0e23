use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{StickerError, StickerResult};

/// Externally supplied stabilization point for one frame, in original frame pixel space.
///
/// Only the four coordinates are interpreted; any other fields authored upstream are kept
/// verbatim in `extra`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnchorPoint {
    /// Stable column, usually the torso center.
    pub center_x: f64,
    /// Stable row held in centered mode.
    pub center_y: f64,
    /// Ground contact row, pinned by a bottom anchor.
    pub feet_y: f64,
    /// Top of the head, pinned by a top anchor.
    pub head_y: f64,
    /// Upstream fields this crate does not read.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AnchorPoint {
    /// Anchor with no extra fields.
    pub fn new(center_x: f64, center_y: f64, feet_y: f64, head_y: f64) -> Self {
        Self {
            center_x,
            center_y,
            feet_y,
            head_y,
            extra: BTreeMap::new(),
        }
    }
}

/// Anchor file contents: frame filename -> [`AnchorPoint`]. Partial coverage is allowed.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AnchorMap {
    entries: BTreeMap<String, AnchorPoint>,
}

impl AnchorMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an anchor map from JSON text.
    pub fn from_json_str(json: &str) -> StickerResult<Self> {
        let map: Self = serde_json::from_str(json)
            .map_err(|e| StickerError::serde(format!("anchor file: {e}")))?;
        for (key, pt) in &map.entries {
            let coords = [pt.center_x, pt.center_y, pt.feet_y, pt.head_y];
            if coords.iter().any(|v| !v.is_finite()) {
                return Err(StickerError::validation(format!(
                    "anchor for '{key}' has a non-finite coordinate"
                )));
            }
        }
        Ok(map)
    }

    /// Read and parse an anchor file.
    pub fn from_path(path: &Path) -> StickerResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read anchor file '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Set the anchor for one frame filename.
    pub fn insert(&mut self, key: impl Into<String>, point: AnchorPoint) {
        self.entries.insert(key.into(), point);
    }

    /// Anchor for a frame filename, if the file covers it.
    pub fn get(&self, key: &str) -> Option<&AnchorPoint> {
        self.entries.get(key)
    }

    /// Number of covered frames.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no frame is covered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/anchor.rs"]
mod tests;
