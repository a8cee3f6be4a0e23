use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::Rgb8;
use crate::foundation::error::{StickerError, StickerResult};
use crate::matte::background::BackgroundSpec;

/// Upstream animation spec. Only background mode, chroma key and the ordered frame
/// descriptions matter here; everything else is carried through untouched.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationSpec {
    /// Upstream background mode; `transparent` plus a chroma key selects chroma keying.
    #[serde(default = "default_background")]
    pub background: String,
    /// Key color as `#RRGGBB`.
    #[serde(default)]
    pub chroma_key: Option<String>,
    /// One generator prompt per frame, in playback order.
    #[serde(default)]
    pub frame_prompts: Vec<String>,
    /// Everything else, carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_background() -> String {
    "transparent".to_string()
}

impl AnimationSpec {
    /// Parse a spec from JSON text.
    pub fn from_json_str(json: &str) -> StickerResult<Self> {
        serde_json::from_str(json).map_err(|e| StickerError::serde(format!("animation spec: {e}")))
    }

    /// Read and parse a spec file.
    pub fn from_path(path: &Path) -> StickerResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read animation spec '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Number of frames the upstream generator was asked for.
    pub fn frame_count(&self) -> usize {
        self.frame_prompts.len()
    }

    /// Background removal mode declared by this animation file.
    ///
    /// A transparent background with a chroma key keys that color; without one the border
    /// is sampled. Any other background is also sampled from the border.
    pub fn background_spec(&self) -> StickerResult<BackgroundSpec> {
        match (self.background.as_str(), self.chroma_key.as_deref()) {
            ("transparent", Some(key)) => Ok(BackgroundSpec::Chroma(key.parse::<Rgb8>()?)),
            _ => Ok(BackgroundSpec::Auto),
        }
    }
}
