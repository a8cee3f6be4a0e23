use std::fmt;
use std::str::FromStr;

use crate::foundation::error::StickerError;
use crate::geometry::analyze::FrameGeometry;
use crate::model::anchor::{AnchorMap, AnchorPoint};

/// Which stable point of the subject is held fixed vertically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VerticalAnchor {
    /// The reference center lands on the canvas center.
    #[default]
    Center,
    /// The feet row is pinned to a shared canvas row.
    Bottom,
    /// The head row is pinned to a shared canvas row.
    Top,
}

impl FromStr for VerticalAnchor {
    type Err = StickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            "top" => Ok(Self::Top),
            other => Err(StickerError::validation(format!(
                "unknown vertical anchor '{other}' (expected center, bottom or top)"
            ))),
        }
    }
}

impl fmt::Display for VerticalAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Center => "center",
            Self::Bottom => "bottom",
            Self::Top => "top",
        })
    }
}

/// Placement strategy actually applied to a frame, reported in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignMode {
    /// Externally supplied per-frame anchor points.
    AnchorFile,
    /// Alpha-weighted centroid.
    Pixel,
    /// Bbox bottom edge pinned to a shared row.
    Bottom,
    /// Bbox center, or bbox top edge when the top is pinned.
    Bbox,
}

impl AlignMode {
    /// Stable name used in diagnostics and CLI output.
    pub fn label(self) -> &'static str {
        match self {
            Self::AnchorFile => "anchor-file",
            Self::Pixel => "pixel",
            Self::Bottom => "bottom",
            Self::Bbox => "bbox",
        }
    }
}

impl fmt::Display for AlignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the vertical reference coordinate maps onto the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerticalRule {
    /// Reference lands on the canvas center row.
    Centered,
    /// Reference lands on a fixed pin row shared by all frames.
    Pinned,
}

/// The point of one source frame that a strategy maps onto the canvas anchor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReference {
    /// Source column held on the canvas target.
    pub x: f64,
    /// Source row held on the canvas target.
    pub y: f64,
    /// Mode that produced this point (differs from the run's mode on anchor misses).
    pub mode: AlignMode,
}

/// A placement policy: chooses, per frame, which source point is held stable.
///
/// Strategies only pick reference points; canvas sizing and offsets are shared by all of
/// them, so every strategy gets the same fit guarantee.
pub trait AlignStrategy: Send + Sync {
    /// Mode reported for the run.
    fn mode(&self) -> AlignMode;

    /// Whether references are centered or pinned vertically.
    fn vertical_rule(&self) -> VerticalRule;

    /// Source point of this frame to hold stable.
    fn reference(&self, geom: &FrameGeometry) -> FrameReference;
}

/// Selection flags as a caller supplies them; more than one may be set.
#[derive(Clone, Debug, Default)]
pub struct AlignRequest {
    /// Parsed anchor file; selects anchor-file mode.
    pub anchors: Option<AnchorMap>,
    /// Select alpha-weighted centroid mode.
    pub pixel_centroid: bool,
    /// Select bottom-anchor mode.
    pub bottom_anchor: bool,
    /// Vertical anchor applied by the chosen mode.
    pub vertical: VerticalAnchor,
}

/// Pick the single strategy for a run: anchor-file > pixel-centroid > bottom-anchor > bbox.
///
/// In bbox mode a `Bottom` vertical anchor pins the bbox bottom (the bottom-anchor strategy)
/// and `Top` pins the bbox top.
pub fn resolve_strategy(request: &AlignRequest) -> Box<dyn AlignStrategy + '_> {
    let requested = usize::from(request.anchors.is_some())
        + usize::from(request.pixel_centroid)
        + usize::from(request.bottom_anchor);
    let strategy: Box<dyn AlignStrategy + '_> = if let Some(anchors) = &request.anchors {
        Box::new(AnchorFileStrategy {
            anchors,
            vertical: request.vertical,
        })
    } else if request.pixel_centroid {
        Box::new(PixelCentroidStrategy {
            vertical: request.vertical,
        })
    } else if request.bottom_anchor {
        Box::new(BottomAnchorStrategy)
    } else {
        match request.vertical {
            VerticalAnchor::Center => Box::new(BboxStrategy),
            VerticalAnchor::Bottom => Box::new(BottomAnchorStrategy),
            VerticalAnchor::Top => Box::new(TopAnchorStrategy),
        }
    };
    if requested > 1 {
        tracing::info!(
            mode = strategy.mode().label(),
            "several alignment modes requested; using the highest precedence"
        );
    }
    strategy
}

/// Default: each frame's bbox center lands on the canvas center.
#[derive(Clone, Copy, Debug, Default)]
pub struct BboxStrategy;

impl AlignStrategy for BboxStrategy {
    fn mode(&self) -> AlignMode {
        AlignMode::Bbox
    }

    fn vertical_rule(&self) -> VerticalRule {
        VerticalRule::Centered
    }

    fn reference(&self, geom: &FrameGeometry) -> FrameReference {
        let (x, y) = geom.bbox.center();
        FrameReference {
            x,
            y,
            mode: AlignMode::Bbox,
        }
    }
}

/// Ground contact stays fixed: the bbox bottom edge is pinned, x follows the bbox center.
#[derive(Clone, Copy, Debug, Default)]
pub struct BottomAnchorStrategy;

impl AlignStrategy for BottomAnchorStrategy {
    fn mode(&self) -> AlignMode {
        AlignMode::Bottom
    }

    fn vertical_rule(&self) -> VerticalRule {
        VerticalRule::Pinned
    }

    fn reference(&self, geom: &FrameGeometry) -> FrameReference {
        FrameReference {
            x: geom.bbox.center().0,
            y: f64::from(geom.bbox.y2),
            mode: AlignMode::Bottom,
        }
    }
}

/// Bbox placement with the top edge pinned to a shared canvas row.
#[derive(Clone, Copy, Debug, Default)]
pub struct TopAnchorStrategy;

impl AlignStrategy for TopAnchorStrategy {
    fn mode(&self) -> AlignMode {
        AlignMode::Bbox
    }

    fn vertical_rule(&self) -> VerticalRule {
        VerticalRule::Pinned
    }

    fn reference(&self, geom: &FrameGeometry) -> FrameReference {
        FrameReference {
            x: geom.bbox.center().0,
            y: f64::from(geom.bbox.y1),
            mode: AlignMode::Bbox,
        }
    }
}

/// Alpha-weighted centroid; feet/head rows come from row density.
#[derive(Clone, Copy, Debug)]
pub struct PixelCentroidStrategy {
    /// Which centroid-derived row is held.
    pub vertical: VerticalAnchor,
}

impl AlignStrategy for PixelCentroidStrategy {
    fn mode(&self) -> AlignMode {
        AlignMode::Pixel
    }

    fn vertical_rule(&self) -> VerticalRule {
        rule_for(self.vertical)
    }

    fn reference(&self, geom: &FrameGeometry) -> FrameReference {
        let anchor = &geom.pixel_anchor;
        FrameReference {
            x: anchor.center_x,
            y: anchor_row(anchor, self.vertical),
            mode: AlignMode::Pixel,
        }
    }
}

/// Externally verified anchor points; frames without an entry use their bbox.
#[derive(Clone, Copy, Debug)]
pub struct AnchorFileStrategy<'a> {
    /// Anchor entries keyed by frame filename.
    pub anchors: &'a AnchorMap,
    /// Which anchor row is held.
    pub vertical: VerticalAnchor,
}

impl AlignStrategy for AnchorFileStrategy<'_> {
    fn mode(&self) -> AlignMode {
        AlignMode::AnchorFile
    }

    fn vertical_rule(&self) -> VerticalRule {
        rule_for(self.vertical)
    }

    fn reference(&self, geom: &FrameGeometry) -> FrameReference {
        if let Some(anchor) = self.anchors.get(&geom.key) {
            return FrameReference {
                x: anchor.center_x,
                y: anchor_row(anchor, self.vertical),
                mode: AlignMode::AnchorFile,
            };
        }
        tracing::warn!(frame = %geom.key, "no anchor entry; falling back to bbox placement");
        let (x, center_y) = geom.bbox.center();
        let y = match self.vertical {
            VerticalAnchor::Center => center_y,
            VerticalAnchor::Bottom => f64::from(geom.bbox.y2),
            VerticalAnchor::Top => f64::from(geom.bbox.y1),
        };
        FrameReference {
            x,
            y,
            mode: AlignMode::Bbox,
        }
    }
}

fn rule_for(vertical: VerticalAnchor) -> VerticalRule {
    match vertical {
        VerticalAnchor::Center => VerticalRule::Centered,
        VerticalAnchor::Bottom | VerticalAnchor::Top => VerticalRule::Pinned,
    }
}

fn anchor_row(anchor: &AnchorPoint, vertical: VerticalAnchor) -> f64 {
    match vertical {
        VerticalAnchor::Center => anchor.center_y,
        VerticalAnchor::Bottom => anchor.feet_y,
        VerticalAnchor::Top => anchor.head_y,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/align/strategy.rs"]
mod tests;
