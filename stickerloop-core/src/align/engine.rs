use std::fmt;

use image::{RgbaImage, imageops};
use rayon::prelude::*;

use crate::align::strategy::{
    AlignMode, AlignRequest, AlignStrategy, FrameReference, VerticalRule, resolve_strategy,
};
use crate::foundation::core::{BoundingBox, Frame, PasteOffset};
use crate::foundation::error::{StickerError, StickerResult};
use crate::geometry::analyze::{FrameGeometry, measure_frames};

/// Alignment settings for one run.
#[derive(Clone, Debug, Default)]
pub struct AlignOptions {
    /// Which strategy to use and its vertical anchor.
    pub request: AlignRequest,
    /// Forced canvas width; computed from the frames when `None`.
    pub canvas_width: Option<u32>,
    /// Forced canvas height; computed from the frames when `None`.
    pub canvas_height: Option<u32>,
}

/// Shared output canvas, computed once per run and read-only afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasSpec {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Horizontal target column for every reference.
    pub center_x: f64,
    /// Vertical target row for centered references.
    pub center_y: f64,
    /// Row that pinned references land on (bottom/top vertical anchoring).
    pub pin_y: Option<f64>,
}

impl CanvasSpec {
    /// Canvas point that every frame's reference is mapped onto.
    pub fn target(&self) -> (f64, f64) {
        (self.center_x, self.pin_y.unwrap_or(self.center_y))
    }
}

/// Diagnostic record for one placed frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FramePlacement {
    /// Frame ordinal.
    pub index: usize,
    /// Frame filename.
    pub key: String,
    /// Strategy actually applied to this frame.
    pub mode: AlignMode,
    /// Source bbox, in the original frame's pixel space.
    pub bbox: BoundingBox,
    /// Translation applied to the whole source frame.
    pub offset: PasteOffset,
    /// True when part of the translated bbox falls outside the canvas.
    pub clipped: bool,
}

impl fmt::Display for FramePlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: mode={} bbox={} paste={}",
            self.key, self.mode, self.bbox, self.offset
        )?;
        if self.clipped {
            f.write_str(" clipped")?;
        }
        Ok(())
    }
}

/// Result of pass 1 plus placement: the canvas and one placement per frame.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignPlan {
    /// Mode of the run.
    pub mode: AlignMode,
    /// Shared canvas.
    pub canvas: CanvasSpec,
    /// One placement per frame, in input order.
    pub placements: Vec<FramePlacement>,
}

/// Aligned frames with their plan.
#[derive(Clone, Debug)]
pub struct AlignOutcome {
    /// Canvas and per-frame placements.
    pub plan: AlignPlan,
    /// Frames composited onto the canvas, in input order.
    pub frames: Vec<Frame>,
}

/// Size the shared canvas from every frame's reference point.
///
/// Per axis the canvas holds the largest extent on each side of the reference. Centered axes
/// take twice the larger side, pinned rows take the sum, so every translated bbox fits.
pub fn plan_canvas(
    geoms: &[FrameGeometry],
    refs: &[FrameReference],
    rule: VerticalRule,
    forced_width: Option<u32>,
    forced_height: Option<u32>,
) -> StickerResult<CanvasSpec> {
    if geoms.is_empty() {
        return Err(StickerError::validation("cannot align an empty frame set"));
    }
    if geoms.len() != refs.len() {
        return Err(StickerError::validation(format!(
            "{} references for {} frames",
            refs.len(),
            geoms.len()
        )));
    }
    if forced_width == Some(0) || forced_height == Some(0) {
        return Err(StickerError::validation("canvas override must be non-zero"));
    }

    let mut left = 0.0f64;
    let mut right = 0.0f64;
    let mut above = 0.0f64;
    let mut below = 0.0f64;
    for (geom, r) in geoms.iter().zip(refs) {
        left = left.max(r.x - f64::from(geom.bbox.x1));
        right = right.max(f64::from(geom.bbox.x2) - r.x);
        above = above.max(r.y - f64::from(geom.bbox.y1));
        below = below.max(f64::from(geom.bbox.y2) - r.y);
    }

    let width = match forced_width {
        Some(w) => w,
        None => extent_u32(2.0 * left.max(right))?,
    };
    let (height, pin_y) = match (rule, forced_height) {
        (VerticalRule::Centered, Some(h)) => (h, None),
        (VerticalRule::Centered, None) => (extent_u32(2.0 * above.max(below))?, None),
        (VerticalRule::Pinned, None) => {
            let pin = above.ceil();
            (extent_u32(pin + below.ceil())?, Some(pin))
        }
        (VerticalRule::Pinned, Some(h)) => {
            let span = above + below;
            let pin = if span > 0.0 {
                (f64::from(h) * above / span).round()
            } else {
                f64::from(h)
            };
            (h, Some(pin))
        }
    };

    Ok(CanvasSpec {
        width,
        height,
        center_x: f64::from(width) / 2.0,
        center_y: f64::from(height) / 2.0,
        pin_y,
    })
}

/// Pass 2: one paste offset per frame, mapping its reference onto the canvas target.
pub fn place_frames(
    geoms: &[FrameGeometry],
    refs: &[FrameReference],
    canvas: &CanvasSpec,
) -> Vec<FramePlacement> {
    let (tx, ty) = canvas.target();
    geoms
        .iter()
        .zip(refs)
        .map(|(geom, r)| {
            let offset = PasteOffset {
                dx: (tx - r.x).round() as i64,
                dy: (ty - r.y).round() as i64,
            };
            let (x1, y1, x2, y2) = geom.bbox.translated(offset);
            let clipped =
                x1 < 0 || y1 < 0 || x2 > i64::from(canvas.width) || y2 > i64::from(canvas.height);
            if clipped {
                tracing::warn!(frame = %geom.key, bbox = %geom.bbox, %offset, "frame clipped by canvas");
            }
            FramePlacement {
                index: geom.index,
                key: geom.key.clone(),
                mode: r.mode,
                bbox: geom.bbox,
                offset,
                clipped,
            }
        })
        .collect()
}

/// Compute canvas and placements for already-measured frames.
pub fn plan_alignment(
    geoms: &[FrameGeometry],
    strategy: &dyn AlignStrategy,
    opts: &AlignOptions,
) -> StickerResult<AlignPlan> {
    let refs = geoms
        .iter()
        .map(|g| strategy.reference(g))
        .collect::<Vec<_>>();
    let canvas = plan_canvas(
        geoms,
        &refs,
        strategy.vertical_rule(),
        opts.canvas_width,
        opts.canvas_height,
    )?;
    let placements = place_frames(geoms, &refs, &canvas);
    Ok(AlignPlan {
        mode: strategy.mode(),
        canvas,
        placements,
    })
}

/// Paste a frame's foreground onto a fresh transparent canvas.
///
/// Only the bbox region is copied, so sub-threshold noise outside it never reaches the output.
pub fn composite(frame: &Frame, canvas: &CanvasSpec, placement: &FramePlacement) -> Frame {
    let mut out = RgbaImage::new(canvas.width, canvas.height);
    let bbox = placement.bbox;
    let cropped = imageops::crop_imm(&frame.image, bbox.x1, bbox.y1, bbox.width(), bbox.height())
        .to_image();
    let (x, y, _, _) = bbox.translated(placement.offset);
    imageops::replace(&mut out, &cropped, x, y);
    frame.with_image(out)
}

/// Two-pass alignment: measure every frame, then size the canvas and place each frame.
///
/// Placement starts only after pass 1 has produced geometry for all frames.
#[tracing::instrument(skip(frames, opts), fields(frames = frames.len()))]
pub fn align_frames(frames: &[Frame], opts: &AlignOptions) -> StickerResult<AlignOutcome> {
    let geoms = measure_frames(frames)?;
    let strategy = resolve_strategy(&opts.request);
    let plan = plan_alignment(&geoms, strategy.as_ref(), opts)?;
    tracing::info!(
        mode = plan.mode.label(),
        width = plan.canvas.width,
        height = plan.canvas.height,
        "alignment canvas planned"
    );

    let aligned = frames
        .par_iter()
        .zip(plan.placements.par_iter())
        .map(|(frame, placement)| composite(frame, &plan.canvas, placement))
        .collect::<Vec<_>>();
    Ok(AlignOutcome {
        plan,
        frames: aligned,
    })
}

fn extent_u32(v: f64) -> StickerResult<u32> {
    let v = v.ceil().max(1.0);
    if v > f64::from(u32::MAX) {
        return Err(StickerError::validation(format!(
            "canvas extent {v} out of range"
        )));
    }
    Ok(v as u32)
}

#[cfg(test)]
#[path = "../../tests/unit/align/engine.rs"]
mod tests;
