use image::RgbaImage;
use rayon::prelude::*;

use crate::foundation::core::{BoundingBox, Frame};
use crate::foundation::error::{StickerError, StickerResult};
use crate::model::anchor::AnchorPoint;

/// Alpha at or below this is treated as background noise.
pub const ALPHA_NOISE_FLOOR: u8 = 10;

/// Alpha at which a pixel counts as opaque for row-density scans.
const OPAQUE_ALPHA: u8 = 128;
const HEAD_ROW_DENSITY: f64 = 0.10;
const FEET_ROW_DENSITY: f64 = 0.15;

/// Per-frame geometry gathered in the first alignment pass.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameGeometry {
    /// Frame ordinal.
    pub index: usize,
    /// Frame filename.
    pub key: String,
    /// Source frame width.
    pub width: u32,
    /// Source frame height.
    pub height: u32,
    /// Tight bbox above the alpha noise floor.
    pub bbox: BoundingBox,
    /// Alpha-weighted center of mass.
    pub centroid: (f64, f64),
    /// Centroid plus row-density head/feet edges.
    pub pixel_anchor: AnchorPoint,
}

/// Smallest rectangle enclosing every pixel with alpha above [`ALPHA_NOISE_FLOOR`].
///
/// Fails with [`StickerError::EmptyFrame`] when the frame has no such pixel.
pub fn tight_bbox(frame: &Frame) -> StickerResult<BoundingBox> {
    bbox_above(&frame.image, ALPHA_NOISE_FLOOR).ok_or_else(|| StickerError::empty_frame(&frame.key))
}

/// `(Σ x·α, Σ y·α) / Σ α` over all pixels.
///
/// Mass-weighted, so a thin protruding limb barely moves it compared to the bbox center.
pub fn alpha_weighted_centroid(frame: &Frame) -> StickerResult<(f64, f64)> {
    let mut sum_x = 0u64;
    let mut sum_y = 0u64;
    let mut sum_a = 0u64;
    for (x, y, px) in frame.image.enumerate_pixels() {
        let a = u64::from(px[3]);
        sum_x += u64::from(x) * a;
        sum_y += u64::from(y) * a;
        sum_a += a;
    }
    if sum_a == 0 {
        return Err(StickerError::empty_frame(&frame.key));
    }
    Ok((sum_x as f64 / sum_a as f64, sum_y as f64 / sum_a as f64))
}

/// Anchor points derived from pixels alone: the alpha-weighted centroid for the center, and
/// row-density scans for the head (first row with at least 10% of the densest row's opaque
/// pixels) and feet (bottom edge of the last row with at least 15%).
///
/// Stray wisps at the top or bottom of the silhouette therefore do not move head/feet.
pub fn pixel_anchor_points(frame: &Frame) -> StickerResult<AnchorPoint> {
    let (center_x, center_y) = alpha_weighted_centroid(frame)?;

    let mut rows = row_counts(&frame.image, OPAQUE_ALPHA);
    if rows.iter().all(|&n| n == 0) {
        rows = row_counts(&frame.image, ALPHA_NOISE_FLOOR + 1);
    }
    let peak = rows.iter().copied().max().unwrap_or(0);
    if peak == 0 {
        return Err(StickerError::empty_frame(&frame.key));
    }
    let peak = f64::from(peak);

    let head_y = rows
        .iter()
        .position(|&n| f64::from(n) >= peak * HEAD_ROW_DENSITY)
        .unwrap_or(0);
    let feet_y = rows
        .iter()
        .rposition(|&n| f64::from(n) >= peak * FEET_ROW_DENSITY)
        .map(|row| row + 1)
        .unwrap_or(rows.len());

    Ok(AnchorPoint::new(
        center_x,
        center_y,
        feet_y as f64,
        head_y as f64,
    ))
}

/// Gather bbox, centroid and pixel anchors for one frame.
pub fn measure_frame(frame: &Frame) -> StickerResult<FrameGeometry> {
    let bbox = tight_bbox(frame)?;
    let centroid = alpha_weighted_centroid(frame)?;
    let pixel_anchor = pixel_anchor_points(frame)?;
    let (width, height) = frame.dimensions();
    tracing::debug!(frame = %frame.key, %bbox, cx = centroid.0, cy = centroid.1, "measured frame");
    Ok(FrameGeometry {
        index: frame.index,
        key: frame.key.clone(),
        width,
        height,
        bbox,
        centroid,
        pixel_anchor,
    })
}

/// Measure every frame (in parallel). Returns only once all frames are measured, so the
/// result is a complete view of the run; the first empty frame fails the whole call.
pub fn measure_frames(frames: &[Frame]) -> StickerResult<Vec<FrameGeometry>> {
    frames.par_iter().map(measure_frame).collect()
}

pub(crate) fn bbox_above(img: &RgbaImage, floor: u8) -> Option<BoundingBox> {
    let mut x1 = u32::MAX;
    let mut y1 = u32::MAX;
    let mut x2 = 0u32;
    let mut y2 = 0u32;
    for (x, y, px) in img.enumerate_pixels() {
        if px[3] > floor {
            x1 = x1.min(x);
            y1 = y1.min(y);
            x2 = x2.max(x + 1);
            y2 = y2.max(y + 1);
        }
    }
    if x1 == u32::MAX {
        return None;
    }
    Some(BoundingBox { x1, y1, x2, y2 })
}

fn row_counts(img: &RgbaImage, min_alpha: u8) -> Vec<u32> {
    img.rows()
        .map(|row| row.filter(|px| px[3] >= min_alpha).count() as u32)
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/analyze.rs"]
mod tests;
