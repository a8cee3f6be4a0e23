use std::fmt;

use image::{RgbaImage, imageops};

use crate::foundation::math::luma_u8;

/// Scores at or above this predict a visible jump at the loop seam.
pub const LOOP_WARN_THRESHOLD: f64 = 20.0;

const SAMPLE_SIZE: u32 = 64;

/// First/last frame dissimilarity on a 0-100 scale.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct LoopScore {
    /// 0 for identical frames, 100 for maximally different ones.
    pub value: f64,
}

impl LoopScore {
    /// True at or above [`LOOP_WARN_THRESHOLD`].
    pub fn warns(self) -> bool {
        self.value >= LOOP_WARN_THRESHOLD
    }
}

impl fmt::Display for LoopScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.warns() { "LOOP WARN" } else { "LOOP OK" };
        write!(f, "[{tag}] first/last frame difference {:.1}/100", self.value)?;
        if self.warns() {
            write!(
                f,
                " (>= {LOOP_WARN_THRESHOLD:.0} may jump at the loop point; bring the last pose closer to the first)"
            )?;
        }
        Ok(())
    }
}

/// Mean per-pixel difference of two frames, scaled to 0-100.
///
/// Both frames are resampled to 64x64 first; each pixel contributes the larger of the luma of
/// the absolute RGB difference and the absolute alpha difference. Symmetric in its arguments.
pub fn loop_score(first: &RgbaImage, last: &RgbaImage) -> LoopScore {
    let a = imageops::resize(first, SAMPLE_SIZE, SAMPLE_SIZE, imageops::FilterType::Lanczos3);
    let b = imageops::resize(last, SAMPLE_SIZE, SAMPLE_SIZE, imageops::FilterType::Lanczos3);
    let total = a
        .pixels()
        .zip(b.pixels())
        .map(|(p, q)| {
            let d = |ch: usize| p[ch].abs_diff(q[ch]);
            u64::from(luma_u8(d(0), d(1), d(2)).max(d(3)))
        })
        .sum::<u64>();
    let mean = total as f64 / f64::from(SAMPLE_SIZE * SAMPLE_SIZE);
    LoopScore {
        value: mean / 255.0 * 100.0,
    }
}

/// Score the seam of an ordered frame sequence; `None` for fewer than two frames.
pub fn score_sequence(frames: &[RgbaImage]) -> Option<LoopScore> {
    match frames {
        [first, .., last] => {
            let score = loop_score(first, last);
            if score.warns() {
                tracing::warn!(score = score.value, "loop seam may look abrupt");
            } else {
                tracing::info!(score = score.value, "loop seam ok");
            }
            Some(score)
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/report/loop_score.rs"]
mod tests;
