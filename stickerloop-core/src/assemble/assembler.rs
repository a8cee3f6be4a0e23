use image::{RgbaImage, imageops};
use rayon::prelude::*;

use crate::assemble::apng::{FramePixels, encode_apng};
use crate::assemble::quantize::{MAX_PALETTE, quantize_frames};
use crate::foundation::core::Frame;
use crate::foundation::error::{StickerError, StickerResult};
use crate::report::loop_score::{LoopScore, score_sequence};
use crate::report::validate::MAX_STICKER_BYTES;
use crate::timing::curve::TimingCurve;

/// Assembly settings. The defaults loop forever and leave size untouched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssembleOptions {
    /// Reduce frames to one shared palette of at most 256 colors.
    pub quantize: bool,
    /// Scale down and re-encode while over `size_budget`.
    pub auto_resize: bool,
    /// APNG play count; 0 loops forever.
    pub loop_count: u32,
    /// Encoded size must be strictly below this.
    pub size_budget: u64,
    /// Resize attempts before giving up on the budget.
    pub max_resize_attempts: u32,
    /// Linear scale applied per resize attempt.
    pub resize_step: f64,
    /// Downscale frames larger than this box before encoding, keeping aspect.
    pub fit_within: Option<(u32, u32)>,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            quantize: false,
            auto_resize: false,
            loop_count: 0,
            size_budget: MAX_STICKER_BYTES,
            max_resize_attempts: 3,
            resize_step: 0.8,
            fit_within: None,
        }
    }
}

/// The encoded animation and its derived metrics.
#[derive(Clone, Debug)]
pub struct AnimationArtifact {
    /// Encoded PNG/APNG file contents.
    pub bytes: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Number of encoded frames.
    pub frame_count: usize,
    /// Per-frame display durations.
    pub timing: TimingCurve,
    /// Whether frames were encoded against a shared palette.
    pub quantized: bool,
    /// Number of auto-resize attempts that were encoded (0 = original size).
    pub resize_attempts: u32,
    /// Seam score computed from the frames as encoded.
    pub loop_score: Option<LoopScore>,
}

impl AnimationArtifact {
    /// Encoded size in bytes.
    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// One loop of the animation, in milliseconds.
    pub fn total_duration_ms(&self) -> u64 {
        self.timing.total_ms()
    }
}

/// Whether the artifact met the size budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BudgetOutcome {
    /// Strictly below the budget.
    Within,
    /// Still over budget after the resize passes.
    Exceeded {
        /// Resize passes made; 0 without auto-resize.
        attempts: u32,
    },
}

/// The final artifact and how it fared against the size budget.
#[derive(Clone, Debug)]
pub struct AssembleOutcome {
    /// Last encoded artifact, kept even when over budget.
    pub artifact: AnimationArtifact,
    /// Budget verdict.
    pub budget: BudgetOutcome,
    /// Budget the artifact was measured against, in bytes.
    pub size_budget: u64,
}

impl AssembleOutcome {
    /// [`StickerError::SizeBudget`] when auto-resize ran out of attempts, for callers that treat
    /// it as fatal after reporting.
    pub fn budget_error(&self) -> Option<StickerError> {
        match self.budget {
            BudgetOutcome::Exceeded { attempts } if attempts > 0 => Some(StickerError::SizeBudget {
                size: self.artifact.byte_size(),
                budget: self.size_budget,
                attempts,
            }),
            _ => None,
        }
    }
}

/// Encode ordered, equally sized frames with their timing into one animation.
///
/// Timing is checked against the frame count before any pixel work. With `auto_resize`, an
/// over-budget result is re-encoded from the source frames at `resize_step^k` of their size
/// for `k = 1..=max_resize_attempts`; exhaustion keeps the last attempt and reports
/// [`BudgetOutcome::Exceeded`].
#[tracing::instrument(skip(frames, timing, opts), fields(frames = frames.len()))]
pub fn assemble(
    frames: &[Frame],
    timing: &TimingCurve,
    opts: &AssembleOptions,
) -> StickerResult<AssembleOutcome> {
    if frames.is_empty() {
        return Err(StickerError::validation("no frames to assemble"));
    }
    if timing.len() != frames.len() {
        return Err(StickerError::TimingMismatch {
            expected: frames.len(),
            got: timing.len(),
        });
    }
    let (w0, h0) = frames[0].dimensions();
    if let Some(odd) = frames.iter().find(|f| f.dimensions() != (w0, h0)) {
        let (w, h) = odd.dimensions();
        return Err(StickerError::validation(format!(
            "frame '{}' is {w}x{h}, expected {w0}x{h0}; align frames first",
            odd.key
        )));
    }

    let mut base = frames.iter().map(|f| f.image.clone()).collect::<Vec<_>>();
    if let Some((max_w, max_h)) = opts.fit_within {
        let (w, h) = fitted_size(w0, h0, max_w, max_h);
        if (w, h) != (w0, h0) {
            tracing::info!(from_w = w0, from_h = h0, to_w = w, to_h = h, "fitting frames to limits");
            base = resize_all(&base, w, h);
        }
    }

    let (mut artifact, mut shown) = encode_frames(&base, timing, opts, 0)?;
    tracing::info!(bytes = artifact.byte_size(), width = artifact.width, height = artifact.height, "encoded animation");
    if artifact.byte_size() < opts.size_budget {
        return Ok(finish(artifact, &shown, BudgetOutcome::Within, opts));
    }
    if !opts.auto_resize {
        return Ok(finish(artifact, &shown, BudgetOutcome::Exceeded { attempts: 0 }, opts));
    }

    let (bw, bh) = (artifact.width, artifact.height);
    for attempt in 1..=opts.max_resize_attempts {
        let scale = opts.resize_step.powi(attempt as i32);
        let w = ((f64::from(bw) * scale).floor() as u32).max(1);
        let h = ((f64::from(bh) * scale).floor() as u32).max(1);
        tracing::warn!(
            attempt,
            bytes = artifact.byte_size(),
            budget = opts.size_budget,
            width = w,
            height = h,
            "over size budget; scaling down"
        );
        (artifact, shown) = encode_frames(&resize_all(&base, w, h), timing, opts, attempt)?;
        if artifact.byte_size() < opts.size_budget {
            return Ok(finish(artifact, &shown, BudgetOutcome::Within, opts));
        }
    }
    tracing::warn!(bytes = artifact.byte_size(), budget = opts.size_budget, "size budget still exceeded after auto-resize");
    let budget = BudgetOutcome::Exceeded {
        attempts: opts.max_resize_attempts,
    };
    Ok(finish(artifact, &shown, budget, opts))
}

/// Largest size within `max_w × max_h` keeping aspect; never upscales.
pub fn fitted_size(w: u32, h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if w <= max_w && h <= max_h {
        return (w, h);
    }
    let scale = (f64::from(max_w) / f64::from(w)).min(f64::from(max_h) / f64::from(h));
    (
        ((f64::from(w) * scale).floor() as u32).clamp(1, max_w.max(1)),
        ((f64::from(h) * scale).floor() as u32).clamp(1, max_h.max(1)),
    )
}

fn resize_all(frames: &[RgbaImage], w: u32, h: u32) -> Vec<RgbaImage> {
    frames
        .par_iter()
        .map(|f| imageops::resize(f, w, h, imageops::FilterType::Lanczos3))
        .collect()
}

fn encode_frames(
    frames: &[RgbaImage],
    timing: &TimingCurve,
    opts: &AssembleOptions,
    resize_attempts: u32,
) -> StickerResult<(AnimationArtifact, Vec<RgbaImage>)> {
    let (width, height) = frames.first().map(|f| f.dimensions()).unwrap_or((0, 0));
    let (bytes, shown) = if opts.quantize {
        let indexed = quantize_frames(frames, MAX_PALETTE)?;
        let bytes = encode_apng(FramePixels::Indexed(&indexed), timing, opts.loop_count)?;
        (bytes, indexed.to_rgba_frames())
    } else {
        let bytes = encode_apng(FramePixels::Rgba(frames), timing, opts.loop_count)?;
        (bytes, frames.to_vec())
    };
    let artifact = AnimationArtifact {
        bytes,
        width,
        height,
        frame_count: frames.len(),
        timing: timing.clone(),
        quantized: opts.quantize,
        resize_attempts,
        loop_score: None,
    };
    Ok((artifact, shown))
}

/// Seal the outcome, scoring the loop seam on the frames exactly as encoded.
fn finish(
    mut artifact: AnimationArtifact,
    shown: &[RgbaImage],
    budget: BudgetOutcome,
    opts: &AssembleOptions,
) -> AssembleOutcome {
    artifact.loop_score = score_sequence(shown);
    AssembleOutcome {
        artifact,
        budget,
        size_budget: opts.size_budget,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/assembler.rs"]
mod tests;
