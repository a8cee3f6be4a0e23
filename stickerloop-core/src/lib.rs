//! Stickerloop turns independently generated still frames into one stable, looping animated
//! sticker.
//!
//! # Pipeline overview
//!
//! 1. **Cut** (optional): a sprite sheet is sliced into ordered frames ([`cut_sheet`]).
//! 2. **Normalize**: each frame's background is keyed out into alpha ([`normalize_frame`]).
//! 3. **Measure**: bbox, alpha-weighted centroid and pixel anchors per frame ([`measure_frames`]).
//! 4. **Align**: one shared [`CanvasSpec`] for the run, then one paste offset per frame
//!    ([`align_frames`]); placement never starts before every frame is measured.
//! 5. **Assemble**: frames plus a [`TimingCurve`] become an APNG, optionally quantized and
//!    auto-resized to meet the size budget ([`assemble()`]).
//! 6. **Report**: loop-seam score and per-rule publishing validation ([`ValidationReport`]).
//!
//! The path-based entry points in [`cut_sheet_to_dir`], [`align_dir`], [`combine_dir`] and
//! [`validate_file`] wire these stages to frame directories on disk.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod align;
mod assemble;
mod foundation;
mod frames;
mod geometry;
mod matte;
mod model;
mod pipeline;
mod report;
mod sheet;
mod timing;

pub use align::engine::{
    AlignOptions, AlignOutcome, AlignPlan, CanvasSpec, FramePlacement, align_frames, composite,
    place_frames, plan_alignment, plan_canvas,
};
pub use align::strategy::{
    AlignMode, AlignRequest, AlignStrategy, AnchorFileStrategy, BboxStrategy,
    BottomAnchorStrategy, FrameReference, PixelCentroidStrategy, TopAnchorStrategy, VerticalAnchor,
    VerticalRule, resolve_strategy,
};
pub use assemble::apng::{DecodedAnimation, FramePixels, decode_apng, encode_apng};
pub use assemble::assembler::{
    AnimationArtifact, AssembleOptions, AssembleOutcome, BudgetOutcome, assemble, fitted_size,
};
pub use assemble::quantize::{IndexedFrames, MAX_PALETTE, quantize_frames};
pub use foundation::core::{BoundingBox, Frame, PasteOffset, Rgb8};
pub use foundation::error::{StickerError, StickerResult};
pub use frames::store::{load_frame_dir, write_file_atomic, write_frame_dir};
pub use geometry::analyze::{
    ALPHA_NOISE_FLOOR, FrameGeometry, alpha_weighted_centroid, measure_frame, measure_frames,
    pixel_anchor_points, tight_bbox,
};
pub use matte::background::{
    BackgroundSpec, MatteOptions, estimate_background, normalize_frame, normalize_frames,
};
pub use model::anchor::{AnchorMap, AnchorPoint};
pub use model::animation::AnimationSpec;
pub use pipeline::{
    AlignDirOptions, CombineOptions, CombineSummary, CutOutcome, align_dir, combine_dir,
    cut_sheet_to_dir, validate_file,
};
pub use report::loop_score::{LOOP_WARN_THRESHOLD, LoopScore, loop_score, score_sequence};
pub use report::validate::{
    ConstraintCheck, ConstraintRule, MAX_STICKER_BYTES, Measurements, PublishLimits,
    StickerKind, ValidationReport, validate_decoded, validate_measurements,
};
pub use sheet::cutter::{GridDetectOptions, GridSpec, SheetGrid, cut_sheet, detect_grid};
pub use timing::curve::{
    DEFAULT_FPS, MIN_FRAME_MS, TimingCurve, TimingPreset, TimingSpec, TotalDuration,
};
