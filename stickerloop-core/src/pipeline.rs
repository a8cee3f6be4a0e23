use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::align::engine::{AlignOptions, AlignPlan, align_frames};
use crate::assemble::apng::decode_apng;
use crate::assemble::assembler::{AssembleOptions, AssembleOutcome, assemble};
use crate::foundation::error::StickerResult;
use crate::frames::store::{load_frame_dir, write_file_atomic, write_frame_dir};
use crate::matte::background::{MatteOptions, normalize_frames};
use crate::report::validate::{
    Measurements, PublishLimits, ValidationReport, validate_decoded, validate_measurements,
};
use crate::sheet::cutter::{GridSpec, SheetGrid, cut_sheet};
use crate::timing::curve::{TimingCurve, TimingSpec, TotalDuration};

/// Frames written by [`cut_sheet_to_dir`].
#[derive(Clone, Debug)]
pub struct CutOutcome {
    /// Grid the sheet was cut with.
    pub grid: SheetGrid,
    /// Written frame files, in playback order.
    pub paths: Vec<PathBuf>,
}

/// Cut a sprite sheet into `out_dir/frame_NNN.png`.
#[tracing::instrument(skip(spec))]
pub fn cut_sheet_to_dir(
    sheet: &Path,
    spec: &GridSpec,
    out_dir: &Path,
) -> StickerResult<CutOutcome> {
    let image = image::open(sheet)
        .with_context(|| format!("open sprite sheet '{}'", sheet.display()))?
        .to_rgba8();
    let (grid, frames) = cut_sheet(&image, spec)?;
    tracing::info!(
        rows = grid.rows,
        cols = grid.cols,
        cell_width = grid.cell_width,
        cell_height = grid.cell_height,
        frames = frames.len(),
        "cutting sprite sheet"
    );
    let paths = write_frame_dir(out_dir, &frames)?;
    Ok(CutOutcome { grid, paths })
}

/// Background removal plus alignment settings for [`align_dir`].
#[derive(Clone, Debug, Default)]
pub struct AlignDirOptions {
    /// Background removal.
    pub matte: MatteOptions,
    /// Strategy and canvas overrides.
    pub align: AlignOptions,
    /// Frame count declared upstream (e.g. by an animation spec's prompt list).
    pub expected_frames: Option<usize>,
}

/// Normalize backgrounds, align every frame onto one canvas, and write the result.
///
/// Returns the plan, whose placements are the per-frame diagnostic lines.
#[tracing::instrument(skip(opts))]
pub fn align_dir(
    frames_dir: &Path,
    out_dir: &Path,
    opts: &AlignDirOptions,
) -> StickerResult<AlignPlan> {
    let frames = load_frame_dir(frames_dir)?;
    if let Some(expected) = opts.expected_frames
        && expected != frames.len()
    {
        tracing::warn!(expected, found = frames.len(), "frame count differs from the animation spec");
    }
    let normalized = normalize_frames(&frames, &opts.matte)?;
    let outcome = align_frames(&normalized, &opts.align)?;
    write_frame_dir(out_dir, &outcome.frames)?;
    Ok(outcome.plan)
}

/// Timing, assembly and publishing limits for [`combine_dir`].
#[derive(Clone, Debug)]
pub struct CombineOptions {
    /// Total length distributed by a preset.
    pub total: TotalDuration,
    /// Preset or explicit per-frame list.
    pub timing: TimingSpec,
    /// Encoding, quantization and resize settings.
    pub assemble: AssembleOptions,
    /// Limits the written file is validated against.
    pub limits: PublishLimits,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            total: TotalDuration::default(),
            timing: TimingSpec::default(),
            assemble: AssembleOptions::default(),
            limits: PublishLimits::animated(),
        }
    }
}

/// Written artifact plus its assembly outcome and validation report.
#[derive(Clone, Debug)]
pub struct CombineSummary {
    /// Where the artifact was written.
    pub path: PathBuf,
    /// Artifact and budget verdict.
    pub outcome: AssembleOutcome,
    /// Per-rule validation of the artifact.
    pub report: ValidationReport,
}

/// Assemble a frame directory into one animated sticker at `out_path` and validate it.
///
/// The artifact is written even when it fails validation or the size budget; callers decide
/// what is fatal (see [`AssembleOutcome::budget_error`]).
#[tracing::instrument(skip(opts))]
pub fn combine_dir(
    frames_dir: &Path,
    out_path: &Path,
    opts: &CombineOptions,
) -> StickerResult<CombineSummary> {
    let frames = load_frame_dir(frames_dir)?;
    let timing = TimingCurve::build(frames.len(), opts.total, &opts.timing)?;
    tracing::info!(frames = frames.len(), total_ms = timing.total_ms(), "timing resolved");

    let outcome = assemble(&frames, &timing, &opts.assemble)?;
    write_file_atomic(out_path, &outcome.artifact.bytes)?;

    let artifact = &outcome.artifact;
    let measurements = Measurements {
        width: artifact.width,
        height: artifact.height,
        frame_count: artifact.frame_count as u32,
        duration_ms: artifact.total_duration_ms(),
        byte_size: artifact.byte_size(),
    };
    let report = ValidationReport {
        kind: opts.limits.kind,
        checks: validate_measurements(&measurements, &opts.limits),
        loop_score: artifact.loop_score,
    };
    Ok(CombineSummary {
        path: out_path.to_path_buf(),
        outcome,
        report,
    })
}

/// Validate an existing PNG/APNG file against publishing limits.
#[tracing::instrument]
pub fn validate_file(path: &Path, limits: &PublishLimits) -> StickerResult<ValidationReport> {
    let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
    let decoded = decode_apng(&bytes)?;
    Ok(validate_decoded(&decoded, limits))
}
