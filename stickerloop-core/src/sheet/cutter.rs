use image::{RgbaImage, imageops};

use crate::foundation::core::Frame;
use crate::foundation::error::{StickerError, StickerResult};
use crate::matte::background::{background_mask, estimate_background};

/// How a sprite sheet is partitioned into cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridSpec {
    /// Fixed `rows × cols` grid; `count` defaults to every cell.
    Explicit {
        /// Grid rows.
        rows: u32,
        /// Grid columns.
        cols: u32,
        /// Frames to keep, row-major.
        count: Option<u32>,
    },
    /// Infer rows/cols from background-colored divider bands.
    Auto {
        /// Frames to keep, row-major.
        count: Option<u32>,
    },
}

/// Tuning for grid auto-detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridDetectOptions {
    /// A row/column is a divider when more than this share of its pixels is background.
    pub divider_ratio: f64,
    /// Content runs thinner than this share of the sheet dimension are gridline artifacts.
    pub min_segment_ratio: f64,
    /// CIE76 ΔE within which a pixel matches the estimated background.
    pub tolerance: f32,
    /// Pixels below this alpha count as background regardless of color.
    pub transparent_alpha: u8,
    /// Border samples per edge when estimating the background.
    pub samples_per_edge: u32,
}

impl Default for GridDetectOptions {
    fn default() -> Self {
        Self {
            divider_ratio: 0.9,
            min_segment_ratio: 0.02,
            tolerance: 25.0,
            transparent_alpha: 16,
            samples_per_edge: 10,
        }
    }
}

/// A resolved grid: cell counts and the integer cell size used for slicing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SheetGrid {
    /// Grid rows.
    pub rows: u32,
    /// Grid columns.
    pub cols: u32,
    /// Cell width; leftover columns at the right edge are dropped.
    pub cell_width: u32,
    /// Cell height; leftover rows at the bottom edge are dropped.
    pub cell_height: u32,
}

impl SheetGrid {
    fn for_sheet(width: u32, height: u32, rows: u32, cols: u32) -> StickerResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(StickerError::validation("grid rows and cols must be at least 1"));
        }
        let cell_width = width / cols;
        let cell_height = height / rows;
        if cell_width == 0 || cell_height == 0 {
            return Err(StickerError::validation(format!(
                "{cols}x{rows} grid does not fit a {width}x{height} sheet"
            )));
        }
        Ok(Self {
            rows,
            cols,
            cell_width,
            cell_height,
        })
    }

    /// Total cell count.
    pub fn cells(&self) -> u32 {
        self.rows * self.cols
    }
}

/// Find the grid of a sprite sheet from its divider bands.
///
/// Fails with [`StickerError::AmbiguousGrid`] when no band structure is found, when it yields a
/// single cell, or when the content segments are not evenly spaced.
pub fn detect_grid(img: &RgbaImage, opts: &GridDetectOptions) -> StickerResult<SheetGrid> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(StickerError::ambiguous_grid("sheet is empty"));
    }

    let background = estimate_background(img, opts.samples_per_edge);
    let color_mask = background_mask(img, background, opts.tolerance);
    let is_bg = img
        .pixels()
        .zip(color_mask)
        .map(|(px, m)| px[3] < opts.transparent_alpha || m == 0)
        .collect::<Vec<_>>();

    let w = width as usize;
    let h = height as usize;
    let mut row_bg = vec![0u32; h];
    let mut col_bg = vec![0u32; w];
    for (i, &bg) in is_bg.iter().enumerate() {
        if bg {
            row_bg[i / w] += 1;
            col_bg[i % w] += 1;
        }
    }

    let row_dividers = row_bg
        .iter()
        .map(|&n| f64::from(n) > f64::from(width) * opts.divider_ratio)
        .collect::<Vec<_>>();
    let col_dividers = col_bg
        .iter()
        .map(|&n| f64::from(n) > f64::from(height) * opts.divider_ratio)
        .collect::<Vec<_>>();

    let row_segments = content_segments(&row_dividers, opts.min_segment_ratio);
    let col_segments = content_segments(&col_dividers, opts.min_segment_ratio);
    let rows = row_segments.len() as u32;
    let cols = col_segments.len() as u32;
    tracing::debug!(%background, rows, cols, "grid divider scan");

    if rows == 0 || cols == 0 {
        return Err(StickerError::ambiguous_grid(
            "no content separated by background bands",
        ));
    }
    if rows * cols < 2 {
        return Err(StickerError::ambiguous_grid(
            "no divider bands found; pass explicit rows and cols",
        ));
    }
    if !evenly_spaced(&row_segments, height) {
        return Err(StickerError::ambiguous_grid(format!(
            "{rows} row segments are not evenly spaced"
        )));
    }
    if !evenly_spaced(&col_segments, width) {
        return Err(StickerError::ambiguous_grid(format!(
            "{cols} column segments are not evenly spaced"
        )));
    }

    SheetGrid::for_sheet(width, height, rows, cols)
}

/// Slice a sprite sheet into frames, first `count` cells in row-major order.
///
/// Cells are emitted as-is: no background removal and no cropping.
pub fn cut_sheet(img: &RgbaImage, spec: &GridSpec) -> StickerResult<(SheetGrid, Vec<Frame>)> {
    let (width, height) = img.dimensions();
    let (grid, count) = match *spec {
        GridSpec::Explicit { rows, cols, count } => {
            (SheetGrid::for_sheet(width, height, rows, cols)?, count)
        }
        GridSpec::Auto { count } => {
            let grid = detect_grid(img, &GridDetectOptions::default())?;
            tracing::info!(rows = grid.rows, cols = grid.cols, "auto-detected grid");
            (grid, count)
        }
    };

    let count = count.unwrap_or(grid.cells());
    if count == 0 {
        return Err(StickerError::validation("frame count must be at least 1"));
    }
    if count > grid.cells() {
        return Err(StickerError::validation(format!(
            "count ({count}) exceeds grid cells ({})",
            grid.cells()
        )));
    }

    let frames = (0..count)
        .map(|idx| {
            let row = idx / grid.cols;
            let col = idx % grid.cols;
            let x = col * grid.cell_width;
            let y = row * grid.cell_height;
            let cell = imageops::crop_imm(img, x, y, grid.cell_width, grid.cell_height).to_image();
            let index = idx as usize;
            Frame::new(index, Frame::key_for(index), cell)
        })
        .collect();
    Ok((grid, frames))
}

/// Content runs `(start, end)` between divider bands, dropping runs thinner than
/// `min_ratio` of the axis length.
fn content_segments(dividers: &[bool], min_ratio: f64) -> Vec<(usize, usize)> {
    let min_len = ((dividers.len() as f64) * min_ratio).ceil().max(1.0) as usize;
    let mut out = Vec::new();
    let mut start = None;
    for (i, divider) in dividers.iter().copied().chain(std::iter::once(true)).enumerate() {
        match (divider, start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                if i - s >= min_len {
                    out.push((s, i));
                }
                start = None;
            }
            _ => {}
        }
    }
    out
}

/// Each segment's midpoint must fall inside its own cell of an even partition.
fn evenly_spaced(segments: &[(usize, usize)], len: u32) -> bool {
    let pitch = f64::from(len) / segments.len() as f64;
    segments.iter().enumerate().all(|(k, &(s, e))| {
        let mid = (s + e) as f64 / 2.0;
        (mid / pitch).floor() as usize == k
    })
}

#[cfg(test)]
#[path = "../../tests/unit/sheet/cutter.rs"]
mod tests;
