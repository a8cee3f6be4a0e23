use std::collections::HashMap;

use image::{Rgba, RgbaImage};

use crate::foundation::error::{StickerError, StickerResult};

/// Largest palette an indexed PNG can carry.
pub const MAX_PALETTE: usize = 256;

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];
/// Alpha range counts double when picking a split axis, so feathered edges keep their steps.
const ALPHA_AXIS_WEIGHT: u32 = 2;

/// Frames re-expressed as indices into one shared RGBA palette.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedFrames {
    /// Width shared by every frame.
    pub width: u32,
    /// Height shared by every frame.
    pub height: u32,
    /// At most [`MAX_PALETTE`] entries.
    pub palette: Vec<[u8; 4]>,
    /// One index buffer per frame, row-major.
    pub indices: Vec<Vec<u8>>,
}

impl IndexedFrames {
    /// Expand one frame back to RGBA.
    pub fn to_rgba(&self, frame: usize) -> Option<RgbaImage> {
        let indices = self.indices.get(frame)?;
        let mut img = RgbaImage::new(self.width, self.height);
        for (px, &i) in img.pixels_mut().zip(indices) {
            *px = Rgba(self.palette.get(usize::from(i)).copied().unwrap_or(TRANSPARENT));
        }
        Some(img)
    }

    /// Expand every frame back to RGBA.
    pub fn to_rgba_frames(&self) -> Vec<RgbaImage> {
        (0..self.indices.len()).filter_map(|i| self.to_rgba(i)).collect()
    }

    /// `(PLTE, tRNS)` byte payloads; tRNS is trimmed after the last non-opaque entry.
    pub fn png_palette(&self) -> (Vec<u8>, Vec<u8>) {
        let plte = self
            .palette
            .iter()
            .flat_map(|c| [c[0], c[1], c[2]])
            .collect::<Vec<_>>();
        let mut trns = self.palette.iter().map(|c| c[3]).collect::<Vec<_>>();
        while trns.last() == Some(&255) {
            trns.pop();
        }
        (plte, trns)
    }
}

/// Reduce a set of same-sized frames to one shared palette of at most `max_colors` entries.
///
/// Fully transparent pixels collapse to a single `[0, 0, 0, 0]` entry. When the frames already
/// hold no more than `max_colors` distinct colors the palette is exact; otherwise median cut
/// over RGBA picks the entries. Never produces more colors than the input holds.
pub fn quantize_frames(frames: &[RgbaImage], max_colors: usize) -> StickerResult<IndexedFrames> {
    let Some(first) = frames.first() else {
        return Err(StickerError::validation("cannot quantize zero frames"));
    };
    if !(1..=MAX_PALETTE).contains(&max_colors) {
        return Err(StickerError::validation(format!(
            "palette size must be within 1..={MAX_PALETTE}, got {max_colors}"
        )));
    }
    let (width, height) = first.dimensions();
    if frames.iter().any(|f| f.dimensions() != (width, height)) {
        return Err(StickerError::validation(
            "all frames must share one size to share a palette",
        ));
    }

    let mut histogram = HashMap::<[u8; 4], u64>::new();
    for px in frames.iter().flat_map(|f| f.pixels()) {
        *histogram.entry(canonical(px.0)).or_default() += 1;
    }
    let has_transparent = histogram.remove(&TRANSPARENT).is_some();
    let mut colors = histogram.into_iter().collect::<Vec<_>>();
    colors.sort_unstable_by_key(|&(c, _)| c);

    let budget = max_colors - usize::from(has_transparent);
    let mut palette = Vec::with_capacity(max_colors);
    let mut lookup = HashMap::<[u8; 4], u8>::with_capacity(colors.len() + 1);
    if has_transparent {
        lookup.insert(TRANSPARENT, 0);
        palette.push(TRANSPARENT);
    }

    if colors.len() <= budget {
        for (c, _) in &colors {
            lookup.insert(*c, palette.len() as u8);
            palette.push(*c);
        }
    } else if budget > 0 {
        for bucket in median_cut(colors, budget) {
            let index = palette.len() as u8;
            palette.push(bucket.mean());
            for (c, _) in &bucket.colors {
                lookup.insert(*c, index);
            }
        }
    } else {
        // Only the transparent slot fits; every color maps onto it.
        for (c, _) in &colors {
            lookup.insert(*c, 0);
        }
    }

    let indices = frames
        .iter()
        .map(|f| {
            f.pixels()
                .map(|px| lookup.get(&canonical(px.0)).copied().unwrap_or(0))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    tracing::debug!(colors = palette.len(), "quantized frames to shared palette");

    Ok(IndexedFrames {
        width,
        height,
        palette,
        indices,
    })
}

fn canonical(c: [u8; 4]) -> [u8; 4] {
    if c[3] == 0 { TRANSPARENT } else { c }
}

struct Bucket {
    colors: Vec<([u8; 4], u64)>,
    /// Widest channel and its weighted range, fixed at construction.
    axis: usize,
    range: u32,
    population: u64,
}

impl Bucket {
    fn new(colors: Vec<([u8; 4], u64)>) -> Self {
        let (axis, range) = widest_axis(&colors);
        let population = colors.iter().map(|(_, n)| n).sum();
        Self {
            colors,
            axis,
            range,
            population,
        }
    }

    fn mean(&self) -> [u8; 4] {
        let total = self.population.max(1);
        let mut sums = [0u64; 4];
        for (c, n) in &self.colors {
            for ch in 0..4 {
                sums[ch] += u64::from(c[ch]) * n;
            }
        }
        sums.map(|s| ((s + total / 2) / total) as u8)
    }

    /// Split at the population median along the widest axis; both halves are non-empty.
    fn split(self) -> (Bucket, Bucket) {
        let axis = self.axis;
        let mut colors = self.colors;
        colors.sort_unstable_by_key(|&(c, _)| (c[axis], c));
        let half = self.population / 2;
        let mut acc = 0u64;
        let mut cut = 1;
        for (i, (_, n)) in colors.iter().enumerate() {
            acc += n;
            if acc >= half {
                cut = i + 1;
                break;
            }
        }
        let cut = cut.clamp(1, colors.len() - 1);
        let upper = colors.split_off(cut);
        (Bucket::new(colors), Bucket::new(upper))
    }
}

/// Widest channel as `(channel, weighted range)`.
fn widest_axis(colors: &[([u8; 4], u64)]) -> (usize, u32) {
    let mut lo = [u8::MAX; 4];
    let mut hi = [u8::MIN; 4];
    for (c, _) in colors {
        for ch in 0..4 {
            lo[ch] = lo[ch].min(c[ch]);
            hi[ch] = hi[ch].max(c[ch]);
        }
    }
    (0..4)
        .map(|ch| {
            let range = u32::from(hi[ch].saturating_sub(lo[ch]));
            let range = if ch == 3 { range * ALPHA_AXIS_WEIGHT } else { range };
            (ch, range)
        })
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .unwrap_or((0, 0))
}

fn median_cut(colors: Vec<([u8; 4], u64)>, target: usize) -> Vec<Bucket> {
    let mut buckets = vec![Bucket::new(colors)];
    while buckets.len() < target {
        let candidate = buckets
            .iter()
            .enumerate()
            .filter(|(_, b)| b.colors.len() > 1)
            .max_by(|(ia, a), (ib, b)| {
                (a.range, a.population)
                    .cmp(&(b.range, b.population))
                    .then(ib.cmp(ia))
            })
            .map(|(i, _)| i);
        let Some(i) = candidate else {
            break;
        };
        let (lo, hi) = buckets.swap_remove(i).split();
        buckets.push(lo);
        buckets.push(hi);
    }
    buckets.sort_by_key(|b| b.colors.first().map(|(c, _)| *c));
    buckets
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/quantize.rs"]
mod tests;
