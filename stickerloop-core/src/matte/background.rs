use image::RgbaImage;
use lab::{Lab, rgb_bytes_to_labs};
use rayon::prelude::*;

use crate::foundation::core::{Frame, Rgb8};
use crate::foundation::error::StickerResult;
use crate::foundation::math::mul_div255_u8;
use crate::matte::feather::feather_alpha;

const MIN_SAMPLE_ALPHA: u8 = 8;
const CLUSTER_THRESHOLD: f32 = 8.0;
/// Frames whose minimum alpha is below this already carry transparency.
const EXISTING_ALPHA_CEILING: u8 = 250;

/// How the background of a raw frame is identified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum BackgroundSpec {
    /// Estimate the background from the dominant color of the border ring.
    #[default]
    Auto,
    /// Treat pixels close to this key color as background.
    Chroma(Rgb8),
}

/// Background removal settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatteOptions {
    /// How the background color is chosen.
    pub background: BackgroundSpec,
    /// Gaussian feather radius in pixels applied to the binary mask (0 = hard edges).
    pub feather_radius: f32,
    /// CIE76 ΔE within which a pixel matches an explicit chroma key.
    /// Light grey `(200,200,200)` sits near ΔE 19 from white and must stay opaque.
    pub chroma_tolerance: f32,
    /// CIE76 ΔE within which a pixel matches an auto-estimated background.
    pub auto_tolerance: f32,
    /// Border samples taken along each edge when estimating the background.
    pub samples_per_edge: u32,
}

impl Default for MatteOptions {
    fn default() -> Self {
        Self {
            background: BackgroundSpec::Auto,
            feather_radius: 0.0,
            chroma_tolerance: 14.0,
            auto_tolerance: 10.0,
            samples_per_edge: 10,
        }
    }
}

/// Remove the background of one frame, producing a new alpha-carrying frame.
///
/// In [`BackgroundSpec::Auto`] mode a frame that already has meaningful transparency is
/// returned unchanged. Pixels matching the background become fully transparent (with their
/// color zeroed), everything else keeps its color, and the resulting binary mask is
/// Gaussian-feathered by `feather_radius`.
pub fn normalize_frame(frame: &Frame, opts: &MatteOptions) -> StickerResult<Frame> {
    let img = &frame.image;
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Ok(frame.clone());
    }

    let (key, tolerance) = match opts.background {
        BackgroundSpec::Chroma(key) => (key, opts.chroma_tolerance),
        BackgroundSpec::Auto => {
            if has_transparency(img) {
                tracing::debug!(frame = %frame.key, "frame already transparent; keeping alpha");
                return Ok(frame.clone());
            }
            (
                estimate_background(img, opts.samples_per_edge),
                opts.auto_tolerance,
            )
        }
    };
    tracing::debug!(frame = %frame.key, background = %key, tolerance, "keying background");

    let mask = background_mask(img, key, tolerance);
    let mask = feather_alpha(&mask, width, height, opts.feather_radius)?;

    let mut out = img.clone();
    for (px, &m) in out.pixels_mut().zip(mask.iter()) {
        let a = mul_div255_u8(u16::from(px[3]), u16::from(m));
        px[3] = a;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
        }
    }
    Ok(frame.with_image(out))
}

/// Normalize every frame independently (in parallel), preserving order.
pub fn normalize_frames(frames: &[Frame], opts: &MatteOptions) -> StickerResult<Vec<Frame>> {
    frames
        .par_iter()
        .map(|frame| normalize_frame(frame, opts))
        .collect()
}

/// Estimate the background color from the border ring of an image.
///
/// Samples `samples_per_edge` points along each edge, clusters them in CIE Lab and returns the
/// heaviest cluster's centroid. Transparent samples are ignored; an image with no usable
/// samples reports black.
pub fn estimate_background(img: &RgbaImage, samples_per_edge: u32) -> Rgb8 {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Rgb8::new(0, 0, 0);
    }

    let samples_per_edge = samples_per_edge.max(1);
    let step_x = (width / samples_per_edge).max(1);
    let step_y = (height / samples_per_edge).max(1);

    let mut ring = Vec::<(u32, u32)>::new();
    for x in (0..width).step_by(step_x as usize) {
        ring.push((x, 0));
        ring.push((x, height - 1));
    }
    let mut y = step_y;
    while y + step_y <= height {
        ring.push((0, y));
        ring.push((width - 1, y));
        y += step_y;
    }

    let mut clusters: Vec<LabCluster> = Vec::with_capacity(8);
    for (x, y) in ring {
        let px = img.get_pixel(x, y);
        if px[3] < MIN_SAMPLE_ALPHA {
            continue;
        }
        add_to_cluster(&mut clusters, Lab::from_rgb(&[px[0], px[1], px[2]]));
    }

    clusters
        .into_iter()
        .max_by(|a, b| a.weight.total_cmp(&b.weight))
        .map(|c| {
            let [r, g, b] = c.centroid().to_rgb();
            Rgb8::new(r, g, b)
        })
        .unwrap_or(Rgb8::new(0, 0, 0))
}

/// Binary mask: 0 where the pixel is within `tolerance` ΔE of `key`, 255 elsewhere.
pub(crate) fn background_mask(img: &RgbaImage, key: Rgb8, tolerance: f32) -> Vec<u8> {
    let key_lab = Lab::from_rgb(&key.to_array());
    let tolerance_sq = tolerance * tolerance;

    let mut rgb = Vec::with_capacity(img.width() as usize * img.height() as usize * 3);
    for px in img.pixels() {
        rgb.extend_from_slice(&px.0[..3]);
    }
    rgb_bytes_to_labs(&rgb)
        .iter()
        .map(|lab| {
            if color_distance_sq(lab, &key_lab) <= tolerance_sq {
                0
            } else {
                255
            }
        })
        .collect()
}

fn has_transparency(img: &RgbaImage) -> bool {
    img.pixels().any(|px| px[3] < EXISTING_ALPHA_CEILING)
}

/// Squared color distance in Lab space (ΔE^2).
#[inline]
fn color_distance_sq(c1: &Lab, c2: &Lab) -> f32 {
    let dl = c1.l - c2.l;
    let da = c1.a - c2.a;
    let db = c1.b - c2.b;
    dl * dl + da * da + db * db
}

#[derive(Clone, Copy)]
struct LabCluster {
    sum_l: f32,
    sum_a: f32,
    sum_b: f32,
    weight: f32,
}

impl LabCluster {
    fn from_lab(lab: Lab) -> Self {
        Self {
            sum_l: lab.l,
            sum_a: lab.a,
            sum_b: lab.b,
            weight: 1.0,
        }
    }

    fn centroid(self) -> Lab {
        let n = self.weight.max(f32::EPSILON);
        Lab {
            l: self.sum_l / n,
            a: self.sum_a / n,
            b: self.sum_b / n,
        }
    }

    fn add(&mut self, lab: Lab) {
        self.sum_l += lab.l;
        self.sum_a += lab.a;
        self.sum_b += lab.b;
        self.weight += 1.0;
    }
}

fn add_to_cluster(clusters: &mut Vec<LabCluster>, lab: Lab) {
    let nearest = clusters
        .iter()
        .enumerate()
        .map(|(idx, c)| (idx, color_distance_sq(&c.centroid(), &lab)))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    match nearest {
        Some((idx, dist_sq)) if dist_sq <= CLUSTER_THRESHOLD * CLUSTER_THRESHOLD => {
            clusters[idx].add(lab);
        }
        _ => clusters.push(LabCluster::from_lab(lab)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/matte/background.rs"]
mod tests;
