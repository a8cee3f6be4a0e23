use crate::foundation::error::{StickerError, StickerResult};

const Q16_ONE: u32 = 1 << 16;

/// Gaussian-smooth a single-channel alpha plane.
///
/// `radius` is the blur standard deviation in pixels; the kernel extends to `ceil(3 * radius)`.
/// A radius of zero returns the plane unchanged.
pub(crate) fn feather_alpha(
    alpha: &[u8],
    width: u32,
    height: u32,
    radius: f32,
) -> StickerResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| StickerError::validation("alpha plane size overflow"))?;
    if alpha.len() != expected_len {
        return Err(StickerError::validation(
            "feather_alpha expects a plane matching width*height",
        ));
    }
    if !radius.is_finite() || radius < 0.0 {
        return Err(StickerError::validation("feather radius must be >= 0"));
    }
    if radius == 0.0 || expected_len == 0 {
        return Ok(alpha.to_vec());
    }

    let kernel = alpha_kernel(radius);
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(alpha, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

/// Symmetric Gaussian taps in Q16 for `sigma > 0`, reaching `ceil(3 * sigma)` pixels each way.
///
/// Side taps are floored and the center takes the remainder, so the taps always sum to
/// exactly [`Q16_ONE`] and a flat plane passes through unchanged.
fn alpha_kernel(sigma: f32) -> Vec<u32> {
    let reach = (sigma * 3.0).ceil().max(1.0) as u32;
    let two_var = 2.0 * f64::from(sigma) * f64::from(sigma);
    let falloff = (1..=reach)
        .map(|d| (-f64::from(d * d) / two_var).exp())
        .collect::<Vec<_>>();
    let total = 1.0 + 2.0 * falloff.iter().sum::<f64>();
    let side = falloff
        .iter()
        .map(|w| (w / total * f64::from(Q16_ONE)).floor() as u32)
        .collect::<Vec<_>>();
    let center = Q16_ONE - 2 * side.iter().sum::<u32>();

    side.iter()
        .rev()
        .copied()
        .chain(std::iter::once(center))
        .chain(side.iter().copied())
        .collect()
}

#[inline]
fn q16_to_u8(acc: u64) -> u8 {
    ((acc + u64::from(Q16_ONE / 2)) >> 16).min(255) as u8
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        let row = (y * w) as usize;
        for x in 0..w {
            let mut acc = 0u64;
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                acc += u64::from(kw) * u64::from(src[row + sx as usize]);
            }
            dst[row + x as usize] = q16_to_u8(acc);
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u64;
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                acc += u64::from(kw) * u64::from(src[(sy * w + x) as usize]);
            }
            dst[(y * w + x) as usize] = q16_to_u8(acc);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/matte/feather.rs"]
mod tests;
