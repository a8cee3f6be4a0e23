use super::*;
use std::collections::HashSet;

fn distinct(img: &RgbaImage) -> usize {
    img.pixels().map(|p| p.0).collect::<HashSet<_>>().len()
}

fn gradient(w: u32, h: u32, shift: u8) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        Rgba([
            (x * 7) as u8 ^ shift,
            (y * 5) as u8,
            ((x + y) * 3) as u8,
            if x < 2 { 0 } else { 128 + (y % 128) as u8 },
        ])
    })
}

#[test]
fn few_colors_are_kept_exactly() {
    let mut img = RgbaImage::new(8, 8);
    for (i, px) in img.pixels_mut().enumerate() {
        *px = match i % 3 {
            0 => Rgba([255, 0, 0, 255]),
            1 => Rgba([0, 0, 255, 128]),
            _ => Rgba([9, 9, 9, 0]),
        };
    }
    let q = quantize_frames(std::slice::from_ref(&img), MAX_PALETTE).unwrap();
    assert_eq!(q.palette.len(), 3);
    assert_eq!(q.palette[0], [0, 0, 0, 0]);
    let back = q.to_rgba(0).unwrap();
    for (a, b) in img.pixels().zip(back.pixels()) {
        if a[3] == 0 {
            assert_eq!(b.0, [0, 0, 0, 0]);
        } else {
            assert_eq!(a, b);
        }
    }
}

#[test]
fn many_colors_reduce_to_palette_limit() {
    let frames = vec![gradient(64, 64, 0), gradient(64, 64, 0x55)];
    let q = quantize_frames(&frames, MAX_PALETTE).unwrap();
    assert!(q.palette.len() <= MAX_PALETTE);
    assert_eq!(q.indices.len(), 2);
    for (src, out) in frames.iter().zip(q.to_rgba_frames()) {
        assert!(distinct(&out) <= MAX_PALETTE);
        assert!(distinct(&out) <= distinct(src));
    }
}

#[test]
fn fully_transparent_pixels_stay_fully_transparent() {
    let frames = vec![gradient(40, 40, 3)];
    let q = quantize_frames(&frames, 16).unwrap();
    let out = q.to_rgba(0).unwrap();
    for (x, y, px) in out.enumerate_pixels() {
        if x < 2 {
            assert_eq!(px.0, [0, 0, 0, 0]);
        } else {
            assert!(px[3] > 0, "({x},{y}) lost its alpha");
        }
    }
}

#[test]
fn quantization_is_deterministic() {
    let frames = vec![gradient(32, 32, 1), gradient(32, 32, 2)];
    let a = quantize_frames(&frames, 32).unwrap();
    let b = quantize_frames(&frames, 32).unwrap();
    assert_eq!(a, b);
}

#[test]
fn png_palette_trims_opaque_tail() {
    let q = IndexedFrames {
        width: 1,
        height: 1,
        palette: vec![[0, 0, 0, 0], [1, 2, 3, 200], [4, 5, 6, 255]],
        indices: vec![vec![0]],
    };
    let (plte, trns) = q.png_palette();
    assert_eq!(plte, vec![0, 0, 0, 1, 2, 3, 4, 5, 6]);
    assert_eq!(trns, vec![0, 200]);
}

#[test]
fn rejects_mismatched_sizes_and_bad_limits() {
    assert!(quantize_frames(&[], 256).is_err());
    assert!(quantize_frames(&[RgbaImage::new(2, 2)], 0).is_err());
    assert!(quantize_frames(&[RgbaImage::new(2, 2)], 257).is_err());
    assert!(quantize_frames(&[RgbaImage::new(2, 2), RgbaImage::new(3, 2)], 256).is_err());
}

#[test]
fn split_buckets_carry_their_own_axis_and_population() {
    let colors = (0..=255u8)
        .map(|r| ([r, r / 4, 7, 255], u64::from(r % 3) + 1))
        .collect::<Vec<_>>();
    let bucket = Bucket::new(colors);
    assert_eq!((bucket.axis, bucket.range), (0, 255));

    let total = bucket.population;
    let (lo, hi) = bucket.split();
    assert_eq!(lo.population + hi.population, total);
    for half in [&lo, &hi] {
        assert!(!half.colors.is_empty());
        assert_eq!((half.axis, half.range), widest_axis(&half.colors));
    }
    assert!(lo.colors.iter().all(|(c, _)| c[0] < hi.colors[0].0[0]));
}

#[test]
fn every_distinct_color_reduces_to_full_palette() {
    let img = RgbaImage::from_fn(256, 256, |x, y| Rgba([x as u8, y as u8, (x ^ y) as u8, 255]));
    let q = quantize_frames(&[img], MAX_PALETTE).unwrap();
    assert_eq!(q.palette.len(), MAX_PALETTE);
}
