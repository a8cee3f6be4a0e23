use super::*;
use crate::assemble::quantize::{MAX_PALETTE, quantize_frames};
use image::Rgba;

fn frames(n: usize) -> Vec<RgbaImage> {
    (0..n)
        .map(|i| {
            RgbaImage::from_fn(8, 6, |x, y| {
                if x == 0 {
                    Rgba([0, 0, 0, 0])
                } else {
                    Rgba([(x * 30) as u8, (y * 40) as u8, (i * 60) as u8, 255 - (y * 20) as u8])
                }
            })
        })
        .collect()
}

#[test]
fn rgba_animation_keeps_pixels_and_delays() {
    let src = frames(3);
    let timing = TimingCurve::explicit(3, vec![100, 50, 120]).unwrap();
    let bytes = encode_apng(FramePixels::Rgba(&src), &timing, 0).unwrap();

    let decoded = decode_apng(&bytes).unwrap();
    assert!(decoded.animated);
    assert_eq!((decoded.width, decoded.height), (8, 6));
    assert_eq!(decoded.delays_ms, vec![100, 50, 120]);
    assert_eq!(decoded.total_duration_ms(), 270);
    assert_eq!(decoded.byte_size, bytes.len() as u64);
    assert_eq!(decoded.frames, src);
}

#[test]
fn indexed_animation_matches_its_palette_expansion() {
    let src = frames(4);
    let q = quantize_frames(&src, MAX_PALETTE).unwrap();
    let timing = TimingCurve::explicit(4, vec![80; 4]).unwrap();
    let bytes = encode_apng(FramePixels::Indexed(&q), &timing, 0).unwrap();

    let decoded = decode_apng(&bytes).unwrap();
    assert_eq!(decoded.frames.len(), 4);
    assert_eq!(decoded.frames, q.to_rgba_frames());
}

#[test]
fn single_frame_is_a_static_png() {
    let src = frames(1);
    let timing = TimingCurve::explicit(1, vec![100]).unwrap();
    let bytes = encode_apng(FramePixels::Rgba(&src), &timing, 0).unwrap();
    let decoded = decode_apng(&bytes).unwrap();
    assert!(!decoded.animated);
    assert_eq!(decoded.frames.len(), 1);
    assert_eq!(decoded.frames[0], src[0]);
}

#[test]
fn encode_rejects_mismatched_inputs() {
    let src = frames(2);
    let timing = TimingCurve::explicit(3, vec![10, 10, 10]).unwrap();
    assert!(matches!(
        encode_apng(FramePixels::Rgba(&src), &timing, 0),
        Err(StickerError::TimingMismatch { expected: 2, got: 3 })
    ));

    let mut uneven = frames(2);
    uneven[1] = RgbaImage::new(4, 4);
    let timing = TimingCurve::explicit(2, vec![10, 10]).unwrap();
    assert!(encode_apng(FramePixels::Rgba(&uneven), &timing, 0).is_err());

    let slow = TimingCurve::explicit(2, vec![70_000, 10]).unwrap();
    assert!(encode_apng(FramePixels::Rgba(&src), &slow, 0).is_err());
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode_apng(b"not a png").is_err());
}
