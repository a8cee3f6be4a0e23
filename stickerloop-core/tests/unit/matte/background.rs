use image::{Rgba, RgbaImage};

use super::*;

fn subject_on(bg: [u8; 3], subject: [u8; 3]) -> Frame {
    let mut img = RgbaImage::from_pixel(24, 20, Rgba([bg[0], bg[1], bg[2], 255]));
    for y in 4..16 {
        for x in 4..20 {
            img.put_pixel(x, y, Rgba([subject[0], subject[1], subject[2], 255]));
        }
    }
    Frame::new(0, "frame_000.png", img)
}

fn close(a: Rgb8, b: Rgb8, tol: i16) -> bool {
    (i16::from(a.r) - i16::from(b.r)).abs() <= tol
        && (i16::from(a.g) - i16::from(b.g)).abs() <= tol
        && (i16::from(a.b) - i16::from(b.b)).abs() <= tol
}

#[test]
fn estimate_background_picks_dominant_border_color() {
    let mut frame = subject_on([250, 250, 250], [30, 30, 160]);
    // A foreign blob touching one border must not win the vote.
    for y in 0..3 {
        for x in 0..4 {
            frame.image.put_pixel(x, y, Rgba([200, 0, 0, 255]));
        }
    }
    let bg = estimate_background(&frame.image, 10);
    assert!(close(bg, Rgb8::new(250, 250, 250), 2), "{bg}");
}

#[test]
fn chroma_key_absorbs_generator_drift() {
    // Requested pure green, rendered slightly muted.
    let frame = subject_on([18, 236, 30], [200, 40, 40]);
    let opts = MatteOptions {
        background: BackgroundSpec::Chroma(Rgb8::new(0, 255, 0)),
        ..MatteOptions::default()
    };
    let out = normalize_frame(&frame, &opts).unwrap();

    assert_eq!(out.image.get_pixel(0, 0).0, [0, 0, 0, 0]);
    assert_eq!(out.image.get_pixel(12, 10).0, [200, 40, 40, 255]);
    assert_eq!(out.key, frame.key);
    assert_eq!(frame.image.get_pixel(0, 0)[3], 255, "source is untouched");
}

#[test]
fn auto_mode_keeps_existing_transparency() {
    let mut img = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
    img.put_pixel(3, 3, Rgba([9, 9, 9, 255]));
    let frame = Frame::new(2, "frame_002.png", img);
    let out = normalize_frame(&frame, &MatteOptions::default()).unwrap();
    assert_eq!(out, frame);
}

#[test]
fn feather_produces_soft_edge() {
    let frame = subject_on([255, 255, 255], [0, 0, 0]);
    let opts = MatteOptions {
        feather_radius: 1.0,
        ..MatteOptions::default()
    };
    let out = normalize_frame(&frame, &opts).unwrap();

    let edge = out.image.get_pixel(4, 10)[3];
    assert!(edge > 0 && edge < 255, "edge alpha {edge}");
    assert_eq!(out.image.get_pixel(0, 0)[3], 0);
    assert_eq!(out.image.get_pixel(12, 10)[3], 255);
}

#[test]
fn normalize_frames_preserves_order() {
    let frames: Vec<Frame> = (0..4)
        .map(|i| {
            let mut f = subject_on([255, 255, 255], [0, 0, 0]);
            f.index = i;
            f.key = format!("frame_{i:03}.png");
            f
        })
        .collect();
    let out = normalize_frames(&frames, &MatteOptions::default()).unwrap();
    let keys: Vec<_> = out.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(
        keys,
        ["frame_000.png", "frame_001.png", "frame_002.png", "frame_003.png"]
    );
}

#[test]
fn light_subjects_survive_white_background() {
    for subject in [[200, 200, 200], [190, 190, 190], [235, 225, 205]] {
        let frame = subject_on([255, 255, 255], subject);
        let out = normalize_frame(&frame, &MatteOptions::default()).unwrap();
        assert_eq!(out.image.get_pixel(0, 0)[3], 0, "{subject:?}");
        assert_eq!(
            out.image.get_pixel(12, 10).0,
            [subject[0], subject[1], subject[2], 255],
            "{subject:?}"
        );
    }

    let frame = subject_on([255, 255, 255], [170, 170, 170]);
    let opts = MatteOptions {
        background: BackgroundSpec::Chroma(Rgb8::new(255, 255, 255)),
        ..MatteOptions::default()
    };
    let out = normalize_frame(&frame, &opts).unwrap();
    assert_eq!(out.image.get_pixel(0, 0)[3], 0);
    assert_eq!(out.image.get_pixel(12, 10)[3], 255);
}

#[test]
fn near_white_border_noise_is_still_keyed() {
    let mut frame = subject_on([255, 255, 255], [40, 40, 40]);
    frame.image.put_pixel(0, 5, Rgba([248, 248, 248, 255]));
    let out = normalize_frame(&frame, &MatteOptions::default()).unwrap();
    assert_eq!(out.image.get_pixel(0, 5)[3], 0);
}
