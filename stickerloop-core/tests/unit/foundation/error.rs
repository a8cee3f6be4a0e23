use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        StickerError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        StickerError::ambiguous_grid("x")
            .to_string()
            .contains("ambiguous grid:")
    );
    assert!(
        StickerError::encode("x")
            .to_string()
            .contains("encode error:")
    );
    assert!(
        StickerError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn structured_variants_render_measured_values() {
    let err = StickerError::empty_frame("frame_003.png");
    assert!(err.to_string().contains("frame_003.png"));

    let err = StickerError::TimingMismatch {
        expected: 16,
        got: 15,
    };
    assert_eq!(err.to_string(), "timing mismatch: 15 durations for 16 frames");

    let err = StickerError::SizeBudget {
        size: 1_200_000,
        budget: 1_048_576,
        attempts: 3,
    };
    let msg = err.to_string();
    assert!(msg.contains("1200000"));
    assert!(msg.contains("3 resize attempts"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = StickerError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
