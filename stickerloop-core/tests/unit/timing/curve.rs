use super::*;

#[test]
fn ease_in_out_four_frames_is_symmetric_and_exact() {
    let curve = TimingCurve::from_preset(4, 1000, TimingPreset::EaseInOut).unwrap();
    let d = curve.durations();
    assert_eq!(d, &[412, 88, 88, 412]);
    assert_eq!(d[0], d[3]);
    assert_eq!(d[1], d[2]);
    assert_eq!(curve.total_ms(), 1000);
}

#[test]
fn presets_sum_exactly_and_respect_minimum() {
    for preset in TimingPreset::ALL {
        for n in [1usize, 2, 5, 16, 20] {
            for total in [n as u32 * MIN_FRAME_MS, 997, 1000, 4000] {
                if total < n as u32 * MIN_FRAME_MS {
                    continue;
                }
                let curve = TimingCurve::from_preset(n, total, preset).unwrap();
                assert_eq!(curve.len(), n);
                assert_eq!(curve.total_ms(), u64::from(total), "{preset} n={n}");
                assert!(curve.durations().iter().all(|&d| d >= MIN_FRAME_MS));
            }
        }
    }
}

#[test]
fn preset_shapes_follow_their_names() {
    let ease_in = TimingCurve::from_preset(8, 1000, TimingPreset::EaseIn).unwrap();
    assert!(ease_in.durations()[0] > ease_in.durations()[7]);

    let ease_out = TimingCurve::from_preset(8, 1000, TimingPreset::EaseOut).unwrap();
    assert!(ease_out.durations()[0] < ease_out.durations()[7]);

    let bounce = TimingCurve::from_preset(5, 1000, TimingPreset::Bounce).unwrap();
    let d = bounce.durations();
    assert!(d[2] > d[0] && d[2] > d[4]);
    assert_eq!(d[0], d[4]);

    let uniform = TimingCurve::from_preset(4, 1000, TimingPreset::Uniform).unwrap();
    assert_eq!(uniform.durations(), &[250, 250, 250, 250]);
}

#[test]
fn total_below_minimum_is_rejected() {
    assert!(TimingCurve::from_preset(5, 49, TimingPreset::Uniform).is_err());
    assert!(TimingCurve::from_preset(0, 1000, TimingPreset::Uniform).is_err());
}

#[test]
fn fps_total_is_rounded_from_frame_count() {
    assert_eq!(TotalDuration::Fps(16.0).total_ms(16).unwrap(), 1000);
    assert_eq!(TotalDuration::Fps(12.0).total_ms(10).unwrap(), 833);
    assert_eq!(TotalDuration::Millis(1234).total_ms(3).unwrap(), 1234);
    assert!(TotalDuration::Fps(0.0).total_ms(4).is_err());
    assert_eq!(TotalDuration::default(), TotalDuration::Fps(DEFAULT_FPS));
}

#[test]
fn explicit_list_must_match_frame_count() {
    let spec = TimingSpec::Explicit(vec![100, 100, 100]);
    let err = TimingCurve::build(4, TotalDuration::default(), &spec).unwrap_err();
    assert!(matches!(
        err,
        StickerError::TimingMismatch {
            expected: 4,
            got: 3
        }
    ));

    let ok = TimingCurve::build(3, TotalDuration::Millis(1), &spec).unwrap();
    assert_eq!(ok.durations(), &[100, 100, 100]);
    assert!(TimingCurve::explicit(2, vec![50, 0]).is_err());
}

#[test]
fn timing_spec_parses_presets_and_lists() {
    assert_eq!(
        "ease-in-out".parse::<TimingSpec>().unwrap(),
        TimingSpec::Preset(TimingPreset::EaseInOut)
    );
    assert_eq!(
        " Bounce ".parse::<TimingSpec>().unwrap(),
        TimingSpec::Preset(TimingPreset::Bounce)
    );
    assert_eq!(
        "80, 60,60 ,80".parse::<TimingSpec>().unwrap(),
        TimingSpec::Explicit(vec![80, 60, 60, 80])
    );
    assert!("wobble".parse::<TimingSpec>().is_err());
    assert!("80,sixty".parse::<TimingSpec>().is_err());
}
