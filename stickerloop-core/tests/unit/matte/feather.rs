use super::*;

#[test]
fn radius_0_is_identity() {
    let src = vec![0u8, 255, 255, 0, 128, 7];
    let out = feather_alpha(&src, 3, 2, 0.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn constant_plane_is_identity() {
    let src = vec![200u8; 6 * 5];
    let out = feather_alpha(&src, 6, 5, 2.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn hard_edge_becomes_monotonic_ramp() {
    let (w, h) = (16u32, 1u32);
    let src: Vec<u8> = (0..w).map(|x| if x < 8 { 0 } else { 255 }).collect();
    let out = feather_alpha(&src, w, h, 1.5).unwrap();

    assert_eq!(out[0], 0);
    assert_eq!(out[15], 255);
    assert!(out[7] > 0 && out[7] < 255);
    assert!(out[8] > 0 && out[8] < 255);
    for pair in out.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
}

#[test]
fn rejects_mismatched_plane_and_negative_radius() {
    assert!(feather_alpha(&[0u8; 5], 2, 2, 1.0).is_err());
    assert!(feather_alpha(&[0u8; 4], 2, 2, -1.0).is_err());
}

#[test]
fn kernel_is_symmetric_and_sums_to_one() {
    for sigma in [0.3f32, 1.0, 2.5, 40.0] {
        let k = alpha_kernel(sigma);
        let reach = (sigma * 3.0).ceil().max(1.0) as usize;
        assert_eq!(k.len(), 2 * reach + 1);
        assert_eq!(k.iter().map(|&w| u64::from(w)).sum::<u64>(), u64::from(Q16_ONE));
        assert!(k.iter().eq(k.iter().rev()));
        assert_eq!(k.iter().max(), k.get(reach));
    }
}
