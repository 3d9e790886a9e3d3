use super::*;

#[test]
fn zero_level_is_identity() {
    let src = [10u8, 20, 30, 200].repeat(9);
    assert_eq!(glow_premul(&src, 3, 3, 0.0).unwrap(), src);
}

#[test]
fn glow_brightens_without_exceeding_alpha() {
    let src = [100u8, 40, 10, 200].repeat(16);
    let out = glow_premul(&src, 4, 4, 1.0).unwrap();
    for px in out.chunks_exact(4) {
        assert_eq!(px[3], 200);
        assert!(px[0] > 100 && px[0] <= 200);
        assert!(px[1] > 40);
    }
}

#[test]
fn non_finite_level_is_rejected() {
    let src = vec![0u8; 4];
    assert!(glow_premul(&src, 1, 1, f32::NAN).is_err());
}
