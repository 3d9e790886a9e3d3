use super::*;

#[test]
fn radius_0_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    assert_eq!(blur_premul(&src, 1, 2, 0, 1.0).unwrap(), src);
}

#[test]
fn constant_image_is_unchanged() {
    let (w, h) = (4u32, 3u32);
    let src = [10u8, 20, 30, 40].repeat((w * h) as usize);
    assert_eq!(blur_premul(&src, w, h, 3, 2.0).unwrap(), src);
}

#[test]
fn single_pixel_energy_spreads_and_is_conserved() {
    let (w, h) = (5u32, 5u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    let center = ((2 * w + 2) * 4) as usize;
    src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

    let out = blur_premul(&src, w, h, 2, 1.2).unwrap();
    assert!(out.chunks_exact(4).filter(|px| px[3] != 0).count() > 1);
    let sum_a: u32 = out.chunks_exact(4).map(|px| u32::from(px[3])).sum();
    assert!((sum_a as i32 - 255).abs() <= 4);
}

#[test]
fn invalid_inputs_are_effects_errors() {
    let src = vec![0u8; 16];
    assert!(matches!(
        blur_premul(&src, 2, 2, 1, 0.0),
        Err(TokenError::EffectsRendering(_))
    ));
    assert!(blur_premul(&src, 3, 2, 1, 1.0).is_err());
    assert!(blur_premul(&src, 2, 2, MAX_BLUR_RADIUS + 1, 1.0).is_err());
}
