use super::*;
use crate::foundation::core::Rgba8;

fn checker(w: u32, h: u32) -> RasterImage {
    let mut data = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let v = if (x + y) % 2 == 0 { 200 } else { 30 };
            data.extend_from_slice(&[v, 255 - v, x as u8, 128 + (y as u8)]);
        }
    }
    RasterImage::from_rgba8(w, h, data).unwrap()
}

#[test]
fn opaque_mask_is_identity() {
    let src = checker(5, 4);
    let mask = RasterImage::filled(5, 4, Rgba8::new(255, 0, 255, 255));
    assert_eq!(clip_with_mask(&src, &mask).unwrap(), src);
}

#[test]
fn transparent_mask_clears_everything() {
    let src = checker(5, 4);
    let mask = RasterImage::transparent(5, 4);
    let out = clip_with_mask(&src, &mask).unwrap();
    assert_eq!(out, RasterImage::transparent(5, 4));
}

#[test]
fn faint_mask_alpha_keeps_source_unweighted() {
    let src = RasterImage::filled(1, 2, Rgba8::new(10, 20, 30, 255));
    let mask = RasterImage::from_rgba8(1, 2, vec![0, 0, 0, 1, 255, 255, 255, 0]).unwrap();
    let out = clip_with_mask(&src, &mask).unwrap();
    assert_eq!(out.pixel(0, 0), Some(Rgba8::new(10, 20, 30, 255)));
    assert_eq!(out.pixel(0, 1), Some(Rgba8::TRANSPARENT));
}

#[test]
fn dimension_mismatch_is_rejected() {
    let src = checker(2, 2);
    let mask = RasterImage::transparent(3, 2);
    assert!(matches!(
        clip_with_mask(&src, &mask),
        Err(TokenError::Validation(_))
    ));
}
