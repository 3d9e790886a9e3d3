use super::*;
use crate::foundation::core::Rgba8;

#[test]
fn wide_raster_is_scaled_to_width_keeping_ratio() {
    let src = RasterImage::filled(400, 200, Rgba8::new(10, 20, 30, 255));
    let thumb = fit_thumbnail(&src, 100);
    assert_eq!(thumb.dimensions(), (100, 50));
}

#[test]
fn small_raster_is_never_upscaled() {
    let src = RasterImage::filled(60, 90, Rgba8::BLACK);
    let thumb = fit_thumbnail(&src, 100);
    assert!(thumb.shares_buffer_with(&src));
}

#[test]
fn extreme_aspect_keeps_at_least_one_row() {
    let src = RasterImage::filled(1000, 1, Rgba8::BLACK);
    assert_eq!(fit_thumbnail(&src, 100).dimensions(), (100, 1));
}
