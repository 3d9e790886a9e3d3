use super::*;
use crate::foundation::core::Rgba8;

const RED: Rgba8 = Rgba8::new(255, 0, 0, 255);

#[test]
fn integer_translation_is_copied_exactly() {
    let layer = LayerView::new(RasterImage::filled(4, 4, RED)).at(2.0, 3.0);
    let out = CpuLayerRenderer
        .render_layer(&layer, PixelRect::new(0, 0, 8, 8), true)
        .unwrap();
    assert_eq!(out.dimensions(), (8, 8));
    assert_eq!(out.pixel(2, 3), Some(RED));
    assert_eq!(out.pixel(5, 6), Some(RED));
    assert_eq!(out.pixel(1, 3), Some(Rgba8::TRANSPARENT));
    assert_eq!(out.pixel(6, 6), Some(Rgba8::TRANSPARENT));
}

#[test]
fn viewport_origin_shifts_output() {
    let layer = LayerView::new(RasterImage::filled(4, 4, RED)).at(10.0, 10.0);
    let out = CpuLayerRenderer
        .render_layer(&layer, PixelRect::new(10, 10, 2, 2), false)
        .unwrap();
    assert_eq!(out.pixel(0, 0), Some(RED));
    assert_eq!(out.pixel(1, 1), Some(RED));
}

#[test]
fn layer_opacity_is_left_to_the_compositor() {
    let layer = LayerView::new(RasterImage::filled(2, 2, RED)).with_opacity(0.25);
    let out = CpuLayerRenderer
        .render_layer(&layer, PixelRect::new(0, 0, 2, 2), true)
        .unwrap();
    assert_eq!(out.pixel(0, 0), Some(RED));
}

#[test]
fn scaled_layer_goes_through_resampling() {
    let layer = LayerView::new(RasterImage::filled(10, 10, RED)).scaled(2.0, 2.0);
    let viewport = layer.stage_bounds();
    assert_eq!(viewport, PixelRect::new(-5, -5, 20, 20));
    let out = CpuLayerRenderer.render_layer(&layer, viewport, true).unwrap();
    assert_eq!(out.dimensions(), (20, 20));
    let centre = out.pixel(10, 10).unwrap();
    assert!(centre.a >= 250);
    assert!(centre.r > 245 && centre.g < 5 && centre.b < 5);
}

#[test]
fn blur_spreads_alpha_outside_the_layer() {
    let layer = LayerView::new(RasterImage::filled(4, 4, RED))
        .at(8.0, 8.0)
        .with_effects(LayerEffects {
            blur_radius: Some(3.0),
            glow_level: None,
        });
    let viewport = PixelRect::new(0, 0, 20, 20);
    let sharp = CpuLayerRenderer.render_layer(&layer, viewport, false).unwrap();
    let blurred = CpuLayerRenderer.render_layer(&layer, viewport, true).unwrap();
    assert_eq!(sharp.pixel(7, 9).unwrap().a, 0);
    assert!(blurred.pixel(7, 9).unwrap().a > 0);
}

#[test]
fn invalid_blur_radius_is_an_effects_error() {
    let layer = LayerView::new(RasterImage::filled(4, 4, RED)).with_effects(LayerEffects {
        blur_radius: Some(f32::NAN),
        glow_level: None,
    });
    let err = CpuLayerRenderer
        .render_layer(&layer, PixelRect::new(0, 0, 4, 4), true)
        .unwrap_err();
    assert!(err.is_recoverable_render_failure());
}

#[test]
fn empty_viewport_yields_sentinel() {
    let layer = LayerView::new(RasterImage::filled(4, 4, RED));
    let out = CpuLayerRenderer
        .render_layer(&layer, PixelRect::default(), true)
        .unwrap();
    assert!(out.is_sentinel());
}
