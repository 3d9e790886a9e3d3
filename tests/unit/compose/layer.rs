use super::*;
use crate::foundation::core::Rgba8;

fn layer(w: u32, h: u32) -> LayerView {
    LayerView::new(RasterImage::filled(w, h, Rgba8::BLACK))
}

#[test]
fn translation_only_layers_are_integer_offsets() {
    assert_eq!(layer(10, 10).integer_offset(), Some((0, 0)));
    assert_eq!(layer(10, 10).at(-3.0, 7.0).integer_offset(), Some((-3, 7)));
    assert_eq!(layer(10, 10).at(0.5, 0.0).integer_offset(), None);
    assert_eq!(layer(10, 10).rotated(30.0).integer_offset(), None);
    assert_eq!(layer(10, 10).scaled(2.0, 2.0).integer_offset(), None);
}

#[test]
fn stage_bounds_follow_scale_and_rotation_about_centre() {
    assert_eq!(layer(10, 20).at(5.0, 5.0).stage_bounds(), PixelRect::new(5, 5, 10, 20));
    assert_eq!(
        layer(10, 10).scaled(2.0, 2.0).stage_bounds(),
        PixelRect::new(-5, -5, 20, 20)
    );
    assert_eq!(
        layer(10, 20).rotated(90.0).stage_bounds(),
        PixelRect::new(-5, 5, 20, 10)
    );
}

#[test]
fn fit_box_scales_content_and_defines_bounds() {
    let l = layer(200, 100).fitted(50.0, 50.0, true).at(10.0, 10.0);
    assert_eq!(l.stage_bounds(), PixelRect::new(10, 10, 50, 50));
    let p = l.to_affine() * kurbo::Point::new(0.0, 0.0);
    assert!((p.x - 10.0).abs() < 1e-9);
    assert!((p.y - 22.5).abs() < 1e-9);

    let stretched = layer(200, 100).fitted(50.0, 50.0, false);
    let q = stretched.to_affine() * kurbo::Point::new(200.0, 100.0);
    assert!((q.x - 50.0).abs() < 1e-9 && (q.y - 50.0).abs() < 1e-9);
}

#[test]
fn empty_and_invisible_layers() {
    assert!(!LayerView::empty().is_visible());
    assert!(!layer(4, 4).with_opacity(0.0).is_visible());
    assert!(layer(4, 4).is_visible());
}

#[test]
fn effects_noop_detection() {
    assert!(LayerEffects::default().is_noop());
    assert!(
        !LayerEffects {
            blur_radius: Some(2.0),
            glow_level: None
        }
        .is_noop()
    );
    assert!(
        !LayerEffects {
            blur_radius: None,
            glow_level: Some(0.3)
        }
        .is_noop()
    );
}
