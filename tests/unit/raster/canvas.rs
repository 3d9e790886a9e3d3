use super::*;
use crate::foundation::core::Rgba8;

fn gradient(w: u32, h: u32) -> RasterImage {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&[x as u8, y as u8, 7, 255]);
        }
    }
    RasterImage::from_rgba8(w, h, data).unwrap()
}

#[test]
fn same_size_zero_offset_is_identity() {
    let a = gradient(4, 3);
    let out = resize_canvas(&a, 4, 3, 0, 0);
    assert_eq!(out, a);
    assert!(out.shares_buffer_with(&a));
}

#[test]
fn padding_places_source_and_leaves_border_transparent() {
    let (w, h) = (6u32, 4u32);
    let a = gradient(w, h);
    let out = resize_canvas(&a, (w + 10) as i32, (h + 10) as i32, 5, 5);
    assert_eq!(out.dimensions(), (w + 10, h + 10));
    for y in 0..h + 10 {
        for x in 0..w + 10 {
            let px = out.pixel(x, y).unwrap();
            let inside = (5..5 + w).contains(&x) && (5..5 + h).contains(&y);
            if inside {
                assert_eq!(px, a.pixel(x - 5, y - 5).unwrap());
            } else {
                assert_eq!(px, Rgba8::TRANSPARENT);
            }
        }
    }
}

#[test]
fn same_size_with_offset_shifts_content() {
    let a = gradient(3, 3);
    let out = resize_canvas(&a, 3, 3, 1, 0);
    assert_eq!(out.pixel(0, 0), Some(Rgba8::TRANSPARENT));
    assert_eq!(out.pixel(1, 0), a.pixel(0, 0));
    assert_eq!(out.pixel(2, 2), a.pixel(1, 2));
}

#[test]
fn overflowing_source_is_clipped_silently() {
    let a = gradient(5, 5);
    let out = resize_canvas(&a, 4, 4, -2, 2);
    assert_eq!(out.dimensions(), (4, 4));
    assert_eq!(out.pixel(0, 2), a.pixel(2, 0));
    assert_eq!(out.pixel(2, 3), a.pixel(4, 1));
    assert_eq!(out.pixel(3, 3), Some(Rgba8::TRANSPARENT));
    assert_eq!(out.pixel(0, 1), Some(Rgba8::TRANSPARENT));
}

#[test]
fn fully_outside_offset_gives_transparent_canvas() {
    let a = gradient(2, 2);
    let out = resize_canvas(&a, 3, 3, 10, 10);
    assert!(out.is_fully_transparent());
}

#[test]
fn non_positive_size_clamps_to_sentinel() {
    let a = gradient(2, 2);
    assert!(resize_canvas(&a, 0, 5, 0, 0).is_sentinel());
    assert!(resize_canvas(&a, 5, -3, 0, 0).is_sentinel());
}

#[test]
fn centered_mode_computes_half_offsets() {
    let a = gradient(2, 2);
    let out = resize_canvas_centered(&a, 6, 4);
    assert_eq!(out.pixel(2, 1), a.pixel(0, 0));
    assert_eq!(out.pixel(3, 2), a.pixel(1, 1));
    assert_eq!(out.pixel(1, 1), Some(Rgba8::TRANSPARENT));

    let shrunk = resize_canvas_centered(&gradient(4, 4), 2, 2);
    assert_eq!(shrunk.pixel(0, 0), gradient(4, 4).pixel(1, 1));
}
