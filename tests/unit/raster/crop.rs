use super::*;

fn dot_on_canvas(w: u32, h: u32, dots: &[(u32, u32, Rgba8)]) -> RasterImage {
    let mut data = vec![0u8; (w * h * 4) as usize];
    for &(x, y, c) in dots {
        let i = ((y * w + x) * 4) as usize;
        data[i..i + 4].copy_from_slice(&c.to_array());
    }
    RasterImage::from_rgba8(w, h, data).unwrap()
}

#[test]
fn tight_raster_is_a_fixed_point() {
    let src = RasterImage::filled(4, 3, Rgba8::new(1, 2, 3, 255));
    let out = autocrop(&src, Backdrop::NONE).unwrap();
    assert_eq!(out.image, src);
    assert_eq!(out.bounds, PixelRect::new(0, 0, 4, 3));
}

#[test]
fn fully_transparent_gives_sentinel() {
    let out = autocrop(&RasterImage::transparent(8, 8), Backdrop::NONE).unwrap();
    assert!(out.image.is_sentinel());
    assert!(out.is_empty());
    assert!(out.bounds.is_empty());
}

#[test]
fn crops_to_inclusive_bounds() {
    let red = Rgba8::new(255, 0, 0, 255);
    let blue = Rgba8::new(0, 0, 255, 40);
    let src = dot_on_canvas(10, 10, &[(2, 3, red), (6, 8, blue)]);
    let out = autocrop(&src, Backdrop::NONE).unwrap();
    assert_eq!(out.bounds, PixelRect::new(2, 3, 5, 6));
    assert_eq!(out.image.dimensions(), (5, 6));
    assert_eq!(out.image.pixel(0, 0), Some(red));
    assert_eq!(out.image.pixel(4, 5), Some(blue));
    assert_eq!(out.image.pixel(1, 1), Some(Rgba8::TRANSPARENT));
}

#[test]
fn single_visible_pixel_is_kept() {
    let c = Rgba8::new(9, 9, 9, 255);
    let src = dot_on_canvas(5, 5, &[(3, 1, c)]);
    let out = autocrop(&src, Backdrop::NONE).unwrap();
    assert_eq!(out.bounds, PixelRect::new(3, 1, 1, 1));
    assert_eq!(out.image.pixel(0, 0), Some(c));
    // A lone pixel still reads as empty to callers; the bounds tell them apart.
    assert!(out.is_empty());
    assert!(!out.bounds.is_empty());
}

#[test]
fn translucent_edges_blend_against_backdrop_colour() {
    let src = dot_on_canvas(
        3,
        1,
        &[
            (0, 0, Rgba8::new(255, 255, 255, 255)),
            (1, 0, Rgba8::new(255, 255, 255, 128)),
        ],
    );
    let out = autocrop(&src, Backdrop::color(Rgba8::BLACK)).unwrap();
    assert_eq!(out.image.dimensions(), (2, 1));
    assert_eq!(out.image.pixel(0, 0), Some(Rgba8::new(255, 255, 255, 255)));
    let edge = out.image.pixel(1, 0).unwrap();
    assert_eq!(edge.a, 255);
    assert!((i16::from(edge.r) - 128).abs() <= 1);
}

#[test]
fn backdrop_raster_is_cropped_with_the_foreground() {
    let fg = dot_on_canvas(
        4,
        4,
        &[
            (2, 2, Rgba8::new(0, 255, 0, 255)),
            (1, 2, Rgba8::new(0, 0, 0, 1)),
        ],
    );
    let bg = dot_on_canvas(4, 4, &[(1, 2, Rgba8::new(255, 0, 0, 255))]);
    let out = autocrop(
        &fg,
        Backdrop {
            color: None,
            raster: Some(&bg),
        },
    )
    .unwrap();
    assert_eq!(out.bounds, PixelRect::new(1, 2, 2, 1));
    let left = out.image.pixel(0, 0).unwrap();
    assert_eq!(left.a, 255);
    assert!(left.r >= 254);
    assert_eq!(out.image.pixel(1, 0), Some(Rgba8::new(0, 255, 0, 255)));
}
