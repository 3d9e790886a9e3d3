use crate::foundation::core::RasterImage;

/// Place `source` onto a fresh `new_width × new_height` transparent canvas with its
/// top-left corner at `(offset_x, offset_y)`. No resampling happens: pixels are copied
/// as-is and whatever falls outside the new canvas is dropped.
///
/// Non-positive target dimensions yield the 1×1 sentinel raster.
pub fn resize_canvas(
    source: &RasterImage,
    new_width: i32,
    new_height: i32,
    offset_x: i32,
    offset_y: i32,
) -> RasterImage {
    if new_width <= 0 || new_height <= 0 {
        tracing::debug!(
            new_width,
            new_height,
            "canvas resize to non-positive size, clamping to sentinel"
        );
        return RasterImage::sentinel();
    }
    let (new_w, new_h) = (new_width as u32, new_height as u32);
    if source.dimensions() == (new_w, new_h) && offset_x == 0 && offset_y == 0 {
        return source.clone();
    }

    let mut out = vec![0u8; new_w as usize * new_h as usize * 4];
    blit_into(&mut out, new_w, new_h, source, offset_x, offset_y);
    // Length matches by construction.
    RasterImage::from_rgba8(new_w, new_h, out).unwrap_or_else(|_| RasterImage::sentinel())
}

/// Centered variant: the offset is `((new - source) / 2)` on each axis, which is negative
/// (cropping both sides) when the canvas is smaller than the source.
pub fn resize_canvas_centered(source: &RasterImage, new_width: i32, new_height: i32) -> RasterImage {
    let offset_x = (i64::from(new_width) - i64::from(source.width())) / 2;
    let offset_y = (i64::from(new_height) - i64::from(source.height())) / 2;
    resize_canvas(
        source,
        new_width,
        new_height,
        clamp_i32(offset_x),
        clamp_i32(offset_y),
    )
}

/// Copy the overlapping part of `source` into an RGBA8 buffer of `dst_w × dst_h` at the
/// given offset. Rows are copied as whole slices.
pub(crate) fn blit_into(
    dst: &mut [u8],
    dst_w: u32,
    dst_h: u32,
    source: &RasterImage,
    offset_x: i32,
    offset_y: i32,
) {
    let (src_w, src_h) = (i64::from(source.width()), i64::from(source.height()));
    let (ox, oy) = (i64::from(offset_x), i64::from(offset_y));

    let x0 = ox.max(0);
    let y0 = oy.max(0);
    let x1 = (ox + src_w).min(i64::from(dst_w));
    let y1 = (oy + src_h).min(i64::from(dst_h));
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let src = source.as_bytes();
    let row_bytes = ((x1 - x0) * 4) as usize;
    for dy in y0..y1 {
        let sy = dy - oy;
        let sx = x0 - ox;
        let s = ((sy * src_w + sx) * 4) as usize;
        let d = ((dy * i64::from(dst_w) + x0) * 4) as usize;
        dst[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
    }
}

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
#[path = "../../tests/unit/raster/canvas.rs"]
mod tests;
