use image::imageops::FilterType;

use crate::foundation::core::RasterImage;

/// Default thumbnail width used by library scans.
pub const DEFAULT_THUMB_SIZE: u32 = 100;

/// Scale `source` down to at most `max_width` pixels wide, preserving its aspect ratio.
/// Rasters already narrow enough are returned as-is.
pub fn fit_thumbnail(source: &RasterImage, max_width: u32) -> RasterImage {
    let (w, h) = source.dimensions();
    if max_width == 0 || w <= max_width || w == 0 || h == 0 {
        return source.clone();
    }
    let new_h = ((u64::from(h) * u64::from(max_width) + u64::from(w) / 2) / u64::from(w)).max(1);
    let resized = image::imageops::resize(
        &source.to_rgba_image(),
        max_width,
        new_h as u32,
        FilterType::Lanczos3,
    );
    RasterImage::from_rgba_image(resized)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/thumb.rs"]
mod tests;
