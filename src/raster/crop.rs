use crate::{
    foundation::{
        core::{CompositeResult, PixelRect, RasterImage, Rgba8},
        error::TokenResult,
    },
    raster::{blend::PremulCanvas, canvas::resize_canvas},
};

/// Optional surface painted underneath the cropped foreground.
///
/// The colour is laid down first, then the raster (anchored at the source's origin and
/// cropped with it), then the foreground with source-over blending.
#[derive(Clone, Copy, Debug, Default)]
pub struct Backdrop<'a> {
    /// Solid fill.
    pub color: Option<Rgba8>,
    /// Background raster aligned with the source's top-left corner.
    pub raster: Option<&'a RasterImage>,
}

impl<'a> Backdrop<'a> {
    /// No backdrop: the crop is a plain pixel copy.
    pub const NONE: Self = Self {
        color: None,
        raster: None,
    };

    /// Solid colour backdrop.
    pub fn color(color: Rgba8) -> Self {
        Self {
            color: Some(color),
            raster: None,
        }
    }

    fn is_none(&self) -> bool {
        self.raster.is_none() && self.color.is_none_or(|c| c.a == 0)
    }
}

/// Smallest rectangle containing every pixel with non-zero alpha, or `None` when the
/// raster is fully transparent.
pub fn opaque_bounds(source: &RasterImage) -> Option<PixelRect> {
    let (w, h) = source.dimensions();
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (u32::MAX, u32::MAX, 0u32, 0u32);
    let mut found = false;

    for (y, row) in source.as_bytes().chunks_exact(w.max(1) as usize * 4).enumerate() {
        for (x, px) in row.chunks_exact(4).enumerate() {
            if px[3] != 0 {
                let (x, y) = (x as u32, y as u32);
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
                found = true;
            }
        }
    }

    if !found || max_x < min_x || max_y < min_y || w == 0 || h == 0 {
        return None;
    }
    Some(PixelRect::new(
        min_x as i32,
        min_y as i32,
        max_x - min_x + 1,
        max_y - min_y + 1,
    ))
}

/// Trim `source` to its non-transparent bounding box, compositing it over `backdrop`.
///
/// A fully transparent source yields the 1×1 sentinel with empty bounds; callers treat
/// a 1×1 result as an empty composite.
pub fn autocrop(source: &RasterImage, backdrop: Backdrop<'_>) -> TokenResult<CompositeResult> {
    let Some(bounds) = opaque_bounds(source) else {
        tracing::debug!("autocrop found no visible pixels");
        return Ok(CompositeResult {
            image: RasterImage::sentinel(),
            bounds: PixelRect::default(),
        });
    };

    let cropped = crop(source, bounds);
    if backdrop.is_none() {
        return Ok(CompositeResult {
            image: cropped,
            bounds,
        });
    }

    let mut canvas = match backdrop.color {
        Some(c) => PremulCanvas::filled(bounds.width, bounds.height, c)?,
        None => PremulCanvas::new(bounds.width, bounds.height)?,
    };
    if let Some(bg) = backdrop.raster {
        canvas.paint(&crop(bg, bounds), 1.0)?;
    }
    canvas.paint(&cropped, 1.0)?;

    Ok(CompositeResult {
        image: canvas.into_raster()?,
        bounds,
    })
}

/// Copy the pixels of `rect` out of `source`; area outside `source` is transparent.
pub fn crop(source: &RasterImage, rect: PixelRect) -> RasterImage {
    if rect.x == 0
        && rect.y == 0
        && source.dimensions() == (rect.width, rect.height)
    {
        return source.clone();
    }
    resize_canvas(
        source,
        rect.width.min(i32::MAX as u32) as i32,
        rect.height.min(i32::MAX as u32) as i32,
        rect.x.saturating_neg(),
        rect.y.saturating_neg(),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/raster/crop.rs"]
mod tests;
