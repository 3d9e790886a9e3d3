use std::sync::Arc;

use crate::{
    compose::layer::{LayerEffects, LayerView},
    foundation::{
        core::{Affine, PixelRect, RasterImage, byte_len},
        error::{TokenError, TokenResult},
        math::{premultiply_in_place, unpremultiply_in_place},
    },
    raster::{
        blur::{blur_premul, sigma_for_radius},
        canvas::blit_into,
        glow::glow_premul,
    },
};

/// Rasterizes a single layer into a window of stage space.
///
/// Output pixel `(0, 0)` corresponds to stage pixel `(viewport.x, viewport.y)` and the
/// returned raster is always `viewport.width × viewport.height`. Layer opacity is NOT
/// applied here; the compositor applies it while flattening.
pub trait LayerRenderer {
    /// Render `layer` into `viewport`, optionally running its effects.
    fn render_layer(
        &self,
        layer: &LayerView,
        viewport: PixelRect,
        with_effects: bool,
    ) -> TokenResult<RasterImage>;
}

/// CPU renderer: whole-pixel translations are copied exactly, anything else is resampled
/// through `vello_cpu`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuLayerRenderer;

impl LayerRenderer for CpuLayerRenderer {
    fn render_layer(
        &self,
        layer: &LayerView,
        viewport: PixelRect,
        with_effects: bool,
    ) -> TokenResult<RasterImage> {
        if viewport.is_empty() {
            return Ok(RasterImage::sentinel());
        }
        if layer.raster.pixel_count() == 0 || layer.stage_bounds().is_empty() {
            return Ok(RasterImage::transparent(viewport.width, viewport.height));
        }

        let effects = with_effects && !layer.effects.is_noop();
        let placed = match layer.integer_offset() {
            Some((dx, dy)) => {
                let ox = i64::from(dx) - i64::from(viewport.x);
                let oy = i64::from(dy) - i64::from(viewport.y);
                blit_layer(&layer.raster, viewport, ox, oy)?
            }
            None => rasterize_vello(layer, viewport)?,
        };

        if !effects {
            return Ok(placed);
        }
        let mut premul = placed.to_vec();
        premultiply_in_place(&mut premul);
        let mut out = apply_effects(&premul, viewport.width, viewport.height, layer.effects)?;
        unpremultiply_in_place(&mut out);
        RasterImage::from_rgba8(viewport.width, viewport.height, out)
    }
}

fn blit_layer(
    raster: &RasterImage,
    viewport: PixelRect,
    offset_x: i64,
    offset_y: i64,
) -> TokenResult<RasterImage> {
    let (w, h) = (viewport.width, viewport.height);
    if offset_x == 0 && offset_y == 0 && raster.dimensions() == (w, h) {
        return Ok(raster.clone());
    }
    let mut out = vec![0u8; byte_len(w, h)?];
    // Offsets outside i32 can only miss the viewport entirely.
    if let (Ok(ox), Ok(oy)) = (i32::try_from(offset_x), i32::try_from(offset_y)) {
        blit_into(&mut out, w, h, raster, ox, oy);
    }
    RasterImage::from_rgba8(w, h, out)
}

fn rasterize_vello(layer: &LayerView, viewport: PixelRect) -> TokenResult<RasterImage> {
    let width_u16: u16 = viewport
        .width
        .try_into()
        .map_err(|_| TokenError::effects("viewport width exceeds u16"))?;
    let height_u16: u16 = viewport
        .height
        .try_into()
        .map_err(|_| TokenError::effects("viewport height exceeds u16"))?;

    let mut src = layer.raster.to_vec();
    premultiply_in_place(&mut src);
    let pixmap = premul_bytes_to_pixmap(&src, layer.raster.width(), layer.raster.height())?;
    let paint = vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    };

    let to_viewport = Affine::translate((-f64::from(viewport.x), -f64::from(viewport.y)));
    let transform = to_viewport * layer.to_affine();

    let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(layer.raster.width()),
        f64::from(layer.raster.height()),
    ));
    ctx.flush();

    let mut target = vello_cpu::Pixmap::new(width_u16, height_u16);
    ctx.render_to_pixmap(&mut target);

    let mut data = target.data_as_u8_slice().to_vec();
    unpremultiply_in_place(&mut data);
    RasterImage::from_rgba8(viewport.width, viewport.height, data)
}

/// Glow first, then blur, both on premultiplied pixels.
fn apply_effects(
    premul: &[u8],
    width: u32,
    height: u32,
    effects: LayerEffects,
) -> TokenResult<Vec<u8>> {
    let mut buf = match effects.glow_level {
        Some(level) => glow_premul(premul, width, height, level)?,
        None => premul.to_vec(),
    };
    if let Some(radius) = effects.blur_radius {
        if !radius.is_finite() || radius < 0.0 {
            return Err(TokenError::effects(format!(
                "blur radius must be a non-negative number, got {radius}"
            )));
        }
        let radius_px = radius.round() as u32;
        if radius_px > 0 {
            buf = blur_premul(&buf, width, height, radius_px, sigma_for_radius(radius_px))?;
        }
    }
    Ok(buf)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> TokenResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| TokenError::effects("layer width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| TokenError::effects("layer height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(TokenError::effects("layer byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        });
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/compose/renderer.rs"]
mod tests;
