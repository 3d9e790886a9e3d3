use crate::foundation::{
    core::{RasterImage, Rgba8, byte_len},
    error::{TokenError, TokenResult},
    math::{mul_div255_u8, premultiply, premultiply_in_place, unpremultiply_in_place},
};

/// Premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over of premultiplied pixels with an extra layer opacity.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Blend an equally sized premultiplied buffer over `dst`.
pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> TokenResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(TokenError::validation(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Premultiplied working surface used while flattening layers.
#[derive(Clone, Debug)]
pub struct PremulCanvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PremulCanvas {
    /// Transparent surface. Fails when the byte size overflows.
    pub fn new(width: u32, height: u32) -> TokenResult<Self> {
        Ok(Self {
            width,
            height,
            data: vec![0u8; byte_len(width, height)?],
        })
    }

    /// Surface filled with a straight colour. Fails when the byte size overflows.
    pub fn filled(width: u32, height: u32, color: Rgba8) -> TokenResult<Self> {
        let px = premultiply(color.to_array());
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: px.repeat(len / 4),
        })
    }

    /// Paint a straight-alpha raster of the same size over this surface.
    pub fn paint(&mut self, layer: &RasterImage, opacity: f32) -> TokenResult<()> {
        if layer.dimensions() != (self.width, self.height) {
            return Err(TokenError::validation(format!(
                "cannot paint {}x{} layer onto {}x{} surface",
                layer.width(),
                layer.height(),
                self.width,
                self.height
            )));
        }
        let mut src = layer.to_vec();
        premultiply_in_place(&mut src);
        over_in_place(&mut self.data, &src, opacity)
    }

    /// Convert back to a straight-alpha raster.
    pub fn into_raster(self) -> TokenResult<RasterImage> {
        let mut data = self.data;
        unpremultiply_in_place(&mut data);
        RasterImage::from_rgba8(self.width, self.height, data)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/blend.rs"]
mod tests;
