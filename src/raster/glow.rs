use crate::{
    foundation::error::{TokenError, TokenResult},
    raster::blur::{blur_premul, sigma_for_radius},
};

/// Radius of the halo spread used by [`glow_premul`].
pub const GLOW_RADIUS: u32 = 6;

/// Brighten a premultiplied buffer with a blurred copy of itself scaled by `level`.
///
/// `level` is clamped to `[0, 1]`. Alpha is left untouched and colour channels saturate at
/// the pixel's alpha so the output stays a valid premultiplied buffer.
pub fn glow_premul(src: &[u8], width: u32, height: u32, level: f32) -> TokenResult<Vec<u8>> {
    if !level.is_finite() {
        return Err(TokenError::effects("glow level must be finite"));
    }
    let level = level.clamp(0.0, 1.0);
    if level == 0.0 {
        return Ok(src.to_vec());
    }

    let halo = blur_premul(src, width, height, GLOW_RADIUS, sigma_for_radius(GLOW_RADIUS))?;
    let gain = (level * 256.0).round() as u32;
    let mut out = src.to_vec();
    for (px, h) in out.chunks_exact_mut(4).zip(halo.chunks_exact(4)) {
        let a = u32::from(px[3]);
        for c in 0..3 {
            let boosted = u32::from(px[c]) + ((u32::from(h[c]) * gain) >> 8);
            px[c] = boosted.min(a) as u8;
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/raster/glow.rs"]
mod tests;
