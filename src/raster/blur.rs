use crate::foundation::{
    core::byte_len,
    error::{TokenError, TokenResult},
};

/// Largest accepted blur radius, in pixels.
pub const MAX_BLUR_RADIUS: u32 = 256;

/// Sigma used for a radius when the caller gives only a radius.
pub fn sigma_for_radius(radius_px: u32) -> f32 {
    (radius_px as f32 / 3.0).max(0.5)
}

/// Separable Gaussian blur of a premultiplied RGBA8 buffer. Edges clamp.
pub fn blur_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius_px: u32,
    sigma: f32,
) -> TokenResult<Vec<u8>> {
    let expected_len = byte_len(width, height)?;
    if src.len() != expected_len {
        return Err(TokenError::effects(
            "blur expects a buffer matching width*height*4",
        ));
    }
    if radius_px > MAX_BLUR_RADIUS {
        return Err(TokenError::effects(format!(
            "blur radius {radius_px} exceeds {MAX_BLUR_RADIUS}"
        )));
    }
    if radius_px == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    let kernel = kernel_q16(radius_px, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];
    convolve(src, &mut tmp, width, height, &kernel, Axis::X);
    convolve(&tmp, &mut out, width, height, &kernel, Axis::Y);
    Ok(out)
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

/// Normalised Gaussian weights in Q16; they sum to exactly 65536.
fn kernel_q16(radius_px: u32, sigma: f32) -> TokenResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(TokenError::effects("blur sigma must be finite and > 0"));
    }
    let r = radius_px as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let raw: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    if sum <= 0.0 {
        return Err(TokenError::effects("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = raw
        .iter()
        .map(|w| ((w / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let total: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let mid = weights.len() / 2;
    weights[mid] = (i64::from(weights[mid]) + 65536 - total).clamp(0, 65536) as u32;
    Ok(weights)
}

fn convolve(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i64;
    let (w, h) = (i64::from(width), i64::from(height));
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i64 - radius;
                let (sx, sy) = match axis {
                    Axis::X => ((x + d).clamp(0, w - 1), y),
                    Axis::Y => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) * 4) as usize;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) * 4) as usize;
            for (c, a) in acc.iter().enumerate() {
                dst[out + c] = ((a + 32768) >> 16).min(255) as u8;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/blur.rs"]
mod tests;
