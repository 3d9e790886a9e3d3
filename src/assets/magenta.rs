//! Legacy overlays: a single flat raster where magenta marks the mask region.

use crate::foundation::core::{RasterImage, Rgba8};

/// Default colour-key tolerance. Deliberately tight: only near-exact magenta is keyed.
pub const DEFAULT_MAGENTA_THRESHOLD: u8 = 1;

/// Which half of a keyed raster to extract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPass {
    /// Keep keyed pixels, clear everything else.
    Mask,
    /// Keep non-keyed pixels, clear keyed ones.
    Overlay,
}

/// True when `px` counts as the magenta key under `threshold`.
///
/// Keyed means `|R - B| <= t`, `G <= R - t` and `G <= B - t`. Exact opaque magenta is
/// always keyed.
pub fn is_magenta_key(px: Rgba8, threshold: u8) -> bool {
    if px == Rgba8::MAGENTA {
        return true;
    }
    let (r, g, b) = (i16::from(px.r), i16::from(px.g), i16::from(px.b));
    let t = i16::from(threshold);
    (r - b).abs() <= t && g <= r - t && g <= b - t
}

/// Extract one pass from a legacy raster.
pub fn key_pass(source: &RasterImage, threshold: u8, pass: KeyPass) -> RasterImage {
    let keep_keyed = pass == KeyPass::Mask;
    let mut out = vec![0u8; source.as_bytes().len()];
    for (d, s) in out
        .chunks_exact_mut(4)
        .zip(source.as_bytes().chunks_exact(4))
    {
        let px = Rgba8::new(s[0], s[1], s[2], s[3]);
        if is_magenta_key(px, threshold) == keep_keyed {
            d.copy_from_slice(s);
        }
    }
    RasterImage::from_rgba8(source.width(), source.height(), out)
        .unwrap_or_else(|_| RasterImage::sentinel())
}

/// Split a legacy raster into its `(mask, overlay)` passes.
pub fn split_magenta(source: &RasterImage, threshold: u8) -> (RasterImage, RasterImage) {
    (
        key_pass(source, threshold, KeyPass::Mask),
        key_pass(source, threshold, KeyPass::Overlay),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/assets/magenta.rs"]
mod tests;
