use crate::foundation::{
    core::RasterImage,
    error::{TokenError, TokenResult},
};

/// Intersect `source` with `mask`: a pixel survives where the mask pixel has any
/// non-zero alpha and becomes fully transparent elsewhere. The cutoff is binary; mask
/// alpha does not weight the result.
pub fn clip_with_mask(source: &RasterImage, mask: &RasterImage) -> TokenResult<RasterImage> {
    if source.dimensions() != mask.dimensions() {
        return Err(TokenError::validation(format!(
            "clip expects equal dimensions, source {}x{} vs mask {}x{}",
            source.width(),
            source.height(),
            mask.width(),
            mask.height()
        )));
    }

    let mut out = vec![0u8; source.as_bytes().len()];
    for ((d, s), m) in out
        .chunks_exact_mut(4)
        .zip(source.as_bytes().chunks_exact(4))
        .zip(mask.as_bytes().chunks_exact(4))
    {
        if m[3] != 0 {
            d.copy_from_slice(s);
        }
    }
    RasterImage::from_rgba8(source.width(), source.height(), out)
}

#[cfg(test)]
#[path = "../../tests/unit/raster/clip.rs"]
mod tests;
