use std::{
    io::{Cursor, Seek, Write},
    path::Path,
};

use anyhow::Context;

use crate::{
    foundation::{
        core::{CompositeResult, RasterImage},
        error::{TokenError, TokenResult},
        math::premultiply,
    },
    raster::{
        canvas::resize_canvas_centered,
        crop::{Backdrop, autocrop},
    },
};

/// Output container for exported tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Lossless with alpha.
    Png,
    /// Lossy, no alpha; flattened onto black.
    Jpeg,
    /// Uncompressed with alpha.
    Bmp,
    /// Palette with 1-bit transparency.
    Gif,
}

impl ExportFormat {
    /// Format for a lowercase or uppercase file extension without the dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Format implied by the extension of `path`.
    pub fn from_path(path: &Path) -> TokenResult<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| {
                TokenError::encode(format!(
                    "cannot infer export format from '{}'",
                    path.display()
                ))
            })
    }

    /// Whether the container keeps an alpha channel.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }

    fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Gif => image::ImageFormat::Gif,
        }
    }
}

/// Encode `raster` into `writer`.
pub fn encode_raster<W: Write + Seek>(
    raster: &RasterImage,
    format: ExportFormat,
    writer: &mut W,
) -> TokenResult<()> {
    let img = if format.supports_alpha() {
        image::DynamicImage::ImageRgba8(raster.to_rgba_image())
    } else {
        image::DynamicImage::ImageRgb8(flatten_onto_black(raster)?)
    };
    img.write_to(writer, format.image_format())
        .map_err(|e| TokenError::encode(format!("{format:?} encoding failed: {e}")))
}

/// Encode `raster` into a fresh byte buffer.
pub fn encode_to_vec(raster: &RasterImage, format: ExportFormat) -> TokenResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    encode_raster(raster, format, &mut cursor)?;
    Ok(cursor.into_inner())
}

/// Raster that would be written for a token: when the portrait is clipped the composite
/// is centred on a canvas the size of the overlay, otherwise it is written as composed.
pub fn token_raster(
    result: &CompositeResult,
    clip_portrait: bool,
    overlay_size: (u32, u32),
) -> RasterImage {
    let (w, h) = overlay_size;
    if !clip_portrait || w == 0 || h == 0 {
        return result.image.clone();
    }
    resize_canvas_centered(
        &result.image,
        w.min(i32::MAX as u32) as i32,
        h.min(i32::MAX as u32) as i32,
    )
}

/// Write a composed token to `path`; the format follows the extension.
pub fn export_token(
    result: &CompositeResult,
    clip_portrait: bool,
    overlay_size: (u32, u32),
    path: &Path,
) -> TokenResult<()> {
    let format = ExportFormat::from_path(path)?;
    write_file(&token_raster(result, clip_portrait, overlay_size), format, path)
}

/// Write a portrait on its own: trimmed to its visible pixels and painted over the
/// optional backdrop.
pub fn export_portrait(raster: &RasterImage, backdrop: Backdrop<'_>, path: &Path) -> TokenResult<()> {
    let format = ExportFormat::from_path(path)?;
    let cropped = autocrop(raster, backdrop)?;
    write_file(&cropped.image, format, path)
}

fn write_file(raster: &RasterImage, format: ExportFormat, path: &Path) -> TokenResult<()> {
    let bytes = encode_to_vec(raster, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    tracing::debug!(path = %path.display(), ?format, "exported");
    Ok(())
}

fn flatten_onto_black(raster: &RasterImage) -> TokenResult<image::RgbImage> {
    let mut rgb = Vec::with_capacity(raster.pixel_count() * 3);
    for px in raster.as_bytes().chunks_exact(4) {
        let p = premultiply([px[0], px[1], px[2], px[3]]);
        rgb.extend_from_slice(&p[..3]);
    }
    image::RgbImage::from_raw(raster.width(), raster.height(), rgb)
        .ok_or_else(|| TokenError::encode("rgb buffer size mismatch"))
}

#[cfg(test)]
#[path = "../../tests/unit/export/encode.rs"]
mod tests;
