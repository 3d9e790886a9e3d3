use std::path::Path;

use anyhow::Context;

use crate::{
    assets::{
        magenta::{DEFAULT_MAGENTA_THRESHOLD, split_magenta},
        psd::{looks_like_psd, parse_psd},
    },
    foundation::{
        core::RasterImage,
        error::{TokenError, TokenResult},
    },
    raster::canvas::resize_canvas,
};

/// File extensions accepted as overlay sources (lower-case, without the dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["psd", "png", "gif", "jpg", "jpeg", "bmp"];

/// Container indices of the mask and overlay layers in a layered source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerSelector {
    /// Index of the mask layer (0 is the flattened preview).
    pub mask_layer_index: usize,
    /// Index of the decorative overlay layer.
    pub overlay_layer_index: usize,
}

impl Default for LayerSelector {
    fn default() -> Self {
        Self {
            mask_layer_index: 1,
            overlay_layer_index: 2,
        }
    }
}

/// On-disk overlay encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlaySourceFormat {
    /// Flat raster, mask keyed by magenta.
    Legacy,
    /// Layered container with separate mask and overlay layers.
    Layered(LayerSelector),
}

impl OverlaySourceFormat {
    /// Pick a format from the file's leading bytes, falling back to its extension.
    pub fn sniff(path: Option<&Path>, head: &[u8], layers: LayerSelector) -> Option<Self> {
        if looks_like_psd(head) {
            return Some(Self::Layered(layers));
        }
        if image::guess_format(head).is_ok() {
            return Some(Self::Legacy);
        }
        match extension_of(path?)?.as_str() {
            "psd" => Some(Self::Layered(layers)),
            "png" | "gif" | "jpg" | "jpeg" | "bmp" => Some(Self::Legacy),
            _ => None,
        }
    }
}

/// Knobs for [`decode_overlay`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Layer indices used for layered sources.
    pub layers: LayerSelector,
    /// Colour-key tolerance used for legacy sources.
    pub magenta_threshold: u8,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            layers: LayerSelector::default(),
            magenta_threshold: DEFAULT_MAGENTA_THRESHOLD,
        }
    }
}

/// Decoded overlay: a mask and a decorative frame sharing one canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayAsset {
    /// Non-transparent pixels delimit the region kept by clipping.
    pub mask: RasterImage,
    /// Decorative frame painted above or below the portrait.
    pub overlay: RasterImage,
    /// Canvas width shared by `mask` and `overlay`.
    pub canvas_width: u32,
    /// Canvas height shared by `mask` and `overlay`.
    pub canvas_height: u32,
}

impl OverlayAsset {
    /// Empty state surfaced to callers after a failed decode.
    pub fn empty() -> Self {
        Self {
            mask: RasterImage::sentinel(),
            overlay: RasterImage::sentinel(),
            canvas_width: 1,
            canvas_height: 1,
        }
    }

    /// False for the state produced by [`OverlayAsset::empty`] and for assets whose mask
    /// has no visible pixel.
    pub fn has_mask(&self) -> bool {
        !self.mask.is_fully_transparent()
    }

    fn from_pair(mask: RasterImage, overlay: RasterImage) -> TokenResult<Self> {
        if mask.dimensions() != overlay.dimensions() {
            return Err(TokenError::decode(format!(
                "mask {}x{} and overlay {}x{} are not aligned",
                mask.width(),
                mask.height(),
                overlay.width(),
                overlay.height()
            )));
        }
        Ok(Self {
            canvas_width: mask.width(),
            canvas_height: mask.height(),
            mask,
            overlay,
        })
    }
}

/// True when `path` has one of the [`SUPPORTED_EXTENSIONS`].
pub fn is_supported_overlay(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Decode an overlay file into its aligned mask/overlay pair.
///
/// The file is read in one go and closed before any pixel work starts.
#[tracing::instrument(skip(opts), fields(path = %path.display()))]
pub fn decode_overlay(path: &Path, opts: &DecodeOptions) -> TokenResult<OverlayAsset> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read overlay '{}'", path.display()))
        .map_err(|e| TokenError::decode(format!("{e:#}")))?;
    decode_overlay_bytes(&bytes, Some(path), opts)
}

/// Decode an overlay, logging and returning [`OverlayAsset::empty`] on failure.
pub fn decode_overlay_or_empty(path: &Path, opts: &DecodeOptions) -> OverlayAsset {
    match decode_overlay(path, opts) {
        Ok(asset) => asset,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "skipping overlay");
            OverlayAsset::empty()
        }
    }
}

/// Decode an overlay held in memory. `name_hint` is only used for extension sniffing.
pub fn decode_overlay_bytes(
    bytes: &[u8],
    name_hint: Option<&Path>,
    opts: &DecodeOptions,
) -> TokenResult<OverlayAsset> {
    let format = OverlaySourceFormat::sniff(name_hint, bytes, opts.layers)
        .ok_or_else(|| TokenError::decode("unrecognised overlay format"))?;

    match format {
        OverlaySourceFormat::Legacy => {
            let source = decode_flat_raster(bytes)?;
            let (mask, overlay) = split_magenta(&source, opts.magenta_threshold);
            OverlayAsset::from_pair(mask, overlay)
        }
        OverlaySourceFormat::Layered(layers) => decode_layered(bytes, layers),
    }
}

/// Decode any flat raster the `image` crate understands into straight RGBA8.
pub fn decode_flat_raster(bytes: &[u8]) -> TokenResult<RasterImage> {
    let img = image::load_from_memory(bytes)
        .context("decode raster from memory")
        .map_err(|e| TokenError::decode(format!("{e:#}")))?;
    Ok(RasterImage::from_rgba_image(img.to_rgba8()))
}

fn decode_layered(bytes: &[u8], layers: LayerSelector) -> TokenResult<OverlayAsset> {
    let doc = parse_psd(bytes)?;
    let (w, h) = (doc.width as i32, doc.height as i32);

    let pad = |index: usize| -> TokenResult<RasterImage> {
        let layer = doc.layer(index)?;
        tracing::debug!(
            index,
            name = %layer.name,
            left = layer.left,
            top = layer.top,
            "extracting layer"
        );
        // Layers hanging off the top-left edge are pulled back onto the canvas whole.
        Ok(resize_canvas(&layer.image, w, h, layer.left.max(0), layer.top.max(0)))
    };

    let mask = pad(layers.mask_layer_index)?;
    let overlay = pad(layers.overlay_layer_index)?;
    OverlayAsset::from_pair(mask, overlay)
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
