//! Layered raster compositing for tabletop tokens.
//!
//! An overlay (a decorative frame plus the mask that defines its inside) is decoded from
//! a layered PSD or a magenta-keyed flat image. The caller places a portrait and an
//! optional background as [`LayerView`]s, and [`Compositor::compose`] clips them to the
//! mask, stacks the overlay on top (or beneath), flattens everything and trims the result
//! to its visible pixels.
//!
//! ```no_run
//! use std::path::Path;
//! use tokenforge::{
//!     ComposeSettings, Compositor, DecodeOptions, LayerView, RasterImage, decode_overlay,
//! };
//!
//! # fn main() -> tokenforge::TokenResult<()> {
//! let overlay = decode_overlay(Path::new("frame.psd"), &DecodeOptions::default())?;
//! let portrait = LayerView::new(RasterImage::transparent(64, 64)).at(10.0, 10.0);
//! let token = Compositor::new(ComposeSettings::default()).compose(
//!     &LayerView::empty(),
//!     &portrait,
//!     &LayerView::new(overlay.mask),
//!     &LayerView::new(overlay.overlay),
//!     false,
//!     true,
//! )?;
//! println!("{}x{}", token.image.width(), token.image.height());
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod compose;
mod export;
mod foundation;
mod job;
mod library;
mod raster;

pub use assets::{
    decode::{
        DecodeOptions, LayerSelector, OverlayAsset, OverlaySourceFormat, SUPPORTED_EXTENSIONS,
        decode_flat_raster, decode_overlay, decode_overlay_bytes, decode_overlay_or_empty,
        is_supported_overlay,
    },
    magenta::{DEFAULT_MAGENTA_THRESHOLD, KeyPass, is_magenta_key, key_pass, split_magenta},
    psd::{PSD_SIGNATURE, PsdDocument, PsdLayer, looks_like_psd, parse_psd},
    thumb::{DEFAULT_THUMB_SIZE, fit_thumbnail},
};
pub use compose::{
    compositor::{ComposeSettings, Compositor, MAX_STAGE_SIZE, TokenLayers},
    layer::{FitBox, LayerEffects, LayerView},
    renderer::{CpuLayerRenderer, LayerRenderer},
    session::{PreviewState, PreviewUpdate, RepaintCoalescer},
};
pub use export::encode::{
    ExportFormat, encode_raster, encode_to_vec, export_portrait, export_token, token_raster,
};
pub use foundation::{
    core::{Affine, CompositeResult, PixelRect, Point, RasterImage, Rect, Rgba8, Vec2},
    error::{TokenError, TokenResult},
};
pub use job::{LayerSpec, RenderedToken, TokenJob};
pub use library::{
    cancel::CancelToken,
    scan::{
        OverlayEntry, OverlayTree, ScanCounts, ScanOptions, ScanProgress, ScanReport,
        scan_overlay_library, scan_overlay_library_with_progress,
    },
};
pub use raster::{
    blend::{PremulCanvas, PremulRgba8, over, over_in_place},
    blur::{MAX_BLUR_RADIUS, blur_premul, sigma_for_radius},
    canvas::{resize_canvas, resize_canvas_centered},
    clip::clip_with_mask,
    crop::{Backdrop, autocrop, crop, opaque_bounds},
    glow::{GLOW_RADIUS, glow_premul},
};
