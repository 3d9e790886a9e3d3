//! JSON description of a token to compose, consumed by the `tokenforge compose` command.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    assets::{
        decode::{DecodeOptions, LayerSelector, decode_flat_raster, decode_overlay},
        magenta::DEFAULT_MAGENTA_THRESHOLD,
    },
    compose::{
        compositor::{ComposeSettings, Compositor, TokenLayers},
        layer::{LayerEffects, LayerView},
    },
    export::encode::export_token,
    foundation::{
        core::{CompositeResult, RasterImage, Rgba8},
        error::{TokenError, TokenResult},
    },
    raster::blur::MAX_BLUR_RADIUS,
};

/// A portrait or background layer read from disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerSpec {
    /// Image file; relative paths resolve against the job file's directory.
    pub source: PathBuf,
    /// Top-left corner in stage pixels.
    #[serde(default)]
    pub translate: [f64; 2],
    /// Scale around the layer centre.
    #[serde(default = "unit_scale")]
    pub scale: [f64; 2],
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Opacity in `[0, 1]`.
    #[serde(default = "full_opacity")]
    pub opacity: f32,
    /// Blur radius in pixels.
    #[serde(default)]
    pub blur: Option<f32>,
    /// Glow level in `[0, 1]`.
    #[serde(default)]
    pub glow: Option<f32>,
}

/// Full description of one token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenJob {
    /// Overlay file (layered or legacy).
    pub overlay: PathBuf,
    /// Box the overlay and its mask are fitted into, aspect preserved. Defaults to the
    /// overlay's own canvas.
    #[serde(default)]
    pub overlay_size: Option<[f64; 2]>,
    /// Overlay opacity in `[0, 1]`.
    #[serde(default = "full_opacity")]
    pub overlay_opacity: f32,
    /// Portrait layer.
    #[serde(default)]
    pub portrait: Option<LayerSpec>,
    /// Background layer.
    #[serde(default)]
    pub background: Option<LayerSpec>,
    /// Draw the overlay beneath portrait and background.
    #[serde(default)]
    pub use_overlay_as_base: bool,
    /// Clip portrait and background to the overlay's mask.
    #[serde(default = "enabled")]
    pub clip_portrait: bool,
    /// Solid colour behind the token; limited to the mask when clipping.
    #[serde(default)]
    pub background_color: Option<Rgba8>,
    /// Legacy colour-key tolerance.
    #[serde(default = "default_threshold")]
    pub magenta_threshold: u8,
    /// Layer index of the mask in layered overlays.
    #[serde(default = "default_mask_layer")]
    pub mask_layer: usize,
    /// Layer index of the overlay artwork in layered overlays.
    #[serde(default = "default_overlay_layer")]
    pub overlay_layer: usize,
}

fn unit_scale() -> [f64; 2] {
    [1.0, 1.0]
}

fn full_opacity() -> f32 {
    1.0
}

fn enabled() -> bool {
    true
}

fn default_threshold() -> u8 {
    DEFAULT_MAGENTA_THRESHOLD
}

fn default_mask_layer() -> usize {
    LayerSelector::default().mask_layer_index
}

fn default_overlay_layer() -> usize {
    LayerSelector::default().overlay_layer_index
}

/// Output of [`TokenJob::render`].
#[derive(Clone, Debug)]
pub struct RenderedToken {
    /// Flattened, cropped composite.
    pub composite: CompositeResult,
    /// Size of the placed overlay, used to frame clipped tokens.
    pub overlay_size: (u32, u32),
    /// Whether the composite was clipped.
    pub clipped: bool,
}

impl RenderedToken {
    /// Write the token; the format follows the extension of `path`.
    pub fn export(&self, path: &Path) -> TokenResult<()> {
        export_token(&self.composite, self.clipped, self.overlay_size, path)
    }
}

impl TokenJob {
    /// Parse a job from JSON text without resolving paths.
    pub fn from_json_str(text: &str) -> TokenResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| TokenError::validation(format!("invalid job json: {e}")))
    }

    /// Read, parse, resolve and validate a job file.
    pub fn load(path: &Path) -> TokenResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read job file '{}'", path.display()))?;
        let mut job = Self::from_json_str(&text)?;
        if let Some(dir) = path.parent() {
            job.resolve_paths(dir);
        }
        job.validate()?;
        Ok(job)
    }

    /// Make relative source paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.overlay);
        for spec in [&mut self.portrait, &mut self.background].into_iter().flatten() {
            resolve(&mut spec.source);
        }
    }

    /// Reject settings the compositor cannot honour.
    pub fn validate(&self) -> TokenResult<()> {
        check_opacity("overlay_opacity", self.overlay_opacity)?;
        if let Some([w, h]) = self.overlay_size
            && !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0)
        {
            return Err(TokenError::validation(
                "overlay_size must be two positive numbers",
            ));
        }
        if self.mask_layer == 0 || self.overlay_layer == 0 {
            return Err(TokenError::validation(
                "mask_layer and overlay_layer are 1-based",
            ));
        }
        for (name, spec) in [("portrait", &self.portrait), ("background", &self.background)] {
            if let Some(spec) = spec {
                spec.validate(name)?;
            }
        }
        Ok(())
    }

    /// Decoder settings implied by the job.
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            layers: LayerSelector {
                mask_layer_index: self.mask_layer,
                overlay_layer_index: self.overlay_layer,
            },
            magenta_threshold: self.magenta_threshold,
        }
    }

    /// Compositor settings implied by the job.
    pub fn compose_settings(&self) -> ComposeSettings {
        ComposeSettings {
            background_fill: self.background_color,
        }
    }

    /// Decode every source and arrange the layers.
    pub fn build_layers(&self) -> TokenResult<TokenLayers> {
        let asset = decode_overlay(&self.overlay, &self.decode_options())?;
        let place = |raster: RasterImage| {
            let view = LayerView::new(raster);
            match self.overlay_size {
                Some([w, h]) => view.fitted(w, h, true),
                None => view,
            }
        };
        Ok(TokenLayers {
            background: load_layer(self.background.as_ref())?,
            portrait: load_layer(self.portrait.as_ref())?,
            mask: place(asset.mask),
            overlay: place(asset.overlay).with_opacity(self.overlay_opacity),
            use_overlay_as_base: self.use_overlay_as_base,
            clip_portrait: self.clip_portrait,
        })
    }

    /// Decode and compose the token.
    pub fn render(&self) -> TokenResult<RenderedToken> {
        let layers = self.build_layers()?;
        let overlay_size = {
            let b = layers.overlay.stage_bounds();
            (b.width, b.height)
        };
        let composite = Compositor::new(self.compose_settings()).compose_layers(&layers)?;
        Ok(RenderedToken {
            composite,
            overlay_size,
            clipped: self.clip_portrait,
        })
    }
}

impl LayerSpec {
    fn validate(&self, name: &str) -> TokenResult<()> {
        check_opacity(&format!("{name}.opacity"), self.opacity)?;
        let finite = self.translate.iter().chain(&self.scale).all(|v| v.is_finite())
            && self.rotation.is_finite();
        if !finite {
            return Err(TokenError::validation(format!(
                "{name} transform must be finite"
            )));
        }
        if let Some(blur) = self.blur
            && !(blur.is_finite() && (0.0..=MAX_BLUR_RADIUS as f32).contains(&blur))
        {
            return Err(TokenError::validation(format!(
                "{name}.blur must be within [0, {MAX_BLUR_RADIUS}]"
            )));
        }
        if let Some(glow) = self.glow
            && !(0.0..=1.0).contains(&glow)
        {
            return Err(TokenError::validation(format!(
                "{name}.glow must be within [0, 1]"
            )));
        }
        Ok(())
    }

    fn view(&self, raster: RasterImage) -> LayerView {
        LayerView::new(raster)
            .at(self.translate[0], self.translate[1])
            .scaled(self.scale[0], self.scale[1])
            .rotated(self.rotation)
            .with_opacity(self.opacity)
            .with_effects(LayerEffects {
                blur_radius: self.blur,
                glow_level: self.glow,
            })
    }
}

fn load_layer(spec: Option<&LayerSpec>) -> TokenResult<LayerView> {
    let Some(spec) = spec else {
        return Ok(LayerView::empty());
    };
    let bytes = std::fs::read(&spec.source)
        .with_context(|| format!("read layer source '{}'", spec.source.display()))
        .map_err(|e| TokenError::decode(format!("{e:#}")))?;
    Ok(spec.view(decode_flat_raster(&bytes)?))
}

fn check_opacity(name: &str, value: f32) -> TokenResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TokenError::validation(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
#[path = "../tests/unit/job.rs"]
mod tests;
