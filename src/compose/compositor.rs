use crate::{
    compose::{
        layer::LayerView,
        renderer::{CpuLayerRenderer, LayerRenderer},
    },
    foundation::{
        core::{CompositeResult, PixelRect, RasterImage, Rgba8},
        error::{TokenError, TokenResult},
    },
    raster::{
        blend::PremulCanvas,
        clip::clip_with_mask,
        crop::{Backdrop, autocrop},
    },
};

/// Largest stage edge, in pixels, the compositor will allocate.
pub const MAX_STAGE_SIZE: u32 = 16_384;

/// Tunables for [`Compositor`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComposeSettings {
    /// Solid colour behind the token. Clipped tokens get it beneath the background inside
    /// the mask; unclipped tokens get it across the whole stage beneath every layer.
    pub background_fill: Option<Rgba8>,
}

/// The four layers of a token plus the two stacking switches.
#[derive(Clone, Debug)]
pub struct TokenLayers {
    /// Bottom-most decorative layer.
    pub background: LayerView,
    /// The user's image.
    pub portrait: LayerView,
    /// Clip shape, never drawn itself.
    pub mask: LayerView,
    /// Frame drawn above the portrait.
    pub overlay: LayerView,
    /// Draw the overlay beneath the portrait stack instead of above it.
    pub use_overlay_as_base: bool,
    /// Clip background and portrait to the mask.
    pub clip_portrait: bool,
}

/// Produces the flattened token image from the current layer state.
#[derive(Clone, Debug, Default)]
pub struct Compositor<R: LayerRenderer = CpuLayerRenderer> {
    renderer: R,
    settings: ComposeSettings,
}

impl Compositor<CpuLayerRenderer> {
    /// CPU compositor.
    pub fn new(settings: ComposeSettings) -> Self {
        Self::with_renderer(CpuLayerRenderer, settings)
    }
}

impl<R: LayerRenderer> Compositor<R> {
    /// Compositor over a custom layer renderer.
    pub fn with_renderer(renderer: R, settings: ComposeSettings) -> Self {
        Self { renderer, settings }
    }

    /// Active settings.
    pub fn settings(&self) -> &ComposeSettings {
        &self.settings
    }

    /// Convenience over [`Compositor::compose`].
    pub fn compose_layers(&self, layers: &TokenLayers) -> TokenResult<CompositeResult> {
        self.compose(
            &layers.background,
            &layers.portrait,
            &layers.mask,
            &layers.overlay,
            layers.use_overlay_as_base,
            layers.clip_portrait,
        )
    }

    /// Flatten the layers into a cropped token image.
    ///
    /// Without clipping the stage is the union of the visible layers' bounds. With
    /// clipping the stage is the mask's bounds and background and portrait keep only the
    /// pixels under visible mask pixels; a mask with no visible pixels clips them away
    /// entirely. Clipping is skipped only when the mask's box is empty. The result is
    /// always auto-cropped; an empty result is the 1×1 sentinel. Stages wider or taller
    /// than [`MAX_STAGE_SIZE`] are rejected. Reads its inputs only, so repeated calls with
    /// the same state give identical bytes.
    #[tracing::instrument(level = "debug", skip(self, background, portrait, mask, overlay))]
    pub fn compose(
        &self,
        background: &LayerView,
        portrait: &LayerView,
        mask: &LayerView,
        overlay: &LayerView,
        use_overlay_as_base: bool,
        clip_portrait: bool,
    ) -> TokenResult<CompositeResult> {
        let mask_bounds = mask.stage_bounds();
        let clip = clip_portrait && !mask_bounds.is_empty();
        if clip_portrait && !clip {
            tracing::debug!("mask box is empty, composing without clip");
        }

        let viewport = if clip {
            mask_bounds
        } else {
            [background, portrait, overlay]
                .into_iter()
                .filter(|l| l.is_visible())
                .fold(PixelRect::default(), |acc, l| acc.union(l.stage_bounds()))
        };
        if viewport.is_empty() {
            tracing::debug!("no visible layers");
            return Ok(CompositeResult {
                image: RasterImage::sentinel(),
                bounds: PixelRect::default(),
            });
        }
        if viewport.width > MAX_STAGE_SIZE || viewport.height > MAX_STAGE_SIZE {
            return Err(TokenError::validation(format!(
                "stage {}x{} exceeds the {MAX_STAGE_SIZE}px limit",
                viewport.width, viewport.height
            )));
        }

        let mut bg = self.render_visible(background, viewport)?;
        let mut fg = self.render_visible(portrait, viewport)?;
        let top = self.render_visible(overlay, viewport)?;

        let mut bg_opacity = background.opacity;
        if clip {
            let clip_mask = self.renderer.render_layer(mask, viewport, false)?;
            if let Some(fill) = self.settings.background_fill {
                let mut filled = PremulCanvas::filled(viewport.width, viewport.height, fill)?;
                if let Some(raster) = &bg {
                    filled.paint(raster, background.opacity)?;
                }
                bg = Some(filled.into_raster()?);
                bg_opacity = 1.0;
            }
            bg = bg.map(|r| clip_with_mask(&r, &clip_mask)).transpose()?;
            fg = fg.map(|r| clip_with_mask(&r, &clip_mask)).transpose()?;
        }

        let base = [(bg, bg_opacity), (fg, portrait.opacity)];
        let frame = (top, overlay.opacity);
        let mut order = Vec::with_capacity(3);
        if use_overlay_as_base {
            order.push(frame);
            order.extend(base);
        } else {
            order.extend(base);
            order.push(frame);
        }

        let mut canvas = match self.settings.background_fill {
            Some(fill) if !clip => PremulCanvas::filled(viewport.width, viewport.height, fill)?,
            _ => PremulCanvas::new(viewport.width, viewport.height)?,
        };
        for (raster, opacity) in order {
            if let Some(raster) = raster {
                canvas.paint(&raster, opacity)?;
            }
        }
        let flat = canvas.into_raster()?;

        let cropped = autocrop(&flat, Backdrop::NONE)?;
        if cropped.bounds.is_empty() {
            return Ok(cropped);
        }
        Ok(CompositeResult {
            bounds: PixelRect::new(
                cropped.bounds.x.saturating_add(viewport.x),
                cropped.bounds.y.saturating_add(viewport.y),
                cropped.bounds.width,
                cropped.bounds.height,
            ),
            image: cropped.image,
        })
    }

    fn render_visible(
        &self,
        layer: &LayerView,
        viewport: PixelRect,
    ) -> TokenResult<Option<RasterImage>> {
        if !layer.is_visible() {
            return Ok(None);
        }
        self.renderer.render_layer(layer, viewport, true).map(Some)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/compositor.rs"]
mod tests;
