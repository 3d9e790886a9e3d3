use crate::foundation::core::{Affine, PixelRect, RasterImage, Rect, Vec2};

/// Optional per-layer effects, applied after the layer is placed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayerEffects {
    /// Gaussian blur radius in pixels.
    pub blur_radius: Option<f32>,
    /// Glow intensity in `[0, 1]`.
    pub glow_level: Option<f32>,
}

impl LayerEffects {
    /// True when no effect would change the rendered pixels.
    pub fn is_noop(&self) -> bool {
        self.blur_radius.is_none_or(|r| r < 0.5) && self.glow_level.is_none_or(|g| g <= 0.0)
    }
}

/// Box a raster is fitted into before the layer transform applies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitBox {
    /// Box width in stage pixels.
    pub width: f64,
    /// Box height in stage pixels.
    pub height: f64,
    /// Keep the raster's aspect ratio (centred in the box) instead of stretching.
    pub preserve_ratio: bool,
}

/// Placement and presentation of one layer, owned by the caller.
///
/// The layer's local box (the fit box, or the raster's own size) has its top-left corner
/// at `translate`; scale and rotation pivot around the box centre.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerView {
    /// Pixels of the layer.
    pub raster: RasterImage,
    /// Position of the local box's top-left corner in stage space.
    pub translate: Vec2,
    /// Scale factors around the box centre.
    pub scale: Vec2,
    /// Clockwise rotation in degrees around the box centre.
    pub rotation_degrees: f64,
    /// Layer opacity in `[0, 1]`.
    pub opacity: f32,
    /// Blur / glow.
    pub effects: LayerEffects,
    /// Declared fit box, if any.
    pub fit: Option<FitBox>,
}

impl LayerView {
    /// Untransformed, fully opaque layer at the stage origin.
    pub fn new(raster: RasterImage) -> Self {
        Self {
            raster,
            translate: Vec2::ZERO,
            scale: Vec2::new(1.0, 1.0),
            rotation_degrees: 0.0,
            opacity: 1.0,
            effects: LayerEffects::default(),
            fit: None,
        }
    }

    /// Layer with nothing to draw.
    pub fn empty() -> Self {
        Self::new(RasterImage::transparent(0, 0))
    }

    /// Move the local box's top-left corner to `(x, y)`.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.translate = Vec2::new(x, y);
        self
    }

    /// Set scale factors.
    pub fn scaled(mut self, sx: f64, sy: f64) -> Self {
        self.scale = Vec2::new(sx, sy);
        self
    }

    /// Set rotation in degrees.
    pub fn rotated(mut self, degrees: f64) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    /// Set opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Set effects.
    pub fn with_effects(mut self, effects: LayerEffects) -> Self {
        self.effects = effects;
        self
    }

    /// Fit the raster into a `width × height` box.
    pub fn fitted(mut self, width: f64, height: f64, preserve_ratio: bool) -> Self {
        self.fit = Some(FitBox {
            width,
            height,
            preserve_ratio,
        });
        self
    }

    /// Size of the local box.
    pub fn local_size(&self) -> (f64, f64) {
        match self.fit {
            Some(fit) => (fit.width.max(0.0), fit.height.max(0.0)),
            None => (
                f64::from(self.raster.width()),
                f64::from(self.raster.height()),
            ),
        }
    }

    /// Raster pixels -> local box.
    pub fn content_transform(&self) -> Affine {
        let Some(fit) = self.fit else {
            return Affine::IDENTITY;
        };
        let (w, h) = (
            f64::from(self.raster.width()),
            f64::from(self.raster.height()),
        );
        if w == 0.0 || h == 0.0 {
            return Affine::IDENTITY;
        }
        let (sx, sy) = (fit.width / w, fit.height / h);
        if !fit.preserve_ratio {
            return Affine::scale_non_uniform(sx, sy);
        }
        let s = sx.min(sy);
        let dx = (fit.width - w * s) / 2.0;
        let dy = (fit.height - h * s) / 2.0;
        Affine::translate((dx, dy)) * Affine::scale(s)
    }

    /// Local box -> stage.
    pub fn placement(&self) -> Affine {
        let (w, h) = self.local_size();
        let center = Vec2::new(w / 2.0, h / 2.0);
        // T(translate) * T(center) * R(rotation) * S(scale) * T(-center)
        Affine::translate(self.translate)
            * Affine::translate(center)
            * Affine::rotate(self.rotation_degrees.to_radians())
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * Affine::translate(-center)
    }

    /// Raster pixels -> stage.
    pub fn to_affine(&self) -> Affine {
        self.placement() * self.content_transform()
    }

    /// Stage pixels covered by the transformed local box.
    pub fn stage_bounds(&self) -> PixelRect {
        let (w, h) = self.local_size();
        if w <= 0.0 || h <= 0.0 || self.raster.pixel_count() == 0 {
            return PixelRect::default();
        }
        PixelRect::covering(self.placement().transform_rect_bbox(Rect::new(0.0, 0.0, w, h)))
    }

    /// `Some((dx, dy))` when the full transform is a whole-pixel translation, meaning the
    /// raster can be copied without resampling.
    pub fn integer_offset(&self) -> Option<(i32, i32)> {
        const EPS: f64 = 1e-9;
        let [a, b, c, d, e, f] = self.to_affine().as_coeffs();
        let unit = (a - 1.0).abs() < EPS
            && b.abs() < EPS
            && c.abs() < EPS
            && (d - 1.0).abs() < EPS;
        let (rx, ry) = (e.round(), f.round());
        let whole = (e - rx).abs() < EPS && (f - ry).abs() < EPS;
        let in_range = rx.abs() < f64::from(i32::MAX) && ry.abs() < f64::from(i32::MAX);
        (unit && whole && in_range).then_some((rx as i32, ry as i32))
    }

    /// True when the layer can contribute pixels.
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0 && !self.stage_bounds().is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/layer.rs"]
mod tests;
