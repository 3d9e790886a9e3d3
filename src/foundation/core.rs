use std::sync::Arc;

use crate::foundation::error::{TokenError, TokenResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Straight (non-premultiplied) RGBA8 colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque magenta, the legacy colour key.
    pub const MAGENTA: Self = Self::new(255, 0, 255, 255);

    /// Build a colour from its four channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels as `[r, g, b, a]`.
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Build a colour from `[r, g, b, a]`.
    pub const fn from_array(px: [u8; 4]) -> Self {
        Self::new(px[0], px[1], px[2], px[3])
    }
}

/// Integer pixel rectangle. `x`/`y` may be negative when describing stage space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelRect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Build a rectangle from origin and size.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge.
    pub fn right(self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Smallest rectangle covering both inputs. Empty rectangles are ignored.
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Self::new(x0, y0, (x1 - i64::from(x0)) as u32, (y1 - i64::from(y0)) as u32)
    }

    /// Integer rectangle that fully covers a floating-point rectangle.
    ///
    /// Edges within `1e-6` of a whole pixel snap to it, so rotations by right angles do
    /// not grow the rectangle by a row of rounding noise.
    pub fn covering(rect: Rect) -> Self {
        let snap = |v: f64| {
            let r = v.round();
            if (v - r).abs() < 1e-6 { r } else { v }
        };
        let x0 = snap(rect.x0).floor();
        let y0 = snap(rect.y0).floor();
        let x1 = snap(rect.x1).ceil();
        let y1 = snap(rect.y1).ceil();
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return Self::default();
        }
        let w = (x1 - x0).max(0.0) as u32;
        let h = (y1 - y0).max(0.0) as u32;
        Self::new(x0 as i32, y0 as i32, w, h)
    }
}

/// Immutable raster: straight-alpha RGBA8, row-major, tightly packed.
///
/// Cloning is cheap; the pixel buffer is shared. Every operation in this crate builds a
/// fresh raster instead of mutating one that might be observed elsewhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    data: Arc<Vec<u8>>,
}

impl RasterImage {
    /// Wrap an RGBA8 byte buffer. Fails unless `data.len() == width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> TokenResult<Self> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(TokenError::validation(format!(
                "raster {width}x{height} expects {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data: Arc::new(data),
        })
    }

    /// Fully transparent raster.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgba8::TRANSPARENT)
    }

    /// Raster where every pixel is `color`.
    pub fn filled(width: u32, height: u32, color: Rgba8) -> Self {
        let n = width as usize * height as usize;
        Self {
            width,
            height,
            data: Arc::new(color.to_array().repeat(n)),
        }
    }

    /// The 1×1 transparent raster returned for empty composites.
    pub fn sentinel() -> Self {
        Self::transparent(1, 1)
    }

    /// True for a 1×1 raster, which callers treat as "empty composite".
    pub fn is_sentinel(&self) -> bool {
        self.width == 1 && self.height == 1
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels (`width * height`).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy of the raw RGBA8 bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.as_ref().clone()
    }

    /// Pixel at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.data[idx..idx + 4];
        Some(Rgba8::new(px[0], px[1], px[2], px[3]))
    }

    /// True when every pixel has zero alpha.
    pub fn is_fully_transparent(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// True when the raster shares its pixel buffer with `other`.
    pub fn shares_buffer_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Convert into an `image` crate buffer for encoding.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_raw(self.width, self.height, self.to_vec())
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    /// Wrap an `image` crate buffer.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: Arc::new(img.into_raw()),
        }
    }
}

/// Composite produced by the layer compositor: the trimmed raster plus the rectangle of
/// the flattened stage it was cropped from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeResult {
    /// Final raster.
    pub image: RasterImage,
    /// Crop rectangle in flattened-stage coordinates.
    pub bounds: PixelRect,
}

impl CompositeResult {
    /// True for the 1×1 sentinel. Any 1×1 composite counts as empty, even an opaque one;
    /// check `bounds` to tell a lone visible pixel apart.
    pub fn is_empty(&self) -> bool {
        self.image.is_sentinel()
    }
}

pub(crate) fn byte_len(width: u32, height: u32) -> TokenResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| TokenError::validation("raster buffer size overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
