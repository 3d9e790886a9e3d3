//! Reader for the layered overlay container (Photoshop PSD, version 1, 8-bit).
//!
//! Only what overlays need is decoded: the canvas size and every layer record's bounds,
//! flags, and RGB(A) or grayscale(A) channel planes. Raw and PackBits channel data are
//! supported; ZIP-compressed channels are rejected.

use crate::foundation::{
    core::RasterImage,
    error::{TokenError, TokenResult},
};

/// File signature of the layered container.
pub const PSD_SIGNATURE: &[u8; 4] = b"8BPS";

const MAX_DIMENSION: u32 = 30_000;
const COLOR_MODE_GRAYSCALE: u16 = 1;
const COLOR_MODE_RGB: u16 = 3;
const FLAG_HIDDEN: u8 = 0b0000_0010;

/// Parsed layered document.
#[derive(Clone, Debug)]
pub struct PsdDocument {
    /// Declared canvas width.
    pub width: u32,
    /// Declared canvas height.
    pub height: u32,
    /// Layer records, bottom-most first.
    pub layers: Vec<PsdLayer>,
}

/// One layer record with its decoded pixels.
#[derive(Clone, Debug)]
pub struct PsdLayer {
    /// Layer name (Pascal string from the record).
    pub name: String,
    /// Left edge on the canvas; may be negative.
    pub left: i32,
    /// Top edge on the canvas; may be negative.
    pub top: i32,
    /// Layer opacity, 0..=255.
    pub opacity: u8,
    /// Hidden flag from the record.
    pub hidden: bool,
    /// Layer pixels sized to the record's bounds.
    pub image: RasterImage,
}

impl PsdDocument {
    /// Layer addressed by container index: index 0 is the flattened composite, index
    /// `n >= 1` is layer record `n - 1`.
    pub fn layer(&self, index: usize) -> TokenResult<&PsdLayer> {
        if index == 0 {
            return Err(TokenError::decode(
                "layer index 0 is the flattened preview, not a layer record",
            ));
        }
        self.layers.get(index - 1).ok_or_else(|| {
            TokenError::decode(format!(
                "layer {index} requested but the document has {} layer(s)",
                self.layers.len()
            ))
        })
    }
}

/// True when `bytes` start with the container signature.
pub fn looks_like_psd(bytes: &[u8]) -> bool {
    bytes.starts_with(PSD_SIGNATURE)
}

/// Parse a complete document from memory.
pub fn parse_psd(bytes: &[u8]) -> TokenResult<PsdDocument> {
    let mut r = Reader::new(bytes);

    if r.take(4)? != PSD_SIGNATURE {
        return Err(TokenError::decode("missing 8BPS signature"));
    }
    let version = r.u16()?;
    if version != 1 {
        return Err(TokenError::decode(format!(
            "unsupported container version {version} (only version 1)"
        )));
    }
    r.skip(6)?;
    let _channels = r.u16()?;
    let height = r.u32()?;
    let width = r.u32()?;
    let depth = r.u16()?;
    let color_mode = r.u16()?;

    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(TokenError::decode(format!(
            "canvas {width}x{height} is out of range"
        )));
    }
    if depth != 8 {
        return Err(TokenError::decode(format!(
            "unsupported bit depth {depth} (only 8)"
        )));
    }
    if color_mode != COLOR_MODE_RGB && color_mode != COLOR_MODE_GRAYSCALE {
        return Err(TokenError::decode(format!(
            "unsupported colour mode {color_mode}"
        )));
    }

    let color_data_len = r.u32()? as usize;
    r.skip(color_data_len)?;
    let resources_len = r.u32()? as usize;
    r.skip(resources_len)?;

    let layer_and_mask_len = r.u32()? as usize;
    let layers = if layer_and_mask_len == 0 {
        Vec::new()
    } else {
        let mut section = Reader::new(r.take(layer_and_mask_len)?);
        let layer_info_len = section.u32()? as usize;
        if layer_info_len == 0 {
            Vec::new()
        } else {
            read_layer_info(&mut Reader::new(section.take(layer_info_len)?), color_mode)?
        }
    };

    Ok(PsdDocument {
        width,
        height,
        layers,
    })
}

struct LayerRecord {
    name: String,
    top: i32,
    left: i32,
    bottom: i32,
    right: i32,
    opacity: u8,
    hidden: bool,
    channels: Vec<(i16, usize)>,
}

impl LayerRecord {
    fn size(&self) -> TokenResult<(u32, u32)> {
        let w = i64::from(self.right) - i64::from(self.left);
        let h = i64::from(self.bottom) - i64::from(self.top);
        if w < 0 || h < 0 || w > i64::from(MAX_DIMENSION) || h > i64::from(MAX_DIMENSION) {
            return Err(TokenError::decode(format!(
                "layer '{}' has invalid bounds",
                self.name
            )));
        }
        Ok((w as u32, h as u32))
    }
}

fn read_layer_info(r: &mut Reader<'_>, color_mode: u16) -> TokenResult<Vec<PsdLayer>> {
    // A negative count only signals that the first alpha channel holds merged transparency.
    let count = r.i16()?.unsigned_abs() as usize;

    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(read_record(r)?);
    }

    let mut layers = Vec::with_capacity(count);
    for rec in records {
        let (w, h) = rec.size()?;
        let plane_len = w as usize * h as usize;
        let mut planes: [Option<Vec<u8>>; 4] = [None, None, None, None];

        for &(id, len) in &rec.channels {
            let data = r.take(len)?;
            let slot = match id {
                0..=2 => Some(id as usize),
                -1 => Some(3),
                _ => None,
            };
            let Some(slot) = slot else {
                continue;
            };
            planes[slot] = Some(decode_channel(data, w, h).map_err(|e| {
                TokenError::decode(format!("layer '{}' channel {id}: {e}", rec.name))
            })?);
        }

        let mut rgba = vec![0u8; plane_len * 4];
        for (i, px) in rgba.chunks_exact_mut(4).enumerate() {
            let sample = |slot: usize| planes[slot].as_ref().map(|p| p[i]);
            if color_mode == COLOR_MODE_GRAYSCALE {
                let v = sample(0).unwrap_or(0);
                px[..3].copy_from_slice(&[v, v, v]);
            } else {
                px[0] = sample(0).unwrap_or(0);
                px[1] = sample(1).unwrap_or(0);
                px[2] = sample(2).unwrap_or(0);
            }
            px[3] = sample(3).unwrap_or(255);
        }

        layers.push(PsdLayer {
            image: RasterImage::from_rgba8(w, h, rgba)?,
            name: rec.name,
            left: rec.left,
            top: rec.top,
            opacity: rec.opacity,
            hidden: rec.hidden,
        });
    }
    Ok(layers)
}

fn read_record(r: &mut Reader<'_>) -> TokenResult<LayerRecord> {
    let top = r.i32()?;
    let left = r.i32()?;
    let bottom = r.i32()?;
    let right = r.i32()?;

    let channel_count = r.u16()? as usize;
    let mut channels = Vec::with_capacity(channel_count);
    for _ in 0..channel_count {
        let id = r.i16()?;
        let len = r.u32()? as usize;
        channels.push((id, len));
    }

    if r.take(4)? != b"8BIM" {
        return Err(TokenError::decode("layer record missing blend signature"));
    }
    let _blend_key = r.take(4)?;
    let opacity = r.u8()?;
    let _clipping = r.u8()?;
    let flags = r.u8()?;
    let _filler = r.u8()?;

    let extra_len = r.u32()? as usize;
    let mut extra = Reader::new(r.take(extra_len)?);
    let mask_len = extra.u32()? as usize;
    extra.skip(mask_len)?;
    let ranges_len = extra.u32()? as usize;
    extra.skip(ranges_len)?;
    let name_len = extra.u8()? as usize;
    let name = String::from_utf8_lossy(extra.take(name_len)?).into_owned();

    Ok(LayerRecord {
        name,
        top,
        left,
        bottom,
        right,
        opacity,
        hidden: flags & FLAG_HIDDEN != 0,
        channels,
    })
}

fn decode_channel(data: &[u8], width: u32, height: u32) -> TokenResult<Vec<u8>> {
    let plane_len = width as usize * height as usize;
    let mut r = Reader::new(data);
    if plane_len == 0 {
        return Ok(Vec::new());
    }
    match r.u16()? {
        0 => Ok(r.take(plane_len)?.to_vec()),
        1 => {
            let mut row_lens = Vec::with_capacity(height as usize);
            for _ in 0..height {
                row_lens.push(r.u16()? as usize);
            }
            let mut plane = Vec::with_capacity(plane_len);
            for len in row_lens {
                let row = unpack_bits(r.take(len)?, width as usize)?;
                plane.extend_from_slice(&row);
            }
            Ok(plane)
        }
        other => Err(TokenError::decode(format!(
            "unsupported channel compression {other}"
        ))),
    }
}

/// Expand one PackBits-encoded row to exactly `expected` bytes.
pub(crate) fn unpack_bits(src: &[u8], expected: usize) -> TokenResult<Vec<u8>> {
    let mut out = Vec::with_capacity(expected);
    let mut i = 0usize;
    while i < src.len() && out.len() < expected {
        let n = src[i] as i8;
        i += 1;
        match n {
            0..=127 => {
                let count = n as usize + 1;
                let lit = src
                    .get(i..i + count)
                    .ok_or_else(|| TokenError::decode("packbits literal run is truncated"))?;
                out.extend_from_slice(lit);
                i += count;
            }
            -127..=-1 => {
                let count = (1 - i16::from(n)) as usize;
                let v = *src
                    .get(i)
                    .ok_or_else(|| TokenError::decode("packbits repeat run is truncated"))?;
                out.resize(out.len() + count, v);
                i += 1;
            }
            // -128 is a no-op.
            _ => {}
        }
    }
    if out.len() != expected {
        return Err(TokenError::decode(format!(
            "packbits row expanded to {} bytes, expected {expected}",
            out.len()
        )));
    }
    Ok(out)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> TokenResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| {
                TokenError::decode(format!(
                    "unexpected end of data: wanted {n} byte(s) at offset {}",
                    self.pos
                ))
            })?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn skip(&mut self, n: usize) -> TokenResult<()> {
        self.take(n).map(|_| ())
    }

    fn u8(&mut self) -> TokenResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> TokenResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn i16(&mut self) -> TokenResult<i16> {
        Ok(self.u16()? as i16)
    }

    fn u32(&mut self) -> TokenResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i32(&mut self) -> TokenResult<i32> {
        Ok(self.u32()? as i32)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/psd.rs"]
mod tests;
