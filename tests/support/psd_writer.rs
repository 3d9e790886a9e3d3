//! Minimal writer for layered test fixtures (PSD v1, 8-bit RGB).
#![allow(dead_code)]

pub struct FixtureLayer {
    pub name: &'static str,
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    /// Straight RGBA8, row-major.
    pub rgba: Vec<u8>,
    pub rle: bool,
}

impl FixtureLayer {
    pub fn solid(name: &'static str, left: i32, top: i32, w: u32, h: u32, px: [u8; 4]) -> Self {
        Self {
            name,
            left,
            top,
            width: w,
            height: h,
            rgba: px.repeat((w * h) as usize),
            rle: false,
        }
    }

    pub fn with_rle(mut self) -> Self {
        self.rle = true;
        self
    }
}

pub fn encode_psd(width: u32, height: u32, layers: &[FixtureLayer]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"8BPS");
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&[0u8; 6]);
    out.extend_from_slice(&3u16.to_be_bytes());
    out.extend_from_slice(&height.to_be_bytes());
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&8u16.to_be_bytes());
    out.extend_from_slice(&3u16.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());

    let mut info = Vec::new();
    info.extend_from_slice(&(layers.len() as i16).to_be_bytes());
    let mut channel_blobs = Vec::new();
    for layer in layers {
        let mut blobs = Vec::new();
        for (id, offset) in [(-1i16, 3usize), (0, 0), (1, 1), (2, 2)] {
            let plane: Vec<u8> = layer.rgba.chunks_exact(4).map(|p| p[offset]).collect();
            blobs.push((id, encode_channel(&plane, layer.width, layer.height, layer.rle)));
        }

        info.extend_from_slice(&layer.top.to_be_bytes());
        info.extend_from_slice(&layer.left.to_be_bytes());
        info.extend_from_slice(&(layer.top + layer.height as i32).to_be_bytes());
        info.extend_from_slice(&(layer.left + layer.width as i32).to_be_bytes());
        info.extend_from_slice(&(blobs.len() as u16).to_be_bytes());
        for (id, blob) in &blobs {
            info.extend_from_slice(&id.to_be_bytes());
            info.extend_from_slice(&(blob.len() as u32).to_be_bytes());
        }
        info.extend_from_slice(b"8BIMnorm");
        info.extend_from_slice(&[255, 0, 0, 0]);

        let mut name = vec![layer.name.len() as u8];
        name.extend_from_slice(layer.name.as_bytes());
        while name.len() % 4 != 0 {
            name.push(0);
        }
        info.extend_from_slice(&((8 + name.len()) as u32).to_be_bytes());
        info.extend_from_slice(&0u32.to_be_bytes());
        info.extend_from_slice(&0u32.to_be_bytes());
        info.extend_from_slice(&name);

        channel_blobs.extend(blobs.into_iter().map(|(_, b)| b));
    }
    for blob in channel_blobs {
        info.extend_from_slice(&blob);
    }
    if info.len() % 2 != 0 {
        info.push(0);
    }

    let mut section = Vec::new();
    section.extend_from_slice(&(info.len() as u32).to_be_bytes());
    section.extend_from_slice(&info);
    section.extend_from_slice(&0u32.to_be_bytes());

    out.extend_from_slice(&(section.len() as u32).to_be_bytes());
    out.extend_from_slice(&section);

    // Flattened composite: raw, three zeroed planes.
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend(std::iter::repeat_n(0u8, (width * height * 3) as usize));
    out
}

fn encode_channel(plane: &[u8], width: u32, height: u32, rle: bool) -> Vec<u8> {
    let mut out = Vec::new();
    if !rle {
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(plane);
        return out;
    }
    out.extend_from_slice(&1u16.to_be_bytes());
    let rows: Vec<Vec<u8>> = plane
        .chunks(width.max(1) as usize)
        .take(height as usize)
        .map(pack_row)
        .collect();
    for row in &rows {
        out.extend_from_slice(&(row.len() as u16).to_be_bytes());
    }
    for row in rows {
        out.extend_from_slice(&row);
    }
    out
}

/// PackBits: runs of 3+ equal bytes become repeat packets, the rest literals.
fn pack_row(row: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < row.len() {
        let mut run = 1;
        while i + run < row.len() && row[i + run] == row[i] && run < 128 {
            run += 1;
        }
        if run >= 3 {
            out.push((1i16 - run as i16) as i8 as u8);
            out.push(row[i]);
            i += run;
            continue;
        }
        let start = i;
        while i < row.len() && i - start < 128 {
            if i + 2 < row.len() && row[i] == row[i + 1] && row[i] == row[i + 2] {
                break;
            }
            i += 1;
        }
        out.push((i - start - 1) as u8);
        out.extend_from_slice(&row[start..i]);
    }
    out
}
