#![allow(dead_code)]

//! Byte-level GIF fixture builder shared by the integration tests.

pub type Palette = Vec<[u8; 3]>;

/// One image block plus its optional graphic control extension.
#[derive(Clone, Debug)]
pub struct FrameSpec {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    /// Delay in hundredths of a second; `None` omits the graphic control extension.
    pub delay: Option<u16>,
    pub transparent: Option<u8>,
    pub local_table: Option<Palette>,
    pub min_code_size: u8,
    pub indices: Vec<u8>,
}

impl FrameSpec {
    /// Full-canvas frame with a graphic control extension.
    pub fn full(width: u16, height: u16, delay: u16, indices: Vec<u8>) -> Self {
        assert_eq!(indices.len(), usize::from(width) * usize::from(height));
        Self {
            left: 0,
            top: 0,
            width,
            height,
            delay: Some(delay),
            transparent: None,
            local_table: None,
            min_code_size: 2,
            indices,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GifBuilder {
    bytes: Vec<u8>,
}

impl GifBuilder {
    pub fn new(width: u16, height: u16, global: Option<&Palette>) -> Self {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        match global {
            Some(table) => {
                bytes.extend_from_slice(&[0x80 | size_field(table.len()), 0, 0]);
                push_table(&mut bytes, table);
            }
            None => bytes.extend_from_slice(&[0, 0, 0]),
        }
        Self { bytes }
    }

    pub fn netscape_loop(mut self, count: u16) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xFF, 11]);
        self.bytes.extend_from_slice(b"NETSCAPE2.0");
        self.bytes.extend_from_slice(&[3, 1]);
        self.bytes.extend_from_slice(&count.to_le_bytes());
        self.bytes.push(0);
        self
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xFE]);
        push_sub_blocks(&mut self.bytes, text.as_bytes());
        self
    }

    pub fn frame(mut self, frame: &FrameSpec) -> Self {
        if let Some(delay) = frame.delay {
            let flags = u8::from(frame.transparent.is_some());
            self.bytes.extend_from_slice(&[0x21, 0xF9, 4, flags]);
            self.bytes.extend_from_slice(&delay.to_le_bytes());
            self.bytes.extend_from_slice(&[frame.transparent.unwrap_or(0), 0]);
        }
        self.bytes.push(0x2C);
        for v in [frame.left, frame.top, frame.width, frame.height] {
            self.bytes.extend_from_slice(&v.to_le_bytes());
        }
        match &frame.local_table {
            Some(table) => {
                self.bytes.push(0x80 | size_field(table.len()));
                push_table(&mut self.bytes, table);
            }
            None => self.bytes.push(0),
        }
        self.bytes.push(frame.min_code_size);
        let data = glyphgif::compress(&frame.indices, frame.min_code_size).unwrap();
        push_sub_blocks(&mut self.bytes, &data);
        self
    }

    /// Append raw bytes (for malformed fixtures).
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.bytes.push(0x3B);
        self.bytes
    }

    pub fn without_trailer(self) -> Vec<u8> {
        self.bytes
    }
}

fn size_field(len: usize) -> u8 {
    assert!(
        len.is_power_of_two() && (2..=256).contains(&len),
        "color table length {len}"
    );
    (len.trailing_zeros() - 1) as u8
}

fn push_table(bytes: &mut Vec<u8>, table: &Palette) {
    for rgb in table {
        bytes.extend_from_slice(rgb);
    }
}

fn push_sub_blocks(bytes: &mut Vec<u8>, data: &[u8]) {
    for chunk in data.chunks(255) {
        bytes.push(chunk.len() as u8);
        bytes.extend_from_slice(chunk);
    }
    bytes.push(0);
}

/// `[[0,0,0],[255,0,0],[0,255,0],[0,0,255]]`
pub fn rgb_palette() -> Palette {
    vec![[0, 0, 0], [255, 0, 0], [0, 255, 0], [0, 0, 255]]
}

/// Deterministic xorshift bytes in `0..modulo`.
pub fn noise(len: usize, modulo: u8, mut seed: u32) -> Vec<u8> {
    (0..len)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            (seed % u32::from(modulo)) as u8
        })
        .collect()
}

/// Session options with an explicit 1x1 block size, no pacing and raster output.
pub fn raster_opts() -> glyphgif::SessionOpts {
    glyphgif::SessionOpts {
        compression: Some((1, 1)),
        raster: true,
        pace: false,
        ..glyphgif::SessionOpts::default()
    }
}
