//! GIF-variant LZW: variable-width codes (up to 12 bits), packed least-significant-bit first,
//! with reserved clear and end-of-information codes.

use std::collections::HashMap;

use crate::foundation::error::{GlyphError, GlyphResult};

const MAX_CODE_SIZE: u8 = 12;
const MAX_ENTRIES: usize = 1 << MAX_CODE_SIZE;

/// Smallest and largest minimum code size a GIF image block may declare.
pub const MIN_CODE_SIZE_RANGE: std::ops::RangeInclusive<u8> = 2..=8;

/// One arena slot: the entry is `prefix`'s sequence followed by `suffix`.
#[derive(Clone, Copy, Debug, Default)]
struct Entry {
    defined: bool,
    prefix: Option<u16>,
    suffix: u8,
    first: u8,
    len: u16,
}

/// Fixed-capacity code dictionary.
#[derive(Debug)]
struct Dictionary {
    entries: Box<[Entry; MAX_ENTRIES]>,
    next_code: u16,
}

impl Dictionary {
    fn new() -> Self {
        Self {
            entries: Box::new([Entry::default(); MAX_ENTRIES]),
            next_code: 0,
        }
    }

    fn reset(&mut self, min_code_size: u8) {
        let clear_code = 1u16 << min_code_size;
        for (i, e) in self.entries.iter_mut().enumerate() {
            *e = if (i as u16) < clear_code {
                Entry {
                    defined: true,
                    prefix: None,
                    suffix: i as u8,
                    first: i as u8,
                    len: 1,
                }
            } else {
                Entry::default()
            };
        }
        self.next_code = clear_code + 2;
    }

    fn get(&self, code: u16) -> Option<Entry> {
        self.entries
            .get(usize::from(code))
            .copied()
            .filter(|e| e.defined)
    }

    fn push(&mut self, prefix: u16, suffix: u8) {
        let Some(base) = self.get(prefix) else {
            return;
        };
        let slot = usize::from(self.next_code);
        if slot >= MAX_ENTRIES {
            return;
        }
        self.entries[slot] = Entry {
            defined: true,
            prefix: Some(prefix),
            suffix,
            first: base.first,
            len: base.len + 1,
        };
        self.next_code += 1;
    }

    /// Append the sequence for `code` to `out`. The code must be defined.
    fn emit(&self, code: u16, out: &mut Vec<u8>) {
        let Some(entry) = self.get(code) else {
            return;
        };
        let start = out.len();
        out.resize(start + usize::from(entry.len), 0);
        let mut cursor = Some(code);
        let mut at = out.len();
        while let Some(c) = cursor {
            let e = self.entries[usize::from(c)];
            at -= 1;
            out[at] = e.suffix;
            cursor = e.prefix;
        }
        debug_assert_eq!(at, start);
    }
}

/// Reads LSB-first variable-width codes from a byte slice.
#[derive(Debug)]
struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    acc: u32,
    bits: u8,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            acc: 0,
            bits: 0,
        }
    }

    fn read(&mut self, width: u8) -> Option<u16> {
        while self.bits < width {
            let byte = *self.bytes.get(self.pos)?;
            self.pos += 1;
            self.acc |= u32::from(byte) << self.bits;
            self.bits += 8;
        }
        let code = (self.acc & ((1u32 << width) - 1)) as u16;
        self.acc >>= width;
        self.bits -= width;
        Some(code)
    }
}

/// Observable decoder event, used to check code-width transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodeTrace {
    /// Code read from the stream.
    pub code: u16,
    /// Width the code was read with.
    pub width: u8,
    /// `next_code` after the code was processed.
    pub next_code: u16,
}

/// Reusable GIF LZW decoder. The dictionary arena is allocated once and reset per payload.
#[derive(Debug)]
pub struct LzwDecoder {
    dict: Dictionary,
    trace: Option<Vec<CodeTrace>>,
}

impl Default for LzwDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LzwDecoder {
    /// Decoder with an empty dictionary and tracing off.
    pub fn new() -> Self {
        Self {
            dict: Dictionary::new(),
            trace: None,
        }
    }

    /// Record every code processed by subsequent calls.
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    /// Codes recorded since tracing was enabled.
    pub fn trace(&self) -> &[CodeTrace] {
        self.trace.as_deref().unwrap_or(&[])
    }

    /// Decode one frame payload into palette indices.
    pub fn decompress(&mut self, payload: &[u8], min_code_size: u8) -> GlyphResult<Vec<u8>> {
        let mut out = Vec::new();
        self.decompress_into(payload, min_code_size, &mut out)?;
        Ok(out)
    }

    /// Decode one frame payload, appending palette indices to `out`.
    pub fn decompress_into(
        &mut self,
        payload: &[u8],
        min_code_size: u8,
        out: &mut Vec<u8>,
    ) -> GlyphResult<()> {
        if !MIN_CODE_SIZE_RANGE.contains(&min_code_size) {
            return Err(GlyphError::malformed(format!(
                "minimum code size {min_code_size} outside {}..={}",
                MIN_CODE_SIZE_RANGE.start(),
                MIN_CODE_SIZE_RANGE.end()
            )));
        }
        let clear_code = 1u16 << min_code_size;
        let eoi_code = clear_code + 1;
        let mut width = min_code_size + 1;
        let mut prev: Option<u16> = None;
        let mut reader = BitReader::new(payload);
        self.dict.reset(min_code_size);

        while let Some(code) = reader.read(width) {
            let read_width = width;
            if code == clear_code {
                self.dict.reset(min_code_size);
                width = min_code_size + 1;
                prev = None;
            } else if code == eoi_code {
                self.record(code, read_width);
                break;
            } else {
                let emitted_from = out.len();
                if self.dict.get(code).is_some() {
                    self.dict.emit(code, out);
                } else if let (Some(p), true) = (prev, code == self.dict.next_code) {
                    self.dict.emit(p, out);
                    out.push(out[emitted_from]);
                } else {
                    return Err(GlyphError::corrupt(format!(
                        "code {code} is undefined (next code {}, previous {prev:?})",
                        self.dict.next_code
                    )));
                }

                if let Some(p) = prev {
                    if self.dict.next_code == (1u16 << width) - 1 && width < MAX_CODE_SIZE {
                        width += 1;
                    }
                    let first = out[emitted_from];
                    self.dict.push(p, first);
                }
                prev = Some(code);
            }
            self.record(code, read_width);
        }
        Ok(())
    }

    fn record(&mut self, code: u16, width: u8) {
        if let Some(trace) = self.trace.as_mut() {
            trace.push(CodeTrace {
                code,
                width,
                next_code: self.dict.next_code,
            });
        }
    }
}

/// Packs variable-width codes LSB-first.
#[derive(Debug, Default)]
struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    bits: u8,
}

impl BitWriter {
    fn write(&mut self, code: u16, width: u8) {
        self.acc |= u32::from(code) << self.bits;
        self.bits += width;
        while self.bits >= 8 {
            self.out.push(self.acc as u8);
            self.acc >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.out.push(self.acc as u8);
        }
        self.out
    }
}

/// Encode `data` with the GIF LZW variant the decoder understands.
///
/// The stream starts with a clear code, emits another clear whenever the dictionary fills, and
/// ends with the end-of-information code. Every byte of `data` must be below
/// `1 << min_code_size`.
pub fn compress(data: &[u8], min_code_size: u8) -> GlyphResult<Vec<u8>> {
    if !MIN_CODE_SIZE_RANGE.contains(&min_code_size) {
        return Err(GlyphError::validation(format!(
            "minimum code size {min_code_size} outside {}..={}",
            MIN_CODE_SIZE_RANGE.start(),
            MIN_CODE_SIZE_RANGE.end()
        )));
    }
    let clear_code = 1u16 << min_code_size;
    let eoi_code = clear_code + 1;
    if let Some(&bad) = data.iter().find(|&&b| u16::from(b) >= clear_code) {
        return Err(GlyphError::validation(format!(
            "symbol {bad} does not fit minimum code size {min_code_size}"
        )));
    }

    let mut writer = BitWriter::default();
    let mut table: HashMap<(u16, u8), u16> = HashMap::new();
    let mut width = min_code_size + 1;
    let mut next_code = eoi_code + 1;
    writer.write(clear_code, width);

    let mut iter = data.iter().copied();
    let Some(first) = iter.next() else {
        writer.write(eoi_code, width);
        return Ok(writer.finish());
    };
    let mut prefix = u16::from(first);

    for byte in iter {
        if let Some(&code) = table.get(&(prefix, byte)) {
            prefix = code;
            continue;
        }
        writer.write(prefix, width);
        table.insert((prefix, byte), next_code);
        next_code += 1;
        if next_code > (1u16 << width) && width < MAX_CODE_SIZE {
            width += 1;
        }
        if usize::from(next_code) == MAX_ENTRIES {
            writer.write(clear_code, width);
            table.clear();
            width = min_code_size + 1;
            next_code = eoi_code + 1;
        }
        prefix = u16::from(byte);
    }

    writer.write(prefix, width);
    if next_code == (1u16 << width) && width < MAX_CODE_SIZE {
        width += 1;
    }
    writer.write(eoi_code, width);
    Ok(writer.finish())
}
