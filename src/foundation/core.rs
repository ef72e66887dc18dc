/// 0-based index of a decoded frame in stream order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Placement of one frame's sub-image on the logical screen, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRect {
    /// Column of the left edge.
    pub left: u16,
    /// Row of the top edge.
    pub top: u16,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
}

impl FrameRect {
    /// Number of pixels covered by the rectangle.
    pub fn area(self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

/// One color table entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    /// Construct from channel values.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Ordered list of RGB triples that palette indices resolve through.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColorTable(pub Vec<Rgb>);

impl ColorTable {
    /// Build a table from packed `r,g,b,r,g,b,...` bytes. A trailing partial triple is ignored.
    pub fn from_packed(bytes: &[u8]) -> Self {
        Self(
            bytes
                .chunks_exact(3)
                .map(|c| Rgb::new(c[0], c[1], c[2]))
                .collect(),
        )
    }

    /// Entry for `index`, if the table is large enough.
    pub fn get(&self, index: u8) -> Option<Rgb> {
        self.0.get(usize::from(index)).copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Size in bytes of a color table declared by the 3-bit size field of a packed flags byte.
pub(crate) fn color_table_bytes(size_field: u8) -> usize {
    3 * (1usize << ((size_field & 0b111) + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_table_sizes_follow_size_field() {
        assert_eq!(color_table_bytes(0), 6);
        assert_eq!(color_table_bytes(1), 12);
        assert_eq!(color_table_bytes(7), 768);
    }

    #[test]
    fn from_packed_ignores_trailing_partial_triple() {
        let t = ColorTable::from_packed(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(1), Some(Rgb::new(4, 5, 6)));
        assert_eq!(t.get(2), None);
    }

    #[test]
    fn rect_area() {
        let r = FrameRect {
            left: 3,
            top: 4,
            width: 5,
            height: 6,
        };
        assert_eq!(r.area(), 30);
    }
}
