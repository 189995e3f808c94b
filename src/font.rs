//! The bitmap font table supplied by the platform.
//!
//! A font covers all 256 single-byte character codes with fixed-size glyphs,
//! stored back to back. Each glyph is `glyph_height` rows of `bytes_per_row`
//! bytes, with the leftmost pixel in the most significant bit of the first
//! byte of the row.

/// Character codes covered by a font table.
const GLYPH_COUNT: usize = 256;

/// A borrowed view into a bitmap font table.
#[derive(Debug, Clone, Copy)]
pub struct Font<'a> {
    data: &'a [u8],
    glyph_width: usize,
    glyph_height: usize,
    bytes_per_row: usize,
}

impl<'a> Font<'a> {
    /// Wraps a raw font table. `data` must hold exactly 256 glyphs of
    /// `glyph_width` by `glyph_height` pixels, rows padded up to whole bytes.
    pub fn new(
        data: &'a [u8],
        glyph_width: usize,
        glyph_height: usize,
    ) -> Result<Self, &'static str> {
        if glyph_width == 0 || glyph_height == 0 {
            return Err("glyph dimensions must be non-zero");
        }
        let bytes_per_row = (glyph_width + 7) / 8;
        if data.len() != GLYPH_COUNT * glyph_height * bytes_per_row {
            return Err("font data length does not match the glyph geometry");
        }
        Ok(Self {
            data,
            glyph_width,
            glyph_height,
            bytes_per_row,
        })
    }

    pub fn glyph_width(&self) -> usize {
        self.glyph_width
    }

    pub fn glyph_height(&self) -> usize {
        self.glyph_height
    }

    /// Bits per stored bitmap row, including the padding bits.
    pub(crate) fn row_bits(&self) -> usize {
        self.bytes_per_row * 8
    }

    /// The bitmap bytes for one character code.
    pub fn glyph(&self, code: u8) -> &'a [u8] {
        let size = self.glyph_height * self.bytes_per_row;
        let start = usize::from(code) * size;
        &self.data[start..start + size]
    }
}
