//! Sequential sample decoding for raw tile bytes.

use half::f16;

use super::SampleType;

/// Reads samples one at a time from a raw tile byte slice.
///
/// Tile data arrives as an interleaved, row-major byte stream. The
/// cursor decodes one sample per call, converting every encoding to a
/// normalized `f32`: byte samples map `0..=255` onto `0.0..=1.0`, half
/// floats are promoted, and full floats pass through untouched.
///
/// Reading past the end of the slice is a caller bug and panics. The
/// cursor is always sized from the same arithmetic that sized the
/// fetch buffer, so a well-formed tile never hits that case.
///
/// # Example
///
/// ```
/// use tilebake::format::{SampleCursor, SampleType};
///
/// let bytes = [0u8, 128, 255];
/// let mut cursor = SampleCursor::new(&bytes, SampleType::U8);
///
/// assert_eq!(cursor.read_sample(), 0.0);
/// assert_eq!(cursor.remaining(), 2);
/// ```
#[derive(Debug)]
pub struct SampleCursor<'a> {
    bytes: &'a [u8],
    sample_type: SampleType,
    offset: usize,
}

impl<'a> SampleCursor<'a> {
    /// Create a cursor over `bytes` holding samples of `sample_type`.
    pub fn new(bytes: &'a [u8], sample_type: SampleType) -> Self {
        Self {
            bytes,
            sample_type,
            offset: 0,
        }
    }

    /// Decode the next sample and advance past it.
    pub fn read_sample(&mut self) -> f32 {
        let start = self.offset;
        self.offset += self.sample_type.size_bytes();

        match self.sample_type {
            SampleType::U8 => f32::from(self.bytes[start]) / 255.0,
            SampleType::F16 => {
                let raw = [self.bytes[start], self.bytes[start + 1]];
                f16::from_ne_bytes(raw).to_f32()
            }
            SampleType::F32 => {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(&self.bytes[start..start + 4]);
                f32::from_ne_bytes(raw)
            }
        }
    }

    /// Number of whole samples left to read.
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset) / self.sample_type.size_bytes()
    }
}
