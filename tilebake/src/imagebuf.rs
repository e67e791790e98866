//! In-memory image buffer assembled from tiles.
//!
//! [`ImageBuffer`] owns the full-resolution pixel window the tile loop
//! writes into. Storage is typed to match the source format (8-bit,
//! half float, or full float) so a byte source never pays for float
//! storage, while the access API speaks normalized `f32` throughout.
//!
//! Writes outside the pixel window are silently dropped. Sources round
//! their tile grid up to whole tiles, so edge tiles routinely cover
//! pixels that do not exist; dropping those samples is the expected
//! path, not an error.

use half::f16;
use thiserror::Error;

use crate::format::SampleType;

/// Heap exhaustion while reserving sample storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to reserve {bytes} bytes of sample storage")]
pub struct AllocError {
    bytes: usize,
}

impl AllocError {
    /// The allocation size that could not be reserved.
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

/// Typed sample storage backing an [`ImageBuffer`].
#[derive(Debug, Clone)]
pub enum Samples {
    /// 8-bit integer samples; 255 represents 1.0.
    U8(Vec<u8>),
    /// Half-float samples.
    F16(Vec<f16>),
    /// Full-float samples.
    F32(Vec<f32>),
}

impl Samples {
    fn sample_type(&self) -> SampleType {
        match self {
            Samples::U8(_) => SampleType::U8,
            Samples::F16(_) => SampleType::F16,
            Samples::F32(_) => SampleType::F32,
        }
    }
}

/// A row-major, channel-interleaved pixel window.
///
/// Samples are addressed by `(x, y, channel)` with the origin at the
/// top-left corner. All storage starts zeroed.
///
/// # Example
///
/// ```
/// use tilebake::format::SampleType;
/// use tilebake::imagebuf::ImageBuffer;
///
/// let mut image = ImageBuffer::new(4, 4, 3, SampleType::F32).unwrap();
/// image.set(1, 2, 0, 0.5);
///
/// assert_eq!(image.get(1, 2, 0), 0.5);
/// assert_eq!(image.get(0, 0, 0), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    channels: usize,
    samples: Samples,
}

impl ImageBuffer {
    /// Allocate a zeroed buffer for `width * height` pixels of
    /// `channels` samples each.
    ///
    /// Storage is reserved with a fallible allocation so that an
    /// oversized image surfaces as an error instead of aborting the
    /// process.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] when the sample storage cannot be
    /// reserved.
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        sample_type: SampleType,
    ) -> Result<Self, AllocError> {
        let len = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(channels))
            .ok_or(AllocError { bytes: usize::MAX })?;

        let samples = match sample_type {
            SampleType::U8 => Samples::U8(zeroed(len, 0u8, 1)?),
            SampleType::F16 => Samples::F16(zeroed(len, f16::ZERO, 2)?),
            SampleType::F32 => Samples::F32(zeroed(len, 0.0f32, 4)?),
        };

        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// Width of the pixel window.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the pixel window.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Samples per pixel (3 for RGB, 4 for RGBA).
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Encoding of the backing storage.
    pub fn sample_type(&self) -> SampleType {
        self.samples.sample_type()
    }

    /// The raw typed storage, row-major and channel-interleaved.
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Whether `(x, y)` lies inside the pixel window.
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Write a normalized sample at `(x, y, channel)`.
    ///
    /// Coordinates outside the pixel window are dropped without
    /// complaint. For 8-bit storage the value is clamped to the unit
    /// range and quantized; float storage takes the value as given.
    /// `channel` must be below [`channels()`](Self::channels).
    pub fn set(&mut self, x: usize, y: usize, channel: usize, value: f32) {
        if !self.contains(x, y) {
            return;
        }
        let index = (y * self.width + x) * self.channels + channel;
        match &mut self.samples {
            Samples::U8(data) => data[index] = (value.clamp(0.0, 1.0) * 255.0).round() as u8,
            Samples::F16(data) => data[index] = f16::from_f32(value),
            Samples::F32(data) => data[index] = value,
        }
    }

    /// Read the normalized sample at `(x, y, channel)`.
    ///
    /// Panics when the coordinates are out of range.
    pub fn get(&self, x: usize, y: usize, channel: usize) -> f32 {
        assert!(self.contains(x, y), "pixel ({x}, {y}) out of range");
        let index = (y * self.width + x) * self.channels + channel;
        match &self.samples {
            Samples::U8(data) => f32::from(data[index]) / 255.0,
            Samples::F16(data) => data[index].to_f32(),
            Samples::F32(data) => data[index],
        }
    }
}

fn zeroed<T: Clone>(len: usize, zero: T, size_of: usize) -> Result<Vec<T>, AllocError> {
    let bytes = len.saturating_mul(size_of);
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| AllocError { bytes })?;
    data.resize(len, zero);
    Ok(data)
}
