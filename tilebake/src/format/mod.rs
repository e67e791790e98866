//! Pixel format descriptions for tiled image sources.
//!
//! A host application hands over tile data as a flat byte stream whose
//! layout is described by a [`PixelFormat`]: the channel count (RGB or
//! RGBA) and the per-channel sample encoding (8-bit integer, 16-bit
//! half float, or 32-bit float). All size arithmetic for tile buffers
//! derives from these two properties.
//!
//! # Example
//!
//! ```
//! use tilebake::format::{PixelFormat, SampleType};
//!
//! let format: PixelFormat = "half-rgba".parse().unwrap();
//!
//! assert_eq!(format.channels(), 4);
//! assert_eq!(format.sample_type(), SampleType::F16);
//! assert_eq!(format.pixel_size(), 8);
//! ```

mod cursor;

pub use cursor::SampleCursor;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a format tag does not name a supported format.
///
/// The converter supports exactly six formats; anything else is
/// rejected up front, before any geometry is queried or memory
/// allocated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported pixel format: {tag:?}")]
pub struct FormatParseError {
    tag: String,
}

impl FormatParseError {
    /// The tag that failed to parse.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// Per-channel sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    /// Unsigned 8-bit integer, 0..=255 maps to 0.0..=1.0.
    U8,
    /// IEEE 754 half-precision float.
    F16,
    /// IEEE 754 single-precision float.
    F32,
}

impl SampleType {
    /// Size of one encoded sample in bytes.
    pub fn size_bytes(&self) -> usize {
        match self {
            SampleType::U8 => 1,
            SampleType::F16 => 2,
            SampleType::F32 => 4,
        }
    }
}

/// Pixel layout of the tile data a source delivers.
///
/// Each variant pairs a channel count with a sample encoding. Samples
/// are interleaved per pixel in channel order (R, G, B, then A where
/// present), and pixels are laid out row-major within a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit integer samples, three channels.
    ByteRgb,
    /// 8-bit integer samples, four channels.
    ByteRgba,
    /// Half-float samples, three channels.
    HalfRgb,
    /// Half-float samples, four channels.
    HalfRgba,
    /// Full-float samples, three channels.
    FloatRgb,
    /// Full-float samples, four channels.
    FloatRgba,
}

impl PixelFormat {
    /// All supported formats, in tag order.
    pub const ALL: [PixelFormat; 6] = [
        PixelFormat::ByteRgb,
        PixelFormat::ByteRgba,
        PixelFormat::HalfRgb,
        PixelFormat::HalfRgba,
        PixelFormat::FloatRgb,
        PixelFormat::FloatRgba,
    ];

    /// Number of channels per pixel (3 for RGB, 4 for RGBA).
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::ByteRgb | PixelFormat::HalfRgb | PixelFormat::FloatRgb => 3,
            PixelFormat::ByteRgba | PixelFormat::HalfRgba | PixelFormat::FloatRgba => 4,
        }
    }

    /// Sample encoding shared by every channel of this format.
    pub fn sample_type(&self) -> SampleType {
        match self {
            PixelFormat::ByteRgb | PixelFormat::ByteRgba => SampleType::U8,
            PixelFormat::HalfRgb | PixelFormat::HalfRgba => SampleType::F16,
            PixelFormat::FloatRgb | PixelFormat::FloatRgba => SampleType::F32,
        }
    }

    /// Size of one channel sample in bytes.
    pub fn channel_size(&self) -> usize {
        self.sample_type().size_bytes()
    }

    /// Size of one interleaved pixel in bytes.
    ///
    /// This is `channels() * channel_size()` and is the unit all tile
    /// buffer arithmetic is based on.
    pub fn pixel_size(&self) -> usize {
        self.channels() * self.channel_size()
    }

    /// Whether the format carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.channels() == 4
    }

    /// The canonical string tag for this format.
    pub fn tag(&self) -> &'static str {
        match self {
            PixelFormat::ByteRgb => "byte-rgb",
            PixelFormat::ByteRgba => "byte-rgba",
            PixelFormat::HalfRgb => "half-rgb",
            PixelFormat::HalfRgba => "half-rgba",
            PixelFormat::FloatRgb => "float-rgb",
            PixelFormat::FloatRgba => "float-rgba",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for PixelFormat {
    type Err = FormatParseError;

    /// Parse a format tag, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`FormatParseError`] for any tag outside the six
    /// supported formats.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "byte-rgb" => Ok(PixelFormat::ByteRgb),
            "byte-rgba" => Ok(PixelFormat::ByteRgba),
            "half-rgb" => Ok(PixelFormat::HalfRgb),
            "half-rgba" => Ok(PixelFormat::HalfRgba),
            "float-rgb" => Ok(PixelFormat::FloatRgb),
            "float-rgba" => Ok(PixelFormat::FloatRgba),
            _ => Err(FormatParseError { tag: s.to_string() }),
        }
    }
}
