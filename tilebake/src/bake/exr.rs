//! OpenEXR texture writer.
//!
//! Writes the assembled image as a tiled, mipmapped single-part EXR.
//! Byte and half sources bake to half-float channels; full-float
//! sources keep their precision. The full compression menu of the
//! options bag maps one-to-one onto OpenEXR schemes.

use std::path::Path;

use exr::compression::Compression as ExrCompression;
use exr::error::Error as ExrError;
use exr::image::write::WritableImage;
use exr::image::{AnyChannel, AnyChannels, Blocks, Encoding, FlatSamples, Image, Layer, Levels};
use exr::math::{RoundingMode, Vec2};
use exr::meta::attribute::{AttributeValue, LineOrder, Text};
use exr::meta::header::LayerAttributes;
use half::f16;
use tracing::{debug, instrument, warn};

use crate::format::SampleType;
use crate::imagebuf::ImageBuffer;

use super::mips::{self, MipLevel};
use super::{BakeError, BakeOptions, Compression, TextureWriter};

/// Tile edge length used for EXR block layout, matching the maketx
/// texture convention.
const TILE_SIZE: usize = 64;

/// Texture writer producing mipmapped OpenEXR files.
///
/// # Example
///
/// ```
/// use tilebake::bake::{ExrWriter, TextureWriter};
///
/// let writer = ExrWriter::new();
/// assert_eq!(writer.extension(), "exr");
/// assert_eq!(writer.name(), "OpenEXR");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExrWriter;

impl ExrWriter {
    /// Create an EXR writer.
    pub fn new() -> Self {
        Self
    }
}

impl TextureWriter for ExrWriter {
    #[instrument(skip(self, image, options))]
    fn bake(
        &self,
        image: &ImageBuffer,
        options: &BakeOptions,
        path: &Path,
    ) -> Result<(), BakeError> {
        let chain = mips::build_chain(image, options)?;
        let depth = disk_sample_type(image.sample_type());

        let names: &[&str] = if chain.channels == 4 {
            &["R", "G", "B", "A"]
        } else {
            &["R", "G", "B"]
        };

        let mut list: Vec<AnyChannel<Levels<FlatSamples>>> = Vec::with_capacity(chain.channels);
        for (channel, name) in names.iter().enumerate() {
            let level_data: Vec<FlatSamples> = chain
                .levels
                .iter()
                .map(|level| plane(level, chain.channels, channel, depth))
                .collect();
            list.push(AnyChannel::new(
                *name,
                Levels::Mip {
                    rounding_mode: RoundingMode::Down,
                    level_data,
                },
            ));
        }

        let layer = Layer::new(
            (image.width(), image.height()),
            attributes(options),
            Encoding {
                compression: exr_compression(options.compression()),
                blocks: Blocks::Tiles(Vec2(TILE_SIZE, TILE_SIZE)),
                line_order: LineOrder::Increasing,
            },
            AnyChannels::sort(list.into()),
        );

        Image::from_layer(layer)
            .write()
            .to_file(path)
            .map_err(map_exr_error)?;

        debug!(
            path = %path.display(),
            levels = chain.levels.len(),
            channels = chain.channels,
            compression = %options.compression(),
            "EXR texture written"
        );
        Ok(())
    }

    fn extension(&self) -> &str {
        "exr"
    }

    fn name(&self) -> &str {
        "OpenEXR"
    }
}

/// Sample depth on disk for a given in-memory sample type.
///
/// Byte sources are promoted to half; there is no 8-bit EXR channel
/// type. Half and full floats keep their precision.
fn disk_sample_type(source: SampleType) -> SampleType {
    match source {
        SampleType::U8 | SampleType::F16 => SampleType::F16,
        SampleType::F32 => SampleType::F32,
    }
}

/// Extract one channel of one level as a flat sample plane.
fn plane(level: &MipLevel, channels: usize, channel: usize, depth: SampleType) -> FlatSamples {
    let samples = level.samples.chunks_exact(channels).map(|px| px[channel]);
    match depth {
        SampleType::F32 => FlatSamples::F32(samples.collect()),
        _ => FlatSamples::F16(samples.map(f16::from_f32).collect()),
    }
}

fn exr_compression(compression: Compression) -> ExrCompression {
    match compression {
        Compression::None => ExrCompression::Uncompressed,
        Compression::Rle => ExrCompression::RLE,
        Compression::Zip => ExrCompression::ZIP16,
        Compression::Piz => ExrCompression::PIZ,
        Compression::Pxr24 => ExrCompression::PXR24,
        Compression::B44 => ExrCompression::B44,
        Compression::B44a => ExrCompression::B44A,
    }
}

/// Build the layer attributes: software stamp plus user metadata.
///
/// An `artist` key lands in the standard `owner` attribute and
/// `comment`/`comments` in `comments`, matching how other bakers map
/// them; everything else becomes a free-form text attribute. Pairs
/// whose key or value cannot be represented as EXR text are dropped
/// with a warning.
fn attributes(options: &BakeOptions) -> LayerAttributes {
    let mut attributes = LayerAttributes::default();
    attributes.software_name = Text::new_or_none(&format!("tilebake {}", crate::VERSION));

    for (key, value) in options.metadata() {
        let Some(text) = Text::new_or_none(value) else {
            warn!(key = %key, "metadata value not representable as EXR text, dropped");
            continue;
        };

        if key.eq_ignore_ascii_case("artist") {
            attributes.owner = Some(text);
        } else if key.eq_ignore_ascii_case("comment") || key.eq_ignore_ascii_case("comments") {
            attributes.comments = Some(text);
        } else if let Some(name) = Text::new_or_none(key) {
            attributes.other.insert(name, AttributeValue::Text(text));
        } else {
            warn!(key = %key, "metadata key not representable as EXR text, dropped");
        }
    }

    attributes
}

fn map_exr_error(err: ExrError) -> BakeError {
    match err {
        ExrError::Io(io) => BakeError::Io(io),
        other => BakeError::Encoding(other.to_string()),
    }
}
