//! TIFF texture writer.
//!
//! Writes the mip chain as a multi-page TIFF: level 0 as the primary
//! image, every smaller level as a reduced-resolution page flagged
//! with `NewSubfileType`. Byte sources stay 8-bit on disk; half and
//! full float sources are written as 32-bit float pages, since
//! baseline TIFF has no half type.
//!
//! The compression menu is EXR-flavored, so schemes TIFF cannot
//! express (piz, pxr24, b44, b44a) degrade to deflate rather than
//! failing the bake.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::compression::{
    Compression as CompressionAlgorithm, Deflate, Packbits, Uncompressed,
};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tiff::TiffError;
use tracing::{debug, instrument};

use crate::format::SampleType;
use crate::imagebuf::ImageBuffer;

use super::mips::{self, MipLevel};
use super::{BakeError, BakeOptions, Compression, TextureWriter};

/// Texture writer producing multi-page mipmapped TIFF files.
///
/// # Example
///
/// ```
/// use tilebake::bake::{TextureWriter, TiffWriter};
///
/// let writer = TiffWriter::new();
/// assert_eq!(writer.extension(), "tif");
/// assert_eq!(writer.name(), "TIFF");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TiffWriter;

impl TiffWriter {
    /// Create a TIFF writer.
    pub fn new() -> Self {
        Self
    }
}

impl TextureWriter for TiffWriter {
    #[instrument(skip(self, image, options))]
    fn bake(
        &self,
        image: &ImageBuffer,
        options: &BakeOptions,
        path: &Path,
    ) -> Result<(), BakeError> {
        let chain = mips::build_chain(image, options)?;
        let compression = page_compression(options.compression());
        let software = format!("tilebake {}", crate::VERSION);
        let artist = options
            .metadata()
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("artist"))
            .map(|(_, value)| value.as_str());
        let description = description(options.metadata());

        let mut writer = BufWriter::new(File::create(path)?);
        let mut encoder = TiffEncoder::new(&mut writer).map_err(map_tiff_error)?;

        for (index, level) in chain.levels.iter().enumerate() {
            let page = PageTags {
                index,
                software: &software,
                artist,
                description: description.as_deref(),
            };

            match image.sample_type() {
                SampleType::U8 => {
                    let samples = quantize(&level.samples);
                    if chain.channels == 4 {
                        write_level::<colortype::RGBA8, _>(
                            &mut encoder,
                            level,
                            &samples,
                            &page,
                            compression,
                        )?;
                    } else {
                        write_level::<colortype::RGB8, _>(
                            &mut encoder,
                            level,
                            &samples,
                            &page,
                            compression,
                        )?;
                    }
                }
                SampleType::F16 | SampleType::F32 => {
                    if chain.channels == 4 {
                        write_level::<colortype::RGBA32Float, _>(
                            &mut encoder,
                            level,
                            &level.samples,
                            &page,
                            compression,
                        )?;
                    } else {
                        write_level::<colortype::RGB32Float, _>(
                            &mut encoder,
                            level,
                            &level.samples,
                            &page,
                            compression,
                        )?;
                    }
                }
            }
        }

        drop(encoder);
        writer.flush()?;

        debug!(
            path = %path.display(),
            levels = chain.levels.len(),
            channels = chain.channels,
            "TIFF texture written"
        );
        Ok(())
    }

    fn extension(&self) -> &str {
        "tif"
    }

    fn name(&self) -> &str {
        "TIFF"
    }
}

/// Compression actually applied to TIFF pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageCompression {
    Uncompressed,
    Packbits,
    Deflate,
}

/// Map the requested scheme onto what TIFF can express.
fn page_compression(compression: Compression) -> PageCompression {
    match compression {
        Compression::None => PageCompression::Uncompressed,
        Compression::Rle => PageCompression::Packbits,
        Compression::Zip => PageCompression::Deflate,
        Compression::Piz | Compression::Pxr24 | Compression::B44 | Compression::B44a => {
            debug!(
                scheme = %compression,
                "compression scheme not available in TIFF, using deflate"
            );
            PageCompression::Deflate
        }
    }
}

/// Tags to stamp on one page.
struct PageTags<'a> {
    index: usize,
    software: &'a str,
    artist: Option<&'a str>,
    description: Option<&'a str>,
}

fn write_level<C, W>(
    encoder: &mut TiffEncoder<W>,
    level: &MipLevel,
    samples: &[C::Inner],
    page: &PageTags<'_>,
    compression: PageCompression,
) -> Result<(), BakeError>
where
    C: ColorType,
    W: Write + Seek,
    [C::Inner]: TiffValue,
{
    match compression {
        PageCompression::Uncompressed => {
            write_page::<C, _, _>(encoder, level, samples, page, Uncompressed)
        }
        PageCompression::Packbits => write_page::<C, _, _>(encoder, level, samples, page, Packbits),
        PageCompression::Deflate => {
            write_page::<C, _, _>(encoder, level, samples, page, Deflate::default())
        }
    }
}

fn write_page<C, D, W>(
    encoder: &mut TiffEncoder<W>,
    level: &MipLevel,
    samples: &[C::Inner],
    page: &PageTags<'_>,
    compression: D,
) -> Result<(), BakeError>
where
    C: ColorType,
    D: CompressionAlgorithm,
    W: Write + Seek,
    [C::Inner]: TiffValue,
{
    let mut image = encoder
        .new_image_with_compression::<C, D>(level.width as u32, level.height as u32, compression)
        .map_err(map_tiff_error)?;

    image
        .encoder()
        .write_tag(Tag::Software, page.software)
        .map_err(map_tiff_error)?;

    if page.index == 0 {
        if let Some(artist) = page.artist {
            image
                .encoder()
                .write_tag(Tag::Artist, artist)
                .map_err(map_tiff_error)?;
        }
        if let Some(text) = page.description {
            image
                .encoder()
                .write_tag(Tag::ImageDescription, text)
                .map_err(map_tiff_error)?;
        }
    } else {
        // Mark smaller levels as reduced-resolution versions of page 0.
        image
            .encoder()
            .write_tag(Tag::NewSubfileType, 1u32)
            .map_err(map_tiff_error)?;
    }

    image.write_data(samples).map_err(map_tiff_error)
}

/// Quantize normalized floats back to 8-bit for byte sources.
fn quantize(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect()
}

/// Join the non-artist metadata pairs into an ImageDescription value.
fn description(metadata: &[(String, String)]) -> Option<String> {
    let lines: Vec<String> = metadata
        .iter()
        .filter(|(key, _)| !key.eq_ignore_ascii_case("artist"))
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn map_tiff_error(err: TiffError) -> BakeError {
    match err {
        TiffError::IoError(io) => BakeError::Io(io),
        other => BakeError::Encoding(other.to_string()),
    }
}
