//! Tile reassembly into a full-resolution image.
//!
//! This is the heart of the converter: it walks the level 0 tile grid
//! row-major, pulls one tile at a time through a [`TileSource`], and
//! decodes the raw bytes into an [`ImageBuffer`] sized to the level's
//! pixel window.
//!
//! Edge tiles routinely extend past the pixel window because the grid
//! is rounded up to whole tiles. Samples that land outside the window
//! are dropped while the read cursor keeps advancing, so the rest of
//! the tile stays aligned with its pixels.
//!
//! Peak memory is one tile plus the output image; the scratch tile
//! buffer is reused across the whole loop.

use tracing::{debug, instrument, trace, warn};

use crate::format::{PixelFormat, SampleCursor};
use crate::imagebuf::{AllocError, ImageBuffer};
use crate::source::{SourceError, TileSource};

use thiserror::Error;

/// Errors that abort tile reassembly.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// The source could not describe the mip level geometry.
    #[error("mip level geometry unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),

    /// A tile could not be read; the tile's grid coordinates identify
    /// the failure for host-side diagnostics.
    #[error("failed to read tile ({x}, {y}): {source}")]
    TileRead {
        x: u32,
        y: u32,
        #[source]
        source: SourceError,
    },

    /// The output image or the tile scratch buffer could not be
    /// allocated.
    #[error("out of memory: failed to allocate {bytes} bytes")]
    OutOfMemory { bytes: usize },
}

impl From<AllocError> for AssembleError {
    fn from(err: AllocError) -> Self {
        AssembleError::OutOfMemory { bytes: err.bytes() }
    }
}

/// Reassemble mip level 0 of a tiled source into one image.
///
/// Tiles are visited row-major, left to right then top to bottom, and
/// each is fetched exactly once. The source's per-tile byte size is
/// cross-checked against the size computed from `format` and the tile
/// geometry; on disagreement the computed size wins and a warning is
/// logged.
///
/// # Arguments
///
/// * `source` - Supplier of tile geometry and raw tile bytes
/// * `format` - Pixel format the source delivers tiles in
/// * `tile_width` - Tile width in pixels
/// * `tile_height` - Tile height in pixels
///
/// # Returns
///
/// The assembled full-resolution image, stored in the sample type
/// matching `format`.
///
/// # Errors
///
/// * [`AssembleError::SourceUnavailable`] - the geometry query failed
/// * [`AssembleError::TileRead`] - a tile fetch failed; conversion
///   stops at the first failing tile
/// * [`AssembleError::OutOfMemory`] - buffer allocation failed
///
/// # Example
///
/// ```
/// use image::DynamicImage;
/// use tilebake::assemble::assemble_image;
/// use tilebake::format::PixelFormat;
/// use tilebake::source::RasterTileSource;
///
/// let raster = DynamicImage::new_rgba8(8, 8);
/// let source = RasterTileSource::new(&raster, PixelFormat::ByteRgba, 4, 4).unwrap();
///
/// let image = assemble_image(&source, PixelFormat::ByteRgba, 4, 4).unwrap();
/// assert_eq!(image.width(), 8);
/// assert_eq!(image.height(), 8);
/// ```
#[instrument(skip(source))]
pub fn assemble_image(
    source: &dyn TileSource,
    format: PixelFormat,
    tile_width: u32,
    tile_height: u32,
) -> Result<ImageBuffer, AssembleError> {
    let info = source
        .mip_level_info(0)
        .map_err(AssembleError::SourceUnavailable)?;

    debug!(
        width = info.width(),
        height = info.height(),
        tiles_x = info.tiles_x(),
        tiles_y = info.tiles_y(),
        "assembling image from tiles"
    );

    let mut image = ImageBuffer::new(
        info.width() as usize,
        info.height() as usize,
        format.channels(),
        format.sample_type(),
    )?;

    let tile_bytes = tile_width as usize * tile_height as usize * format.pixel_size();
    let mut scratch: Vec<u8> = Vec::new();
    scratch
        .try_reserve_exact(tile_bytes)
        .map_err(|_| AssembleError::OutOfMemory { bytes: tile_bytes })?;
    scratch.resize(tile_bytes, 0);

    for tile_y in 0..info.tiles_y() {
        for tile_x in 0..info.tiles_x() {
            let reported = source
                .tile_byte_size(tile_x, tile_y, 0)
                .map_err(|source| AssembleError::TileRead {
                    x: tile_x,
                    y: tile_y,
                    source,
                })?;
            if reported != tile_bytes {
                warn!(
                    tile_x,
                    tile_y,
                    reported,
                    computed = tile_bytes,
                    "tile size reported by source disagrees with computed size, using computed size"
                );
            }

            source
                .read_tile(tile_x, tile_y, 0, &mut scratch)
                .map_err(|source| AssembleError::TileRead {
                    x: tile_x,
                    y: tile_y,
                    source,
                })?;

            copy_tile(&mut image, &scratch, format, tile_x, tile_y, tile_width, tile_height);
            trace!(tile_x, tile_y, "tile copied");
        }
    }

    Ok(image)
}

/// Decode one tile's bytes into the image at its grid position.
///
/// Every sample in the tile is consumed in order even when its pixel
/// falls outside the image window, so a partial edge tile cannot
/// shift the samples that follow it.
fn copy_tile(
    image: &mut ImageBuffer,
    bytes: &[u8],
    format: PixelFormat,
    tile_x: u32,
    tile_y: u32,
    tile_width: u32,
    tile_height: u32,
) {
    let origin_x = (tile_x * tile_width) as usize;
    let origin_y = (tile_y * tile_height) as usize;
    let channels = format.channels();

    let mut cursor = SampleCursor::new(bytes, format.sample_type());
    for j in 0..tile_height as usize {
        for i in 0..tile_width as usize {
            for channel in 0..channels {
                let value = cursor.read_sample();
                image.set(origin_x + i, origin_y + j, channel, value);
            }
        }
    }
}
