//! Tile source backed by a decoded raster image.

use half::f16;
use image::{DynamicImage, Rgba32FImage};
use tracing::debug;

use crate::format::{PixelFormat, SampleType};

use super::{MipLevelInfo, SourceError, TileSource};

/// Presents a decoded raster image as a tiled source.
///
/// The image is cut into a grid of fixed-size tiles, rounded up to
/// whole tiles at the right and bottom edges. Pixels an edge tile
/// covers beyond the image boundary read back as zero samples, which
/// mirrors how paint hosts pad their canvases.
///
/// Only mip level 0 exists; a plain raster has no smaller versions of
/// itself.
///
/// # Example
///
/// ```
/// use image::DynamicImage;
/// use tilebake::format::PixelFormat;
/// use tilebake::source::{RasterTileSource, TileSource};
///
/// let image = DynamicImage::new_rgba8(10, 10);
/// let source = RasterTileSource::new(&image, PixelFormat::ByteRgba, 4, 4).unwrap();
///
/// let info = source.mip_level_info(0).unwrap();
/// assert_eq!(info.tiles_x(), 3);
/// assert_eq!(info.tiles_y(), 3);
/// ```
#[derive(Debug)]
pub struct RasterTileSource {
    pixels: Rgba32FImage,
    format: PixelFormat,
    tile_width: u32,
    tile_height: u32,
}

impl RasterTileSource {
    /// Wrap a decoded image as a tile source.
    ///
    /// # Arguments
    ///
    /// * `image` - Decoded source raster
    /// * `format` - Pixel format tiles are delivered in
    /// * `tile_width` - Tile width in pixels
    /// * `tile_height` - Tile height in pixels
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidTileSize`] when either tile side
    /// is zero.
    pub fn new(
        image: &DynamicImage,
        format: PixelFormat,
        tile_width: u32,
        tile_height: u32,
    ) -> Result<Self, SourceError> {
        if tile_width == 0 || tile_height == 0 {
            return Err(SourceError::InvalidTileSize {
                width: tile_width,
                height: tile_height,
            });
        }

        let pixels = image.to_rgba32f();
        debug!(
            width = pixels.width(),
            height = pixels.height(),
            format = %format,
            tile_width,
            tile_height,
            "raster tile source ready"
        );

        Ok(Self {
            pixels,
            format,
            tile_width,
            tile_height,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// The format tiles are encoded in.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    fn grid(&self) -> MipLevelInfo {
        MipLevelInfo::new(
            self.width(),
            self.height(),
            self.width().div_ceil(self.tile_width),
            self.height().div_ceil(self.tile_height),
        )
    }

    fn check_tile(&self, tile_x: u32, tile_y: u32, level: u32) -> Result<(), SourceError> {
        if level != 0 {
            return Err(SourceError::LevelOutOfRange { level });
        }
        let grid = self.grid();
        if tile_x >= grid.tiles_x() || tile_y >= grid.tiles_y() {
            return Err(SourceError::TileOutOfRange {
                x: tile_x,
                y: tile_y,
                level,
            });
        }
        Ok(())
    }

    fn sample(&self, x: u32, y: u32, channel: usize) -> f32 {
        if x < self.width() && y < self.height() {
            self.pixels.get_pixel(x, y).0[channel]
        } else {
            0.0
        }
    }

    fn encode_sample(&self, value: f32, out: &mut Vec<u8>) {
        match self.format.sample_type() {
            SampleType::U8 => out.push((value.clamp(0.0, 1.0) * 255.0).round() as u8),
            SampleType::F16 => out.extend_from_slice(&f16::from_f32(value).to_ne_bytes()),
            SampleType::F32 => out.extend_from_slice(&value.to_ne_bytes()),
        }
    }
}

impl TileSource for RasterTileSource {
    fn mip_level_info(&self, level: u32) -> Result<MipLevelInfo, SourceError> {
        if level != 0 {
            return Err(SourceError::LevelOutOfRange { level });
        }
        Ok(self.grid())
    }

    fn tile_byte_size(&self, tile_x: u32, tile_y: u32, level: u32) -> Result<usize, SourceError> {
        self.check_tile(tile_x, tile_y, level)?;
        Ok(self.tile_width as usize * self.tile_height as usize * self.format.pixel_size())
    }

    fn read_tile(
        &self,
        tile_x: u32,
        tile_y: u32,
        level: u32,
        buffer: &mut [u8],
    ) -> Result<(), SourceError> {
        self.check_tile(tile_x, tile_y, level)?;

        let needed = self.tile_width as usize * self.tile_height as usize * self.format.pixel_size();
        if buffer.len() < needed {
            return Err(SourceError::BufferTooSmall {
                needed,
                capacity: buffer.len(),
            });
        }

        let origin_x = tile_x * self.tile_width;
        let origin_y = tile_y * self.tile_height;
        let channels = self.format.channels();

        let mut encoded = Vec::with_capacity(needed);
        for j in 0..self.tile_height {
            for i in 0..self.tile_width {
                for channel in 0..channels {
                    let value = self.sample(origin_x + i, origin_y + j, channel);
                    self.encode_sample(value, &mut encoded);
                }
            }
        }
        buffer[..needed].copy_from_slice(&encoded);

        Ok(())
    }
}
