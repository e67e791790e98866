//! Tile source abstraction.
//!
//! A [`TileSource`] is anything that can describe a mip level's
//! geometry and fill caller-provided buffers with raw tile bytes:
//! a paint host handing over its canvas, a raster file adapted
//! through [`RasterTileSource`], or a mock in tests.
//!
//! The converter pulls tiles through this trait one at a time and
//! never needs more than one tile in flight, which keeps peak memory
//! at one tile plus the output image regardless of canvas size.

mod raster;

pub use raster::RasterTileSource;

use thiserror::Error;

/// Errors a tile source can report.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The requested mip level does not exist.
    #[error("mip level {level} is out of range")]
    LevelOutOfRange { level: u32 },

    /// The requested tile lies outside the level's tile grid.
    #[error("tile ({x}, {y}) is outside the mip level {level} tile grid")]
    TileOutOfRange { x: u32, y: u32, level: u32 },

    /// The caller's buffer cannot hold a full tile.
    #[error("tile buffer too small: need {needed} bytes, have {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },

    /// The tile size a source was configured with is unusable.
    #[error("invalid tile size {width}x{height}: both sides must be positive")]
    InvalidTileSize { width: u32, height: u32 },

    /// The host application reported a failure.
    #[error("host error: {0}")]
    Host(String),

    /// An I/O error while reading tile data.
    #[error("tile I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Geometry of one mip level as reported by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipLevelInfo {
    width: u32,
    height: u32,
    tiles_x: u32,
    tiles_y: u32,
}

impl MipLevelInfo {
    /// Create a level description.
    ///
    /// # Arguments
    ///
    /// * `width` - Level width in pixels
    /// * `height` - Level height in pixels
    /// * `tiles_x` - Number of tile columns
    /// * `tiles_y` - Number of tile rows
    pub fn new(width: u32, height: u32, tiles_x: u32, tiles_y: u32) -> Self {
        Self {
            width,
            height,
            tiles_x,
            tiles_y,
        }
    }

    /// Level width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Level height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of tile columns.
    pub fn tiles_x(&self) -> u32 {
        self.tiles_x
    }

    /// Number of tile rows.
    pub fn tiles_y(&self) -> u32 {
        self.tiles_y
    }

    /// Total number of tiles in the grid.
    pub fn tile_count(&self) -> u32 {
        self.tiles_x * self.tiles_y
    }
}

/// Supplies tile geometry and raw tile bytes for a tiled image.
///
/// Implementations must be safe to share across threads. `tile_x`
/// indexes columns and `tile_y` indexes rows, both starting at the
/// top-left tile.
pub trait TileSource: Send + Sync {
    /// Describe the pixel and tile geometry of a mip level.
    ///
    /// # Arguments
    ///
    /// * `level` - Mip level index, 0 is full resolution
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::LevelOutOfRange`] when the level does
    /// not exist, or another [`SourceError`] when the source cannot
    /// answer.
    fn mip_level_info(&self, level: u32) -> Result<MipLevelInfo, SourceError>;

    /// Report the byte size of one tile as the source sees it.
    ///
    /// The converter computes tile sizes itself from the pixel format
    /// and tile geometry; this value is only cross-checked against
    /// that arithmetic.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when the tile does not exist or the
    /// source cannot answer.
    fn tile_byte_size(&self, tile_x: u32, tile_y: u32, level: u32) -> Result<usize, SourceError>;

    /// Copy one tile's raw bytes into `buffer`.
    ///
    /// The tile is written interleaved and row-major from the start of
    /// the buffer. Pixels past the image edge inside an edge tile are
    /// delivered as zero bytes.
    ///
    /// # Arguments
    ///
    /// * `tile_x` - Tile column
    /// * `tile_y` - Tile row
    /// * `level` - Mip level index
    /// * `buffer` - Destination, at least one tile in size
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::BufferTooSmall`] when the buffer cannot
    /// hold a tile, or another [`SourceError`] when the read fails.
    fn read_tile(
        &self,
        tile_x: u32,
        tile_y: u32,
        level: u32,
        buffer: &mut [u8],
    ) -> Result<(), SourceError>;
}
