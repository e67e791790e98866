//! The one-call save pipeline.
//!
//! [`save`] is the entry point a host integration drives: it checks
//! the requested format, reassembles the tiled source into a full
//! image, and hands that image to a texture writer. Each stage's
//! failure keeps its own error type so callers can map problems back
//! to host-side diagnostics.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::assemble::{assemble_image, AssembleError};
use crate::bake::{mips, BakeError, BakeOptions, TextureWriter};
use crate::format::{FormatParseError, PixelFormat};
use crate::source::TileSource;

/// Errors from the save pipeline, in pipeline order.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The format tag names no supported pixel format. Raised before
    /// the source is touched or any memory is allocated.
    #[error(transparent)]
    UnsupportedFormat(#[from] FormatParseError),

    /// The request's tile size has a zero dimension. Raised before
    /// the source is touched.
    #[error("invalid tile size {width}x{height}: tiles must span at least one pixel")]
    InvalidTileSize { width: u32, height: u32 },

    /// Tile reassembly failed.
    #[error("image assembly failed: {0}")]
    Assemble(#[from] AssembleError),

    /// The texture writer failed.
    #[error("texture write failed: {0}")]
    Write(#[from] BakeError),
}

/// Everything needed to save one texture.
///
/// The format arrives as the host's string tag rather than a parsed
/// [`PixelFormat`] so that rejecting an unknown tag stays inside the
/// pipeline, where it maps onto [`SaveError::UnsupportedFormat`].
#[derive(Debug, Clone)]
pub struct SaveRequest {
    format_tag: String,
    tile_width: u32,
    tile_height: u32,
    path: PathBuf,
    options: BakeOptions,
}

impl SaveRequest {
    /// Create a request with default bake options.
    ///
    /// # Arguments
    ///
    /// * `format_tag` - Pixel format tag, e.g. `"half-rgba"`
    /// * `tile_width` - Tile width in pixels
    /// * `tile_height` - Tile height in pixels
    /// * `path` - Output file path
    pub fn new(
        format_tag: impl Into<String>,
        tile_width: u32,
        tile_height: u32,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            format_tag: format_tag.into(),
            tile_width,
            tile_height,
            path: path.into(),
            options: BakeOptions::default(),
        }
    }

    /// Replace the bake options.
    pub fn with_options(mut self, options: BakeOptions) -> Self {
        self.options = options;
        self
    }

    /// The pixel format tag.
    pub fn format_tag(&self) -> &str {
        &self.format_tag
    }

    /// Tile width in pixels.
    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    /// Tile height in pixels.
    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// The output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The bake options.
    pub fn options(&self) -> &BakeOptions {
        &self.options
    }
}

/// Summary of a completed save.
#[derive(Debug, Clone)]
pub struct SaveReport {
    width: u32,
    height: u32,
    tiles: u32,
    mip_levels_written: usize,
    path: PathBuf,
}

impl SaveReport {
    /// Output width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of source tiles consumed.
    pub fn tiles(&self) -> u32 {
        self.tiles
    }

    /// Number of mip levels in the written texture.
    pub fn mip_levels_written(&self) -> usize {
        self.mip_levels_written
    }

    /// The written file's path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for SaveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} texture from {} tiles, {} mip levels -> {}",
            self.width,
            self.height,
            self.tiles,
            self.mip_levels_written,
            self.path.display()
        )
    }
}

/// Save one tiled source as a baked texture.
///
/// Runs the pipeline end to end: parse the format tag, reassemble
/// mip level 0 from tiles, bake the image with its full mip chain
/// through `writer`. The writer is only invoked once a complete
/// image exists; a failed tile read never leaves a partial file
/// behind.
///
/// # Errors
///
/// * [`SaveError::UnsupportedFormat`] - unknown format tag; the
///   source has not been touched yet
/// * [`SaveError::InvalidTileSize`] - a zero tile dimension; the
///   source has not been touched yet
/// * [`SaveError::Assemble`] - geometry or tile reads failed
/// * [`SaveError::Write`] - the writer could not produce the file
#[instrument(skip(source, writer, request), fields(path = %request.path().display()))]
pub fn save(
    source: &dyn TileSource,
    writer: &dyn TextureWriter,
    request: &SaveRequest,
) -> Result<SaveReport, SaveError> {
    let format: PixelFormat = request.format_tag().parse()?;
    if request.tile_width() == 0 || request.tile_height() == 0 {
        return Err(SaveError::InvalidTileSize {
            width: request.tile_width(),
            height: request.tile_height(),
        });
    }
    debug!(
        format = %format,
        tile_width = request.tile_width(),
        tile_height = request.tile_height(),
        writer = writer.name(),
        "saving texture"
    );

    let image = assemble_image(source, format, request.tile_width(), request.tile_height())?;
    writer.bake(&image, request.options(), request.path())?;

    let width = image.width() as u32;
    let height = image.height() as u32;
    let tiles = width.div_ceil(request.tile_width()) * height.div_ceil(request.tile_height());
    let report = SaveReport {
        width,
        height,
        tiles,
        mip_levels_written: mips::mip_level_count(image.width(), image.height()),
        path: request.path().to_path_buf(),
    };

    debug!(
        width = report.width(),
        height = report.height(),
        tiles = report.tiles(),
        mip_levels = report.mip_levels_written(),
        "texture saved"
    );
    Ok(report)
}
