//! Tilebake - Tiled paint sources baked into mipmapped textures
//!
//! This library reassembles the tiled, mip-mapped images a digital
//! paint host keeps in memory and bakes them to disk as mipmapped
//! EXR or TIFF textures.
//!
//! The pipeline has three stages:
//!
//! 1. A [`source::TileSource`] exposes the host's tile grid.
//! 2. [`assemble::assemble_image`] walks the grid and rebuilds the
//!    full-resolution image in a typed [`imagebuf::ImageBuffer`].
//! 3. A [`bake::TextureWriter`] builds the mip chain and encodes the
//!    image to its file format.
//!
//! [`export::save`] runs all three stages in one call.

pub mod assemble;
pub mod bake;
pub mod export;
pub mod format;
pub mod imagebuf;
pub mod source;

pub use assemble::{assemble_image, AssembleError};
pub use bake::{
    writer_for_path, BakeError, BakeOptions, Compression, ExrWriter, FilterKernel, TextureWriter,
    TiffWriter,
};
pub use export::{save, SaveError, SaveReport, SaveRequest};
pub use format::{FormatParseError, PixelFormat, SampleType};
pub use imagebuf::ImageBuffer;
pub use source::{MipLevelInfo, RasterTileSource, SourceError, TileSource};

/// The crate version, stamped into baked files as the software name.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_not_empty() {
        assert!(!VERSION.is_empty(), "Version should not be empty");
    }
}
