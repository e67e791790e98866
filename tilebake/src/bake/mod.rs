//! Texture baking.
//!
//! Turns an assembled [`ImageBuffer`](crate::imagebuf::ImageBuffer)
//! into a finished, mipmapped texture on disk:
//!
//! ```text
//!                 +-----------------+
//!  ImageBuffer -> | mips::build     | -> MipChain (level 0..=1x1)
//!                 | opaque detect   |
//!                 | highlight comp  |
//!                 +-----------------+
//!                          |
//!              +-----------+-----------+
//!              v                       v
//!        +-----------+          +------------+
//!        | ExrWriter |          | TiffWriter |
//!        +-----------+          +------------+
//!              |                       |
//!         tiled .exr            multi-page .tif
//! ```
//!
//! [`writer_for_path`] picks the writer from the output extension;
//! [`BakeOptions`] carries compression, filtering, and metadata
//! choices shared by all writers.

mod exr;
mod options;
mod tiff;
mod writer;

pub mod mips;

pub use self::exr::ExrWriter;
pub use self::tiff::TiffWriter;
pub use options::{BakeOptions, Compression, FilterKernel};
pub use writer::{writer_for_path, BakeError, TextureWriter};
