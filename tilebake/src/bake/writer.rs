//! Texture writer trait and path-based dispatch.

use std::path::Path;

use thiserror::Error;

use crate::imagebuf::ImageBuffer;

use super::{BakeOptions, ExrWriter, TiffWriter};

/// Errors a texture writer can produce.
#[derive(Debug, Error)]
pub enum BakeError {
    /// The image cannot be baked at this size.
    #[error("invalid image dimensions {width}x{height}: both sides must be positive")]
    InvalidDimensions { width: usize, height: usize },

    /// The container encoder rejected the image.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// Writing the output file failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Bakes an assembled image into an on-disk texture.
///
/// A writer owns everything specific to one container format: the mip
/// chain layout, the sample depth on disk, the compression mapping,
/// and the metadata stamping. Writers are stateless and safe to share
/// across threads.
pub trait TextureWriter: Send + Sync {
    /// Bake `image` to `path` with the given options.
    ///
    /// The full mip chain down to 1x1 is generated and written; the
    /// file at `path` is created or replaced.
    ///
    /// # Errors
    ///
    /// Returns a [`BakeError`] when the image is unusable, encoding
    /// fails, or the file cannot be written.
    fn bake(
        &self,
        image: &ImageBuffer,
        options: &BakeOptions,
        path: &Path,
    ) -> Result<(), BakeError>;

    /// The file extension this writer produces, without the dot.
    fn extension(&self) -> &str;

    /// Human-readable writer name for logs and reports.
    fn name(&self) -> &str;
}

/// Select a writer from an output path's extension.
///
/// Recognizes `exr` for OpenEXR and `tif`/`tiff` for TIFF, matched
/// case-insensitively.
///
/// # Returns
///
/// `None` when the path has no extension or the extension names no
/// known container.
pub fn writer_for_path(path: &Path) -> Option<Box<dyn TextureWriter>> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "exr" => Some(Box::new(ExrWriter::new())),
        "tif" | "tiff" => Some(Box::new(TiffWriter::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_writer_for_exr_path() {
        let writer = writer_for_path(Path::new("/out/texture.exr")).unwrap();
        assert_eq!(writer.extension(), "exr");
    }

    #[test]
    fn test_writer_for_tiff_paths() {
        let writer = writer_for_path(Path::new("texture.tif")).unwrap();
        assert_eq!(writer.extension(), "tif");

        let writer = writer_for_path(Path::new("texture.tiff")).unwrap();
        assert_eq!(writer.extension(), "tif");
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        assert!(writer_for_path(Path::new("TEXTURE.EXR")).is_some());
        assert!(writer_for_path(Path::new("scan.TIFF")).is_some());
    }

    #[test]
    fn test_unknown_extension_has_no_writer() {
        assert!(writer_for_path(Path::new("texture.png")).is_none());
        assert!(writer_for_path(Path::new("texture")).is_none());
        assert!(writer_for_path(&PathBuf::from("dir/")).is_none());
    }

    #[test]
    fn test_writers_are_trait_objects() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn TextureWriter>();
    }

    #[test]
    fn test_invalid_dimensions_display() {
        let err = BakeError::InvalidDimensions { width: 0, height: 128 };
        assert_eq!(
            err.to_string(),
            "invalid image dimensions 0x128: both sides must be positive"
        );
    }
}
