//! CLI error types.

use thiserror::Error;

use tilebake::{FormatParseError, SaveError, SourceError};

/// Errors surfaced to the user as a nonzero exit.
#[derive(Debug, Error)]
pub enum CliError {
    /// The input raster could not be opened or decoded.
    #[error("could not read input image: {0}")]
    Input(#[from] image::ImageError),

    /// The requested pixel format tag is unknown.
    #[error(transparent)]
    Format(#[from] FormatParseError),

    /// The output path's extension names no supported texture format.
    #[error("unsupported output format: {0} (expected .exr or .tif)")]
    UnsupportedOutput(String),

    /// A `--metadata` argument was not of the form `KEY=VALUE`.
    #[error("invalid metadata pair {0:?}: expected KEY=VALUE")]
    Metadata(String),

    /// The tile source rejected its configuration.
    #[error("could not prepare tile source: {0}")]
    Source(#[from] SourceError),

    /// The save pipeline failed.
    #[error(transparent)]
    Save(#[from] SaveError),
}
