//! Tilebake CLI - Bake raster images into mipmapped textures
//!
//! Decodes an input raster with the `image` crate, chunks it into
//! tiles, and runs the full reassembly and bake pipeline against it.
//! The output extension selects the texture format.

mod error;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use tilebake::{
    save, writer_for_path, BakeOptions, Compression, FilterKernel, PixelFormat, RasterTileSource,
    SaveReport, SaveRequest,
};

use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(
    name = "tilebake",
    version,
    about = "Bake tiled paint sources into mipmapped EXR and TIFF textures"
)]
struct Cli {
    /// Input raster image
    input: PathBuf,

    /// Output texture path; the extension selects the format (.exr, .tif)
    output: PathBuf,

    /// Pixel format tag (byte/half/float x rgb/rgba, e.g. half-rgba)
    #[arg(long, default_value = "half-rgba")]
    format: String,

    /// Square tile size used to chunk the input
    #[arg(long, default_value_t = 256)]
    tile_size: u32,

    /// Compression scheme (none, rle, zip, piz, pxr24, b44, b44a)
    #[arg(long, default_value = "zip")]
    compression: String,

    /// Downsampling filter (box, triangle, catmull-rom, gaussian, lanczos3)
    #[arg(long, default_value = "lanczos3")]
    filter: String,

    /// Feed values beyond the display range to the resampler unchanged
    #[arg(long)]
    no_highlight_compensation: bool,

    /// Keep the alpha channel even when it is fully opaque
    #[arg(long)]
    no_opaque_detection: bool,

    /// Attach a metadata pair to the output (repeatable)
    #[arg(long = "metadata", value_name = "KEY=VALUE")]
    metadata: Vec<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Install the log subscriber. `RUST_LOG` wins over the verbosity flag.
/// Logs go to stderr so stdout stays clean for the report line.
fn init_tracing(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Collect metadata pairs: explicit `--metadata` arguments first, then
/// convention environment variables for any key not already given.
fn metadata_pairs(cli: &Cli) -> Result<Vec<(String, String)>, CliError> {
    let mut pairs = Vec::new();
    for raw in &cli.metadata {
        let Some((key, value)) = raw.split_once('=') else {
            return Err(CliError::Metadata(raw.clone()));
        };
        if key.is_empty() {
            return Err(CliError::Metadata(raw.clone()));
        }
        pairs.push((key.to_string(), value.to_string()));
    }

    for (key, var) in [("show", "SHOW"), ("shot", "SHOT"), ("artist", "USER")] {
        if pairs.iter().any(|(k, _)| k == key) {
            continue;
        }
        if let Ok(value) = env::var(var) {
            if !value.is_empty() {
                pairs.push((key.to_string(), value));
            }
        }
    }
    Ok(pairs)
}

/// Build bake options from the parsed arguments.
fn build_options(cli: &Cli) -> Result<BakeOptions, CliError> {
    let mut options = BakeOptions::new()
        .with_compression(Compression::from_tag(&cli.compression))
        .with_filter(FilterKernel::from_tag(&cli.filter))
        .with_highlight_compensation(!cli.no_highlight_compensation)
        .with_opaque_detection(!cli.no_opaque_detection);
    for (key, value) in metadata_pairs(cli)? {
        options = options.with_metadata(key, value);
    }
    Ok(options)
}

/// Run the bake and return the report for printing.
fn run(cli: &Cli) -> Result<SaveReport, CliError> {
    let format: PixelFormat = cli.format.parse()?;
    let options = build_options(cli)?;
    tracing::debug!(
        input = %cli.input.display(),
        format = %format,
        tile_size = cli.tile_size,
        compression = %options.compression(),
        filter = %options.filter(),
        "bake configured"
    );

    let canvas = image::open(&cli.input)?;
    let source = RasterTileSource::new(&canvas, format, cli.tile_size, cli.tile_size)?;
    let writer = writer_for_path(&cli.output)
        .ok_or_else(|| CliError::UnsupportedOutput(cli.output.display().to_string()))?;

    let request = SaveRequest::new(cli.format.as_str(), cli.tile_size, cli.tile_size, &cli.output)
        .with_options(options);
    let report = save(&source, writer.as_ref(), &request)?;
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
