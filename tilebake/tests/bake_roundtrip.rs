//! Integration tests for the bake pipeline.
//!
//! These tests run the full flow a host integration would:
//! - raster source → tile reassembly → mip chain → encoded file
//! - EXR files read back with the `exr` crate
//! - TIFF files read back with the `tiff` crate
//!
//! Run with: `cargo test --test bake_roundtrip`

use std::fs::File;
use std::path::Path;

use exr::image::read::image::ReadLayers as _;
use exr::image::read::layers::ReadChannels as _;
use exr::image::read::read;
use exr::math::Vec2;
use half::f16;
use image::{DynamicImage, Rgba, Rgba32FImage, RgbaImage};
use tempfile::TempDir;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use tilebake::TextureWriter as _;
use tilebake::{
    save, writer_for_path, BakeOptions, ExrWriter, RasterTileSource, SaveRequest, TiffWriter,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// A 16x16 8-bit gradient with full alpha.
fn gradient_canvas() -> DynamicImage {
    let img = RgbaImage::from_fn(16, 16, |x, y| {
        Rgba([(x as u8) * 16, (y as u8) * 16, 128, 255])
    });
    DynamicImage::ImageRgba8(img)
}

/// A 16x16 float canvas holding values beyond the display range.
fn hdr_canvas(value: f32) -> DynamicImage {
    let img = Rgba32FImage::from_pixel(16, 16, Rgba([value, value, value, 1.0]));
    DynamicImage::ImageRgba32F(img)
}

/// Bake `canvas` to `file_name` inside a fresh temp directory.
fn bake(
    canvas: &DynamicImage,
    format_tag: &str,
    file_name: &str,
    options: BakeOptions,
) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("temp dir should be creatable");
    let path = dir.path().join(file_name);

    let source = RasterTileSource::new(
        canvas,
        format_tag.parse().expect("format tag should parse"),
        8,
        8,
    )
    .expect("source should accept the canvas");
    let writer = writer_for_path(&path).expect("extension should be recognized");
    let request = SaveRequest::new(format_tag, 8, 8, &path).with_options(options);

    save(&source, writer.as_ref(), &request).expect("save should succeed");
    (dir, path)
}

/// Channel names of a read-back EXR layer, in storage order.
fn channel_names(layer: &exr::image::Layer<ReadChannels>) -> Vec<String> {
    layer
        .channel_data
        .list
        .iter()
        .map(|c| c.name.to_string())
        .collect()
}

type ReadChannels =
    exr::image::AnyChannels<exr::image::Levels<exr::image::FlatSamples>>;

/// Read an EXR file with all channels, levels, and attributes.
fn read_exr(path: &Path) -> exr::image::Image<exr::image::Layer<ReadChannels>> {
    read()
        .no_deep_data()
        .all_resolution_levels()
        .all_channels()
        .first_valid_layer()
        .all_attributes()
        .from_file(path)
        .expect("baked file should read back")
}

// ============================================================================
// EXR Round Trips
// ============================================================================

/// An 8-bit source baked as half floats keeps its pixels and gains a
/// full mip chain down to 1x1.
#[test]
fn test_exr_roundtrip_preserves_pixels_and_mips() {
    let (_dir, path) = bake(
        &gradient_canvas(),
        "half-rgba",
        "gradient.exr",
        BakeOptions::new().with_opaque_detection(false),
    );

    let image = read_exr(&path);
    let layer = &image.layer_data;
    assert_eq!(layer.size, Vec2(16, 16));

    // Channels come back sorted by name.
    assert_eq!(channel_names(layer), ["A", "B", "G", "R"]);

    for channel in &layer.channel_data.list {
        let levels = channel.sample_data.levels_as_slice();
        assert_eq!(levels.len(), 5, "16x16 should carry 5 mip levels");
        let expected_lens = [256, 64, 16, 4, 1];
        for (level, expected) in levels.iter().zip(expected_lens) {
            assert_eq!(level.len(), expected);
        }
    }

    // Pixel (3, 2): R = 48/255, stored as f16.
    let red = &layer.channel_data.list[3];
    let level0 = &red.sample_data.levels_as_slice()[0];
    let sample = level0.value_by_flat_index(2 * 16 + 3).to_f32();
    assert!(
        (sample - 48.0 / 255.0).abs() < 2e-3,
        "red sample {sample} should match the painted gradient"
    );
}

/// A fully opaque alpha channel is dropped from the file, and kept
/// when opaque detection is off.
#[test]
fn test_exr_opaque_alpha_dropped() {
    let (_dir, path) = bake(
        &gradient_canvas(),
        "half-rgba",
        "opaque.exr",
        BakeOptions::new(),
    );
    let image = read_exr(&path);
    assert_eq!(channel_names(&image.layer_data), ["B", "G", "R"]);

    let (_dir, path) = bake(
        &gradient_canvas(),
        "half-rgba",
        "forced.exr",
        BakeOptions::new().with_opaque_detection(false),
    );
    let image = read_exr(&path);
    assert_eq!(channel_names(&image.layer_data), ["A", "B", "G", "R"]);
}

/// Float sources stay full floats on disk and values beyond the
/// display range survive the mip chain.
#[test]
fn test_exr_float_hdr_survives_mips() {
    let (_dir, path) = bake(
        &hdr_canvas(8.0),
        "float-rgba",
        "hdr.exr",
        BakeOptions::new().with_opaque_detection(false),
    );

    let image = read_exr(&path);
    let red = &image.layer_data.channel_data.list[3];
    assert_eq!(red.name.to_string(), "R");

    for level in red.sample_data.levels_as_slice() {
        assert!(
            matches!(level, exr::image::FlatSamples::F32(_)),
            "float format should keep 32-bit storage"
        );
        for index in 0..level.len() {
            let sample = level.value_by_flat_index(index).to_f32();
            assert!(
                (sample - 8.0).abs() < 1e-3,
                "constant 8.0 canvas should stay 8.0 at every level, got {sample}"
            );
        }
    }
}

/// Metadata pairs land in the layer attributes: artist becomes the
/// owner, comments map directly, everything else is carried as a
/// custom attribute. The software name is always stamped.
#[test]
fn test_exr_metadata_written() {
    let options = BakeOptions::new()
        .with_metadata("artist", "jane")
        .with_metadata("comment", "first pass")
        .with_metadata("show", "alpha");
    let (_dir, path) = bake(&gradient_canvas(), "half-rgba", "meta.exr", options);

    let image = read_exr(&path);
    let attrs = &image.layer_data.attributes;

    assert_eq!(attrs.owner.as_ref().map(|t| t.to_string()), Some("jane".to_string()));
    assert_eq!(
        attrs.comments.as_ref().map(|t| t.to_string()),
        Some("first pass".to_string())
    );
    let software = attrs
        .software_name
        .as_ref()
        .map(|t| t.to_string())
        .unwrap_or_default();
    assert!(
        software.starts_with("tilebake "),
        "software name {software:?} should carry the tool stamp"
    );
    assert!(
        attrs.other.keys().any(|k| k.to_string() == "show"),
        "unmapped pairs should land in the custom attribute table"
    );
}

// ============================================================================
// TIFF Round Trips
// ============================================================================

/// Count the pages in a TIFF file, leaving the decoder on the last one.
fn page_count<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> usize {
    let mut pages = 1;
    while decoder.more_images() {
        decoder.next_image().expect("page should decode");
        pages += 1;
    }
    pages
}

/// Byte sources come back byte-exact from page 0, and the following
/// pages halve down to 1x1 with the reduced-resolution flag set.
#[test]
fn test_tiff_multipage_chain() {
    let options = BakeOptions::new()
        .with_metadata("artist", "jane")
        .with_opaque_detection(false);
    let (_dir, path) = bake(&gradient_canvas(), "byte-rgba", "gradient.tif", options);

    let mut decoder = Decoder::new(File::open(&path).expect("file should exist"))
        .expect("baked file should read back");

    assert_eq!(decoder.dimensions().expect("dims"), (16, 16));
    assert_eq!(
        decoder
            .get_tag_ascii_string(Tag::Artist)
            .expect("artist tag should exist on page 0"),
        "jane"
    );
    let software = decoder
        .get_tag_ascii_string(Tag::Software)
        .expect("software tag should exist");
    assert!(software.starts_with("tilebake "));

    let page0 = decoder.read_image().expect("page 0 should decode");
    match page0 {
        DecodingResult::U8(samples) => {
            assert_eq!(samples.len(), 16 * 16 * 4);
            // Pixel (3, 2): the painted gradient, byte for byte.
            let at = (2 * 16 + 3) * 4;
            assert_eq!(&samples[at..at + 4], &[48, 32, 128, 255]);
        }
        other => panic!("byte format should decode as U8, got {other:?}"),
    }

    decoder.next_image().expect("page 1 should exist");
    assert_eq!(decoder.dimensions().expect("dims"), (8, 8));
    assert_eq!(
        decoder
            .get_tag_u32(Tag::NewSubfileType)
            .expect("smaller pages should be flagged"),
        1
    );

    // 16x16 bakes five pages: 16, 8, 4, 2, 1.
    let remaining = page_count(&mut decoder);
    assert_eq!(remaining, 4);
    assert_eq!(decoder.dimensions().expect("dims"), (1, 1));
}

/// Float sources produce 32-bit float pages and keep values beyond
/// the display range.
#[test]
fn test_tiff_float_pages_keep_hdr() {
    let (_dir, path) = bake(
        &hdr_canvas(8.0),
        "float-rgb",
        "hdr.tif",
        BakeOptions::new(),
    );

    let mut decoder = Decoder::new(File::open(&path).expect("file should exist"))
        .expect("baked file should read back");

    let page0 = decoder.read_image().expect("page 0 should decode");
    match page0 {
        DecodingResult::F32(samples) => {
            assert_eq!(samples.len(), 16 * 16 * 3);
            for sample in samples {
                assert!((sample - 8.0).abs() < 1e-3);
            }
        }
        other => panic!("float format should decode as F32, got {other:?}"),
    }
}

// ============================================================================
// Writer Dispatch
// ============================================================================

/// The path extension selects the writer; unknown extensions are
/// rejected before any work happens.
#[test]
fn test_writer_dispatch_by_extension() {
    let exr = writer_for_path(Path::new("out.exr")).expect("exr should dispatch");
    assert_eq!(exr.name(), ExrWriter::new().name());

    let tif = writer_for_path(Path::new("out.TIF")).expect("tif should dispatch");
    assert_eq!(tif.name(), TiffWriter::new().name());

    assert!(writer_for_path(Path::new("out.png")).is_none());
    assert!(writer_for_path(Path::new("out")).is_none());
}

/// Half-precision samples survive the normalized tile transport.
#[test]
fn test_half_samples_survive_transport() {
    let value = f16::from_f32(0.625);
    let img = Rgba32FImage::from_pixel(8, 8, Rgba([value.to_f32(), 0.0, 0.0, 1.0]));
    let (_dir, path) = bake(
        &DynamicImage::ImageRgba32F(img),
        "half-rgb",
        "half.exr",
        BakeOptions::new(),
    );

    let image = read_exr(&path);
    let red = &image.layer_data.channel_data.list[2];
    assert_eq!(red.name.to_string(), "R");
    let level0 = &red.sample_data.levels_as_slice()[0];
    assert_eq!(level0.value_by_flat_index(0).to_f32(), 0.625);
}
