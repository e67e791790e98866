//! Mip chain generation.
//!
//! Every baked texture carries a full mip chain: the assembled image
//! as level 0, then successive halvings (rounding down, never below
//! one pixel) until a 1x1 level. Each level is resampled from the one
//! above it with the configured filter kernel.
//!
//! Two maketx-style treatments run here rather than in the container
//! writers, because they change the pixel data itself:
//!
//! * Highlight compensation range-compresses color values above 1.0
//!   before resampling and re-expands them per level, so a single hot
//!   sample cannot dominate a whole neighborhood of a small level.
//! * Opaque detection drops the alpha channel entirely when every
//!   alpha sample equals 1.0.

use half::f16;
use image::imageops::{self, FilterType};
use image::{Rgb32FImage, Rgba32FImage};
use tracing::debug;

use crate::imagebuf::{ImageBuffer, Samples};

use super::{BakeError, BakeOptions};

/// Number of levels in a full mip chain for the given base size.
///
/// Counts level 0 and every halving down to 1x1.
///
/// # Example
///
/// ```
/// use tilebake::bake::mips::mip_level_count;
///
/// assert_eq!(mip_level_count(1, 1), 1);
/// assert_eq!(mip_level_count(4096, 4096), 13);
/// assert_eq!(mip_level_count(10, 10), 4);
/// ```
pub fn mip_level_count(width: usize, height: usize) -> usize {
    let mut w = width.max(1);
    let mut h = height.max(1);
    let mut count = 1;
    while w > 1 || h > 1 {
        w = (w / 2).max(1);
        h = (h / 2).max(1);
        count += 1;
    }
    count
}

/// One resolution level, interleaved and normalized to `f32`.
#[derive(Debug, Clone)]
pub(crate) struct MipLevel {
    pub width: usize,
    pub height: usize,
    pub samples: Vec<f32>,
}

/// A complete mip chain, largest level first.
#[derive(Debug, Clone)]
pub(crate) struct MipChain {
    /// Channels per pixel after opaque detection (3 or 4).
    pub channels: usize,
    pub levels: Vec<MipLevel>,
}

/// Build the full mip chain for an assembled image.
///
/// Level 0 is the image itself, untouched apart from a possible alpha
/// drop. Resampling runs in range-compressed space when highlight
/// compensation is enabled.
pub(crate) fn build_chain(
    image: &ImageBuffer,
    options: &BakeOptions,
) -> Result<MipChain, BakeError> {
    let width = image.width();
    let height = image.height();
    if width == 0 || height == 0 {
        return Err(BakeError::InvalidDimensions { width, height });
    }

    let channels = if options.opaque_detection() && image.channels() == 4 && alpha_is_opaque(image)
    {
        debug!("alpha channel is fully opaque, dropping it");
        3
    } else {
        image.channels()
    };
    let color_channels = channels.min(3);
    let filter = options.filter().filter_type();

    let level0 = interleave(image, channels);
    let mut levels = vec![MipLevel {
        width,
        height,
        samples: level0.clone(),
    }];

    let mut working = level0;
    if options.highlight_compensation() {
        compress_highlights(&mut working, channels, color_channels);
    }

    let mut w = width;
    let mut h = height;
    while w > 1 || h > 1 {
        let next_w = (w / 2).max(1);
        let next_h = (h / 2).max(1);
        working = resize_level(&working, channels, w, h, next_w, next_h, filter)?;

        let mut emitted = working.clone();
        if options.highlight_compensation() {
            expand_highlights(&mut emitted, channels, color_channels);
        }
        levels.push(MipLevel {
            width: next_w,
            height: next_h,
            samples: emitted,
        });

        w = next_w;
        h = next_h;
    }

    debug!(
        levels = levels.len(),
        channels,
        filter = %options.filter(),
        "mip chain built"
    );

    Ok(MipChain { channels, levels })
}

/// Whether every alpha sample of a four-channel image equals 1.0.
fn alpha_is_opaque(image: &ImageBuffer) -> bool {
    let channels = image.channels();
    match image.samples() {
        Samples::U8(data) => data.chunks_exact(channels).all(|px| px[3] == u8::MAX),
        Samples::F16(data) => data.chunks_exact(channels).all(|px| px[3] == f16::ONE),
        Samples::F32(data) => data.chunks_exact(channels).all(|px| px[3] == 1.0),
    }
}

/// Flatten an image into interleaved normalized floats, keeping only
/// the first `channels` channels of each pixel.
fn interleave(image: &ImageBuffer, channels: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(image.width() * image.height() * channels);
    for y in 0..image.height() {
        for x in 0..image.width() {
            for channel in 0..channels {
                out.push(image.get(x, y, channel));
            }
        }
    }
    out
}

/// Resample one level to the next size down.
///
/// The resampler clamps samples to the unit range, so the level is
/// remapped onto [0, 1] (shifted by its lowest sample, scaled by its
/// full range) and mapped back afterwards. The kernels are linear,
/// which makes the remap lossless, including for negative samples.
fn resize_level(
    samples: &[f32],
    channels: usize,
    width: usize,
    height: usize,
    new_width: usize,
    new_height: usize,
    filter: FilterType,
) -> Result<Vec<f32>, BakeError> {
    let low = samples.iter().copied().fold(0.0f32, f32::min);
    let high = samples.iter().copied().fold(1.0f32, f32::max);
    let range = high - low;
    let scaled: Vec<f32> = samples.iter().map(|v| (v - low) / range).collect();

    let resized = match channels {
        3 => {
            let level = Rgb32FImage::from_raw(width as u32, height as u32, scaled)
                .ok_or_else(|| BakeError::Encoding("mip level size mismatch".to_string()))?;
            imageops::resize(&level, new_width as u32, new_height as u32, filter).into_raw()
        }
        4 => {
            let level = Rgba32FImage::from_raw(width as u32, height as u32, scaled)
                .ok_or_else(|| BakeError::Encoding("mip level size mismatch".to_string()))?;
            imageops::resize(&level, new_width as u32, new_height as u32, filter).into_raw()
        }
        other => {
            return Err(BakeError::Encoding(format!(
                "unsupported channel count {other}"
            )))
        }
    };

    Ok(resized.into_iter().map(|v| v * range + low).collect())
}

fn compress_highlights(samples: &mut [f32], channels: usize, color_channels: usize) {
    for pixel in samples.chunks_exact_mut(channels) {
        for value in &mut pixel[..color_channels] {
            if *value > 1.0 {
                *value = 1.0 + value.ln();
            }
        }
    }
}

fn expand_highlights(samples: &mut [f32], channels: usize, color_channels: usize) {
    for pixel in samples.chunks_exact_mut(channels) {
        for value in &mut pixel[..color_channels] {
            if *value > 1.0 {
                *value = (*value - 1.0).exp();
            }
        }
    }
}
