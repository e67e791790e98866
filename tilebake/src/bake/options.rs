//! Bake configuration.

use std::fmt;

use tracing::debug;

/// Compression scheme requested for the baked texture.
///
/// The tags follow the OpenEXR names. Writers that cannot honor a
/// scheme degrade to the closest one their container supports rather
/// than failing the bake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// No compression.
    None,
    /// Run-length encoding, lossless.
    Rle,
    /// Deflate, lossless. The default.
    Zip,
    /// Wavelet compression, lossless.
    Piz,
    /// 24-bit float quantization, lossy for full floats.
    Pxr24,
    /// Fixed-rate block compression, lossy.
    B44,
    /// B44 with a flat-block fast path, lossy.
    B44a,
}

impl Compression {
    /// Parse a compression tag, case-insensitively.
    ///
    /// Unrecognized tags fall back to [`Compression::Zip`] so that a
    /// stale host preset never blocks an export. The fallback is
    /// logged at debug level.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "none" => Compression::None,
            "rle" => Compression::Rle,
            "zip" => Compression::Zip,
            "piz" => Compression::Piz,
            "pxr24" => Compression::Pxr24,
            "b44" => Compression::B44,
            "b44a" => Compression::B44a,
            other => {
                debug!(tag = other, "unrecognized compression tag, using zip");
                Compression::Zip
            }
        }
    }

    /// The canonical tag for this scheme.
    pub fn tag(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Rle => "rle",
            Compression::Zip => "zip",
            Compression::Piz => "piz",
            Compression::Pxr24 => "pxr24",
            Compression::B44 => "b44",
            Compression::B44a => "b44a",
        }
    }
}

impl Default for Compression {
    fn default() -> Self {
        Compression::Zip
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Resampling kernel used when generating mip levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKernel {
    /// Plain 2x2 average.
    Box,
    /// Bilinear tent.
    Triangle,
    /// Catmull-Rom spline.
    CatmullRom,
    /// Gaussian blur.
    Gaussian,
    /// Three-lobe Lanczos. The default.
    Lanczos3,
}

impl FilterKernel {
    /// Parse a filter tag, case-insensitively.
    ///
    /// Unrecognized tags fall back to [`FilterKernel::Lanczos3`], the
    /// default production kernel, with a debug log.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "box" => FilterKernel::Box,
            "triangle" => FilterKernel::Triangle,
            "catmull-rom" => FilterKernel::CatmullRom,
            "gaussian" => FilterKernel::Gaussian,
            "lanczos3" => FilterKernel::Lanczos3,
            other => {
                debug!(tag = other, "unrecognized filter tag, using lanczos3");
                FilterKernel::Lanczos3
            }
        }
    }

    /// The canonical tag for this kernel.
    pub fn tag(&self) -> &'static str {
        match self {
            FilterKernel::Box => "box",
            FilterKernel::Triangle => "triangle",
            FilterKernel::CatmullRom => "catmull-rom",
            FilterKernel::Gaussian => "gaussian",
            FilterKernel::Lanczos3 => "lanczos3",
        }
    }

    /// The equivalent `image` crate resampling filter.
    ///
    /// The crate has no dedicated box kernel; for the 2:1 reductions
    /// used in mip chains the triangle filter computes the same 2x2
    /// average.
    pub(crate) fn filter_type(&self) -> image::imageops::FilterType {
        match self {
            FilterKernel::Box | FilterKernel::Triangle => image::imageops::FilterType::Triangle,
            FilterKernel::CatmullRom => image::imageops::FilterType::CatmullRom,
            FilterKernel::Gaussian => image::imageops::FilterType::Gaussian,
            FilterKernel::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl Default for FilterKernel {
    fn default() -> Self {
        FilterKernel::Lanczos3
    }
}

impl fmt::Display for FilterKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Options controlling how an assembled image is baked to disk.
///
/// # Example
///
/// ```
/// use tilebake::bake::{BakeOptions, Compression, FilterKernel};
///
/// let options = BakeOptions::new()
///     .with_compression(Compression::Piz)
///     .with_highlight_compensation(false)
///     .with_metadata("show", "demo");
///
/// assert_eq!(options.compression(), Compression::Piz);
/// assert_eq!(options.filter(), FilterKernel::Lanczos3);
/// assert!(!options.highlight_compensation());
/// ```
#[derive(Debug, Clone)]
pub struct BakeOptions {
    compression: Compression,
    filter: FilterKernel,
    highlight_compensation: bool,
    opaque_detection: bool,
    metadata: Vec<(String, String)>,
}

impl BakeOptions {
    /// Production defaults: zip compression, lanczos3 filtering,
    /// highlight compensation and opaque detection enabled, no extra
    /// metadata.
    pub fn new() -> Self {
        Self {
            compression: Compression::default(),
            filter: FilterKernel::default(),
            highlight_compensation: true,
            opaque_detection: true,
            metadata: Vec::new(),
        }
    }

    /// Set the compression scheme.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the mip resampling kernel.
    pub fn with_filter(mut self, filter: FilterKernel) -> Self {
        self.filter = filter;
        self
    }

    /// Enable or disable highlight compensation.
    ///
    /// When enabled, color values above 1.0 are range-compressed
    /// before mip resampling and re-expanded afterwards, which keeps
    /// small bright highlights from dominating their neighborhoods in
    /// the smaller levels.
    pub fn with_highlight_compensation(mut self, enabled: bool) -> Self {
        self.highlight_compensation = enabled;
        self
    }

    /// Enable or disable opaque alpha detection.
    ///
    /// When enabled and every alpha sample equals 1.0, the alpha
    /// channel is dropped from the baked texture.
    pub fn with_opaque_detection(mut self, enabled: bool) -> Self {
        self.opaque_detection = enabled;
        self
    }

    /// Append one metadata key/value pair to stamp into the output.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// The compression scheme.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// The mip resampling kernel.
    pub fn filter(&self) -> FilterKernel {
        self.filter
    }

    /// Whether highlight compensation is enabled.
    pub fn highlight_compensation(&self) -> bool {
        self.highlight_compensation
    }

    /// Whether opaque alpha detection is enabled.
    pub fn opaque_detection(&self) -> bool {
        self.opaque_detection
    }

    /// Metadata pairs to stamp into the output, in insertion order.
    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }
}

impl Default for BakeOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_parse_known_tags() {
        assert_eq!(Compression::from_tag("none"), Compression::None);
        assert_eq!(Compression::from_tag("rle"), Compression::Rle);
        assert_eq!(Compression::from_tag("zip"), Compression::Zip);
        assert_eq!(Compression::from_tag("piz"), Compression::Piz);
        assert_eq!(Compression::from_tag("pxr24"), Compression::Pxr24);
        assert_eq!(Compression::from_tag("b44"), Compression::B44);
        assert_eq!(Compression::from_tag("b44a"), Compression::B44a);
    }

    #[test]
    fn test_compression_parse_is_case_insensitive() {
        assert_eq!(Compression::from_tag("PIZ"), Compression::Piz);
        assert_eq!(Compression::from_tag("B44A"), Compression::B44a);
    }

    #[test]
    fn test_unrecognized_compression_falls_back_to_zip() {
        assert_eq!(Compression::from_tag("dwaa"), Compression::Zip);
        assert_eq!(Compression::from_tag(""), Compression::Zip);
        assert_eq!(Compression::from_tag("lzw"), Compression::Zip);
    }

    #[test]
    fn test_filter_parse_known_tags() {
        assert_eq!(FilterKernel::from_tag("box"), FilterKernel::Box);
        assert_eq!(FilterKernel::from_tag("triangle"), FilterKernel::Triangle);
        assert_eq!(FilterKernel::from_tag("catmull-rom"), FilterKernel::CatmullRom);
        assert_eq!(FilterKernel::from_tag("gaussian"), FilterKernel::Gaussian);
        assert_eq!(FilterKernel::from_tag("lanczos3"), FilterKernel::Lanczos3);
    }

    #[test]
    fn test_unrecognized_filter_falls_back_to_lanczos3() {
        assert_eq!(FilterKernel::from_tag("mitchell"), FilterKernel::Lanczos3);
    }

    #[test]
    fn test_default_options() {
        let options = BakeOptions::new();
        assert_eq!(options.compression(), Compression::Zip);
        assert_eq!(options.filter(), FilterKernel::Lanczos3);
        assert!(options.highlight_compensation());
        assert!(options.opaque_detection());
        assert!(options.metadata().is_empty());
    }

    #[test]
    fn test_builder_chain() {
        let options = BakeOptions::new()
            .with_compression(Compression::Rle)
            .with_filter(FilterKernel::Box)
            .with_highlight_compensation(false)
            .with_opaque_detection(false)
            .with_metadata("show", "alpha")
            .with_metadata("shot", "0010");

        assert_eq!(options.compression(), Compression::Rle);
        assert_eq!(options.filter(), FilterKernel::Box);
        assert!(!options.highlight_compensation());
        assert!(!options.opaque_detection());
        assert_eq!(
            options.metadata(),
            &[
                ("show".to_string(), "alpha".to_string()),
                ("shot".to_string(), "0010".to_string()),
            ]
        );
    }

    #[test]
    fn test_display_tags() {
        assert_eq!(Compression::Pxr24.to_string(), "pxr24");
        assert_eq!(FilterKernel::CatmullRom.to_string(), "catmull-rom");
    }
}
