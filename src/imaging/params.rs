//! Encode-time parameter types.
//!
//! These describe *how* an output format should be written, not *which*
//! format. [`EncodeOption`] is the loose form a caller hands in;
//! [`FormatOption`](super::format::FormatOption) validates a list of them
//! against a concrete format and keeps only the legal ones.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 75). Clamped on construction.
//! - [`TiffCompression`]: Compression scheme for TIFF output (default Deflate, balanced level).
//! - [`PngCompression`]: zlib effort for PNG output.
//! - [`EncodeOption`]: One option of any of the kinds above.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// TIFF compression methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression
    Lzw,
    /// Deflate, fast level
    DeflateFast,
    /// Deflate, balanced level
    #[default]
    DeflateBalanced,
    /// Deflate, best compression (slowest)
    DeflateBest,
}

impl TiffCompression {
    pub(crate) fn to_tiff(self) -> tiff::encoder::Compression {
        use tiff::encoder::Compression;
        use tiff::encoder::compression::DeflateLevel;
        match self {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        }
    }
}

/// PNG compression effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PngCompression {
    #[default]
    Default,
    Fast,
    Best,
}

impl PngCompression {
    pub(crate) fn to_image(self) -> image::codecs::png::CompressionType {
        use image::codecs::png::CompressionType;
        match self {
            PngCompression::Default => CompressionType::Default,
            PngCompression::Fast => CompressionType::Fast,
            PngCompression::Best => CompressionType::Best,
        }
    }
}

/// A single encode option of any kind.
///
/// Which kinds a format accepts is decided by
/// [`FormatOption::new`](super::format::FormatOption::new).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOption {
    Quality(Quality),
    TiffCompression(TiffCompression),
    PngCompression(PngCompression),
}

impl EncodeOption {
    /// Short name of the option kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            EncodeOption::Quality(_) => "quality",
            EncodeOption::TiffCompression(_) => "tiff compression",
            EncodeOption::PngCompression(_) => "png compression",
        }
    }
}

impl fmt::Display for EncodeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeOption::Quality(q) => write!(f, "quality {}", q.value()),
            EncodeOption::TiffCompression(c) => write!(f, "tiff compression {c:?}"),
            EncodeOption::PngCompression(c) => write!(f, "png compression {c:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_75() {
        assert_eq!(Quality::default().value(), 75);
    }

    #[test]
    fn tiff_compression_default_is_deflate() {
        assert_eq!(TiffCompression::default(), TiffCompression::DeflateBalanced);
    }

    #[test]
    fn tiff_compression_parses_kebab_case() {
        #[derive(Deserialize)]
        struct Wrap {
            c: TiffCompression,
        }
        let w: Wrap = toml::from_str(r#"c = "deflate-best""#).unwrap();
        assert_eq!(w.c, TiffCompression::DeflateBest);
        let w: Wrap = toml::from_str(r#"c = "lzw""#).unwrap();
        assert_eq!(w.c, TiffCompression::Lzw);
    }

    #[test]
    fn encode_option_kind_names() {
        assert_eq!(EncodeOption::Quality(Quality::new(80)).kind(), "quality");
        assert_eq!(
            EncodeOption::TiffCompression(TiffCompression::Lzw).kind(),
            "tiff compression"
        );
        assert_eq!(
            EncodeOption::PngCompression(PngCompression::Best).to_string(),
            "png compression Best"
        );
    }
}
