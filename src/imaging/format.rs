//! Output format resolution.
//!
//! [`OutputFormat`] is the bare identifier resolved from a file extension.
//! [`FormatOption`] pairs it with exactly the encode options that format
//! understands: one variant per format, so an illegal combination cannot be
//! represented once construction succeeded.
//!
//! | Format | Extensions | Options | Default |
//! |---|---|---|---|
//! | JPEG | `jpg`, `jpeg` | quality | 75 |
//! | PNG | `png` | png compression | default |
//! | GIF | `gif` | none | none |
//! | TIFF | `tif`, `tiff` | tiff compression | Deflate (balanced) |
//! | BMP | `bmp` | none | none |
//! | WebP | `webp` | none (lossless) | none |
//! | AVIF | `avif` | quality | 75 |

use super::params::{EncodeOption, PngCompression, Quality, TiffCompression};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormatError {
    #[error("Unsupported output format: {0:?}")]
    UnsupportedFormat(String),
    #[error("Conflicting {kind} options for {format}: at most one may be given")]
    ConflictingOption {
        format: OutputFormat,
        kind: &'static str,
    },
    #[error("{format} does not accept {option}")]
    UnsupportedOption {
        format: OutputFormat,
        option: EncodeOption,
    },
}

/// Output format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
    Tiff,
    Bmp,
    WebP,
    Avif,
}

const EXTENSIONS: &[(&str, OutputFormat)] = &[
    ("jpg", OutputFormat::Jpeg),
    ("jpeg", OutputFormat::Jpeg),
    ("png", OutputFormat::Png),
    ("gif", OutputFormat::Gif),
    ("tif", OutputFormat::Tiff),
    ("tiff", OutputFormat::Tiff),
    ("bmp", OutputFormat::Bmp),
    ("webp", OutputFormat::WebP),
    ("avif", OutputFormat::Avif),
];

impl OutputFormat {
    /// Resolve a format from an extension or bare name.
    ///
    /// Case-insensitive; a leading dot is accepted (`".JPG"` → JPEG).
    pub fn from_extension(ext: &str) -> Result<Self, FormatError> {
        let ext = ext.trim();
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        EXTENSIONS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
            .map(|(_, format)| *format)
            .ok_or_else(|| FormatError::UnsupportedFormat(ext.to_string()))
    }

    /// Canonical file extension, lowercase and without a dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::Tiff => "tif",
            OutputFormat::Bmp => "bmp",
            OutputFormat::WebP => "webp",
            OutputFormat::Avif => "avif",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::Gif => "GIF",
            OutputFormat::Tiff => "TIFF",
            OutputFormat::Bmp => "BMP",
            OutputFormat::WebP => "WebP",
            OutputFormat::Avif => "AVIF",
        };
        f.write_str(name)
    }
}

/// A resolved output format together with its encode options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatOption {
    Jpeg { quality: Quality },
    Png { compression: PngCompression },
    Gif,
    Tiff { compression: TiffCompression },
    Bmp,
    WebP,
    Avif { quality: Quality },
}

impl Default for FormatOption {
    /// JPEG at quality 75.
    fn default() -> Self {
        FormatOption::Jpeg {
            quality: Quality::default(),
        }
    }
}

impl FormatOption {
    /// Validate `options` against `format`.
    ///
    /// Each format accepts at most one option of each kind it understands;
    /// a second one is a [`FormatError::ConflictingOption`], an option of a
    /// kind it does not understand is a [`FormatError::UnsupportedOption`].
    /// Missing options fall back to the per-format defaults.
    pub fn new(format: OutputFormat, options: &[EncodeOption]) -> Result<Self, FormatError> {
        let mut quality = None;
        let mut tiff = None;
        let mut png = None;

        for option in options {
            let accepted = match (format, option) {
                (OutputFormat::Jpeg | OutputFormat::Avif, EncodeOption::Quality(q)) => {
                    set_once(&mut quality, *q, format, option)?
                }
                (OutputFormat::Tiff, EncodeOption::TiffCompression(c)) => {
                    set_once(&mut tiff, *c, format, option)?
                }
                (OutputFormat::Png, EncodeOption::PngCompression(c)) => {
                    set_once(&mut png, *c, format, option)?
                }
                _ => false,
            };
            if !accepted {
                return Err(FormatError::UnsupportedOption {
                    format,
                    option: *option,
                });
            }
        }

        Ok(match format {
            OutputFormat::Jpeg => FormatOption::Jpeg {
                quality: quality.unwrap_or_default(),
            },
            OutputFormat::Avif => FormatOption::Avif {
                quality: quality.unwrap_or_default(),
            },
            OutputFormat::Png => FormatOption::Png {
                compression: png.unwrap_or_default(),
            },
            OutputFormat::Tiff => FormatOption::Tiff {
                compression: tiff.unwrap_or_default(),
            },
            OutputFormat::Gif => FormatOption::Gif,
            OutputFormat::Bmp => FormatOption::Bmp,
            OutputFormat::WebP => FormatOption::WebP,
        })
    }

    /// Resolve the format from an extension, then validate `options`.
    pub fn from_extension(ext: &str, options: &[EncodeOption]) -> Result<Self, FormatError> {
        Self::new(OutputFormat::from_extension(ext)?, options)
    }

    pub fn format(&self) -> OutputFormat {
        match self {
            FormatOption::Jpeg { .. } => OutputFormat::Jpeg,
            FormatOption::Png { .. } => OutputFormat::Png,
            FormatOption::Gif => OutputFormat::Gif,
            FormatOption::Tiff { .. } => OutputFormat::Tiff,
            FormatOption::Bmp => OutputFormat::Bmp,
            FormatOption::WebP => OutputFormat::WebP,
            FormatOption::Avif { .. } => OutputFormat::Avif,
        }
    }

    /// Output path for `destination`: its extension replaced (or appended)
    /// with this format's canonical extension.
    ///
    /// `out/photo.png` → `out/photo.jpg`, `out/photo` → `out/photo.jpg`.
    pub fn path(&self, destination: &Path) -> PathBuf {
        destination.with_extension(self.format().extension())
    }
}

/// Store `value` in `slot` unless it is already taken.
fn set_once<T>(
    slot: &mut Option<T>,
    value: T,
    format: OutputFormat,
    option: &EncodeOption,
) -> Result<bool, FormatError> {
    if slot.is_some() {
        return Err(FormatError::ConflictingOption {
            format,
            kind: option.kind(),
        });
    }
    *slot = Some(value);
    Ok(true)
}
