//! Conversion job configuration.
//!
//! A job file describes one set of [`Options`] in TOML. Stock defaults are
//! the base layer; a job file (or several, merged in order) overrides just
//! the keys it names.
//!
//! ## Job File Format
//!
//! ```toml
//! # All sections are optional - defaults shown below
//!
//! [format]
//! extension = "jpg"                      # jpg|jpeg|png|gif|tif|tiff|bmp|webp|avif
//! # quality = 75                         # JPEG/AVIF only (1-100)
//! # tiff_compression = "deflate-balanced" # none|lzw|deflate-fast|deflate-balanced|deflate-best
//! # png_compression = "default"          # default|fast|best
//!
//! # [resize]                             # omit for no resize
//! # width = 800                          # 0 = derive from height
//! # height = 0                           # 0 = derive from width
//! # percent = 50.0                       # wins over width/height when non-zero
//!
//! # [watermark]                          # omit for no watermark
//! # mark = "logo.png"                    # relative to the job file
//! # opacity = 128                        # 0 means the default (128)
//! # random = false                       # random placement ignores offset
//! # offset = [10, 10]
//! # fit = false                          # scale the mark to half the base
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::convert::Options;
use crate::imaging::{
    CodecError, EncodeOption, FormatError, Offset, PngCompression, Quality, ResizeError,
    ResizeOption, TiffCompression, WatermarkOption,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Format error: {0}")]
    Format(#[from] FormatError),
    #[error("Resize error: {0}")]
    Resize(#[from] ResizeError),
    #[error("Failed to load watermark: {0}")]
    Watermark(#[from] CodecError),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// A conversion job loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Output format and its encode options.
    pub format: FormatConfig,
    /// Resize step. Absent means the source size is kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize: Option<ResizeConfig>,
    /// Watermark step. Absent means no watermark.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<WatermarkConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatConfig {
    pub extension: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiff_compression: Option<TiffCompression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub png_compression: Option<PngCompression>,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            extension: "jpg".to_string(),
            quality: None,
            tiff_compression: None,
            png_compression: None,
        }
    }
}

impl FormatConfig {
    fn encode_options(&self) -> Vec<EncodeOption> {
        let mut options = Vec::new();
        if let Some(q) = self.quality {
            options.push(EncodeOption::Quality(Quality::new(
                u8::try_from(q).unwrap_or(u8::MAX),
            )));
        }
        if let Some(c) = self.tiff_compression {
            options.push(EncodeOption::TiffCompression(c));
        }
        if let Some(c) = self.png_compression {
            options.push(EncodeOption::PngCompression(c));
        }
        options
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub width: u32,
    pub height: u32,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatermarkConfig {
    /// Mark image. Relative paths resolve against the job file's directory.
    pub mark: PathBuf,
    #[serde(default)]
    pub opacity: u8,
    #[serde(default)]
    pub random: bool,
    #[serde(default)]
    pub offset: [i64; 2],
    #[serde(default)]
    pub fit: bool,
}

impl ConvertConfig {
    /// Validate values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .format
            .quality
            .is_some_and(|q| !(1..=100).contains(&q))
        {
            return Err(ConfigError::Validation(
                "format.quality must be 1-100".into(),
            ));
        }
        if self
            .resize
            .is_some_and(|r| !r.percent.is_finite() || r.percent < 0.0)
        {
            return Err(ConfigError::Validation(
                "resize.percent must be a non-negative number".into(),
            ));
        }
        if self
            .watermark
            .as_ref()
            .is_some_and(|wm| wm.mark.as_os_str().is_empty())
        {
            return Err(ConfigError::Validation(
                "watermark.mark must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Build [`Options`], loading the watermark mark from disk.
    ///
    /// A relative `watermark.mark` is joined onto `base_dir`.
    pub fn into_options(&self, base_dir: &Path) -> Result<Options, ConfigError> {
        let mut builder = Options::builder().format(self.format.extension.as_str());
        for option in self.format.encode_options() {
            builder = builder.encode_option(option);
        }

        if let Some(resize) = &self.resize {
            builder = builder.resize(ResizeOption::new(
                resize.width,
                resize.height,
                resize.percent,
            )?);
        }

        if let Some(wm) = &self.watermark {
            let mark_path = base_dir.join(&wm.mark);
            debug!(mark = %mark_path.display(), "loading watermark");
            let [x, y] = wm.offset;
            let watermark = WatermarkOption::open(&mark_path)?
                .with_opacity(wm.opacity)
                .with_offset(Offset::new(x, y))
                .with_random(wm.random)
                .with_fit(wm.fit);
            builder = builder.watermark(watermark);
        }

        Ok(builder.build()?)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer job files are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ConvertConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a job file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge `overlays` onto `base` in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<ConvertConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: ConvertConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a job file merged on top of stock defaults.
pub fn load_config(path: &Path) -> Result<ConvertConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    resolve_config(stock_defaults_value()?, [overlay])
}

/// Load a job file and build its [`Options`].
///
/// The watermark mark resolves relative to the job file's directory.
pub fn load_options(path: &Path) -> Result<Options, ConfigError> {
    let config = load_config(path)?;
    let base_dir = path.parent().unwrap_or(Path::new(""));
    config.into_options(base_dir)
}
