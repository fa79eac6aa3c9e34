//! Resize step of the conversion pipeline.
//!
//! The size policy lives in
//! [`calculate_resize_dimensions`](super::calculations::calculate_resize_dimensions);
//! this module only validates the configuration and runs the resampler.
//! Resampling always uses [`FilterType::Lanczos3`] so results are reproducible.

use super::calculations::calculate_resize_dimensions;
use image::DynamicImage;
use image::imageops::FilterType;
use thiserror::Error;

/// Resampling kernel used for every resize.
pub const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Largest width or height a resize may produce.
pub const MAX_DIMENSION: u32 = 32768;

/// Largest pixel count (width * height) a resize may produce.
/// 100 megapixels is 400MB of RGBA.
pub const MAX_PIXELS: u64 = 100_000_000;

#[derive(Error, Debug, PartialEq)]
pub enum ResizeError {
    #[error("Resize percent must be a finite, non-negative number, got {0}")]
    InvalidPercent(f64),
    #[error(
        "Resize target {width}x{height} exceeds the limit of {max_edge} per edge and {max_pixels} pixels",
        max_edge = MAX_DIMENSION,
        max_pixels = MAX_PIXELS
    )]
    TooLarge { width: u32, height: u32 },
}

/// Reject a target size beyond [`MAX_DIMENSION`] or [`MAX_PIXELS`].
pub fn check_dimensions(width: u32, height: u32) -> Result<(), ResizeError> {
    if width > MAX_DIMENSION
        || height > MAX_DIMENSION
        || width as u64 * height as u64 > MAX_PIXELS
    {
        return Err(ResizeError::TooLarge { width, height });
    }
    Ok(())
}

/// Target size for the resize step.
///
/// Zero means "unspecified". See
/// [`calculate_resize_dimensions`](super::calculations::calculate_resize_dimensions)
/// for how width, height and percent combine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResizeOption {
    width: u32,
    height: u32,
    percent: f64,
}

impl ResizeOption {
    pub fn new(width: u32, height: u32, percent: f64) -> Result<Self, ResizeError> {
        if !percent.is_finite() || percent < 0.0 {
            return Err(ResizeError::InvalidPercent(percent));
        }
        Ok(Self {
            width,
            height,
            percent,
        })
    }

    /// Resize to a width and/or height (zero derives from the aspect ratio).
    pub fn dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            percent: 0.0,
        }
    }

    /// Scale both edges by `percent / 100`.
    pub fn percent(percent: f64) -> Result<Self, ResizeError> {
        Self::new(0, 0, percent)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale_percent(&self) -> f64 {
        self.percent
    }

    /// Whether any size indicator is set.
    pub fn is_noop(&self) -> bool {
        self.width == 0 && self.height == 0 && self.percent == 0.0
    }

    /// Return a resized copy of `image`.
    ///
    /// Returns an unchanged clone when nothing is set or the target equals
    /// the current size. A target beyond [`check_dimensions`] is an error
    /// and nothing is allocated.
    pub fn apply(&self, image: &DynamicImage) -> Result<DynamicImage, ResizeError> {
        let source = (image.width(), image.height());
        match calculate_resize_dimensions(source, self.width, self.height, self.percent) {
            Some(target) if target != source => {
                check_dimensions(target.0, target.1)?;
                tracing::debug!(
                    from = ?source,
                    to = ?target,
                    "resizing image"
                );
                Ok(image.resize_exact(target.0, target.1, RESIZE_FILTER))
            }
            _ => Ok(image.clone()),
        }
    }
}
