//! Watermark compositing.
//!
//! A [`WatermarkOption`] holds the mark image plus how to place it. Applying
//! it never mutates the base or the mark; the result is a fresh RGBA image.
//!
//! ## Placement
//!
//! - [`Placement::Fixed`]: the configured offset, clipped so the mark's box
//!   stays inside the base (top-left pinned when the mark is larger).
//! - [`Placement::Random`]: uniform in `[0, base - mark]` per axis, drawn from
//!   a process-wide PRNG seeded once from the OS.
//!
//! ## Blending
//!
//! For every mark pixel over the base:
//!
//! ```text
//! ea  = mark.a * opacity / 255
//! c   = (mark.c * ea + base.c * (255 - ea)) / 255
//! a   = ea + base.a * (255 - ea) / 255
//! ```
//!
//! all in rounded integer arithmetic. A fully transparent mark pixel leaves
//! the base untouched; an opaque one at opacity 255 reproduces the mark.

use super::backend::{CodecError, ImageBackend};
use super::calculations::{calculate_fit_dimensions, clamp_offset, max_offset};
use super::resize::RESIZE_FILTER;
use super::rust_backend::RustBackend;
use image::{DynamicImage, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::borrow::Cow;
use std::path::Path;
use std::sync::{Arc, LazyLock, Mutex};

/// Opacity used when the caller leaves it at 0.
pub const DEFAULT_OPACITY: u8 = 128;

static PLACEMENT_RNG: LazyLock<Mutex<StdRng>> =
    LazyLock::new(|| Mutex::new(StdRng::from_os_rng()));

/// Top-left position of the mark on the base, in base pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    pub x: i64,
    pub y: i64,
}

impl Offset {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Where the mark goes. Exactly one mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Fixed(Offset),
    Random,
}

impl Default for Placement {
    fn default() -> Self {
        Placement::Fixed(Offset::default())
    }
}

/// Watermark configuration.
///
/// The mark is held behind an [`Arc`], so clones are cheap and one loaded
/// mark can serve conversions on several threads.
#[derive(Debug, Clone)]
pub struct WatermarkOption {
    mark: Arc<RgbaImage>,
    opacity: u8,
    placement: Placement,
    fit: bool,
}

impl WatermarkOption {
    /// Watermark with `mark`, default opacity, fixed at the origin.
    pub fn new(mark: &DynamicImage) -> Self {
        Self::from_rgba(mark.to_rgba8())
    }

    pub fn from_rgba(mark: RgbaImage) -> Self {
        Self {
            mark: Arc::new(mark),
            opacity: DEFAULT_OPACITY,
            placement: Placement::default(),
            fit: false,
        }
    }

    /// Load the mark from disk.
    pub fn open(path: &Path) -> Result<Self, CodecError> {
        Self::open_with(&RustBackend::new(), path)
    }

    pub fn open_with(backend: &impl ImageBackend, path: &Path) -> Result<Self, CodecError> {
        let mark = backend.decode(path)?;
        Ok(Self::new(&mark))
    }

    /// Set the opacity. `0` means "unset" and selects [`DEFAULT_OPACITY`].
    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = if opacity == 0 {
            DEFAULT_OPACITY
        } else {
            opacity
        };
        self
    }

    /// Place the mark at a fixed offset (turns random placement off).
    pub fn with_offset(mut self, offset: Offset) -> Self {
        self.placement = Placement::Fixed(offset);
        self
    }

    /// Switch random placement on or off.
    ///
    /// Turning it off places the mark at the origin unless an offset is set
    /// afterwards.
    pub fn with_random(mut self, random: bool) -> Self {
        self.placement = match (random, self.placement) {
            (true, _) => Placement::Random,
            (false, Placement::Random) => Placement::default(),
            (false, fixed) => fixed,
        };
        self
    }

    /// Scale the mark relative to the base before compositing.
    ///
    /// See [`calculate_fit_dimensions`].
    pub fn with_fit(mut self, fit: bool) -> Self {
        self.fit = fit;
        self
    }

    pub fn mark(&self) -> &RgbaImage {
        &self.mark
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn fit(&self) -> bool {
        self.fit
    }

    /// Composite the mark onto a copy of `base`.
    pub fn apply(&self, base: &DynamicImage) -> DynamicImage {
        let base = base.to_rgba8();
        let (base_w, base_h) = base.dimensions();

        let mark: Cow<'_, RgbaImage> = if self.fit {
            let (w, h) = calculate_fit_dimensions((base_w, base_h), self.mark.dimensions());
            Cow::Owned(image::imageops::resize(&*self.mark, w, h, RESIZE_FILTER))
        } else {
            Cow::Borrowed(&*self.mark)
        };
        let (mark_w, mark_h) = mark.dimensions();

        let (x, y) = match self.placement {
            Placement::Fixed(offset) => (
                clamp_offset(offset.x, base_w, mark_w),
                clamp_offset(offset.y, base_h, mark_h),
            ),
            Placement::Random => random_offset(
                max_offset(base_w, mark_w),
                max_offset(base_h, mark_h),
            ),
        };
        tracing::debug!(
            x,
            y,
            mark_w,
            mark_h,
            opacity = self.opacity,
            "compositing watermark"
        );

        DynamicImage::ImageRgba8(composite(&base, &mark, x, y, self.opacity))
    }
}

/// Draw a uniform offset in `[0, max_x] x [0, max_y]`.
fn random_offset(max_x: u32, max_y: u32) -> (u32, u32) {
    let mut rng = PLACEMENT_RNG
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    (rng.random_range(0..=max_x), rng.random_range(0..=max_y))
}

/// Blend `mark` over a copy of `base` with its top-left corner at `(x, y)`.
///
/// Mark pixels falling outside the base are skipped.
fn composite(base: &RgbaImage, mark: &RgbaImage, x: u32, y: u32, opacity: u8) -> RgbaImage {
    let mut out = base.clone();
    let (base_w, base_h) = base.dimensions();

    for (mx, my, pixel) in mark.enumerate_pixels() {
        let (bx, by) = (x as u64 + mx as u64, y as u64 + my as u64);
        if bx >= base_w as u64 || by >= base_h as u64 {
            continue;
        }
        let target = out.get_pixel_mut(bx as u32, by as u32);
        *target = blend_over(*target, *pixel, opacity);
    }

    out
}

/// Mark alpha scaled by the configured opacity.
#[inline]
pub(crate) fn effective_alpha(mark_alpha: u8, opacity: u8) -> u8 {
    ((mark_alpha as u32 * opacity as u32 + 127) / 255) as u8
}

/// "Over" compositing of one mark pixel onto one base pixel.
#[inline]
pub(crate) fn blend_over(base: Rgba<u8>, mark: Rgba<u8>, opacity: u8) -> Rgba<u8> {
    let alpha = effective_alpha(mark[3], opacity) as u32;
    if alpha == 0 {
        return base;
    }
    let inv = 255 - alpha;
    let mix = |m: u8, b: u8| ((m as u32 * alpha + b as u32 * inv + 127) / 255) as u8;
    Rgba([
        mix(mark[0], base[0]),
        mix(mark[1], base[1]),
        mix(mark[2], base[2]),
        (alpha + (base[3] as u32 * inv + 127) / 255) as u8,
    ])
}
