//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader`, `TiffDecoder` for `.tif`/`.tiff` |
//! | **Resize** | `DynamicImage::resize_exact` with Lanczos3 |
//! | **Watermark** | custom integer "over" blend, `rand` for placement |
//! | **Encode** | `image` encoders, `tiff` crate for compressed TIFF |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and offset math (unit testable)
//! - **Parameters**: Encode option types
//! - **Format**: Output format resolution and option validation
//! - **Resize / Watermark**: The two pixel transforms
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
pub mod format;
mod params;
pub mod resize;
pub mod rust_backend;
pub mod watermark;

pub use backend::{CodecError, ImageBackend};
pub use calculations::{
    calc_resize_xy, calculate_fit_dimensions, calculate_resize_dimensions, clamp_offset,
    max_offset,
};
pub use format::{FormatError, FormatOption, OutputFormat};
pub use params::{EncodeOption, PngCompression, Quality, TiffCompression};
pub use resize::{MAX_DIMENSION, MAX_PIXELS, ResizeError, ResizeOption, check_dimensions};
pub use rust_backend::RustBackend;
pub use watermark::{DEFAULT_OPACITY, Offset, Placement, WatermarkOption};
