//! # imgconv
//!
//! Convert one raster image into another file, optionally resizing it and
//! compositing a watermark on the way.
//!
//! ```no_run
//! use imgconv::{Options, ResizeOption};
//! use std::path::Path;
//!
//! let options = Options::builder()
//!     .resize(ResizeOption::dimensions(800, 0))
//!     .format("png")
//!     .build()?;
//! let written = options.convert(Path::new("in/photo.tif"), Path::new("out/photo"))?;
//! assert_eq!(written, Path::new("out/photo.png"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Pipeline
//!
//! ```text
//! source ─ decode ─ resize? ─ watermark? ─ encode ─ destination.<ext>
//! ```
//!
//! The destination's extension is always replaced by the output format's. An
//! existing output is never overwritten, and a failed encode never leaves a
//! truncated file behind.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`convert`] | [`Options`], its builder, and the pipeline itself |
//! | [`imaging`] | Pure-Rust image operations: resize, watermark, format resolution, codecs |
//! | [`config`] | TOML job files: defaults, merging, validation, conversion to [`Options`] |
//!
//! # Logging
//!
//! The crate emits `tracing` events (`debug` per pipeline step, `info` per
//! finished conversion) and never installs a subscriber.

pub mod config;
pub mod convert;
pub mod imaging;

pub use convert::{ConvertError, Options, OptionsBuilder};
pub use imaging::{
    EncodeOption, FormatError, FormatOption, Offset, OutputFormat, PngCompression, Quality,
    ResizeError, ResizeOption, TiffCompression, WatermarkOption,
};
