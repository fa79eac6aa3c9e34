//! The conversion pipeline.
//!
//! An [`Options`] value is assembled once through [`OptionsBuilder`] and is
//! read-only afterwards; [`Options::convert`] then runs:
//!
//! ```text
//! resolve output path → refuse if it exists → decode → resize? → watermark?
//!   → mkdir -p parent → encode (create-new) → on failure remove partial output
//! ```
//!
//! Every step runs on the calling thread. Distinct `Options` values (or one
//! shared by reference) may convert on several threads at once as long as
//! the destination paths differ.

use crate::imaging::{
    CodecError, EncodeOption, FormatError, FormatOption, ImageBackend, OutputFormat,
    ResizeError, ResizeOption, RustBackend, WatermarkOption,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ConvertError {
    /// The output path is taken. Nothing was read or written.
    #[error("Output already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The source could not be read. No output was created.
    #[error("Failed to read source image: {0}")]
    Decode(#[source] CodecError),
    /// The resize target is out of bounds. No output was created.
    #[error("Failed to resize: {0}")]
    Resize(#[source] ResizeError),
    /// Encoding failed. Any partial output has been removed.
    #[error("Failed to write output image: {0}")]
    Encode(#[source] CodecError),
}

/// Configuration of one conversion.
#[derive(Debug, Clone, Default)]
pub struct Options {
    watermark: Option<WatermarkOption>,
    resize: Option<ResizeOption>,
    format: FormatOption,
}

/// Builder for [`Options`].
///
/// Encode options are collected as given and validated against the target
/// format once, in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    watermark: Option<WatermarkOption>,
    resize: Option<ResizeOption>,
    format: Option<String>,
    encode_options: Vec<EncodeOption>,
}

impl OptionsBuilder {
    pub fn watermark(mut self, watermark: WatermarkOption) -> Self {
        self.watermark = Some(watermark);
        self
    }

    pub fn resize(mut self, resize: ResizeOption) -> Self {
        self.resize = Some(resize);
        self
    }

    /// Target format by extension or name (`"png"`, `".TIF"`, ...).
    pub fn format(mut self, extension: impl Into<String>) -> Self {
        self.format = Some(extension.into());
        self
    }

    pub fn encode_option(mut self, option: EncodeOption) -> Self {
        self.encode_options.push(option);
        self
    }

    /// Resolve the format and validate the collected encode options.
    ///
    /// Without an explicit format the output is JPEG; collected options are
    /// then validated against JPEG.
    pub fn build(self) -> Result<Options, FormatError> {
        let format = match self.format {
            Some(ext) => FormatOption::from_extension(&ext, &self.encode_options)?,
            None => FormatOption::new(OutputFormat::Jpeg, &self.encode_options)?,
        };
        Ok(Options {
            watermark: self.watermark,
            resize: self.resize,
            format,
        })
    }
}

impl Options {
    /// Default options: no resize, no watermark, JPEG at quality 75.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    pub fn watermark(&self) -> Option<&WatermarkOption> {
        self.watermark.as_ref()
    }

    pub fn resize(&self) -> Option<&ResizeOption> {
        self.resize.as_ref()
    }

    pub fn format(&self) -> &FormatOption {
        &self.format
    }

    /// Where [`convert`](Self::convert) will write for `destination`.
    pub fn output_path(&self, destination: &Path) -> PathBuf {
        self.format.path(destination)
    }

    /// Convert `source` into `destination` (extension adjusted to the
    /// format). Returns the path written.
    pub fn convert(&self, source: &Path, destination: &Path) -> Result<PathBuf, ConvertError> {
        self.convert_with(&RustBackend::new(), source, destination)
    }

    /// [`convert`](Self::convert) with an explicit codec backend.
    pub fn convert_with(
        &self,
        backend: &impl ImageBackend,
        source: &Path,
        destination: &Path,
    ) -> Result<PathBuf, ConvertError> {
        let output = self.output_path(destination);
        match fs::symlink_metadata(&output) {
            Ok(_) => return Err(ConvertError::AlreadyExists(output)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ConvertError::Io {
                    path: output,
                    source,
                });
            }
        }

        debug!(source = %source.display(), output = %output.display(), "decoding source");
        let mut image = backend.decode(source).map_err(ConvertError::Decode)?;

        if let Some(resize) = &self.resize {
            image = resize.apply(&image).map_err(ConvertError::Resize)?;
        }
        if let Some(watermark) = &self.watermark {
            image = watermark.apply(&image);
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConvertError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        debug!(format = %self.format.format(), output = %output.display(), "encoding");
        if let Err(err) = backend.encode(&image, &output, &self.format) {
            return Err(self.encode_failed(err, output));
        }

        info!(
            source = %source.display(),
            output = %output.display(),
            width = image.width(),
            height = image.height(),
            "converted"
        );
        Ok(output)
    }

    /// Clean up after a failed encode and classify the error.
    fn encode_failed(&self, err: CodecError, output: PathBuf) -> ConvertError {
        if let CodecError::Create { source, .. } = &err {
            // Someone else created the file after our existence check.
            if source.kind() == io::ErrorKind::AlreadyExists {
                return ConvertError::AlreadyExists(output);
            }
        }
        if err.may_leave_partial_output() {
            if let Err(e) = fs::remove_file(&output) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(output = %output.display(), error = %e, "failed to remove partial output");
                }
            }
        }
        ConvertError::Encode(err)
    }
}
