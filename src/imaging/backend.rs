//! Codec backend trait and its error type.
//!
//! The [`ImageBackend`] trait is the seam between the conversion pipeline and
//! the codecs: decode a file into pixels, encode pixels into a file. The
//! pipeline owns every decision (paths, overwrite policy, cleanup); the
//! backend only talks to codecs.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! and `tiff` crates.

use super::format::FormatOption;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// The output file could not be created. Nothing was written.
    #[error("Failed to create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Failed to encode TIFF {}: {source}", path.display())]
    TiffEncode {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodecError {
    /// Whether the output file may exist in a partially written state.
    ///
    /// False for decode-side failures and for a failed create, where the
    /// file at the path (if any) is not ours.
    pub fn may_leave_partial_output(&self) -> bool {
        matches!(
            self,
            CodecError::Encode { .. } | CodecError::TiffEncode { .. } | CodecError::Write { .. }
        )
    }
}

/// Trait for codec backends.
pub trait ImageBackend: Sync {
    /// Decode the image at `path`.
    fn decode(&self, path: &Path) -> Result<DynamicImage, CodecError>;

    /// Encode `image` into a new file at `path`.
    ///
    /// Must not overwrite: an existing file is reported as
    /// [`CodecError::Create`] with [`std::io::ErrorKind::AlreadyExists`].
    fn encode(
        &self,
        image: &DynamicImage,
        path: &Path,
        format: &FormatOption,
    ) -> Result<(), CodecError>;
}
