use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the make-thumbs library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding error
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// The payload was recognised but the decoder could not read it
    #[error("Could not decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The decoder does not support this image format
    #[error("Unsupported image format in {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    /// The external frame extractor failed for a video
    #[error("Frame extraction failed for {path}: {reason}")]
    FrameExtraction { path: PathBuf, reason: String },

    /// A path that must be a directory is something else
    #[error("{0} exists but is not a directory")]
    NotADirectory(PathBuf),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Attach the offending source path to an `image` crate error.
    ///
    /// Errors the decoder raises because it does not understand the format are kept
    /// apart from payloads it understood but could not read.
    pub fn from_image(path: &Path, err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            image::ImageError::Unsupported(e) => Error::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
            other => Error::Decode {
                path: path.to_path_buf(),
                source: other,
            },
        }
    }
}
