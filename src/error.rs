//! Error types for research-export library.

use std::io;
use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while exporting a report.
///
/// Only failures that prevent an artifact from being produced surface
/// here. A block that cannot be drawn (an unreachable image, an empty
/// table) is recorded as a [`Degradation`](crate::render::Degradation)
/// instead, and the export carries on.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Packing or encoding the final artifact failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Error assembling the PDF object graph.
    #[error("PDF assembly error: {0}")]
    Pdf(String),

    /// Error writing the Word package archive.
    #[error("Archive error: {0}")]
    Archive(String),

    /// An image could not be fetched.
    #[error("Image fetch error: {0}")]
    ImageFetch(String),

    /// Image bytes could not be decoded or encoded.
    #[error("Image decoding error: {0}")]
    ImageDecode(String),

    /// The offscreen rasterizer failed.
    #[error("Rasterization error: {0}")]
    Rasterize(String),

    /// A collaborator required by the requested format is not configured.
    #[error("Missing capability: {0}")]
    MissingCapability(&'static str),

    /// No report content was supplied.
    #[error("No report content to export")]
    MissingContent,

    /// The requested export format is not known.
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::Pdf(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::Archive(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageDecode(err.to_string())
    }
}
