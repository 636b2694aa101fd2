//! Export artifacts and formats.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::render::ExportStats;

/// Timestamp layout used in artifact filenames.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Target format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// The markdown body, unchanged
    Markdown,
    /// Sanitized, styled HTML document
    Html,
    /// Paginated print document
    Pdf,
    /// Word-processor document (DOCX)
    Word,
    /// Rasterized PNG image
    Image,
}

impl ExportFormat {
    /// All formats, in menu order.
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Markdown,
        ExportFormat::Html,
        ExportFormat::Pdf,
        ExportFormat::Word,
        ExportFormat::Image,
    ];

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Word => "docx",
            ExportFormat::Image => "png",
        }
    }

    /// MIME type of the produced bytes.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown",
            ExportFormat::Html => "text/html",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Word => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Image => "image/png",
        }
    }

    /// Lowercase format name.
    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "markdown",
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Word => "word",
            ExportFormat::Image => "image",
        }
    }

    /// Build the artifact filename, e.g. `research-report-2024-01-05_09-03-07.pdf`.
    pub fn filename(&self, stem: &str, timestamp: &NaiveDateTime) -> String {
        format!(
            "{}-{}.{}",
            stem,
            timestamp.format(TIMESTAMP_FORMAT),
            self.extension()
        )
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "html" | "htm" => Ok(ExportFormat::Html),
            "pdf" => Ok(ExportFormat::Pdf),
            "word" | "docx" => Ok(ExportFormat::Word),
            "image" | "png" => Ok(ExportFormat::Image),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A finished export: bytes, filename and MIME type.
///
/// Ownership passes to the caller, which decides how to persist or deliver it.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// File content
    pub bytes: Vec<u8>,

    /// Suggested filename
    pub filename: String,

    /// MIME type of `bytes`
    pub mime_type: &'static str,

    /// Format that produced this artifact
    pub format: ExportFormat,

    /// What happened during the export
    pub stats: ExportStats,
}

impl Artifact {
    /// Create a new artifact.
    pub fn new(format: ExportFormat, bytes: Vec<u8>, filename: String) -> Self {
        Self {
            bytes,
            filename,
            mime_type: format.mime_type(),
            format,
            stats: ExportStats::default(),
        }
    }

    /// Attach export statistics.
    pub fn with_stats(mut self, stats: ExportStats) -> Self {
        self.stats = stats;
        self
    }

    /// Get content length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the artifact has no content.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Check if any block was replaced by a placeholder or skipped.
    pub fn is_degraded(&self) -> bool {
        !self.stats.degraded.is_empty()
    }
}
