//! # research-export
//!
//! Export engine for markdown research reports.
//!
//! One markdown document goes in; a finished file comes out as bytes, a
//! timestamped filename and a MIME type. Supported formats are the raw
//! markdown, a sanitized HTML page, a paginated PDF, a Word document and a
//! rasterized PNG.
//!
//! ## Quick Start
//!
//! ```no_run
//! use research_export::{export, ExportFormat};
//!
//! fn main() -> research_export::Result<()> {
//!     let report = "# Findings\n\nRevenue grew **12%**.";
//!     let artifact = export(ExportFormat::Pdf, report, "Quarterly review")?;
//!     std::fs::write(&artifact.filename, &artifact.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Block classification**: the document is split into headings, list
//!   items, tables, images, paragraphs and blank lines in one pass
//! - **Inline parsing**: bold, italic, code and links become styled runs
//! - **Print layout**: word wrapping, table layout and eager pagination
//!   into a per-page display list
//! - **Backends**: PDF, Word, HTML, PNG and markdown writers
//!
//! A block that cannot be rendered faithfully (an unreachable image, an
//! empty table) never fails the export. It is replaced or skipped and
//! recorded in the artifact's [`ExportStats`](render::ExportStats).

pub mod assets;
pub mod error;
pub mod export;
pub mod layout;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use assets::{ImageSource, LocalImageSource};
pub use error::{Error, Result};
pub use export::{BackendRegistry, Capabilities, ExportCoordinator, ReportBackend};
pub use layout::{FixedWidthMetrics, HelveticaMetrics, PageSettings, PrintStyle, TextMeasure};
pub use model::{Artifact, Block, ExportFormat, ListMarker, Row, StyledRun, TableBlock};
pub use parser::{classify, parse_inline};
pub use render::{
    AllowlistSanitizer, CommandRasterizer, ExportOptions, ExportStats, HtmlSanitizer,
    ImageSettings, Rasterizer,
};

use std::fs;
use std::path::Path;

/// Export a report with default settings.
///
/// Images are read from `data:` URLs and local paths only. Remote images
/// become placeholders; build an [`ExportCoordinator`] with
/// [`ExportCoordinator::with_image_source`] to fetch them.
///
/// # Arguments
///
/// * `format` - Target format
/// * `content` - The report markdown; must not be blank
/// * `title` - Document title; the default title is used when blank
///
/// # Example
///
/// ```no_run
/// use research_export::{export, ExportFormat};
///
/// let artifact = export(ExportFormat::Word, "# Title", "").unwrap();
/// assert!(artifact.filename.ends_with(".docx"));
/// ```
pub fn export(format: ExportFormat, content: &str, title: &str) -> Result<Artifact> {
    ExportCoordinator::new().export(format, content, title)
}

/// Export a markdown file, resolving relative image paths against the
/// file's directory.
///
/// # Example
///
/// ```no_run
/// use research_export::{export_file, ExportFormat};
///
/// let artifact = export_file("report.md", ExportFormat::Pdf, "Report").unwrap();
/// std::fs::write(&artifact.filename, &artifact.bytes).unwrap();
/// ```
pub fn export_file<P: AsRef<Path>>(path: P, format: ExportFormat, title: &str) -> Result<Artifact> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let mut images = LocalImageSource::new();
    if let Some(dir) = path.parent() {
        images = images.with_base_dir(dir);
    }

    ExportCoordinator::new()
        .with_image_source(std::sync::Arc::new(images))
        .export(format, &content, title)
}

/// Render a report as a standalone, sanitized HTML document.
///
/// # Example
///
/// ```
/// let html = research_export::to_html("# Hi", "Greeting");
/// assert!(html.contains("<h1>Hi</h1>"));
/// ```
pub fn to_html(content: &str, title: &str) -> String {
    let sanitizer = AllowlistSanitizer::new();
    let options = ExportOptions::default();
    render::HtmlRenderer::new(&sanitizer).render(content, options.resolve_title(title))
}

/// Render a report as PDF bytes.
pub fn to_pdf(content: &str, title: &str) -> Result<Vec<u8>> {
    export(ExportFormat::Pdf, content, title).map(|a| a.bytes)
}

/// Render a report as DOCX bytes.
pub fn to_docx(content: &str, title: &str) -> Result<Vec<u8>> {
    export(ExportFormat::Word, content, title).map(|a| a.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_markdown_identity() {
        let doc = "# A\r\n\n  *b*  ";
        let artifact = export(ExportFormat::Markdown, doc, "").unwrap();
        assert_eq!(artifact.bytes, doc.as_bytes());
        assert!(artifact.filename.starts_with("research-report-"));
        assert!(artifact.filename.ends_with(".md"));
    }

    #[test]
    fn test_export_blank_fails() {
        assert!(matches!(
            export(ExportFormat::Pdf, "", "t"),
            Err(Error::MissingContent)
        ));
    }

    #[test]
    fn test_to_html_default_title() {
        let html = to_html("text", "  ");
        assert!(html.contains("<title>Research Report</title>"));
    }

    #[test]
    fn test_to_pdf_and_docx() {
        assert!(to_pdf("# T", "t").unwrap().starts_with(b"%PDF-"));
        assert!(to_docx("# T", "t").unwrap().starts_with(b"PK"));
    }

    #[test]
    fn test_export_file_resolves_images() {
        let dir = tempfile::tempdir().unwrap();
        let png = crate::assets::tests::png_bytes(4, 4, [200, 0, 0, 255]);
        fs::write(dir.path().join("chart.png"), png).unwrap();
        let report = dir.path().join("report.md");
        fs::write(&report, "# R\n\n![Chart](chart.png)").unwrap();

        let artifact = export_file(&report, ExportFormat::Pdf, "R").unwrap();
        assert!(!artifact.is_degraded());
        assert_eq!(artifact.stats.image_count, 1);
    }

    #[test]
    fn test_export_file_missing() {
        assert!(matches!(
            export_file("/no/such/report.md", ExportFormat::Html, ""),
            Err(Error::Io(_))
        ));
    }
}
