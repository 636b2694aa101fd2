//! Built-in backends, one per [`ExportFormat`].

use super::{ExportJob, ReportBackend};
use crate::error::Result;
use crate::layout::FlowEngine;
use crate::model::ExportFormat;
use crate::render::{to_markdown, DocxWriter, ExportStats, HtmlRenderer, ImageRenderer, PdfWriter};

/// Returns the report body unchanged.
#[derive(Debug, Clone, Default)]
pub struct MarkdownBackend;

impl ReportBackend for MarkdownBackend {
    fn format(&self) -> ExportFormat {
        ExportFormat::Markdown
    }

    fn render(&self, job: &ExportJob<'_>, _stats: &mut ExportStats) -> Result<Vec<u8>> {
        Ok(to_markdown(job.content))
    }
}

/// Sanitized HTML page.
#[derive(Debug, Clone, Default)]
pub struct HtmlBackend;

impl ReportBackend for HtmlBackend {
    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    fn render(&self, job: &ExportJob<'_>, _stats: &mut ExportStats) -> Result<Vec<u8>> {
        let sanitizer = job.capabilities.sanitizer.as_ref();
        let html = HtmlRenderer::new(sanitizer).render(job.content, job.title);
        Ok(html.into_bytes())
    }
}

/// Paginated PDF.
#[derive(Debug, Clone, Default)]
pub struct PdfBackend;

impl ReportBackend for PdfBackend {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn render(&self, job: &ExportJob<'_>, stats: &mut ExportStats) -> Result<Vec<u8>> {
        let caps = job.capabilities;
        let pages = FlowEngine::new(&job.options.print_style, caps.measure.as_ref())
            .with_page(job.options.page)
            .with_images(caps.images.as_ref())
            .layout(job.blocks);

        stats.page_count = pages.page_count() as u32;
        for degradation in &pages.degraded {
            stats.record(degradation.clone());
        }

        PdfWriter::new(job.title, job.created).write(&pages)
    }
}

/// Word-processor document.
#[derive(Debug, Clone, Default)]
pub struct WordBackend;

impl ReportBackend for WordBackend {
    fn format(&self) -> ExportFormat {
        ExportFormat::Word
    }

    fn render(&self, job: &ExportJob<'_>, stats: &mut ExportStats) -> Result<Vec<u8>> {
        DocxWriter::new(job.title, job.created)
            .with_page(job.options.page)
            .write(job.blocks, stats)
    }
}

/// PNG bitmap of the HTML rendering.
#[derive(Debug, Clone, Default)]
pub struct ImageBackend;

impl ReportBackend for ImageBackend {
    fn format(&self) -> ExportFormat {
        ExportFormat::Image
    }

    fn render(&self, job: &ExportJob<'_>, _stats: &mut ExportStats) -> Result<Vec<u8>> {
        let caps = job.capabilities;
        ImageRenderer::new(
            caps.sanitizer.as_ref(),
            caps.rasterizer.as_deref(),
            &job.options.image,
        )
        .render(job.content)
    }
}
