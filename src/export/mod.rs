//! Export coordination.
//!
//! The [`ExportCoordinator`] is the entry point of the crate: give it a
//! format, the report markdown and a title hint, and it returns an
//! [`Artifact`]. Backends are looked up in a [`BackendRegistry`], so a
//! caller can replace or add one without touching the coordinator.
//!
//! The default [`Capabilities`] read images only from `data:` URLs and local
//! files. Remote `http(s)://` images become `[Image: ...]` placeholders
//! unless an [`ImageSource`] that fetches them is supplied with
//! [`ExportCoordinator::with_image_source`].
//!
//! # Example
//!
//! ```no_run
//! use research_export::export::ExportCoordinator;
//! use research_export::ExportFormat;
//!
//! fn main() -> research_export::Result<()> {
//!     let coordinator = ExportCoordinator::new();
//!     let artifact = coordinator.export(ExportFormat::Pdf, "# Findings\n\nAll good.", "Q3")?;
//!     std::fs::write(&artifact.filename, &artifact.bytes)?;
//!     Ok(())
//! }
//! ```

mod backends;

pub use backends::{HtmlBackend, ImageBackend, MarkdownBackend, PdfBackend, WordBackend};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::assets::{ImageSource, LocalImageSource};
use crate::error::{Error, Result};
use crate::layout::{HelveticaMetrics, TextMeasure};
use crate::model::{Artifact, Block, ExportFormat};
use crate::parser::BlockClassifier;
use crate::render::{AllowlistSanitizer, ExportOptions, ExportStats, HtmlSanitizer, Rasterizer};

/// Environment services the backends draw on.
#[derive(Clone)]
pub struct Capabilities {
    /// Font metrics for print layout
    pub measure: Arc<dyn TextMeasure>,

    /// HTML sanitizer for the HTML and image formats
    pub sanitizer: Arc<dyn HtmlSanitizer>,

    /// Image fetcher for embedded images; the default
    /// [`LocalImageSource`] refuses network URLs
    pub images: Arc<dyn ImageSource>,

    /// Offscreen rasterizer; the image format is unavailable without one
    pub rasterizer: Option<Arc<dyn Rasterizer>>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            measure: Arc::new(HelveticaMetrics::new()),
            sanitizer: Arc::new(AllowlistSanitizer::new()),
            images: Arc::new(LocalImageSource::new()),
            rasterizer: None,
        }
    }
}

/// Everything a backend needs for one export.
pub struct ExportJob<'a> {
    /// The report markdown, as supplied
    pub content: &'a str,

    /// Classified blocks of `content`
    pub blocks: &'a [Block],

    /// Resolved document title
    pub title: &'a str,

    /// Creation time, also used in the filename
    pub created: NaiveDateTime,

    pub options: &'a ExportOptions,
    pub capabilities: &'a Capabilities,
}

/// A format backend.
///
/// Implement this trait to replace how one format is produced.
pub trait ReportBackend: Send + Sync {
    /// The format this backend produces.
    fn format(&self) -> ExportFormat;

    /// Name of this backend.
    fn name(&self) -> &str {
        self.format().name()
    }

    /// Produce the artifact bytes.
    ///
    /// Blocks that could not be rendered faithfully are recorded in
    /// `stats` instead of failing the export.
    fn render(&self, job: &ExportJob<'_>, stats: &mut ExportStats) -> Result<Vec<u8>>;
}

/// Maps each format to its backend.
#[derive(Clone)]
pub struct BackendRegistry {
    backends: HashMap<ExportFormat, Arc<dyn ReportBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Create a registry with all built-in backends.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MarkdownBackend));
        registry.register(Arc::new(HtmlBackend));
        registry.register(Arc::new(PdfBackend));
        registry.register(Arc::new(WordBackend));
        registry.register(Arc::new(ImageBackend));
        registry
    }

    /// Register a backend, replacing any previous one for its format.
    pub fn register(&mut self, backend: Arc<dyn ReportBackend>) {
        self.backends.insert(backend.format(), backend);
    }

    /// Get the backend for `format`.
    pub fn get(&self, format: ExportFormat) -> Option<Arc<dyn ReportBackend>> {
        self.backends.get(&format).cloned()
    }

    /// Check if `format` has a backend.
    pub fn supports(&self, format: ExportFormat) -> bool {
        self.backends.contains_key(&format)
    }

    /// Registered formats, in menu order.
    pub fn formats(&self) -> Vec<ExportFormat> {
        ExportFormat::ALL
            .into_iter()
            .filter(|f| self.supports(*f))
            .collect()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Selects a backend and turns its output into an [`Artifact`].
///
/// The coordinator holds no per-export state: calls are independent and
/// may run concurrently from several threads.
///
/// A default coordinator has no network access. Remote images degrade to
/// placeholders unless a fetching [`ImageSource`] is installed.
#[derive(Clone, Default)]
pub struct ExportCoordinator {
    registry: BackendRegistry,
    capabilities: Capabilities,
    options: ExportOptions,
    classifier: BlockClassifier,
}

impl ExportCoordinator {
    /// Create a coordinator with default backends and capabilities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set export options.
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the backend registry.
    pub fn with_registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the font metrics used for print layout.
    pub fn with_text_measure(mut self, measure: Arc<dyn TextMeasure>) -> Self {
        self.capabilities.measure = measure;
        self
    }

    /// Set the HTML sanitizer.
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn HtmlSanitizer>) -> Self {
        self.capabilities.sanitizer = sanitizer;
        self
    }

    /// Set the image fetcher.
    pub fn with_image_source(mut self, images: Arc<dyn ImageSource>) -> Self {
        self.capabilities.images = images;
        self
    }

    /// Set the offscreen rasterizer, enabling the image format.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.capabilities.rasterizer = Some(rasterizer);
        self
    }

    /// Export options in use.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Capabilities in use.
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Check whether `format` can currently be produced.
    pub fn is_available(&self, format: ExportFormat) -> bool {
        match format {
            ExportFormat::Image => {
                self.registry.supports(format) && self.capabilities.rasterizer.is_some()
            }
            _ => self.registry.supports(format),
        }
    }

    /// Classify `content` into blocks.
    pub fn classify(&self, content: &str) -> Vec<Block> {
        self.classifier.classify(content)
    }

    /// Export `content` as `format`.
    ///
    /// `content` must not be blank; [`Error::MissingContent`] is returned
    /// otherwise. A blank `title_hint` falls back to the default title.
    pub fn export(&self, format: ExportFormat, content: &str, title_hint: &str) -> Result<Artifact> {
        if content.trim().is_empty() {
            return Err(Error::MissingContent);
        }

        let backend = self
            .registry
            .get(format)
            .ok_or_else(|| Error::UnsupportedFormat(format.name().to_string()))?;

        let blocks = self.classify(content);
        let mut stats = ExportStats::from_blocks(&blocks);
        let created = self.options.resolve_timestamp();
        let job = ExportJob {
            content,
            blocks: &blocks,
            title: self.options.resolve_title(title_hint),
            created,
            options: &self.options,
            capabilities: &self.capabilities,
        };

        let bytes = backend
            .render(&job, &mut stats)
            .map_err(|e| export_failure(format, e))?;

        if stats.is_degraded() {
            log::warn!(
                "{} export degraded: {} of {} blocks skipped or replaced",
                format,
                stats.degraded.len(),
                stats.block_count
            );
        }

        let filename = format.filename(&self.options.file_stem, &created);
        log::info!(
            "Exported {} ({} bytes, {} pages)",
            filename,
            bytes.len(),
            stats.page_count
        );

        Ok(Artifact::new(format, bytes, filename).with_stats(stats))
    }

    /// Export a report that may not exist yet.
    ///
    /// Absent or blank content is a no-op returning `Ok(None)`.
    pub fn export_report(
        &self,
        format: ExportFormat,
        content: Option<&str>,
        title_hint: &str,
    ) -> Result<Option<Artifact>> {
        match content {
            Some(content) if !content.trim().is_empty() => {
                self.export(format, content, title_hint).map(Some)
            }
            _ => {
                log::debug!("No report content, skipping {} export", format);
                Ok(None)
            }
        }
    }

    /// Export every available format. Formats that are not available are
    /// left out.
    pub fn export_all(&self, content: &str, title_hint: &str) -> Vec<(ExportFormat, Result<Artifact>)> {
        self.registry
            .formats()
            .into_iter()
            .filter(|f| self.is_available(*f))
            .map(|f| (f, self.export(f, content, title_hint)))
            .collect()
    }

    /// Export on the blocking thread pool.
    #[cfg(feature = "async")]
    pub async fn export_async(
        &self,
        format: ExportFormat,
        content: String,
        title_hint: String,
    ) -> Result<Artifact> {
        let coordinator = self.clone();
        tokio::task::spawn_blocking(move || coordinator.export(format, &content, &title_hint))
            .await
            .map_err(|e| Error::Other(format!("export task failed: {}", e)))?
    }
}

/// Collapse backend failures into a fatal export error.
///
/// Missing capabilities are kept as they are so callers can tell "not
/// configured" apart from "broke".
fn export_failure(format: ExportFormat, err: Error) -> Error {
    match err {
        Error::MissingCapability(_) | Error::Export(_) => err,
        other => Error::Export(format!("{} export failed: {}", format, other)),
    }
}
