//! Format backends turning a report into artifact bytes.

mod docx;
mod html;
mod markdown;
mod options;
mod pdf;
mod raster;
mod result;
mod sanitize;

pub use docx::DocxWriter;
pub use html::{
    escape_html, markdown_to_html, render_fragment, wrap_document, HtmlRenderer, REPORT_CSS,
};
pub use markdown::to_markdown;
pub use options::{ExportOptions, ImageSettings, DEFAULT_STEM, DEFAULT_TITLE};
pub use pdf::{encode_win_ansi, PdfWriter, PRODUCER};
pub use raster::{
    container_document, encode_png, CommandRasterizer, ImageRenderer, OffscreenSurface, Rasterizer,
};
pub use result::{Degradation, DegradationKind, ExportStats};
pub use sanitize::{AllowlistSanitizer, HtmlSanitizer};

#[cfg(test)]
pub(crate) use raster::tests::RecordingRasterizer;
