//! HTML rendering.
//!
//! Markdown is rendered with `pulldown-cmark`, passed through an
//! [`HtmlSanitizer`], and wrapped in a print-friendly page template. Raw
//! HTML embedded in the markdown is rendered as-is and left to the
//! sanitizer, so safe inline tags like `<sub>` or `<kbd>` survive.

use pulldown_cmark::{html, Options, Parser};
use quick_xml::escape::escape;

use super::sanitize::HtmlSanitizer;

/// Page stylesheet of the HTML export.
pub const REPORT_CSS: &str = "    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; line-height: 1.6; }
    h1, h2, h3 { color: #333; }
    code { background: #f4f4f4; padding: 2px 6px; border-radius: 4px; }
    pre { background: #f4f4f4; padding: 16px; border-radius: 8px; overflow-x: auto; }
    blockquote { border-left: 4px solid #ddd; margin: 0; padding-left: 16px; color: #666; }
    table { border-collapse: collapse; width: 100%; }
    th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
    th { background: #f4f4f4; }";

/// Render markdown to an unsanitized HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Render and sanitize an HTML fragment.
pub fn render_fragment(markdown: &str, sanitizer: &dyn HtmlSanitizer) -> String {
    sanitizer.sanitize(&markdown_to_html(markdown))
}

/// Escape text for use in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    escape(text).into_owned()
}

/// HTML renderer producing a complete standalone document.
pub struct HtmlRenderer<'a> {
    sanitizer: &'a dyn HtmlSanitizer,
}

impl<'a> HtmlRenderer<'a> {
    /// Create a renderer using `sanitizer`.
    pub fn new(sanitizer: &'a dyn HtmlSanitizer) -> Self {
        Self { sanitizer }
    }

    /// Render `markdown` as a full HTML document titled `title`.
    pub fn render(&self, markdown: &str, title: &str) -> String {
        let body = render_fragment(markdown, self.sanitizer);
        wrap_document(&body, title)
    }
}

/// Wrap a sanitized body fragment in the report page template.
pub fn wrap_document(body: &str, title: &str) -> String {
    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
  <meta charset=\"UTF-8\">
  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
  <title>{title}</title>
  <style>
{css}
  </style>
</head>
<body>
{body}
</body>
</html>",
        title = escape_html(title),
        css = REPORT_CSS,
        body = body,
    )
}
