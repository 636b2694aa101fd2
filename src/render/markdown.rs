//! Markdown export.
//!
//! The markdown artifact is the report body exactly as supplied: no
//! normalisation of line endings, whitespace or emphasis markers.

/// Produce the markdown artifact bytes.
pub fn to_markdown(content: &str) -> Vec<u8> {
    content.as_bytes().to_vec()
}
