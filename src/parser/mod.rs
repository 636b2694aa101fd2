//! Markdown parsing: block classification and inline spans.

mod blocks;
mod inline;

pub use blocks::{classify, BlockClassifier};
pub use inline::{parse_inline, strip_inline, InlineParser};
