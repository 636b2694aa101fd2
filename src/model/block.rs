//! Block-level types.

use super::TableBlock;
use serde::{Deserialize, Serialize};

/// One classified unit of markdown content.
///
/// Blocks never nest: a list item cannot hold a table, a table cell cannot
/// hold a heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A heading, level 1 to 3
    Heading {
        /// Heading level (1-3)
        level: u8,
        /// Raw inline text
        text: String,
    },

    /// An ordered or unordered list item
    ListItem {
        /// Bullet or number
        marker: ListMarker,
        /// Raw inline text
        text: String,
    },

    /// A contiguous run of pipe-delimited lines
    Table(TableBlock),

    /// A standalone image reference (`![alt](url)`)
    Image {
        /// Alternative text
        alt_text: String,
        /// Image source
        url: String,
    },

    /// A line of ordinary text
    Paragraph {
        /// Raw inline text
        text: String,
    },

    /// A blank line
    Blank,
}

impl Block {
    /// Create a heading block.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level: level.clamp(1, 3),
            text: text.into(),
        }
    }

    /// Create a paragraph block.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph { text: text.into() }
    }

    /// Create a bulleted list item.
    pub fn bullet(text: impl Into<String>) -> Self {
        Block::ListItem {
            marker: ListMarker::Bullet,
            text: text.into(),
        }
    }

    /// Create a numbered list item.
    pub fn numbered(index: u32, text: impl Into<String>) -> Self {
        Block::ListItem {
            marker: ListMarker::Ordered(index),
            text: text.into(),
        }
    }

    /// Short kind name, used in logs and statistics.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Heading { .. } => "heading",
            Block::ListItem { .. } => "list_item",
            Block::Table(_) => "table",
            Block::Image { .. } => "image",
            Block::Paragraph { .. } => "paragraph",
            Block::Blank => "blank",
        }
    }

    /// Check if this is a blank line.
    pub fn is_blank(&self) -> bool {
        matches!(self, Block::Blank)
    }
}

/// List item marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "lowercase")]
pub enum ListMarker {
    /// Unordered item (`- ` or `* `)
    Bullet,
    /// Ordered item carrying the number written in the source
    Ordered(u32),
}

impl ListMarker {
    /// Check if the marker is numbered.
    pub fn is_ordered(&self) -> bool {
        matches!(self, ListMarker::Ordered(_))
    }

    /// Source index of an ordered item.
    pub fn index(&self) -> Option<u32> {
        match self {
            ListMarker::Bullet => None,
            ListMarker::Ordered(n) => Some(*n),
        }
    }
}
