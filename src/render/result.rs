//! Export statistics and degradation records.

use serde::{Deserialize, Serialize};

use crate::model::Block;

/// Why a block was not rendered at full fidelity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DegradationKind {
    /// The image could not be fetched or decoded; a placeholder was drawn
    ImagePlaceholder {
        /// What went wrong
        reason: String,
    },
    /// An image reference with an empty URL was skipped
    EmptyImageUrl,
    /// A table with no rows was skipped
    EmptyTable,
    /// A table taller than one page was placed without splitting
    OversizedTable,
}

/// A block that degraded during export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    /// Position of the block in the classified stream
    pub block_index: usize,

    /// What happened
    #[serde(flatten)]
    pub kind: DegradationKind,
}

impl Degradation {
    /// Create a degradation record.
    pub fn new(block_index: usize, kind: DegradationKind) -> Self {
        Self { block_index, kind }
    }
}

/// Statistics collected during an export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportStats {
    /// Total number of classified blocks
    pub block_count: u32,

    /// Number of headings
    pub heading_count: u32,

    /// Number of paragraphs
    pub paragraph_count: u32,

    /// Number of list items
    pub list_item_count: u32,

    /// Number of tables
    pub table_count: u32,

    /// Number of image references
    pub image_count: u32,

    /// Number of pages (paginated formats only)
    pub page_count: u32,

    /// Blocks that were replaced by a placeholder or skipped
    pub degraded: Vec<Degradation>,
}

impl ExportStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count blocks by kind.
    pub fn from_blocks(blocks: &[Block]) -> Self {
        let mut stats = Self {
            block_count: blocks.len() as u32,
            ..Self::default()
        };

        for block in blocks {
            match block {
                Block::Heading { .. } => stats.heading_count += 1,
                Block::Paragraph { .. } => stats.paragraph_count += 1,
                Block::ListItem { .. } => stats.list_item_count += 1,
                Block::Table(_) => stats.table_count += 1,
                Block::Image { .. } => stats.image_count += 1,
                Block::Blank => {}
            }
        }

        stats
    }

    /// Record a degraded block.
    pub fn record(&mut self, degradation: Degradation) {
        self.degraded.push(degradation);
    }

    /// Check if any block degraded.
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableBlock;

    #[test]
    fn test_from_blocks() {
        let blocks = vec![
            Block::heading(1, "T"),
            Block::paragraph("p"),
            Block::bullet("a"),
            Block::numbered(1, "b"),
            Block::Blank,
            Block::Table(TableBlock::new()),
            Block::Image {
                alt_text: String::new(),
                url: "x.png".into(),
            },
        ];
        let stats = ExportStats::from_blocks(&blocks);
        assert_eq!(stats.block_count, 7);
        assert_eq!(stats.heading_count, 1);
        assert_eq!(stats.list_item_count, 2);
        assert_eq!(stats.table_count, 1);
        assert_eq!(stats.image_count, 1);
        assert!(!stats.is_degraded());
    }

    #[test]
    fn test_degradation_json() {
        let mut stats = ExportStats::new();
        stats.record(Degradation::new(3, DegradationKind::EmptyTable));
        let json = serde_json::to_string(&stats.degraded).unwrap();
        assert_eq!(json, r#"[{"block_index":3,"kind":"empty_table"}]"#);
        assert!(stats.is_degraded());
    }
}
