//! Block classification.
//!
//! Splits a markdown document into a flat sequence of [`Block`]s in one
//! pass. Each line is tested against the block kinds in a fixed order and
//! the first match wins:
//!
//! 1. table start (trimmed line begins with `|`), which then consumes every
//!    following line that also begins with `|`
//! 2. standalone image (`![alt](url)`)
//! 3. heading (`### `, `## `, `# `)
//! 4. unordered list item (`- ` or `* `)
//! 5. ordered list item (`1. `)
//! 6. paragraph (any other non-blank line)
//! 7. blank line

use regex::Regex;

use crate::model::{Block, Row, TableBlock};

/// Classify a document with a freshly built classifier.
pub fn classify(text: &str) -> Vec<Block> {
    BlockClassifier::new().classify(text)
}

/// Line-oriented markdown block classifier.
#[derive(Debug, Clone)]
pub struct BlockClassifier {
    separator_regex: Regex,
    image_regex: Regex,
    ordered_regex: Regex,
}

impl Default for BlockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockClassifier {
    /// Create a new classifier.
    pub fn new() -> Self {
        Self {
            separator_regex: Regex::new(r"^\|[\s\-:|]+\|$").unwrap(),
            image_regex: Regex::new(r"^!\[(.*?)\]\((.*?)\)$").unwrap(),
            ordered_regex: Regex::new(r"^(\d+)\.\s(.*)$").unwrap(),
        }
    }

    /// Classify a whole document into blocks, preserving line order.
    pub fn classify(&self, text: &str) -> Vec<Block> {
        let lines: Vec<&str> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();

        let mut blocks = Vec::with_capacity(lines.len());
        let mut i = 0;

        while i < lines.len() {
            if is_table_line(lines[i]) {
                let start = i;
                while i < lines.len() && is_table_line(lines[i]) {
                    i += 1;
                }
                blocks.push(Block::Table(self.parse_table(&lines[start..i])));
                continue;
            }

            blocks.push(self.classify_line(lines[i]));
            i += 1;
        }

        log::debug!(
            "Classified {} lines into {} blocks",
            lines.len(),
            blocks.len()
        );
        blocks
    }

    /// Classify a single non-table line.
    pub fn classify_line(&self, line: &str) -> Block {
        let trimmed = line.trim();

        if let Some(caps) = self.image_regex.captures(trimmed) {
            return Block::Image {
                alt_text: caps[1].to_string(),
                url: caps[2].trim().to_string(),
            };
        }

        if let Some(rest) = line.strip_prefix("### ") {
            return Block::heading(3, rest.trim());
        }
        if let Some(rest) = line.strip_prefix("## ") {
            return Block::heading(2, rest.trim());
        }
        if let Some(rest) = line.strip_prefix("# ") {
            return Block::heading(1, rest.trim());
        }

        if let Some(rest) = line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("* "))
        {
            return Block::bullet(rest.trim());
        }

        if let Some(caps) = self.ordered_regex.captures(line) {
            // Numbers too large for u32 are kept as text.
            if let Ok(index) = caps[1].parse::<u32>() {
                return Block::numbered(index, caps[2].trim());
            }
        }

        if trimmed.is_empty() {
            Block::Blank
        } else {
            Block::paragraph(trimmed)
        }
    }

    /// Parse a group of pipe-prefixed lines into a table.
    ///
    /// Header-separator rows are dropped.
    pub fn parse_table(&self, lines: &[&str]) -> TableBlock {
        let rows = lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !self.separator_regex.is_match(line))
            .map(split_cells)
            .collect();

        TableBlock::from_rows(rows)
    }

    /// Check whether a line is a header-separator row.
    pub fn is_separator(&self, line: &str) -> bool {
        self.separator_regex.is_match(line.trim())
    }
}

fn is_table_line(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

fn split_cells(line: &str) -> Row {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    Row::from_strings(inner.split('|').map(str::trim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListMarker;

    #[test]
    fn test_headings() {
        let blocks = classify("# One\n## Two\n### Three\n#### Four");
        assert_eq!(blocks[0], Block::heading(1, "One"));
        assert_eq!(blocks[1], Block::heading(2, "Two"));
        assert_eq!(blocks[2], Block::heading(3, "Three"));
        // Deeper levels are not headings.
        assert_eq!(blocks[3], Block::paragraph("#### Four"));
    }

    #[test]
    fn test_heading_requires_space() {
        assert_eq!(classify("#tag")[0], Block::paragraph("#tag"));
    }

    #[test]
    fn test_list_items() {
        let blocks = classify("- dash\n* star\n3. three\n10. ten");
        assert_eq!(blocks[0], Block::bullet("dash"));
        assert_eq!(blocks[1], Block::bullet("star"));
        assert_eq!(blocks[2], Block::numbered(3, "three"));
        assert!(matches!(
            blocks[3],
            Block::ListItem {
                marker: ListMarker::Ordered(10),
                ..
            }
        ));
    }

    #[test]
    fn test_ordered_overflow_is_paragraph() {
        let blocks = classify("99999999999. big");
        assert_eq!(blocks[0], Block::paragraph("99999999999. big"));
    }

    #[test]
    fn test_emphasis_line_is_not_bullet() {
        assert_eq!(classify("*note* here")[0], Block::paragraph("*note* here"));
    }

    #[test]
    fn test_paragraph_and_blank() {
        let blocks = classify("  text  \n\n   ");
        assert_eq!(
            blocks,
            vec![Block::paragraph("text"), Block::Blank, Block::Blank]
        );
    }

    #[test]
    fn test_crlf_lines() {
        let blocks = classify("# Title\r\nbody\r\n");
        assert_eq!(blocks[0], Block::heading(1, "Title"));
        assert_eq!(blocks[1], Block::paragraph("body"));
    }

    #[test]
    fn test_image_line() {
        let blocks = classify("  ![A chart](https://x.test/c.png)  ");
        assert_eq!(
            blocks[0],
            Block::Image {
                alt_text: "A chart".into(),
                url: "https://x.test/c.png".into(),
            }
        );
    }

    #[test]
    fn test_inline_image_stays_paragraph() {
        let blocks = classify("see ![x](y.png) inline");
        assert!(matches!(blocks[0], Block::Paragraph { .. }));
    }

    #[test]
    fn test_table_separator_dropped() {
        let doc = "| A | B | C |\n|---|:--:|---|\n| 1 | 2 | 3 |\n| 4 | 5 | 6 |\nafter";
        let blocks = classify(doc);
        assert_eq!(blocks.len(), 2);

        let Block::Table(table) = &blocks[0] else {
            panic!("expected table, got {:?}", blocks[0]);
        };
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.rows[0].cells, vec!["A", "B", "C"]);
        assert_eq!(table.rows[2].cells, vec!["4", "5", "6"]);
        assert_eq!(blocks[1], Block::paragraph("after"));
    }

    #[test]
    fn test_table_without_trailing_pipe() {
        let classifier = BlockClassifier::new();
        let table = classifier.parse_table(&["| a | b", "| c | d |"]);
        assert_eq!(table.rows[0].cells, vec!["a", "b"]);
        assert_eq!(table.rows[1].cells, vec!["c", "d"]);
    }

    #[test]
    fn test_table_only_separator_has_no_rows() {
        let blocks = classify("|---|---|");
        assert_eq!(blocks, vec![Block::Table(TableBlock::new())]);
    }

    #[test]
    fn test_table_takes_precedence() {
        assert!(matches!(classify("  | # x |")[0], Block::Table(_)));
    }

    #[test]
    fn test_order_preserved() {
        let blocks = classify("# H\npara\n- item\n\n| a |\n![i](u)");
        let kinds: Vec<_> = blocks.iter().map(Block::kind).collect();
        assert_eq!(
            kinds,
            vec!["heading", "paragraph", "list_item", "blank", "table", "image"]
        );
    }

    #[test]
    fn test_is_separator() {
        let classifier = BlockClassifier::new();
        assert!(classifier.is_separator("| --- | :---: |"));
        assert!(!classifier.is_separator("| a | b |"));
    }
}
