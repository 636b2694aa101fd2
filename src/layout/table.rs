//! Table layout.
//!
//! Columns share the content width equally. Each cell's text is stripped of
//! inline markers and wrapped to the column width less padding; a row is as
//! tall as its tallest cell. The computed heights are used both to decide
//! where the table goes and to draw it.

use super::metrics::{FontVariant, TextMeasure};
use super::style::PrintStyle;
use super::wrap::wrap_text;
use crate::model::TableBlock;
use crate::parser::strip_inline;

/// A laid-out table row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    /// Wrapped lines per cell, one entry per column
    pub cells: Vec<Vec<String>>,
    /// Row height (mm)
    pub height: f32,
    /// Header rows are filled and bold
    pub is_header: bool,
}

impl RowLayout {
    /// Line count of the tallest cell.
    pub fn max_lines(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(1).max(1)
    }
}

/// A positioned grid, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub columns: usize,
    pub column_width: f32,
    pub rows: Vec<RowLayout>,
}

impl TableLayout {
    /// Sum of all row heights.
    pub fn total_height(&self) -> f32 {
        self.rows.iter().map(|r| r.height).sum()
    }

    /// Check if there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns == 0
    }
}

/// Table layout engine.
pub struct TableLayoutEngine<'a> {
    style: &'a PrintStyle,
    measure: &'a dyn TextMeasure,
}

impl<'a> TableLayoutEngine<'a> {
    /// Create an engine using `style` and `measure`.
    pub fn new(style: &'a PrintStyle, measure: &'a dyn TextMeasure) -> Self {
        Self { style, measure }
    }

    /// Lay out `table` across `content_width`.
    pub fn layout(&self, table: &TableBlock, content_width: f32) -> TableLayout {
        let columns = table.column_count();
        if columns == 0 {
            return TableLayout {
                columns: 0,
                column_width: 0.0,
                rows: Vec::new(),
            };
        }

        let column_width = content_width / columns as f32;
        let text_width = (column_width - 2.0 * self.style.cell_padding).max(0.0);

        let rows = table
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                if row.cells.len() > columns {
                    log::debug!(
                        "Table row {} has {} cells, dropping {} past column {}",
                        idx,
                        row.cells.len(),
                        row.cells.len() - columns,
                        columns
                    );
                }

                let is_header = idx == 0;
                let font = if is_header {
                    FontVariant::Bold
                } else {
                    FontVariant::Regular
                };

                let cells: Vec<Vec<String>> = (0..columns)
                    .map(|col| {
                        let raw = row.cells.get(col).map(String::as_str).unwrap_or("");
                        wrap_text(
                            &strip_inline(raw),
                            font,
                            self.style.table_font_size,
                            text_width,
                            self.measure,
                        )
                    })
                    .collect();

                let mut row = RowLayout {
                    cells,
                    height: 0.0,
                    is_header,
                };
                row.height =
                    row.max_lines() as f32 * self.style.table_line_height + self.style.row_padding;
                row
            })
            .collect();

        TableLayout {
            columns,
            column_width,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::metrics::FixedWidthMetrics;
    use crate::model::Row;

    fn three_by_three() -> TableBlock {
        TableBlock::from_rows(vec![
            Row::from_strings(["Name", "Score", "Notes"]),
            Row::from_strings(["Alice", "**10**", "ok"]),
            Row::from_strings(["Bob", "7", "fine"]),
        ])
    }

    #[test]
    fn test_row_and_column_counts() {
        let style = PrintStyle::default();
        let metrics = FixedWidthMetrics::default();
        let layout = TableLayoutEngine::new(&style, &metrics).layout(&three_by_three(), 170.0);

        assert_eq!(layout.rows.len(), 3);
        assert_eq!(layout.columns, 3);
        assert!((layout.column_width - 170.0 / 3.0).abs() < 1e-4);
        assert!(layout.rows[0].is_header);
        assert!(!layout.rows[1].is_header);
    }

    #[test]
    fn test_single_line_row_height() {
        let style = PrintStyle::default();
        let metrics = FixedWidthMetrics::default();
        let layout = TableLayoutEngine::new(&style, &metrics).layout(&three_by_three(), 170.0);

        for row in &layout.rows {
            assert_eq!(row.height, 9.0);
        }
        assert_eq!(layout.total_height(), 27.0);
        assert_eq!(layout.rows[1].cells[1], vec!["10"]);
    }

    #[test]
    fn test_tall_cell_grows_row() {
        let style = PrintStyle::default();
        let metrics = FixedWidthMetrics::default();
        let table = TableBlock::from_rows(vec![
            Row::from_strings(["A", "B"]),
            Row::from_strings(["short", "a much longer cell that has to wrap over several lines"]),
        ]);
        // 40 mm table: 20 mm columns, 16 mm of text, about 10 chars at 9pt.
        let layout = TableLayoutEngine::new(&style, &metrics).layout(&table, 40.0);

        let body = &layout.rows[1];
        assert!(body.max_lines() > 1);
        assert_eq!(body.height, body.max_lines() as f32 * 5.0 + 4.0);
        assert!(body.height > layout.rows[0].height);
    }

    #[test]
    fn test_ragged_rows_normalised() {
        let style = PrintStyle::default();
        let metrics = FixedWidthMetrics::default();
        let table = TableBlock::from_rows(vec![
            Row::from_strings(["a", "b"]),
            Row::from_strings(["1"]),
            Row::from_strings(["1", "2", "3"]),
        ]);
        let layout = TableLayoutEngine::new(&style, &metrics).layout(&table, 100.0);

        assert!(layout.rows.iter().all(|r| r.cells.len() == 2));
        assert_eq!(layout.rows[1].cells[1], vec![""]);
    }

    #[test]
    fn test_empty_table() {
        let style = PrintStyle::default();
        let metrics = FixedWidthMetrics::default();
        let layout = TableLayoutEngine::new(&style, &metrics).layout(&TableBlock::new(), 100.0);
        assert!(layout.is_empty());
        assert_eq!(layout.total_height(), 0.0);
    }
}
