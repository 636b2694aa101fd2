//! Integration tests for print layout and pagination.

use research_export::layout::{FixedWidthMetrics, FlowEngine, PageSet, PageSettings, PrintStyle, TableLayoutEngine};
use research_export::{classify, Block};

fn layout(doc: &str) -> PageSet {
    let style = PrintStyle::default();
    let metrics = FixedWidthMetrics::default();
    FlowEngine::new(&style, &metrics).layout(&classify(doc))
}

fn filler(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("Filler line {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_table_layout_scenario() {
    let doc = "| Name | Role | Team |\n|---|:---:|---|\n| Ada | Eng | Core |\n| Lin | PM | Growth |";
    let blocks = classify(doc);
    assert_eq!(blocks.len(), 1);

    let table = match &blocks[0] {
        Block::Table(table) => table,
        other => panic!("expected table, got {:?}", other),
    };
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.rows[0].cells, vec!["Name", "Role", "Team"]);

    let style = PrintStyle::default();
    let metrics = FixedWidthMetrics::default();
    let width = PageSettings::default().content_width();
    let grid = TableLayoutEngine::new(&style, &metrics).layout(table, width);

    assert_eq!(grid.rows.len(), 3);
    assert_eq!(grid.columns, 3);
    assert!((grid.column_width - width / 3.0).abs() < 1e-4);
    for row in &grid.rows {
        assert!(row.height >= style.table_line_height);
        assert_eq!(row.cells.len(), 3);
    }
    assert!(grid.rows[0].is_header);
    assert!(!grid.rows[1].is_header);
}

#[test]
fn test_ragged_rows_tolerated() {
    let doc = "| a | b | c |\n| 1 |\n| 1 | 2 | 3 | 4 |";
    let style = PrintStyle::default();
    let metrics = FixedWidthMetrics::default();
    let blocks = classify(doc);
    let Block::Table(table) = &blocks[0] else {
        panic!("expected table");
    };

    let grid = TableLayoutEngine::new(&style, &metrics).layout(table, 170.0);
    assert_eq!(grid.rows.len(), 3);
    assert!(grid.rows.iter().all(|r| r.cells.len() == 3));
}

#[test]
fn test_long_document_paginates() {
    let pages = layout(&format!("# Report\n{}", filler(200)));
    assert!(pages.page_count() >= 2);
    assert_eq!(pages.find_page("Report"), Some(0));
    assert!(pages.find_page("Filler line 199").unwrap() >= 1);
}

#[test]
fn test_overflowing_paragraph_not_split() {
    let words: Vec<String> = (0..60).map(|i| format!("word{:02}", i)).collect();
    let paragraph = words.join(" ");

    let mut straddled = false;
    for fill in 25..45 {
        let pages = layout(&format!("{}\n{}", filler(fill), paragraph));
        let first = pages.find_page("word00").unwrap();
        for word in &words {
            assert_eq!(
                pages.find_page(word),
                Some(first),
                "{} split from its paragraph with {} filler lines",
                word,
                fill
            );
        }
        straddled |= first > 0;
    }
    assert!(straddled, "no filler count pushed the paragraph to a new page");
}

#[test]
fn test_table_never_split() {
    let mut table = String::from("| Key | Value |\n|---|---|\n");
    for i in 0..8 {
        table.push_str(&format!("| key{} | value{} |\n", i, i));
    }

    let mut moved = false;
    for fill in 20..45 {
        let pages = layout(&format!("{}\n{}", filler(fill), table));
        let first = pages.find_page("Key").unwrap();
        for i in 0..8 {
            assert_eq!(pages.find_page(&format!("value{}", i)), Some(first));
        }
        moved |= first > 0;
    }
    assert!(moved);
}

#[test]
fn test_pagination_deterministic() {
    let doc = format!(
        "# Title\n\n{}\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n- **bold** item\n1. [link](https://example.com)\n![missing](nowhere.png)",
        filler(70)
    );
    let first = layout(&doc);
    let second = layout(&doc);
    assert_eq!(first.page_count(), second.page_count());
    assert_eq!(first.pages, second.pages);
}

#[test]
fn test_letter_page_is_shorter() {
    let doc = filler(150);
    let style = PrintStyle::default();
    let metrics = FixedWidthMetrics::default();
    let blocks = classify(&doc);

    let a4 = FlowEngine::new(&style, &metrics).layout(&blocks);
    let letter = FlowEngine::new(&style, &metrics)
        .with_page(PageSettings::letter())
        .layout(&blocks);
    assert!(letter.page_count() >= a4.page_count());
}
