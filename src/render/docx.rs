//! Word (DOCX) output.
//!
//! Builds a minimal WordprocessingML package by hand: one paragraph per
//! block, run properties for inline styles, numbering definitions for
//! lists and external relationships for hyperlinks. Pagination is left to
//! the word processor.

use std::io::{Cursor, Write};

use chrono::NaiveDateTime;
use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::result::{Degradation, DegradationKind, ExportStats};
use crate::error::Result;
use crate::layout::{PageSettings, MM_PER_PT};
use crate::model::{Block, ListMarker, RunStyle, StyledRun, TableBlock};
use crate::parser::parse_inline;

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Numbering instance used by every bulleted item.
const BULLET_NUM_ID: u32 = 1;

/// Relationship ids below this are taken by styles and numbering.
const FIRST_LINK_REL: usize = 3;

fn twips(mm: f32) -> i64 {
    (mm / MM_PER_PT * 20.0).round() as i64
}

/// Escape text for XML, dropping characters XML 1.0 does not allow.
fn esc(text: &str) -> String {
    if text.chars().all(is_xml_char) {
        return escape(text).into_owned();
    }
    let clean: String = text.chars().filter(|&c| is_xml_char(c)).collect();
    escape(clean.as_str()).into_owned()
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

/// Writes blocks as a DOCX package.
#[derive(Debug, Clone)]
pub struct DocxWriter {
    title: String,
    created: NaiveDateTime,
    page: PageSettings,
}

impl DocxWriter {
    /// Create a writer for a document titled `title`.
    pub fn new(title: impl Into<String>, created: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            created,
            page: PageSettings::default(),
        }
    }

    /// Set the page size and margins of the document section.
    pub fn with_page(mut self, page: PageSettings) -> Self {
        self.page = page;
        self
    }

    /// Serialize `blocks`, recording skipped blocks in `stats`.
    pub fn write(&self, blocks: &[Block], stats: &mut ExportStats) -> Result<Vec<u8>> {
        let mut body = BodyBuilder::default();
        for (index, block) in blocks.iter().enumerate() {
            if let Some(kind) = body.block(block) {
                log::debug!("Word export skipped block {}: {:?}", index, kind);
                stats.record(Degradation::new(index, kind));
            }
        }

        let document = self.document_xml(&body.xml);
        let numbering = numbering_xml(&body.ordered_starts);
        let document_rels = document_rels_xml(&body.links);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let parts: [(&str, &str); 7] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML),
            ("_rels/.rels", PACKAGE_RELS_XML),
            ("docProps/core.xml", &self.core_xml()),
            ("word/document.xml", &document),
            ("word/styles.xml", STYLES_XML),
            ("word/numbering.xml", &numbering),
            ("word/_rels/document.xml.rels", &document_rels),
        ];
        for (name, content) in parts {
            zip.start_file(name, options)?;
            zip.write_all(content.as_bytes())?;
        }

        let bytes = zip.finish()?.into_inner();
        log::debug!(
            "Wrote DOCX: {} links, {} numbered lists, {} bytes",
            body.links.len(),
            body.ordered_starts.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    fn document_xml(&self, body: &str) -> String {
        let page = &self.page;
        format!(
            "{XML_HEADER}<w:document xmlns:w=\"{NS_W}\" xmlns:r=\"{NS_R}\"><w:body>{body}\
             <w:sectPr><w:pgSz w:w=\"{w}\" w:h=\"{h}\"/>\
             <w:pgMar w:top=\"{top}\" w:right=\"{right}\" w:bottom=\"{bottom}\" w:left=\"{left}\" \
             w:header=\"708\" w:footer=\"708\" w:gutter=\"0\"/></w:sectPr></w:body></w:document>",
            w = twips(page.width),
            h = twips(page.height),
            top = twips(page.margin_top),
            right = twips(page.margin_right),
            bottom = twips(page.margin_bottom),
            left = twips(page.margin_left),
        )
    }

    fn core_xml(&self) -> String {
        format!(
            "{XML_HEADER}<cp:coreProperties \
             xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
             xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
             xmlns:dcterms=\"http://purl.org/dc/terms/\" \
             xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
             <dc:title>{}</dc:title><dc:creator>research-export</dc:creator>\
             <dcterms:created xsi:type=\"dcterms:W3CDTF\">{}</dcterms:created>\
             </cp:coreProperties>",
            esc(&self.title),
            self.created.format("%Y-%m-%dT%H:%M:%SZ"),
        )
    }
}

#[derive(Debug, Default)]
struct BodyBuilder {
    xml: String,
    /// Hyperlink targets, in relationship order
    links: Vec<String>,
    /// Start number of each contiguous ordered list
    ordered_starts: Vec<u32>,
    in_ordered: bool,
}

impl BodyBuilder {
    /// Append one block. Returns why the block was skipped, if it was.
    fn block(&mut self, block: &Block) -> Option<DegradationKind> {
        let ordered = matches!(
            block,
            Block::ListItem {
                marker: ListMarker::Ordered(_),
                ..
            }
        );
        if !ordered {
            self.in_ordered = false;
        }

        match block {
            Block::Heading { level, text } => {
                let props = format!("<w:pStyle w:val=\"Heading{}\"/>", level);
                self.paragraph(&props, &parse_inline(text, RunStyle::PLAIN));
            }
            Block::Paragraph { text } => {
                self.paragraph("", &parse_inline(text, RunStyle::PLAIN));
            }
            Block::ListItem { marker, text } => {
                let num_id = match marker {
                    ListMarker::Bullet => BULLET_NUM_ID,
                    ListMarker::Ordered(start) => {
                        if !self.in_ordered {
                            self.ordered_starts.push(*start);
                            self.in_ordered = true;
                        }
                        BULLET_NUM_ID + self.ordered_starts.len() as u32
                    }
                };
                let props = format!(
                    "<w:pStyle w:val=\"ListParagraph\"/>\
                     <w:numPr><w:ilvl w:val=\"0\"/><w:numId w:val=\"{}\"/></w:numPr>",
                    num_id
                );
                self.paragraph(&props, &parse_inline(text, RunStyle::PLAIN));
            }
            Block::Table(table) => {
                if table.column_count() == 0 {
                    return Some(DegradationKind::EmptyTable);
                }
                self.table(table);
            }
            Block::Image { alt_text, url } => {
                if url.is_empty() {
                    return Some(DegradationKind::EmptyImageUrl);
                }
                let label = if alt_text.is_empty() { url } else { alt_text };
                let run = StyledRun {
                    italic: true,
                    link: Some(url.clone()),
                    ..StyledRun::plain(format!("[Image: {}]", label))
                };
                self.paragraph("", &[run]);
            }
            Block::Blank => self.xml.push_str("<w:p/>"),
        }
        None
    }

    fn paragraph(&mut self, props: &str, runs: &[StyledRun]) {
        self.xml.push_str("<w:p>");
        if !props.is_empty() {
            self.xml.push_str("<w:pPr>");
            self.xml.push_str(props);
            self.xml.push_str("</w:pPr>");
        }
        self.runs(runs);
        self.xml.push_str("</w:p>");
    }

    fn runs(&mut self, runs: &[StyledRun]) {
        for run in runs {
            match &run.link {
                Some(url) => {
                    self.links.push(url.clone());
                    let rel = FIRST_LINK_REL + self.links.len() - 1;
                    self.xml.push_str(&format!(
                        "<w:hyperlink r:id=\"rId{}\" w:history=\"1\">{}</w:hyperlink>",
                        rel,
                        run_xml(run)
                    ));
                }
                None => self.xml.push_str(&run_xml(run)),
            }
        }
    }

    fn table(&mut self, table: &TableBlock) {
        let columns = table.column_count();
        // Share 100% of the text width (pct units are fiftieths of a percent)
        let col_pct = 5000 / columns;

        self.xml.push_str(
            "<w:tbl><w:tblPr><w:tblW w:w=\"5000\" w:type=\"pct\"/><w:tblBorders>\
             <w:top w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"C8C8C8\"/>\
             <w:left w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"C8C8C8\"/>\
             <w:bottom w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"C8C8C8\"/>\
             <w:right w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"C8C8C8\"/>\
             <w:insideH w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"C8C8C8\"/>\
             <w:insideV w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"C8C8C8\"/>\
             </w:tblBorders></w:tblPr><w:tblGrid>",
        );
        for _ in 0..columns {
            self.xml.push_str("<w:gridCol/>");
        }
        self.xml.push_str("</w:tblGrid>");

        for (idx, row) in table.rows.iter().enumerate() {
            let header = idx == 0;
            self.xml.push_str("<w:tr>");
            if header {
                self.xml.push_str("<w:trPr><w:tblHeader/></w:trPr>");
            }

            for col in 0..columns {
                let cell = row.cells.get(col).map(String::as_str).unwrap_or("");
                self.xml.push_str(&format!(
                    "<w:tc><w:tcPr><w:tcW w:w=\"{}\" w:type=\"pct\"/>",
                    col_pct
                ));
                if header {
                    self.xml
                        .push_str("<w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"F0F0F0\"/>");
                }
                self.xml.push_str("</w:tcPr>");

                let base = if header {
                    RunStyle::BOLD
                } else {
                    RunStyle::PLAIN
                };
                self.paragraph("", &parse_inline(cell, base));
                self.xml.push_str("</w:tc>");
            }

            self.xml.push_str("</w:tr>");
        }

        self.xml.push_str("</w:tbl>");
    }
}

fn run_xml(run: &StyledRun) -> String {
    let mut props = String::new();
    if run.link.is_some() {
        props.push_str("<w:rStyle w:val=\"Hyperlink\"/>");
    }
    if run.code {
        props.push_str(
            "<w:rFonts w:ascii=\"Courier New\" w:hAnsi=\"Courier New\" w:cs=\"Courier New\"/>",
        );
    }
    if run.bold {
        props.push_str("<w:b/>");
    }
    if run.italic {
        props.push_str("<w:i/>");
    }

    let rpr = if props.is_empty() {
        String::new()
    } else {
        format!("<w:rPr>{}</w:rPr>", props)
    };
    format!(
        "<w:r>{}<w:t xml:space=\"preserve\">{}</w:t></w:r>",
        rpr,
        esc(&run.text)
    )
}

fn numbering_xml(ordered_starts: &[u32]) -> String {
    let mut xml = format!(
        "{XML_HEADER}<w:numbering xmlns:w=\"{NS_W}\">\
         <w:abstractNum w:abstractNumId=\"0\"><w:multiLevelType w:val=\"singleLevel\"/>\
         <w:lvl w:ilvl=\"0\"><w:start w:val=\"1\"/><w:numFmt w:val=\"bullet\"/>\
         <w:lvlText w:val=\"\u{2022}\"/><w:lvlJc w:val=\"left\"/>\
         <w:pPr><w:ind w:left=\"720\" w:hanging=\"360\"/></w:pPr></w:lvl></w:abstractNum>\
         <w:abstractNum w:abstractNumId=\"1\"><w:multiLevelType w:val=\"singleLevel\"/>\
         <w:lvl w:ilvl=\"0\"><w:start w:val=\"1\"/><w:numFmt w:val=\"decimal\"/>\
         <w:lvlText w:val=\"%1.\"/><w:lvlJc w:val=\"start\"/>\
         <w:pPr><w:ind w:left=\"720\" w:hanging=\"360\"/></w:pPr></w:lvl></w:abstractNum>\
         <w:num w:numId=\"{BULLET_NUM_ID}\"><w:abstractNumId w:val=\"0\"/></w:num>"
    );

    for (i, start) in ordered_starts.iter().enumerate() {
        xml.push_str(&format!(
            "<w:num w:numId=\"{}\"><w:abstractNumId w:val=\"1\"/>\
             <w:lvlOverride w:ilvl=\"0\"><w:startOverride w:val=\"{}\"/></w:lvlOverride></w:num>",
            BULLET_NUM_ID as usize + 1 + i,
            start
        ));
    }

    xml.push_str("</w:numbering>");
    xml
}

fn document_rels_xml(links: &[String]) -> String {
    let mut xml = format!(
        "{XML_HEADER}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"rId1\" Type=\"{REL_BASE}/styles\" Target=\"styles.xml\"/>\
         <Relationship Id=\"rId2\" Type=\"{REL_BASE}/numbering\" Target=\"numbering.xml\"/>"
    );

    for (i, url) in links.iter().enumerate() {
        xml.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"{REL_BASE}/hyperlink\" Target=\"{}\" TargetMode=\"External\"/>",
            FIRST_LINK_REL + i,
            esc(url)
        ));
    }

    xml.push_str("</Relationships>");
    xml
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="264" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="360" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="40"/><w:szCs w:val="40"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/><w:szCs w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="80"/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/><w:szCs w:val="28"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="ListParagraph"><w:name w:val="List Paragraph"/><w:basedOn w:val="Normal"/><w:qFormat/><w:pPr><w:spacing w:after="60"/><w:ind w:left="720"/></w:pPr></w:style><w:style w:type="character" w:styleId="Hyperlink"><w:name w:val="Hyperlink"/><w:rPr><w:color w:val="0000FF"/><w:u w:val="single"/></w:rPr></w:style></w:styles>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::classify;
    use chrono::NaiveDate;
    use std::io::Read;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(9, 3, 7)
            .unwrap()
    }

    fn render(doc: &str) -> (Vec<u8>, ExportStats) {
        let mut stats = ExportStats::new();
        let bytes = DocxWriter::new("Report", stamp())
            .write(&classify(doc), &mut stats)
            .unwrap();
        (bytes, stats)
    }

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_package_parts() {
        let (bytes, _) = render("# Title");
        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "word/document.xml",
            "word/styles.xml",
            "word/numbering.xml",
            "word/_rels/document.xml.rels",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_heading_and_runs() {
        let (bytes, _) = render("# Title\nHello **world** and `code`");
        let doc = part(&bytes, "word/document.xml");
        assert!(doc.contains("<w:pStyle w:val=\"Heading1\"/>"));
        assert!(doc.contains("<w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">world</w:t>"));
        assert!(doc.contains("Courier New"));
    }

    #[test]
    fn test_hyperlink_relationship() {
        let (bytes, _) = render("see [docs](https://example.com/?a=1&b=2)");
        let doc = part(&bytes, "word/document.xml");
        let rels = part(&bytes, "word/_rels/document.xml.rels");
        assert!(doc.contains("<w:hyperlink r:id=\"rId3\""));
        assert!(rels.contains("Target=\"https://example.com/?a=1&amp;b=2\""));
        assert!(rels.contains("TargetMode=\"External\""));
    }

    #[test]
    fn test_ordered_lists_restart() {
        let (bytes, _) = render("1. a\n2. b\n\n5. c\n- d");
        let doc = part(&bytes, "word/document.xml");
        let numbering = part(&bytes, "word/numbering.xml");

        assert_eq!(doc.matches("<w:numId w:val=\"2\"/>").count(), 2);
        assert_eq!(doc.matches("<w:numId w:val=\"3\"/>").count(), 1);
        assert_eq!(doc.matches("<w:numId w:val=\"1\"/>").count(), 1);
        assert!(numbering.contains("<w:startOverride w:val=\"5\"/>"));
        assert!(numbering.contains("<w:lvlText w:val=\"%1.\"/>"));
    }

    #[test]
    fn test_table_and_blank() {
        let (bytes, _) = render("| A | B |\n|---|---|\n| 1 | 2 |\n\nend");
        let doc = part(&bytes, "word/document.xml");
        assert!(doc.contains("<w:tbl>"));
        assert_eq!(doc.matches("<w:tr>").count(), 2);
        assert!(doc.contains("w:fill=\"F0F0F0\""));
        assert!(doc.contains("<w:p/>"));
    }

    #[test]
    fn test_escaping() {
        let (bytes, _) = render("a < b & c");
        let doc = part(&bytes, "word/document.xml");
        assert!(doc.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_control_characters_removed() {
        let mut stats = ExportStats::new();
        let bytes = DocxWriter::new("Q3\u{1}", stamp())
            .write(&classify("bell\u{7}nul\u{0}end **b\u{1b}old**"), &mut stats)
            .unwrap();

        let doc = part(&bytes, "word/document.xml");
        assert!(doc.contains(">bellnulend </w:t>"));
        assert!(doc.contains(">bold</w:t>"));
        assert!(!doc.chars().any(|c| c < ' ' && !matches!(c, '\t' | '\n' | '\r')));

        let core = part(&bytes, "docProps/core.xml");
        assert!(core.contains("<dc:title>Q3</dc:title>"));
    }

    #[test]
    fn test_degraded_blocks() {
        let (bytes, stats) = render("|---|\n![x]()\n![chart](c.png)");
        assert_eq!(stats.degraded.len(), 2);
        let doc = part(&bytes, "word/document.xml");
        assert!(doc.contains("[Image: chart]"));
    }

    #[test]
    fn test_deterministic() {
        let doc = "# A\n- b\n1. c";
        assert_eq!(render(doc).0, render(doc).0);
    }
}
