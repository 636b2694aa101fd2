//! Paginating text flow.
//!
//! Walks the classified blocks once, top to bottom, and places each on a
//! page. The result is a [`PageSet`]: per page, an ordered display list of
//! [`DrawOp`]s in millimetres with `y` measured down from the top edge.
//! Text is positioned by its baseline.
//!
//! Page breaks are decided before drawing. A block whose predicted height
//! does not fit the remaining space moves to a fresh page as a whole. Only
//! a block taller than a full page is split, and then only between lines.
//! Tables are never split.

use serde::{Deserialize, Serialize};

use super::metrics::{FontVariant, TextMeasure};
use super::page::{LayoutCursor, PageSettings};
use super::style::{Color, PrintStyle};
use super::table::{TableLayout, TableLayoutEngine};
use super::wrap::{wrap_text, Line, RunWrapper};
use crate::assets::{load_image, DecodedImage, ImageSource};
use crate::error::Error;
use crate::model::{Block, ListMarker, RunStyle, TableBlock};
use crate::parser::parse_inline;
use crate::render::{Degradation, DegradationKind};

/// One drawing instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    /// Text with its baseline at `y`
    Text {
        x: f32,
        y: f32,
        text: String,
        font: FontVariant,
        size: f32,
        color: Color,
    },
    /// Rectangle with its top-left corner at (`x`, `y`)
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Color>,
        stroke: Option<Color>,
    },
    /// Image from [`PageSet::images`], top-left corner at (`x`, `y`)
    Image {
        index: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// Clickable area, top-left corner at (`x`, `y`)
    Link {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        url: String,
    },
}

/// Display list of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// All text drawn on this page, one op per line.
    pub fn text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check if nothing is drawn on this page.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// The laid-out document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSet {
    /// Page geometry shared by all pages
    pub settings: PageSettings,
    /// Pages in order; never empty
    pub pages: Vec<Page>,
    /// Decoded images referenced by [`DrawOp::Image`]
    pub images: Vec<DecodedImage>,
    /// Blocks that were skipped or replaced
    pub degraded: Vec<Degradation>,
}

impl PageSet {
    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Index of the first page whose text contains `needle`.
    pub fn find_page(&self, needle: &str) -> Option<usize> {
        self.pages.iter().position(|p| p.text().contains(needle))
    }
}

/// Paginating text-flow engine.
pub struct FlowEngine<'a> {
    settings: PageSettings,
    style: &'a PrintStyle,
    measure: &'a dyn TextMeasure,
    images: Option<&'a dyn ImageSource>,
}

impl<'a> FlowEngine<'a> {
    /// Create an engine on A4 pages with no image source.
    pub fn new(style: &'a PrintStyle, measure: &'a dyn TextMeasure) -> Self {
        Self {
            settings: PageSettings::default(),
            style,
            measure,
            images: None,
        }
    }

    /// Set the page geometry.
    pub fn with_page(mut self, settings: PageSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the image source. Without one every image becomes a placeholder.
    pub fn with_images(mut self, images: &'a dyn ImageSource) -> Self {
        self.images = Some(images);
        self
    }

    /// Lay out `blocks` onto pages.
    pub fn layout(&self, blocks: &[Block]) -> PageSet {
        let mut flow = Flow {
            engine: self,
            cursor: LayoutCursor::new(&self.settings),
            pages: vec![Page::default()],
            images: Vec::new(),
            degraded: Vec::new(),
        };

        for (index, block) in blocks.iter().enumerate() {
            flow.block(index, block);

            if flow.cursor.y > self.settings.bottom() {
                flow.new_page();
            }
        }

        flow.finish()
    }
}

struct Flow<'e, 'a> {
    engine: &'e FlowEngine<'a>,
    cursor: LayoutCursor,
    pages: Vec<Page>,
    images: Vec<DecodedImage>,
    degraded: Vec<Degradation>,
}

impl Flow<'_, '_> {
    fn settings(&self) -> &PageSettings {
        &self.engine.settings
    }

    fn style(&self) -> &PrintStyle {
        self.engine.style
    }

    fn block(&mut self, index: usize, block: &Block) {
        match block {
            Block::Heading { level, text } => self.heading(*level, text),
            Block::Paragraph { text } => {
                let left = self.settings().margin_left;
                self.text_block(None, left, text)
            }
            Block::ListItem { marker, text } => self.list_item(*marker, text),
            Block::Table(table) => self.table(index, table),
            Block::Image { alt_text, url } => self.image(index, alt_text, url),
            Block::Blank => {
                let dy = self.style().blank_line;
                self.cursor.advance(dy);
            }
        }
    }

    fn new_page(&mut self) {
        self.cursor.next_page(&self.engine.settings);
        self.pages.push(Page::default());
    }

    /// Start a new page unless `height` fits here or the page is fresh.
    fn ensure(&mut self, height: f32) {
        let settings = self.engine.settings;
        if !self.cursor.fits(height, &settings) && !self.cursor.at_page_top(&settings) {
            log::debug!(
                "Page break at y={:.1}mm, need {:.1}mm",
                self.cursor.y,
                height
            );
            self.new_page();
        }
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn text(&mut self, x: f32, text: &str, font: FontVariant, size: f32) {
        if text.is_empty() {
            return;
        }
        let op = DrawOp::Text {
            x,
            y: self.cursor.y,
            text: text.to_string(),
            font,
            size,
            color: self.style().text_color,
        };
        self.push(op);
    }

    fn styled_lines(&mut self, lines: &[Line], x: f32, size: f32, line_height: f32) {
        for line in lines {
            self.ensure(line_height);
            let y = self.cursor.y;

            for seg in &line.segments {
                if seg.text.is_empty() {
                    continue;
                }
                let color = if seg.link.is_some() {
                    self.style().link_color
                } else {
                    self.style().text_color
                };
                self.push(DrawOp::Text {
                    x: x + seg.x,
                    y,
                    text: seg.text.clone(),
                    font: seg.font,
                    size,
                    color,
                });

                if let Some(url) = &seg.link {
                    let op = DrawOp::Link {
                        x: x + seg.x,
                        y: y - self.style().link_rise,
                        width: seg.width,
                        height: self.style().link_height,
                        url: url.clone(),
                    };
                    self.push(op);
                }
            }

            self.cursor.advance(line_height);
        }
    }

    fn heading(&mut self, level: u8, text: &str) {
        let hs = *self.style().heading(level);
        let width = self.settings().content_width();
        let runs = parse_inline(text, RunStyle::BOLD);
        let lines = RunWrapper::new(&runs, hs.font_size, width, self.engine.measure).wrap();

        let height = lines.len() as f32 * hs.line_height;
        self.ensure(height.max(hs.reserve));

        let left = self.settings().margin_left;
        self.styled_lines(&lines, left, hs.font_size, hs.line_height);
        self.cursor.advance(hs.spacing);
    }

    fn list_item(&mut self, marker: ListMarker, text: &str) {
        let style = self.style();
        let marker_x = self.settings().margin_left + style.list_indent;
        let (label, text_x) = match marker {
            ListMarker::Bullet => (style.bullet.clone(), marker_x + style.bullet_text_offset),
            ListMarker::Ordered(n) => {
                let label = format!("{}.", n);
                let label_width =
                    self.engine
                        .measure
                        .measure(&label, FontVariant::Regular, style.body_font_size);
                let text_x = marker_x + label_width + style.number_gap;
                (label, text_x)
            }
        };

        self.text_block(Some((label, marker_x)), text_x, text);
    }

    /// Paragraph or list item: wrapped body text with an optional marker.
    fn text_block(&mut self, marker: Option<(String, f32)>, text_x: f32, text: &str) {
        let size = self.style().body_font_size;
        let line_height = self.style().body_line_height();
        let spacing = self.style().paragraph_spacing;
        let width = self.settings().width - self.settings().margin_right - text_x;

        let runs = parse_inline(text, RunStyle::PLAIN);
        let lines = RunWrapper::new(&runs, size, width, self.engine.measure).wrap();
        self.ensure(lines.len() as f32 * line_height);

        if let Some((label, x)) = marker {
            self.text(x, &label, FontVariant::Regular, size);
        }
        self.styled_lines(&lines, text_x, size, line_height);
        self.cursor.advance(spacing);
    }

    fn image(&mut self, index: usize, alt_text: &str, url: &str) {
        if url.is_empty() {
            log::debug!("Skipping image block {} with empty URL", index);
            self.degraded
                .push(Degradation::new(index, DegradationKind::EmptyImageUrl));
            return;
        }

        let loaded = match self.engine.images {
            Some(source) => load_image(source, url),
            None => Err(Error::MissingCapability("image source")),
        };

        match loaded {
            Ok(image) => self.draw_image(image, alt_text),
            Err(e) => {
                log::warn!("Failed to load image {}: {}", url, e);
                self.degraded.push(Degradation::new(
                    index,
                    DegradationKind::ImagePlaceholder {
                        reason: e.to_string(),
                    },
                ));
                let label = if alt_text.is_empty() { url } else { alt_text };
                self.placeholder(&format!("[Image: {}]", label));
            }
        }
    }

    fn draw_image(&mut self, image: DecodedImage, alt_text: &str) {
        let style = self.style().clone();
        let settings = *self.settings();
        let content_width = settings.content_width();

        let aspect = image.aspect_ratio();
        let mut width = content_width;
        let mut height = width / aspect;
        if height > style.image_max_height {
            height = style.image_max_height;
            width = height * aspect;
        }

        let caption = if alt_text.is_empty() {
            Vec::new()
        } else {
            wrap_text(
                alt_text,
                FontVariant::Italic,
                style.caption_font_size,
                content_width,
                self.engine.measure,
            )
        };
        let caption_height = if caption.is_empty() {
            0.0
        } else {
            caption.len() as f32 * style.caption_line_height + style.image_spacing
        };
        self.ensure(height + style.image_spacing + caption_height);

        let index = self.images.len();
        self.images.push(image);
        self.push(DrawOp::Image {
            index,
            x: settings.margin_left + (content_width - width) / 2.0,
            y: self.cursor.y,
            width,
            height,
        });
        self.cursor.advance(height + style.image_spacing);

        if !caption.is_empty() {
            for line in &caption {
                self.text(
                    settings.margin_left,
                    line,
                    FontVariant::Italic,
                    style.caption_font_size,
                );
                self.cursor.advance(style.caption_line_height);
            }
            self.cursor.advance(style.image_spacing);
        }
    }

    fn placeholder(&mut self, label: &str) {
        let size = self.style().placeholder_font_size;
        let line_height = size * self.style().body_line_factor;
        let advance = self.style().placeholder_advance;
        let left = self.settings().margin_left;
        let lines = wrap_text(
            label,
            FontVariant::Italic,
            size,
            self.settings().content_width(),
            self.engine.measure,
        );

        let extra = (lines.len() - 1) as f32 * line_height;
        self.ensure(advance + extra);

        let top = self.cursor.y;
        for (i, line) in lines.iter().enumerate() {
            self.cursor.y = top + i as f32 * line_height;
            self.text(left, line, FontVariant::Italic, size);
        }
        self.cursor.y = top;
        self.cursor.advance(advance + extra);
    }

    fn table(&mut self, index: usize, table: &TableBlock) {
        let width = self.settings().content_width();
        let layout = TableLayoutEngine::new(self.style(), self.engine.measure).layout(table, width);

        if layout.is_empty() {
            log::debug!("Skipping table block {} with no rows", index);
            self.degraded
                .push(Degradation::new(index, DegradationKind::EmptyTable));
            return;
        }

        let total = layout.total_height();
        if total > self.settings().content_height() {
            log::warn!(
                "Table block {} is {:.1}mm tall, taller than a page; placing it unsplit",
                index,
                total
            );
            self.degraded
                .push(Degradation::new(index, DegradationKind::OversizedTable));
            if !self.cursor.at_page_top(&self.engine.settings) {
                self.new_page();
            }
        } else {
            self.ensure(total);
        }

        self.draw_table(&layout);
        let spacing = self.style().table_spacing;
        self.cursor.advance(total + spacing);
    }

    fn draw_table(&mut self, layout: &TableLayout) {
        let style = self.style().clone();
        let left = self.settings().margin_left;
        let mut row_y = self.cursor.y;

        for row in &layout.rows {
            if row.is_header {
                self.push(DrawOp::Rect {
                    x: left,
                    y: row_y,
                    width: layout.column_width * layout.columns as f32,
                    height: row.height,
                    fill: Some(style.header_fill),
                    stroke: None,
                });
            }

            let font = if row.is_header {
                FontVariant::Bold
            } else {
                FontVariant::Regular
            };

            for (col, lines) in row.cells.iter().enumerate() {
                let cell_x = left + col as f32 * layout.column_width;
                self.push(DrawOp::Rect {
                    x: cell_x,
                    y: row_y,
                    width: layout.column_width,
                    height: row.height,
                    fill: None,
                    stroke: Some(style.border_color),
                });

                for (k, line) in lines.iter().enumerate() {
                    if line.is_empty() {
                        continue;
                    }
                    self.push(DrawOp::Text {
                        x: cell_x + style.cell_padding,
                        y: row_y
                            + style.cell_padding
                            + style.cell_baseline
                            + k as f32 * style.table_line_height,
                        text: line.clone(),
                        font,
                        size: style.table_font_size,
                        color: style.text_color,
                    });
                }
            }

            row_y += row.height;
        }
    }

    fn finish(mut self) -> PageSet {
        while self.pages.len() > 1 && self.pages.last().is_some_and(Page::is_empty) {
            self.pages.pop();
        }

        log::debug!(
            "Laid out {} pages, {} images, {} degraded blocks",
            self.pages.len(),
            self.images.len(),
            self.degraded.len()
        );

        PageSet {
            settings: self.engine.settings,
            pages: self.pages,
            images: self.images,
            degraded: self.degraded,
        }
    }
}
