//! PDF output.
//!
//! Serializes a laid-out [`PageSet`] into a PDF file. All layout decisions
//! are already made; this module only converts millimetres to points, flips
//! the y axis and writes the object graph with `lopdf`.
//!
//! Text uses the five standard Helvetica/Courier fonts with WinAnsi
//! encoding, so no font programs are embedded. Characters outside
//! Windows-1252 are written as `?`.

use std::io::Write;

use chrono::NaiveDateTime;
use encoding_rs::WINDOWS_1252;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use unicode_normalization::UnicodeNormalization;

use crate::assets::DecodedImage;
use crate::error::Result;
use crate::layout::{Color, DrawOp, FontVariant, PageSet, MM_PER_PT};

/// Producer string written to the document info.
pub const PRODUCER: &str = concat!("research-export ", env!("CARGO_PKG_VERSION"));

/// Border line width in points.
const LINE_WIDTH: f32 = 0.57;

fn pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

/// Writes a [`PageSet`] as a PDF document.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    title: String,
    created: NaiveDateTime,
}

impl PdfWriter {
    /// Create a writer for a document titled `title`.
    pub fn new(title: impl Into<String>, created: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            created,
        }
    }

    /// Serialize `pages` to PDF bytes.
    pub fn write(&self, pages: &PageSet) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for font in FontVariant::ALL {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name(), font_id);
        }

        let mut xobjects = Dictionary::new();
        for (index, image) in pages.images.iter().enumerate() {
            let image_id = doc.add_object(image_stream(image)?);
            xobjects.set(image_name(index), image_id);
        }

        let page_height = pt(pages.settings.height);
        let mut kids = Vec::with_capacity(pages.pages.len());

        for page in &pages.pages {
            let mut operations = Vec::new();
            let mut annots = Vec::new();

            for op in &page.ops {
                match op {
                    DrawOp::Link { .. } => annots.push(link_annotation(op, page_height)),
                    _ => draw_operations(op, page_height, &mut operations),
                }
            }

            let content = Content { operations }.encode()?;
            let content_id = doc.add_object(deflate_stream(Dictionary::new(), &content)?);

            let mut page_dict = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            };
            if !annots.is_empty() {
                let annot_ids: Vec<Object> = annots
                    .into_iter()
                    .map(|annot| Object::Reference(doc.add_object(annot)))
                    .collect();
                page_dict.set("Annots", annot_ids);
            }

            kids.push(Object::Reference(doc.add_object(page_dict)));
        }

        let page_count = kids.len() as i64;
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                pt(pages.settings.width).into(),
                page_height.into(),
            ],
            "Resources" => dictionary! {
                "Font" => fonts,
                "XObject" => xobjects,
            },
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => text_string(&self.title),
            "Producer" => Object::string_literal(PRODUCER),
            "CreationDate" => Object::string_literal(
                self.created.format("D:%Y%m%d%H%M%S").to_string()
            ),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;

        log::debug!(
            "Wrote PDF: {} pages, {} images, {} bytes",
            page_count,
            pages.images.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

fn image_name(index: usize) -> String {
    format!("Im{}", index)
}

fn color_operands(color: &Color) -> Vec<Object> {
    color.unit().iter().map(|c| (*c).into()).collect()
}

fn draw_operations(op: &DrawOp, page_height: f32, ops: &mut Vec<Operation>) {
    match op {
        DrawOp::Text {
            x,
            y,
            text,
            font,
            size,
            color,
        } => {
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new(
                "Tf",
                vec![font.resource_name().into(), (*size).into()],
            ));
            ops.push(Operation::new("rg", color_operands(color)));
            ops.push(Operation::new(
                "Td",
                vec![pt(*x).into(), (page_height - pt(*y)).into()],
            ));
            ops.push(Operation::new(
                "Tj",
                vec![Object::string_literal(encode_win_ansi(text))],
            ));
            ops.push(Operation::new("ET", vec![]));
        }
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        } => {
            ops.push(Operation::new("q", vec![]));
            if let Some(fill) = fill {
                ops.push(Operation::new("rg", color_operands(fill)));
            }
            if let Some(stroke) = stroke {
                ops.push(Operation::new("RG", color_operands(stroke)));
                ops.push(Operation::new("w", vec![LINE_WIDTH.into()]));
            }
            ops.push(Operation::new(
                "re",
                vec![
                    pt(*x).into(),
                    (page_height - pt(*y + *height)).into(),
                    pt(*width).into(),
                    pt(*height).into(),
                ],
            ));
            let paint = match (fill.is_some(), stroke.is_some()) {
                (true, true) => "B",
                (true, false) => "f",
                (false, true) => "S",
                (false, false) => "n",
            };
            ops.push(Operation::new(paint, vec![]));
            ops.push(Operation::new("Q", vec![]));
        }
        DrawOp::Image {
            index,
            x,
            y,
            width,
            height,
        } => {
            ops.push(Operation::new("q", vec![]));
            ops.push(Operation::new(
                "cm",
                vec![
                    pt(*width).into(),
                    Object::Integer(0),
                    Object::Integer(0),
                    pt(*height).into(),
                    pt(*x).into(),
                    (page_height - pt(*y + *height)).into(),
                ],
            ));
            ops.push(Operation::new(
                "Do",
                vec![Object::Name(image_name(*index).into_bytes())],
            ));
            ops.push(Operation::new("Q", vec![]));
        }
        DrawOp::Link { .. } => {}
    }
}

fn link_annotation(op: &DrawOp, page_height: f32) -> Dictionary {
    let DrawOp::Link {
        x,
        y,
        width,
        height,
        url,
    } = op
    else {
        return Dictionary::new();
    };

    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![
            pt(*x).into(),
            (page_height - pt(*y + *height)).into(),
            pt(*x + *width).into(),
            (page_height - pt(*y)).into(),
        ],
        "Border" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
        "A" => dictionary! {
            "S" => "URI",
            "URI" => Object::string_literal(url.as_bytes().to_vec()),
        },
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn deflate_stream(mut dict: Dictionary, data: &[u8]) -> Result<Stream> {
    dict.set("Filter", "FlateDecode");
    Ok(Stream::new(dict, deflate(data)?))
}

fn image_stream(image: &DecodedImage) -> Result<Stream> {
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(image.width),
        "Height" => i64::from(image.height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8_i64,
    };
    deflate_stream(dict, &image.rgb)
}

/// Encode text for a WinAnsi font. Unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];

    for ch in text.nfc() {
        if ch.is_ascii() {
            out.push(ch as u8);
            continue;
        }
        let (bytes, _, had_errors) = WINDOWS_1252.encode(ch.encode_utf8(&mut buf));
        if had_errors || bytes.len() != 1 {
            out.push(b'?');
        } else {
            out.push(bytes[0]);
        }
    }

    out
}

/// PDF text string: literal when ASCII, UTF-16BE with BOM otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}
