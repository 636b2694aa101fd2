//! Typographic constants of the print layout.

use serde::{Deserialize, Serialize};

/// An RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const LINK_BLUE: Color = Color::rgb(0, 0, 255);

    /// Create a colour from 8-bit channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels scaled to 0.0..=1.0.
    pub fn unit(&self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

/// Size and spacing of one heading level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingStyle {
    /// Font size (pt)
    pub font_size: f32,
    /// Distance between wrapped lines (mm)
    pub line_height: f32,
    /// Space after the heading (mm)
    pub spacing: f32,
    /// Minimum room left on the page before the heading is placed (mm)
    pub reserve: f32,
}

/// Print layout style. All lengths in millimetres, font sizes in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintStyle {
    pub h1: HeadingStyle,
    pub h2: HeadingStyle,
    pub h3: HeadingStyle,

    /// Body font size
    pub body_font_size: f32,
    /// Body line height as a multiple of the font size
    pub body_line_factor: f32,
    /// Space after paragraphs and list items
    pub paragraph_spacing: f32,

    /// Bullet glyph for unordered items
    pub bullet: String,
    /// Marker indent from the left margin
    pub list_indent: f32,
    /// Text offset after a bullet
    pub bullet_text_offset: f32,
    /// Gap between an ordered item's number and its text
    pub number_gap: f32,

    /// Advance for a blank line
    pub blank_line: f32,

    pub image_max_height: f32,
    pub image_spacing: f32,
    pub caption_font_size: f32,
    pub caption_line_height: f32,
    pub placeholder_font_size: f32,
    pub placeholder_advance: f32,

    pub table_font_size: f32,
    pub cell_padding: f32,
    pub table_line_height: f32,
    /// Vertical padding added to every row
    pub row_padding: f32,
    /// Baseline offset of the first line below the cell's top padding
    pub cell_baseline: f32,
    pub table_spacing: f32,
    pub header_fill: Color,
    pub border_color: Color,

    pub text_color: Color,
    pub link_color: Color,
    /// Height of a link's clickable area
    pub link_height: f32,
    /// Distance from the baseline up to the top of a link's area
    pub link_rise: f32,
}

impl Default for PrintStyle {
    fn default() -> Self {
        Self {
            h1: HeadingStyle {
                font_size: 20.0,
                line_height: 9.0,
                spacing: 6.0,
                reserve: 14.0,
            },
            h2: HeadingStyle {
                font_size: 16.0,
                line_height: 7.0,
                spacing: 5.0,
                reserve: 12.0,
            },
            h3: HeadingStyle {
                font_size: 14.0,
                line_height: 6.0,
                spacing: 4.0,
                reserve: 10.0,
            },
            body_font_size: 11.0,
            body_line_factor: 0.45,
            paragraph_spacing: 2.0,
            bullet: "•".to_string(),
            list_indent: 2.0,
            bullet_text_offset: 5.0,
            number_gap: 2.0,
            blank_line: 4.0,
            image_max_height: 100.0,
            image_spacing: 5.0,
            caption_font_size: 9.0,
            caption_line_height: 4.0,
            placeholder_font_size: 10.0,
            placeholder_advance: 10.0,
            table_font_size: 9.0,
            cell_padding: 2.0,
            table_line_height: 5.0,
            row_padding: 4.0,
            cell_baseline: 3.0,
            table_spacing: 5.0,
            header_fill: Color::rgb(240, 240, 240),
            border_color: Color::rgb(200, 200, 200),
            text_color: Color::BLACK,
            link_color: Color::LINK_BLUE,
            link_height: 5.0,
            link_rise: 3.0,
        }
    }
}

impl PrintStyle {
    /// Style for a heading level; levels past 3 use the level 3 style.
    pub fn heading(&self, level: u8) -> &HeadingStyle {
        match level {
            0 | 1 => &self.h1,
            2 => &self.h2,
            _ => &self.h3,
        }
    }

    /// Body line height.
    pub fn body_line_height(&self) -> f32 {
        self.body_font_size * self.body_line_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_sizes_descend() {
        let style = PrintStyle::default();
        assert!(style.heading(1).font_size > style.heading(2).font_size);
        assert!(style.heading(2).font_size > style.heading(3).font_size);
        assert_eq!(style.heading(9), style.heading(3));
    }

    #[test]
    fn test_body_line_height() {
        let style = PrintStyle::default();
        assert!((style.body_line_height() - 4.95).abs() < 1e-5);
    }

    #[test]
    fn test_color_unit() {
        assert_eq!(Color::LINK_BLUE.unit(), [0.0, 0.0, 1.0]);
    }
}
