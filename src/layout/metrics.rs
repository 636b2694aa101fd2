//! Font metrics.
//!
//! Layout never talks to a real text shaper. It asks a [`TextMeasure`] for
//! the advance width of a string in one of the five print fonts, so tests
//! can swap in [`FixedWidthMetrics`] and get exact, predictable positions.

use serde::{Deserialize, Serialize};

/// Millimetres per typographic point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

/// Font face used to draw a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontVariant {
    /// Helvetica
    Regular,
    /// Helvetica-Bold
    Bold,
    /// Helvetica-Oblique
    Italic,
    /// Helvetica-BoldOblique
    BoldItalic,
    /// Courier
    Mono,
}

impl FontVariant {
    /// All variants, in resource order.
    pub const ALL: [FontVariant; 5] = [
        FontVariant::Regular,
        FontVariant::Bold,
        FontVariant::Italic,
        FontVariant::BoldItalic,
        FontVariant::Mono,
    ];

    /// Pick the face for a run's style flags. Code wins over emphasis.
    pub fn for_style(bold: bool, italic: bool, code: bool) -> Self {
        match (code, bold, italic) {
            (true, _, _) => FontVariant::Mono,
            (false, true, true) => FontVariant::BoldItalic,
            (false, true, false) => FontVariant::Bold,
            (false, false, true) => FontVariant::Italic,
            (false, false, false) => FontVariant::Regular,
        }
    }

    /// PostScript name of the base-14 font.
    pub fn base_font(&self) -> &'static str {
        match self {
            FontVariant::Regular => "Helvetica",
            FontVariant::Bold => "Helvetica-Bold",
            FontVariant::Italic => "Helvetica-Oblique",
            FontVariant::BoldItalic => "Helvetica-BoldOblique",
            FontVariant::Mono => "Courier",
        }
    }

    /// Resource name used inside page content streams.
    pub fn resource_name(&self) -> &'static str {
        match self {
            FontVariant::Regular => "F1",
            FontVariant::Bold => "F2",
            FontVariant::Italic => "F3",
            FontVariant::BoldItalic => "F4",
            FontVariant::Mono => "F5",
        }
    }

    fn is_bold(&self) -> bool {
        matches!(self, FontVariant::Bold | FontVariant::BoldItalic)
    }
}

/// Text measurement capability.
pub trait TextMeasure: Send + Sync {
    /// Advance width of `text` in millimetres.
    fn measure(&self, text: &str, font: FontVariant, size_pt: f32) -> f32;
}

/// Advance widths of the standard Helvetica and Courier fonts.
///
/// Widths come from the Adobe base-14 font metrics, in 1/1000 em. The
/// oblique faces share the upright widths. Characters outside printable
/// ASCII fall back to an average width, or a full em for wide scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelveticaMetrics;

impl HelveticaMetrics {
    /// Create the metrics table.
    pub fn new() -> Self {
        Self
    }

    fn char_units(ch: char, font: FontVariant) -> u16 {
        if font == FontVariant::Mono {
            return 600;
        }

        let code = ch as u32;
        if (32..127).contains(&code) {
            let idx = (code - 32) as usize;
            return if font.is_bold() {
                HELVETICA_BOLD[idx]
            } else {
                HELVETICA[idx]
            };
        }

        match ch {
            '•' => 350,
            '\u{2013}' => 556,
            '\u{2014}' => 1000,
            '\u{2018}' | '\u{2019}' => 222,
            '\u{201C}' | '\u{201D}' => 333,
            c if is_wide(c) => 1000,
            _ if font.is_bold() => 611,
            _ => 556,
        }
    }
}

impl TextMeasure for HelveticaMetrics {
    fn measure(&self, text: &str, font: FontVariant, size_pt: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|c| u32::from(Self::char_units(c, font)))
            .sum();
        units as f32 / 1000.0 * size_pt * MM_PER_PT
    }
}

/// Every character has the same advance: `em_fraction` of the font size.
///
/// Deterministic stand-in for real metrics in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedWidthMetrics {
    /// Advance per character as a fraction of one em
    pub em_fraction: f32,
}

impl Default for FixedWidthMetrics {
    fn default() -> Self {
        Self { em_fraction: 0.5 }
    }
}

impl FixedWidthMetrics {
    /// Create fixed metrics with the given advance per character.
    pub fn new(em_fraction: f32) -> Self {
        Self { em_fraction }
    }

    /// Advance of one character in millimetres.
    pub fn char_width(&self, size_pt: f32) -> f32 {
        self.em_fraction * size_pt * MM_PER_PT
    }
}

impl TextMeasure for FixedWidthMetrics {
    fn measure(&self, text: &str, _font: FontVariant, size_pt: f32) -> f32 {
        text.chars().count() as f32 * self.char_width(size_pt)
    }
}

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x3FFFD)
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_for_style() {
        assert_eq!(FontVariant::for_style(false, false, false), FontVariant::Regular);
        assert_eq!(FontVariant::for_style(true, true, false), FontVariant::BoldItalic);
        assert_eq!(FontVariant::for_style(true, false, true), FontVariant::Mono);
    }

    #[test]
    fn test_resource_names_unique() {
        let mut names: Vec<_> = FontVariant::ALL.iter().map(|f| f.resource_name()).collect();
        names.dedup();
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_helvetica_space_width() {
        // 278/1000 em at 10pt
        let width = HelveticaMetrics.measure(" ", FontVariant::Regular, 10.0);
        assert!((width - 2.78 * MM_PER_PT).abs() < 1e-4);
    }

    #[test]
    fn test_bold_is_wider() {
        let metrics = HelveticaMetrics::new();
        let regular = metrics.measure("bold text", FontVariant::Regular, 11.0);
        let bold = metrics.measure("bold text", FontVariant::Bold, 11.0);
        assert!(bold > regular);
    }

    #[test]
    fn test_courier_is_monospaced() {
        let metrics = HelveticaMetrics::new();
        let a = metrics.measure("iiii", FontVariant::Mono, 9.0);
        let b = metrics.measure("WWWW", FontVariant::Mono, 9.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_wide_chars() {
        let metrics = HelveticaMetrics::new();
        let han = metrics.measure("한", FontVariant::Regular, 10.0);
        assert!((han - 10.0 * MM_PER_PT).abs() < 1e-4);
    }

    #[test]
    fn test_fixed_width() {
        let metrics = FixedWidthMetrics::default();
        let width = metrics.measure("abcd", FontVariant::Bold, 12.0);
        assert!((width - 4.0 * 6.0 * MM_PER_PT).abs() < 1e-4);
    }
}
