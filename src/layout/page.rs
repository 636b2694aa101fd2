//! Page geometry and the vertical layout cursor.

use serde::{Deserialize, Serialize};

/// Page size and margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSettings {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for PageSettings {
    /// A4 portrait with 20 mm margins.
    fn default() -> Self {
        Self::a4()
    }
}

impl PageSettings {
    /// A4 portrait, 210 x 297 mm, 20 mm margins.
    pub fn a4() -> Self {
        Self::with_size(210.0, 297.0, 20.0)
    }

    /// US Letter portrait, 215.9 x 279.4 mm, 20 mm margins.
    pub fn letter() -> Self {
        Self::with_size(215.9, 279.4, 20.0)
    }

    /// Custom page with equal margins.
    pub fn with_size(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin_top: margin,
            margin_bottom: margin,
            margin_left: margin,
            margin_right: margin,
        }
    }

    /// Width available for content.
    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// Height available for content.
    pub fn content_height(&self) -> f32 {
        self.bottom() - self.margin_top
    }

    /// Lowest y position content may reach.
    pub fn bottom(&self) -> f32 {
        self.height - self.margin_bottom
    }
}

/// Current page and vertical draw position.
///
/// `y` grows downward from the top edge of the page. The cursor only moves
/// forward: within a page `y` increases, and a page break moves to the next
/// page with `y` back at the top margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutCursor {
    pub page_index: usize,
    pub y: f32,
}

impl LayoutCursor {
    /// Cursor at the top of the first page.
    pub fn new(settings: &PageSettings) -> Self {
        Self {
            page_index: 0,
            y: settings.margin_top,
        }
    }

    /// Move down by `dy`.
    pub fn advance(&mut self, dy: f32) {
        self.y += dy.max(0.0);
    }

    /// Move to the top of the next page.
    pub fn next_page(&mut self, settings: &PageSettings) {
        self.page_index += 1;
        self.y = settings.margin_top;
    }

    /// Room left on the current page.
    pub fn remaining(&self, settings: &PageSettings) -> f32 {
        settings.bottom() - self.y
    }

    /// Check if the cursor sits at the top of its page.
    pub fn at_page_top(&self, settings: &PageSettings) -> bool {
        self.y <= settings.margin_top
    }

    /// Check if `height` more content fits on the current page.
    pub fn fits(&self, height: f32, settings: &PageSettings) -> bool {
        self.y + height <= settings.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_geometry() {
        let page = PageSettings::default();
        assert_eq!(page.content_width(), 170.0);
        assert_eq!(page.bottom(), 277.0);
        assert_eq!(page.content_height(), 257.0);
    }

    #[test]
    fn test_letter() {
        let page = PageSettings::letter();
        assert!((page.content_width() - 175.9).abs() < 1e-3);
    }

    #[test]
    fn test_cursor_moves_forward() {
        let page = PageSettings::default();
        let mut cursor = LayoutCursor::new(&page);
        assert!(cursor.at_page_top(&page));

        cursor.advance(100.0);
        cursor.advance(-50.0);
        assert_eq!(cursor.y, 120.0);
        assert_eq!(cursor.remaining(&page), 157.0);
        assert!(cursor.fits(157.0, &page));
        assert!(!cursor.fits(157.5, &page));

        cursor.next_page(&page);
        assert_eq!(cursor.page_index, 1);
        assert_eq!(cursor.y, 20.0);
    }
}
