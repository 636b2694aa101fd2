//! Export options and configuration.

use chrono::NaiveDateTime;

use crate::layout::{PageSettings, PrintStyle};

/// Default artifact filename stem.
pub const DEFAULT_STEM: &str = "research-report";

/// Default document title.
pub const DEFAULT_TITLE: &str = "Research Report";

/// Options shared by all export backends.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Filename stem, before the timestamp
    pub file_stem: String,

    /// Title used when the caller's title hint is blank
    pub default_title: String,

    /// Fixed filename timestamp (local time is used when unset)
    pub timestamp: Option<NaiveDateTime>,

    /// Print page geometry
    pub page: PageSettings,

    /// Print typography
    pub print_style: PrintStyle,

    /// Image backend settings
    pub image: ImageSettings,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_stem: DEFAULT_STEM.to_string(),
            default_title: DEFAULT_TITLE.to_string(),
            timestamp: None,
            page: PageSettings::default(),
            print_style: PrintStyle::default(),
            image: ImageSettings::default(),
        }
    }
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filename stem.
    pub fn with_file_stem(mut self, stem: impl Into<String>) -> Self {
        self.file_stem = stem.into();
        self
    }

    /// Set the fallback title.
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    /// Pin the filename timestamp.
    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the page geometry.
    pub fn with_page(mut self, page: PageSettings) -> Self {
        self.page = page;
        self
    }

    /// Set the print typography.
    pub fn with_print_style(mut self, style: PrintStyle) -> Self {
        self.print_style = style;
        self
    }

    /// Set the image backend settings.
    pub fn with_image_settings(mut self, image: ImageSettings) -> Self {
        self.image = image;
        self
    }

    /// Timestamp for the next artifact.
    pub fn resolve_timestamp(&self) -> NaiveDateTime {
        self.timestamp
            .unwrap_or_else(|| chrono::Local::now().naive_local())
    }

    /// The caller's title, or the default title if the hint is blank.
    pub fn resolve_title<'a>(&'a self, hint: &'a str) -> &'a str {
        let hint = hint.trim();
        if hint.is_empty() {
            &self.default_title
        } else {
            hint
        }
    }
}

/// Settings for the rasterized image backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSettings {
    /// Width of the offscreen container (CSS px)
    pub width_px: u32,

    /// Padding inside the container (CSS px)
    pub padding_px: u32,

    /// Device pixel ratio used when rasterizing
    pub scale: f32,

    /// Container background colour
    pub background: String,

    /// Default text colour
    pub foreground: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            width_px: 800,
            padding_px: 40,
            scale: 2.0,
            background: "#ffffff".to_string(),
            foreground: "#000000".to_string(),
        }
    }
}

impl ImageSettings {
    /// Create image settings with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rasterization scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale.max(0.1);
        self
    }

    /// Set the container width.
    pub fn with_width(mut self, width_px: u32) -> Self {
        self.width_px = width_px;
        self
    }

    /// Full rendered width in pixels, padding included.
    pub fn outer_width_px(&self) -> u32 {
        self.width_px + 2 * self.padding_px
    }
}
