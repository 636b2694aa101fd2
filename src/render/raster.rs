//! Rasterized image output.
//!
//! The report is rendered to sanitized HTML, placed in a fixed-width
//! container page on an [`OffscreenSurface`], rasterized by a [`Rasterizer`]
//! and encoded to PNG. The surface owns a temporary directory that is
//! removed when it is dropped, so nothing is left behind whether
//! rasterization succeeds or fails.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::{ImageFormat, RgbaImage};
use tempfile::TempDir;

use super::html::render_fragment;
use super::options::ImageSettings;
use super::sanitize::HtmlSanitizer;
use crate::error::{Error, Result};

/// Element styles applied inside the container.
const CONTAINER_STYLE: &str = "* { color: #000000; } \
    h1,h2,h3,h4,h5,h6 { color: #333333; } \
    a { color: #0066cc; } \
    code { background-color: #f5f5f5; padding: 2px 4px; } \
    pre { background-color: #f5f5f5; padding: 12px; }";

const SURFACE_FILE: &str = "surface.html";

/// Offscreen HTML rasterizer capability.
pub trait Rasterizer: Send + Sync {
    /// Render the surface at `scale` device pixels per CSS pixel.
    fn rasterize(&self, surface: &OffscreenSurface, scale: f32) -> Result<RgbaImage>;
}

/// A temporary page holding the container document.
///
/// Dropping the surface deletes its directory and everything a rasterizer
/// wrote into it.
#[derive(Debug)]
pub struct OffscreenSurface {
    dir: TempDir,
    html: String,
    width_px: u32,
}

impl OffscreenSurface {
    /// Write `html` to a fresh temporary directory.
    pub fn create(html: String, width_px: u32) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("research-export-")
            .tempdir()?;
        fs::write(dir.path().join(SURFACE_FILE), html.as_bytes())?;
        log::debug!("Created offscreen surface at {}", dir.path().display());

        Ok(Self {
            dir,
            html,
            width_px,
        })
    }

    /// Directory owned by this surface.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the container document.
    pub fn html_path(&self) -> PathBuf {
        self.dir.path().join(SURFACE_FILE)
    }

    /// Scratch path for rasterizer output, inside the surface directory.
    pub fn output_path(&self, extension: &str) -> PathBuf {
        self.dir.path().join(format!("surface.{}", extension))
    }

    /// The container document.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Outer width of the container, padding included (CSS px).
    pub fn width_px(&self) -> u32 {
        self.width_px
    }
}

/// Build the fixed-width container document around a sanitized fragment.
pub fn container_document(fragment: &str, settings: &ImageSettings) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>{style}</style>\n</head>\n\
         <body style=\"margin: 0; background-color: {bg};\">\n\
         <div style=\"width: {width}px; padding: {pad}px; font-family: Arial, sans-serif; \
         line-height: 1.6; background-color: {bg}; color: {fg};\">\n{fragment}\n</div>\n</body>\n</html>",
        style = CONTAINER_STYLE,
        bg = settings.background,
        fg = settings.foreground,
        width = settings.width_px,
        pad = settings.padding_px,
        fragment = fragment,
    )
}

/// Rasterizes through an external `wkhtmltoimage` binary.
#[derive(Debug, Clone)]
pub struct CommandRasterizer {
    program: PathBuf,
}

impl CommandRasterizer {
    /// Binary name looked up on `PATH`.
    pub const PROGRAM: &'static str = "wkhtmltoimage";

    /// Use the binary at `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find the binary on `PATH`.
    pub fn detect() -> Option<Self> {
        match which::which(Self::PROGRAM) {
            Ok(path) => {
                log::debug!("Found rasterizer at {}", path.display());
                Some(Self::new(path))
            }
            Err(_) => None,
        }
    }

    /// Path of the binary.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Rasterizer for CommandRasterizer {
    fn rasterize(&self, surface: &OffscreenSurface, scale: f32) -> Result<RgbaImage> {
        let output = surface.output_path("png");
        let width = (surface.width_px() as f32 * scale).round() as u32;

        let result = Command::new(&self.program)
            .arg("--quiet")
            .args(["--format", "png"])
            .args(["--width", &width.to_string()])
            .args(["--zoom", &format!("{:.2}", scale)])
            .arg("--enable-local-file-access")
            .arg(surface.html_path())
            .arg(&output)
            .output()
            .map_err(|e| Error::Rasterize(format!("{}: {}", self.program.display(), e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::Rasterize(format!(
                "{} exited with {}: {}",
                Self::PROGRAM,
                result.status,
                stderr.trim()
            )));
        }

        let image = image::open(&output)
            .map_err(|e| Error::Rasterize(format!("unreadable output: {}", e)))?;
        Ok(image.to_rgba8())
    }
}

/// Encode an RGBA bitmap as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| Error::Export(format!("PNG encoding failed: {}", e)))?;
    Ok(out.into_inner())
}

/// Image renderer: markdown to PNG bytes.
pub struct ImageRenderer<'a> {
    sanitizer: &'a dyn HtmlSanitizer,
    rasterizer: Option<&'a dyn Rasterizer>,
    settings: &'a ImageSettings,
}

impl<'a> ImageRenderer<'a> {
    /// Create a renderer. Without a rasterizer every render fails with
    /// [`Error::MissingCapability`].
    pub fn new(
        sanitizer: &'a dyn HtmlSanitizer,
        rasterizer: Option<&'a dyn Rasterizer>,
        settings: &'a ImageSettings,
    ) -> Self {
        Self {
            sanitizer,
            rasterizer,
            settings,
        }
    }

    /// Render `markdown` to PNG bytes.
    pub fn render(&self, markdown: &str) -> Result<Vec<u8>> {
        let rasterizer = self
            .rasterizer
            .ok_or(Error::MissingCapability("rasterizer"))?;

        let fragment = render_fragment(markdown, self.sanitizer);
        let html = container_document(&fragment, self.settings);
        let surface = OffscreenSurface::create(html, self.settings.outer_width_px())?;

        let bitmap = rasterizer.rasterize(&surface, self.settings.scale)?;
        log::debug!(
            "Rasterized surface to {}x{} px",
            bitmap.width(),
            bitmap.height()
        );
        drop(surface);

        encode_png(&bitmap)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::render::sanitize::AllowlistSanitizer;
    use image::Rgba;
    use std::sync::Mutex;

    /// Rasterizer stand-in: records what it saw and paints a flat bitmap.
    #[derive(Default)]
    pub(crate) struct RecordingRasterizer {
        pub seen: Mutex<Vec<(PathBuf, String)>>,
        pub fail: bool,
    }

    impl Rasterizer for RecordingRasterizer {
        fn rasterize(&self, surface: &OffscreenSurface, scale: f32) -> Result<RgbaImage> {
            assert!(surface.html_path().exists());
            self.seen
                .lock()
                .unwrap()
                .push((surface.dir().to_path_buf(), surface.html().to_string()));
            if self.fail {
                return Err(Error::Rasterize("boom".into()));
            }
            let width = (surface.width_px() as f32 * scale) as u32;
            Ok(RgbaImage::from_pixel(width, 20, Rgba([255, 255, 255, 255])))
        }
    }

    #[test]
    fn test_container_document() {
        let html = container_document("<p>x</p>", &ImageSettings::default());
        assert!(html.contains("width: 800px; padding: 40px;"));
        assert!(html.contains("font-family: Arial, sans-serif"));
        assert!(html.contains("a { color: #0066cc; }"));
        assert!(html.contains("<p>x</p>"));
    }

    #[test]
    fn test_missing_rasterizer() {
        let sanitizer = AllowlistSanitizer::new();
        let settings = ImageSettings::default();
        let err = ImageRenderer::new(&sanitizer, None, &settings)
            .render("# Hi")
            .unwrap_err();
        assert!(matches!(err, Error::MissingCapability("rasterizer")));
    }

    #[test]
    fn test_render_png_and_cleanup() {
        let sanitizer = AllowlistSanitizer::new();
        let settings = ImageSettings::default();
        let rasterizer = RecordingRasterizer::default();

        let png = ImageRenderer::new(&sanitizer, Some(&rasterizer), &settings)
            .render("# Hi\n\n<script>alert(1)</script>")
            .unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 1760);

        let seen = rasterizer.seen.lock().unwrap();
        let (dir, html) = &seen[0];
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(!html.contains("<script>"));
        assert!(!dir.exists());
    }

    #[test]
    fn test_cleanup_on_failure() {
        let sanitizer = AllowlistSanitizer::new();
        let settings = ImageSettings::default();
        let rasterizer = RecordingRasterizer {
            fail: true,
            ..Default::default()
        };

        let err = ImageRenderer::new(&sanitizer, Some(&rasterizer), &settings)
            .render("text")
            .unwrap_err();
        assert!(matches!(err, Error::Rasterize(_)));

        let seen = rasterizer.seen.lock().unwrap();
        assert!(!seen[0].0.exists());
    }

    #[test]
    fn test_surface_removed_on_drop() {
        let surface = OffscreenSurface::create("<p/>".into(), 880).unwrap();
        let dir = surface.dir().to_path_buf();
        fs::write(surface.output_path("png"), b"x").unwrap();
        assert!(dir.exists());
        drop(surface);
        assert!(!dir.exists());
    }
}
