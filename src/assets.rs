//! Image fetching and decoding.
//!
//! Backends that embed images ask an [`ImageSource`] for the raw bytes
//! behind a URL, then decode them with the `image` crate. Any failure here
//! is recoverable: the print backend draws a placeholder instead.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{Error, Result};

/// Image fetch capability.
pub trait ImageSource: Send + Sync {
    /// Fetch the encoded bytes behind `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Resolves `data:` URLs, `file://` URLs and plain file paths.
///
/// Relative paths are resolved against `base_dir` when one is set. Network
/// URLs are refused; wrap this source in one that speaks HTTP if needed.
#[derive(Debug, Clone, Default)]
pub struct LocalImageSource {
    base_dir: Option<PathBuf>,
}

impl LocalImageSource {
    /// Create a source that resolves relative paths against the working
    /// directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageSource for LocalImageSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let url = url.trim();

        if let Some(rest) = url.strip_prefix("data:") {
            return decode_data_url(rest);
        }

        let path = match url.strip_prefix("file://") {
            Some(path) => path,
            None if url.contains("://") => {
                return Err(Error::ImageFetch(format!("unsupported URL scheme: {}", url)));
            }
            None => url,
        };

        let resolved = self.resolve(path);
        fs::read(&resolved)
            .map_err(|e| Error::ImageFetch(format!("{}: {}", resolved.display(), e)))
    }
}

fn decode_data_url(rest: &str) -> Result<Vec<u8>> {
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| Error::ImageFetch("malformed data URL".to_string()))?;

    if header.ends_with(";base64") {
        STANDARD
            .decode(data.trim())
            .map_err(|e| Error::ImageFetch(format!("invalid base64 data URL: {}", e)))
    } else {
        Ok(data.as_bytes().to_vec())
    }
}

/// A decoded raster image, flattened to 8-bit RGB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB samples, `width * height * 3` bytes
    pub rgb: Vec<u8>,
}

impl DecodedImage {
    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Decode an encoded image, compositing any transparency onto white.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::ImageDecode("image has no pixels".to_string()));
    }

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        for channel in [r, g, b] {
            let blended = (u16::from(channel) * alpha + 255 * (255 - alpha)) / 255;
            rgb.push(blended as u8);
        }
    }

    Ok(DecodedImage { width, height, rgb })
}

/// Fetch and decode in one step.
pub fn load_image(source: &dyn ImageSource, url: &str) -> Result<DecodedImage> {
    let bytes = source.fetch(url)?;
    decode_image(&bytes)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    pub(crate) fn png_bytes(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(pixel));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let decoded = decode_image(&png_bytes(4, 2, [10, 20, 30, 255])).unwrap();
        assert_eq!((decoded.width, decoded.height), (4, 2));
        assert_eq!(decoded.rgb.len(), 4 * 2 * 3);
        assert_eq!(&decoded.rgb[..3], &[10, 20, 30]);
        assert_eq!(decoded.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_transparent_becomes_white() {
        let decoded = decode_image(&png_bytes(1, 1, [0, 0, 0, 0])).unwrap();
        assert_eq!(decoded.rgb, vec![255, 255, 255]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            decode_image(b"not an image"),
            Err(Error::ImageDecode(_))
        ));
    }

    #[test]
    fn test_data_url() {
        let png = png_bytes(1, 1, [1, 2, 3, 255]);
        let url = format!("data:image/png;base64,{}", STANDARD.encode(&png));
        let fetched = LocalImageSource::new().fetch(&url).unwrap();
        assert_eq!(fetched, png);
    }

    #[test]
    fn test_file_relative_to_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("chart.png"), b"bytes").unwrap();

        let source = LocalImageSource::new().with_base_dir(dir.path());
        assert_eq!(source.fetch("chart.png").unwrap(), b"bytes");

        let url = format!("file://{}", dir.path().join("chart.png").display());
        assert_eq!(LocalImageSource::new().fetch(&url).unwrap(), b"bytes");
    }

    #[test]
    fn test_network_url_refused() {
        let err = LocalImageSource::new()
            .fetch("https://example.invalid/a.png")
            .unwrap_err();
        assert!(matches!(err, Error::ImageFetch(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = LocalImageSource::new()
            .fetch("/definitely/not/here.png")
            .unwrap_err();
        assert!(matches!(err, Error::ImageFetch(_)));
    }
}
