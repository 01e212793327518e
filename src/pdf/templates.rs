//! Quotation template images and the JPEG decoding used to embed them.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegDecoder;
use image::{ExtendedColorType, ImageDecoder, ImageFormat, ImageReader};

use super::PdfError;

pub const COVER: &str = "page1-cover.jpg";
pub const ABOUT: &str = "page2-about.jpg";
pub const SPECIFICATION: &str = "page3-specification.jpg";
pub const FEATURES: &str = "page4-features.jpg";
pub const PAYMENT_TOP: &str = "page5-payment-top.jpg";
pub const TERMS: [&str; 3] = ["page7-terms1.jpg", "page8-terms2.jpg", "page9-terms3.jpg"];

/// A baseline or progressive JPEG, embedded as-is with `DCTDecode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegImage {
    pub width: u32,
    pub height: u32,
    pub components: u8,
    pub data: Vec<u8>,
}

fn invalid(e: image::ImageError) -> PdfError {
    PdfError::InvalidImage(e.to_string())
}

impl JpegImage {
    /// Decode `data` fully to validate it, keeping the original bytes for
    /// embedding.
    pub fn parse(data: Vec<u8>) -> Result<Self, PdfError> {
        let format = ImageReader::new(Cursor::new(data.as_slice()))
            .with_guessed_format()
            .map_err(|e| PdfError::InvalidImage(e.to_string()))?
            .format();
        if format != Some(ImageFormat::Jpeg) {
            return Err(PdfError::InvalidImage("not a JPEG file".into()));
        }

        let decoder = JpegDecoder::new(Cursor::new(data.as_slice())).map_err(invalid)?;
        let (width, height) = decoder.dimensions();
        if width == 0 || height == 0 {
            return Err(PdfError::InvalidImage("zero image dimension".into()));
        }
        let components = match decoder.original_color_type() {
            ExtendedColorType::L8 => 1,
            ExtendedColorType::Rgb8 => 3,
            ExtendedColorType::Cmyk8 => 4,
            other => {
                return Err(PdfError::InvalidImage(format!(
                    "unsupported colour type {other:?}"
                )))
            }
        };

        // The decoder pads a missing tail, so a cut-off file is caught here
        let body_end = data.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        if !data[..body_end].ends_with(&[0xFF, 0xD9]) {
            return Err(PdfError::InvalidImage("missing end-of-image marker".into()));
        }

        // Corrupt scan data only shows up on a full decode
        let size = usize::try_from(decoder.total_bytes())
            .map_err(|_| PdfError::InvalidImage("image too large".into()))?;
        let mut pixels = vec![0u8; size];
        decoder.read_image(&mut pixels).map_err(invalid)?;

        Ok(JpegImage {
            width,
            height,
            components,
            data,
        })
    }

    pub fn color_space(&self) -> &'static str {
        match self.components {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        }
    }
}

/// Directory holding the page template images, if one was found.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    dir: Option<PathBuf>,
}

impl TemplateSet {
    /// First existing directory among `configured`, `./images/quotations`
    /// and `./backend/images/quotations`.
    pub fn discover(configured: Option<&Path>) -> Self {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(dir) = configured {
            candidates.push(dir.to_path_buf());
        }
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join("images").join("quotations"));
            candidates.push(cwd.join("backend").join("images").join("quotations"));
        }

        let dir = candidates.into_iter().find(|p| p.is_dir());
        match &dir {
            Some(dir) => log::info!("Quotation templates: {}", dir.display()),
            None => log::warn!("No quotation template directory found; PDFs use the text layout"),
        }
        TemplateSet { dir }
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        TemplateSet {
            dir: Some(dir.into()),
        }
    }

    pub fn none() -> Self {
        TemplateSet { dir: None }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Load a template by file name. Missing files are expected; unreadable
    /// or non-JPEG files are logged. Either way the caller falls back.
    pub fn load(&self, name: &str) -> Option<JpegImage> {
        let path = self.dir.as_ref()?.join(name);
        if !path.is_file() {
            return None;
        }
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Could not read template {}: {}", path.display(), e);
                return None;
            }
        };
        match JpegImage::parse(bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("Could not embed template {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;

    /// A real baseline JPEG of flat grey (one component) or a colour
    /// gradient (three components).
    pub(crate) fn tiny_jpeg(width: u32, height: u32, components: u8) -> Vec<u8> {
        let color = match components {
            1 => ExtendedColorType::L8,
            _ => ExtendedColorType::Rgb8,
        };
        let channels = if components == 1 { 1 } else { 3 };
        let pixels: Vec<u8> = (0..width * height * channels)
            .map(|i| (i % 251) as u8)
            .collect();
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, 80)
            .encode(&pixels, width, height, color)
            .unwrap();
        bytes
    }

    #[test]
    fn test_parse_reads_dimensions_and_colour() {
        let image = JpegImage::parse(tiny_jpeg(640, 480, 3)).unwrap();
        assert_eq!((image.width, image.height), (640, 480));
        assert_eq!(image.color_space(), "DeviceRGB");

        let gray = JpegImage::parse(tiny_jpeg(10, 10, 1)).unwrap();
        assert_eq!(gray.color_space(), "DeviceGray");
    }

    #[test]
    fn test_parse_rejects_non_jpeg() {
        assert!(JpegImage::parse(b"\x89PNG\r\n\x1a\n".to_vec()).is_err());
        assert!(JpegImage::parse(vec![0xFF, 0xD8, 0xFF, 0xD9]).is_err());
    }

    #[test]
    fn test_parse_rejects_truncated_jpeg() {
        let full = tiny_jpeg(64, 64, 3);
        let image = JpegImage::parse(full.clone()).unwrap();
        assert_eq!(image.data, full);

        let mut truncated = full;
        truncated.truncate(truncated.len() / 2);
        assert!(JpegImage::parse(truncated).is_err());

        // SOI, SOF0 header, EOI with no scan data
        let mut header_only = vec![0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x11, 0x08];
        header_only.extend_from_slice(&[0x00, 0x10, 0x00, 0x10, 0x03]);
        for id in 1..=3u8 {
            header_only.extend_from_slice(&[id, 0x11, 0x00]);
        }
        header_only.extend_from_slice(&[0xFF, 0xD9]);
        assert!(JpegImage::parse(header_only).is_err());
    }

    #[test]
    fn test_load_falls_back_on_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(COVER), tiny_jpeg(100, 140, 3)).unwrap();
        std::fs::write(dir.path().join(ABOUT), b"not a jpeg").unwrap();

        let templates = TemplateSet::at(dir.path());
        assert!(templates.load(COVER).is_some());
        assert!(templates.load(ABOUT).is_none());
        assert!(templates.load(FEATURES).is_none());
        assert!(TemplateSet::none().load(COVER).is_none());
    }

    #[test]
    fn test_discover_prefers_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let templates = TemplateSet::discover(Some(dir.path()));
        assert_eq!(templates.dir(), Some(dir.path()));
    }
}
