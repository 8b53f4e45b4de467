use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::capture::domain::frame_source::{FrameSource, Resolution};
use crate::imaging::domain::encoded_image::EncodedImage;
use crate::shared::constants::{CAPTURE_MIME, IMAGE_EXTENSIONS};

const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Camera stand-in backed by a still image or a directory of images.
///
/// A directory is replayed in file-name order, one image per capture,
/// wrapping around at the end. The directory is re-listed on every capture
/// so frames can be dropped in while the loop runs. Frames are resized to
/// fit the hint (aspect ratio preserved) and re-encoded as JPEG.
pub struct ImageFileFrameSource {
    path: PathBuf,
    cursor: usize,
    quality: u8,
}

impl ImageFileFrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cursor: 0,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn next_file(&mut self) -> Option<PathBuf> {
        if self.path.is_file() {
            return Some(self.path.clone());
        }

        let files = list_images(&self.path);
        if files.is_empty() {
            return None;
        }
        let file = files[self.cursor % files.len()].clone();
        self.cursor = (self.cursor + 1) % files.len();
        Some(file)
    }

    fn encode(&self, img: DynamicImage) -> Result<EncodedImage, image::ImageError> {
        let rgb = img.to_rgb8();
        let mut buf = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, self.quality))?;
        Ok(EncodedImage::encode(CAPTURE_MIME, &buf))
    }
}

impl FrameSource for ImageFileFrameSource {
    fn capture(&mut self, hint: Option<Resolution>) -> Option<EncodedImage> {
        let Some(file) = self.next_file() else {
            log::debug!("No frame available under {}", self.path.display());
            return None;
        };

        let img = match image::open(&file) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Failed to read frame {}: {e}", file.display());
                return None;
            }
        };

        let img = match hint {
            Some(res) if res.width > 0 && res.height > 0 => fit_to(img, res),
            _ => img,
        };

        match self.encode(img) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                log::warn!("Failed to encode frame {}: {e}", file.display());
                None
            }
        }
    }
}

fn fit_to(img: DynamicImage, res: Resolution) -> DynamicImage {
    if img.width() == res.width && img.height() == res.height {
        return img;
    }
    img.resize(res.width, res.height, FilterType::Triangle)
}

fn list_images(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    files.sort();
    files
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::domain::image_transcoder::transcode;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_image(dir: &Path, name: &str, w: u32, h: u32, shade: u8) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(w, h, Rgb([shade, shade, shade]))
            .save(&path)
            .unwrap();
        path
    }

    fn decoded_dims(encoded: &EncodedImage) -> (u32, u32) {
        let binary = transcode(encoded).unwrap();
        let img = image::load_from_memory(binary.bytes()).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_single_file_produces_jpeg_data_uri() {
        let tmp = TempDir::new().unwrap();
        let path = write_image(tmp.path(), "face.png", 32, 24, 200);

        let mut source = ImageFileFrameSource::new(&path);
        let encoded = source.capture(None).unwrap();

        assert!(encoded.as_str().starts_with("data:image/jpeg;base64,"));
        assert_eq!(decoded_dims(&encoded), (32, 24));
    }

    #[test]
    fn test_hint_resizes_preserving_aspect() {
        let tmp = TempDir::new().unwrap();
        let path = write_image(tmp.path(), "face.png", 1280, 720, 10);

        let mut source = ImageFileFrameSource::new(&path);
        let encoded = source.capture(Some(Resolution::new(640, 360))).unwrap();

        assert_eq!(decoded_dims(&encoded), (640, 360));
    }

    #[test]
    fn test_zero_hint_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let path = write_image(tmp.path(), "face.png", 40, 30, 10);

        let mut source = ImageFileFrameSource::new(&path);
        let encoded = source.capture(Some(Resolution::new(0, 0))).unwrap();

        assert_eq!(decoded_dims(&encoded), (40, 30));
    }

    #[test]
    fn test_directory_cycles_in_name_order() {
        let tmp = TempDir::new().unwrap();
        write_image(tmp.path(), "b.png", 8, 8, 0);
        write_image(tmp.path(), "a.png", 16, 16, 0);
        fs::write(tmp.path().join("notes.txt"), b"not an image").unwrap();

        let mut source = ImageFileFrameSource::new(tmp.path());
        let dims: Vec<_> = (0..3)
            .map(|_| decoded_dims(&source.capture(None).unwrap()))
            .collect();

        assert_eq!(dims, vec![(16, 16), (8, 8), (16, 16)]);
    }

    #[test]
    fn test_empty_directory_returns_none() {
        let tmp = TempDir::new().unwrap();
        let mut source = ImageFileFrameSource::new(tmp.path());
        assert!(source.capture(None).is_none());
    }

    #[test]
    fn test_missing_path_returns_none() {
        let tmp = TempDir::new().unwrap();
        let mut source = ImageFileFrameSource::new(tmp.path().join("nope"));
        assert!(source.capture(None).is_none());
    }

    #[test]
    fn test_unreadable_image_returns_none() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        fs::write(&path, b"definitely not a jpeg").unwrap();

        let mut source = ImageFileFrameSource::new(&path);
        assert!(source.capture(None).is_none());
    }

    #[test]
    fn test_quality_is_clamped() {
        let source = ImageFileFrameSource::new("x").with_quality(0);
        assert_eq!(source.quality, 1);
        let source = ImageFileFrameSource::new("x").with_quality(255);
        assert_eq!(source.quality, 100);
    }
}
