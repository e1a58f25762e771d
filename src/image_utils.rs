use std::{
    fs::File,
    io::{BufWriter, Cursor},
    path::{Path, PathBuf},
    time::Instant,
};

use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, ResizeOptions, Resizer};
use image::{
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
    DynamicImage, ImageFormat, RgbaImage,
};
use tracing::debug;
use zune_jpeg::JpegDecoder;

use crate::{
    error::GalleryError,
    fs_utils::thumb_serving_path,
    gallery::worker::Converter,
    index::GalleryEntry,
};

pub const DEFAULT_THUMB_HEIGHT: u32 = 800;
pub const DEFAULT_QUALITY: u8 = 85;

/// Produces fixed-height thumbnails, width scaled to keep the aspect ratio.
#[derive(Debug, Clone)]
pub struct Thumbnailer {
    pub out_dir: PathBuf,
    pub height: u32,
    pub quality: u8,
}

impl Thumbnailer {
    pub fn new(out_dir: impl Into<PathBuf>, height: u32, quality: u8) -> Self {
        Self {
            out_dir: out_dir.into(),
            height: height.max(1),
            quality,
        }
    }

    /// Writes the thumbnail of `source` to `out_dir` under the source's base
    /// name and returns its serving path (`thumbs/<name>`).
    pub fn create_thumbnail(&self, index: usize, source: &Path) -> Result<String, GalleryError> {
        let start = Instant::now();
        let file_name = source
            .file_name()
            .ok_or_else(|| GalleryError::conversion(source, "no file name"))?;
        let format = ImageFormat::from_path(source)
            .map_err(|err| GalleryError::conversion(source, err))?;

        let image = load_image(source)?;
        let thumb = resize_to_height(&image, self.height)
            .map_err(|reason| GalleryError::conversion(source, reason))?;

        // Entries from different directories may share a base name; the
        // rename keeps concurrent writers from producing a torn file.
        let temp_path = self
            .out_dir
            .join(format!(".{index}-{}.tmp", file_name.to_string_lossy()));
        let final_path = self.out_dir.join(file_name);
        encode(&thumb, format, self.quality, &temp_path)
            .map_err(|reason| GalleryError::conversion(source, reason))?;
        std::fs::rename(&temp_path, &final_path).map_err(|err| {
            let _ = std::fs::remove_file(&temp_path);
            GalleryError::conversion(source, err)
        })?;

        debug!(
            "thumbnail {} -> {} ({}x{}) in {:?}",
            source.display(),
            final_path.display(),
            thumb.width(),
            thumb.height(),
            start.elapsed()
        );
        Ok(thumb_serving_path(file_name))
    }
}

impl Converter for Thumbnailer {
    fn convert(&self, entry: &GalleryEntry) -> Result<String, GalleryError> {
        self.create_thumbnail(entry.index(), entry.source_path())
    }
}

pub fn load_image(path: &Path) -> Result<DynamicImage, GalleryError> {
    let bytes = std::fs::read(path).map_err(|err| GalleryError::conversion(path, err))?;
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.eq_ignore_ascii_case("jpg") || s.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false);

    // zune-jpeg is considerably faster for large JPEGs; anything it cannot
    // handle goes through the generic decoder.
    if is_jpeg {
        if let Some(image) = decode_jpeg(&bytes) {
            return Ok(image);
        }
    }
    image::load_from_memory(&bytes).map_err(|err| GalleryError::conversion(path, err))
}

fn decode_jpeg(bytes: &[u8]) -> Option<DynamicImage> {
    let mut decoder = JpegDecoder::new(Cursor::new(bytes));
    let pixels = decoder.decode().ok()?;
    let info = decoder.info()?;
    image::RgbImage::from_raw(info.width as u32, info.height as u32, pixels)
        .map(DynamicImage::ImageRgb8)
}

pub fn thumbnail_dimensions(width: u32, height: u32, target_height: u32) -> (u32, u32) {
    let target_height = target_height.max(1);
    let ratio = width as f64 / height.max(1) as f64;
    let target_width = (target_height as f64 * ratio).round().max(1.0) as u32;
    (target_width, target_height)
}

pub fn resize_to_height(image: &DynamicImage, target_height: u32) -> Result<DynamicImage, String> {
    let (new_w, new_h) = thumbnail_dimensions(image.width(), image.height(), target_height);
    if (new_w, new_h) == (image.width(), image.height()) {
        return Ok(image.clone());
    }

    let rgba = image.to_rgba8();
    let src_image = Image::from_vec_u8(rgba.width(), rgba.height(), rgba.into_raw(), PixelType::U8x4)
        .map_err(|err| err.to_string())?;
    let mut dst_image = Image::new(new_w, new_h, PixelType::U8x4);
    Resizer::new()
        .resize(&src_image, &mut dst_image, &ResizeOptions::default())
        .map_err(|err| err.to_string())?;

    RgbaImage::from_raw(new_w, new_h, dst_image.into_vec())
        .map(DynamicImage::ImageRgba8)
        .ok_or_else(|| "resized buffer has unexpected size".to_string())
}

fn encode(image: &DynamicImage, format: ImageFormat, quality: u8, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|err| err.to_string())?;
    let writer = BufWriter::new(file);
    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(writer, quality);
            DynamicImage::ImageRgb8(image.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|err| err.to_string())
        }
        ImageFormat::Png => {
            let encoder = PngEncoder::new(writer);
            image
                .write_with_encoder(encoder)
                .map_err(|err| err.to_string())
        }
        other => Err(format!("unsupported thumbnail format {other:?}")),
    }
}
