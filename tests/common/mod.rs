#![allow(dead_code)]

use image::{DynamicImage, Rgba, RgbaImage};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use thumbgallery::config::GalleryConfig;
use thumbgallery::error::GalleryError;
use thumbgallery::gallery::worker::Converter;
use thumbgallery::index::{EntryIndex, GalleryEntry};
use thumbgallery::window::Geometry;

pub fn solid_image(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
    let pixel = Rgba(color);
    let buffer = RgbaImage::from_pixel(width, height, pixel);
    DynamicImage::ImageRgba8(buffer)
}

pub fn write_image(path: impl Into<PathBuf>, image: &DynamicImage) {
    let path = path.into();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let image = if path.extension().is_some_and(|e| e == "png") {
        image.clone()
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    };
    image.save(path).expect("failed to write image to disk");
}

/// In-memory arena of `count` entries that never touch the file system.
pub fn synthetic_entries(count: usize) -> Arc<EntryIndex> {
    let entries = (0..count)
        .map(|idx| {
            GalleryEntry::new(
                idx,
                PathBuf::from(format!("/gallery/img{idx:03}.jpg")),
                format!("imgs/img{idx:03}.jpg"),
            )
        })
        .collect();
    Arc::new(EntryIndex::from_entries(entries))
}

pub fn test_config(root: &Path, rows: usize, columns: usize, workers: usize) -> GalleryConfig {
    let mut config = GalleryConfig::with_root(root);
    config.geometry = Geometry::new(rows, columns, rows);
    config.worker_count = workers;
    config.wait_timeout = Duration::from_secs(10);
    config
}

/// Converter that records how often each entry was converted.
#[derive(Default)]
pub struct CountingConverter {
    pub calls: Mutex<HashMap<usize, usize>>,
    pub delay: Duration,
    pub fail: Vec<usize>,
    pub panic_on: Vec<usize>,
}

impl CountingConverter {
    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Default::default()
        })
    }

    pub fn failing(fail: Vec<usize>) -> Arc<Self> {
        Arc::new(Self {
            fail,
            ..Default::default()
        })
    }

    pub fn panicking(panic_on: Vec<usize>) -> Arc<Self> {
        Arc::new(Self {
            panic_on,
            ..Default::default()
        })
    }

    pub fn count(&self, index: usize) -> usize {
        self.calls.lock().unwrap().get(&index).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

impl Converter for CountingConverter {
    fn convert(&self, entry: &GalleryEntry) -> Result<String, GalleryError> {
        thread::sleep(self.delay);
        *self.calls.lock().unwrap().entry(entry.index()).or_default() += 1;
        if self.fail.contains(&entry.index()) {
            return Err(GalleryError::conversion(entry.source_path(), "corrupt image"));
        }
        if self.panic_on.contains(&entry.index()) {
            panic!("decoder crashed on entry {}", entry.index());
        }
        Ok(format!("thumbs/img{:03}.jpg", entry.index()))
    }
}
