use std::{
    ffi::OsStr,
    fs, io,
    path::{Component, Path, PathBuf},
};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::GalleryError;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub const SERVING_PREFIX: &str = "imgs";
pub const THUMB_PREFIX: &str = "thumbs";
pub const DEFAULT_THUMB_DIR: &str = "thumbgallery-thumbs";

/// Recursively collects every supported image below `root`, siblings in file name order.
pub fn collect_images(root: &Path) -> Result<Vec<PathBuf>, GalleryError> {
    let scan_error = |source: io::Error| GalleryError::Scan {
        root: root.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(root).map_err(scan_error)?;
    if !metadata.is_dir() {
        return Err(scan_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a directory",
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(scan_error(err.into())),
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            files.push(entry.into_path());
        }
    }
    info!("found {} images below {}", files.len(), root.display());
    Ok(files)
}

/// Extension match is case-sensitive: `photo.JPG` is not picked up.
pub fn is_supported_image(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext)
    )
}

/// URL path under which the full-resolution file is served, e.g. `imgs/trip/a.jpg`.
pub fn serving_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    format!("{SERVING_PREFIX}/{}", parts.join("/"))
}

pub fn thumb_serving_path(file_name: &OsStr) -> String {
    format!("{THUMB_PREFIX}/{}", file_name.to_string_lossy())
}

pub fn default_thumb_dir() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_THUMB_DIR)
}

pub fn prepare_dir(dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}

pub fn remove_dir(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
