use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{
    error::GalleryError,
    fs_utils::default_thumb_dir,
    image_utils::{DEFAULT_QUALITY, DEFAULT_THUMB_HEIGHT},
    window::{Geometry, MAX_QUEUE_CAPACITY},
};

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Serve a scrollable photo gallery with on-demand thumbnails"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3353)]
    pub port: u16,

    /// Directory in which to look for images
    #[arg(short, long, default_value = "./")]
    pub dir: PathBuf,

    /// Number of rows in the gallery view
    #[arg(long, default_value_t = 3)]
    pub rows: usize,

    /// Number of columns in the gallery view
    #[arg(long, default_value_t = 3)]
    pub cols: usize,

    /// Shuffle the images once at startup
    #[arg(long, default_value_t = false)]
    pub randomize: bool,

    /// Seed for --randomize; drawn at random (and logged) when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of thumbnail worker threads
    #[arg(short = 'j', long = "num-workers", default_value_t = 4)]
    pub num_workers: usize,

    /// Rows rendered above and below the visible area (defaults to --rows)
    #[arg(long)]
    pub prefetch_rows: Option<usize>,

    /// Height of generated thumbnails in pixels
    #[arg(long, default_value_t = DEFAULT_THUMB_HEIGHT)]
    pub thumb_height: u32,

    /// JPEG quality of generated thumbnails (1-100)
    #[arg(short, long, default_value_t = DEFAULT_QUALITY)]
    pub quality: u8,

    /// Directory for generated thumbnails, removed on shutdown
    #[arg(long)]
    pub thumb_dir: Option<PathBuf>,

    /// Directory with the gallery's static assets
    #[arg(long, default_value = "assets")]
    pub assets_dir: PathBuf,

    /// Seconds a request waits for its thumbnails before failing
    #[arg(long, default_value_t = 30)]
    pub wait_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct GalleryConfig {
    pub port: u16,
    pub root: PathBuf,
    pub geometry: Geometry,
    pub worker_count: usize,
    pub seed: Option<u64>,
    pub thumb_dir: PathBuf,
    pub thumb_height: u32,
    pub quality: u8,
    pub assets_dir: PathBuf,
    pub wait_timeout: Duration,
}

impl Args {
    pub fn into_config(self) -> Result<GalleryConfig, GalleryError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GalleryError::InvalidConfig(
                "rows and cols must be at least 1".into(),
            ));
        }
        if self.num_workers == 0 {
            return Err(GalleryError::InvalidConfig(
                "num-workers must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(GalleryError::InvalidConfig(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        let capacity = Geometry::new(self.rows, self.cols, 0).checked_queue_capacity();
        if !capacity.is_some_and(|capacity| capacity <= MAX_QUEUE_CAPACITY) {
            return Err(GalleryError::InvalidConfig(format!(
                "a {}x{} grid is too large (at most {} queued thumbnails)",
                self.rows, self.cols, MAX_QUEUE_CAPACITY
            )));
        }
        if self.thumb_height == 0 {
            return Err(GalleryError::InvalidConfig(
                "thumb-height must be at least 1".into(),
            ));
        }

        let seed = match (self.randomize, self.seed) {
            (false, _) => None,
            (true, Some(seed)) => Some(seed),
            (true, None) => Some(rand::random()),
        };

        Ok(GalleryConfig {
            port: self.port,
            root: self.dir,
            geometry: Geometry::new(
                self.rows,
                self.cols,
                self.prefetch_rows.unwrap_or(self.rows),
            ),
            worker_count: self.num_workers,
            seed,
            thumb_dir: self.thumb_dir.unwrap_or_else(default_thumb_dir),
            thumb_height: self.thumb_height,
            quality: self.quality,
            assets_dir: self.assets_dir,
            wait_timeout: Duration::from_secs(self.wait_timeout_secs),
        })
    }
}

impl GalleryConfig {
    /// Configuration with the command-line defaults, rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            port: 3353,
            root: root.into(),
            geometry: Geometry::new(3, 3, 3),
            worker_count: 4,
            seed: None,
            thumb_dir: default_thumb_dir(),
            thumb_height: DEFAULT_THUMB_HEIGHT,
            quality: DEFAULT_QUALITY,
            assets_dir: PathBuf::from("assets"),
            wait_timeout: Duration::from_secs(30),
        }
    }
}
