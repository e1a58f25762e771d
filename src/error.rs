use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("unable to scan {}: {source}", .root.display())]
    Scan {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to convert {}: {reason}", .path.display())]
    Conversion { path: PathBuf, reason: String },

    #[error("malformed gallery request: {0}")]
    RequestDecode(#[from] serde_json::Error),

    #[error("timed out waiting for {outstanding} thumbnail(s)")]
    WindowTimeout { outstanding: usize },

    #[error("conversion queue is closed")]
    QueueClosed,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GalleryError {
    pub fn conversion(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        GalleryError::Conversion {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the caller may simply repeat the request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GalleryError::WindowTimeout { .. })
    }
}
