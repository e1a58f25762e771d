pub mod config;
pub mod error;
pub mod fs_utils;
pub mod gallery;
pub mod image_utils;
pub mod index;
pub mod server;
pub mod view;
pub mod window;
