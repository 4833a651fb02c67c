//! Core types shared by the `calib-sheets-*` crates.
//!
//! This crate is intentionally small: an 8-bit grayscale raster with
//! bounds-checked composition, and the stderr logger used by the CLI.

mod image;
mod logger;

pub use image::{GrayImage, GrayImageView, ImageError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
