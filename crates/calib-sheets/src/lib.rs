//! Facade crate for the `calib-sheets-*` workspace.
//!
//! This crate provides:
//! - re-exports of the raster, dictionary, board and print crates,
//! - (feature `image`) helpers that decode arbitrary image files and run the
//!   marker detector on them,
//! - (feature `cli`) the `calib-sheets` binary.
//!
//! ## Quickstart
//!
//! ```no_run
//! use calib_sheets::print::{MarkerGridConfig, MarkerGridJob};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let job = MarkerGridJob::new(MarkerGridConfig::default())?;
//! let (sheet, canvas) = job.run()?;
//! job.verify(&canvas).ensure_complete()?;
//! println!("wrote {}", sheet.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `calib_sheets::core`: grayscale raster and logger.
//! - `calib_sheets::aruco`: dictionaries, marker rendering and detection.
//! - `calib_sheets::charuco`: ChArUco board layout and rasterization.
//! - `calib_sheets::print`: print jobs, PNG output and the self-check.
//! - `calib_sheets::detect` (feature `image`): detection on image files.

pub use calib_sheets_aruco as aruco;
pub use calib_sheets_charuco as charuco;
pub use calib_sheets_core as core;
pub use calib_sheets_print as print;

pub use calib_sheets_aruco::{Dictionary, MarkerDetection};
pub use calib_sheets_charuco::{CharucoBoard, CharucoBoardSpec};
pub use calib_sheets_print::{CharucoPrintConfig, MarkerGridConfig, PrintError, VerifyReport};

#[cfg(feature = "image")]
pub mod detect;
