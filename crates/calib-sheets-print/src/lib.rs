//! Printable calibration sheets.
//!
//! - [`CharucoPrintJob`]: a ChArUco board sized for a physical page, written
//!   as a PNG with the print resolution in its `pHYs` chunk.
//! - [`MarkerGridJob`]: a grid of numbered markers with uniform gutters, plus
//!   a detection self-check of the rendered sheet.
//! - [`export_marker_set`]: one PNG per marker id.
//!
//! Job configs are plain serde structs whose defaults are the reference sheets;
//! they can be loaded from and written to JSON.

mod charuco;
mod encode;
mod error;
mod grid;
mod marker_set;
mod page;
mod verify;

pub use charuco::{CharucoPrintConfig, CharucoPrintJob, PrintedSheet};
pub use encode::{decode_gray_png, encode_gray_png, read_gray_png, write_gray_png, DecodedPng};
pub use error::PrintError;
pub use grid::{grid_canvas_size, MarkerGridConfig, MarkerGridJob, MarkerPlacement};
pub use marker_set::{export_marker_set, marker_file_name, MarkerSetConfig, MarkerSetReport};
pub use page::{dpi_to_ppm, mm_to_px, ppm_to_dpi, PageSize};
pub use verify::{verify_markers, verify_sheet, VerifyError, VerifyReport};
