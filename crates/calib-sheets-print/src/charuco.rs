//! ChArUco board print job.

use calib_sheets_aruco::resolve_dictionary;
use calib_sheets_charuco::{render_board, CharucoBoard, CharucoBoardSpec, MarkerLayout};
use calib_sheets_core::GrayImage;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::encode::write_gray_png;
use crate::page::PageSize;
use crate::PrintError;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// ChArUco board print settings. Missing JSON fields take the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharucoPrintConfig {
    pub squares_x: u32,
    pub squares_y: u32,
    /// Square side in meters.
    pub square_length: f32,
    /// Marker side in meters.
    pub marker_length: f32,
    pub dictionary: String,
    /// JSON code table for dictionaries that are not built in.
    pub dictionary_file: Option<PathBuf>,
    /// Checkerboard phase and marker order. Defaults to the pre-4.7 OpenCV
    /// layout, which is what existing prints of the reference board use.
    pub marker_layout: MarkerLayout,
    pub width_mm: f64,
    pub height_mm: f64,
    pub dpi: u32,
    pub margin_px: usize,
    pub border_bits: usize,
    pub output: PathBuf,
}

impl Default for CharucoPrintConfig {
    fn default() -> Self {
        Self {
            squares_x: 22,
            squares_y: 14,
            square_length: 0.025,
            marker_length: 0.018,
            dictionary: "DICT_5X5_1000".to_string(),
            dictionary_file: None,
            marker_layout: MarkerLayout::OpenCvLegacy,
            width_mm: 560.0,
            height_mm: 360.0,
            dpi: 300,
            margin_px: 0,
            border_bits: 1,
            output: PathBuf::from("charuco_board_36x56cm.png"),
        }
    }
}

impl CharucoPrintConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PrintError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PrintError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    #[inline]
    pub fn page(&self) -> PageSize {
        PageSize::new(self.width_mm, self.height_mm, self.dpi)
    }

    /// Resolve the dictionary and validate the board geometry.
    pub fn build_board(&self) -> Result<CharucoBoard, PrintError> {
        let dictionary = resolve_dictionary(&self.dictionary, self.dictionary_file.as_deref())?;
        Ok(CharucoBoard::new(CharucoBoardSpec {
            squares_x: self.squares_x,
            squares_y: self.squares_y,
            square_length: self.square_length,
            marker_length: self.marker_length,
            dictionary,
            marker_layout: self.marker_layout,
        })?)
    }
}

/// Summary of a written sheet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintedSheet {
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub dpi: Option<u32>,
}

/// A validated ChArUco print job.
#[derive(Clone, Debug)]
pub struct CharucoPrintJob {
    config: CharucoPrintConfig,
    board: CharucoBoard,
    width: usize,
    height: usize,
}

impl CharucoPrintJob {
    pub fn new(config: CharucoPrintConfig) -> Result<Self, PrintError> {
        let (width, height) = config.page().pixel_size()?;
        let board = config.build_board()?;
        Ok(Self {
            config,
            board,
            width,
            height,
        })
    }

    #[inline]
    pub fn config(&self) -> &CharucoPrintConfig {
        &self.config
    }

    #[inline]
    pub fn board(&self) -> &CharucoBoard {
        &self.board
    }

    /// Output size in pixels.
    #[inline]
    pub fn pixel_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Rasterize the board at the page's pixel size.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn render(&self) -> Result<GrayImage, PrintError> {
        Ok(render_board(
            &self.board,
            self.width,
            self.height,
            self.config.margin_px,
            self.config.border_bits,
        )?)
    }

    /// Render and write the PNG with the page DPI in `pHYs`.
    pub fn run(&self) -> Result<PrintedSheet, PrintError> {
        let image = self.render()?;
        write_gray_png(&self.config.output, &image, Some(self.config.dpi))?;
        log::info!(
            "wrote ChArUco board {} ({}x{} px, {} dpi)",
            self.config.output.display(),
            image.width,
            image.height,
            self.config.dpi
        );
        Ok(PrintedSheet {
            path: self.config.output.clone(),
            width: image.width,
            height: image.height,
            dpi: Some(self.config.dpi),
        })
    }
}
