//! Marker grid sheet: plain numbered markers on a white canvas.

use calib_sheets_aruco::{render_marker, resolve_dictionary, Dictionary};
use calib_sheets_core::GrayImage;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::encode::write_gray_png;
use crate::verify::{verify_sheet, VerifyReport};
use crate::{PrintError, PrintedSheet};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Marker grid settings. Missing JSON fields take the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerGridConfig {
    pub dictionary: String,
    pub dictionary_file: Option<PathBuf>,
    /// Marker side in pixels, border included.
    pub marker_size_px: usize,
    /// Gutter between markers and around the sheet edge, in pixels.
    pub separation_px: usize,
    pub cols: usize,
    pub rows: usize,
    pub border_bits: usize,
    pub first_id: u32,
    pub output: PathBuf,
    /// Decode the rendered sheet and require every placed id.
    pub verify: bool,
}

impl Default for MarkerGridConfig {
    fn default() -> Self {
        Self {
            dictionary: "DICT_4X4_50".to_string(),
            dictionary_file: None,
            marker_size_px: 300,
            separation_px: 50,
            cols: 10,
            rows: 5,
            border_bits: 1,
            first_id: 0,
            output: PathBuf::from("board_custom_4x4_50.png"),
            verify: true,
        }
    }
}

impl MarkerGridConfig {
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
}

/// One marker cell on the sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPlacement {
    pub id: u32,
    pub row: usize,
    pub col: usize,
    /// Top-left pixel of the marker.
    pub x: usize,
    pub y: usize,
    pub size: usize,
}

/// Canvas size for `cols × rows` markers of `size` px with `sep` px gutters.
///
/// `None` when either side, or the pixel count, does not fit in `usize`.
pub fn grid_canvas_size(
    cols: usize,
    rows: usize,
    size: usize,
    sep: usize,
) -> Option<(usize, usize)> {
    let side = |n: usize| n.checked_mul(size)?.checked_add(n.checked_add(1)?.checked_mul(sep)?);
    let (width, height) = (side(cols)?, side(rows)?);
    width.checked_mul(height)?;
    Some((width, height))
}

/// A validated marker grid job.
#[derive(Clone, Debug)]
pub struct MarkerGridJob {
    config: MarkerGridConfig,
    dictionary: Dictionary,
    canvas: (usize, usize),
}

impl MarkerGridJob {
    pub fn new(config: MarkerGridConfig) -> Result<Self, PrintError> {
        let dictionary =
            resolve_dictionary(&config.dictionary, config.dictionary_file.as_deref())?;
        Self::with_dictionary(config, dictionary)
    }

    /// Build a job around an already resolved dictionary.
    pub fn with_dictionary(
        config: MarkerGridConfig,
        dictionary: Dictionary,
    ) -> Result<Self, PrintError> {
        if config.cols == 0 || config.rows == 0 {
            return Err(PrintError::InvalidConfig(format!(
                "grid {}x{} must have at least one row and column",
                config.cols, config.rows
            )));
        }
        if config.marker_size_px == 0 {
            return Err(PrintError::InvalidConfig(
                "marker_size_px must be > 0".to_string(),
            ));
        }

        let cells = dictionary.marker_size + 2 * config.border_bits;
        if config.marker_size_px < cells {
            return Err(PrintError::InvalidConfig(format!(
                "marker_size_px {} is smaller than the {} cells of a marker",
                config.marker_size_px, cells
            )));
        }

        let last = config
            .cols
            .checked_mul(config.rows)
            .and_then(|count| (config.first_id as usize).checked_add(count - 1));
        match last {
            Some(last) if last < dictionary.len() => {}
            _ => {
                return Err(PrintError::InvalidConfig(format!(
                    "grid {}x{} from id {} does not fit in {} ({} markers)",
                    config.cols,
                    config.rows,
                    config.first_id,
                    dictionary.name,
                    dictionary.len()
                )));
            }
        }

        let canvas = grid_canvas_size(
            config.cols,
            config.rows,
            config.marker_size_px,
            config.separation_px,
        )
        .ok_or_else(|| {
            PrintError::InvalidConfig(format!(
                "grid {}x{} of {} px markers with {} px gutters overflows the canvas size",
                config.cols, config.rows, config.marker_size_px, config.separation_px
            ))
        })?;

        Ok(Self {
            config,
            dictionary,
            canvas,
        })
    }

    #[inline]
    pub fn config(&self) -> &MarkerGridConfig {
        &self.config
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    #[inline]
    pub fn canvas_size(&self) -> (usize, usize) {
        self.canvas
    }

    /// Marker cells, rows outer and columns inner.
    pub fn placements(&self) -> Vec<MarkerPlacement> {
        let c = &self.config;
        let pitch = c.marker_size_px + c.separation_px;
        let mut out = Vec::with_capacity(c.cols * c.rows);
        for row in 0..c.rows {
            for col in 0..c.cols {
                out.push(MarkerPlacement {
                    id: c.first_id + (row * c.cols + col) as u32,
                    row,
                    col,
                    x: c.separation_px + col * pitch,
                    y: c.separation_px + row * pitch,
                    size: c.marker_size_px,
                });
            }
        }
        out
    }

    /// Placed ids in placement order.
    pub fn expected_ids(&self) -> Vec<u32> {
        self.placements().iter().map(|p| p.id).collect()
    }

    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn render(&self) -> Result<GrayImage, PrintError> {
        let (width, height) = self.canvas_size();
        let mut canvas = GrayImage::filled(width, height, 255);
        for p in self.placements() {
            let marker = render_marker(&self.dictionary, p.id, p.size, self.config.border_bits)?;
            canvas.blit(&marker, p.x, p.y)?;
        }
        log::debug!(
            "grid {}x{} of {} on {width}x{height} canvas",
            self.config.cols,
            self.config.rows,
            self.dictionary.name
        );
        Ok(canvas)
    }

    /// Decode `canvas` and compare against the placed ids.
    pub fn verify(&self, canvas: &GrayImage) -> VerifyReport {
        verify_sheet(&canvas.view(), &self.dictionary, &self.expected_ids())
    }

    /// Render, write the PNG without DPI metadata and return the canvas.
    pub fn run(&self) -> Result<(PrintedSheet, GrayImage), PrintError> {
        let canvas = self.render()?;
        write_gray_png(&self.config.output, &canvas, None)?;
        log::info!(
            "wrote marker grid {} ({}x{} px)",
            self.config.output.display(),
            canvas.width,
            canvas.height
        );
        let sheet = PrintedSheet {
            path: self.config.output.clone(),
            width: canvas.width,
            height: canvas.height,
            dpi: None,
        };
        Ok((sheet, canvas))
    }
}
