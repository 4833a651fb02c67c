//! Board specification and layout helpers for ChArUco.

use calib_sheets_aruco::Dictionary;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Marker placement scheme for the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarkerLayout {
    /// OpenCV-style ChArUco layout:
    /// - markers are placed on white squares only (top-left square is black),
    /// - marker IDs are assigned sequentially in row-major order over those squares.
    #[serde(rename = "opencv_charuco", alias = "open_cv_charuco")]
    #[default]
    OpenCvCharuco,
    /// Pre-4.7 OpenCV layout (`setLegacyPattern(true)`): identical to
    /// [`MarkerLayout::OpenCvCharuco`] for an odd number of rows, but with an
    /// even number of rows the checkerboard is flipped so the top-left square
    /// is white and carries marker 0.
    #[serde(rename = "opencv_legacy")]
    OpenCvLegacy,
}

impl MarkerLayout {
    /// Parity of `sx + sy` for marker-bearing (white) squares.
    #[inline]
    fn white_parity(self, squares_y: u32) -> u32 {
        match self {
            MarkerLayout::OpenCvLegacy if squares_y % 2 == 0 => 0,
            _ => 1,
        }
    }
}

/// Static ChArUco board specification.
///
/// `squares_x`/`squares_y` are **square counts** (not inner corner counts).
/// Lengths are physical units (meters by convention) and only their ratio
/// matters for rasterization.
#[derive(Clone, Debug)]
pub struct CharucoBoardSpec {
    pub squares_x: u32,
    pub squares_y: u32,
    pub square_length: f32,
    pub marker_length: f32,
    pub dictionary: Dictionary,
    pub marker_layout: MarkerLayout,
}

/// Board specification validation errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CharucoBoardError {
    #[error("squares_x and squares_y must be >= 2")]
    InvalidSize,
    #[error("square_length must be > 0")]
    InvalidSquareLength,
    #[error("marker_length must be > 0")]
    InvalidMarkerLength,
    #[error("marker_length {marker_length} must be smaller than square_length {square_length}")]
    MarkerNotSmallerThanSquare {
        marker_length: f32,
        square_length: f32,
    },
    #[error("dictionary has no codes")]
    EmptyDictionary,
    #[error("board needs {needed} markers, dictionary {dictionary} has {available}")]
    NotEnoughDictionaryCodes {
        dictionary: String,
        needed: usize,
        available: usize,
    },
}

/// Validated board with precomputed marker cells.
#[derive(Clone, Debug)]
pub struct CharucoBoard {
    spec: CharucoBoardSpec,
    white_parity: u32,
    marker_positions: Vec<[u32; 2]>,
}

impl CharucoBoard {
    /// Validate and create a board from a spec.
    pub fn new(spec: CharucoBoardSpec) -> Result<Self, CharucoBoardError> {
        if spec.squares_x < 2 || spec.squares_y < 2 {
            return Err(CharucoBoardError::InvalidSize);
        }
        if !spec.square_length.is_finite() || spec.square_length <= 0.0 {
            return Err(CharucoBoardError::InvalidSquareLength);
        }
        if !spec.marker_length.is_finite() || spec.marker_length <= 0.0 {
            return Err(CharucoBoardError::InvalidMarkerLength);
        }
        if spec.marker_length >= spec.square_length {
            return Err(CharucoBoardError::MarkerNotSmallerThanSquare {
                marker_length: spec.marker_length,
                square_length: spec.square_length,
            });
        }
        if spec.dictionary.is_empty() {
            return Err(CharucoBoardError::EmptyDictionary);
        }

        let white_parity = spec.marker_layout.white_parity(spec.squares_y);
        let marker_positions = white_square_positions(spec.squares_x, spec.squares_y, white_parity);

        let needed = marker_positions.len();
        let available = spec.dictionary.len();
        if available < needed {
            return Err(CharucoBoardError::NotEnoughDictionaryCodes {
                dictionary: spec.dictionary.name.to_string(),
                needed,
                available,
            });
        }

        log::debug!(
            "charuco board {}x{} squares ({:?}), {} markers from {}",
            spec.squares_x,
            spec.squares_y,
            spec.marker_layout,
            needed,
            spec.dictionary.name
        );

        Ok(Self {
            spec,
            white_parity,
            marker_positions,
        })
    }

    /// Return the underlying board specification.
    #[inline]
    pub fn spec(&self) -> &CharucoBoardSpec {
        &self.spec
    }

    /// Number of markers on the board.
    #[inline]
    pub fn marker_count(&self) -> usize {
        self.marker_positions.len()
    }

    /// Square-cell coordinates `[sx, sy]` for the given marker id.
    #[inline]
    pub fn marker_position(&self, id: u32) -> Option<[u32; 2]> {
        self.marker_positions.get(id as usize).copied()
    }

    /// `(id, [sx, sy])` for every marker, in id order.
    pub fn markers(&self) -> impl Iterator<Item = (u32, [u32; 2])> + '_ {
        self.marker_positions
            .iter()
            .enumerate()
            .map(|(id, &cell)| (id as u32, cell))
    }

    /// True for black squares. Markers only ever sit on the others.
    #[inline]
    pub fn is_black_square(&self, sx: u32, sy: u32) -> bool {
        (sx + sy) % 2 != self.white_parity
    }

    /// Physical board size `(width, height)`.
    pub fn physical_size(&self) -> (f32, f32) {
        (
            self.spec.squares_x as f32 * self.spec.square_length,
            self.spec.squares_y as f32 * self.spec.square_length,
        )
    }

    /// Physical top-left corner of a marker, origin at the board's top-left.
    pub fn marker_object_origin(&self, id: u32) -> Option<Point2<f32>> {
        let [sx, sy] = self.marker_position(id)?;
        let inset = 0.5 * (self.spec.square_length - self.spec.marker_length);
        Some(Point2::new(
            sx as f32 * self.spec.square_length + inset,
            sy as f32 * self.spec.square_length + inset,
        ))
    }
}

/// Row-major white squares, where white means `(i + j) % 2 == white_parity`.
fn white_square_positions(squares_x: u32, squares_y: u32, white_parity: u32) -> Vec<[u32; 2]> {
    let mut out = Vec::with_capacity(squares_x as usize * squares_y as usize / 2 + 1);
    for j in 0..squares_y {
        for i in 0..squares_x {
            if (i + j) % 2 == white_parity {
                out.push([i, j]);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use calib_sheets_aruco::builtins;

    fn spec(squares_x: u32, squares_y: u32, square: f32, marker: f32) -> CharucoBoardSpec {
        CharucoBoardSpec {
            squares_x,
            squares_y,
            square_length: square,
            marker_length: marker,
            dictionary: builtins::DICT_4X4_50,
            marker_layout: MarkerLayout::OpenCvCharuco,
        }
    }

    fn legacy(squares_x: u32, squares_y: u32) -> CharucoBoardSpec {
        CharucoBoardSpec {
            dictionary: builtins::DICT_5X5_1000,
            marker_layout: MarkerLayout::OpenCvLegacy,
            ..spec(squares_x, squares_y, 0.025, 0.018)
        }
    }

    #[test]
    fn markers_fill_white_squares_row_major() {
        let board = CharucoBoard::new(spec(5, 7, 0.04, 0.02)).expect("board");
        assert_eq!(board.marker_count(), 17);
        assert_eq!(board.marker_position(0), Some([1, 0]));
        assert_eq!(board.marker_position(1), Some([3, 0]));
        assert_eq!(board.marker_position(2), Some([0, 1]));
        assert_eq!(board.marker_position(17), None);
        assert!(board.markers().all(|(_, [x, y])| !board.is_black_square(x, y)));
    }

    #[test]
    fn legacy_even_rows_start_with_a_marker() {
        let board = CharucoBoard::new(legacy(22, 14)).expect("board");
        assert_eq!(board.marker_count(), 154);
        assert!(!board.is_black_square(0, 0));
        assert!(board.is_black_square(1, 0));
        assert_eq!(board.marker_position(0), Some([0, 0]));
        assert_eq!(board.marker_position(1), Some([2, 0]));
        assert_eq!(board.marker_position(11), Some([1, 1]));
        assert_eq!(board.marker_position(153), Some([21, 13]));
        assert!(board.markers().all(|(_, [x, y])| !board.is_black_square(x, y)));
    }

    #[test]
    fn legacy_odd_rows_match_current_layout() {
        let old = CharucoBoard::new(legacy(6, 5)).expect("legacy");
        let new = CharucoBoard::new(CharucoBoardSpec {
            marker_layout: MarkerLayout::OpenCvCharuco,
            ..legacy(6, 5)
        })
        .expect("current");
        assert!(old.markers().eq(new.markers()));
        assert!(old.is_black_square(0, 0));
    }

    #[test]
    fn layout_names_in_json() {
        let json = serde_json::to_string(&MarkerLayout::OpenCvLegacy).expect("json");
        assert_eq!(json, "\"opencv_legacy\"");
        let parsed: MarkerLayout = serde_json::from_str("\"opencv_charuco\"").expect("parse");
        assert_eq!(parsed, MarkerLayout::OpenCvCharuco);
    }

    #[test]
    fn marker_not_smaller_than_square_is_rejected() {
        for marker in [0.025, 0.03] {
            let err = CharucoBoard::new(spec(5, 5, 0.025, marker)).unwrap_err();
            assert!(matches!(
                err,
                CharucoBoardError::MarkerNotSmallerThanSquare { .. }
            ));
        }
    }

    #[test]
    fn dictionary_must_cover_all_markers() {
        let err = CharucoBoard::new(spec(22, 14, 0.025, 0.018)).unwrap_err();
        assert_eq!(
            err,
            CharucoBoardError::NotEnoughDictionaryCodes {
                dictionary: "DICT_4X4_50".to_string(),
                needed: 154,
                available: 50,
            }
        );
    }

    #[test]
    fn degenerate_specs_are_rejected() {
        assert_eq!(
            CharucoBoard::new(spec(1, 5, 1.0, 0.5)).unwrap_err(),
            CharucoBoardError::InvalidSize
        );
        assert_eq!(
            CharucoBoard::new(spec(3, 3, f32::NAN, 0.5)).unwrap_err(),
            CharucoBoardError::InvalidSquareLength
        );
        assert_eq!(
            CharucoBoard::new(spec(3, 3, 1.0, 0.0)).unwrap_err(),
            CharucoBoardError::InvalidMarkerLength
        );
    }

    #[test]
    fn marker_origin_is_centered_in_square() {
        let board = CharucoBoard::new(spec(5, 5, 0.04, 0.02)).expect("board");
        let p = board.marker_object_origin(2).expect("marker");
        // Marker 2 sits on square (0, 1).
        assert_relative_eq!(p.x, 0.01, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.05, epsilon = 1e-6);

        let (w, h) = board.physical_size();
        assert_relative_eq!(w, 0.2, epsilon = 1e-6);
        assert_relative_eq!(h, 0.2, epsilon = 1e-6);
    }
}
