//! ChArUco board description and rasterization.
//!
//! A board is a `squares_x × squares_y` checkerboard whose top-left square is
//! black, with one ArUco marker centered in every white square. Marker
//! dictionaries and single-marker rendering live in `calib-sheets-aruco`.

mod board;
mod render;

pub use board::{CharucoBoard, CharucoBoardError, CharucoBoardSpec, MarkerLayout};
pub use render::{render_board, BoardRenderError};
