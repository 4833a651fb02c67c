use calib_sheets_aruco::{DictionaryError, RenderError};
use calib_sheets_charuco::{BoardRenderError, CharucoBoardError};
use calib_sheets_core::ImageError;

/// Errors from print jobs and PNG I/O.
#[derive(thiserror::Error, Debug)]
pub enum PrintError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("unsupported PNG layout {color:?}/{depth:?}, expected 8-bit grayscale")]
    UnsupportedPng {
        color: png::ColorType,
        depth: png::BitDepth,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    PngEncode(#[from] png::EncodingError),
    #[error(transparent)]
    PngDecode(#[from] png::DecodingError),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
    #[error(transparent)]
    Board(#[from] CharucoBoardError),
    #[error(transparent)]
    BoardRender(#[from] BoardRenderError),
    #[error(transparent)]
    Marker(#[from] RenderError),
    #[error(transparent)]
    Image(#[from] ImageError),
}
