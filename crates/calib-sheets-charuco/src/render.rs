//! Board rasterization.

use calib_sheets_aruco::{render_marker, RenderError};
use calib_sheets_core::{GrayImage, ImageError};

use crate::CharucoBoard;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors from [`render_board`].
#[derive(thiserror::Error, Debug)]
pub enum BoardRenderError {
    #[error("output {width}x{height} leaves no room for the board with margin {margin_px}px")]
    OutputTooSmall {
        width: usize,
        height: usize,
        margin_px: usize,
    },
    #[error("marker {id}: {source}")]
    Marker {
        id: u32,
        #[source]
        source: RenderError,
    },
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Draw the board into a `width × height` 8-bit image.
///
/// Layout:
/// - the image is white; `margin_px` is left free on every side,
/// - the board keeps its aspect ratio and is centered along the longer axis,
/// - markers are drawn first, then black squares are filled over the grid.
///
/// Pixel rounding follows the classic OpenCV `CharucoBoard::draw`, so boards
/// rendered with the same dictionary are interchangeable with OpenCV prints.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(board), fields(squares_x = board.spec().squares_x, squares_y = board.spec().squares_y))
)]
pub fn render_board(
    board: &CharucoBoard,
    width: usize,
    height: usize,
    margin_px: usize,
    border_bits: usize,
) -> Result<GrayImage, BoardRenderError> {
    let too_small = || BoardRenderError::OutputTooSmall {
        width,
        height,
        margin_px,
    };
    let inner_w = width.checked_sub(2 * margin_px).filter(|&w| w > 0).ok_or_else(too_small)?;
    let inner_h = height.checked_sub(2 * margin_px).filter(|&h| h > 0).ok_or_else(too_small)?;

    let spec = board.spec();
    let squares_x = spec.squares_x as usize;
    let squares_y = spec.squares_y as usize;
    let square_len = spec.square_length as f64;
    let marker_len = spec.marker_length as f64;
    let total_x = square_len * squares_x as f64;
    let total_y = square_len * squares_y as f64;

    // Fit the board into the free area, centered along the axis with slack.
    let x_reduction = total_x / inner_w as f64;
    let y_reduction = total_y / inner_h as f64;
    let (zone_x, zone_y, zone_w, zone_h) = if x_reduction > y_reduction {
        let rows = (total_y / x_reduction) as usize;
        let pad = inner_h.saturating_sub(rows) / 2;
        (0, pad, inner_w, inner_h - 2 * pad)
    } else {
        let cols = (total_x / y_reduction) as usize;
        let pad = inner_w.saturating_sub(cols) / 2;
        (pad, 0, inner_w - 2 * pad, inner_h)
    };

    let square_px = (zone_w as f64 / squares_x as f64).min(zone_h as f64 / squares_y as f64);
    if square_px < 1.0 {
        return Err(too_small());
    }

    let mut zone = GrayImage::filled(zone_w, zone_h, 255);

    // Markers: their joint bounding box maps onto the zone minus the square inset.
    let inset = (square_len - marker_len) / 2.0;
    let inset_px = (inset * square_px / square_len) as usize;
    let span_x = total_x - 2.0 * inset;
    let span_y = total_y - 2.0 * inset;
    let draw_w = zone_w.saturating_sub(2 * inset_px) as f64;
    let draw_h = zone_h.saturating_sub(2 * inset_px) as f64;
    let to_px_x = |x: f64| ((x - inset) / span_x * draw_w + inset_px as f64).round() as usize;
    let to_px_y = |y: f64| ((y - inset) / span_y * draw_h + inset_px as f64).round() as usize;

    for (id, _) in board.markers() {
        let Some(origin) = board.marker_object_origin(id) else {
            continue;
        };
        let (ox, oy) = (origin.x as f64, origin.y as f64);
        let x0 = to_px_x(ox);
        let y0 = to_px_y(oy);
        let x1 = to_px_x(ox + marker_len);
        let y1 = to_px_y(oy + marker_len);
        let side = (x1 - x0).min(y1 - y0);

        let marker = render_marker(&spec.dictionary, id, side, border_bits)
            .map_err(|source| BoardRenderError::Marker { id, source })?;
        zone.blit(&marker, x0, y0)?;
    }

    for sy in 0..squares_y {
        for sx in 0..squares_x {
            if !board.is_black_square(sx as u32, sy as u32) {
                continue;
            }
            let x0 = (square_px * sx as f64) as usize;
            let y0 = (square_px * sy as f64) as usize;
            let x1 = ((square_px * (sx + 1) as f64) as usize).min(zone_w);
            let y1 = ((square_px * (sy + 1) as f64) as usize).min(zone_h);
            zone.fill_rect(x0, y0, x1 - x0, y1 - y0, 0)?;
        }
    }

    let mut out = GrayImage::filled(width, height, 255);
    out.blit(&zone, margin_px + zone_x, margin_px + zone_y)?;

    log::debug!(
        "board zone {zone_w}x{zone_h} at ({}, {}), {square_px:.2}px per square",
        margin_px + zone_x,
        margin_px + zone_y
    );
    Ok(out)
}
