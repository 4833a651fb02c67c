//! Single-marker rasterization.

use calib_sheets_core::GrayImage;

use crate::Dictionary;

/// Errors from [`render_marker`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("marker id {id} is out of range for {dictionary} ({len} markers)")]
    UnknownId {
        id: u32,
        dictionary: String,
        len: usize,
    },
    #[error("marker side {side_px}px is smaller than its {cells} cells")]
    SideTooSmall { side_px: usize, cells: usize },
}

/// Rasterize marker `id` as a `side_px × side_px` image.
///
/// The code grid is `marker_size + 2 * border_bits` cells per side with a black
/// border, upscaled nearest-neighbor: pixel `x` samples cell `x * cells / side_px`.
/// Black cells are `0`, white cells `255`.
pub fn render_marker(
    dict: &Dictionary,
    id: u32,
    side_px: usize,
    border_bits: usize,
) -> Result<GrayImage, RenderError> {
    let code = dict.code(id).ok_or_else(|| RenderError::UnknownId {
        id,
        dictionary: dict.name.to_string(),
        len: dict.len(),
    })?;

    let bits = dict.marker_size;
    let cells = bits + 2 * border_bits;
    if side_px < cells {
        return Err(RenderError::SideTooSmall { side_px, cells });
    }

    let cell_black = |cx: usize, cy: usize| -> bool {
        let in_border = cx < border_bits
            || cy < border_bits
            || cx >= border_bits + bits
            || cy >= border_bits + bits;
        if in_border {
            return true;
        }
        let idx = (cy - border_bits) * bits + (cx - border_bits);
        (code >> idx) & 1 == 1
    };

    // Pixel -> cell lookup is shared by both axes.
    let cell_of: Vec<usize> = (0..side_px).map(|p| p * cells / side_px).collect();

    let mut data = Vec::with_capacity(side_px * side_px);
    for &cy in &cell_of {
        data.extend(
            cell_of
                .iter()
                .map(|&cx| if cell_black(cx, cy) { 0u8 } else { 255u8 }),
        );
    }

    Ok(GrayImage {
        width: side_px,
        height: side_px,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    fn cell_value(img: &GrayImage, cells: usize, cx: usize, cy: usize) -> u8 {
        let step = img.width / cells;
        img.get(cx * step + step / 2, cy * step + step / 2)
            .expect("inside")
    }

    #[test]
    fn marker_zero_matches_opencv_pattern() {
        let dict = builtins::DICT_4X4_50;
        let img = render_marker(&dict, 0, 60, 1).expect("render");
        assert_eq!((img.width, img.height), (60, 60));

        // OpenCV DICT_4X4_50 id 0, inner rows (1 = white): 1011 0101 0011 0010
        let white_rows = ["1011", "0101", "0011", "0010"];
        for (y, row) in white_rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let expected = if ch == '1' { 255 } else { 0 };
                assert_eq!(cell_value(&img, 6, x + 1, y + 1), expected, "cell ({x}, {y})");
            }
        }
        for i in 0..6 {
            assert_eq!(cell_value(&img, 6, i, 0), 0);
            assert_eq!(cell_value(&img, 6, i, 5), 0);
            assert_eq!(cell_value(&img, 6, 0, i), 0);
            assert_eq!(cell_value(&img, 6, 5, i), 0);
        }
    }

    #[test]
    fn uneven_side_uses_nearest_cells() {
        let dict = builtins::DICT_4X4_50;
        let img = render_marker(&dict, 3, 7, 1).expect("render");
        assert_eq!(img.data.len(), 49);
        // Pixel 6 maps to cell 6*6/7 = 5, which is border.
        assert_eq!(img.get(6, 3), Some(0));
        assert!(img.data.iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn wider_border_grows_black_frame() {
        let dict = builtins::DICT_4X4_50;
        let img = render_marker(&dict, 0, 80, 2).expect("render");
        // 8 cells of 10px; the first two cells are border.
        assert!((0..20).all(|x| img.get(x, 40) == Some(0)));
    }

    #[test]
    fn rejects_unknown_id_and_tiny_side() {
        let dict = builtins::DICT_4X4_50;
        assert!(matches!(
            render_marker(&dict, 50, 100, 1),
            Err(RenderError::UnknownId { id: 50, len: 50, .. })
        ));
        assert_eq!(
            render_marker(&dict, 0, 5, 1),
            Err(RenderError::SideTooSmall { side_px: 5, cells: 6 })
        );
    }
}
