use calib_sheets_aruco::{builtins, detect_markers, DetectorParams};
use calib_sheets_charuco::{render_board, CharucoBoard, CharucoBoardSpec, MarkerLayout};

fn board(squares_x: u32, squares_y: u32) -> CharucoBoard {
    CharucoBoard::new(CharucoBoardSpec {
        squares_x,
        squares_y,
        square_length: 0.04,
        marker_length: 0.028,
        dictionary: builtins::DICT_4X4_50,
        marker_layout: MarkerLayout::OpenCvCharuco,
    })
    .expect("board")
}

#[test]
fn rendered_board_markers_decode_in_id_order() {
    let board = board(5, 5);
    let img = render_board(&board, 500, 500, 0, 1).expect("render");

    let dets = detect_markers(&img.view(), &board.spec().dictionary, &DetectorParams::default());
    let ids: Vec<u32> = dets.iter().map(|d| d.id).collect();
    assert_eq!(ids, (0..12).collect::<Vec<_>>());
    assert!(dets.iter().all(|d| d.rotation == 0 && d.hamming == 0));

    // Every marker center falls inside the square the board assigns it.
    for det in &dets {
        let [sx, sy] = board.marker_position(det.id).expect("position");
        assert_eq!((det.center.x / 100.0) as u32, sx, "marker {}", det.id);
        assert_eq!((det.center.y / 100.0) as u32, sy, "marker {}", det.id);
    }
}

#[test]
fn top_left_square_is_black_and_corners_alternate() {
    let board = board(6, 4);
    let img = render_board(&board, 600, 400, 0, 1).expect("render");

    for sy in 0..4usize {
        for sx in 0..6usize {
            let center = img.get(sx * 100 + 50, sy * 100 + 50).expect("inside");
            // Black squares are solid; white squares hold a marker but keep a white rim.
            let rim = img.get(sx * 100 + 5, sy * 100 + 5).expect("inside");
            if (sx + sy) % 2 == 0 {
                assert_eq!((center, rim), (0, 0), "square ({sx}, {sy})");
            } else {
                assert_eq!(rim, 255, "square ({sx}, {sy})");
            }
        }
    }
}

#[test]
fn margin_shrinks_board_but_keeps_it_detectable() {
    let board = board(4, 4);
    let img = render_board(&board, 440, 440, 20, 1).expect("render");
    assert_eq!((img.width, img.height), (440, 440));
    assert!((0..440).all(|i| img.get(i, 10) == Some(255) && img.get(10, i) == Some(255)));

    let dets = detect_markers(&img.view(), &board.spec().dictionary, &DetectorParams::default());
    assert_eq!(dets.len(), board.marker_count());
}
