#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn cli() -> Command {
    Command::cargo_bin("calib-sheets").expect("binary")
}

#[test]
fn grid_prints_output_and_detected_ids() {
    let tmp = tempfile::tempdir().expect("tmp");
    let out = tmp.path().join("grid.png");

    cli()
        .args(["--log-level", "warn", "grid", "--size", "80", "--separation", "20"])
        .args(["--cols", "4", "--rows", "2", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Board generated:"))
        .stdout(predicate::str::contains("grid.png"))
        .stdout(predicate::str::contains(
            "Detected ids: [0, 1, 2, 3, 4, 5, 6, 7]",
        ));
    assert!(out.exists());
}

#[test]
fn grid_config_round_trips_through_json() {
    let tmp = tempfile::tempdir().expect("tmp");
    let cfg_path = tmp.path().join("grid.json");
    let out = tmp.path().join("from_config.png");

    cli()
        .args(["grid", "--cols", "2", "--rows", "1", "--size", "60", "--no-verify"])
        .arg("--output")
        .arg(&out)
        .arg("--write-config")
        .arg(&cfg_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Detected ids").not());

    let raw = fs::read_to_string(&cfg_path).expect("config");
    assert!(raw.contains("\"cols\": 2"));
    assert!(raw.contains("\"verify\": false"));

    fs::remove_file(&out).expect("remove");
    cli()
        .args(["grid", "--config"])
        .arg(&cfg_path)
        .assert()
        .success();
    assert!(out.exists());
}

#[test]
fn charuco_defaults_render_reference_sheet() {
    let tmp = tempfile::tempdir().expect("tmp");
    cli()
        .current_dir(tmp.path())
        .arg("charuco")
        .assert()
        .success()
        .stdout(predicate::str::contains("Board generated:"))
        .stdout(predicate::str::contains("charuco_board_36x56cm.png"));

    let png = calib_sheets::print::read_gray_png(tmp.path().join("charuco_board_36x56cm.png"))
        .expect("read");
    assert_eq!((png.image.width, png.image.height), (6614, 4251));
    assert_eq!(png.dpi, Some((300, 300)));
}

#[test]
fn charuco_layout_flag_flips_even_boards() {
    let tmp = tempfile::tempdir().expect("tmp");
    let cfg_path = tmp.path().join("charuco.json");
    cli()
        .args(["charuco", "--squares-x", "8", "--squares-y", "6", "--layout", "charuco"])
        .args(["--dictionary", "DICT_4X4_50", "--width-mm", "80", "--height-mm", "60"])
        .args(["--dpi", "150", "-o"])
        .arg(tmp.path().join("board.png"))
        .arg("--write-config")
        .arg(&cfg_path)
        .assert()
        .success();
    let raw = fs::read_to_string(&cfg_path).expect("config");
    assert!(raw.contains("\"marker_layout\": \"opencv_charuco\""));

    let png = calib_sheets::print::read_gray_png(tmp.path().join("board.png")).expect("read");
    assert_eq!(png.image.get(5, 5), Some(0));
}

#[test]
fn charuco_with_builtin_dictionary() {
    let tmp = tempfile::tempdir().expect("tmp");
    let out = tmp.path().join("board.png");
    cli()
        .args(["charuco", "--squares-x", "8", "--squares-y", "6"])
        .args(["--dictionary", "DICT_4X4_50", "--width-mm", "80", "--height-mm", "60"])
        .args(["--dpi", "150", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Board generated:"));
    assert!(out.exists());
}

#[test]
fn invalid_geometry_exits_non_zero() {
    let tmp = tempfile::tempdir().expect("tmp");
    cli()
        .args(["charuco", "--dictionary", "DICT_4X4_50", "--squares-x", "4"])
        .args(["--squares-y", "4", "--square-length", "0.02", "--marker-length", "0.03"])
        .arg("-o")
        .arg(tmp.path().join("bad.png"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must be smaller than square_length"));
}

#[test]
fn markers_then_detect() {
    let tmp = tempfile::tempdir().expect("tmp");
    let dir = tmp.path().join("aruco_ex");

    cli()
        .args(["markers", "--count", "3", "--size", "120", "--dir"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Markers written: 3, skipped: 0"));

    cli()
        .args(["markers", "--count", "3", "--size", "120", "--dir"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Markers written: 0, skipped: 3"));

    // A bare marker has no quiet zone, so pad it before detection.
    let report = tmp.path().join("report.json");
    let img = image::open(dir.join("aruco_2.png")).expect("open").to_luma8();
    let mut padded = image::GrayImage::from_pixel(200, 200, image::Luma([255u8]));
    image::imageops::replace(&mut padded, &img, 40, 40);
    let padded_path = tmp.path().join("padded.png");
    padded.save(&padded_path).expect("save");

    cli()
        .arg("detect")
        .arg(&padded_path)
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Detected ids: [2]"));
    let raw = fs::read_to_string(&report).expect("report");
    assert!(raw.contains("\"id\": 2"));
}
