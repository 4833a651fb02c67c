use crate::{aruco, core};
use image::ImageReader;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the image-file helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Borrow an `image::GrayImage` as a `calib-sheets-core` view.
pub fn gray_view(img: &::image::GrayImage) -> core::GrayImageView<'_> {
    core::GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Decode any supported image file into 8-bit luma.
pub fn load_gray(path: impl AsRef<Path>) -> Result<::image::GrayImage, DetectError> {
    Ok(ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?
        .to_luma8())
}

/// Markers decoded from one image file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectReport {
    pub image_path: String,
    pub dictionary: String,
    pub width: usize,
    pub height: usize,
    pub markers: Vec<aruco::MarkerDetection>,
}

impl DetectReport {
    /// Ids in detection order.
    pub fn ids(&self) -> Vec<u32> {
        self.markers.iter().map(|m| m.id).collect()
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DetectError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Load `path` and detect markers of `dict` on it.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))
)]
pub fn detect_image_file(
    path: impl AsRef<Path>,
    dict: &aruco::Dictionary,
    params: &aruco::DetectorParams,
) -> Result<DetectReport, DetectError> {
    let path = path.as_ref();
    let img = load_gray(path)?;
    let view = gray_view(&img);
    let markers = aruco::detect_markers(&view, dict, params);
    log::info!("{}: {} markers", path.display(), markers.len());

    Ok(DetectReport {
        image_path: path.to_string_lossy().into_owned(),
        dictionary: dict.name.to_string(),
        width: view.width,
        height: view.height,
        markers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aruco::builtins;
    use crate::print::{write_gray_png, MarkerGridConfig, MarkerGridJob};

    #[test]
    fn detects_markers_in_written_grid() {
        let tmp = tempfile::tempdir().expect("tmp");
        let path = tmp.path().join("grid.png");
        let job = MarkerGridJob::new(MarkerGridConfig {
            marker_size_px: 80,
            separation_px: 20,
            cols: 3,
            rows: 2,
            ..MarkerGridConfig::default()
        })
        .expect("job");
        write_gray_png(&path, &job.render().expect("render"), None).expect("write");

        let report = detect_image_file(
            &path,
            &builtins::DICT_4X4_50,
            &aruco::DetectorParams::default(),
        )
        .expect("detect");
        assert_eq!((report.width, report.height), (320, 220));
        assert_eq!(report.ids(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_gray("/nonexistent/definitely/missing.png").unwrap_err();
        assert!(matches!(err, DetectError::Io(_)));
    }
}
