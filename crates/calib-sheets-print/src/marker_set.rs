//! One PNG per marker, written into a directory.

use calib_sheets_aruco::{render_marker, resolve_dictionary};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::encode::write_gray_png;
use crate::PrintError;

/// Marker set export settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSetConfig {
    pub dictionary: String,
    pub dictionary_file: Option<PathBuf>,
    pub first_id: u32,
    pub count: u32,
    pub marker_size_px: usize,
    pub border_bits: usize,
    pub dir: PathBuf,
}

impl Default for MarkerSetConfig {
    fn default() -> Self {
        Self {
            dictionary: "DICT_4X4_50".to_string(),
            dictionary_file: None,
            first_id: 0,
            count: 50,
            marker_size_px: 400,
            border_bits: 1,
            dir: PathBuf::from("aruco_ex"),
        }
    }
}

/// Files written and files left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSetReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// `aruco_<id>.png`
#[inline]
pub fn marker_file_name(id: u32) -> String {
    format!("aruco_{id}.png")
}

/// Write every marker of the configured id range, skipping existing files.
pub fn export_marker_set(config: &MarkerSetConfig) -> Result<MarkerSetReport, PrintError> {
    let dict = resolve_dictionary(&config.dictionary, config.dictionary_file.as_deref())?;
    let end = config.first_id as usize + config.count as usize;
    if end > dict.len() {
        return Err(PrintError::InvalidConfig(format!(
            "ids {}..{} exceed {} ({} markers)",
            config.first_id,
            end,
            dict.name,
            dict.len()
        )));
    }

    fs::create_dir_all(&config.dir)?;

    let mut report = MarkerSetReport::default();
    for id in config.first_id..config.first_id + config.count {
        let path = config.dir.join(marker_file_name(id));
        if path.exists() {
            log::debug!("skipping existing {}", path.display());
            report.skipped.push(path);
            continue;
        }
        let marker = render_marker(&dict, id, config.marker_size_px, config.border_bits)?;
        write_gray_png(&path, &marker, None)?;
        report.written.push(path);
    }

    log::info!(
        "marker set in {}: {} written, {} skipped",
        config.dir.display(),
        report.written.len(),
        report.skipped.len()
    );
    Ok(report)
}
