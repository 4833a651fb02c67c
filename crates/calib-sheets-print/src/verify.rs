//! Detection self-check for generated sheets.

use calib_sheets_aruco::{detect_markers, DetectorParams, Dictionary, MarkerDetection};
use calib_sheets_core::GrayImageView;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The self-check found a different set of markers than was placed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("expected {expected} markers, detected {detected}")]
    Incomplete {
        expected: usize,
        detected: usize,
        missing: Vec<u32>,
        unexpected: Vec<u32>,
    },
}

/// Placed ids compared with decoded ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Ids placed on the sheet.
    pub expected: Vec<u32>,
    /// Ids in detection order.
    pub detected: Vec<u32>,
    /// Expected but not detected, ascending.
    pub missing: Vec<u32>,
    /// Detected but never placed, ascending.
    pub unexpected: Vec<u32>,
}

impl VerifyReport {
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }

    /// `Ok` only when the detected set equals the expected set.
    pub fn ensure_complete(&self) -> Result<(), VerifyError> {
        if self.is_complete() {
            return Ok(());
        }
        Err(VerifyError::Incomplete {
            expected: self.expected.len(),
            detected: self.detected.len(),
            missing: self.missing.clone(),
            unexpected: self.unexpected.clone(),
        })
    }
}

/// Compare `detections` against the `expected` ids.
pub fn verify_markers(expected: &[u32], detections: &[MarkerDetection]) -> VerifyReport {
    let detected: Vec<u32> = detections.iter().map(|d| d.id).collect();
    let expected_set: BTreeSet<u32> = expected.iter().copied().collect();
    let detected_set: BTreeSet<u32> = detected.iter().copied().collect();

    let report = VerifyReport {
        expected: expected.to_vec(),
        missing: expected_set.difference(&detected_set).copied().collect(),
        unexpected: detected_set.difference(&expected_set).copied().collect(),
        detected,
    };

    if report.is_complete() {
        log::info!("self-check: all {} markers decoded", report.expected.len());
    } else {
        log::warn!(
            "self-check: {} missing, {} unexpected",
            report.missing.len(),
            report.unexpected.len()
        );
    }
    report
}

/// Detect markers on `image` with default parameters and compare with `expected`.
pub fn verify_sheet(image: &GrayImageView<'_>, dict: &Dictionary, expected: &[u32]) -> VerifyReport {
    let detections = detect_markers(image, dict, &DetectorParams::default());
    verify_markers(expected, &detections)
}
