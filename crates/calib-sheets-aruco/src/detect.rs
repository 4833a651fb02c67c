//! Marker detection on axis-aligned images (rendered sheets, flatbed scans).
//!
//! Candidates are 4-connected components of dark pixels whose bounding box
//! looks like a marker. Each candidate box is split into a regular cell grid,
//! sampled, thresholded and matched against the dictionary. There is no
//! perspective handling: markers must be roughly axis-aligned in the image.

use calib_sheets_core::GrayImageView;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::threshold::{otsu_threshold_from_histogram, otsu_threshold_from_samples};
use crate::{Dictionary, Matcher};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Detector tuning knobs. The defaults suit cleanly rendered sheets.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Marker border width in cells.
    pub border_bits: usize,
    /// Smallest accepted bounding-box side, in pixels.
    pub min_marker_side_px: usize,
    /// Largest accepted `max(w, h) / min(w, h)` for a candidate box.
    pub max_aspect_ratio: f32,
    /// Accepted range for dark-pixel count over bounding-box area.
    pub min_fill: f32,
    pub max_fill: f32,
    /// Fraction of each cell ignored on every side when averaging.
    pub cell_margin: f32,
    /// Require border-black ratio >= this.
    pub min_border_score: f32,
    /// Share of the dictionary's correction capacity used when matching.
    pub error_correction_rate: f32,
    /// Fixed binarization level; `None` uses a global Otsu threshold.
    pub threshold: Option<u8>,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            border_bits: 1,
            min_marker_side_px: 12,
            max_aspect_ratio: 1.3,
            min_fill: 0.3,
            max_fill: 0.97,
            cell_margin: 0.25,
            min_border_score: 0.85,
            error_correction_rate: 0.6,
            threshold: None,
        }
    }
}

/// One decoded marker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarkerDetection {
    pub id: u32,
    /// Rotation `0..=3` of the observed code relative to the dictionary code.
    pub rotation: u8,
    pub hamming: u8,
    pub score: f32,
    pub border_score: f32,
    /// Observed inner bits (row-major, black=1).
    pub code: u64,
    /// Bounding box corners in image pixels (TL, TR, BR, BL).
    pub corners: [Point2<f32>; 4],
    pub center: Point2<f32>,
}

/// Marker detector for a fixed dictionary.
#[derive(Clone, Debug)]
pub struct MarkerDetector {
    matcher: Matcher,
    params: DetectorParams,
}

impl MarkerDetector {
    pub fn new(dict: Dictionary, params: DetectorParams) -> Self {
        let rate = params.error_correction_rate.clamp(0.0, 1.0);
        let max_hamming = (dict.max_correction_bits as f32 * rate).floor() as u8;
        Self {
            matcher: Matcher::new(dict, max_hamming),
            params,
        }
    }

    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        self.matcher.dictionary()
    }

    /// Detect markers, in raster order of each marker's first pixel.
    ///
    /// If an id is decoded twice, the better-scoring detection replaces the
    /// earlier one in place.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(width = image.width, height = image.height))
    )]
    pub fn detect(&self, image: &GrayImageView<'_>) -> Vec<MarkerDetection> {
        if image.width == 0 || image.height == 0 {
            return Vec::new();
        }

        let thr = self
            .params
            .threshold
            .unwrap_or_else(|| image_threshold(image));
        let blobs = dark_components(image, thr);
        let cells = self.dictionary().marker_size + 2 * self.params.border_bits;

        let mut out: Vec<MarkerDetection> = Vec::new();
        let mut by_id: HashMap<u32, usize> = HashMap::new();
        let mut candidates = 0usize;

        for blob in blobs.iter().filter(|b| self.accepts(b, cells)) {
            candidates += 1;
            let samples = sample_blob(image, blob, cells, &self.params);
            let Some(obs) = decode_cells(
                &samples,
                cells,
                self.dictionary().marker_size,
                self.params.border_bits,
                self.params.min_border_score,
            ) else {
                continue;
            };
            let Some(det) = self.build_detection(blob, obs) else {
                continue;
            };

            match by_id.get(&det.id) {
                Some(&idx) => {
                    if det.score > out[idx].score {
                        out[idx] = det;
                    }
                }
                None => {
                    by_id.insert(det.id, out.len());
                    out.push(det);
                }
            }
        }

        log::debug!(
            "threshold {thr}: {} dark components, {candidates} candidates, {} markers",
            blobs.len(),
            out.len()
        );
        out
    }

    fn accepts(&self, blob: &Blob, cells: usize) -> bool {
        let (w, h) = (blob.width(), blob.height());
        let min_side = self.params.min_marker_side_px.max(cells);
        if w < min_side || h < min_side {
            return false;
        }
        let aspect = w.max(h) as f32 / w.min(h) as f32;
        if aspect > self.params.max_aspect_ratio {
            return false;
        }
        let fill = blob.count as f32 / (w * h) as f32;
        (self.params.min_fill..=self.params.max_fill).contains(&fill)
    }

    fn build_detection(&self, blob: &Blob, obs: MarkerObservation) -> Option<MarkerDetection> {
        let m = self.matcher.match_code(obs.code)?;
        let bits = self.dictionary().bit_count().max(1) as f32;
        let ham_pen = 1.0 - (m.hamming as f32 / bits);
        let score = (obs.border_score * ham_pen).clamp(0.0, 1.0);

        let x0 = blob.min_x as f32;
        let y0 = blob.min_y as f32;
        let x1 = (blob.max_x + 1) as f32;
        let y1 = (blob.max_y + 1) as f32;

        Some(MarkerDetection {
            id: m.id,
            rotation: m.rotation,
            hamming: m.hamming,
            score,
            border_score: obs.border_score,
            code: obs.code,
            corners: [
                Point2::new(x0, y0),
                Point2::new(x1, y0),
                Point2::new(x1, y1),
                Point2::new(x0, y1),
            ],
            center: Point2::new(0.5 * (x0 + x1), 0.5 * (y0 + y1)),
        })
    }
}

/// Convenience wrapper: build a detector and run it once.
pub fn detect_markers(
    image: &GrayImageView<'_>,
    dict: &Dictionary,
    params: &DetectorParams,
) -> Vec<MarkerDetection> {
    MarkerDetector::new(dict.clone(), params.clone()).detect(image)
}

#[derive(Clone, Copy, Debug)]
struct Blob {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
    count: usize,
}

impl Blob {
    #[inline]
    fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    #[inline]
    fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }
}

#[derive(Clone, Copy, Debug)]
struct MarkerObservation {
    code: u64,
    border_score: f32,
}

fn image_threshold(image: &GrayImageView<'_>) -> u8 {
    let mut hist = [0u32; 256];
    for &v in image.data {
        hist[v as usize] += 1;
    }
    otsu_threshold_from_histogram(&hist)
}

/// 4-connected components of pixels `< thr`, in raster order of their seed.
fn dark_components(image: &GrayImageView<'_>, thr: u8) -> Vec<Blob> {
    let (w, h) = (image.width, image.height);
    let mut visited = vec![false; w * h];
    let mut stack: Vec<usize> = Vec::new();
    let mut out = Vec::new();

    for seed in 0..w * h {
        if visited[seed] || image.data[seed] >= thr {
            continue;
        }
        visited[seed] = true;
        stack.push(seed);

        let mut blob = Blob {
            min_x: seed % w,
            min_y: seed / w,
            max_x: seed % w,
            max_y: seed / w,
            count: 0,
        };

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            blob.count += 1;
            blob.min_x = blob.min_x.min(x);
            blob.max_x = blob.max_x.max(x);
            blob.min_y = blob.min_y.min(y);
            blob.max_y = blob.max_y.max(y);

            let mut visit = |n: usize| {
                if !visited[n] && image.data[n] < thr {
                    visited[n] = true;
                    stack.push(n);
                }
            };
            if x > 0 {
                visit(idx - 1);
            }
            if x + 1 < w {
                visit(idx + 1);
            }
            if y > 0 {
                visit(idx - w);
            }
            if y + 1 < h {
                visit(idx + w);
            }
        }

        out.push(blob);
    }

    out
}

/// Mean intensity of the central part of every cell, row-major.
fn sample_blob(
    image: &GrayImageView<'_>,
    blob: &Blob,
    cells: usize,
    params: &DetectorParams,
) -> Vec<u8> {
    let step_x = blob.width() as f32 / cells as f32;
    let step_y = blob.height() as f32 / cells as f32;
    let margin = params.cell_margin.clamp(0.0, 0.45);

    let span = |origin: usize, step: f32, c: usize, limit: usize| -> (usize, usize) {
        let lo = origin as f32 + (c as f32 + margin) * step;
        let hi = origin as f32 + (c as f32 + 1.0 - margin) * step;
        let lo = (lo.floor() as usize).min(limit - 1);
        let hi = (hi.ceil() as usize).clamp(lo + 1, limit);
        (lo, hi)
    };

    let mut samples = Vec::with_capacity(cells * cells);
    for cy in 0..cells {
        let (y0, y1) = span(blob.min_y, step_y, cy, image.height);
        for cx in 0..cells {
            let (x0, x1) = span(blob.min_x, step_x, cx, image.width);
            let mut sum = 0u64;
            for y in y0..y1 {
                for x in x0..x1 {
                    sum += image.get(x, y) as u64;
                }
            }
            let n = ((y1 - y0) * (x1 - x0)) as u64;
            samples.push((sum / n.max(1)) as u8);
        }
    }

    samples
}

fn decode_cells(
    samples: &[u8],
    cells: usize,
    bits: usize,
    border: usize,
    min_border_score: f32,
) -> Option<MarkerObservation> {
    let thr = otsu_threshold_from_samples(samples);

    let mut border_ok = 0u32;
    let mut border_total = 0u32;
    let mut code: u64 = 0;

    for cy in 0..cells {
        for cx in 0..cells {
            let is_black = samples[cy * cells + cx] < thr;
            let is_border = cx < border
                || cy < border
                || cx >= border + bits
                || cy >= border + bits;
            if is_border {
                border_total += 1;
                if is_black {
                    border_ok += 1;
                }
            } else if is_black {
                let idx = (cy - border) * bits + (cx - border); // row-major
                code |= 1u64 << idx;
            }
        }
    }

    let border_score = if border_total > 0 {
        border_ok as f32 / border_total as f32
    } else {
        1.0
    };
    (border_score >= min_border_score).then_some(MarkerObservation { code, border_score })
}
