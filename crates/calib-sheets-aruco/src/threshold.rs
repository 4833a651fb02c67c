//! Otsu thresholding for marker decoding.

/// Compute Otsu threshold from a set of sample intensities.
pub(crate) fn otsu_threshold_from_samples(samples: &[u8]) -> u8 {
    let mut hist = [0u32; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    otsu_threshold_from_histogram(&hist)
}

/// Otsu threshold over a 256-bin histogram.
///
/// Pixels `< threshold` are treated as dark. Degenerate histograms (one or
/// two populated bins) fall back to the midpoint of the occupied range.
pub(crate) fn otsu_threshold_from_histogram(hist: &[u32; 256]) -> u8 {
    let Some(min_v) = hist.iter().position(|&h| h > 0) else {
        return 127;
    };
    let max_v = hist.iter().rposition(|&h| h > 0).unwrap_or(min_v);
    if min_v == max_v {
        return min_v as u8;
    }

    let nonzero_bins = hist.iter().filter(|&&h| h > 0).count();
    if nonzero_bins <= 2 {
        return ((min_v + max_v + 1) / 2) as u8;
    }

    let total: f64 = hist.iter().map(|&h| h as f64).sum();
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| (i as f64) * (h as f64))
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127usize;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += (t as f64) * (h as f64);
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t;
        }
    }

    // `best_t` is the last dark level; the strict `<` test needs one above it.
    (best_t + 1).min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_samples_split_at_midpoint() {
        let samples = [0u8, 0, 255, 255, 255];
        let t = otsu_threshold_from_samples(&samples);
        assert_eq!(t, 128);
    }

    #[test]
    fn separates_two_noisy_modes() {
        let mut samples = Vec::new();
        for v in [10u8, 12, 15, 20, 22] {
            samples.extend(std::iter::repeat(v).take(40));
        }
        for v in [200u8, 210, 220, 230] {
            samples.extend(std::iter::repeat(v).take(40));
        }
        let t = otsu_threshold_from_samples(&samples);
        assert!(t > 22 && t <= 200, "threshold {t}");
    }

    #[test]
    fn flat_image_returns_its_level() {
        assert_eq!(otsu_threshold_from_samples(&[90; 16]), 90);
        assert_eq!(otsu_threshold_from_samples(&[]), 127);
    }
}
