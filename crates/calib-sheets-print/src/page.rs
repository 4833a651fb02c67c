//! Physical page size to pixel conversion.

use serde::{Deserialize, Serialize};

use crate::PrintError;

const MM_PER_INCH: f64 = 25.4;
const METERS_PER_INCH: f64 = 0.0254;

/// Printed page in millimeters at a given resolution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
    pub dpi: u32,
}

impl PageSize {
    pub fn new(width_mm: f64, height_mm: f64, dpi: u32) -> Self {
        Self {
            width_mm,
            height_mm,
            dpi,
        }
    }

    /// Pixel size `(width, height)`, truncated per axis.
    pub fn pixel_size(&self) -> Result<(usize, usize), PrintError> {
        let valid = |mm: f64| mm.is_finite() && mm > 0.0;
        if !valid(self.width_mm) || !valid(self.height_mm) {
            return Err(PrintError::InvalidConfig(format!(
                "page size {}x{} mm must be positive",
                self.width_mm, self.height_mm
            )));
        }
        if self.dpi == 0 {
            return Err(PrintError::InvalidConfig("dpi must be > 0".to_string()));
        }

        let width = mm_to_px(self.width_mm, self.dpi);
        let height = mm_to_px(self.height_mm, self.dpi);
        if width == 0 || height == 0 {
            return Err(PrintError::InvalidConfig(format!(
                "page {}x{} mm is below one pixel at {} dpi",
                self.width_mm, self.height_mm, self.dpi
            )));
        }
        if width.checked_mul(height).is_none() {
            return Err(PrintError::InvalidConfig(format!(
                "page {}x{} px at {} dpi is too large to allocate",
                width, height, self.dpi
            )));
        }
        Ok((width, height))
    }

    /// Resolution as PNG `pHYs` pixels per meter.
    #[inline]
    pub fn pixels_per_meter(&self) -> u32 {
        dpi_to_ppm(self.dpi)
    }
}

/// `trunc(mm / 25.4 * dpi)`.
#[inline]
pub fn mm_to_px(mm: f64, dpi: u32) -> usize {
    (mm * (1.0 / MM_PER_INCH) * dpi as f64) as usize
}

#[inline]
pub fn dpi_to_ppm(dpi: u32) -> u32 {
    (dpi as f64 / METERS_PER_INCH).round() as u32
}

#[inline]
pub fn ppm_to_dpi(ppm: u32) -> u32 {
    (ppm as f64 * METERS_PER_INCH).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_page_truncates() {
        let page = PageSize::new(560.0, 360.0, 300);
        assert_eq!(page.pixel_size().expect("size"), (6614, 4251));
    }

    #[test]
    fn a4_at_common_resolutions() {
        assert_eq!(PageSize::new(210.0, 297.0, 300).pixel_size().expect("a4"), (2480, 3507));
        assert_eq!(PageSize::new(210.0, 297.0, 72).pixel_size().expect("a4"), (595, 841));
    }

    #[test]
    fn dpi_survives_ppm_conversion() {
        assert_eq!(dpi_to_ppm(300), 11811);
        for dpi in [72, 96, 150, 300, 600, 1200] {
            assert_eq!(ppm_to_dpi(dpi_to_ppm(dpi)), dpi);
        }
    }

    #[test]
    fn degenerate_pages_are_rejected() {
        assert!(PageSize::new(0.0, 10.0, 300).pixel_size().is_err());
        assert!(PageSize::new(10.0, f64::NAN, 300).pixel_size().is_err());
        assert!(PageSize::new(10.0, 10.0, 0).pixel_size().is_err());
        assert!(PageSize::new(0.01, 0.01, 72).pixel_size().is_err());
    }

    #[test]
    fn huge_pages_are_rejected() {
        let err = PageSize::new(1e300, 1e300, 300).pixel_size().unwrap_err();
        assert!(matches!(err, PrintError::InvalidConfig(_)));
    }
}
