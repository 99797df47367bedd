//! Magnification settings and their precondition checks.

use crate::capture::Rect;
use crate::pyramid::max_levels;
use serde::{Deserialize, Serialize};

/// Which magnification algorithm is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MagnifyMode {
    /// Pass frames through untouched.
    #[default]
    Off,
    /// Gaussian-pyramid color magnification.
    Color,
    /// Laplacian-pyramid motion magnification.
    Laplace,
    /// Riesz-pyramid phase-based motion magnification.
    Riesz,
}

/// Settings shared by the three algorithms.
///
/// Changing `mode` or `levels` (and, at the processing loop level, the
/// ROI) resets all algorithm state; the remaining fields take effect
/// on the next frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagnifySettings {
    /// Active algorithm.
    pub mode: MagnifyMode,
    /// Force single-channel processing.
    pub grayscale: bool,
    /// Pyramid depth; a depth-L decomposition owns L+1 matrices.
    pub levels: u32,
    /// Amplification magnitude.
    pub amplification: f32,
    /// Lower temporal cutoff in Hz.
    pub co_low: f32,
    /// Upper temporal cutoff in Hz.
    pub co_high: f32,
    /// Cutoff wavelength; drives the Laplacian delta and the Riesz
    /// phase gain.
    pub co_wavelength: f32,
    /// Chromatic attenuation in [0, 1] (Laplace mode).
    pub chrom_attenuation: f32,
    /// Capture framerate in Hz; drives the color window size and the
    /// Butterworth coefficients.
    pub framerate: f32,
    /// Laplace mode: publish the contour overlay instead of the
    /// magnified frame.
    pub magnified_or_contours: bool,
    /// Append per-window `frame,breath` lines to a CSV file.
    pub csv: bool,
}

impl Default for MagnifySettings {
    fn default() -> Self {
        Self {
            mode: MagnifyMode::Off,
            grayscale: false,
            levels: 4,
            amplification: 10.0,
            co_low: 0.5,
            co_high: 1.0,
            co_wavelength: 16.0,
            chrom_attenuation: 0.1,
            framerate: 30.0,
            magnified_or_contours: false,
            csv: false,
        }
    }
}

impl MagnifySettings {
    /// Checks the settings against an ROI.
    ///
    /// Nothing is mutated on failure; the caller keeps its previous
    /// settings.
    pub fn validate(&self, roi: Rect) -> Result<(), SettingsError> {
        if roi.w < 5 || roi.h < 5 {
            return Err(SettingsError::RoiTooSmall {
                width: roi.w,
                height: roi.h,
            });
        }
        let max = max_levels(roi.w, roi.h);
        if self.levels < 1 || self.levels > max {
            return Err(SettingsError::LevelsOutOfRange {
                levels: self.levels,
                max,
            });
        }
        if self.co_low >= self.co_high {
            return Err(SettingsError::CutoffOrder {
                low: self.co_low,
                high: self.co_high,
            });
        }
        if !(0.0..=1.0).contains(&self.chrom_attenuation) {
            return Err(SettingsError::ChromAttenuationRange(self.chrom_attenuation));
        }
        if !(self.framerate > 0.0) {
            return Err(SettingsError::InvalidFramerate(self.framerate));
        }
        Ok(())
    }
}

/// Precondition failures surfaced at the configuration boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("region of interest {width}x{height} is smaller than 5x5")]
    RoiTooSmall { width: u32, height: u32 },
    #[error("pyramid depth {levels} outside 1..={max}")]
    LevelsOutOfRange { levels: u32, max: u32 },
    #[error("lower cutoff {low} Hz must be below upper cutoff {high} Hz")]
    CutoffOrder { low: f32, high: f32 },
    #[error("chromatic attenuation {0} outside [0, 1]")]
    ChromAttenuationRange(f32),
    #[error("framerate {0} Hz is not positive")]
    InvalidFramerate(f32),
}
