//! Ideal temporal bandpass via row-wise DFT.

use ndarray::Array2;
use num_complex::Complex;
use rustfft::FftPlanner;

/// Ideal (rectangular-mask) bandpass filter.
///
/// Holds an FFT planner so repeated applications at the same window
/// length reuse the plan.
pub struct IdealBandpass {
    planner: FftPlanner<f32>,
}

impl IdealBandpass {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Filters each row of `mat` as a temporal signal sampled at
    /// `framerate` Hz, keeping only frequencies in `[low_hz, high_hz]`
    /// (edges inclusive).
    ///
    /// Rows are pixels, columns are time samples. DC survives only
    /// when `low_hz` is zero. Output shape equals input shape.
    pub fn apply(&mut self, mat: &Array2<f32>, low_hz: f32, high_hz: f32, framerate: f32) -> Array2<f32> {
        let (rows, n) = mat.dim();
        if n == 0 || rows == 0 {
            return mat.clone();
        }
        let forward = self.planner.plan_fft_forward(n);
        let inverse = self.planner.plan_fft_inverse(n);

        // Precompute the frequency mask once per call.
        let bin_hz = framerate / n as f32;
        let mask: Vec<bool> = (0..n)
            .map(|k| {
                let freq = k.min(n - k) as f32 * bin_hz;
                freq >= low_hz && freq <= high_hz
            })
            .collect();

        let mut out = Array2::zeros((rows, n));
        let mut buffer: Vec<Complex<f32>> = vec![Complex::default(); n];
        for (r, row) in mat.outer_iter().enumerate() {
            for (b, &v) in buffer.iter_mut().zip(row.iter()) {
                *b = Complex::new(v, 0.0);
            }
            forward.process(&mut buffer);
            for (b, &keep) in buffer.iter_mut().zip(&mask) {
                if !keep {
                    *b = Complex::default();
                }
            }
            inverse.process(&mut buffer);
            let scale = 1.0 / n as f32;
            for (c, b) in out.row_mut(r).iter_mut().zip(&buffer) {
                *c = b.re * scale;
            }
        }
        out
    }
}

impl Default for IdealBandpass {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn tone(n: usize, freq_hz: f32, fs: f32) -> Vec<f32> {
        (0..n).map(|t| (TAU * freq_hz * t as f32 / fs).sin()).collect()
    }

    #[test]
    fn test_passband_tone_survives() {
        let n = 64;
        let fs = 32.0;
        let signal = tone(n, 2.0, fs); // exactly bin 4
        let mat = Array2::from_shape_vec((1, n), signal.clone()).unwrap();

        let out = IdealBandpass::new().apply(&mat, 1.0, 3.0, fs);
        for (a, b) in signal.iter().zip(out.row(0).iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_stopband_tone_removed() {
        let n = 64;
        let fs = 32.0;
        let mat = Array2::from_shape_vec((1, n), tone(n, 8.0, fs)).unwrap();

        let out = IdealBandpass::new().apply(&mat, 1.0, 3.0, fs);
        for &v in out.row(0).iter() {
            assert!(v.abs() < 1e-4);
        }
    }

    #[test]
    fn test_dc_removed_unless_low_is_zero() {
        let n = 32;
        let fs = 16.0;
        let mat = Array2::from_elem((2, n), 5.0);

        let mut filter = IdealBandpass::new();
        let no_dc = filter.apply(&mat, 0.5, 4.0, fs);
        assert!(no_dc.iter().all(|v| v.abs() < 1e-4));

        let with_dc = filter.apply(&mat, 0.0, 4.0, fs);
        assert!(with_dc.iter().all(|v| (v - 5.0).abs() < 1e-4));
    }

    #[test]
    fn test_band_edges_inclusive() {
        let n = 64;
        let fs = 32.0;
        // Bin 2 is exactly 1.0 Hz
        let signal = tone(n, 1.0, fs);
        let mat = Array2::from_shape_vec((1, n), signal.clone()).unwrap();

        let out = IdealBandpass::new().apply(&mat, 1.0, 2.0, fs);
        for (a, b) in signal.iter().zip(out.row(0).iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_mixed_tones_separated() {
        let n = 128;
        let fs = 32.0;
        let in_band = tone(n, 2.0, fs);
        let out_band = tone(n, 10.0, fs);
        let mixed: Vec<f32> = in_band.iter().zip(&out_band).map(|(a, b)| a + b).collect();
        let mat = Array2::from_shape_vec((1, n), mixed).unwrap();

        let out = IdealBandpass::new().apply(&mat, 1.0, 3.0, fs);
        for (a, b) in in_band.iter().zip(out.row(0).iter()) {
            assert!((a - b).abs() < 1e-3);
        }
    }
}
