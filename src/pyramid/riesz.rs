//! Riesz pyramid: a two-orientation steerable extension of the
//! Laplacian pyramid.
//!
//! Each level carries the band-pass image plus the pair of Riesz
//! transform responses. Treating the triple as a quaternion gives a
//! per-pixel amplitude, orientation, and phase; the conjugate product
//! of consecutive frames yields the phase increment the temporal
//! filters act on.

use super::laplacian::{build_laplacian_pyramid, reconstruct_laplacian};
use crate::image::ImageF32;
use ndarray::Array2;

const EPS: f32 = 1e-9;

/// One pyramid level: band-pass image and its Riesz transform pair.
#[derive(Debug, Clone)]
pub struct RieszLevel {
    /// Band-pass (Laplacian) image.
    pub band: Array2<f32>,
    /// Horizontal Riesz response.
    pub riesz_x: Array2<f32>,
    /// Vertical Riesz response.
    pub riesz_y: Array2<f32>,
}

/// A depth-L Riesz pyramid: L band levels plus the low-pass residual.
#[derive(Debug, Clone)]
pub struct RieszPyramid {
    /// Band levels, finest first.
    pub levels: Vec<RieszLevel>,
    /// Low-pass residual (the Gaussian top).
    pub residual: Array2<f32>,
}

// First-order central difference; a compact approximation of the
// Riesz transform on band-pass data.
fn riesz_x(band: &Array2<f32>) -> Array2<f32> {
    let (h, w) = band.dim();
    let mut out = Array2::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let left = band[[y, x.saturating_sub(1)]];
            let right = band[[y, (x + 1).min(w - 1)]];
            out[[y, x]] = 0.5 * (right - left);
        }
    }
    out
}

fn riesz_y(band: &Array2<f32>) -> Array2<f32> {
    let (h, w) = band.dim();
    let mut out = Array2::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let up = band[[y.saturating_sub(1), x]];
            let down = band[[(y + 1).min(h - 1), x]];
            out[[y, x]] = 0.5 * (down - up);
        }
    }
    out
}

impl RieszPyramid {
    /// Decomposes a single-plane [0,1] image into `depth` band levels
    /// plus residual.
    pub fn build(input: &Array2<f32>, depth: usize) -> Self {
        let img = ImageF32::from_planes(vec![input.clone()]);
        let mut lap = build_laplacian_pyramid(&img, depth);
        let residual = lap.pop().expect("pyramid is never empty").into_planes().remove(0);
        let levels = lap
            .into_iter()
            .map(|band_img| {
                let band = band_img.into_planes().remove(0);
                let rx = riesz_x(&band);
                let ry = riesz_y(&band);
                RieszLevel {
                    band,
                    riesz_x: rx,
                    riesz_y: ry,
                }
            })
            .collect();
        Self { levels, residual }
    }

    /// Number of band levels.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Per-pixel phase increment between this pyramid and `prev` at
    /// one level, resolved into horizontal and vertical components.
    ///
    /// Computed from the quaternion conjugate product of the two
    /// levels, so the result is already unwrapped (it is a difference,
    /// not an absolute phase).
    pub fn phase_difference(
        &self,
        prev: &RieszPyramid,
        level: usize,
    ) -> (Array2<f32>, Array2<f32>) {
        let cur = &self.levels[level];
        let old = &prev.levels[level];
        let dim = cur.band.dim();
        let mut dphi_x = Array2::zeros(dim);
        let mut dphi_y = Array2::zeros(dim);
        for ((y, x), out_x) in dphi_x.indexed_iter_mut() {
            let (cb, cx, cy) = (
                cur.band[[y, x]],
                cur.riesz_x[[y, x]],
                cur.riesz_y[[y, x]],
            );
            let (pb, px, py) = (
                old.band[[y, x]],
                old.riesz_x[[y, x]],
                old.riesz_y[[y, x]],
            );
            // Conjugate product q = cur * conj(prev)
            let q_real = cb * pb + cx * px + cy * py;
            let q_x = pb * cx - cb * px;
            let q_y = pb * cy - cb * py;
            let amplitude = (q_real * q_real + q_x * q_x + q_y * q_y).sqrt();
            let phase = (q_real / (amplitude + EPS)).clamp(-1.0, 1.0).acos();
            let orient = (q_x * q_x + q_y * q_y).sqrt() + EPS;
            *out_x = phase * q_x / orient;
            dphi_y[[y, x]] = phase * q_y / orient;
        }
        (dphi_x, dphi_y)
    }

    /// Phase-shifts one band by the given (already amplified) phase
    /// components, amplitude-weighted through the Riesz pair.
    pub fn shifted_band(
        &self,
        level: usize,
        phi_x: &Array2<f32>,
        phi_y: &Array2<f32>,
    ) -> Array2<f32> {
        let lvl = &self.levels[level];
        let mut out = Array2::zeros(lvl.band.dim());
        for ((y, x), o) in out.indexed_iter_mut() {
            let px = phi_x[[y, x]];
            let py = phi_y[[y, x]];
            let mag = (px * px + py * py).sqrt();
            let (sin_m, cos_m) = mag.sin_cos();
            let directional =
                (px * lvl.riesz_x[[y, x]] + py * lvl.riesz_y[[y, x]]) / (mag + EPS);
            *o = cos_m * lvl.band[[y, x]] - sin_m * directional;
        }
        out
    }

    /// Collapses band images (one per level, finest first) and the
    /// stored residual back into a full-resolution plane.
    pub fn collapse(&self, bands: Vec<Array2<f32>>) -> Array2<f32> {
        debug_assert_eq!(bands.len(), self.levels.len());
        let mut pyramid: Vec<ImageF32> = bands
            .into_iter()
            .map(|b| ImageF32::from_planes(vec![b]))
            .collect();
        pyramid.push(ImageF32::from_planes(vec![self.residual.clone()]));
        reconstruct_laplacian(&pyramid).into_planes().remove(0)
    }

    /// Collapses the pyramid with its own unmodified bands.
    pub fn collapse_identity(&self) -> Array2<f32> {
        self.collapse(self.levels.iter().map(|l| l.band.clone()).collect())
    }
}
