//! Multi-resolution pyramid primitives.
//!
//! All three magnification algorithms decompose frames with the same
//! separable 5-tap kernel and `ceil(x/2)` halving. A depth-L pyramid
//! owns L+1 matrices indexed `0..=L`, level 0 being the input
//! resolution.

mod gaussian;
mod laplacian;
mod riesz;

pub use gaussian::{build_gaussian_pyramid, level_sizes, reconstruct_from_top};
pub use laplacian::{build_laplacian_pyramid, reconstruct_laplacian};
pub use riesz::{RieszLevel, RieszPyramid};

use crate::image::gaussian_blur_5x5;
use ndarray::Array2;

// Binomial 5-tap kernel [1, 4, 6, 4, 1] / 16.
const KERNEL5: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Largest usable pyramid depth for a `width` x `height` image.
///
/// Counts how many times the smaller dimension can be halved (rounding
/// up) while it is still larger than 5 pixels.
pub fn max_levels(width: u32, height: u32) -> u32 {
    if width > 5 && height > 5 {
        1 + max_levels(width.div_ceil(2), height.div_ceil(2))
    } else {
        0
    }
}

/// Low-pass then decimate by two in each dimension.
///
/// Output size is `ceil(n/2)` per axis (even samples are kept).
pub(crate) fn pyr_down(src: &Array2<f32>) -> Array2<f32> {
    let blurred = gaussian_blur_5x5(src);
    let (h, w) = src.dim();
    let (oh, ow) = (h.div_ceil(2), w.div_ceil(2));
    let mut dst = Array2::zeros((oh, ow));
    for y in 0..oh {
        for x in 0..ow {
            dst[[y, x]] = blurred[[y * 2, x * 2]];
        }
    }
    dst
}

/// Upsamples by two onto an explicit `(target_h, target_w)` grid.
///
/// Source samples land on even coordinates; the 5-tap kernel
/// interpolates the rest. Tap weights are renormalized over the taps
/// that hit a source sample, so constant images survive the round trip
/// exactly, borders included.
pub(crate) fn pyr_up(src: &Array2<f32>, target_h: usize, target_w: usize) -> Array2<f32> {
    let (sh, sw) = src.dim();
    debug_assert_eq!(sh, target_h.div_ceil(2));
    debug_assert_eq!(sw, target_w.div_ceil(2));

    // Horizontal pass: (sh, sw) -> (sh, target_w)
    let mut hor = Array2::zeros((sh, target_w));
    for y in 0..sh {
        for x in 0..target_w {
            let mut acc = 0.0;
            let mut norm = 0.0;
            for (k, &weight) in KERNEL5.iter().enumerate() {
                let s = x as isize + k as isize - 2;
                if s >= 0 && (s as usize) < target_w && s % 2 == 0 {
                    acc += weight * src[[y, s as usize / 2]];
                    norm += weight;
                }
            }
            hor[[y, x]] = acc / norm;
        }
    }

    // Vertical pass: (sh, target_w) -> (target_h, target_w)
    let mut dst = Array2::zeros((target_h, target_w));
    for y in 0..target_h {
        for x in 0..target_w {
            let mut acc = 0.0;
            let mut norm = 0.0;
            for (k, &weight) in KERNEL5.iter().enumerate() {
                let s = y as isize + k as isize - 2;
                if s >= 0 && (s as usize) < target_h && s % 2 == 0 {
                    acc += weight * hor[[s as usize / 2, x]];
                    norm += weight;
                }
            }
            dst[[y, x]] = acc / norm;
        }
    }
    dst
}
