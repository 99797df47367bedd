//! Gaussian pyramid construction and reconstruction.

use super::{pyr_down, pyr_up};
use crate::image::ImageF32;

/// Per-level `(height, width)` sizes for a depth-`levels` pyramid over
/// a `height` x `width` base image. Returns `levels + 1` entries.
pub fn level_sizes(height: usize, width: usize, levels: usize) -> Vec<(usize, usize)> {
    let mut sizes = Vec::with_capacity(levels + 1);
    let (mut h, mut w) = (height, width);
    sizes.push((h, w));
    for _ in 0..levels {
        h = h.div_ceil(2);
        w = w.div_ceil(2);
        sizes.push((h, w));
    }
    sizes
}

fn down_image(img: &ImageF32) -> ImageF32 {
    ImageF32::from_planes(img.planes().iter().map(pyr_down).collect())
}

pub(crate) fn up_image(img: &ImageF32, target_h: usize, target_w: usize) -> ImageF32 {
    ImageF32::from_planes(
        img.planes()
            .iter()
            .map(|p| pyr_up(p, target_h, target_w))
            .collect(),
    )
}

/// Builds a Gaussian pyramid of depth `levels`.
///
/// The result holds `levels + 1` images; index 0 is the input itself,
/// each following index halves both dimensions (rounding up).
pub fn build_gaussian_pyramid(img: &ImageF32, levels: usize) -> Vec<ImageF32> {
    let mut pyramid = Vec::with_capacity(levels + 1);
    pyramid.push(img.clone());
    for i in 0..levels {
        pyramid.push(down_image(&pyramid[i]));
    }
    pyramid
}

/// Reconstructs a full-size image from the top (smallest) pyramid
/// level by repeated upsampling.
///
/// `full` is the `(height, width)` of level 0; the intermediate sizes
/// are re-derived from it, so `top` must have the size that `levels`
/// halvings of `full` produce.
pub fn reconstruct_from_top(top: &ImageF32, levels: usize, full: (usize, usize)) -> ImageF32 {
    let sizes = level_sizes(full.0, full.1, levels);
    debug_assert_eq!((top.height(), top.width()), sizes[levels]);
    let mut img = top.clone();
    for level in (0..levels).rev() {
        let (h, w) = sizes[level];
        img = up_image(&img, h, w);
    }
    img
}
