//! Laplacian pyramid construction and reconstruction.

use super::gaussian::{build_gaussian_pyramid, up_image};
use crate::image::ImageF32;

/// Builds a Laplacian pyramid of depth `levels`.
///
/// Levels `0..levels` hold the band-pass residuals
/// `G_i - upsample(G_{i+1})`; index `levels` holds the Gaussian top
/// itself, so the result has `levels + 1` images.
pub fn build_laplacian_pyramid(img: &ImageF32, levels: usize) -> Vec<ImageF32> {
    let gauss = build_gaussian_pyramid(img, levels);
    let mut pyramid = Vec::with_capacity(levels + 1);
    for i in 0..levels {
        let up = up_image(&gauss[i + 1], gauss[i].height(), gauss[i].width());
        pyramid.push(gauss[i].add(&up.scale(-1.0)));
    }
    pyramid.push(gauss[levels].clone());
    pyramid
}

/// Collapses a Laplacian pyramid back into a full-resolution image.
///
/// Reverse fold: starting from the stored Gaussian top, upsample and
/// add each band level. Uses the same upsampler as construction, so an
/// untouched pyramid reconstructs its input exactly.
pub fn reconstruct_laplacian(pyramid: &[ImageF32]) -> ImageF32 {
    debug_assert!(!pyramid.is_empty());
    let levels = pyramid.len() - 1;
    let mut img = pyramid[levels].clone();
    for level in (0..levels).rev() {
        let up = up_image(&img, pyramid[level].height(), pyramid[level].width());
        img = up.add(&pyramid[level]);
    }
    img
}
