//! Interior floating-point image representation.
//!
//! All magnification math runs on planar f32 images in [0,1] (one
//! `ndarray` plane per channel). The u8 interleaved [`Frame`] type is
//! converted at the component boundary and back when a result is
//! published.
//!
//! [`Frame`]: crate::capture::Frame

mod color;
mod ops;

pub use color::{
    bgr_to_gray, bgr_to_ycrcb, frame_to_f32, image_to_frame_clamped, image_to_frame_rescaled,
    ycrcb_to_bgr,
};
pub use ops::{abs_diff, dilate_2x2, gaussian_blur_5x5, invert_binary, threshold_binary};

use ndarray::Array2;

/// A planar f32 image: one plane per channel, all planes the same size.
///
/// Color images carry three planes in the order of the colorspace they
/// currently hold (BGR at the boundary, YCrCb inside the motion
/// algorithms).
#[derive(Debug, Clone)]
pub struct ImageF32 {
    planes: Vec<Array2<f32>>,
}

impl ImageF32 {
    /// Wraps existing planes. All planes must share one shape.
    pub fn from_planes(planes: Vec<Array2<f32>>) -> Self {
        debug_assert!(!planes.is_empty());
        debug_assert!(planes.iter().all(|p| p.dim() == planes[0].dim()));
        Self { planes }
    }

    /// Creates a zero-filled image.
    pub fn zeros(width: usize, height: usize, channels: usize) -> Self {
        Self {
            planes: (0..channels).map(|_| Array2::zeros((height, width))).collect(),
        }
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.planes[0].ncols()
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.planes[0].nrows()
    }

    /// Channel count.
    #[inline]
    pub fn channels(&self) -> usize {
        self.planes.len()
    }

    /// Borrows one plane.
    #[inline]
    pub fn plane(&self, c: usize) -> &Array2<f32> {
        &self.planes[c]
    }

    /// Mutably borrows one plane.
    #[inline]
    pub fn plane_mut(&mut self, c: usize) -> &mut Array2<f32> {
        &mut self.planes[c]
    }

    /// Borrows all planes.
    #[inline]
    pub fn planes(&self) -> &[Array2<f32>] {
        &self.planes
    }

    /// Mutably borrows all planes.
    #[inline]
    pub fn planes_mut(&mut self) -> &mut [Array2<f32>] {
        &mut self.planes
    }

    /// Consumes the image, returning its planes.
    pub fn into_planes(self) -> Vec<Array2<f32>> {
        self.planes
    }

    /// Element-wise sum of two images of identical shape.
    pub fn add(&self, other: &ImageF32) -> ImageF32 {
        debug_assert_eq!(self.channels(), other.channels());
        ImageF32 {
            planes: self
                .planes
                .iter()
                .zip(&other.planes)
                .map(|(a, b)| a + b)
                .collect(),
        }
    }

    /// Multiplies every sample by a scalar.
    pub fn scale(&self, factor: f32) -> ImageF32 {
        ImageF32 {
            planes: self.planes.iter().map(|p| p * factor).collect(),
        }
    }

    /// Minimum and maximum sample over all planes.
    pub fn min_max(&self) -> (f32, f32) {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for p in &self.planes {
            for &v in p.iter() {
                min = min.min(v);
                max = max.max(v);
            }
        }
        (min, max)
    }
}
