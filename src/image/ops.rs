//! Small raster operations used by the breath analyzer.
//!
//! These mirror the blur / absdiff / dilate / threshold sequence of a
//! classical frame-difference motion detector, over f32 planes with
//! values in 8-bit range [0, 255].

use ndarray::Array2;

// Binomial 5-tap kernel, the fixed kernel for a 5x5 Gaussian.
const KERNEL5: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

#[inline]
fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Separable 5x5 Gaussian blur with replicate borders.
pub fn gaussian_blur_5x5(src: &Array2<f32>) -> Array2<f32> {
    let (h, w) = src.dim();
    let mut tmp = Array2::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &weight) in KERNEL5.iter().enumerate() {
                let sx = clamp_index(x as isize + k as isize - 2, w);
                acc += weight * src[[y, sx]];
            }
            tmp[[y, x]] = acc;
        }
    }
    let mut dst = Array2::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &weight) in KERNEL5.iter().enumerate() {
                let sy = clamp_index(y as isize + k as isize - 2, h);
                acc += weight * tmp[[sy, x]];
            }
            dst[[y, x]] = acc;
        }
    }
    dst
}

/// Element-wise absolute difference.
pub fn abs_diff(a: &Array2<f32>, b: &Array2<f32>) -> Array2<f32> {
    debug_assert_eq!(a.dim(), b.dim());
    let mut out = a.clone();
    out.zip_mut_with(b, |x, &y| *x = (*x - y).abs());
    out
}

/// Grayscale dilation with a 2x2 structuring element.
///
/// The anchor sits at the bottom-right of the element, so each output
/// sample is the maximum over itself and its left / top / top-left
/// neighbors.
pub fn dilate_2x2(src: &Array2<f32>) -> Array2<f32> {
    let (h, w) = src.dim();
    let mut dst = src.clone();
    for y in 0..h {
        for x in 0..w {
            let mut m = src[[y, x]];
            if x > 0 {
                m = m.max(src[[y, x - 1]]);
            }
            if y > 0 {
                m = m.max(src[[y - 1, x]]);
                if x > 0 {
                    m = m.max(src[[y - 1, x - 1]]);
                }
            }
            dst[[y, x]] = m;
        }
    }
    dst
}

/// Binary threshold: samples above `thresh` become `max_value`, all
/// others zero.
pub fn threshold_binary(src: &Array2<f32>, thresh: f32, max_value: f32) -> Array2<f32> {
    src.mapv(|v| if v > thresh { max_value } else { 0.0 })
}

/// Inverts a binary image in the given value range.
pub fn invert_binary(src: &Array2<f32>, max_value: f32) -> Array2<f32> {
    src.mapv(|v| max_value - v)
}
