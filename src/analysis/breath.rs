//! Per-frame breath measure from post-magnification motion images.

use super::contour::{find_external_contours, Contour};
use crate::image::{
    abs_diff, bgr_to_gray, dilate_2x2, gaussian_blur_5x5, invert_binary, threshold_binary,
    ImageF32,
};
use ndarray::Array2;

const DIFF_THRESHOLD: f32 = 20.0;
const MAX_CONTOURS: usize = 50;
const MIN_CONTOURS: usize = 7;

/// Result of analyzing one motion image.
#[derive(Debug, Clone)]
pub struct BreathAnalysis {
    /// Mean of per-contour mean y-coordinates, or 0 when too few
    /// contours survive.
    pub measure: i32,
    /// Green-on-black rendering of the kept contours, BGR planes in
    /// [0, 1].
    pub overlay: ImageF32,
}

/// Extracts a scalar breath measure by differencing each motion image
/// against the previous raw frame.
///
/// The previous frame is stored already blurred and grayscale (8-bit
/// range), so its color space is fixed by construction.
#[derive(Debug, Default)]
pub struct BreathAnalyzer {
    prev_gray: Option<Array2<f32>>,
}

fn blurred_gray(img: &ImageF32) -> Array2<f32> {
    gaussian_blur_5x5(&bgr_to_gray(img)).mapv(|v| v * 255.0)
}

impl BreathAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the stored previous frame.
    pub fn reset(&mut self) {
        self.prev_gray = None;
    }

    /// Stores `raw` as the baseline for the next analysis. Used for
    /// the first frame, which produces no measure.
    pub fn seed(&mut self, raw: &ImageF32) {
        self.prev_gray = Some(blurred_gray(raw));
    }

    /// Analyzes one motion image against the stored previous raw
    /// frame, then stores `raw` for the next call.
    ///
    /// Returns a zero measure if no baseline was seeded yet.
    pub fn analyze(&mut self, motion: &ImageF32, raw: &ImageF32) -> BreathAnalysis {
        let prev = self.prev_gray.take();
        self.prev_gray = Some(blurred_gray(raw));

        let Some(prev) = prev else {
            return BreathAnalysis {
                measure: 0,
                overlay: ImageF32::zeros(motion.width(), motion.height(), 3),
            };
        };

        let current = blurred_gray(motion);
        let diff = abs_diff(&prev, &current);
        let dilated = dilate_2x2(&diff);
        let thresholded = threshold_binary(&dilated, DIFF_THRESHOLD, 255.0);
        let mask = invert_binary(&thresholded, 255.0);

        let mut contours = find_external_contours(&mask);
        let total = contours.len();
        contours.sort_by(|a, b| {
            b.area()
                .partial_cmp(&a.area())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        contours.truncate(MAX_CONTOURS);

        let measure = if total <= MIN_CONTOURS {
            0
        } else {
            let sum: f64 = contours.iter().map(Contour::mean_y).sum();
            (sum / contours.len() as f64) as i32
        };

        tracing::trace!(contours = total, measure, "Breath analysis");

        BreathAnalysis {
            measure,
            overlay: render_overlay(&contours, motion.width(), motion.height()),
        }
    }
}

/// Draws contours in green on a black BGR canvas, two pixels thick.
fn render_overlay(contours: &[Contour], width: usize, height: usize) -> ImageF32 {
    let mut overlay = ImageF32::zeros(width, height, 3);
    let green = overlay.plane_mut(1);
    for contour in contours {
        for &(x, y) in &contour.points {
            let (x, y) = (x as usize, y as usize);
            green[[y, x]] = 1.0;
            if x + 1 < width {
                green[[y, x + 1]] = 1.0;
            }
            if y + 1 < height {
                green[[y + 1, x]] = 1.0;
            }
        }
    }
    overlay
}
