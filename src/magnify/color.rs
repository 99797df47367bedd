//! Gaussian-pyramid color magnification.
//!
//! Each frame contributes the flattened top of its Gaussian pyramid as
//! one column of a (pixels x time) matrix; the ideal bandpass runs
//! along the time axis over a sliding power-of-two window, and the
//! amplified signal is upsampled back and added onto the saved inputs.

use super::{AlgorithmState, Magnificator};
use crate::filter::IdealBandpass;
use crate::image::{frame_to_f32, image_to_frame_rescaled, ImageF32};
use crate::pyramid::{build_gaussian_pyramid, level_sizes, reconstruct_from_top};
use ndarray::{Array2, ArrayView1};
use std::collections::VecDeque;

pub(super) struct ColorState {
    /// Sliding window of flattened pyramid tops, oldest first.
    columns: VecDeque<Vec<f32>>,
    /// (height, width) of the pyramid top.
    level_dim: (usize, usize),
    /// (height, width) of the full frame.
    full_dim: (usize, usize),
    /// Channel count latched from the first frame.
    channels: usize,
    filter: IdealBandpass,
}

/// Channel-interleaved row-major flattening of one image.
fn flatten(img: &ImageF32) -> Vec<f32> {
    let (h, w, c) = (img.height(), img.width(), img.channels());
    let mut out = Vec::with_capacity(h * w * c);
    for y in 0..h {
        for x in 0..w {
            for ch in 0..c {
                out.push(img.plane(ch)[[y, x]]);
            }
        }
    }
    out
}

fn unflatten(column: ArrayView1<'_, f32>, dim: (usize, usize), channels: usize) -> ImageF32 {
    let (h, w) = dim;
    let mut img = ImageF32::zeros(w, h, channels);
    for y in 0..h {
        for x in 0..w {
            for ch in 0..channels {
                img.plane_mut(ch)[[y, x]] = column[(y * w + x) * channels + ch];
            }
        }
    }
    img
}

impl Magnificator {
    pub(super) fn color_magnify(&mut self) {
        let levels = self.settings.levels as usize;
        let capacity = Self::optimal_buffer_size(self.settings.framerate);
        let (co_low, co_high, framerate, amplification) = (
            self.settings.co_low,
            self.settings.co_high,
            self.settings.framerate,
            self.settings.amplification,
        );

        // Downsample every queued frame into the temporal window,
        // keeping the originals for the final addition.
        let mut saved: Vec<(ImageF32, u64)> = Vec::new();
        while let Some(frame) = self.input_queue.pop_front() {
            let img = frame_to_f32(&frame);
            if !matches!(self.state, AlgorithmState::Color(_)) {
                let sizes = level_sizes(img.height(), img.width(), levels);
                self.state = AlgorithmState::Color(ColorState {
                    columns: VecDeque::new(),
                    level_dim: sizes[levels],
                    full_dim: (img.height(), img.width()),
                    channels: img.channels(),
                    filter: IdealBandpass::new(),
                });
            }
            let AlgorithmState::Color(state) = &mut self.state else {
                unreachable!("state installed above");
            };
            let pyramid = build_gaussian_pyramid(&img, levels);
            state.columns.push_back(flatten(&pyramid[levels]));
            while state.columns.len() > capacity {
                state.columns.pop_front();
            }
            saved.push((img, frame.sequence()));
        }
        if saved.is_empty() {
            return;
        }

        let AlgorithmState::Color(state) = &mut self.state else {
            return;
        };

        // Temporal bandpass over the whole window, then amplify.
        let pixel_count = state.columns[0].len();
        let window = state.columns.len();
        let mut mat = Array2::zeros((pixel_count, window));
        for (j, column) in state.columns.iter().enumerate() {
            for (i, &v) in column.iter().enumerate() {
                mat[[i, j]] = v;
            }
        }
        let filtered = state.filter.apply(&mat, co_low, co_high, framerate);
        let amplified = filtered.mapv(|v| v * amplification);

        // Only the columns consumed this round become output frames.
        let round_start = window - saved.len();
        for (k, (input, sequence)) in saved.iter().enumerate() {
            let top = unflatten(
                amplified.column(round_start + k),
                state.level_dim,
                state.channels,
            );
            let color = reconstruct_from_top(&top, levels, state.full_dim);
            let output = input.add(&color);
            self.magnified
                .push_back(image_to_frame_rescaled(&output, *sequence));
            self.current_frame += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Frame;
    use crate::magnify::{MagnifyMode, MagnifySettings};

    fn color_settings() -> MagnifySettings {
        MagnifySettings {
            mode: MagnifyMode::Color,
            levels: 3,
            amplification: 10.0,
            co_low: 1.0,
            co_high: 2.0,
            framerate: 30.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_flatten_unflatten_roundtrip() {
        let mut img = ImageF32::zeros(3, 2, 3);
        for c in 0..3 {
            img.plane_mut(c)
                .indexed_iter_mut()
                .for_each(|((y, x), v)| *v = (y * 10 + x) as f32 + c as f32 * 0.1);
        }
        let flat = flatten(&img);
        assert_eq!(flat.len(), 18);

        let arr = ndarray::Array1::from(flat);
        let back = unflatten(arr.view(), (2, 3), 3);
        for c in 0..3 {
            assert_eq!(img.plane(c), back.plane(c));
        }
    }

    #[test]
    fn test_constant_input_stays_constant() {
        let mut mag = Magnificator::new(color_settings());
        for seq in 0..8 {
            mag.push_input(Frame::filled(128, 32, 32, 3, seq));
            mag.consume();
        }

        // Zero temporal variation: the rescale degenerates to
        // mid-gray, which for a 128-valued input is the input itself.
        while let Some(frame) = mag.get_frame_first() {
            assert!(frame.pixels().iter().all(|&v| (v as i32 - 128).abs() <= 1));
        }
    }

    #[test]
    fn test_window_eviction_bounds_columns() {
        let mut settings = color_settings();
        settings.framerate = 5.0; // window of 16
        let mut mag = Magnificator::new(settings);

        for seq in 0..40 {
            mag.push_input(Frame::filled((seq % 7 * 30) as u8, 32, 32, 1, seq));
            mag.consume();
        }
        let AlgorithmState::Color(state) = &mag.state else {
            panic!("color state expected");
        };
        assert_eq!(state.columns.len(), 16);
    }

    #[test]
    fn test_outputs_match_consumed_frames() {
        let mut mag = Magnificator::new(color_settings());
        mag.push_input(Frame::filled(100, 32, 32, 3, 0));
        mag.push_input(Frame::filled(110, 32, 32, 3, 1));
        mag.consume();
        assert_eq!(mag.buffer_size(), 2);

        mag.push_input(Frame::filled(120, 32, 32, 3, 2));
        mag.consume();
        assert_eq!(mag.buffer_size(), 3);
    }
}
