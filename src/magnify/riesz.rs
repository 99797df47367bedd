//! Riesz-pyramid phase-based motion magnification.
//!
//! Works on the luminance plane only: build the Riesz pyramid, unwrap
//! the quaternionic phase against the previous frame's pyramid,
//! bandpass the accumulated phase with the Butterworth pair, amplify,
//! phase-shift each band, and collapse.

use super::{AlgorithmState, Magnificator};
use crate::filter::Butterworth;
use crate::image::{
    bgr_to_ycrcb, frame_to_f32, image_to_frame_clamped, ycrcb_to_bgr, ImageF32,
};
use crate::pyramid::RieszPyramid;
use ndarray::Array2;
use std::f32::consts::PI;

const PI_PERCENT: f32 = PI / 100.0;

pub(super) struct RieszState {
    cur: RieszPyramid,
    prev: RieszPyramid,
    /// Accumulated unwrapped phase per band level, split into
    /// horizontal and vertical components.
    phase_x: Vec<Array2<f32>>,
    phase_y: Vec<Array2<f32>>,
    lo_cutoff: Butterworth,
    hi_cutoff: Butterworth,
}

fn merge_output(
    y_plane: Array2<f32>,
    chroma: Option<(Array2<f32>, Array2<f32>)>,
    sequence: u64,
) -> crate::capture::Frame {
    match chroma {
        Some((cr, cb)) => {
            let ycc = ImageF32::from_planes(vec![y_plane, cr, cb]);
            image_to_frame_clamped(&ycrcb_to_bgr(&ycc), sequence)
        }
        None => image_to_frame_clamped(&ImageF32::from_planes(vec![y_plane]), sequence),
    }
}

impl Magnificator {
    pub(super) fn riesz_magnify(&mut self) {
        let settings = self.settings.clone();
        let depth = settings.levels as usize;

        while let Some(frame) = self.input_queue.pop_front() {
            let sequence = frame.sequence();
            let img = frame_to_f32(&frame);
            let is_color = img.channels() == 3;
            let (y_plane, chroma) = if is_color {
                let ycc = bgr_to_ycrcb(&img);
                let mut planes = ycc.into_planes();
                let cb = planes.pop().expect("three planes");
                let cr = planes.pop().expect("three planes");
                let y = planes.pop().expect("three planes");
                (y, Some((cr, cb)))
            } else {
                (img.into_planes().remove(0), None)
            };

            if !matches!(self.state, AlgorithmState::Riesz(_)) {
                let pyramid = RieszPyramid::build(&y_plane, depth);
                let phase_x = pyramid
                    .levels
                    .iter()
                    .map(|l| Array2::zeros(l.band.dim()))
                    .collect();
                let phase_y = pyramid
                    .levels
                    .iter()
                    .map(|l| Array2::zeros(l.band.dim()))
                    .collect();
                self.state = AlgorithmState::Riesz(RieszState {
                    prev: pyramid.clone(),
                    cur: pyramid,
                    phase_x,
                    phase_y,
                    lo_cutoff: Butterworth::new(settings.co_low as f64, settings.framerate as f64),
                    hi_cutoff: Butterworth::new(settings.co_high as f64, settings.framerate as f64),
                });
                // First frame passes through unchanged.
                self.magnified.push_back(merge_output(y_plane, chroma, sequence));
                self.current_frame += 1;
                continue;
            }

            let AlgorithmState::Riesz(state) = &mut self.state else {
                unreachable!("state installed above");
            };

            // Track live cutoff and framerate changes.
            state.lo_cutoff.update_cutoff(settings.co_low as f64);
            state.hi_cutoff.update_cutoff(settings.co_high as f64);
            state.lo_cutoff.update_framerate(settings.framerate as f64);
            state.hi_cutoff.update_framerate(settings.framerate as f64);

            state.cur = RieszPyramid::build(&y_plane, depth);
            let gain = settings.amplification * (settings.co_wavelength * PI_PERCENT);

            let mut bands = Vec::with_capacity(depth);
            for level in 0..depth {
                if level + 1 == depth {
                    // The smallest band level stays unfiltered.
                    bands.push(state.cur.levels[level].band.clone());
                    continue;
                }
                let (dx, dy) = state.cur.phase_difference(&state.prev, level);
                state.phase_x[level] += &dx;
                state.phase_y[level] += &dy;

                // Low cutoff feeds the imaginary pass, high cutoff the
                // real pass; their difference is the bandpassed phase.
                let imag_x = state.lo_cutoff.step(level * 2, &state.phase_x[level]);
                let imag_y = state.lo_cutoff.step(level * 2 + 1, &state.phase_y[level]);
                let real_x = state.hi_cutoff.step(level * 2, &state.phase_x[level]);
                let real_y = state.hi_cutoff.step(level * 2 + 1, &state.phase_y[level]);

                let phi_x = (&real_x - &imag_x).mapv(|v| (v * gain).clamp(-PI, PI));
                let phi_y = (&real_y - &imag_y).mapv(|v| (v * gain).clamp(-PI, PI));
                bands.push(state.cur.shifted_band(level, &phi_x, &phi_y));
            }

            state.prev = state.cur.clone();
            let magnified = state.cur.collapse(bands);
            self.magnified
                .push_back(merge_output(magnified, chroma, sequence));
            self.current_frame += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Frame;
    use crate::magnify::{MagnifyMode, MagnifySettings};

    fn settings() -> MagnifySettings {
        MagnifySettings {
            mode: MagnifyMode::Riesz,
            levels: 4,
            amplification: 20.0,
            co_low: 0.8,
            co_high: 2.0,
            co_wavelength: 16.0,
            framerate: 30.0,
            ..Default::default()
        }
    }

    fn sine_frame(n: u32, wavelength: f32, phase: f32, seq: u64) -> Frame {
        let mut pixels = Vec::with_capacity((n * n) as usize);
        for _y in 0..n {
            for x in 0..n {
                let v = 128.0 + 64.0 * (2.0 * PI * x as f32 / wavelength + phase).sin();
                pixels.push(v.round().clamp(0.0, 255.0) as u8);
            }
        }
        Frame::new(pixels, n, n, 1, seq)
    }

    #[test]
    fn test_first_frame_passes_through() {
        let mut mag = Magnificator::new(settings());
        let frame = sine_frame(64, 16.0, 0.0, 0);
        mag.push_input(frame.clone());
        mag.consume();

        let out = mag.get_frame_first().unwrap();
        for (a, b) in out.pixels().iter().zip(frame.pixels()) {
            assert!((*a as i32 - *b as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_static_stream_stays_close_to_input() {
        let mut mag = Magnificator::new(settings());
        for seq in 0..6 {
            mag.push_input(sine_frame(64, 16.0, 0.0, seq));
            mag.consume();
        }

        // No temporal phase change: outputs stay near the input.
        let reference = sine_frame(64, 16.0, 0.0, 0);
        let mut last = None;
        while let Some(frame) = mag.get_frame_first() {
            last = Some(frame);
        }
        let last = last.unwrap();
        for (a, b) in last.pixels().iter().zip(reference.pixels()) {
            assert!(
                (*a as i32 - *b as i32).abs() <= 8,
                "static output drifted: {a} vs {b}"
            );
        }
    }

    #[test]
    fn test_constant_stream_unchanged() {
        let mut mag = Magnificator::new(settings());
        for seq in 0..6 {
            mag.push_input(Frame::filled(128, 64, 64, 1, seq));
        }
        mag.consume();

        while let Some(frame) = mag.get_frame_first() {
            assert!(frame.pixels().iter().all(|&v| (v as i32 - 128).abs() <= 1));
        }
    }

    #[test]
    fn test_color_stream_keeps_chroma() {
        let mut mag = Magnificator::new(settings());
        // Uniform warm color: B=50, G=100, R=200
        let mut pixels = Vec::new();
        for _ in 0..64 * 64 {
            pixels.extend_from_slice(&[50, 100, 200]);
        }
        for seq in 0..4 {
            mag.push_input(Frame::new(pixels.clone(), 64, 64, 3, seq));
        }
        mag.consume();

        while let Some(frame) = mag.get_frame_first() {
            for px in frame.pixels().chunks_exact(3) {
                assert!((px[0] as i32 - 50).abs() <= 2);
                assert!((px[1] as i32 - 100).abs() <= 2);
                assert!((px[2] as i32 - 200).abs() <= 2);
            }
        }
    }
}
