//! Laplacian-pyramid motion magnification.
//!
//! Frame-by-frame: decompose, run the per-level IIR bandpass against
//! the running low-pass states, amplify the surviving band levels with
//! the wavelength-dependent ramp, collapse, and add the motion back
//! onto the input. The produced motion image also feeds the breath
//! analyzer.

use super::{AlgorithmState, Magnificator};
use crate::filter::iir_bandpass_step;
use crate::image::{
    bgr_to_ycrcb, frame_to_f32, image_to_frame_clamped, ycrcb_to_bgr, ImageF32,
};
use crate::pyramid::{build_laplacian_pyramid, reconstruct_laplacian};

const EXAGGERATION: f32 = 2.0;

pub(super) struct LaplaceState {
    lowpass_hi: Vec<ImageF32>,
    lowpass_lo: Vec<ImageF32>,
    motion_pyramid: Vec<ImageF32>,
    exaggeration_factor: f32,
    lambda: f32,
    delta: f32,
}

impl Magnificator {
    pub(super) fn laplace_magnify(&mut self) {
        let settings = self.settings.clone();
        let levels = settings.levels as usize;

        while let Some(frame) = self.input_queue.pop_front() {
            let sequence = frame.sequence();
            let raw = frame_to_f32(&frame);
            let is_color = raw.channels() == 3;
            let work = if is_color { bgr_to_ycrcb(&raw) } else { raw.clone() };
            let pyramid = build_laplacian_pyramid(&work, levels);

            if !matches!(self.state, AlgorithmState::Laplace(_)) {
                // First frame seeds the temporal filters and passes
                // through unchanged.
                self.state = AlgorithmState::Laplace(LaplaceState {
                    lowpass_hi: pyramid.clone(),
                    lowpass_lo: pyramid.clone(),
                    motion_pyramid: pyramid,
                    exaggeration_factor: EXAGGERATION,
                    lambda: 0.0,
                    delta: 0.0,
                });
                self.breath.seed(&raw);
                let out = if is_color { ycrcb_to_bgr(&work) } else { work };
                self.magnified
                    .push_back(image_to_frame_clamped(&out, sequence));
                self.current_frame += 1;
                continue;
            }

            let AlgorithmState::Laplace(state) = &mut self.state else {
                unreachable!("state installed above");
            };

            for level in 0..=levels {
                state.motion_pyramid[level] = iir_bandpass_step(
                    &pyramid[level],
                    &mut state.lowpass_hi[level],
                    &mut state.lowpass_lo[level],
                    settings.co_low,
                    settings.co_high,
                );
            }

            let (w, h) = (work.width() as f32, work.height() as f32);
            state.delta = settings.co_wavelength / (8.0 * (1.0 + settings.amplification));
            state.lambda = (w * w + h * h).sqrt() / 3.0;
            for level in (0..=levels).rev() {
                let gain = if level == levels || level == 0 {
                    0.0
                } else {
                    let curr_alpha =
                        (state.lambda / (state.delta * 8.0) - 1.0) * state.exaggeration_factor;
                    settings.amplification.min(curr_alpha)
                };
                state.motion_pyramid[level] = state.motion_pyramid[level].scale(gain);
                state.lambda /= 2.0;
            }

            let mut motion = reconstruct_laplacian(&state.motion_pyramid);
            if is_color {
                for c in 1..=2 {
                    motion
                        .plane_mut(c)
                        .mapv_inplace(|v| v * settings.chrom_attenuation);
                }
            }
            let output = work.add(&motion);

            let motion_bgr = if is_color { ycrcb_to_bgr(&motion) } else { motion };
            let analysis = self.breath.analyze(&motion_bgr, &raw);
            self.breath_measure = analysis.measure;

            let out_img = if settings.magnified_or_contours {
                analysis.overlay
            } else if is_color {
                ycrcb_to_bgr(&output)
            } else {
                output
            };
            self.magnified
                .push_back(image_to_frame_clamped(&out_img, sequence));
            self.current_frame += 1;
        }
    }
}
