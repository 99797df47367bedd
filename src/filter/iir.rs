//! Per-sample IIR bandpass used by Laplacian magnification.

use crate::image::ImageF32;

// Smoothing coefficients live in (0, 0.5].
const COEFF_MAX: f32 = 0.5;

#[inline]
fn clamp_coeff(c: f32) -> f32 {
    c.clamp(f32::EPSILON, COEFF_MAX)
}

/// Advances the two running low-passes by one frame and returns the
/// band-passed difference.
///
/// `lowpass_hi` tracks the input quickly (cutoff `co_high`),
/// `lowpass_lo` slowly (cutoff `co_low`); their difference retains the
/// temporal band in between. Both states must have been seeded with
/// the first frame's pyramid level.
pub fn iir_bandpass_step(
    input: &ImageF32,
    lowpass_hi: &mut ImageF32,
    lowpass_lo: &mut ImageF32,
    co_low: f32,
    co_high: f32,
) -> ImageF32 {
    let cl = clamp_coeff(co_low);
    let ch = clamp_coeff(co_high);
    for (state, plane) in lowpass_lo.planes_mut().iter_mut().zip(input.planes()) {
        state.zip_mut_with(plane, |s, &p| *s = (1.0 - cl) * *s + cl * p);
    }
    for (state, plane) in lowpass_hi.planes_mut().iter_mut().zip(input.planes()) {
        state.zip_mut_with(plane, |s, &p| *s = (1.0 - ch) * *s + ch * p);
    }
    lowpass_hi.add(&lowpass_lo.scale(-1.0))
}
