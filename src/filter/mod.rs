//! Temporal filters.
//!
//! Three flavors, one per magnification algorithm: an FFT-based ideal
//! bandpass over a sliding window (color), a per-sample two-lowpass
//! difference (Laplacian), and a pair of second-order Butterworth
//! low-passes (Riesz).

mod butterworth;
mod ideal;
mod iir;

pub use butterworth::Butterworth;
pub use ideal::IdealBandpass;
pub use iir::iir_bandpass_step;
