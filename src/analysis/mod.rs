//! Post-magnification motion analysis.
//!
//! Laplace mode runs a frame-difference contour pass over each motion
//! image and reduces it to one scalar per frame (the breath measure);
//! the processing loop smooths those into per-window emissions.

mod breath;
mod contour;
mod smoothing;

pub use breath::{BreathAnalysis, BreathAnalyzer};
pub use contour::{find_external_contours, Contour};
pub use smoothing::BreathSmoother;
