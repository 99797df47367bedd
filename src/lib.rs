//! Real-time Eulerian Video Magnification Library
//!
//! A streaming pipeline that amplifies subtle temporal variations in
//! video — color pulsations or sub-pixel motion — to visible
//! amplitude, and derives a per-frame breath measure from the
//! magnified motion.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! capture → processing loop → magnify (color | laplace | riesz)
//!                 ↓                ↓
//!             publisher        analysis (breath measure)
//! ```
//!
//! Three interchangeable algorithms share one frame-in/frame-out
//! contract:
//!
//! - **Color**: Gaussian pyramid + ideal temporal bandpass over a
//!   sliding power-of-two window.
//! - **Laplace**: Laplacian pyramid + per-level IIR bandpass, frame by
//!   frame.
//! - **Riesz**: quaternionic phase analysis + Butterworth temporal
//!   filtering.
//!
//! # Example
//!
//! ```no_run
//! use video_magnify::{
//!     capture::{Camera, CaptureConfig, MockCamera, Rect, SharedFrameBuffer},
//!     magnify::{MagnifyMode, MagnifySettings},
//!     processing::{ProcessingControl, ProcessingThread, Publisher},
//! };
//! use std::sync::Arc;
//!
//! let mut camera = MockCamera::new();
//! camera.open(&CaptureConfig::with_dimensions(128, 128)).unwrap();
//!
//! let buffer = Arc::new(SharedFrameBuffer::new(4));
//! let publisher = Arc::new(Publisher::new());
//! let settings = MagnifySettings {
//!     mode: MagnifyMode::Laplace,
//!     ..Default::default()
//! };
//! let control = ProcessingControl::new(settings, Rect::new(0, 0, 128, 128)).unwrap();
//!
//! let worker = ProcessingThread::new(
//!     Arc::clone(&buffer),
//!     Arc::clone(&publisher),
//!     Arc::clone(&control),
//! )
//! .spawn();
//!
//! for _ in 0..64 {
//!     buffer.put(camera.capture().unwrap());
//!     if let Some(frame) = publisher.take_frame() {
//!         println!("magnified frame {}", frame.sequence());
//!     }
//! }
//!
//! control.stop();
//! worker.join().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod capture;
pub mod filter;
pub mod image;
pub mod magnify;
pub mod processing;
pub mod pyramid;

// Re-export commonly used types at crate root
pub use capture::{Camera, CaptureConfig, Frame, MockCamera, Rect, SharedFrameBuffer};
pub use magnify::{MagnifyMode, MagnifySettings, Magnificator, SettingsError};
pub use processing::{ProcessingControl, ProcessingStats, ProcessingThread, Publisher};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
