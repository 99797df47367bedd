//! Camera abstraction for frame capture.
//!
//! A trait seam over camera hardware so the pipeline runs against
//! mock input in tests and on machines without a camera. A real
//! backend implements the same trait.

use super::{CaptureConfig, Frame};
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    #[error("camera not initialized")]
    NotInitialized,
}

/// Trait for camera implementations.
pub trait Camera {
    /// Opens and initializes the camera with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Captures a single frame.
    fn capture(&mut self) -> Result<Frame, CameraError>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources.
    fn close(&mut self);
}

/// Mock camera producing a deterministic scene with gentle periodic
/// motion and color pulsation, so every magnification mode has signal
/// to work with.
#[derive(Debug, Default)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    sequence: u64,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Camera for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!(?config, "MockCamera opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;
        let (w, h) = (config.width, config.height);
        let t = self.sequence as f32 / config.fps.max(1) as f32;

        // A vertical edge that sways by under a pixel, plus a slow
        // brightness pulse on the red channel.
        let edge = w as f32 / 2.0 + 0.4 * (std::f32::consts::TAU * 1.2 * t).sin();
        let pulse = 10.0 * (std::f32::consts::TAU * 1.0 * t).sin();

        let channels: u8 = if config.grayscale { 1 } else { 3 };
        let mut pixels = Vec::with_capacity((w * h * channels as u32) as usize);
        for _y in 0..h {
            for x in 0..w {
                let base = if (x as f32) < edge { 70.0 } else { 180.0 };
                // Soften the edge so sub-pixel motion registers
                let d = (x as f32 - edge).abs();
                let value = if d < 1.0 {
                    70.0 + (180.0 - 70.0) * (x as f32 - edge + 1.0).clamp(0.0, 2.0) / 2.0
                } else {
                    base
                };
                if config.grayscale {
                    pixels.push(value.round().clamp(0.0, 255.0) as u8);
                } else {
                    pixels.push(value.round().clamp(0.0, 255.0) as u8);
                    pixels.push(value.round().clamp(0.0, 255.0) as u8);
                    pixels.push((value + pulse).round().clamp(0.0, 255.0) as u8);
                }
            }
        }

        self.sequence += 1;
        Ok(Frame::new(pixels, w, h, channels, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("MockCamera closed");
    }
}
