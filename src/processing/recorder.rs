//! Recording seam.
//!
//! The core never encodes video itself; it hands finished frames to a
//! [`VideoRecorder`] when recording is armed. The null implementation
//! counts frames so tests can observe the contract.

use crate::capture::Frame;

/// Video file writer interface.
pub trait VideoRecorder: Send {
    /// Opens the output; returns false when the backend cannot record.
    fn open(&mut self, path: &str, codec: &str, fps: f32, size: (u32, u32), is_color: bool)
        -> bool;

    /// Writes one frame. Only called while open.
    fn write(&mut self, frame: &Frame);

    /// Finishes the recording.
    fn close(&mut self);

    /// True while a recording is open.
    fn is_open(&self) -> bool;
}

/// Recorder that discards frames but tracks the open/write/close
/// protocol.
#[derive(Debug, Default)]
pub struct NullRecorder {
    open: bool,
    /// Frames written into the current recording.
    pub frames_written: u64,
}

impl VideoRecorder for NullRecorder {
    fn open(&mut self, path: &str, codec: &str, fps: f32, size: (u32, u32), is_color: bool) -> bool {
        tracing::info!(path, codec, fps, ?size, is_color, "NullRecorder opened");
        self.open = true;
        self.frames_written = 0;
        true
    }

    fn write(&mut self, _frame: &Frame) {
        self.frames_written += 1;
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Places two equally sized frames side by side (processed left,
/// original right), for "combined with original" recordings.
pub fn combine_frames(left: &Frame, right: &Frame) -> Frame {
    debug_assert_eq!(left.width(), right.width());
    debug_assert_eq!(left.height(), right.height());
    debug_assert_eq!(left.channels(), right.channels());

    let c = left.channels() as usize;
    let stride = left.width() as usize * c;
    let mut pixels = Vec::with_capacity(2 * stride * left.height() as usize);
    for row in 0..left.height() as usize {
        pixels.extend_from_slice(&left.pixels()[row * stride..(row + 1) * stride]);
        pixels.extend_from_slice(&right.pixels()[row * stride..(row + 1) * stride]);
    }
    Frame::new(
        pixels,
        left.width() * 2,
        left.height(),
        left.channels(),
        left.sequence(),
    )
}
