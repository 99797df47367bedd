//! Bounded frame handoff between the capture producer and the
//! processing thread.

use super::Frame;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

struct Inner {
    frames: VecDeque<Frame>,
    dropped: u64,
}

/// A length-bounded, thread-safe frame queue.
///
/// The capture thread `put`s, the processing thread `get`s. When the
/// buffer is full the oldest frame is dropped: the pipeline is lossy
/// by design and the latest frames win. `get` blocks on a condition
/// variable signaled on enqueue.
pub struct SharedFrameBuffer {
    inner: Mutex<Inner>,
    signal: Condvar,
    capacity: usize,
}

impl SharedFrameBuffer {
    /// Creates a buffer holding at most `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                frames: VecDeque::with_capacity(capacity),
                dropped: 0,
            }),
            signal: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    /// Enqueues a frame, evicting the oldest when full.
    pub fn put(&self, frame: Frame) {
        let mut inner = self.inner.lock().expect("frame buffer lock poisoned");
        if inner.frames.len() >= self.capacity {
            inner.frames.pop_front();
            inner.dropped += 1;
            if inner.dropped % 100 == 1 {
                tracing::debug!(dropped = inner.dropped, "Frame buffer overflow");
            }
        }
        inner.frames.push_back(frame);
        self.signal.notify_one();
    }

    /// Dequeues the oldest frame, waiting up to `timeout`.
    ///
    /// Returns `None` on timeout so callers can re-check their stop
    /// flag.
    pub fn get(&self, timeout: Duration) -> Option<Frame> {
        let mut inner = self.inner.lock().expect("frame buffer lock poisoned");
        loop {
            if let Some(frame) = inner.frames.pop_front() {
                return Some(frame);
            }
            let (guard, result) = self
                .signal
                .wait_timeout(inner, timeout)
                .expect("frame buffer lock poisoned");
            inner = guard;
            if result.timed_out() && inner.frames.is_empty() {
                return None;
            }
        }
    }

    /// Number of frames currently queued.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("frame buffer lock poisoned").frames.len()
    }

    /// True when no frames are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total frames dropped to the length bound.
    pub fn dropped(&self) -> u64 {
        self.inner.lock().expect("frame buffer lock poisoned").dropped
    }
}
