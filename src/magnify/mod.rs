//! The Magnificator: one frame-in/frame-out engine wrapping the three
//! magnification algorithms.
//!
//! Frames queue up in the input queue; [`Magnificator::consume`] runs
//! the active algorithm over everything queued and appends finished
//! frames to the magnified buffer. Extraction removes from the front
//! and keeps a cursor so callers can observe progress.

mod color;
mod laplace;
mod riesz;
mod settings;

pub use settings::{MagnifyMode, MagnifySettings, SettingsError};

use crate::analysis::BreathAnalyzer;
use crate::capture::{Frame, Rect};
use crate::pyramid;
use std::collections::VecDeque;

use color::ColorState;
use laplace::LaplaceState;
use riesz::RieszState;

/// Algorithm-specific state, created on the first frame in a mode and
/// destroyed on any reset.
enum AlgorithmState {
    Idle,
    Color(ColorState),
    Laplace(LaplaceState),
    Riesz(RieszState),
}

/// Streaming magnification engine for one source.
pub struct Magnificator {
    settings: MagnifySettings,
    input_queue: VecDeque<Frame>,
    magnified: VecDeque<Frame>,
    /// Never exceeds the number of frames ever appended to the
    /// magnified buffer.
    current_frame: usize,
    state: AlgorithmState,
    breath: BreathAnalyzer,
    breath_measure: i32,
}

impl Magnificator {
    /// Creates an engine with the given settings.
    pub fn new(settings: MagnifySettings) -> Self {
        Self {
            settings,
            input_queue: VecDeque::new(),
            magnified: VecDeque::new(),
            current_frame: 0,
            state: AlgorithmState::Idle,
            breath: BreathAnalyzer::new(),
            breath_measure: 0,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &MagnifySettings {
        &self.settings
    }

    /// Replaces the settings.
    ///
    /// A change of mode or pyramid depth drains both queues and resets
    /// algorithm state; other fields take effect on the next frame.
    pub fn set_settings(&mut self, settings: MagnifySettings) {
        if settings.mode != self.settings.mode || settings.levels != self.settings.levels {
            tracing::debug!(
                mode = ?settings.mode,
                levels = settings.levels,
                "Settings change resets magnification state"
            );
            self.clear_buffer();
        }
        self.settings = settings;
    }

    /// Appends one ROI-sized frame to the input queue.
    pub fn push_input(&mut self, frame: Frame) {
        self.input_queue.push_back(frame);
    }

    /// Number of frames waiting in the input queue.
    pub fn input_len(&self) -> usize {
        self.input_queue.len()
    }

    /// Processes all unconsumed input frames with the active
    /// algorithm, appending outputs to the magnified buffer.
    pub fn consume(&mut self) {
        match self.settings.mode {
            MagnifyMode::Off => self.input_queue.clear(),
            MagnifyMode::Color => self.color_magnify(),
            MagnifyMode::Laplace => self.laplace_magnify(),
            MagnifyMode::Riesz => self.riesz_magnify(),
        }
    }

    /// True when the magnified buffer holds at least one frame.
    pub fn has_frame(&self) -> bool {
        !self.magnified.is_empty()
    }

    /// Number of frames in the magnified buffer.
    pub fn buffer_size(&self) -> usize {
        self.magnified.len()
    }

    /// Extracts the oldest magnified frame.
    pub fn get_frame_first(&mut self) -> Option<Frame> {
        let frame = self.magnified.pop_front();
        self.current_frame = self.magnified.len();
        frame
    }

    /// Returns the newest magnified frame while discarding the oldest.
    pub fn get_frame_last(&mut self) -> Option<Frame> {
        let frame = self.magnified.back().cloned();
        if frame.is_some() {
            self.magnified.pop_front();
        }
        self.current_frame = self.magnified.len();
        frame
    }

    /// Returns the frame at index `i`, falling back to the newest when
    /// out of range. The oldest frame is discarded either way.
    pub fn get_frame_at(&mut self, i: usize) -> Option<Frame> {
        if i + 1 < self.magnified.len() {
            let frame = self.magnified.get(i).cloned();
            self.magnified.pop_front();
            self.current_frame = self.magnified.len();
            frame
        } else {
            self.get_frame_last()
        }
    }

    /// Drains both queues and destroys all algorithm state.
    pub fn clear_buffer(&mut self) {
        self.input_queue.clear();
        self.magnified.clear();
        self.state = AlgorithmState::Idle;
        self.current_frame = 0;
        self.breath.reset();
        self.breath_measure = 0;
    }

    /// Latest per-frame breath measure (Laplace mode).
    pub fn breath_measure(&self) -> i32 {
        self.breath_measure
    }

    /// Largest usable pyramid depth for an ROI.
    pub fn max_levels(roi: Rect) -> u32 {
        pyramid::max_levels(roi.w, roi.h)
    }

    /// Temporal window length for color magnification: the smallest
    /// power of two covering about two seconds of video.
    pub fn optimal_buffer_size(fps: f32) -> usize {
        ((2.0 * fps).round() as usize).max(16).next_power_of_two()
    }
}
