//! The processing loop: one tick per captured frame.

use super::recorder::{combine_frames, NullRecorder, VideoRecorder};
use super::sink::{BreathSink, CsvLogger, NoopSink};
use super::{ProcessingStats, Publisher};
use crate::analysis::BreathSmoother;
use crate::capture::{Frame, Rect, SharedFrameBuffer};
use crate::magnify::{MagnifyMode, MagnifySettings, Magnificator, SettingsError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const FPS_STAT_WINDOW: usize = 32;
const BUFFER_POLL: Duration = Duration::from_millis(50);

/// An armed recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRequest {
    /// Output path handed to the recorder backend.
    pub path: String,
    /// Write the processed frame side by side with the original.
    pub combined: bool,
}

struct ControlState {
    settings: MagnifySettings,
    roi: Rect,
    /// Bumped on every change that must drain queues and reset
    /// algorithm state (currently: ROI).
    generation: u64,
    record: Option<RecordRequest>,
}

/// Thread-safe handle for reconfiguring a running processing loop.
///
/// Setters validate first and mutate nothing on failure. Settings are
/// copied into the loop at the top of each tick.
pub struct ProcessingControl {
    stop: AtomicBool,
    state: Mutex<ControlState>,
}

impl ProcessingControl {
    /// Creates a control handle; `settings` must already be valid for
    /// `roi`.
    pub fn new(settings: MagnifySettings, roi: Rect) -> Result<Arc<Self>, SettingsError> {
        settings.validate(roi)?;
        Ok(Arc::new(Self {
            stop: AtomicBool::new(false),
            state: Mutex::new(ControlState {
                settings,
                roi,
                generation: 0,
                record: None,
            }),
        }))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ControlState> {
        self.state.lock().expect("processing lock poisoned")
    }

    /// Requests the loop to exit at the top of its next tick.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// True once a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Switches the active algorithm.
    pub fn set_mode(&self, mode: MagnifyMode) {
        self.lock().settings.mode = mode;
    }

    /// Replaces the settings after validating against the current ROI.
    pub fn set_settings(&self, settings: MagnifySettings) -> Result<(), SettingsError> {
        let mut state = self.lock();
        settings.validate(state.roi)?;
        state.settings = settings;
        Ok(())
    }

    /// Moves the region of interest. Validates the current settings
    /// against the new rectangle, then forces a full state reset.
    pub fn set_roi(&self, roi: Rect) -> Result<(), SettingsError> {
        let mut state = self.lock();
        state.settings.validate(roi)?;
        state.roi = roi;
        state.generation += 1;
        Ok(())
    }

    /// Updates the framerate used for the color window and the
    /// Butterworth coefficients.
    pub fn set_framerate(&self, framerate: f32) {
        self.lock().settings.framerate = framerate;
    }

    /// Arms recording.
    pub fn start_record(&self, path: impl Into<String>, combined: bool) {
        self.lock().record = Some(RecordRequest {
            path: path.into(),
            combined,
        });
    }

    /// Disarms recording.
    pub fn stop_record(&self) {
        self.lock().record = None;
    }

    /// Copy of the current settings.
    pub fn settings(&self) -> MagnifySettings {
        self.lock().settings.clone()
    }

    /// Current region of interest.
    pub fn roi(&self) -> Rect {
        self.lock().roi
    }

    fn snapshot(&self) -> (MagnifySettings, Rect, u64, Option<RecordRequest>) {
        let state = self.lock();
        (
            state.settings.clone(),
            state.roi,
            state.generation,
            state.record.clone(),
        )
    }
}

/// The per-source processing loop.
///
/// Owns one Magnificator, the breath smoothing state, and the output
/// seams; consumes itself when run.
pub struct ProcessingThread {
    buffer: Arc<SharedFrameBuffer>,
    publisher: Arc<Publisher>,
    control: Arc<ProcessingControl>,
    breath_sink: Box<dyn BreathSink>,
    recorder: Box<dyn VideoRecorder>,
    csv: CsvLogger,
    queue_length: usize,
}

impl ProcessingThread {
    /// Creates a loop with a no-op breath sink and a null recorder.
    pub fn new(
        buffer: Arc<SharedFrameBuffer>,
        publisher: Arc<Publisher>,
        control: Arc<ProcessingControl>,
    ) -> Self {
        Self {
            buffer,
            publisher,
            control,
            breath_sink: Box::new(NoopSink),
            recorder: Box::new(NullRecorder::default()),
            csv: CsvLogger::new("out.csv"),
            queue_length: 2,
        }
    }

    /// Installs a breath sink implementation.
    pub fn with_breath_sink(mut self, sink: Box<dyn BreathSink>) -> Self {
        self.breath_sink = sink;
        self
    }

    /// Installs a recorder backend.
    pub fn with_recorder(mut self, recorder: Box<dyn VideoRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Sets the processing input queue length (default 2).
    pub fn with_queue_length(mut self, length: usize) -> Self {
        self.queue_length = length.max(1);
        self
    }

    /// Sets the CSV log path.
    pub fn with_csv_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.csv = CsvLogger::new(path.into());
        self
    }

    /// Spawns the loop on a named worker thread.
    pub fn spawn(self) -> std::thread::JoinHandle<()> {
        std::thread::Builder::new()
            .name("processing".into())
            .spawn(move || self.run())
            .expect("failed to spawn processing thread")
    }

    /// Runs the loop until a stop is requested.
    pub fn run(mut self) {
        tracing::info!("Processing thread started");

        let mut magnificator = Magnificator::new(self.control.settings());
        let mut smoother = BreathSmoother::new();
        let mut frame_num: u64 = 0;
        let mut stats = ProcessingStats::default();
        let mut fps_samples: VecDeque<f32> = VecDeque::with_capacity(FPS_STAT_WINDOW);
        let mut seen_generation = self.control.snapshot().2;
        let mut last_mode = self.control.settings().mode;
        let mut record_failed = false;

        loop {
            if self.control.is_stopped() {
                break;
            }
            let Some(frame) = self.buffer.get(BUFFER_POLL) else {
                continue;
            };
            let tick_start = Instant::now();

            let (settings, roi, generation, record) = self.control.snapshot();
            if generation != seen_generation {
                tracing::debug!(?roi, "ROI change: resetting algorithm state");
                magnificator.clear_buffer();
                smoother.reset();
                frame_num = 0;
                seen_generation = generation;
            }
            if settings.mode != last_mode {
                smoother.reset();
                frame_num = 0;
                last_mode = settings.mode;
            }
            magnificator.set_settings(settings.clone());

            let mut current = frame.crop(roi);
            if settings.grayscale && current.channels() == 3 {
                current = current.to_grayscale();
            }
            let original = current.clone();
            magnificator.push_input(current);

            let mut produced = None;
            if settings.mode == MagnifyMode::Off {
                magnificator.consume();
                frame_num = 0;
                produced = Some(original.clone());
            } else {
                if magnificator.input_len() >= self.queue_length {
                    magnificator.consume();
                }
                if let Some(out) = magnificator.get_frame_first() {
                    frame_num += 1;
                    produced = Some(out);
                }
            }

            if let Some(out) = &produced {
                self.handle_recording(out, &original, &record, roi, &settings, &mut record_failed);
                self.publisher.emit_frame(out.clone());
            }

            // Breath output, Laplace mode only.
            if produced.is_some() && settings.mode == MagnifyMode::Laplace {
                let measure = magnificator.breath_measure();
                self.publisher.emit_breath(measure);
                if let Some(smoothed) = smoother.push(measure) {
                    self.breath_sink.write(smoothed);
                    if settings.csv {
                        self.csv.append(frame_num, smoothed as f32);
                    }
                }
            }

            // Statistics; the measured rate feeds back into the live
            // settings because the color window depends on it.
            stats.frames_processed += 1;
            let elapsed = tick_start.elapsed().as_secs_f32();
            if elapsed > 0.0 {
                fps_samples.push_back(1.0 / elapsed);
            }
            if fps_samples.len() >= FPS_STAT_WINDOW {
                let avg = fps_samples.iter().sum::<f32>() / fps_samples.len() as f32;
                fps_samples.clear();
                stats.average_fps = avg;
                self.publisher.emit_stats(stats.clone());
                self.control.set_framerate(avg);
            }
        }

        if self.recorder.is_open() {
            self.recorder.close();
        }
        tracing::info!(frames = stats.frames_processed, "Processing thread stopped");
    }

    fn handle_recording(
        &mut self,
        out: &Frame,
        original: &Frame,
        record: &Option<RecordRequest>,
        roi: Rect,
        settings: &MagnifySettings,
        record_failed: &mut bool,
    ) {
        match record {
            Some(request) => {
                if !self.recorder.is_open() && !*record_failed {
                    let size = if request.combined {
                        (roi.w * 2, roi.h)
                    } else {
                        (roi.w, roi.h)
                    };
                    let is_color = !settings.grayscale && out.channels() == 3;
                    if !self.recorder.open(
                        &request.path,
                        "mp4v",
                        settings.framerate,
                        size,
                        is_color,
                    ) {
                        tracing::warn!(path = %request.path, "Recorder failed to open");
                        *record_failed = true;
                        return;
                    }
                }
                if self.recorder.is_open() {
                    if request.combined {
                        self.recorder.write(&combine_frames(out, original));
                    } else {
                        self.recorder.write(out);
                    }
                }
            }
            None => {
                if self.recorder.is_open() {
                    self.recorder.close();
                }
                *record_failed = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control() -> Arc<ProcessingControl> {
        ProcessingControl::new(MagnifySettings::default(), Rect::new(0, 0, 64, 64)).unwrap()
    }

    #[test]
    fn test_stop_flag() {
        let control = control();
        assert!(!control.is_stopped());
        control.stop();
        assert!(control.is_stopped());
    }

    #[test]
    fn test_invalid_settings_rejected_without_mutation() {
        let control = control();
        let mut bad = control.settings();
        bad.co_low = 5.0;
        bad.co_high = 1.0;
        assert!(control.set_settings(bad).is_err());
        assert_eq!(control.settings().co_low, MagnifySettings::default().co_low);
    }

    #[test]
    fn test_roi_change_bumps_generation() {
        let control = control();
        let before = control.snapshot().2;
        // 48x48 still supports the default depth of 4
        control.set_roi(Rect::new(0, 0, 48, 48)).unwrap();
        assert_eq!(control.snapshot().2, before + 1);
        assert_eq!(control.roi(), Rect::new(0, 0, 48, 48));
    }

    #[test]
    fn test_roi_too_small_for_levels_rejected() {
        let control = control();
        // Default levels = 4 needs maxLevels >= 4; an 8x8 ROI has 1.
        assert!(control.set_roi(Rect::new(0, 0, 8, 8)).is_err());
        assert_eq!(control.roi(), Rect::new(0, 0, 64, 64));
    }

    #[test]
    fn test_set_mode_updates_settings() {
        let control = control();
        control.set_mode(MagnifyMode::Riesz);
        assert_eq!(control.settings().mode, MagnifyMode::Riesz);
    }

    #[test]
    fn test_record_arm_disarm() {
        let control = control();
        control.start_record("out.avi", true);
        let (.., record) = control.snapshot();
        assert_eq!(
            record,
            Some(RecordRequest {
                path: "out.avi".into(),
                combined: true
            })
        );
        control.stop_record();
        assert!(control.snapshot().3.is_none());
    }
}
