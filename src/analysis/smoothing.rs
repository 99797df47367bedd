//! Sliding-window smoothing of the per-frame breath measure.

/// Averages breath samples in windows of three and clamps jumps
/// against the previous emission.
///
/// A window whose mean moves more than 25 per half-step saturates to
/// the previous emission plus or minus 50. The clamp is skipped while
/// the previous emission is zero (no baseline yet).
#[derive(Debug, Default)]
pub struct BreathSmoother {
    window: [f32; 3],
    filled: usize,
    prev_avg: Option<f32>,
}

impl BreathSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes one per-frame sample; every third push emits the
    /// smoothed window value.
    pub fn push(&mut self, sample: i32) -> Option<i32> {
        self.window[self.filled] = sample as f32;
        self.filled += 1;
        if self.filled < 3 {
            return None;
        }
        self.filled = 0;

        let mut avg = self.window.iter().sum::<f32>() / 3.0;
        if let Some(prev) = self.prev_avg {
            if prev != 0.0 {
                let half_delta = (avg - prev) / 2.0;
                if half_delta > 25.0 {
                    avg = prev + 50.0;
                } else if half_delta < -25.0 {
                    avg = prev - 50.0;
                }
            }
        }
        self.prev_avg = Some(avg);
        Some(avg.round() as i32)
    }

    /// Clears the window and the clamp baseline.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
