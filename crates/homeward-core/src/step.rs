// ---------------------------------------------------------------------------
// Samples & Ring Buffer
// ---------------------------------------------------------------------------

/// Capacity of the acceleration ring buffer.
pub const ACCEL_BUFFER_SIZE: usize = 64;

/// One accelerometer reading reduced to its magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccelSample {
    pub timestamp_ms: u64,
    pub magnitude: f32,
}

/// Bounded ring of recent magnitude samples. Oldest entries are evicted
/// once the buffer is full.
pub struct AccelWindow {
    samples: [AccelSample; ACCEL_BUFFER_SIZE],
    /// Next write slot.
    head: usize,
    count: usize,
}

impl Default for AccelWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelWindow {
    pub fn new() -> Self {
        Self {
            samples: [AccelSample::default(); ACCEL_BUFFER_SIZE],
            head: 0,
            count: 0,
        }
    }

    pub fn push(&mut self, sample: AccelSample) {
        self.samples[self.head] = sample;
        self.head = (self.head + 1) % ACCEL_BUFFER_SIZE;
        if self.count < ACCEL_BUFFER_SIZE {
            self.count += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
    }

    /// Visit the most recent `n` samples, oldest of those first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = AccelSample> + '_ {
        let take = n.min(self.count);
        let start = (self.head + ACCEL_BUFFER_SIZE - take) % ACCEL_BUFFER_SIZE;
        (0..take).map(move |i| self.samples[(start + i) % ACCEL_BUFFER_SIZE])
    }
}

// ---------------------------------------------------------------------------
// Status & Config
// ---------------------------------------------------------------------------

/// Per-sample result of the detector. Only `Step` advances the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DetectOutcome {
    Step,
    BelowThreshold,
    /// Window variance too low to be walking.
    Stationary,
    /// Not enough samples buffered yet.
    WarmingUp,
    /// Peak seen but too soon after the last accepted step.
    Refractory,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDetectorConfig {
    /// Samples considered for the adaptive threshold.
    pub window_len: usize,
    /// Minimum buffered samples before detection runs.
    pub warmup_len: usize,
    /// Window std below this is treated as stationary jitter.
    pub stationary_std: f32,
    /// Floor on the margin added to the window mean.
    pub threshold_margin: f32,
    /// Required rise over the previous sample's magnitude.
    pub min_jump: f32,
    /// Minimum spacing between accepted steps.
    pub refractory_ms: u64,
}

impl Default for StepDetectorConfig {
    fn default() -> Self {
        Self {
            window_len: 20,
            warmup_len: 12,
            stationary_std: 0.6,
            threshold_margin: 0.7,
            min_jump: 0.6,
            refractory_ms: 400,
        }
    }
}

/// Accepted step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepEvent {
    pub timestamp_ms: u64,
    pub magnitude: f32,
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Peak detector with a threshold that adapts to the recent window.
///
/// A step fires on a rising edge through `mean + max(margin, std)` of the
/// last `window_len` magnitudes, provided the rise over the previous sample
/// exceeds `min_jump` and the refractory period has elapsed.
pub struct StepDetector {
    config: StepDetectorConfig,
    window: AccelWindow,

    was_above: bool,
    prev_magnitude: f32,
    last_step_ms: Option<u64>,

    /// Lifetime count, never reset by position commands.
    total_steps: u32,
    last_event: Option<StepEvent>,
}

impl Default for StepDetector {
    fn default() -> Self {
        Self::new(StepDetectorConfig::default())
    }
}

impl StepDetector {
    pub fn new(config: StepDetectorConfig) -> Self {
        Self {
            config,
            window: AccelWindow::new(),
            was_above: false,
            prev_magnitude: 0.0,
            last_step_ms: None,
            total_steps: 0,
            last_event: None,
        }
    }

    /// Feed one magnitude sample and classify it.
    pub fn process(&mut self, timestamp_ms: u64, magnitude: f32) -> DetectOutcome {
        self.window.push(AccelSample {
            timestamp_ms,
            magnitude,
        });

        if self.window.len() < self.config.warmup_len {
            return DetectOutcome::WarmingUp;
        }

        let take = self.config.window_len.min(self.window.len());
        let mut mean = 0.0f32;
        for s in self.window.recent(take) {
            mean += s.magnitude;
        }
        mean /= take as f32;

        let mut var = 0.0f32;
        for s in self.window.recent(take) {
            let d = s.magnitude - mean;
            var += d * d;
        }
        let std = libm::sqrtf(var / take as f32);

        if std < self.config.stationary_std {
            return DetectOutcome::Stationary;
        }

        let threshold = mean + std.max(self.config.threshold_margin);

        let above = magnitude > threshold;
        let rising = above && !self.was_above;
        let jump_ok = magnitude - self.prev_magnitude > self.config.min_jump;
        let refractory_over = match self.last_step_ms {
            Some(last) => timestamp_ms.saturating_sub(last) > self.config.refractory_ms,
            None => true,
        };

        let outcome = if rising && jump_ok {
            if refractory_over {
                DetectOutcome::Step
            } else {
                DetectOutcome::Refractory
            }
        } else {
            DetectOutcome::BelowThreshold
        };

        self.was_above = above;
        self.prev_magnitude = magnitude;

        if outcome == DetectOutcome::Step {
            self.last_step_ms = Some(timestamp_ms);
            self.total_steps = self.total_steps.saturating_add(1);
            self.last_event = Some(StepEvent {
                timestamp_ms,
                magnitude,
            });
        }

        outcome
    }

    /// Total steps seen since construction.
    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    pub fn last_event(&self) -> Option<StepEvent> {
        self.last_event
    }

    pub fn window(&self) -> &AccelWindow {
        &self.window
    }

    /// Clear signal state. The lifetime step counter is kept.
    pub fn reset_signal(&mut self) {
        self.window.clear();
        self.was_above = false;
        self.prev_magnitude = 0.0;
        self.last_step_ms = None;
        self.last_event = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Eleven quiet samples with a little jitter. Fills the warm-up quota
    /// without ever firing.
    fn prime_quiet(det: &mut StepDetector, t0: u64) -> u64 {
        let base = [9.8, 9.6, 10.0, 9.7, 9.9, 9.8, 9.6, 10.0, 9.7, 9.9, 9.8];
        let mut t = t0;
        for m in base {
            det.process(t, m);
            t += 50;
        }
        t
    }

    #[test]
    fn warm_up_gate_holds_until_twelve_samples() {
        let mut det = StepDetector::default();
        for i in 0..11 {
            let out = det.process(i * 50, 15.0);
            assert_eq!(out, DetectOutcome::WarmingUp, "sample {} fired early", i);
        }
        assert_eq!(det.total_steps(), 0);
    }

    #[test]
    fn constant_input_never_registers_a_step() {
        let mut det = StepDetector::default();
        for i in 0..64 {
            let out = det.process(i * 50, 9.81);
            assert_ne!(out, DetectOutcome::Step);
        }
        assert_eq!(det.total_steps(), 0);
    }

    #[test]
    fn spike_after_quiet_window_fires_once() {
        let mut det = StepDetector::default();
        let t = prime_quiet(&mut det, 0);

        let out = det.process(t, 16.0);
        assert_eq!(out, DetectOutcome::Step);
        assert_eq!(det.total_steps(), 1);
        let ev = det.last_event().unwrap();
        assert_eq!(ev.timestamp_ms, t);
        assert!((ev.magnitude - 16.0).abs() < 1e-6);

        // Still above threshold: no rising edge, no second step.
        let out = det.process(t + 50, 16.0);
        assert_ne!(out, DetectOutcome::Step);
        assert_eq!(det.total_steps(), 1);
    }

    #[test]
    fn refractory_blocks_close_peaks() {
        let mut det = StepDetector::default();
        let t = prime_quiet(&mut det, 0);

        assert_eq!(det.process(t, 16.0), DetectOutcome::Step);
        det.process(t + 100, 9.8);
        let out = det.process(t + 300, 16.0);
        assert_eq!(out, DetectOutcome::Refractory, "peak inside 400 ms fired");
        assert_eq!(det.total_steps(), 1);

        det.process(t + 500, 9.8);
        let out = det.process(t + 900, 16.0);
        assert_eq!(out, DetectOutcome::Step, "peak past refractory rejected");
        assert_eq!(det.total_steps(), 2);
    }

    #[test]
    fn ring_buffer_evicts_oldest() {
        let mut window = AccelWindow::new();
        for i in 0..(ACCEL_BUFFER_SIZE as u64 + 10) {
            window.push(AccelSample {
                timestamp_ms: i,
                magnitude: i as f32,
            });
        }
        assert_eq!(window.len(), ACCEL_BUFFER_SIZE);

        // Oldest surviving sample is number 10.
        let first = window.recent(ACCEL_BUFFER_SIZE).next().unwrap();
        assert_eq!(first.timestamp_ms, 10);

        let newest = window.recent(1).next().unwrap();
        assert_eq!(newest.timestamp_ms, ACCEL_BUFFER_SIZE as u64 + 9);
    }

    #[test]
    fn recent_returns_requested_span_in_order() {
        let mut window = AccelWindow::new();
        for i in 0..30u64 {
            window.push(AccelSample {
                timestamp_ms: i,
                magnitude: 0.0,
            });
        }
        let times: alloc::vec::Vec<u64> = window.recent(5).map(|s| s.timestamp_ms).collect();
        assert_eq!(times, [25, 26, 27, 28, 29]);
    }

    #[test]
    fn reset_signal_keeps_lifetime_total() {
        let mut det = StepDetector::default();
        let t = prime_quiet(&mut det, 0);
        det.process(t, 16.0);
        assert_eq!(det.total_steps(), 1);

        det.reset_signal();
        assert!(det.window().is_empty());
        assert_eq!(det.total_steps(), 1);
    }
}
