// ---------------------------------------------------------------------------
// States & Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CalibrationState {
    Idle = 0,
    Running = 1,
}

impl CalibrationState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationConfig {
    pub min_duration_secs: u32,
    pub max_duration_secs: u32,
    pub default_duration_secs: u32,
    /// Average walking speed assumed for the session.
    pub assumed_speed_mps: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: 5,
            max_duration_secs: 120,
            default_duration_secs: 15,
            assumed_speed_mps: 1.4,
        }
    }
}

/// Result of a finished session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOutcome {
    pub observed_steps: u32,
    pub elapsed_secs: u32,
    /// Derived step length. Absent when no steps were observed.
    pub step_length_m: Option<f32>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Timed step-length calibration.
///
/// The session watches the lifetime step total and derives a step length
/// from the steps observed over the elapsed interval at the assumed walking
/// speed. There is no internal timer: the deadline is checked against the
/// timestamp of each observed event, so the automatic stop and a manual
/// stop cannot both fire.
pub struct CalibrationSession {
    config: CalibrationConfig,
    state: CalibrationState,

    start_step_count: u32,
    start_time_ms: u64,
    deadline_ms: u64,
    live_steps: u32,
}

impl Default for CalibrationSession {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}

impl CalibrationSession {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            state: CalibrationState::Idle,
            start_step_count: 0,
            start_time_ms: 0,
            deadline_ms: 0,
            live_steps: 0,
        }
    }

    /// Begin a session. Duration is clamped to the configured bounds.
    /// Starting while already running restarts the window.
    pub fn start(&mut self, duration_secs: u32, total_steps: u32, now_ms: u64) {
        let duration = duration_secs.clamp(
            self.config.min_duration_secs,
            self.config.max_duration_secs,
        );
        self.state = CalibrationState::Running;
        self.start_step_count = total_steps;
        self.start_time_ms = now_ms;
        self.deadline_ms = now_ms + u64::from(duration) * 1000;
        self.live_steps = 0;
    }

    /// Feed the current lifetime step total. Returns the outcome when the
    /// deadline has passed, `None` while idle or still running.
    pub fn observe(&mut self, total_steps: u32, now_ms: u64) -> Option<CalibrationOutcome> {
        if self.state != CalibrationState::Running {
            return None;
        }
        self.live_steps = total_steps.saturating_sub(self.start_step_count);
        if now_ms >= self.deadline_ms {
            return Some(self.finish(total_steps, now_ms));
        }
        None
    }

    /// Manual stop. `None` if no session was running.
    pub fn stop(&mut self, total_steps: u32, now_ms: u64) -> Option<CalibrationOutcome> {
        if self.state != CalibrationState::Running {
            return None;
        }
        Some(self.finish(total_steps, now_ms))
    }

    fn finish(&mut self, total_steps: u32, now_ms: u64) -> CalibrationOutcome {
        self.state = CalibrationState::Idle;

        let elapsed_ms = now_ms.saturating_sub(self.start_time_ms);
        // Round to whole seconds, at least one.
        let elapsed_secs = (((elapsed_ms + 500) / 1000).max(1)) as u32;
        let observed_steps = total_steps.saturating_sub(self.start_step_count);
        self.live_steps = observed_steps;

        let step_length_m = if observed_steps > 0 {
            Some(self.config.assumed_speed_mps * elapsed_secs as f32 / observed_steps as f32)
        } else {
            None
        };

        CalibrationOutcome {
            observed_steps,
            elapsed_secs,
            step_length_m,
        }
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == CalibrationState::Running
    }

    /// Steps counted so far in the current session.
    pub fn live_steps(&self) -> u32 {
        self.live_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_step_length_from_observed_steps() {
        let mut s = CalibrationSession::default();
        s.start(15, 10, 0);
        assert!(s.is_running());

        let out = s.stop(22, 15_000).unwrap();
        assert_eq!(out.observed_steps, 12);
        assert_eq!(out.elapsed_secs, 15);
        // 1.4 m/s * 15 s / 12 steps
        let len = out.step_length_m.unwrap();
        assert!((len - 1.75).abs() < 1e-6, "got {}", len);
        assert_eq!(s.state(), CalibrationState::Idle);
    }

    #[test]
    fn zero_steps_yields_no_length() {
        let mut s = CalibrationSession::default();
        s.start(15, 40, 0);
        let out = s.stop(40, 15_000).unwrap();
        assert_eq!(out.observed_steps, 0);
        assert_eq!(out.step_length_m, None);
    }

    #[test]
    fn duration_is_clamped_to_bounds() {
        let mut s = CalibrationSession::default();
        s.start(2, 0, 0);
        // Below the 5 s floor: deadline lands at 5 s.
        assert!(s.observe(1, 4_999).is_none());
        assert!(s.observe(2, 5_000).is_some());

        s.start(500, 0, 0);
        assert!(s.observe(1, 119_999).is_none());
        assert!(s.observe(1, 120_000).is_some());
    }

    #[test]
    fn deadline_fires_on_first_late_event() {
        let mut s = CalibrationSession::default();
        s.start(5, 0, 1_000);

        assert!(s.observe(3, 3_000).is_none());
        assert_eq!(s.live_steps(), 3);

        let out = s.observe(9, 6_200).unwrap();
        assert_eq!(out.observed_steps, 9);
        // 5.2 s rounds to 5.
        assert_eq!(out.elapsed_secs, 5);

        // The session already closed; a manual stop finds nothing.
        assert_eq!(s.stop(9, 7_000), None);
        assert!(s.observe(12, 8_000).is_none());
    }

    #[test]
    fn sub_second_session_counts_as_one_second() {
        let mut s = CalibrationSession::default();
        s.start(15, 0, 0);
        let out = s.stop(2, 300).unwrap();
        assert_eq!(out.elapsed_secs, 1);
        let len = out.step_length_m.unwrap();
        assert!((len - 0.7).abs() < 1e-6, "got {}", len);
    }

    #[test]
    fn stop_while_idle_returns_none() {
        let mut s = CalibrationSession::default();
        assert_eq!(s.stop(5, 1_000), None);
        assert!(s.observe(5, 1_000).is_none());
    }

    #[test]
    fn restart_resets_the_window() {
        let mut s = CalibrationSession::default();
        s.start(15, 0, 0);
        s.observe(8, 2_000);
        assert_eq!(s.live_steps(), 8);

        s.start(15, 8, 2_000);
        assert_eq!(s.live_steps(), 0);
        let out = s.stop(14, 8_000).unwrap();
        assert_eq!(out.observed_steps, 6);
        assert_eq!(out.elapsed_secs, 6);
    }
}
