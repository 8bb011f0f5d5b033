use crate::calibration::{CalibrationConfig, CalibrationOutcome, CalibrationSession, CalibrationState};
use crate::filters::{normalize_deg, HeadingFilter, PitchFilter};
use crate::step::{DetectOutcome, StepDetector, StepDetectorConfig};
use alloc::vec::Vec;
use nalgebra::{Vector2, Vector3};

// ---------------------------------------------------------------------------
// CONFIGURATION
// ---------------------------------------------------------------------------

/// Local-plane position in meters. x grows east; walking due north
/// decreases y.
pub type Position = Vector2<f32>;

const MIN_STEP_LENGTH_M: f32 = 0.3;
const MAX_STEP_LENGTH_M: f32 = 1.5;

const ALTITUDE_BASELINE_M: f32 = 1.0;
const ALTITUDE_SNAP_BAND_M: f32 = 0.05;
/// Tilt below this (about 10 degrees) is treated as level ground.
const PITCH_GATE_RAD: f32 = 0.17;
/// Cap on vertical gain per step, as a fraction of the step length.
const MAX_CLIMB_RATIO: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Assumed displacement per step. Stored as given; clamped to
    /// `[0.3, 1.5]` only at the point of use.
    pub step_length_m: f32,
    pub heading_alpha: f32,
    pub pitch_alpha: f32,
    pub detector: StepDetectorConfig,
    pub calibration: CalibrationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_length_m: 0.75,
            heading_alpha: 0.15,
            pitch_alpha: 0.15,
            detector: StepDetectorConfig::default(),
            calibration: CalibrationConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// BOUNDARY TYPES
// ---------------------------------------------------------------------------

/// Inputs from the orientation stream. Absent fields leave the matching
/// filter untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationSample {
    pub heading_deg: Option<f32>,
    pub pitch_deg: Option<f32>,
}

/// Inputs from the motion stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub timestamp_ms: u64,
    pub accel: Vector3<f32>,
}

/// Distance and compass bearing from the current position back to the
/// start point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReturnVector {
    pub distance_m: f32,
    pub bearing_deg: f32,
}

/// One integrated step, reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepAdvance {
    pub timestamp_ms: u64,
    /// Step length actually applied, after clamping.
    pub step_length_m: f32,
    /// Compass bearing of the movement itself.
    pub bearing_deg: f32,
    pub position: Position,
}

/// Read-only view of the engine between events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub position: Position,
    pub heading_deg: Option<f32>,
    pub pitch_rad: Option<f32>,
    pub step_count: u32,
    pub total_distance_m: f32,
    pub altitude_m: f32,
    pub back_to_start: ReturnVector,
    pub paused: bool,
    pub origin_set: bool,
}

/// Everything an external store needs to bring a session back. Filters and
/// calibration state reinitialize fresh on restart and are deliberately
/// absent. Every field falls back to its default independently, so a
/// partial or corrupt record still restores.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionRecord {
    pub path: Vec<Position>,
    pub origin_set: bool,
    pub position: Position,
    pub total_distance_m: f32,
    pub step_count: u32,
    pub back_to_start: ReturnVector,
    pub altitude_m: f32,
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            path: Vec::new(),
            origin_set: false,
            position: Position::zeros(),
            total_distance_m: 0.0,
            step_count: 0,
            back_to_start: ReturnVector::default(),
            altitude_m: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ENGINE
// ---------------------------------------------------------------------------

/// Dead-reckoning engine. Owns the detector, the orientation filters and
/// the calibration session, and integrates accepted steps into a position,
/// a trail and odometry.
///
/// All intake is synchronous and bounded. Nothing here raises faults:
/// missing sensors, odd configs and degenerate calibrations all degrade to
/// keeping the previous state.
pub struct DeadReckoner {
    config: EngineConfig,
    detector: StepDetector,
    heading: HeadingFilter,
    pitch: PitchFilter,
    calibration: CalibrationSession,
    last_calibration: Option<CalibrationOutcome>,

    origin_set: bool,
    paused: bool,
    position: Position,
    path: Vec<Position>,
    step_count: u32,
    total_distance_m: f32,
    altitude_m: f32,
    back_to_start: ReturnVector,
}

impl Default for DeadReckoner {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl DeadReckoner {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            detector: StepDetector::new(config.detector),
            heading: HeadingFilter::new(config.heading_alpha),
            pitch: PitchFilter::new(config.pitch_alpha),
            calibration: CalibrationSession::new(config.calibration),
            last_calibration: None,
            origin_set: false,
            paused: false,
            position: Position::zeros(),
            path: Vec::new(),
            step_count: 0,
            total_distance_m: 0.0,
            altitude_m: 0.0,
            back_to_start: ReturnVector::default(),
        }
    }

    // =====================================================================
    // COMMANDS
    // =====================================================================

    /// Begin tracking here. Zeroes position and odometry, seeds the trail
    /// with the origin and re-bases altitude.
    pub fn set_start_point(&mut self) {
        self.origin_set = true;
        self.position = Position::zeros();
        self.path.clear();
        self.path.push(self.position);
        self.step_count = 0;
        self.total_distance_m = 0.0;
        self.altitude_m = ALTITUDE_BASELINE_M;
        self.refresh_return_vector();
    }

    /// Drop all tracking state. Heading and pitch estimates survive; they
    /// belong to the device, not the session.
    pub fn reset(&mut self) {
        self.origin_set = false;
        self.paused = false;
        self.position = Position::zeros();
        self.path.clear();
        self.step_count = 0;
        self.total_distance_m = 0.0;
        self.altitude_m = 0.0;
        self.refresh_return_vector();
    }

    /// Suspend trail and odometry growth. Position, altitude and the
    /// return vector keep updating so the way home stays honest.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Stored as given; the value is clamped where it is applied.
    pub fn set_step_length(&mut self, meters: f32) {
        self.config.step_length_m = meters;
    }

    pub fn start_calibration(&mut self, duration_secs: u32, now_ms: u64) {
        self.calibration
            .start(duration_secs, self.detector.total_steps(), now_ms);
    }

    pub fn stop_calibration(&mut self, now_ms: u64) -> Option<CalibrationOutcome> {
        let outcome = self.calibration.stop(self.detector.total_steps(), now_ms)?;
        self.apply_calibration(outcome);
        Some(outcome)
    }

    // =====================================================================
    // EVENT INTAKE
    // =====================================================================

    pub fn ingest_orientation(&mut self, sample: OrientationSample) {
        self.heading.update(sample.heading_deg);
        self.pitch.update(sample.pitch_deg);
    }

    /// Feed one accelerometer reading. Returns the integrated step when
    /// one was both detected and applied to the position.
    pub fn ingest_motion(&mut self, sample: MotionSample) -> Option<StepAdvance> {
        let magnitude = sample.accel.norm();
        let outcome = self.detector.process(sample.timestamp_ms, magnitude);

        // The calibration deadline rides on the motion stream.
        if let Some(done) = self
            .calibration
            .observe(self.detector.total_steps(), sample.timestamp_ms)
        {
            self.apply_calibration(done);
        }

        if outcome != DetectOutcome::Step {
            return None;
        }
        self.advance(sample.timestamp_ms)
    }

    fn apply_calibration(&mut self, outcome: CalibrationOutcome) {
        if let Some(len) = outcome.step_length_m {
            self.config.step_length_m = len;
        }
        self.last_calibration = Some(outcome);
    }

    fn advance(&mut self, timestamp_ms: u64) -> Option<StepAdvance> {
        if !self.origin_set {
            return None;
        }
        // Without a heading the step still counts, it just cannot move us.
        let heading = self.heading.value()?;

        let step = self
            .config
            .step_length_m
            .clamp(MIN_STEP_LENGTH_M, MAX_STEP_LENGTH_M);
        let rad = heading.to_radians();
        let dx = libm::sinf(rad) * step;
        let dy = -libm::cosf(rad) * step;

        self.position += Position::new(dx, dy);

        if !self.paused {
            self.path.push(self.position);
            self.step_count += 1;
            self.total_distance_m += step;
        }

        self.apply_altitude(step);
        self.refresh_return_vector();

        Some(StepAdvance {
            timestamp_ms,
            step_length_m: step,
            bearing_deg: normalize_deg(libm::atan2f(dx, -dy).to_degrees()),
            position: self.position,
        })
    }

    fn apply_altitude(&mut self, step: f32) {
        let pitch = match self.pitch.value() {
            Some(p) => p,
            None => return,
        };
        if libm::fabsf(pitch) > PITCH_GATE_RAD {
            let cap = MAX_CLIMB_RATIO * step;
            let dz = (step * libm::sinf(pitch)).clamp(-cap, cap);
            self.altitude_m += dz;
            if libm::fabsf(self.altitude_m - ALTITUDE_BASELINE_M) < ALTITUDE_SNAP_BAND_M {
                self.altitude_m = ALTITUDE_BASELINE_M;
            }
        }
    }

    fn refresh_return_vector(&mut self) {
        let back = -self.position;
        let distance = back.norm();
        let bearing = if distance > 0.0 {
            normalize_deg(libm::atan2f(back.x, -back.y).to_degrees())
        } else {
            0.0
        };
        self.back_to_start = ReturnVector {
            distance_m: distance,
            bearing_deg: bearing,
        };
    }

    // =====================================================================
    // QUERIES
    // =====================================================================

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            position: self.position,
            heading_deg: self.heading.value(),
            pitch_rad: self.pitch.value(),
            step_count: self.step_count,
            total_distance_m: self.total_distance_m,
            altitude_m: self.altitude_m,
            back_to_start: self.back_to_start,
            paused: self.paused,
            origin_set: self.origin_set,
        }
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Lifetime step total from the detector, independent of pause and
    /// reset. Calibration counts against this.
    pub fn raw_step_total(&self) -> u32 {
        self.detector.total_steps()
    }

    pub fn calibration_state(&self) -> CalibrationState {
        self.calibration.state()
    }

    pub fn calibration_live_steps(&self) -> u32 {
        self.calibration.live_steps()
    }

    pub fn last_calibration(&self) -> Option<CalibrationOutcome> {
        self.last_calibration
    }

    // =====================================================================
    // PERSISTENCE
    // =====================================================================

    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            path: self.path.clone(),
            origin_set: self.origin_set,
            position: self.position,
            total_distance_m: self.total_distance_m,
            step_count: self.step_count,
            back_to_start: self.back_to_start,
            altitude_m: self.altitude_m,
        }
    }

    /// Rehydrate from a stored record. The recorded return vector is
    /// display data; the live one is recomputed from the position.
    pub fn restore(&mut self, record: SessionRecord) {
        self.origin_set = record.origin_set;
        self.position = record.position;
        self.path = record.path;
        self.total_distance_m = record.total_distance_m;
        self.step_count = record.step_count;
        self.altitude_m = record.altitude_m;
        self.paused = false;
        self.refresh_return_vector();
    }
}
