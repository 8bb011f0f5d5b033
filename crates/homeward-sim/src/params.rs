//! Parameter definitions for walk simulation and engine tuning.

use homeward_core::EngineConfig;

/// Parameter specification with bounds and step size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Human-readable label.
    pub label: &'static str,
    /// Minimum value.
    pub min: f32,
    /// Maximum value.
    pub max: f32,
    /// Step size for sliders.
    pub step: f32,
}

impl ParamSpec {
    /// Create a new parameter specification.
    pub const fn new(label: &'static str, min: f32, max: f32, step: f32) -> Self {
        Self {
            label,
            min,
            max,
            step,
        }
    }
}

/// Engine parameters.
pub mod engine {
    use super::ParamSpec;

    pub const STEP_LENGTH: ParamSpec = ParamSpec::new("Step Length (m)", 0.3, 1.5, 0.05);
    pub const HEADING_ALPHA: ParamSpec = ParamSpec::new("Heading Alpha", 0.02, 0.9, 0.02);
    pub const PITCH_ALPHA: ParamSpec = ParamSpec::new("Pitch Alpha", 0.02, 0.9, 0.02);
}

/// Step detector tuning.
pub mod detector {
    use super::ParamSpec;

    pub const STATIONARY_STD: ParamSpec = ParamSpec::new("Stationary Std (m/s²)", 0.1, 2.0, 0.05);
    pub const THRESHOLD_MARGIN: ParamSpec =
        ParamSpec::new("Threshold Margin (m/s²)", 0.1, 3.0, 0.05);
    pub const MIN_JUMP: ParamSpec = ParamSpec::new("Min Jump (m/s²)", 0.1, 2.0, 0.05);
    pub const REFRACTORY_MS: ParamSpec = ParamSpec::new("Refractory (ms)", 100.0, 1000.0, 50.0);
}

/// Calibration tuning.
pub mod calibration {
    use super::ParamSpec;

    pub const ASSUMED_SPEED: ParamSpec = ParamSpec::new("Assumed Speed (m/s)", 0.8, 2.0, 0.1);
}

/// Scripted-walk parameters.
pub mod walk {
    use super::ParamSpec;

    pub const SPEED: ParamSpec = ParamSpec::new("Walk Speed (m/s)", 0.5, 2.5, 0.1);
    pub const TRUE_STEP_LENGTH: ParamSpec = ParamSpec::new("True Step Length (m)", 0.3, 1.5, 0.05);
    pub const ACCEL_AMP: ParamSpec = ParamSpec::new("Gait Amplitude (m/s²)", 1.0, 6.0, 0.25);
}

/// Sensor noise parameters.
pub mod sensor {
    use super::ParamSpec;

    pub const NOISE_SCALE: ParamSpec = ParamSpec::new("Noise Scale", 0.0, 4.0, 0.25);
    pub const HEADING_DROPOUT: ParamSpec = ParamSpec::new("Heading Dropout", 0.0, 0.5, 0.05);
}

/// Engine-side parameters that sweeps and tuning may vary by name.
pub const SWEEPABLE: [(&str, ParamSpec); 8] = [
    ("step_length", engine::STEP_LENGTH),
    ("heading_alpha", engine::HEADING_ALPHA),
    ("pitch_alpha", engine::PITCH_ALPHA),
    ("stationary_std", detector::STATIONARY_STD),
    ("threshold_margin", detector::THRESHOLD_MARGIN),
    ("min_jump", detector::MIN_JUMP),
    ("refractory_ms", detector::REFRACTORY_MS),
    ("assumed_speed", calibration::ASSUMED_SPEED),
];

/// Look up a sweepable parameter by name.
pub fn param_spec(name: &str) -> Option<ParamSpec> {
    for (n, spec) in SWEEPABLE.iter() {
        if *n == name {
            return Some(*spec);
        }
    }
    None
}

/// Write a sweepable parameter into an engine config. Returns false for
/// unknown names.
pub fn apply_engine_param(cfg: &mut EngineConfig, name: &str, value: f32) -> bool {
    match name {
        "step_length" => cfg.step_length_m = value,
        "heading_alpha" => cfg.heading_alpha = value,
        "pitch_alpha" => cfg.pitch_alpha = value,
        "stationary_std" => cfg.detector.stationary_std = value,
        "threshold_margin" => cfg.detector.threshold_margin = value,
        "min_jump" => cfg.detector.min_jump = value,
        "refractory_ms" => cfg.detector.refractory_ms = value as u64,
        "assumed_speed" => cfg.calibration.assumed_speed_mps = value,
        _ => return false,
    }
    true
}
