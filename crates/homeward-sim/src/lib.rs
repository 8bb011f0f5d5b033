//! Homeward Simulation Library
//!
//! Provides scripted-walk synthesis, sensor modeling and batch runs of the
//! dead-reckoning engine against ground truth.

pub mod params;
pub mod runner;
pub mod sensor;
pub mod walk;

// Re-export main types
pub use params::{apply_engine_param, param_spec, ParamSpec, SWEEPABLE};
pub use runner::{compute_metrics, run_engine, RunConfig, RunMetrics, RunResult};
pub use sensor::{generate_sensor_stream, SensorConfig, SensorStream};
pub use walk::{synthesize_walk, WalkLeg, WalkParams, WalkTruth};
