//! # Homeward Core
//!
//! Pedestrian dead-reckoning engine designed for `no_std` environments.
//! This crate contains only the code that needs to run on the device that
//! carries the sensors:
//! - Adaptive step detection over a bounded acceleration window
//! - Wrap-aware heading and pitch smoothing
//! - Position, path and odometry integration
//! - Return vector back to the start point
//! - Step-length calibration sessions
//! - Compact trail encoding for constrained links
//!
//! # Features
//! - `std`: Enable standard library support (on by default, used by tests)
//! - `serde`: Serialization of the persisted session record

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod calibration;
pub mod engine;
pub mod filters;
pub mod step;
pub mod trail;

// Re-export core types
pub use calibration::{CalibrationConfig, CalibrationOutcome, CalibrationSession, CalibrationState};
pub use engine::{
    DeadReckoner, EngineConfig, MotionSample, OrientationSample, Position, ReturnVector,
    SessionRecord, Snapshot, StepAdvance,
};
pub use filters::{normalize_deg, HeadingFilter, PitchFilter};
pub use step::{DetectOutcome, StepDetector, StepDetectorConfig, StepEvent, ACCEL_BUFFER_SIZE};
pub use trail::{cm_to_m, decode_trail, m_to_cm, TrailPacker};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
