use crate::sensor::SensorStream;
use crate::walk::WalkTruth;
use homeward_core::{
    CalibrationOutcome, DeadReckoner, EngineConfig, MotionSample, OrientationSample, Position,
    SessionRecord,
};

/// How to run the engine over a sensor stream.
#[derive(Clone, Default)]
pub struct RunConfig {
    pub engine: EngineConfig,
    /// Start a calibration window of this many seconds at the first sample.
    pub calibrate_secs: Option<u32>,
    /// Continue a previous session instead of starting fresh.
    pub resume: Option<SessionRecord>,
}

/// Struct to hold the engine's estimates over the run.
#[derive(Clone)]
pub struct RunResult {
    pub time_ms: Vec<u64>,
    pub est_position: Vec<Position>,
    /// NaN until the first compass sample arrives.
    pub est_heading_deg: Vec<f32>,
    pub est_altitude_m: Vec<f32>,
    pub est_steps: Vec<u32>,
    pub back_distance_m: Vec<f32>,
    pub back_bearing_deg: Vec<f32>,
    /// Session state at the end of the stream.
    pub record: SessionRecord,
    /// Last calibration that finished during the run, if any.
    pub calibration: Option<CalibrationOutcome>,
}

/// Drive the dead-reckoning engine over generated sensor data.
pub fn run_engine(stream: &SensorStream, cfg: &RunConfig) -> RunResult {
    let mut dr = DeadReckoner::new(cfg.engine);
    match &cfg.resume {
        Some(record) => dr.restore(record.clone()),
        None => dr.set_start_point(),
    }

    if let Some(secs) = cfg.calibrate_secs {
        let start = stream.time_ms.first().copied().unwrap_or(0);
        dr.start_calibration(secs, start);
    }

    let n = stream.time_ms.len();
    let mut result = RunResult {
        time_ms: stream.time_ms.clone(),
        est_position: Vec::with_capacity(n),
        est_heading_deg: Vec::with_capacity(n),
        est_altitude_m: Vec::with_capacity(n),
        est_steps: Vec::with_capacity(n),
        back_distance_m: Vec::with_capacity(n),
        back_bearing_deg: Vec::with_capacity(n),
        record: SessionRecord::default(),
        calibration: None,
    };

    for i in 0..n {
        dr.ingest_orientation(OrientationSample {
            heading_deg: stream.heading_deg[i],
            pitch_deg: stream.pitch_deg[i],
        });
        dr.ingest_motion(MotionSample {
            timestamp_ms: stream.time_ms[i],
            accel: stream.accel[i],
        });

        let snap = dr.snapshot();
        result.est_position.push(snap.position);
        result.est_heading_deg.push(snap.heading_deg.unwrap_or(f32::NAN));
        result.est_altitude_m.push(snap.altitude_m);
        result.est_steps.push(snap.step_count);
        result.back_distance_m.push(snap.back_to_start.distance_m);
        result.back_bearing_deg.push(snap.back_to_start.bearing_deg);
    }

    result.record = dr.record();
    result.calibration = dr.last_calibration();
    result
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct RunMetrics {
    pub endpoint_error_m: f32,
    pub mean_error_m: f32,
    /// Estimated minus true final step count.
    pub step_count_error: i64,
    pub est_distance_m: f32,
}

pub fn compute_metrics(truth: &WalkTruth, run: &RunResult) -> RunMetrics {
    let n = truth.time_ms.len().min(run.time_ms.len());
    if n == 0 {
        return RunMetrics {
            endpoint_error_m: 0.0,
            mean_error_m: 0.0,
            step_count_error: 0,
            est_distance_m: run.record.total_distance_m,
        };
    }

    let mut err_sum = 0.0;
    for i in 0..n {
        err_sum += (run.est_position[i] - truth.position[i]).norm();
    }

    let endpoint = (run.est_position[n - 1] - truth.position[n - 1]).norm();
    let est_steps = run.est_steps[n - 1] as i64;
    let true_steps = truth.steps[n - 1] as i64;

    RunMetrics {
        endpoint_error_m: endpoint,
        mean_error_m: err_sum / n as f32,
        step_count_error: est_steps - true_steps,
        est_distance_m: run.record.total_distance_m,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{generate_sensor_stream, SensorConfig};
    use crate::walk::{synthesize_walk, WalkLeg, WalkParams};

    fn straight_leg(distance_m: f32) -> WalkParams {
        WalkParams {
            legs: vec![WalkLeg {
                heading_deg: 90.0,
                distance_m,
                pitch_deg: 0.0,
            }],
            ..WalkParams::default()
        }
    }

    #[test]
    fn rectangle_walk_returns_near_start() {
        let truth = synthesize_walk(&WalkParams::default());
        let stream = generate_sensor_stream(&truth, &SensorConfig::default());
        let run = run_engine(&stream, &RunConfig::default());
        let metrics = compute_metrics(&truth, &run);

        assert!(
            metrics.endpoint_error_m < 8.0,
            "endpoint error {} m",
            metrics.endpoint_error_m
        );
        assert!(
            metrics.mean_error_m < 10.0,
            "mean error {} m",
            metrics.mean_error_m
        );
        assert!(
            metrics.step_count_error.abs() <= 10,
            "step count error {}",
            metrics.step_count_error
        );

        // The walk is a closed loop, so the live return vector should agree
        // with the endpoint error up to the truth's last-tick offset.
        let back = *run.back_distance_m.last().unwrap();
        assert!(
            (back - metrics.endpoint_error_m).abs() < 0.2,
            "back {} endpoint {}",
            back,
            metrics.endpoint_error_m
        );
    }

    #[test]
    fn stationary_stream_produces_no_steps() {
        let truth = synthesize_walk(&WalkParams {
            legs: vec![],
            idle_secs: 10.0,
            ..WalkParams::default()
        });
        let stream = generate_sensor_stream(&truth, &SensorConfig::default());
        let run = run_engine(&stream, &RunConfig::default());

        assert_eq!(*run.est_steps.last().unwrap(), 0);
        assert_eq!(run.record.position, Position::zeros());
        assert_eq!(*run.back_distance_m.last().unwrap(), 0.0);
    }

    #[test]
    fn trail_grows_one_point_per_step() {
        let truth = synthesize_walk(&straight_leg(20.0));
        let stream = generate_sensor_stream(&truth, &SensorConfig::default());
        let run = run_engine(&stream, &RunConfig::default());

        let steps = *run.est_steps.last().unwrap() as usize;
        assert!(steps > 20, "too few steps: {}", steps);
        assert_eq!(run.record.path.len(), steps + 1);
    }

    #[test]
    fn resume_continues_where_the_record_left_off() {
        let truth = synthesize_walk(&straight_leg(20.0));
        let stream = generate_sensor_stream(&truth, &SensorConfig::default());
        let first = run_engine(&stream, &RunConfig::default());

        let stream2 = generate_sensor_stream(
            &truth,
            &SensorConfig {
                seed: 7,
                ..SensorConfig::default()
            },
        );
        let second = run_engine(
            &stream2,
            &RunConfig {
                resume: Some(first.record.clone()),
                ..RunConfig::default()
            },
        );

        let end = second.record.position;
        assert!((end.x - 40.0).abs() < 8.0, "x {}", end.x);
        assert!(end.y.abs() < 8.0, "y {}", end.y);
        assert!(second.record.step_count > first.record.step_count);
        assert!(second.record.path.len() > first.record.path.len());
        assert!((second.record.total_distance_m - 40.0).abs() < 8.0);
    }

    #[test]
    fn calibration_window_estimates_step_length() {
        let truth = synthesize_walk(&straight_leg(84.0));
        let stream = generate_sensor_stream(&truth, &SensorConfig::default());
        let run = run_engine(
            &stream,
            &RunConfig {
                calibrate_secs: Some(30),
                ..RunConfig::default()
            },
        );

        let outcome = run.calibration.expect("calibration never finished");
        assert_eq!(outcome.elapsed_secs, 30);
        assert!(
            (48..=58).contains(&outcome.observed_steps),
            "observed {}",
            outcome.observed_steps
        );
        // Walking at the assumed speed, the estimate lands near the true
        // 0.75 m per step.
        let len = outcome.step_length_m.expect("no step length derived");
        assert!((0.7..=0.95).contains(&len), "step length {}", len);
    }

    #[test]
    fn metrics_handle_empty_streams() {
        let truth = synthesize_walk(&WalkParams {
            legs: vec![],
            idle_secs: 0.0,
            ..WalkParams::default()
        });
        let stream = generate_sensor_stream(&truth, &SensorConfig::default());
        let run = run_engine(&stream, &RunConfig::default());
        let metrics = compute_metrics(&truth, &run);
        assert_eq!(metrics.endpoint_error_m, 0.0);
        assert_eq!(metrics.step_count_error, 0);
    }
}
