use crate::walk::WalkTruth;
use homeward_core::normalize_deg;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

pub struct SensorConfig {
    pub noise_scale: f32,
    pub accel_noise_std: f32,   // m/s^2, on the magnitude
    pub heading_noise_std: f32, // degrees
    pub pitch_noise_std: f32,   // degrees
    /// Probability that a heading sample is lost entirely, as when the
    /// compass is being recalibrated.
    pub heading_dropout: f32,
    pub seed: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            noise_scale: 1.0,
            accel_noise_std: 0.15,
            heading_noise_std: 6.0,
            pitch_noise_std: 2.0,
            heading_dropout: 0.05,
            seed: 42,
        }
    }
}

pub struct SensorStream {
    pub time_ms: Vec<u64>,
    pub accel: Vec<Vector3<f32>>,
    pub heading_deg: Vec<Option<f32>>,
    pub pitch_deg: Vec<Option<f32>>,
}

pub fn generate_sensor_stream(truth: &WalkTruth, cfg: &SensorConfig) -> SensorStream {
    let mut rng = StdRng::seed_from_u64(cfg.seed);

    let n = truth.time_ms.len();
    let mut stream = SensorStream {
        time_ms: truth.time_ms.clone(),
        accel: Vec::with_capacity(n),
        heading_deg: Vec::with_capacity(n),
        pitch_deg: Vec::with_capacity(n),
    };

    // Distributions
    let d_accel = Normal::new(0.0, cfg.noise_scale * cfg.accel_noise_std).unwrap();
    let d_heading = Normal::new(0.0, cfg.noise_scale * cfg.heading_noise_std).unwrap();
    let d_pitch = Normal::new(0.0, cfg.noise_scale * cfg.pitch_noise_std).unwrap();

    for i in 0..n {
        // 1. Accelerometer
        // The pipeline consumes only the vector norm, so noise goes on the
        // magnitude and the lateral split is cosmetic. The z component is
        // chosen to make the norm equal the noisy magnitude.
        let magnitude = (truth.accel_magnitude[i] + d_accel.sample(&mut rng)).max(0.0);
        let lx: f32 = d_accel.sample(&mut rng);
        let ly: f32 = d_accel.sample(&mut rng);
        let lz_sq = (magnitude * magnitude - lx * lx - ly * ly).max(0.0);
        stream.accel.push(Vector3::new(lx, ly, lz_sq.sqrt()));

        // 2. Compass heading, with dropouts
        if rng.gen::<f32>() < cfg.heading_dropout {
            stream.heading_deg.push(None);
        } else {
            let h = normalize_deg(truth.heading_deg[i] + d_heading.sample(&mut rng));
            stream.heading_deg.push(Some(h));
        }

        // 3. Pitch
        stream
            .pitch_deg
            .push(Some(truth.pitch_deg[i] + d_pitch.sample(&mut rng)));
    }

    stream
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::{synthesize_walk, WalkParams};

    fn short_truth() -> WalkTruth {
        synthesize_walk(&WalkParams::default())
    }

    #[test]
    fn same_seed_reproduces_the_stream() {
        let truth = short_truth();
        let cfg = SensorConfig::default();
        let a = generate_sensor_stream(&truth, &cfg);
        let b = generate_sensor_stream(&truth, &cfg);
        assert_eq!(a.accel, b.accel);
        assert_eq!(a.heading_deg, b.heading_deg);
        assert_eq!(a.pitch_deg, b.pitch_deg);
    }

    #[test]
    fn accel_norm_tracks_true_magnitude() {
        let truth = short_truth();
        let stream = generate_sensor_stream(&truth, &SensorConfig::default());
        for (meas, &clean) in stream.accel.iter().zip(&truth.accel_magnitude) {
            let err = (meas.norm() - clean).abs();
            assert!(err < 1.0, "norm {} clean {}", meas.norm(), clean);
        }
    }

    #[test]
    fn heading_dropout_rate_is_plausible() {
        let truth = short_truth();
        let stream = generate_sensor_stream(&truth, &SensorConfig::default());
        let lost = stream.heading_deg.iter().filter(|h| h.is_none()).count();
        let rate = lost as f32 / stream.heading_deg.len() as f32;
        assert!(rate > 0.01 && rate < 0.12, "dropout rate {}", rate);
    }

    #[test]
    fn headings_are_normalized() {
        let truth = short_truth();
        let cfg = SensorConfig {
            heading_noise_std: 40.0,
            ..SensorConfig::default()
        };
        let stream = generate_sensor_stream(&truth, &cfg);
        for h in stream.heading_deg.iter().flatten() {
            assert!((0.0..360.0).contains(h), "heading {}", h);
        }
    }

    #[test]
    fn zero_noise_passes_truth_through() {
        let truth = short_truth();
        let cfg = SensorConfig {
            noise_scale: 0.0,
            heading_dropout: 0.0,
            ..SensorConfig::default()
        };
        let stream = generate_sensor_stream(&truth, &cfg);
        for (meas, &clean) in stream.accel.iter().zip(&truth.accel_magnitude) {
            assert!((meas.norm() - clean).abs() < 1e-4);
        }
        for (h, &clean) in stream.heading_deg.iter().zip(&truth.heading_deg) {
            assert_eq!(*h, Some(clean));
        }
    }
}
