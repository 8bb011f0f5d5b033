use homeward_core::{normalize_deg, Position};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------
const TICK_MS: u64 = 50; // 20 Hz sample clock
const GRAVITY_MPS2: f32 = 9.81;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// One straight segment of a scripted walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkLeg {
    pub heading_deg: f32, // compass, 0 = north
    pub distance_m: f32,
    pub pitch_deg: f32, // ground slope, positive uphill
}

#[derive(Debug, Clone)]
pub struct WalkParams {
    pub legs: Vec<WalkLeg>,
    pub speed_mps: f32,
    pub step_length_m: f32,
    /// Peak deviation of the accelerometer magnitude from gravity while
    /// walking.
    pub accel_amp: f32,
    /// Standing still before the first leg.
    pub idle_secs: f32,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            // Closed rectangle: ends back at the start point
            legs: vec![
                WalkLeg {
                    heading_deg: 0.0,
                    distance_m: 20.0,
                    pitch_deg: 0.0,
                },
                WalkLeg {
                    heading_deg: 90.0,
                    distance_m: 10.0,
                    pitch_deg: 0.0,
                },
                WalkLeg {
                    heading_deg: 180.0,
                    distance_m: 20.0,
                    pitch_deg: 0.0,
                },
                WalkLeg {
                    heading_deg: 270.0,
                    distance_m: 10.0,
                    pitch_deg: 0.0,
                },
            ],
            speed_mps: 1.4,
            step_length_m: 0.75,
            accel_amp: 3.5,
            idle_secs: 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Ground Truth
// ---------------------------------------------------------------------------

/// Per-tick truth for the scripted walk. All vectors share one index.
#[derive(Clone)]
pub struct WalkTruth {
    pub time_ms: Vec<u64>,
    pub position: Vec<Position>,
    pub heading_deg: Vec<f32>,
    pub pitch_deg: Vec<f32>,
    /// Clean accelerometer magnitude, gravity plus gait oscillation.
    pub accel_magnitude: Vec<f32>,
    /// Cumulative true step count.
    pub steps: Vec<u32>,
}

// ---------------------------------------------------------------------------
// Main Loop
// ---------------------------------------------------------------------------

/// Script a walk into per-tick ground truth. The gait shows up as a
/// sinusoid on the accelerometer magnitude at the cadence implied by
/// speed and step length; one full cycle is one step.
pub fn synthesize_walk(p: &WalkParams) -> WalkTruth {
    let dt_s = TICK_MS as f32 / 1000.0;
    let speed = p.speed_mps.max(0.1);
    let step_length = p.step_length_m.max(0.1);
    let cadence_hz = speed / step_length;

    let mut truth = WalkTruth {
        time_ms: Vec::new(),
        position: Vec::new(),
        heading_deg: Vec::new(),
        pitch_deg: Vec::new(),
        accel_magnitude: Vec::new(),
        steps: Vec::new(),
    };

    let mut t_ms: u64 = 0;
    let mut pos = Position::zeros();
    let mut phase: f32 = 0.0;
    let facing = p
        .legs
        .first()
        .map(|leg| normalize_deg(leg.heading_deg))
        .unwrap_or(0.0);

    // Standing phase: flat magnitude, facing the first leg
    let idle_ticks = (p.idle_secs.max(0.0) * 1000.0 / TICK_MS as f32) as u64;
    for _ in 0..idle_ticks {
        truth.time_ms.push(t_ms);
        truth.position.push(pos);
        truth.heading_deg.push(facing);
        truth.pitch_deg.push(0.0);
        truth.accel_magnitude.push(GRAVITY_MPS2);
        truth.steps.push(phase as u32);
        t_ms += TICK_MS;
    }

    for leg in &p.legs {
        if leg.distance_m <= 0.0 {
            continue;
        }
        let heading = normalize_deg(leg.heading_deg);
        let rad = heading.to_radians();
        let dir = Position::new(rad.sin(), -rad.cos());
        let ticks = (leg.distance_m / (speed * dt_s)).ceil() as u64;

        for _ in 0..ticks {
            truth.time_ms.push(t_ms);
            truth.position.push(pos);
            truth.heading_deg.push(heading);
            truth.pitch_deg.push(leg.pitch_deg);
            truth.accel_magnitude.push(
                GRAVITY_MPS2 + p.accel_amp * (std::f32::consts::TAU * phase).sin(),
            );
            truth.steps.push(phase as u32);

            pos += dir * (speed * dt_s);
            phase += cadence_hz * dt_s;
            t_ms += TICK_MS;
        }
    }

    truth
}
