// ---------------------------------------------------------------------------
// Angle helpers
// ---------------------------------------------------------------------------

/// Normalize an angle in degrees into `[0, 360)`.
#[inline]
pub fn normalize_deg(deg: f32) -> f32 {
    let rem = deg % 360.0;
    if rem < 0.0 {
        rem + 360.0
    } else {
        rem
    }
}

/// Shortest signed arc from `from` to `to`, in `(-180, 180]`.
/// Both inputs must already be in `[0, 360)`.
#[inline]
fn arc_deg(from: f32, to: f32) -> f32 {
    let mut diff = to - from;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff <= -180.0 {
        diff += 360.0;
    }
    diff
}

// ---------------------------------------------------------------------------
// Heading
// ---------------------------------------------------------------------------

/// Exponential smoothing over a compass heading, continuous across the
/// 0/360 boundary. Unseeded until the first valid sample, which passes
/// through unfiltered.
pub struct HeadingFilter {
    alpha: f32,
    state: Option<f32>,
}

impl HeadingFilter {
    pub fn new(alpha: f32) -> Self {
        Self { alpha, state: None }
    }

    /// Absent samples leave the estimate unchanged.
    pub fn update(&mut self, raw_deg: Option<f32>) -> Option<f32> {
        let raw = match raw_deg {
            Some(r) => normalize_deg(r),
            None => return self.state,
        };

        let next = match self.state {
            None => raw,
            Some(current) => normalize_deg(current + self.alpha * arc_deg(current, raw)),
        };
        self.state = Some(next);
        self.state
    }

    pub fn value(&self) -> Option<f32> {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}

// ---------------------------------------------------------------------------
// Pitch
// ---------------------------------------------------------------------------

/// Exponential smoothing over forward tilt. Input degrees are clamped to
/// `[-90, 90]` and tracked in radians; the domain is bounded so no wrap
/// handling is needed.
pub struct PitchFilter {
    alpha: f32,
    state: Option<f32>,
}

impl PitchFilter {
    pub fn new(alpha: f32) -> Self {
        Self { alpha, state: None }
    }

    pub fn update(&mut self, raw_deg: Option<f32>) -> Option<f32> {
        let raw = match raw_deg {
            Some(r) => r.clamp(-90.0, 90.0).to_radians(),
            None => return self.state,
        };

        let next = match self.state {
            None => raw,
            Some(current) => current + self.alpha * (raw - current),
        };
        self.state = Some(next);
        self.state
    }

    /// Smoothed tilt in radians.
    pub fn value(&self) -> Option<f32> {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_seeds_directly() {
        let mut f = HeadingFilter::new(0.15);
        assert_eq!(f.value(), None);
        assert_eq!(f.update(Some(350.0)), Some(350.0));
    }

    #[test]
    fn absent_samples_leave_state() {
        let mut f = HeadingFilter::new(0.15);
        assert_eq!(f.update(None), None);
        f.update(Some(10.0));
        assert_eq!(f.update(None), Some(10.0));
    }

    #[test]
    fn heading_crosses_north_without_jump() {
        let mut f = HeadingFilter::new(0.15);
        let mut prev = f.update(Some(350.0)).unwrap();
        for raw in [355.0, 5.0, 10.0] {
            let next = f.update(Some(raw)).unwrap();
            let step = arc_deg(prev, next).abs();
            assert!(
                step < 30.0,
                "filter jumped {} deg moving toward {}",
                step,
                raw
            );
            prev = next;
        }
        // Drifts clockwise past north rather than swinging the long way.
        assert!(prev < 90.0 || prev > 345.0, "ended at {}", prev);
    }

    #[test]
    fn smoothing_follows_constant_input() {
        let mut f = HeadingFilter::new(0.15);
        f.update(Some(0.0));
        for _ in 0..200 {
            f.update(Some(90.0));
        }
        let v = f.value().unwrap();
        assert!((v - 90.0).abs() < 0.1, "converged to {}", v);
    }

    #[test]
    fn wrap_arc_prefers_short_way() {
        assert!((arc_deg(350.0, 10.0) - 20.0).abs() < 1e-5);
        assert!((arc_deg(10.0, 350.0) + 20.0).abs() < 1e-5);
        assert!((arc_deg(0.0, 180.0) - 180.0).abs() < 1e-5);
    }

    #[test]
    fn pitch_clamps_before_filtering() {
        let mut f = PitchFilter::new(0.15);
        f.update(Some(170.0));
        let v = f.value().unwrap();
        assert!(
            (v - 90.0f32.to_radians()).abs() < 1e-6,
            "seeded past the clamp: {}",
            v
        );
    }

    #[test]
    fn pitch_smooths_in_radians() {
        let mut f = PitchFilter::new(0.15);
        f.update(Some(0.0));
        f.update(Some(20.0));
        let expected = 0.15 * 20.0f32.to_radians();
        let v = f.value().unwrap();
        assert!((v - expected).abs() < 1e-6, "got {}", v);
    }
}
