//! Tunables for [`PhysicsSim`](crate::sim::PhysicsSim).
//!
//! Defaults give a 20 Hz fixed tick, 15
//! velocity iterations, 3 positional-correction iterations and a 10 unit/s
//! speed cap.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How two bodies' material coefficients are merged into one per contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CombineRule {
    /// `(a + b) / 2`
    Average,
    /// `a * b`. Values above 1 compound, which is how "super-elastic"
    /// restitution up to ~3 is reached.
    Product,
    /// `min(a, b)`
    Min,
    /// `max(a, b)`
    Max,
    /// `sqrt(a * b)`
    GeometricMean,
}

impl CombineRule {
    /// Merge two coefficients.
    #[inline]
    pub fn combine(self, a: f32, b: f32) -> f32 {
        match self {
            CombineRule::Average => 0.5 * (a + b),
            CombineRule::Product => a * b,
            CombineRule::Min => a.min(b),
            CombineRule::Max => a.max(b),
            CombineRule::GeometricMean => (a * b).max(0.0).sqrt(),
        }
    }
}

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Fixed tick length in seconds.
    pub dt: f32,
    /// Multiplier applied to every frame time before it reaches the accumulator.
    pub time_scale: f32,
    /// Upper bound on a single frame's contribution to the accumulator.
    pub max_frame_time: f32,
    /// Sequential-impulse passes per tick.
    pub velocity_iterations: u32,
    /// Positional-correction passes per tick.
    pub position_iterations: u32,
    /// Speed cap applied to dynamic bodies after the velocity solve.
    pub max_speed: f32,
    /// Penetration tolerated without correction.
    pub slop: f32,
    /// Fraction of the excess penetration removed per correction pass.
    pub steering_constant: f32,
    /// Most negative steering value a single correction pass may apply.
    pub max_correction: f32,
    /// GJK gives up (reports no collision) after this many support queries.
    pub gjk_max_iterations: u32,
    /// EPA expansion cap.
    pub epa_max_iterations: u32,
    /// EPA stops once the polytope grows by less than this along the best face normal.
    pub epa_tolerance: f32,
    /// Restitution combination between two rigid bodies.
    pub restitution_rule: CombineRule,
    /// Friction combination between two rigid bodies.
    pub friction_rule: CombineRule,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 20.0,
            time_scale: 1.0,
            max_frame_time: 0.1,
            velocity_iterations: 15,
            position_iterations: 3,
            max_speed: 10.0,
            slop: 0.01,
            steering_constant: 0.2,
            max_correction: -0.2,
            gjk_max_iterations: 20,
            epa_max_iterations: 128,
            epa_tolerance: 1e-5,
            restitution_rule: CombineRule::Product,
            friction_rule: CombineRule::Average,
        }
    }
}

impl SimConfig {
    /// Builder: set the fixed tick length.
    ///
    /// # Panics
    /// Panics if `dt` is not positive and finite.
    pub fn with_dt(mut self, dt: f32) -> Self {
        assert!(dt > 0.0 && dt.is_finite(), "dt must be positive and finite");
        self.dt = dt;
        self
    }

    /// Builder: set the time scale.
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale.max(0.0);
        self
    }

    /// Builder: set the per-frame accumulator clamp.
    pub fn with_max_frame_time(mut self, max_frame_time: f32) -> Self {
        self.max_frame_time = max_frame_time.max(0.0);
        self
    }

    /// Builder: set velocity and position solver iteration counts.
    pub fn with_iterations(mut self, velocity: u32, position: u32) -> Self {
        self.velocity_iterations = velocity;
        self.position_iterations = position;
        self
    }

    /// Builder: set the speed cap.
    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed.max(0.0);
        self
    }

    /// Builder: set slop, steering constant and the per-pass correction cap.
    pub fn with_correction(mut self, slop: f32, steering_constant: f32, max_correction: f32) -> Self {
        self.slop = slop.max(0.0);
        self.steering_constant = steering_constant.clamp(0.0, 1.0);
        self.max_correction = -max_correction.abs();
        self
    }

    /// Builder: set the restitution combination rule.
    pub fn with_restitution_rule(mut self, rule: CombineRule) -> Self {
        self.restitution_rule = rule;
        self
    }

    /// Builder: set the friction combination rule.
    pub fn with_friction_rule(mut self, rule: CombineRule) -> Self {
        self.friction_rule = rule;
        self
    }

    /// Builder: set the GJK and EPA iteration caps.
    pub fn with_narrow_phase_limits(mut self, gjk_max_iterations: u32, epa_max_iterations: u32) -> Self {
        self.gjk_max_iterations = gjk_max_iterations.max(1);
        self.epa_max_iterations = epa_max_iterations.max(1);
        self
    }
}
