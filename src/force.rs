//! Named, time-scoped forces acting on a single [`RigidBody`](crate::rigidbody::RigidBody).

use core::fmt;
use std::sync::Arc;

use nalgebra::Vector3;

/// Force as a function of elapsed simulation time (seconds).
pub type ForceFn = Arc<dyn Fn(f32) -> Vector3<f32> + Send + Sync>;

/// A force contributing acceleration `force / mass` every fixed tick.
///
/// A force is either indefinite (applied until removed) or carries a
/// remaining duration that is decremented by `dt` each tick; it is dropped
/// once the duration reaches zero.
#[derive(Clone)]
pub struct Force {
    /// Key within the owning body's force set.
    pub name: String,
    /// Constant force vector. Ignored when a time function is attached.
    pub vector: Vector3<f32>,
    /// Applied until explicitly removed.
    pub indefinite: bool,
    /// Seconds left. Only meaningful when not indefinite.
    pub duration: f32,
    time_fn: Option<ForceFn>,
}

impl Force {
    /// Force applied every tick until removed.
    pub fn constant(name: impl Into<String>, vector: Vector3<f32>) -> Self {
        Self {
            name: name.into(),
            vector,
            indefinite: true,
            duration: 0.0,
            time_fn: None,
        }
    }

    /// Force applied for `duration` seconds of simulation time.
    pub fn timed(name: impl Into<String>, vector: Vector3<f32>, duration: f32) -> Self {
        Self {
            name: name.into(),
            vector,
            indefinite: false,
            duration,
            time_fn: None,
        }
    }

    /// Indefinite force whose vector is recomputed from elapsed simulation
    /// time every tick.
    pub fn time_varying<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(f32) -> Vector3<f32> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            vector: Vector3::zeros(),
            indefinite: true,
            duration: 0.0,
            time_fn: Some(Arc::new(f)),
        }
    }

    /// Builder: limit the force to `duration` seconds.
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.indefinite = false;
        self.duration = duration;
        self
    }

    /// Whether the force vector depends on time.
    #[inline]
    pub fn is_time_dependent(&self) -> bool {
        self.time_fn.is_some()
    }

    /// Force vector at simulation time `t`.
    pub fn evaluate(&self, t: f32) -> Vector3<f32> {
        match &self.time_fn {
            Some(f) => f(t),
            None => self.vector,
        }
    }

    /// A finite force whose duration has run out.
    #[inline]
    pub fn is_expired(&self) -> bool {
        !self.indefinite && self.duration <= 0.0
    }
}

impl fmt::Debug for Force {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Force")
            .field("name", &self.name)
            .field("vector", &self.vector)
            .field("indefinite", &self.indefinite)
            .field("duration", &self.duration)
            .field("time_dependent", &self.is_time_dependent())
            .finish()
    }
}
