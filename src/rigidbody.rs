//! Point-mass rigid bodies and the forces they own.

use indexmap::IndexMap;
use log::warn;
use nalgebra::Vector3;

use crate::error::SimError;
use crate::force::Force;

/// A non-rotating point-mass body.
///
/// Kinematic bodies keep their velocity regardless of forces and contacts,
/// but still take part in collision detection so dynamic bodies bounce off
/// them.
#[derive(Debug, Clone)]
pub struct RigidBody {
    mass: f32,
    inv_mass: f32,
    pub velocity: Vector3<f32>,
    /// 0 is fully inelastic. Values above 1 are allowed and combine per
    /// [`SimConfig::restitution_rule`](crate::config::SimConfig::restitution_rule).
    pub restitution: f32,
    /// Coulomb friction coefficient.
    pub friction: f32,
    pub is_kinematic: bool,
    forces: IndexMap<String, Force>,
}

impl RigidBody {
    /// Create a dynamic body with the given mass.
    ///
    /// # Panics
    /// Panics if `mass` is not positive and finite.
    pub fn new(mass: f32) -> Self {
        assert!(mass > 0.0 && mass.is_finite(), "mass must be positive and finite");
        Self {
            mass,
            inv_mass: 1.0 / mass,
            velocity: Vector3::zeros(),
            restitution: 1.0,
            friction: 0.5,
            is_kinematic: false,
            forces: IndexMap::new(),
        }
    }

    /// Create a kinematic body. The mass still enters the effective mass of
    /// its contacts.
    pub fn kinematic(mass: f32) -> Self {
        let mut body = Self::new(mass);
        body.is_kinematic = true;
        body
    }

    /// Builder: set initial velocity.
    pub fn with_velocity(mut self, velocity: Vector3<f32>) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder: set restitution.
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution.max(0.0);
        self
    }

    /// Builder: set friction coefficient.
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction.max(0.0);
        self
    }

    /// Builder: attach a force.
    pub fn with_force(mut self, force: Force) -> Self {
        self.add_force(force);
        self
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Attach a force, replacing any force with the same name.
    pub fn add_force(&mut self, force: Force) {
        self.forces.insert(force.name.clone(), force);
    }

    /// Detach a force by name.
    pub fn remove_force(&mut self, name: &str) -> Result<Force, SimError> {
        self.forces.shift_remove(name).ok_or_else(|| {
            let err = SimError::ForceNotFound(name.to_owned());
            warn!("{}", err);
            err
        })
    }

    /// Detach every force.
    pub fn clear_forces(&mut self) {
        self.forces.clear();
    }

    pub fn force(&self, name: &str) -> Option<&Force> {
        self.forces.get(name)
    }

    pub fn force_mut(&mut self, name: &str) -> Option<&mut Force> {
        self.forces.get_mut(name)
    }

    /// Forces in the order they were attached.
    pub fn forces(&self) -> impl Iterator<Item = &Force> {
        self.forces.values()
    }

    pub fn force_count(&self) -> usize {
        self.forces.len()
    }

    /// Apply an instantaneous impulse: `delta_v = impulse / mass`.
    /// Kinematic bodies ignore impulses.
    #[inline]
    pub fn apply_impulse(&mut self, impulse: Vector3<f32>) {
        if !self.is_kinematic {
            self.velocity += impulse * self.inv_mass;
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.norm()
    }

    /// `0.5 * m * v^2`
    #[inline]
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.velocity.norm_squared()
    }

    /// One tick of force integration into a tentative velocity.
    ///
    /// Expired finite forces are dropped before anything is applied; the
    /// remaining finite forces lose `dt` of duration after contributing.
    /// Kinematic bodies are left untouched.
    pub(crate) fn integrate_forces(&mut self, dt: f32, t: f32) {
        if self.is_kinematic {
            return;
        }
        self.forces.retain(|_, f| !f.is_expired());

        let mut total = Vector3::zeros();
        for force in self.forces.values_mut() {
            total += force.evaluate(t);
            if !force.indefinite {
                force.duration -= dt;
            }
        }
        self.velocity += total * self.inv_mass * dt;
    }

    /// Clamp speed to `max_speed`, keeping direction.
    pub(crate) fn clamp_speed(&mut self, max_speed: f32) {
        if self.is_kinematic {
            return;
        }
        let speed = self.velocity.norm();
        if speed > max_speed && speed > 0.0 {
            self.velocity *= max_speed / speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn approx_vec_eq(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    #[test]
    fn test_body_creation() {
        let body = RigidBody::new(5.0);
        assert_eq!(body.mass(), 5.0);
        assert!(approx_eq(body.inv_mass(), 0.2));
        assert!(!body.is_kinematic);
        assert!(approx_vec_eq(&body.velocity, &Vector3::zeros()));
    }

    #[test]
    #[should_panic]
    fn test_body_zero_mass_panics() {
        RigidBody::new(0.0);
    }

    #[test]
    #[should_panic]
    fn test_body_negative_mass_panics() {
        RigidBody::new(-1.0);
    }

    #[test]
    fn test_builder_pattern() {
        let body = RigidBody::new(1.0)
            .with_velocity(Vector3::new(0.0, 5.0, 0.0))
            .with_restitution(2.5)
            .with_friction(0.3);
        assert!(approx_vec_eq(&body.velocity, &Vector3::new(0.0, 5.0, 0.0)));
        assert!(approx_eq(body.restitution, 2.5));
        assert!(approx_eq(body.friction, 0.3));
    }

    #[test]
    fn test_add_force_replaces_same_name() {
        let mut body = RigidBody::new(1.0);
        body.add_force(Force::constant("push", Vector3::x()));
        body.add_force(Force::constant("push", Vector3::y()));
        assert_eq!(body.force_count(), 1);
        assert_eq!(body.force("push").unwrap().vector, Vector3::y());
    }

    #[test]
    fn test_remove_missing_force_is_error() {
        let mut body = RigidBody::new(1.0);
        assert_eq!(
            body.remove_force("nope").unwrap_err(),
            SimError::ForceNotFound("nope".into())
        );
        body.add_force(Force::constant("push", Vector3::x()));
        assert!(body.remove_force("push").is_ok());
        assert_eq!(body.force_count(), 0);
    }

    #[test]
    fn test_integrate_constant_force() {
        let mut body = RigidBody::new(2.0).with_force(Force::constant("f", Vector3::new(4.0, 0.0, 0.0)));
        body.integrate_forces(0.5, 0.0);
        // a = F/m = 2, dv = a*dt = 1
        assert!(approx_vec_eq(&body.velocity, &Vector3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_timed_force_runs_for_duration() {
        let mut body = RigidBody::new(1.0).with_force(Force::timed("kick", Vector3::x(), 0.1));
        for _ in 0..5 {
            body.integrate_forces(0.05, 0.0);
        }
        // Applied on exactly two ticks of 0.05 s.
        assert!(approx_eq(body.velocity.x, 0.1));
        assert_eq!(body.force_count(), 0);
    }

    #[test]
    fn test_time_varying_force_sees_time() {
        let mut body = RigidBody::new(1.0).with_force(Force::time_varying("ramp", |t| Vector3::new(t, 0.0, 0.0)));
        body.integrate_forces(1.0, 3.0);
        assert!(approx_eq(body.velocity.x, 3.0));
    }

    #[test]
    fn test_kinematic_ignores_forces_and_impulses() {
        let mut body = RigidBody::kinematic(1.0)
            .with_velocity(Vector3::new(1.0, 0.0, 0.0))
            .with_force(Force::constant("f", Vector3::new(0.0, -10.0, 0.0)));
        body.integrate_forces(1.0, 0.0);
        body.apply_impulse(Vector3::new(100.0, 0.0, 0.0));
        body.clamp_speed(0.1);
        assert!(approx_vec_eq(&body.velocity, &Vector3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_apply_impulse() {
        let mut body = RigidBody::new(2.0);
        body.apply_impulse(Vector3::new(10.0, 0.0, 0.0));
        assert!(approx_vec_eq(&body.velocity, &Vector3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_clamp_speed_keeps_direction() {
        let mut body = RigidBody::new(1.0).with_velocity(Vector3::new(30.0, 40.0, 0.0));
        body.clamp_speed(10.0);
        assert!(approx_eq(body.speed(), 10.0));
        assert!(approx_vec_eq(&body.velocity, &Vector3::new(6.0, 8.0, 0.0)));
    }

    #[test]
    fn test_kinetic_energy() {
        let body = RigidBody::new(2.0).with_velocity(Vector3::new(3.0, 0.0, 0.0));
        assert!(approx_eq(body.kinetic_energy(), 9.0));
    }
}
