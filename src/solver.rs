//! Sequential-impulse velocity solver, motion integration and positional
//! correction.
//!
//! Every function here walks contacts in insertion order and touches bodies
//! through the registry by index, one entity at a time.

use nalgebra::Vector3;

use crate::config::SimConfig;
use crate::contact::{ContactKey, ContactMap};
use crate::entity::{Entity, Registry};

/// Tangential speeds below this are treated as no sliding.
const SLIDING_EPSILON: f32 = 1e-6;

/// Per-contact material terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairMaterial {
    /// `1/m_i + 1/m_j`, or `1/m + 1` against a collider-only entity.
    pub effective_mass: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl PairMaterial {
    pub fn new(i: &Entity, j: &Entity, config: &SimConfig) -> Self {
        match (i.rigidbody(), j.rigidbody()) {
            (Some(a), Some(b)) => Self {
                effective_mass: a.inv_mass() + b.inv_mass(),
                friction: config.friction_rule.combine(a.friction, b.friction),
                restitution: config.restitution_rule.combine(a.restitution, b.restitution),
            },
            (Some(body), None) | (None, Some(body)) => Self {
                effective_mass: body.inv_mass() + 1.0,
                friction: body.friction * body.friction,
                restitution: config.restitution_rule.combine(body.restitution, body.restitution),
            },
            (None, None) => Self {
                effective_mass: 1.0,
                friction: 0.0,
                restitution: 0.0,
            },
        }
    }
}

/// `impulse` pushes `j` along it and `i` against it. Kinematic and
/// collider-only entities are unaffected.
fn apply_impulse_pair(entities: &mut Registry, key: &ContactKey, impulse: Vector3<f32>) {
    if let Some(body) = entities[key.i].rigidbody_mut() {
        body.apply_impulse(-impulse);
    }
    if let Some(body) = entities[key.j].rigidbody_mut() {
        body.apply_impulse(impulse);
    }
}

#[inline]
fn relative_velocity(entities: &Registry, key: &ContactKey) -> Vector3<f32> {
    entities[key.j].velocity() - entities[key.i].velocity()
}

/// Run `config.velocity_iterations` passes of friction then normal impulses
/// over every contact.
pub fn solve_velocities(entities: &mut Registry, contacts: &mut ContactMap, config: &SimConfig) {
    for _ in 0..config.velocity_iterations {
        for (key, contact) in contacts.iter_mut() {
            let material = PairMaterial::new(&entities[key.i], &entities[key.j], config);
            let normal = contact.normal;

            // Friction
            let v = relative_velocity(entities, key);
            let tangent = (v - normal * v.dot(&normal)).try_normalize(SLIDING_EPSILON);
            if let Some(t) = tangent {
                let lambda = -v.dot(&t) / material.effective_mass;
                let limit = material.friction * contact.normal_impulse_sum;
                let old = contact.tangent_impulse_sum;
                contact.tangent_impulse_sum = (old + lambda).clamp(-limit, limit);
                apply_impulse_pair(entities, key, t * (contact.tangent_impulse_sum - old));
            }

            // Normal
            let v = relative_velocity(entities, key);
            let lambda = -(1.0 + material.restitution) * v.dot(&normal) / material.effective_mass;
            let old = contact.normal_impulse_sum;
            contact.normal_impulse_sum = (old + lambda).max(0.0);
            apply_impulse_pair(entities, key, normal * (contact.normal_impulse_sum - old));

            // A smaller normal impulse shrinks the friction cone.
            if let Some(t) = tangent {
                let limit = material.friction * contact.normal_impulse_sum;
                let old = contact.tangent_impulse_sum;
                if old.abs() > limit {
                    contact.tangent_impulse_sum = old.clamp(-limit, limit);
                    apply_impulse_pair(entities, key, t * (contact.tangent_impulse_sum - old));
                }
            }
        }
    }
}

/// Cap the speed of every dynamic body.
pub fn clamp_speeds(entities: &mut Registry, max_speed: f32) {
    for entity in entities.values_mut() {
        if let Some(body) = entity.rigidbody_mut() {
            body.clamp_speed(max_speed);
        }
    }
}

/// `position += velocity * dt` for every rigid body, kinematic ones included.
pub fn integrate_positions(entities: &mut Registry, dt: f32) {
    for entity in entities.values_mut() {
        let velocity = match entity.rigidbody() {
            Some(body) => body.velocity,
            None => continue,
        };
        entity.transform.position += velocity * dt;
    }
}

/// Push overlapping dynamic bodies apart in position space.
///
/// Each pass removes `steering_constant` of the penetration beyond `slop`,
/// capped at `max_correction`, split between the two bodies by inverse mass.
pub fn correct_positions(entities: &mut Registry, contacts: &ContactMap, config: &SimConfig) {
    let cap = config.max_correction.min(0.0);
    for _ in 0..config.position_iterations {
        for (key, contact) in contacts.iter() {
            let material = PairMaterial::new(&entities[key.i], &entities[key.j], config);
            let depth = contact.current_depth(&entities[key.i].position(), &entities[key.j].position());

            let separation = -depth.max(0.0);
            let steering = (config.steering_constant * (separation + config.slop)).min(0.0).max(cap);
            let impulse = -steering / material.effective_mass;
            if impulse <= 0.0 {
                continue;
            }

            let shift = contact.normal * impulse;
            for (index, sign) in [(key.i, -1.0), (key.j, 1.0)] {
                let entity = &mut entities[index];
                if let Some(inv_mass) = entity.rigidbody().filter(|b| !b.is_kinematic).map(|b| b.inv_mass()) {
                    entity.transform.position += shift * (sign * inv_mass);
                }
            }
        }
    }
}
