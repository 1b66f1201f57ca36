//! Narrow phase: one [`Contact`] per overlapping pair, rebuilt every tick.

use indexmap::IndexMap;
use log::trace;
use nalgebra::Vector3;

use crate::collider::{support, Collider};
use crate::config::SimConfig;
use crate::entity::{Entity, Registry};
use crate::epa;
use crate::gjk;

/// Registry indices of the two entities in a contact, `i < j`.
///
/// Indices are only stable within a tick; contacts never outlive one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactKey {
    pub i: usize,
    pub j: usize,
}

/// A resolved contact between entities `i` and `j`.
///
/// `normal` points from `i` toward `j`. `global_position_i` is the deepest
/// point of `j` inside `i` and `global_position_j` the deepest point of `i`
/// inside `j`, so `(global_position_j - global_position_i) · normal` is the
/// penetration depth and never negative. Local positions are the same
/// points relative to each entity's position when the contact was built.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub global_position_i: Vector3<f32>,
    pub global_position_j: Vector3<f32>,
    pub local_position_i: Vector3<f32>,
    pub local_position_j: Vector3<f32>,
    pub normal: Vector3<f32>,
    /// Penetration along `normal` when the contact was built.
    ///
    /// Box-box depth is measured between each centre clamped into the other
    /// box, so it underestimates once a centre lies inside the other box:
    /// unit cubes half a unit apart overlap by 1.5 but report 0.5.
    pub depth: f32,
    /// Accumulated normal impulse. Never negative.
    pub normal_impulse_sum: f32,
    /// Accumulated friction impulse, bounded by `μ · normal_impulse_sum`.
    pub tangent_impulse_sum: f32,
}

pub type ContactMap = IndexMap<ContactKey, Contact>;

impl Contact {
    fn new(
        i: &Entity,
        j: &Entity,
        global_i: Vector3<f32>,
        global_j: Vector3<f32>,
        normal: Vector3<f32>,
        depth: f32,
    ) -> Self {
        Self {
            global_position_i: global_i,
            global_position_j: global_j,
            local_position_i: global_i - i.position(),
            local_position_j: global_j - j.position(),
            normal,
            depth,
            normal_impulse_sum: 0.0,
            tangent_impulse_sum: 0.0,
        }
    }

    /// Penetration depth after the entities have moved away from where they
    /// were when the contact was built.
    pub fn current_depth(&self, position_i: &Vector3<f32>, position_j: &Vector3<f32>) -> f32 {
        let moved_i = position_i - (self.global_position_i - self.local_position_i);
        let moved_j = position_j - (self.global_position_j - self.local_position_j);
        self.depth - (moved_j - moved_i).dot(&self.normal)
    }
}

/// Rebuild `contacts` from every pair of collider-carrying entities, in
/// registry order.
///
/// Pairs where neither side is dynamic are skipped, kinematic-vs-static
/// and kinematic-vs-kinematic included. Such pairs generate no contact even
/// though a kinematic body otherwise takes part in detection; no impulse or
/// correction could move either side, and contacts never outlive the tick.
pub fn build_contacts(entities: &Registry, config: &SimConfig, contacts: &mut ContactMap) {
    contacts.clear();
    let n = entities.len();
    for a in 0..n {
        let ei = &entities[a];
        if ei.collider().is_none() {
            continue;
        }
        for b in (a + 1)..n {
            let ej = &entities[b];
            if !ei.is_dynamic() && !ej.is_dynamic() {
                continue;
            }
            if let Some(contact) = collide(ei, ej, config) {
                contacts.insert(ContactKey { i: a, j: b }, contact);
            }
        }
    }
    trace!("narrow phase: {} contacts among {} entities", contacts.len(), n);
}

/// Contact between two entities, or `None` if they do not overlap or no
/// usable penetration could be extracted.
pub fn collide(i: &Entity, j: &Entity, config: &SimConfig) -> Option<Contact> {
    match (i.collider()?, j.collider()?) {
        (Collider::Aabb { half_extents: hi }, Collider::Aabb { half_extents: hj }) => collide_boxes(i, hi, j, hj),
        _ => collide_convex(i, j, config),
    }
}

fn collide_boxes(i: &Entity, hi: &Vector3<f32>, j: &Entity, hj: &Vector3<f32>) -> Option<Contact> {
    let ci = i.position();
    let cj = j.position();
    let delta = cj - ci;
    let overlap = hi + hj - delta.abs();
    if overlap.iter().any(|o| *o < 0.0) {
        return None;
    }

    // Each centre clamped into the other box.
    let global_i = clamp_point(&ci, &(cj - hj), &(cj + hj));
    let global_j = clamp_point(&cj, &(ci - hi), &(ci + hi));

    // Slab test against the larger box: an axis counts when the separation
    // stays inside that box's extent on the other two axes.
    let larger = if hj.product() > hi.product() { hj } else { hi };
    let mut normal = Vector3::zeros();
    for axis in 0..3 {
        let u = (axis + 1) % 3;
        let v = (axis + 2) % 3;
        if delta[u].abs() <= larger[u] && delta[v].abs() <= larger[v] {
            normal[axis] += sign(delta[axis]);
        }
    }
    let normal = normal
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(|| least_overlap_axis(&overlap, &delta));

    let depth = (global_j - global_i).dot(&normal);
    Some(Contact::new(i, j, global_i, global_j, normal, depth))
}

fn collide_convex(i: &Entity, j: &Entity, config: &SimConfig) -> Option<Contact> {
    let mut result = gjk::is_colliding(i, j, config.gjk_max_iterations);
    if !result.colliding {
        return None;
    }

    let (shape_i, shape_j) = (i.collider()?, j.collider()?);
    let (pi, pj) = (i.position(), j.position());
    result.simplex.transform_into_3_simplex(|d| {
        (pi + shape_i.local_support(d) - pj - shape_j.local_support(&-d)).push(1.0)
    });

    let Some(penetration) = epa::solve(i, j, &result.simplex, config.epa_max_iterations, config.epa_tolerance) else {
        trace!("narrow phase: no usable penetration for \"{}\" vs \"{}\"", i.name(), j.name());
        return None;
    };

    let normal = penetration.axis;
    let global_j = support(i, &normal)?.xyz();
    let global_i = support(j, &-normal)?.xyz();
    Some(Contact::new(i, j, global_i, global_j, normal, penetration.dist.max(0.0)))
}

fn clamp_point(p: &Vector3<f32>, min: &Vector3<f32>, max: &Vector3<f32>) -> Vector3<f32> {
    Vector3::new(
        p.x.clamp(min.x, max.x),
        p.y.clamp(min.y, max.y),
        p.z.clamp(min.z, max.z),
    )
}

#[inline]
fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Axis with the smallest overlap, signed by the centre separation along it
/// (positive when the centres coincide).
fn least_overlap_axis(overlap: &Vector3<f32>, delta: &Vector3<f32>) -> Vector3<f32> {
    let mut axis = 0;
    for k in 1..3 {
        if overlap[k] < overlap[axis] {
            axis = k;
        }
    }
    let mut normal = Vector3::zeros();
    normal[axis] = if delta[axis] < 0.0 { -1.0 } else { 1.0 };
    normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rigidbody::RigidBody;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn approx_vec_eq(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
        (a - b).norm() < EPSILON
    }

    fn dynamic_box(name: &str, position: Vector3<f32>, h: Vector3<f32>) -> Entity {
        Entity::new(name)
            .with_position(position)
            .with_collider(Collider::aabb(h.x, h.y, h.z))
            .with_rigidbody(RigidBody::new(1.0))
    }

    fn ground() -> Entity {
        Entity::new("ground")
            .with_position(Vector3::new(0.0, -1.0, 0.0))
            .with_collider(Collider::aabb(50.0, 1.0, 50.0))
    }

    #[test]
    fn test_box_on_ground_normal_points_up() {
        let g = ground();
        let b = dynamic_box("box", Vector3::new(3.0, 0.4, 2.0), Vector3::new(0.5, 0.5, 0.5));
        let c = collide(&g, &b, &SimConfig::default()).unwrap();
        assert!(approx_vec_eq(&c.normal, &Vector3::y()));
        assert!(approx_eq(c.depth, 0.1));
        assert!(approx_vec_eq(&c.global_position_j, &Vector3::new(3.0, 0.0, 2.0)));
        assert!(approx_vec_eq(&c.local_position_j, &Vector3::new(0.0, -0.4, 0.0)));
    }

    #[test]
    fn test_box_pair_normal_from_i_to_j() {
        let a = dynamic_box("a", Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0));
        let b = dynamic_box("b", Vector3::new(-1.9, 0.5, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let c = collide(&a, &b, &SimConfig::default()).unwrap();
        assert!(approx_vec_eq(&c.normal, &-Vector3::x()));
        assert!(approx_eq(c.depth, 0.1));
        assert!((c.global_position_j - c.global_position_i).dot(&c.normal) >= 0.0);
    }

    #[test]
    fn test_separated_boxes_have_no_contact() {
        let a = dynamic_box("a", Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0));
        let b = dynamic_box("b", Vector3::new(0.0, 0.0, 2.5), Vector3::new(1.0, 1.0, 1.0));
        assert!(collide(&a, &b, &SimConfig::default()).is_none());
    }

    #[test]
    fn test_coincident_boxes_fall_back_to_least_overlap() {
        let a = dynamic_box("a", Vector3::zeros(), Vector3::new(2.0, 1.0, 3.0));
        let b = dynamic_box("b", Vector3::zeros(), Vector3::new(2.0, 0.5, 3.0));
        let c = collide(&a, &b, &SimConfig::default()).unwrap();
        assert!(approx_vec_eq(&c.normal, &Vector3::y()));
    }

    #[test]
    fn test_diagonal_corner_falls_back_when_no_slab_matches() {
        let a = dynamic_box("a", Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0));
        let b = dynamic_box("b", Vector3::new(1.8, 1.9, 1.7), Vector3::new(1.0, 1.0, 1.0));
        let c = collide(&a, &b, &SimConfig::default()).unwrap();
        // Least overlap is along y (0.1).
        assert!(approx_vec_eq(&c.normal, &Vector3::y()));
        assert!(approx_eq(c.depth, 0.1));
    }

    #[test]
    fn test_sphere_on_ground_uses_general_path() {
        let g = ground();
        let s = Entity::new("ball")
            .with_position(Vector3::new(0.0, 0.8, 0.0))
            .with_collider(Collider::sphere(1.0))
            .with_rigidbody(RigidBody::new(1.0));
        let c = collide(&g, &s, &SimConfig::default()).unwrap();
        assert!(c.normal.y > 0.99);
        assert!((c.depth - 0.2).abs() < 0.01);
        assert!((c.global_position_j - c.global_position_i).dot(&c.normal) >= -EPSILON);
    }

    #[test]
    fn test_build_contacts_skips_static_pairs() {
        let mut entities = Registry::new();
        let wall = Entity::new("wall").with_collider(Collider::aabb(1.0, 1.0, 1.0));
        let other = Entity::new("other").with_collider(Collider::aabb(1.0, 1.0, 1.0));
        entities.insert("wall".into(), wall);
        entities.insert("other".into(), other);
        let mut contacts = ContactMap::new();
        build_contacts(&entities, &SimConfig::default(), &mut contacts);
        assert!(contacts.is_empty());

        entities.insert(
            "box".into(),
            dynamic_box("box", Vector3::new(0.0, 1.5, 0.0), Vector3::new(1.0, 1.0, 1.0)),
        );
        build_contacts(&entities, &SimConfig::default(), &mut contacts);
        assert_eq!(contacts.len(), 2);
        assert!(contacts.contains_key(&ContactKey { i: 0, j: 2 }));
        assert!(contacts.contains_key(&ContactKey { i: 1, j: 2 }));
    }

    #[test]
    fn test_current_depth_tracks_motion() {
        let g = ground();
        let mut b = dynamic_box("box", Vector3::new(0.0, 0.3, 0.0), Vector3::new(0.5, 0.5, 0.5));
        let c = collide(&g, &b, &SimConfig::default()).unwrap();
        assert!(approx_eq(c.depth, 0.2));
        b.set_position(Vector3::new(0.0, 0.45, 0.0));
        assert!(approx_eq(c.current_depth(&g.position(), &b.position()), 0.05));
    }
}
