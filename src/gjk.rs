//! Gilbert–Johnson–Keerthi overlap test between two entities' colliders.

use log::trace;
use nalgebra::{Vector3, Vector4};

use crate::collider::support;
use crate::entity::Entity;
use crate::simplex::Simplex;

/// Outcome of [`is_colliding`].
///
/// The simplex is only meaningful when `colliding` is true, and even then
/// may hold fewer than four points; call
/// [`Simplex::transform_into_3_simplex`] before handing it to EPA.
#[derive(Debug, Clone)]
pub struct GjkResult {
    pub colliding: bool,
    pub simplex: Simplex,
}

/// Support point of the Minkowski difference `i − j` along `direction`
/// (w = 1). `None` if either entity lacks a collider.
pub fn minkowski_support(i: &Entity, j: &Entity, direction: &Vector3<f32>) -> Option<Vector4<f32>> {
    let a = support(i, direction)?;
    let b = support(j, &-direction)?;
    Some((a - b).xyz().push(1.0))
}

/// Test whether the colliders of `i` and `j` overlap.
///
/// Gives up after `max_iterations` support queries and reports no
/// collision; entities without a collider never collide.
pub fn is_colliding(i: &Entity, j: &Entity, max_iterations: u32) -> GjkResult {
    let mut simplex = Simplex::new();
    let mut direction = Vector3::x();

    for _ in 0..max_iterations {
        let Some(point) = minkowski_support(i, j, &direction) else {
            return GjkResult { colliding: false, simplex };
        };
        simplex.add(point);

        // The new point did not pass the origin: the origin is outside.
        if simplex.len() > 1 && point.xyz().dot(&direction) < 0.0 {
            return GjkResult { colliding: false, simplex };
        }

        simplex.process();
        if simplex.contains_origin() {
            return GjkResult { colliding: true, simplex };
        }
        direction = simplex.next_direction().xyz();
    }

    trace!(
        "gjk: no verdict for \"{}\" vs \"{}\" after {} iterations",
        i.name(),
        j.name(),
        max_iterations
    );
    GjkResult { colliding: false, simplex }
}
