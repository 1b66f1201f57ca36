//! Collision shapes and the support mapping GJK/EPA are built on.

use nalgebra::{Vector3, Vector4};

use crate::entity::Entity;

/// A convex collision shape attached to an [`Entity`].
///
/// The shape is centred on the entity's position and never rotates. Its
/// size is independent of the entity's visual scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    /// An axis-aligned box defined by half-extents along each axis.
    Aabb { half_extents: Vector3<f32> },
    /// A sphere defined by its radius.
    Sphere { radius: f32 },
}

/// Unit cube corners, scaled by the half-extents during support queries.
/// Ties are resolved in favour of the first corner listed.
const BOX_CORNERS: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
];

impl Collider {
    /// Box collider from half-extents.
    ///
    /// # Panics
    /// Panics if any half-extent is not positive and finite.
    pub fn aabb(hx: f32, hy: f32, hz: f32) -> Self {
        let half_extents = Vector3::new(hx, hy, hz);
        assert!(
            half_extents.iter().all(|h| *h > 0.0 && h.is_finite()),
            "half-extents must be positive and finite"
        );
        Collider::Aabb { half_extents }
    }

    /// Sphere collider.
    ///
    /// # Panics
    /// Panics if `radius` is not positive and finite.
    pub fn sphere(radius: f32) -> Self {
        assert!(radius > 0.0 && radius.is_finite(), "radius must be positive and finite");
        Collider::Sphere { radius }
    }

    /// Farthest point of the shape along `direction`, relative to its centre.
    pub fn local_support(&self, direction: &Vector3<f32>) -> Vector3<f32> {
        match self {
            Collider::Aabb { half_extents } => {
                let mut highest = f32::NEG_INFINITY;
                let mut best = Vector3::zeros();
                for corner in BOX_CORNERS.iter() {
                    let v = Vector3::from(*corner).component_mul(half_extents);
                    let dot = v.dot(direction);
                    if dot > highest {
                        highest = dot;
                        best = v;
                    }
                }
                best
            }
            Collider::Sphere { radius } => {
                let len = direction.norm();
                if len > 0.0 {
                    direction * (*radius / len)
                } else {
                    Vector3::zeros()
                }
            }
        }
    }
}

/// World-space support point of `entity`'s collider along `direction`, as a
/// homogeneous point (w = 1).
///
/// Returns `None` when the entity carries no collider.
pub fn support(entity: &Entity, direction: &Vector3<f32>) -> Option<Vector4<f32>> {
    let collider = entity.collider()?;
    let point = entity.position() + collider.local_support(direction);
    Some(point.push(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    const EPSILON: f32 = 1e-5;

    fn approx_vec_eq(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
        (a - b).norm() < EPSILON
    }

    #[test]
    fn test_aabb_support_picks_corner() {
        let c = Collider::aabb(1.0, 2.0, 3.0);
        let p = c.local_support(&Vector3::new(1.0, 1.0, 1.0));
        assert!(approx_vec_eq(&p, &Vector3::new(1.0, 2.0, 3.0)));

        let p = c.local_support(&Vector3::new(-0.1, 5.0, -2.0));
        assert!(approx_vec_eq(&p, &Vector3::new(-1.0, 2.0, -3.0)));
    }

    #[test]
    fn test_aabb_support_on_axis_reaches_face() {
        let c = Collider::aabb(0.5, 0.5, 0.5);
        let p = c.local_support(&Vector3::new(0.0, -1.0, 0.0));
        assert!((p.y + 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_sphere_support_scales_direction() {
        let c = Collider::sphere(2.0);
        let p = c.local_support(&Vector3::new(0.0, 0.0, 10.0));
        assert!(approx_vec_eq(&p, &Vector3::new(0.0, 0.0, 2.0)));
    }

    #[test]
    fn test_sphere_support_zero_direction_is_centre() {
        let c = Collider::sphere(2.0);
        assert!(approx_vec_eq(&c.local_support(&Vector3::zeros()), &Vector3::zeros()));
    }

    #[test]
    fn test_world_support_is_translated_point() {
        let e = Entity::new("ball")
            .with_position(Vector3::new(3.0, 0.0, 0.0))
            .with_collider(Collider::sphere(1.0));
        let p = support(&e, &Vector3::new(-1.0, 0.0, 0.0)).unwrap();
        assert!(approx_vec_eq(&p.xyz(), &Vector3::new(2.0, 0.0, 0.0)));
        assert_eq!(p.w, 1.0);
    }

    #[test]
    fn test_support_without_collider_is_none() {
        let e = Entity::new("ghost");
        assert!(support(&e, &Vector3::x()).is_none());
    }

    #[test]
    #[should_panic]
    fn test_negative_radius_panics() {
        Collider::sphere(-1.0);
    }
}
