//! Entities: a named transform owning an optional rigid body and collider.

use indexmap::IndexMap;
use log::warn;
use nalgebra::{UnitQuaternion, Vector3, Vector4};

use crate::collider::Collider;
use crate::rigidbody::RigidBody;

/// Live entities keyed by name, iterated in insertion order.
pub type Registry = IndexMap<String, Entity>;

/// Position, orientation and scale of an entity.
///
/// Physics only reads and writes `position`. Orientation and scale are
/// carried for the render layer; colliders never rotate or scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/// Opaque handle to whatever the render layer draws for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle(pub u64);

/// A named participant in the simulation.
///
/// An entity with a rigid body must also carry a collider before the
/// simulation accepts it; collider-only entities act as immovable anchors.
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    pub transform: Transform,
    pub visual: Option<VisualHandle>,
    rigidbody: Option<RigidBody>,
    collider: Option<Collider>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            visual: None,
            rigidbody: None,
            collider: None,
        }
    }

    /// Builder: set world position.
    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.transform.position = position;
        self
    }

    /// Builder: set orientation.
    pub fn with_orientation(mut self, orientation: UnitQuaternion<f32>) -> Self {
        self.transform.orientation = orientation;
        self
    }

    /// Builder: set visual scale.
    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.transform.scale = scale;
        self
    }

    /// Builder: attach a visual handle.
    pub fn with_visual(mut self, visual: VisualHandle) -> Self {
        self.visual = Some(visual);
        self
    }

    /// Builder: attach a rigid body.
    pub fn with_rigidbody(mut self, rigidbody: RigidBody) -> Self {
        self.add_rigidbody(rigidbody);
        self
    }

    /// Builder: attach a collider.
    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.add_collider(collider);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn position(&self) -> Vector3<f32> {
        self.transform.position
    }

    /// Position as a homogeneous point.
    #[inline]
    pub fn position_h(&self) -> Vector4<f32> {
        self.transform.position.push(1.0)
    }

    #[inline]
    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.transform.position = position;
    }

    /// Attach a rigid body, replacing any existing one.
    pub fn add_rigidbody(&mut self, rigidbody: RigidBody) {
        if self.rigidbody.is_some() {
            warn!("entity \"{}\" already has a rigid body; replacing it", self.name);
        }
        self.rigidbody = Some(rigidbody);
    }

    /// Attach a collider, replacing any existing one.
    pub fn add_collider(&mut self, collider: Collider) {
        if self.collider.is_some() {
            warn!("entity \"{}\" already has a collider; replacing it", self.name);
        }
        self.collider = Some(collider);
    }

    pub fn remove_rigidbody(&mut self) -> Option<RigidBody> {
        self.rigidbody.take()
    }

    pub fn remove_collider(&mut self) -> Option<Collider> {
        self.collider.take()
    }

    #[inline]
    pub fn rigidbody(&self) -> Option<&RigidBody> {
        self.rigidbody.as_ref()
    }

    #[inline]
    pub fn rigidbody_mut(&mut self) -> Option<&mut RigidBody> {
        self.rigidbody.as_mut()
    }

    #[inline]
    pub fn collider(&self) -> Option<&Collider> {
        self.collider.as_ref()
    }

    /// Carries a non-kinematic rigid body, so contacts may move it.
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.rigidbody.as_ref().is_some_and(|rb| !rb.is_kinematic)
    }

    /// Velocity of the rigid body, or zero for collider-only entities.
    #[inline]
    pub fn velocity(&self) -> Vector3<f32> {
        self.rigidbody.as_ref().map_or_else(Vector3::zeros, |rb| rb.velocity)
    }
}
