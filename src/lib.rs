//! Point-mass rigid body simulation on a fixed timestep.
//!
//! Entities carry an optional [`RigidBody`] and [`Collider`]. Each tick the
//! [`PhysicsSim`] integrates forces, finds overlapping pairs with GJK and
//! EPA (or a direct box-box test), resolves them with a sequential impulse
//! solver and nudges remaining penetration apart in position space.
//!
//! The crate depends on `std` and no longer targets embedded `no_std`
//! builds: the registry, force sets and EPA polytope grow on the heap and
//! forces may carry boxed closures.
//!
//! ```
//! use nalgebra::Vector3;
//! use rigidsim::{Collider, Entity, Force, PhysicsSim, RigidBody};
//!
//! let mut sim = PhysicsSim::default();
//! sim.add_collider(
//!     Entity::new("ground")
//!         .with_position(Vector3::new(0.0, -1.0, 0.0))
//!         .with_collider(Collider::aabb(50.0, 1.0, 50.0)),
//! )
//! .unwrap();
//! sim.add_rigidbody(
//!     Entity::new("ball")
//!         .with_position(Vector3::new(0.0, 3.0, 0.0))
//!         .with_collider(Collider::sphere(1.0))
//!         .with_rigidbody(
//!             RigidBody::new(1.0)
//!                 .with_restitution(0.0)
//!                 .with_force(Force::constant("gravity", Vector3::new(0.0, -9.8, 0.0))),
//!         ),
//! )
//! .unwrap();
//!
//! for _ in 0..100 {
//!     sim.fixed_update(1.0 / 20.0);
//! }
//! assert!(sim.entity("ball").unwrap().position().y > 0.9);
//! ```

pub mod collider;
pub mod config;
pub mod contact;
pub mod entity;
pub mod epa;
pub mod error;
pub mod force;
pub mod gjk;
pub mod rigidbody;
pub mod sim;
pub mod simplex;
pub mod solver;

pub use collider::Collider;
pub use config::{CombineRule, SimConfig};
pub use contact::{Contact, ContactKey, ContactMap};
pub use entity::{Entity, Registry, Transform, VisualHandle};
pub use epa::Penetration;
pub use error::SimError;
pub use force::Force;
pub use gjk::GjkResult;
pub use rigidbody::RigidBody;
pub use sim::{PhysicsSim, Scene};
pub use simplex::Simplex;
