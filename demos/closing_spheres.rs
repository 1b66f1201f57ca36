//! Closing Spheres Demo
//!
//! Two spheres of radius 2 start twenty units apart and are pulled toward
//! each other by small opposing forces. Each tick the demo asks GJK
//! whether they overlap and reports the distance at which contact first
//! shows up, then lets the solver bounce them apart.

use nalgebra::Vector3;
use rigidsim::gjk::is_colliding;
use rigidsim::{Collider, Entity, Force, PhysicsSim, RigidBody, SimConfig};

fn sphere(name: &str, x: f32, pull: f32) -> Entity {
    Entity::new(name)
        .with_position(Vector3::new(x, 0.0, 0.0))
        .with_collider(Collider::sphere(2.0))
        .with_rigidbody(RigidBody::new(1.0).with_force(Force::constant("pull", Vector3::new(pull, 0.0, 0.0))))
}

fn main() {
    let config = SimConfig::default();
    let gjk_iterations = config.gjk_max_iterations;
    let mut sim = PhysicsSim::new(config);

    for entity in [sphere("left", -10.0, 0.2), sphere("right", 10.0, -0.2)] {
        if let Err(err) = sim.add_rigidbody(entity) {
            eprintln!("{}", err);
            return;
        }
    }

    let mut touching = false;
    for _ in 0..600 {
        sim.step();
        let (Some(left), Some(right)) = (sim.entity("left"), sim.entity("right")) else {
            break;
        };

        let distance = (right.position() - left.position()).norm();
        let colliding = is_colliding(left, right, gjk_iterations).colliding;
        if colliding != touching {
            touching = colliding;
            println!(
                "t = {:6.2}s  distance {:7.4}  {}",
                sim.time(),
                distance,
                if colliding { "contact" } else { "separated" }
            );
        }
    }

    for entity in sim.entities() {
        println!("{:>6}: x = {:8.3}  vx = {:7.3}", entity.name(), entity.position().x, entity.velocity().x);
    }
}
