//! Drop Sphere Demo
//!
//! A unit sphere falls from ten units above a wide static slab and comes
//! to rest on it. Restitution is zero, so the first impact kills the
//! vertical velocity and positional correction settles the overlap.
//!
//! Prints the sphere's height and vertical speed every half second of
//! simulated time, driven by a fixed 60 Hz frame clock.

use nalgebra::Vector3;
use rigidsim::{Collider, Entity, Force, PhysicsSim, RigidBody, Scene, SimError};

const FRAME_TIME: f32 = 1.0 / 60.0;

struct DropScene;

impl DropScene {
    fn populate(sim: &mut PhysicsSim) -> Result<(), SimError> {
        sim.add_collider(
            Entity::new("ground")
                .with_position(Vector3::new(0.0, -1.0, 0.0))
                .with_collider(Collider::aabb(50.0, 1.0, 50.0)),
        )?;
        sim.add_rigidbody(
            Entity::new("ball")
                .with_position(Vector3::new(0.0, 11.0, 0.0))
                .with_collider(Collider::sphere(1.0))
                .with_rigidbody(
                    RigidBody::new(1.0)
                        .with_restitution(0.0)
                        .with_friction(0.3)
                        .with_force(Force::constant("gravity", Vector3::new(0.0, -9.8, 0.0))),
                ),
        )
    }
}

impl Scene for DropScene {
    fn initialize(&mut self, sim: &mut PhysicsSim) {
        if let Err(err) = Self::populate(sim) {
            eprintln!("scene setup failed: {}", err);
            sim.request_stop();
        }
    }
}

fn main() {
    let mut sim = PhysicsSim::default();
    let mut scene = DropScene;
    let mut last_report = 0;

    println!("{:>6}  {:>8}  {:>8}", "t", "y", "vy");
    for _ in 0..(4.0 / FRAME_TIME) as usize {
        sim.frame(&mut scene, FRAME_TIME);
        if sim.is_stopped() {
            break;
        }

        let report = (sim.time() / 0.5) as u32;
        if report != last_report {
            last_report = report;
            if let Some(ball) = sim.entity("ball") {
                println!("{:>6.2}  {:>8.4}  {:>8.4}", sim.time(), ball.position().y, ball.velocity().y);
            }
        }
    }

    if let Some(ball) = sim.entity("ball") {
        println!(
            "resting height {:.4} after {} ticks (surface at 1.0, slop {})",
            ball.position().y,
            sim.steps_taken(),
            sim.config().slop
        );
    }
}
