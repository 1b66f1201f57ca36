//! Fixed-timestep orchestration and entity lifecycle.

use log::{debug, trace, warn};

use crate::config::SimConfig;
use crate::contact::{self, ContactMap};
use crate::entity::{Entity, Registry};
use crate::error::SimError;
use crate::rigidbody::RigidBody;
use crate::solver;

/// Scene-specific setup and per-frame logic driven by [`PhysicsSim::frame`].
pub trait Scene {
    /// Called once, before the first frame. Typically queues the scene's
    /// entities.
    fn initialize(&mut self, sim: &mut PhysicsSim);

    /// Called every frame before the fixed update runs.
    fn update(&mut self, sim: &mut PhysicsSim, frame_time: f32) {
        let _ = (sim, frame_time);
    }
}

/// A registry change waiting for the start of the next tick.
#[derive(Debug)]
enum PendingOp {
    AddRigidBody(Entity),
    AddCollider(Entity),
    RemoveRigidBody(String),
    RemoveCollider(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityKind {
    Rigid,
    ColliderOnly,
}

impl EntityKind {
    fn of(entity: &Entity) -> Self {
        if entity.rigidbody().is_some() {
            EntityKind::Rigid
        } else {
            EntityKind::ColliderOnly
        }
    }
}

fn reject(operation: &str, err: SimError) -> Result<(), SimError> {
    warn!("{}: {}", operation, err);
    Err(err)
}

/// Steps a set of entities forward on a fixed timestep.
///
/// Frame times are accumulated and consumed in `dt`-sized ticks. Each tick
/// applies queued adds and removals, integrates forces, builds contacts,
/// solves velocities, clamps speeds, integrates positions, corrects
/// penetration and finally clears the contacts.
///
/// # Example
/// ```
/// use rigidsim::{Collider, Entity, Force, PhysicsSim, RigidBody};
/// use nalgebra::Vector3;
///
/// let mut sim = PhysicsSim::default();
/// let ball = Entity::new("ball")
///     .with_position(Vector3::new(0.0, 5.0, 0.0))
///     .with_collider(Collider::sphere(1.0))
///     .with_rigidbody(RigidBody::new(1.0).with_force(Force::constant("gravity", Vector3::new(0.0, -9.8, 0.0))));
/// sim.add_rigidbody(ball).unwrap();
///
/// sim.fixed_update(0.1);
/// assert_eq!(sim.steps_taken(), 2);
/// assert!(sim.entity("ball").unwrap().position().y < 5.0);
/// ```
#[derive(Debug, Default)]
pub struct PhysicsSim {
    config: SimConfig,
    entities: Registry,
    pending: Vec<PendingOp>,
    contacts: ContactMap,
    time_accumulator: f32,
    t: f32,
    steps_taken: u64,
    stop_requested: bool,
    initialized: bool,
}

impl PhysicsSim {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SimConfig {
        &mut self.config
    }

    // -- Lifecycle --

    /// What `name` will be once the queue is applied, if it exists at all.
    fn queued_kind(&self, name: &str) -> Option<EntityKind> {
        let mut kind = self.entities.get(name).map(EntityKind::of);
        for op in &self.pending {
            match op {
                PendingOp::AddRigidBody(e) | PendingOp::AddCollider(e) if e.name() == name => {
                    kind = Some(EntityKind::of(e));
                }
                PendingOp::RemoveRigidBody(n) | PendingOp::RemoveCollider(n) if n == name => {
                    kind = None;
                }
                _ => {}
            }
        }
        kind
    }

    /// Queue a dynamic or kinematic entity for insertion at the next tick.
    ///
    /// The entity must carry both a rigid body and a collider, and its name
    /// must not already be registered or queued.
    pub fn add_rigidbody(&mut self, entity: Entity) -> Result<(), SimError> {
        let name = entity.name().to_owned();
        if entity.rigidbody().is_none() {
            return reject("add_rigidbody", SimError::MissingRigidBody(name));
        }
        if entity.collider().is_none() {
            return reject("add_rigidbody", SimError::MissingCollider(name));
        }
        if self.queued_kind(&name).is_some() {
            return reject("add_rigidbody", SimError::DuplicateEntity(name));
        }
        debug!("queued rigid body \"{}\"", name);
        self.pending.push(PendingOp::AddRigidBody(entity));
        Ok(())
    }

    /// Queue a collider-only entity for insertion at the next tick.
    pub fn add_collider(&mut self, entity: Entity) -> Result<(), SimError> {
        let name = entity.name().to_owned();
        if entity.rigidbody().is_some() {
            return reject("add_collider", SimError::UnexpectedRigidBody(name));
        }
        if entity.collider().is_none() {
            return reject("add_collider", SimError::MissingCollider(name));
        }
        if self.queued_kind(&name).is_some() {
            return reject("add_collider", SimError::DuplicateEntity(name));
        }
        debug!("queued collider \"{}\"", name);
        self.pending.push(PendingOp::AddCollider(entity));
        Ok(())
    }

    /// Queue removal of an entity that owns a rigid body.
    pub fn remove_rigidbody(&mut self, name: &str) -> Result<(), SimError> {
        match self.queued_kind(name) {
            None => reject("remove_rigidbody", SimError::EntityNotFound(name.to_owned())),
            Some(EntityKind::ColliderOnly) => reject("remove_rigidbody", SimError::MissingRigidBody(name.to_owned())),
            Some(EntityKind::Rigid) => {
                debug!("queued removal of rigid body \"{}\"", name);
                self.pending.push(PendingOp::RemoveRigidBody(name.to_owned()));
                Ok(())
            }
        }
    }

    /// Queue removal of a collider-only entity.
    pub fn remove_collider(&mut self, name: &str) -> Result<(), SimError> {
        match self.queued_kind(name) {
            None => reject("remove_collider", SimError::EntityNotFound(name.to_owned())),
            Some(EntityKind::Rigid) => reject("remove_collider", SimError::UnexpectedRigidBody(name.to_owned())),
            Some(EntityKind::ColliderOnly) => {
                debug!("queued removal of collider \"{}\"", name);
                self.pending.push(PendingOp::RemoveCollider(name.to_owned()));
                Ok(())
            }
        }
    }

    /// Drop every queued change and queue removal of every registered entity.
    pub fn remove_all(&mut self) {
        self.pending.clear();
        for entity in self.entities.values() {
            let name = entity.name().to_owned();
            self.pending.push(match EntityKind::of(entity) {
                EntityKind::Rigid => PendingOp::RemoveRigidBody(name),
                EntityKind::ColliderOnly => PendingOp::RemoveCollider(name),
            });
        }
        debug!("queued removal of all {} entities", self.entities.len());
    }

    /// Number of queued registry changes.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn apply_pending(&mut self) {
        for op in std::mem::take(&mut self.pending) {
            match op {
                PendingOp::AddRigidBody(entity) | PendingOp::AddCollider(entity) => {
                    if self.entities.contains_key(entity.name()) {
                        warn!("{}", SimError::DuplicateEntity(entity.name().to_owned()));
                        continue;
                    }
                    debug!("added \"{}\"", entity.name());
                    self.entities.insert(entity.name().to_owned(), entity);
                }
                PendingOp::RemoveRigidBody(name) => match self.entities.get(&name).map(EntityKind::of) {
                    Some(EntityKind::Rigid) => {
                        self.entities.shift_remove(&name);
                        debug!("removed rigid body \"{}\"", name);
                    }
                    Some(EntityKind::ColliderOnly) => warn!("{}", SimError::MissingRigidBody(name)),
                    None => warn!("{}", SimError::EntityNotFound(name)),
                },
                PendingOp::RemoveCollider(name) => match self.entities.get(&name).map(EntityKind::of) {
                    Some(EntityKind::ColliderOnly) => {
                        self.entities.shift_remove(&name);
                        debug!("removed collider \"{}\"", name);
                    }
                    Some(EntityKind::Rigid) => warn!("{}", SimError::UnexpectedRigidBody(name)),
                    None => warn!("{}", SimError::EntityNotFound(name)),
                },
            }
        }
    }

    // -- Queries --

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.get_mut(name)
    }

    pub fn rigidbody(&self, name: &str) -> Option<&RigidBody> {
        self.entities.get(name)?.rigidbody()
    }

    pub fn rigidbody_mut(&mut self, name: &str) -> Option<&mut RigidBody> {
        self.entities.get_mut(name)?.rigidbody_mut()
    }

    /// Registered entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Whether `name` is registered. Queued additions do not count.
    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Simulation time in seconds.
    pub fn time(&self) -> f32 {
        self.t
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Fraction of a tick left in the accumulator, for blending rendered
    /// state between the last two ticks.
    pub fn interpolation_alpha(&self) -> f32 {
        match self.tick_length() {
            Some(dt) => self.time_accumulator / dt,
            None => 0.0,
        }
    }

    pub fn time_scale(&self) -> f32 {
        self.config.time_scale
    }

    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.config.time_scale = time_scale.max(0.0);
    }

    // -- Stepping --

    /// `dt`, if it is usable as a tick length.
    fn tick_length(&self) -> Option<f32> {
        let dt = self.config.dt;
        (dt.is_finite() && dt > 0.0).then_some(dt)
    }

    /// Stop consuming accumulated time after the current tick.
    pub fn request_stop(&mut self) {
        debug!("stop requested at t = {}", self.t);
        self.stop_requested = true;
    }

    pub fn resume(&mut self) {
        self.stop_requested = false;
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_requested
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run one frame of `scene`: initialise it on first use, let it update,
    /// then advance the simulation. Returns the number of ticks taken.
    pub fn frame<S: Scene + ?Sized>(&mut self, scene: &mut S, frame_time: f32) -> u32 {
        if !self.initialized {
            debug!("initializing scene");
            scene.initialize(self);
            self.initialized = true;
        }
        scene.update(self, frame_time);
        self.fixed_update(frame_time)
    }

    /// Advance by as many whole ticks as the accumulated frame time covers.
    ///
    /// `frame_time` is scaled by the time scale and clamped to
    /// `max_frame_time` before it is accumulated. Negative or non-finite
    /// frame times are ignored, and nothing runs while `dt` is not a
    /// positive finite number. Returns the number of ticks taken.
    pub fn fixed_update(&mut self, frame_time: f32) -> u32 {
        if self.stop_requested {
            return 0;
        }
        let Some(dt) = self.tick_length() else {
            warn!("fixed_update: ignoring frame, tick length {} is unusable", self.config.dt);
            return 0;
        };

        let mut scaled = frame_time * self.config.time_scale;
        if !scaled.is_finite() || scaled < 0.0 {
            warn!("ignoring frame time {}", frame_time);
            scaled = 0.0;
        }
        self.time_accumulator += scaled.min(self.config.max_frame_time);

        let mut ticks = 0;
        while self.time_accumulator >= dt && !self.stop_requested {
            self.step();
            self.time_accumulator -= dt;
            ticks += 1;
        }
        ticks
    }

    /// Run exactly one tick, independent of the accumulator.
    ///
    /// Does nothing while `dt` is not a positive finite number.
    pub fn step(&mut self) {
        let Some(dt) = self.tick_length() else {
            warn!("step: tick length {} is unusable", self.config.dt);
            return;
        };
        self.apply_pending();

        for entity in self.entities.values_mut() {
            if let Some(body) = entity.rigidbody_mut() {
                body.integrate_forces(dt, self.t);
            }
        }

        contact::build_contacts(&self.entities, &self.config, &mut self.contacts);
        solver::solve_velocities(&mut self.entities, &mut self.contacts, &self.config);
        solver::clamp_speeds(&mut self.entities, self.config.max_speed);
        solver::integrate_positions(&mut self.entities, dt);
        solver::correct_positions(&mut self.entities, &self.contacts, &self.config);

        trace!("tick {}: {} contacts", self.steps_taken, self.contacts.len());
        self.contacts.clear();

        self.t += dt;
        self.steps_taken += 1;
    }
}
