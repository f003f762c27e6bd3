//! The physics world: engine state plus the per-body gameplay side table.
//!
//! A [`World`] is an explicit context object; there is no process-wide
//! simulation state. It exclusively owns every body and shape created
//! through it. Each body has exactly one [`BodyContext`] in the side table,
//! inserted in [`World::create_body`] and removed in [`World::destroy_body`]
//! together with the engine body.

use std::num::NonZeroUsize;
use std::time::Duration;

use crossbeam_channel::Receiver;
use log::{debug, info};
use rapier2d::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::body::{BodyContext, BodyDef, BodyId, BodyKind, BodyRole, OwnerKey};
use super::clock::{MonotonicClock, StepClock};
use super::error::{PhysicsError, PhysicsResult};
use super::units::{PIXELS_PER_METER, Units, deg_to_rad};

/// Longest simulated time advanced by a single step, in seconds.
pub const MAX_STEP: f32 = 0.032;
/// Solver sub-steps per advance.
pub const SUBSTEPS: usize = 8;
/// Downward gravity in m/s².
pub const DEFAULT_GRAVITY: (f32, f32) = (0.0, -9.8);

const DYNAMIC_LINEAR_DAMPING: f32 = 0.2;
const DYNAMIC_ANGULAR_DAMPING: f32 = 0.6;

/// Construction-time settings of a [`World`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldConfig {
    /// Display pixels per simulation meter.
    pub pixels_per_meter: f32,
    /// Gravity in m/s², y up.
    pub gravity: (f32, f32),
    /// Upper clamp for the per-step delta, in seconds.
    pub max_step: f32,
    /// Solver sub-steps per advance.
    pub substeps: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            pixels_per_meter: PIXELS_PER_METER,
            gravity: DEFAULT_GRAVITY,
            max_step: MAX_STEP,
            substeps: SUBSTEPS,
        }
    }
}

impl WorldConfig {
    pub fn with_scale(mut self, pixels_per_meter: f32) -> Self {
        self.pixels_per_meter = pixels_per_meter;
        self
    }

    pub fn with_gravity(mut self, x: f32, y: f32) -> Self {
        self.gravity = (x, y);
        self
    }
}

pub struct World {
    pub(super) units: Units,
    pub(super) config: WorldConfig,
    pub(super) gravity: Vector<Real>,
    pub(super) integration_parameters: IntegrationParameters,
    pub(super) physics_pipeline: PhysicsPipeline,
    pub(super) islands: IslandManager,
    pub(super) broad_phase: DefaultBroadPhase,
    pub(super) narrow_phase: NarrowPhase,
    pub(super) bodies: RigidBodySet,
    pub(super) colliders: ColliderSet,
    pub(super) impulse_joints: ImpulseJointSet,
    pub(super) multibody_joints: MultibodyJointSet,
    pub(super) ccd_solver: CCDSolver,
    pub(super) query_pipeline: QueryPipeline,
    pub(super) event_collector: ChannelEventCollector,
    pub(super) collision_events: Receiver<CollisionEvent>,
    pub(super) contact_force_events: Receiver<ContactForceEvent>,
    pub(super) contexts: FxHashMap<BodyId, BodyContext>,
    /// Bodies with user forces that must be cleared after the next advance.
    pub(super) pending_forces: SmallVec<[BodyId; 8]>,
    pub(super) clock: Box<dyn StepClock>,
    pub(super) last_tick: Option<Duration>,
    pub(super) step_count: u64,
    destroyed: bool,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl World {
    /// Create a world that measures step deltas with wall-clock time.
    pub fn new(config: WorldConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }

    /// Create a world driven by the given tick source.
    pub fn with_clock(config: WorldConfig, clock: impl StepClock + 'static) -> Self {
        let (collision_send, collision_events) = crossbeam_channel::unbounded();
        let (force_send, contact_force_events) = crossbeam_channel::unbounded();

        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.max_step;
        if let Some(substeps) = NonZeroUsize::new(config.substeps) {
            integration_parameters.num_solver_iterations = substeps;
        }

        debug!(
            "Creating physics world: {} px/m, gravity ({}, {}), max step {}s, {} substeps",
            config.pixels_per_meter,
            config.gravity.0,
            config.gravity.1,
            config.max_step,
            config.substeps
        );

        Self {
            units: Units::new(config.pixels_per_meter),
            config,
            gravity: vector![config.gravity.0, config.gravity.1],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_collector: ChannelEventCollector::new(collision_send, force_send),
            collision_events,
            contact_force_events,
            contexts: FxHashMap::default(),
            pending_forces: SmallVec::new(),
            clock: Box::new(clock),
            last_tick: None,
            step_count: 0,
            destroyed: false,
        }
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Number of completed steps, including ones that did not advance.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Whether `id` still refers to a live body of this world.
    pub fn contains(&self, id: BodyId) -> bool {
        !self.destroyed && self.bodies.contains(id.handle())
    }

    /// Live body ids, in no particular order.
    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.iter().map(|(handle, _)| BodyId::from(handle))
    }

    /// Create a body and its gameplay context.
    pub fn create_body(&mut self, def: &BodyDef) -> PhysicsResult<BodyId> {
        self.ensure_alive()?;

        let mut builder = RigidBodyBuilder::new(def.kind.rigid_body_type())
            .translation(self.units.vec_to_sim(def.x, def.y))
            .rotation(deg_to_rad(def.angle))
            .linvel(self.units.vec_to_sim(def.vx, def.vy))
            .angvel(deg_to_rad(def.angular_velocity));
        if def.kind == BodyKind::Dynamic {
            builder = builder
                .linear_damping(DYNAMIC_LINEAR_DAMPING)
                .angular_damping(DYNAMIC_ANGULAR_DAMPING)
                .can_sleep(def.allow_sleep);
        }

        let id = BodyId::from(self.bodies.insert(builder.build()));
        self.contexts.insert(id, BodyContext::new(def.owner));
        debug!(
            "Created {:?} body {:?} at ({}, {})",
            def.kind, id, def.x, def.y
        );
        Ok(id)
    }

    /// Destroy a body, its shapes and its gameplay context.
    ///
    /// Returns `false` without doing anything when the body is already gone,
    /// so destroying twice is harmless.
    pub fn destroy_body(&mut self, id: BodyId) -> bool {
        if !self.contains(id) {
            debug!("Ignoring destroy of dead body {:?}", id);
            return false;
        }
        self.contexts.remove(&id);
        self.pending_forces.retain(|pending| *pending != id);
        self.bodies.remove(
            id.handle(),
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        debug!("Destroyed body {:?}", id);
        true
    }

    /// Tear the world down. Every body is destroyed and later calls fail
    /// with [`PhysicsError::WorldDestroyed`].
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        let ids: Vec<BodyId> = self.body_ids().collect();
        for id in &ids {
            self.destroy_body(*id);
        }
        while self.collision_events.try_recv().is_ok() {}
        while self.contact_force_events.try_recv().is_ok() {}
        self.destroyed = true;
        info!("Physics world destroyed ({} bodies released)", ids.len());
    }

    /// Switch a body to sensor bookkeeping and reset its contact count.
    ///
    /// Shape flags are not touched; attach a sensor shape separately.
    pub fn mark_sensor(&mut self, id: BodyId) -> PhysicsResult<()> {
        let ctx = self.context_mut(id)?;
        ctx.role = BodyRole::Sensor;
        ctx.contact_count = 0;
        Ok(())
    }

    /// Attach the script-side back-reference for a body.
    pub fn bind_owner(&mut self, id: BodyId, owner: OwnerKey) -> PhysicsResult<()> {
        self.context_mut(id)?.owner = Some(owner);
        Ok(())
    }

    pub fn reset_collided(&mut self, id: BodyId) -> PhysicsResult<()> {
        self.context_mut(id)?.collided = false;
        Ok(())
    }

    /// Clear every body's `collided` flag. Game loops call this once per
    /// frame after they have read the flags.
    pub fn clear_collision_flags(&mut self) {
        for ctx in self.contexts.values_mut() {
            ctx.collided = false;
        }
    }

    /// Bring the query pipeline in line with shapes attached, removed or
    /// teleported since the last step.
    pub(super) fn sync_query_pipeline(&mut self) {
        self.bodies
            .propagate_modified_body_positions_to_colliders(&mut self.colliders);
        self.query_pipeline.update(&self.colliders);
    }

    pub(super) fn ensure_alive(&self) -> PhysicsResult<()> {
        if self.destroyed {
            Err(PhysicsError::WorldDestroyed)
        } else {
            Ok(())
        }
    }

    pub(super) fn rigid_body(&self, id: BodyId) -> PhysicsResult<&RigidBody> {
        self.ensure_alive()?;
        self.bodies
            .get(id.handle())
            .ok_or(PhysicsError::InvalidBody(id))
    }

    pub(super) fn rigid_body_mut(&mut self, id: BodyId) -> PhysicsResult<&mut RigidBody> {
        self.ensure_alive()?;
        self.bodies
            .get_mut(id.handle())
            .ok_or(PhysicsError::InvalidBody(id))
    }

    /// Context of a live body. `None` when the body is alive but has no
    /// context, which callers treat as default values.
    pub(super) fn context(&self, id: BodyId) -> PhysicsResult<Option<&BodyContext>> {
        self.rigid_body(id)?;
        Ok(self.contexts.get(&id))
    }

    fn context_mut(&mut self, id: BodyId) -> PhysicsResult<&mut BodyContext> {
        self.rigid_body(id)?;
        Ok(self.contexts.entry(id).or_insert_with(|| BodyContext::new(None)))
    }
}
