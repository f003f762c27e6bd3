//! Advancing the simulation and folding its events into body contexts.
//!
//! A step always runs to completion: the engine advance happens first and
//! every event it produced is applied before the call returns.

use log::{debug, warn};
use rapier2d::prelude::*;

use super::body::{BodyId, BodyRole};
use super::error::PhysicsResult;
use super::world::World;

/// What one call to [`World::step`] or [`World::step_by`] did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepReport {
    /// Seconds actually simulated, after clamping. Zero when nothing advanced.
    pub dt: f32,
    pub sensor_begins: usize,
    pub sensor_ends: usize,
    pub contact_begins: usize,
}

impl World {
    /// Advance by the time elapsed on the world's clock since the previous
    /// call, clamped to the configured maximum. The first call advances by
    /// the maximum.
    pub fn step(&mut self) -> PhysicsResult<StepReport> {
        self.ensure_alive()?;
        let now = self.clock.now();
        let elapsed = match self.last_tick.replace(now) {
            Some(previous) => now.saturating_sub(previous).as_secs_f32(),
            None => self.config.max_step,
        };
        self.advance(elapsed)
    }

    /// Advance by an explicit delta, clamped like [`World::step`].
    pub fn step_by(&mut self, dt: f32) -> PhysicsResult<StepReport> {
        self.ensure_alive()?;
        self.last_tick = Some(self.clock.now());
        self.advance(dt)
    }

    fn advance(&mut self, elapsed: f32) -> PhysicsResult<StepReport> {
        let dt = clamp_delta(elapsed, self.config.max_step);
        if dt < elapsed {
            debug!("Clamped step from {elapsed}s to {dt}s");
        }

        let mut report = StepReport::default();
        if dt > 0.0 {
            self.integration_parameters.dt = dt;
            self.physics_pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                Some(&mut self.query_pipeline),
                &(),
                &self.event_collector,
            );
            report.dt = dt;
            self.release_forces();
        }

        self.apply_events(&mut report);
        self.step_count += 1;
        Ok(report)
    }

    /// Forces last for exactly one advance.
    fn release_forces(&mut self) {
        for id in self.pending_forces.drain(..) {
            if let Some(rb) = self.bodies.get_mut(id.handle()) {
                rb.reset_forces(false);
            }
        }
    }

    fn apply_events(&mut self, report: &mut StepReport) {
        while let Ok(event) = self.collision_events.try_recv() {
            if event.sensor() {
                let Some(sensor) = self.sensor_body(&event) else {
                    continue;
                };
                let Some(ctx) = self.contexts.get_mut(&sensor) else {
                    continue;
                };
                if ctx.role != BodyRole::Sensor {
                    continue;
                }
                if event.started() {
                    ctx.contact_count += 1;
                    report.sensor_begins += 1;
                } else if ctx.contact_count == 0 {
                    warn!("Sensor {:?} got an end event with no contacts", sensor);
                } else {
                    ctx.contact_count -= 1;
                    report.sensor_ends += 1;
                }
            } else if event.started() {
                for handle in [event.collider1(), event.collider2()] {
                    if let Some(ctx) = self
                        .parent_body(handle)
                        .and_then(|body| self.contexts.get_mut(&body))
                    {
                        ctx.collided = true;
                    }
                }
                report.contact_begins += 1;
            }
        }
        while self.contact_force_events.try_recv().is_ok() {}
    }

    fn parent_body(&self, collider: ColliderHandle) -> Option<BodyId> {
        self.colliders
            .get(collider)
            .and_then(|c| c.parent())
            .map(BodyId::from)
    }

    /// Body owning the sensor side of a sensor event, if it still exists.
    fn sensor_body(&self, event: &CollisionEvent) -> Option<BodyId> {
        [event.collider1(), event.collider2()]
            .into_iter()
            .filter_map(|handle| self.colliders.get(handle))
            .find(|collider| collider.is_sensor())
            .and_then(|collider| collider.parent())
            .map(BodyId::from)
    }
}

/// Clamp a raw frame delta into `[0, max_step]`.
pub fn clamp_delta(elapsed: f32, max_step: f32) -> f32 {
    if elapsed.is_nan() {
        return 0.0;
    }
    elapsed.clamp(0.0, max_step)
}
