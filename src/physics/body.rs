//! Bodies: handles, gameplay context, accessors and mutators.
//!
//! Everything that crosses this API is in display units (pixels, degrees)
//! unless the name says otherwise.

use std::f32::consts::{PI, TAU};
use std::str::FromStr;

use rapier2d::prelude::*;

use super::error::{PhysicsError, PhysicsResult};
use super::units::{Vec2, deg_to_rad, rad_to_deg};
use super::world::World;

/// Frame rate assumed by the rotation controller.
pub const CONTROL_RATE_HZ: f32 = 60.0;
/// Largest angular velocity the rotation controller will request, in deg/s.
pub const MAX_ROT_DEGREES: f32 = 5.0;

/// Opaque handle to a body owned by a [`World`].
///
/// Handles are generational: a handle to a destroyed body stays invalid
/// even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(RigidBodyHandle);

impl BodyId {
    pub fn handle(&self) -> RigidBodyHandle {
        self.0
    }

    /// Packed index/generation pair, stable for the lifetime of the body.
    pub fn to_bits(&self) -> u64 {
        let (index, generation) = self.0.into_raw_parts();
        ((generation as u64) << 32) | index as u64
    }
}

impl From<RigidBodyHandle> for BodyId {
    fn from(handle: RigidBodyHandle) -> Self {
        Self(handle)
    }
}

/// Handle to a single shape attached to a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(pub(super) ColliderHandle);

/// Back-reference to whatever represents a body on the script side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerKey(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Static,
    Dynamic,
    Kinematic,
}

impl BodyKind {
    pub(super) fn rigid_body_type(self) -> RigidBodyType {
        match self {
            BodyKind::Static => RigidBodyType::Fixed,
            BodyKind::Dynamic => RigidBodyType::Dynamic,
            BodyKind::Kinematic => RigidBodyType::KinematicVelocityBased,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyKind::Static => "static",
            BodyKind::Dynamic => "dynamic",
            BodyKind::Kinematic => "kinematic",
        }
    }
}

impl FromStr for BodyKind {
    type Err = PhysicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(BodyKind::Static),
            "dynamic" => Ok(BodyKind::Dynamic),
            "kinematic" => Ok(BodyKind::Kinematic),
            other => Err(PhysicsError::UnknownBodyKind(other.to_string())),
        }
    }
}

/// Gameplay role of a body. Only sensors count contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyRole {
    #[default]
    Regular,
    Sensor,
}

/// Per-body gameplay state kept in the world's side table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BodyContext {
    pub role: BodyRole,
    /// Shapes currently overlapping a sensor body.
    pub contact_count: u32,
    /// Set by any contact begin; cleared only by an explicit reset.
    pub collided: bool,
    pub owner: Option<OwnerKey>,
}

impl BodyContext {
    pub fn new(owner: Option<OwnerKey>) -> Self {
        Self {
            owner,
            ..Default::default()
        }
    }
}

/// Creation parameters for [`World::create_body`].
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDef {
    pub kind: BodyKind,
    pub x: f32,
    pub y: f32,
    /// Initial angle in degrees.
    pub angle: f32,
    pub allow_sleep: bool,
    pub vx: f32,
    pub vy: f32,
    /// Degrees per second.
    pub angular_velocity: f32,
    pub owner: Option<OwnerKey>,
}

impl BodyDef {
    pub fn new(kind: BodyKind, x: f32, y: f32) -> Self {
        Self {
            kind,
            x,
            y,
            angle: 0.0,
            allow_sleep: true,
            vx: 0.0,
            vy: 0.0,
            angular_velocity: 0.0,
            owner: None,
        }
    }

    pub fn dynamic(x: f32, y: f32) -> Self {
        Self::new(BodyKind::Dynamic, x, y)
    }

    pub fn fixed(x: f32, y: f32) -> Self {
        Self::new(BodyKind::Static, x, y)
    }

    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    pub fn with_angular_velocity(mut self, degrees_per_sec: f32) -> Self {
        self.angular_velocity = degrees_per_sec;
        self
    }

    pub fn with_angle(mut self, degrees: f32) -> Self {
        self.angle = degrees;
        self
    }

    pub fn with_sleep(mut self, allow_sleep: bool) -> Self {
        self.allow_sleep = allow_sleep;
        self
    }

    pub fn with_owner(mut self, owner: OwnerKey) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Snapshot returned by [`World::info`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyInfo {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Degrees.
    pub angle: f32,
    /// Degrees per second.
    pub angular_velocity: f32,
    pub awake: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extents {
    pub w: f32,
    pub h: f32,
}

/// Body-local description of one attached shape, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeInfo {
    /// Polygon centroid and the size of its axis-aligned bounds.
    Polygon { x: f32, y: f32, w: f32, h: f32 },
    /// One segment of a chain.
    Segment { x1: f32, y1: f32, x2: f32, y2: f32 },
}

/// Wrap an angle into (-π, π].
pub fn normalize_angle(radians: f32) -> f32 {
    if !radians.is_finite() {
        return 0.0;
    }
    let mut a = radians;
    while a <= -PI {
        a += TAU;
    }
    while a > PI {
        a -= TAU;
    }
    a
}

/// Angular velocity (rad/s) the rotation controller asks for.
///
/// Predicts where the body will be one control frame from now and returns
/// the rate that removes the remaining error towards `angle + delta`,
/// limited to ±[`MAX_ROT_DEGREES`].
pub fn rotation_control_velocity(angle: f32, angular_velocity: f32, delta_degrees: f32) -> f32 {
    let target = angle + deg_to_rad(delta_degrees);
    let next_angle = angle + angular_velocity / CONTROL_RATE_HZ;
    let residual = normalize_angle(target - next_angle);
    let limit = deg_to_rad(MAX_ROT_DEGREES);
    (residual * CONTROL_RATE_HZ).clamp(-limit, limit)
}

impl World {
    pub fn kind(&self, id: BodyId) -> PhysicsResult<BodyKind> {
        let rb = self.rigid_body(id)?;
        Ok(match rb.body_type() {
            RigidBodyType::Dynamic => BodyKind::Dynamic,
            RigidBodyType::Fixed => BodyKind::Static,
            _ => BodyKind::Kinematic,
        })
    }

    pub fn role(&self, id: BodyId) -> PhysicsResult<BodyRole> {
        Ok(self.context(id)?.map(|ctx| ctx.role).unwrap_or_default())
    }

    pub fn owner(&self, id: BodyId) -> PhysicsResult<Option<OwnerKey>> {
        Ok(self.context(id)?.and_then(|ctx| ctx.owner))
    }

    pub fn position(&self, id: BodyId) -> PhysicsResult<Vec2> {
        let rb = self.rigid_body(id)?;
        Ok(Vec2::from(self.units.vec_to_display(rb.translation())))
    }

    pub fn position_meters(&self, id: BodyId) -> PhysicsResult<Vec2> {
        let t = self.rigid_body(id)?.translation();
        Ok(Vec2::new(t.x, t.y))
    }

    /// Teleport the body, keeping its rotation.
    pub fn set_position(&mut self, id: BodyId, x: f32, y: f32) -> PhysicsResult<()> {
        let translation = self.units.vec_to_sim(x, y);
        self.rigid_body_mut(id)?.set_translation(translation, true);
        Ok(())
    }

    /// Angle in degrees.
    pub fn angle(&self, id: BodyId) -> PhysicsResult<f32> {
        Ok(rad_to_deg(self.rigid_body(id)?.rotation().angle()))
    }

    pub fn set_angle(&mut self, id: BodyId, degrees: f32) -> PhysicsResult<()> {
        let rb = self.rigid_body_mut(id)?;
        let translation = *rb.translation();
        rb.set_position(Isometry::new(translation, deg_to_rad(degrees)), true);
        Ok(())
    }

    /// Degrees per second.
    pub fn angular_velocity(&self, id: BodyId) -> PhysicsResult<f32> {
        Ok(rad_to_deg(self.rigid_body(id)?.angvel()))
    }

    pub fn set_angular_velocity(&mut self, id: BodyId, degrees_per_sec: f32) -> PhysicsResult<()> {
        self.rigid_body_mut(id)?
            .set_angvel(deg_to_rad(degrees_per_sec), true);
        Ok(())
    }

    /// Pixels per second.
    pub fn linear_velocity(&self, id: BodyId) -> PhysicsResult<Vec2> {
        let rb = self.rigid_body(id)?;
        Ok(Vec2::from(self.units.vec_to_display(rb.linvel())))
    }

    /// Mass in kilograms, derived from the attached shapes.
    pub fn mass(&self, id: BodyId) -> PhysicsResult<f32> {
        Ok(self.rigid_body(id)?.mass())
    }

    pub fn shape_count(&self, id: BodyId) -> PhysicsResult<usize> {
        Ok(self.rigid_body(id)?.colliders().len())
    }

    pub fn is_awake(&self, id: BodyId) -> PhysicsResult<bool> {
        Ok(!self.rigid_body(id)?.is_sleeping())
    }

    pub fn has_collided(&self, id: BodyId) -> PhysicsResult<bool> {
        Ok(self.context(id)?.is_some_and(|ctx| ctx.collided))
    }

    /// Shapes overlapping a sensor body; always 0 for regular bodies.
    pub fn sensor_contact_count(&self, id: BodyId) -> PhysicsResult<u32> {
        Ok(self
            .context(id)?
            .filter(|ctx| ctx.role == BodyRole::Sensor)
            .map_or(0, |ctx| ctx.contact_count))
    }

    pub fn info(&self, id: BodyId) -> PhysicsResult<BodyInfo> {
        let rb = self.rigid_body(id)?;
        let (x, y) = self.units.vec_to_display(rb.translation());
        let (vx, vy) = self.units.vec_to_display(rb.linvel());
        Ok(BodyInfo {
            x,
            y,
            vx,
            vy,
            angle: rad_to_deg(rb.rotation().angle()),
            angular_velocity: rad_to_deg(rb.angvel()),
            awake: !rb.is_sleeping(),
        })
    }

    /// Size of the first attached shape, if it is a polygon.
    pub fn extents(&self, id: BodyId) -> PhysicsResult<Option<Extents>> {
        let rb = self.rigid_body(id)?;
        let first = rb
            .colliders()
            .first()
            .and_then(|handle| self.colliders.get(*handle));
        Ok(first.and_then(|collider| match self.describe_shape(collider).first() {
            Some(ShapeInfo::Polygon { w, h, .. }) => Some(Extents { w: *w, h: *h }),
            _ => None,
        }))
    }

    /// Every shape on the body in body-local pixels. Chains contribute one
    /// entry per segment.
    pub fn shapes_info(&self, id: BodyId) -> PhysicsResult<Vec<ShapeInfo>> {
        let rb = self.rigid_body(id)?;
        Ok(rb
            .colliders()
            .iter()
            .filter_map(|handle| self.colliders.get(*handle))
            .flat_map(|collider| self.describe_shape(collider))
            .collect())
    }

    fn describe_shape(&self, collider: &Collider) -> Vec<ShapeInfo> {
        let local = collider
            .position_wrt_parent()
            .copied()
            .unwrap_or_else(Isometry::identity);
        let shape = collider.shape();

        if let Some(cuboid) = shape.as_cuboid() {
            let (x, y) = self.units.vec_to_display(&local.translation.vector);
            return vec![ShapeInfo::Polygon {
                x,
                y,
                w: self.units.to_display(cuboid.half_extents.x * 2.0),
                h: self.units.to_display(cuboid.half_extents.y * 2.0),
            }];
        }
        if let Some(polygon) = shape.as_convex_polygon() {
            let aabb = polygon.aabb(&local);
            let center = aabb.center();
            let extents = aabb.extents();
            return vec![ShapeInfo::Polygon {
                x: self.units.to_display(center.x),
                y: self.units.to_display(center.y),
                w: self.units.to_display(extents.x),
                h: self.units.to_display(extents.y),
            }];
        }
        if let Some(polyline) = shape.as_polyline() {
            return polyline
                .segments()
                .map(|segment| {
                    let a = local * segment.a;
                    let b = local * segment.b;
                    ShapeInfo::Segment {
                        x1: self.units.to_display(a.x),
                        y1: self.units.to_display(a.y),
                        x2: self.units.to_display(b.x),
                        y2: self.units.to_display(b.y),
                    }
                })
                .collect();
        }
        Vec::new()
    }

    /// Apply a force (pixel-scaled newtons) at the center of mass for the
    /// next advance.
    pub fn apply_force_center(&mut self, id: BodyId, fx: f32, fy: f32) -> PhysicsResult<()> {
        let force = self.units.vec_to_sim(fx, fy);
        self.rigid_body_mut(id)?.add_force(force, true);
        if !self.pending_forces.contains(&id) {
            self.pending_forces.push(id);
        }
        Ok(())
    }

    pub fn apply_impulse_center(&mut self, id: BodyId, ix: f32, iy: f32) -> PhysicsResult<()> {
        let impulse = self.units.vec_to_sim(ix, iy);
        self.rigid_body_mut(id)?.apply_impulse(impulse, true);
        Ok(())
    }

    /// Apply the impulse that changes the body's velocity to `(vx, vy)`.
    ///
    /// The target is in simulation units (m/s), matching what the game
    /// loop passes for the piece under control.
    pub fn apply_impulse_for_velocity(&mut self, id: BodyId, vx: f32, vy: f32) -> PhysicsResult<()> {
        let rb = self.rigid_body_mut(id)?;
        let delta = vector![vx, vy] - rb.linvel();
        let impulse = delta * rb.mass();
        rb.apply_impulse(impulse, true);
        Ok(())
    }

    /// Turn the body by `delta_degrees` through a rate-limited angular
    /// impulse rather than by setting its angle.
    pub fn rotate(&mut self, id: BodyId, delta_degrees: f32) -> PhysicsResult<()> {
        let rb = self.rigid_body_mut(id)?;
        let desired =
            rotation_control_velocity(rb.rotation().angle(), rb.angvel(), delta_degrees);
        let inertia = rb.mass_properties().local_mprops.principal_inertia();
        rb.apply_torque_impulse(inertia * desired, true);
        Ok(())
    }
}
