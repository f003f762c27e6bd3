//! Gameplay physics: bodies built from boxes, a clamped stepper that folds
//! contact and sensor events into per-body state, and the line-clear scan.
//!
//! Nothing in here knows about the ECS or the scripting layer. Both drive a
//! [`World`] through its methods and refer to bodies by [`BodyId`].

pub mod body;
pub mod clock;
pub mod error;
pub mod line_clear;
pub mod shapes;
pub mod stepper;
pub mod units;
pub mod world;

pub use body::{
    BodyContext, BodyDef, BodyId, BodyInfo, BodyKind, BodyRole, Extents, OwnerKey, ShapeId,
    ShapeInfo,
};
pub use clock::{ManualClock, MonotonicClock, StepClock};
pub use error::{PhysicsError, PhysicsResult};
pub use line_clear::{LineClearReport, ScanParams, SplitBody};
pub use shapes::{Material, SurfaceMaterial, Tetromino};
pub use stepper::StepReport;
pub use units::{Units, Vec2};
pub use world::{World, WorldConfig};
