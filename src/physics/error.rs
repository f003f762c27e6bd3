use thiserror::Error;

use super::body::BodyId;

/// Reportable failures of the physics layer.
///
/// "Nothing to clear" is not an error; scans return an empty
/// [`LineClearReport`](super::line_clear::LineClearReport) instead. Contract
/// violations such as non-positive shape dimensions panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhysicsError {
    #[error("body {0:?} is not alive in this world")]
    InvalidBody(BodyId),
    #[error("the world has been destroyed")]
    WorldDestroyed,
    #[error("unknown body kind '{0}' (expected static, dynamic or kinematic)")]
    UnknownBodyKind(String),
}

pub type PhysicsResult<T> = Result<T, PhysicsError>;
