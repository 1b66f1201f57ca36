//! Precondition failures reported by the simulation's lifecycle API.
//!
//! None of these are fatal: the operation that produced one is a no-op, and
//! the same message is logged at `warn` level when it happens.

use thiserror::Error;

/// A rejected lifecycle or force-management request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("no entity named \"{0}\" is registered")]
    EntityNotFound(String),
    #[error("an entity named \"{0}\" is already registered or queued")]
    DuplicateEntity(String),
    #[error("entity \"{0}\" has no rigid body component")]
    MissingRigidBody(String),
    #[error("entity \"{0}\" has no collider component")]
    MissingCollider(String),
    #[error("entity \"{0}\" owns a rigid body; use the rigid body path instead")]
    UnexpectedRigidBody(String),
    #[error("rigid body has no force named \"{0}\"")]
    ForceNotFound(String),
}
