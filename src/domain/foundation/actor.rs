//! Actors and roles for authorization decisions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ActorId, ValidationError};

/// Role an actor holds when requesting an order transition.
///
/// Roles restrict which lifecycle edges an actor may drive. `Admin` and
/// `System` bypass the role-permission table but never the structural
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Customer,
    Vendor,
    Driver,
    Admin,
    /// Internal processes: auto-assignment, webhook reconciliation.
    System,
}

impl ActorRole {
    /// Parses a role from its wire representation.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "CUSTOMER" => Ok(Self::Customer),
            "VENDOR" => Ok(Self::Vendor),
            "DRIVER" => Ok(Self::Driver),
            "ADMIN" => Ok(Self::Admin),
            "SYSTEM" => Ok(Self::System),
            other => Err(ValidationError::invalid_format(
                "actor_role",
                format!("unknown role '{}'", other),
            )),
        }
    }

    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Vendor => "VENDOR",
            Self::Driver => "DRIVER",
            Self::Admin => "ADMIN",
            Self::System => "SYSTEM",
        }
    }

    /// Returns true for roles that bypass the role-permission table.
    pub fn bypasses_permissions(&self) -> bool {
        matches!(self, Self::Admin | Self::System)
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An identified actor with a resolved role.
///
/// Role resolution happens at the calling layer (auth middleware, worker
/// bootstrap); the domain only ever sees the resolved pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: ActorId, role: ActorRole) -> Self {
        Self { id, role }
    }

    /// The internal system actor used by background processes.
    pub fn system() -> Self {
        Self {
            id: ActorId::new("system").expect("static actor id is non-empty"),
            role: ActorRole::System,
        }
    }
}
