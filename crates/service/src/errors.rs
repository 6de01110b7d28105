use std::fmt;

use thiserror::Error;

/// Kinds of things a lookup can fail to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Resident,
    Medication,
    Appointment,
    ResourceAllocation,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Resident => "Resident",
            EntityKind::Medication => "Medication",
            EntityKind::Appointment => "Appointment",
            EntityKind::ResourceAllocation => "ResourceAllocation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(EntityKind),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("capacity exceeded: {current} of {max} places taken")]
    CapacityExceeded { current: usize, max: u8 },
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("facility configuration already initialized")]
    AlreadyInitialized,
    #[error("facility configuration not initialized")]
    NotInitialized,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(kind: EntityKind) -> Self {
        Self::NotFound(kind)
    }

    pub fn storage(e: impl fmt::Display) -> Self {
        Self::Storage(e.to_string())
    }
}
