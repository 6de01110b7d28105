#![cfg(test)]
use models::{Principal, Resident, ResidentInput};

use crate::care_home::CareHome;
use crate::errors::ServiceError;
use crate::storage::StorageLocation;

pub fn owner() -> Principal {
    Principal::new("owner-a").expect("valid principal")
}

pub fn resident_input(name: &str) -> ResidentInput {
    ResidentInput {
        name: name.to_string(),
        age: 80,
        medical_history: "none".to_string(),
        emergency_contact: "family".to_string(),
        healthcare_info: "plan-1".to_string(),
        medications: vec![],
    }
}

/// Uninitialized home on the given location.
pub async fn open_home_at(location: &StorageLocation) -> Result<CareHome, ServiceError> {
    CareHome::open(location).await
}

/// Fresh in-memory home, initialized with `owner()` and `max_capacity`.
pub async fn open_home(max_capacity: u8) -> Result<CareHome, ServiceError> {
    let home = CareHome::open(&StorageLocation::memory()).await?;
    home.ensure_initialized(owner(), max_capacity).await?;
    Ok(home)
}

pub async fn admit(home: &CareHome, name: &str) -> Result<Resident, ServiceError> {
    home.residents.admit_resident(resident_input(name)).await
}
