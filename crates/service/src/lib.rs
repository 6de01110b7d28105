//! Service layer for the care home records.
//! - `storage`: persistent ordered key-value stores over a stable backend.
//! - `services`: resident, appointment and allocation operations.
//! - `config_store`: owner and capacity, initialized once.
//! - `care_home`: wires everything onto one storage location.

pub mod errors;
pub mod identity;
pub mod storage;
pub mod config_store;
pub mod services;
pub mod care_home;
#[cfg(test)]
pub mod test_support;

pub use care_home::CareHome;
pub use errors::{EntityKind, ServiceError};
