//! Record types persisted by the care home stores.
//!
//! Each record carries its own string id, which is also its key in the
//! owning store.

pub mod errors;
pub mod principal;
pub mod resident;
pub mod appointment;
pub mod resource_allocation;

pub use appointment::{Appointment, AppointmentInput};
pub use principal::Principal;
pub use resident::{Resident, ResidentInput};
pub use resource_allocation::{AllocationInput, ResourceAllocation};
