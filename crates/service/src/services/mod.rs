//! Entity services: CRUD over the keyed stores plus the cross-store checks.

pub mod residents;
pub mod appointments;
pub mod allocations;

use models::{Appointment, Resident, ResourceAllocation};

use crate::storage::KeyedStore;

pub type ResidentStore = KeyedStore<String, Resident>;
pub type AppointmentStore = KeyedStore<String, Appointment>;
pub type AllocationStore = KeyedStore<String, ResourceAllocation>;

pub use allocations::AllocationService;
pub use appointments::AppointmentService;
pub use residents::ResidentService;
