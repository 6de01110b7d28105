use std::sync::Arc;

use models::{Resident, ResidentInput};
use tracing::{info, warn};

use crate::config_store::ConfigStore;
use crate::errors::{EntityKind, ServiceError};
use crate::identity::IdentityGenerator;
use crate::services::{AllocationStore, AppointmentStore, ResidentStore};
use crate::storage::WriteGate;

/// Admission, discharge and medication lists.
#[derive(Clone)]
pub struct ResidentService {
    residents: Arc<ResidentStore>,
    appointments: Arc<AppointmentStore>,
    allocations: Arc<AllocationStore>,
    config: Arc<ConfigStore>,
    ids: Arc<dyn IdentityGenerator>,
    gate: WriteGate,
}

impl ResidentService {
    pub fn new(
        residents: Arc<ResidentStore>,
        appointments: Arc<AppointmentStore>,
        allocations: Arc<AllocationStore>,
        config: Arc<ConfigStore>,
        ids: Arc<dyn IdentityGenerator>,
        gate: WriteGate,
    ) -> Self {
        Self { residents, appointments, allocations, config, ids, gate }
    }

    /// Admit a new resident; rejected once the facility is full.
    pub async fn admit_resident(&self, input: ResidentInput) -> Result<Resident, ServiceError> {
        input.validate()?;
        let _gate = self.gate.lock().await;
        let max = self.config.get_max_capacity().await?;
        let current = self.residents.size().await;
        if current >= usize::from(max) {
            warn!(current, max, "admission rejected: facility full");
            return Err(ServiceError::CapacityExceeded { current, max });
        }
        let resident = input.into_resident(self.ids.generate());
        self.residents.insert(resident.id.clone(), resident.clone()).await?;
        info!(resident_id = %resident.id, "resident admitted");
        Ok(resident)
    }

    pub async fn get_resident(&self, resident_id: &str) -> Result<Resident, ServiceError> {
        self.residents
            .get(&resident_id.to_string())
            .await
            .ok_or_else(|| ServiceError::not_found(EntityKind::Resident))
    }

    /// All residents in id order.
    pub async fn list_residents(&self) -> Vec<Resident> {
        self.residents.values().await
    }

    /// Live count, never cached.
    pub async fn current_resident_count(&self) -> usize {
        self.residents.size().await
    }

    /// Remove a resident. Refused while appointments or allocations still
    /// reference them.
    pub async fn discharge_resident(&self, resident_id: &str) -> Result<Resident, ServiceError> {
        let _gate = self.gate.lock().await;
        let key = resident_id.to_string();
        if !self.residents.contains_key(&key).await {
            return Err(ServiceError::not_found(EntityKind::Resident));
        }
        if self.appointments.any(|a| a.resident_id == resident_id).await {
            return Err(ServiceError::Conflict(format!(
                "resident {resident_id} still has appointments"
            )));
        }
        if self.allocations.any(|a| a.resident_id == resident_id).await {
            return Err(ServiceError::Conflict(format!(
                "resident {resident_id} still has allocated resources"
            )));
        }
        let removed = self
            .residents
            .remove(&key)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Resident))?;
        info!(%resident_id, "resident discharged");
        Ok(removed)
    }

    /// Append `medication` to the resident's list.
    pub async fn add_medication(
        &self,
        resident_id: &str,
        medication: &str,
    ) -> Result<(), ServiceError> {
        let _gate = self.gate.lock().await;
        let updated = self
            .residents
            .update(&resident_id.to_string(), |r| {
                r.add_medication(medication.to_string());
                Ok(r.medications.len())
            })
            .await?;
        match updated {
            Some(count) => {
                info!(%resident_id, %medication, count, "medication added");
                Ok(())
            }
            None => {
                warn!(%resident_id, "add_medication: resident not found");
                Err(ServiceError::not_found(EntityKind::Resident))
            }
        }
    }

    /// Remove the first occurrence of `medication` from the resident's list.
    pub async fn remove_medication(
        &self,
        resident_id: &str,
        medication: &str,
    ) -> Result<(), ServiceError> {
        let _gate = self.gate.lock().await;
        let updated = self
            .residents
            .update(&resident_id.to_string(), |r| {
                if r.remove_medication(medication) {
                    Ok(r.medications.len())
                } else {
                    Err(ServiceError::not_found(EntityKind::Medication))
                }
            })
            .await
            .inspect_err(|e| {
                warn!(%resident_id, %medication, error = %e, "remove_medication rejected")
            })?;
        match updated {
            Some(count) => {
                info!(%resident_id, %medication, count, "medication removed");
                Ok(())
            }
            None => {
                warn!(%resident_id, "remove_medication: resident not found");
                Err(ServiceError::not_found(EntityKind::Resident))
            }
        }
    }
}
