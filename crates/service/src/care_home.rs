//! Composition root: opens every store on one storage location and wires the
//! services together around a shared write gate.

use std::sync::Arc;

use models::{Appointment, Principal, Resident, ResourceAllocation};
use tracing::info;

use crate::config_store::{ConfigStore, FacilityStatus};
use crate::errors::ServiceError;
use crate::identity::{IdentityGenerator, UuidGenerator};
use crate::services::{AllocationService, AppointmentService, ResidentService};
use crate::storage::{new_write_gate, KeyedStore, StorageLocation, WriteGate};

pub const CONFIG_STORE: &str = "config";
pub const RESIDENT_STORE: &str = "residents";
pub const APPOINTMENT_STORE: &str = "appointments";
pub const ALLOCATION_STORE: &str = "resource_allocations";

#[derive(Clone)]
pub struct CareHome {
    pub config: Arc<ConfigStore>,
    pub residents: ResidentService,
    pub appointments: AppointmentService,
    pub allocations: AllocationService,
    gate: WriteGate,
}

impl CareHome {
    pub async fn open(location: &StorageLocation) -> Result<Self, ServiceError> {
        Self::open_with_ids(location, Arc::new(UuidGenerator)).await
    }

    pub async fn open_with_ids(
        location: &StorageLocation,
        ids: Arc<dyn IdentityGenerator>,
    ) -> Result<Self, ServiceError> {
        let config = ConfigStore::open(location.backend_for(CONFIG_STORE)).await?;
        let residents =
            KeyedStore::<String, Resident>::open(RESIDENT_STORE, location.backend_for(RESIDENT_STORE))
                .await?;
        let appointments = KeyedStore::<String, Appointment>::open(
            APPOINTMENT_STORE,
            location.backend_for(APPOINTMENT_STORE),
        )
        .await?;
        let allocations = KeyedStore::<String, ResourceAllocation>::open(
            ALLOCATION_STORE,
            location.backend_for(ALLOCATION_STORE),
        )
        .await?;
        let gate = new_write_gate();

        Ok(Self {
            residents: ResidentService::new(
                Arc::clone(&residents),
                Arc::clone(&appointments),
                Arc::clone(&allocations),
                Arc::clone(&config),
                Arc::clone(&ids),
                gate.clone(),
            ),
            appointments: AppointmentService::new(
                Arc::clone(&appointments),
                Arc::clone(&residents),
                Arc::clone(&ids),
                gate.clone(),
            ),
            allocations: AllocationService::new(allocations, residents, ids, gate.clone()),
            config,
            gate,
        })
    }

    /// Initialize the configuration on first start. Returns `false` when a
    /// persisted configuration was found and kept as-is.
    pub async fn ensure_initialized(
        &self,
        owner: Principal,
        max_capacity: u8,
    ) -> Result<bool, ServiceError> {
        let _gate = self.gate.lock().await;
        if self.config.is_initialized().await {
            let owner = self.config.get_owner().await?;
            info!(owner = %owner, "reusing persisted facility configuration");
            return Ok(false);
        }
        self.config.initialize(owner, max_capacity).await?;
        Ok(true)
    }

    pub async fn status(&self) -> Result<FacilityStatus, ServiceError> {
        Ok(FacilityStatus {
            owner: self.config.get_owner().await?,
            max_capacity: self.config.get_max_capacity().await?,
            current_resident_count: self.residents.current_resident_count().await,
        })
    }

    /// Owner-only; capacity may not drop below the current resident count.
    pub async fn set_max_capacity(
        &self,
        caller: &Principal,
        max_capacity: u8,
    ) -> Result<(), ServiceError> {
        let _gate = self.gate.lock().await;
        let current = self.residents.current_resident_count().await;
        self.config.set_max_capacity(caller, max_capacity, current).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EntityKind;
    use crate::test_support::{open_home_at, owner, resident_input};

    #[tokio::test]
    async fn ensure_initialized_runs_once_and_survives_restart() -> Result<(), anyhow::Error> {
        let location = StorageLocation::memory();
        let home = open_home_at(&location).await?;
        assert!(home.ensure_initialized(owner(), 50).await?);
        assert!(!home.ensure_initialized(Principal::new("someone-else")?, 5).await?);

        let r = home.residents.admit_resident(resident_input("Ada")).await?;
        home.residents.add_medication(&r.id, "aspirin").await?;
        let alloc = home.allocations.allocate_resource(&r.id, "wheelchair", 1).await?;

        // reopen over the same volume, as after a restart
        let reopened = open_home_at(&location).await?;
        assert!(!reopened.ensure_initialized(Principal::new("someone-else")?, 5).await?);
        let status = reopened.status().await?;
        assert_eq!(status.owner, owner());
        assert_eq!(status.max_capacity, 50);
        assert_eq!(status.current_resident_count, 1);
        assert_eq!(reopened.residents.get_resident(&r.id).await?.medications, vec!["aspirin"]);
        assert_eq!(reopened.allocations.get_allocation(&alloc).await?.resource, "wheelchair");
        Ok(())
    }

    #[tokio::test]
    async fn status_requires_initialization() -> Result<(), anyhow::Error> {
        let home = open_home_at(&StorageLocation::memory()).await?;
        assert!(matches!(home.status().await, Err(ServiceError::NotInitialized)));
        // admission cannot check capacity without configuration
        let res = home.residents.admit_resident(resident_input("Ada")).await;
        assert!(matches!(res, Err(ServiceError::NotInitialized)));
        Ok(())
    }

    #[tokio::test]
    async fn owner_can_raise_capacity_for_more_admissions() -> Result<(), anyhow::Error> {
        let home = open_home_at(&StorageLocation::memory()).await?;
        home.ensure_initialized(owner(), 1).await?;
        home.residents.admit_resident(resident_input("A")).await?;
        assert!(matches!(
            home.residents.admit_resident(resident_input("B")).await,
            Err(ServiceError::CapacityExceeded { .. })
        ));

        let denied = home.set_max_capacity(&Principal::new("intruder")?, 2).await;
        assert!(matches!(denied, Err(ServiceError::Unauthorized(_))));

        home.set_max_capacity(&owner(), 2).await?;
        home.residents.admit_resident(resident_input("B")).await?;
        assert_eq!(home.status().await?.current_resident_count, 2);
        Ok(())
    }

    /// Walks the documented facility scenario end to end.
    #[tokio::test]
    async fn medication_and_allocation_scenario() -> Result<(), anyhow::Error> {
        let home = open_home_at(&StorageLocation::memory()).await?;
        home.ensure_initialized(owner(), 50).await?;
        assert_eq!(home.status().await?.current_resident_count, 0);

        let r1 = home.residents.admit_resident(resident_input("R1")).await?;
        home.residents.add_medication(&r1.id, "aspirin").await?;
        home.residents.remove_medication(&r1.id, "aspirin").await?;
        let again = home.residents.remove_medication(&r1.id, "aspirin").await;
        assert!(matches!(again, Err(ServiceError::NotFound(EntityKind::Medication))));

        let x = home.allocations.allocate_resource(&r1.id, "wheelchair", 1).await?;
        home.allocations.deallocate_resource(&x).await?;
        let again = home.allocations.deallocate_resource(&x).await;
        assert!(matches!(again, Err(ServiceError::NotFound(EntityKind::ResourceAllocation))));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_mutations_are_serialized() -> Result<(), anyhow::Error> {
        let home = Arc::new(open_home_at(&StorageLocation::memory()).await?);
        home.ensure_initialized(owner(), 5).await?;
        let r = home.residents.admit_resident(resident_input("Ada")).await?;

        let mut tasks = Vec::new();
        for i in 0..50 {
            let home = Arc::clone(&home);
            let id = r.id.clone();
            tasks.push(tokio::spawn(async move {
                home.residents.add_medication(&id, &format!("med-{i}")).await?;
                home.allocations.allocate_resource(&id, "gloves", 1).await
            }));
        }
        let mut ids = std::collections::HashSet::new();
        for task in tasks {
            ids.insert(task.await??);
        }

        let meds = home.residents.get_resident(&r.id).await?.medications;
        assert_eq!(meds.len(), 50);
        assert_eq!(ids.len(), 50);
        assert_eq!(home.allocations.list_allocations(Some(&r.id)).await.len(), 50);

        // four places left; racing admissions must not overshoot them
        let mut admissions = Vec::new();
        for i in 0..20 {
            let home = Arc::clone(&home);
            admissions.push(tokio::spawn(async move {
                home.residents.admit_resident(resident_input(&format!("R{i}"))).await
            }));
        }
        let mut admitted = 0;
        for task in admissions {
            match task.await? {
                Ok(_) => admitted += 1,
                Err(ServiceError::CapacityExceeded { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
        assert_eq!(admitted, 4);
        assert_eq!(home.status().await?.current_resident_count, 5);
        Ok(())
    }

    #[tokio::test]
    async fn file_backed_home_persists_across_reopen() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("care_home_{}", uuid::Uuid::new_v4()));
        let location = StorageLocation::Dir(dir.clone());
        let home = CareHome::open(&location).await?;
        home.ensure_initialized(owner(), 10).await?;
        let r = home.residents.admit_resident(resident_input("Ada")).await?;
        drop(home);

        let reopened = CareHome::open(&location).await?;
        assert_eq!(reopened.residents.get_resident(&r.id).await?.name, "Ada");
        assert_eq!(reopened.config.get_max_capacity().await?, 10);

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
