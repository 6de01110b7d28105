use std::sync::Arc;

use models::ResourceAllocation;
use tracing::{info, warn};

use crate::errors::{EntityKind, ServiceError};
use crate::identity::IdentityGenerator;
use crate::services::{AllocationStore, ResidentStore};
use crate::storage::WriteGate;

/// Resource allocations. Quantities are recorded as given; there is no
/// inventory to check against.
#[derive(Clone)]
pub struct AllocationService {
    allocations: Arc<AllocationStore>,
    residents: Arc<ResidentStore>,
    ids: Arc<dyn IdentityGenerator>,
    gate: WriteGate,
}

impl AllocationService {
    pub fn new(
        allocations: Arc<AllocationStore>,
        residents: Arc<ResidentStore>,
        ids: Arc<dyn IdentityGenerator>,
        gate: WriteGate,
    ) -> Self {
        Self { allocations, residents, ids, gate }
    }

    /// Allocate `quantity` of `resource` to a resident; returns the new allocation id.
    pub async fn allocate_resource(
        &self,
        resident_id: &str,
        resource: &str,
        quantity: u8,
    ) -> Result<String, ServiceError> {
        let _gate = self.gate.lock().await;
        if !self.residents.contains_key(&resident_id.to_string()).await {
            warn!(%resident_id, "allocate_resource: resident not found");
            return Err(ServiceError::not_found(EntityKind::Resident));
        }
        let allocation = ResourceAllocation {
            id: self.ids.generate(),
            resident_id: resident_id.to_string(),
            resource: resource.to_string(),
            quantity,
        };
        let id = allocation.id.clone();
        self.allocations.insert(id.clone(), allocation).await?;
        info!(allocation_id = %id, %resident_id, %resource, quantity, "resource allocated");
        Ok(id)
    }

    /// Permanently remove an allocation.
    pub async fn deallocate_resource(&self, allocation_id: &str) -> Result<(), ServiceError> {
        let _gate = self.gate.lock().await;
        match self.allocations.remove(&allocation_id.to_string()).await? {
            Some(_) => {
                info!(%allocation_id, "resource deallocated");
                Ok(())
            }
            None => {
                warn!(%allocation_id, "deallocate_resource: allocation not found");
                Err(ServiceError::not_found(EntityKind::ResourceAllocation))
            }
        }
    }

    pub async fn get_allocation(
        &self,
        allocation_id: &str,
    ) -> Result<ResourceAllocation, ServiceError> {
        self.allocations
            .get(&allocation_id.to_string())
            .await
            .ok_or_else(|| ServiceError::not_found(EntityKind::ResourceAllocation))
    }

    /// Allocations in id order, optionally for one resident.
    pub async fn list_allocations(&self, resident_id: Option<&str>) -> Vec<ResourceAllocation> {
        match resident_id {
            Some(rid) => self.allocations.filter_values(|a| a.resident_id == rid).await,
            None => self.allocations.values().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admit, open_home};
    use std::collections::HashSet;

    #[tokio::test]
    async fn allocate_requires_existing_resident() -> Result<(), anyhow::Error> {
        let home = open_home(50).await?;
        let res = home.allocations.allocate_resource("ghost", "wheelchair", 1).await;
        assert!(matches!(res, Err(ServiceError::NotFound(EntityKind::Resident))));
        assert!(home.allocations.list_allocations(None).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn deallocate_succeeds_exactly_once() -> Result<(), anyhow::Error> {
        let home = open_home(50).await?;
        let r = admit(&home, "Ada").await?;
        let id = home.allocations.allocate_resource(&r.id, "walker", 2).await?;

        let stored = home.allocations.get_allocation(&id).await?;
        assert_eq!(stored.resident_id, r.id);
        assert_eq!(stored.quantity, 2);

        home.allocations.deallocate_resource(&id).await?;
        let again = home.allocations.deallocate_resource(&id).await;
        assert!(matches!(again, Err(ServiceError::NotFound(EntityKind::ResourceAllocation))));
        assert_eq!(again.unwrap_err().to_string(), "ResourceAllocation not found");
        Ok(())
    }

    #[tokio::test]
    async fn ten_thousand_allocations_have_distinct_ids() -> Result<(), anyhow::Error> {
        let home = open_home(50).await?;
        let r = admit(&home, "Ada").await?;
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let id = home.allocations.allocate_resource(&r.id, "gloves", 255).await?;
            assert!(seen.insert(id));
        }
        assert_eq!(home.allocations.list_allocations(Some(&r.id)).await.len(), 10_000);
        Ok(())
    }
}
