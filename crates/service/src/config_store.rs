//! Facility configuration: owner principal and maximum capacity.
//!
//! Values live under fixed keys in their own `KeyedStore` so they survive
//! restarts. `initialize` is a one-time gate.

use std::sync::Arc;

use models::Principal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::ServiceError;
use crate::storage::{KeyedStore, StableStorage};

pub const OWNER_KEY: &str = "owner";
pub const MAX_CAPACITY_KEY: &str = "max_capacity";
pub const DEFAULT_MAX_CAPACITY: u8 = 50;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ConfigValue {
    Owner(Principal),
    MaxCapacity(u8),
}

/// Summary of the facility configuration and occupancy.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FacilityStatus {
    pub owner: Principal,
    pub max_capacity: u8,
    pub current_resident_count: usize,
}

pub struct ConfigStore {
    values: Arc<KeyedStore<String, ConfigValue>>,
}

impl ConfigStore {
    pub async fn open(backend: Arc<dyn StableStorage>) -> Result<Arc<Self>, ServiceError> {
        let values = KeyedStore::open("config", backend).await?;
        Ok(Arc::new(Self { values }))
    }

    pub async fn is_initialized(&self) -> bool {
        self.values.contains_key(&OWNER_KEY.to_string()).await
    }

    /// Record the owner and initial capacity. Fails if already initialized.
    pub async fn initialize(&self, owner: Principal, max_capacity: u8) -> Result<(), ServiceError> {
        if max_capacity == 0 {
            return Err(ServiceError::Validation("max_capacity must be >= 1".into()));
        }
        let owner_for_log = owner.clone();
        self.values
            .update_map(|map| {
                if map.contains_key(OWNER_KEY) {
                    return Err(ServiceError::AlreadyInitialized);
                }
                map.insert(MAX_CAPACITY_KEY.to_string(), ConfigValue::MaxCapacity(max_capacity));
                map.insert(OWNER_KEY.to_string(), ConfigValue::Owner(owner));
                Ok(())
            })
            .await
            .inspect_err(|e| warn!(error = %e, "config initialize rejected"))?;
        info!(owner = %owner_for_log, max_capacity, "facility configuration initialized");
        Ok(())
    }

    pub async fn get_owner(&self) -> Result<Principal, ServiceError> {
        match self.values.get(&OWNER_KEY.to_string()).await {
            Some(ConfigValue::Owner(p)) => Ok(p),
            Some(other) => Err(ServiceError::storage(format!(
                "unexpected value under {OWNER_KEY}: {other:?}"
            ))),
            None => Err(ServiceError::NotInitialized),
        }
    }

    pub async fn get_max_capacity(&self) -> Result<u8, ServiceError> {
        match self.values.get(&MAX_CAPACITY_KEY.to_string()).await {
            Some(ConfigValue::MaxCapacity(n)) => Ok(n),
            Some(other) => Err(ServiceError::storage(format!(
                "unexpected value under {MAX_CAPACITY_KEY}: {other:?}"
            ))),
            None => Err(ServiceError::NotInitialized),
        }
    }

    /// Owner-only capacity change. `current_count` is the live resident count;
    /// capacity may not drop below it.
    pub async fn set_max_capacity(
        &self,
        caller: &Principal,
        max_capacity: u8,
        current_count: usize,
    ) -> Result<(), ServiceError> {
        let owner = self.get_owner().await?;
        if &owner != caller {
            warn!(%caller, "non-owner attempted to change capacity");
            return Err(ServiceError::Unauthorized("only the owner may change max_capacity".into()));
        }
        if max_capacity == 0 {
            return Err(ServiceError::Validation("max_capacity must be >= 1".into()));
        }
        if usize::from(max_capacity) < current_count {
            return Err(ServiceError::Conflict(format!(
                "max_capacity {max_capacity} is below current resident count {current_count}"
            )));
        }
        self.values
            .insert(MAX_CAPACITY_KEY.to_string(), ConfigValue::MaxCapacity(max_capacity))
            .await?;
        info!(max_capacity, "max capacity updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn principal(s: &str) -> Principal {
        Principal::new(s).unwrap()
    }

    #[tokio::test]
    async fn initialize_is_a_one_time_gate() -> Result<(), anyhow::Error> {
        let config = ConfigStore::open(Arc::new(MemoryStorage::new())).await?;
        assert!(!config.is_initialized().await);
        assert!(matches!(config.get_owner().await, Err(ServiceError::NotInitialized)));

        config.initialize(principal("owner-a"), DEFAULT_MAX_CAPACITY).await?;
        assert_eq!(config.get_owner().await?, principal("owner-a"));
        assert_eq!(config.get_max_capacity().await?, 50);

        let again = config.initialize(principal("owner-b"), 10).await;
        assert!(matches!(again, Err(ServiceError::AlreadyInitialized)));
        assert_eq!(config.get_owner().await?, principal("owner-a"));
        assert_eq!(config.get_max_capacity().await?, 50);
        Ok(())
    }

    #[tokio::test]
    async fn config_survives_reopen() -> Result<(), anyhow::Error> {
        let backend = MemoryStorage::new();
        let config = ConfigStore::open(Arc::new(backend.clone())).await?;
        config.initialize(principal("owner-a"), 20).await?;

        let reopened = ConfigStore::open(Arc::new(backend)).await?;
        assert!(reopened.is_initialized().await);
        assert_eq!(reopened.get_max_capacity().await?, 20);
        Ok(())
    }

    #[tokio::test]
    async fn only_owner_changes_capacity() -> Result<(), anyhow::Error> {
        let config = ConfigStore::open(Arc::new(MemoryStorage::new())).await?;
        config.initialize(principal("owner-a"), 50).await?;

        let denied = config.set_max_capacity(&principal("intruder"), 60, 0).await;
        assert!(matches!(denied, Err(ServiceError::Unauthorized(_))));

        let below = config.set_max_capacity(&principal("owner-a"), 2, 3).await;
        assert!(matches!(below, Err(ServiceError::Conflict(_))));

        config.set_max_capacity(&principal("owner-a"), 3, 3).await?;
        assert_eq!(config.get_max_capacity().await?, 3);
        Ok(())
    }
}
