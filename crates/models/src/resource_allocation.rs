use serde::{Deserialize, Serialize};

/// A physical or consumable resource assigned to a resident.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAllocation {
    pub id: String,
    pub resident_id: String,
    pub resource: String,
    pub quantity: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationInput {
    pub resident_id: String,
    pub resource: String,
    pub quantity: u8,
}
