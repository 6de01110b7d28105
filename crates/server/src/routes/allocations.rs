use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use models::{AllocationInput, ResourceAllocation};
use serde::Serialize;

use crate::errors::JsonApiError;
use crate::state::ServerState;

#[derive(Debug, Serialize)]
pub struct AllocationCreated {
    pub id: String,
}

pub async fn list_allocations(State(state): State<ServerState>) -> Json<Vec<ResourceAllocation>> {
    Json(state.home.allocations.list_allocations(None).await)
}

pub async fn list_for_resident(
    State(state): State<ServerState>,
    Path(resident_id): Path<String>,
) -> Result<Json<Vec<ResourceAllocation>>, JsonApiError> {
    state.home.residents.get_resident(&resident_id).await?;
    Ok(Json(state.home.allocations.list_allocations(Some(&resident_id)).await))
}

/// Allocate a resource; responds with the new allocation id
pub async fn allocate_resource(
    State(state): State<ServerState>,
    Json(input): Json<AllocationInput>,
) -> Result<(StatusCode, Json<AllocationCreated>), JsonApiError> {
    let id = state
        .home
        .allocations
        .allocate_resource(&input.resident_id, &input.resource, input.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(AllocationCreated { id })))
}

pub async fn get_allocation(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ResourceAllocation>, JsonApiError> {
    Ok(Json(state.home.allocations.get_allocation(&id).await?))
}

pub async fn deallocate_resource(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    state.home.allocations.deallocate_resource(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
