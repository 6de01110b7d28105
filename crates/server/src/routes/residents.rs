use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use models::{Resident, ResidentInput};
use serde::Deserialize;

use crate::errors::JsonApiError;
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct MedicationBody {
    pub medication: String,
}

/// List residents in id order
pub async fn list_residents(State(state): State<ServerState>) -> Json<Vec<Resident>> {
    Json(state.home.residents.list_residents().await)
}

/// Admit a resident
pub async fn admit_resident(
    State(state): State<ServerState>,
    Json(input): Json<ResidentInput>,
) -> Result<(StatusCode, Json<Resident>), JsonApiError> {
    let resident = state.home.residents.admit_resident(input).await?;
    Ok((StatusCode::CREATED, Json(resident)))
}

pub async fn get_resident(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Resident>, JsonApiError> {
    Ok(Json(state.home.residents.get_resident(&id).await?))
}

/// Discharge a resident with no remaining appointments or allocations
pub async fn discharge_resident(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Resident>, JsonApiError> {
    Ok(Json(state.home.residents.discharge_resident(&id).await?))
}

pub async fn add_medication(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(body): Json<MedicationBody>,
) -> Result<StatusCode, JsonApiError> {
    state.home.residents.add_medication(&id, &body.medication).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_medication(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(body): Json<MedicationBody>,
) -> Result<StatusCode, JsonApiError> {
    state.home.residents.remove_medication(&id, &body.medication).await?;
    Ok(StatusCode::NO_CONTENT)
}
