use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use service::config_store::FacilityStatus;

use crate::errors::JsonApiError;
use crate::state::{Caller, ServerState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityBody {
    pub max_capacity: u8,
}

/// Owner, capacity and live resident count
pub async fn status(
    State(state): State<ServerState>,
) -> Result<Json<FacilityStatus>, JsonApiError> {
    Ok(Json(state.home.status().await?))
}

/// Owner-only capacity change
pub async fn set_max_capacity(
    State(state): State<ServerState>,
    Caller(caller): Caller,
    Json(body): Json<CapacityBody>,
) -> Result<StatusCode, JsonApiError> {
    state.home.set_max_capacity(&caller, body.max_capacity).await?;
    Ok(StatusCode::NO_CONTENT)
}
