use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use models::{Appointment, AppointmentInput};

use crate::errors::JsonApiError;
use crate::state::ServerState;

pub async fn list_appointments(State(state): State<ServerState>) -> Json<Vec<Appointment>> {
    Json(state.home.appointments.list_appointments(None).await)
}

pub async fn list_for_resident(
    State(state): State<ServerState>,
    Path(resident_id): Path<String>,
) -> Result<Json<Vec<Appointment>>, JsonApiError> {
    // 404 for unknown residents rather than an empty list
    state.home.residents.get_resident(&resident_id).await?;
    Ok(Json(state.home.appointments.list_appointments(Some(&resident_id)).await))
}

pub async fn schedule_appointment(
    State(state): State<ServerState>,
    Json(input): Json<AppointmentInput>,
) -> Result<(StatusCode, Json<Appointment>), JsonApiError> {
    let appointment = state.home.appointments.schedule_appointment(input).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn get_appointment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, JsonApiError> {
    Ok(Json(state.home.appointments.get_appointment(&id).await?))
}

pub async fn cancel_appointment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    state.home.appointments.cancel_appointment(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
