pub mod residents;
pub mod appointments;
pub mod allocations;
pub mod facility;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::state::ServerState;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let facility_routes = Router::new()
        .route("/facility", get(facility::status))
        .route("/facility/capacity", put(facility::set_max_capacity));

    let resident_routes = Router::new()
        .route("/residents", get(residents::list_residents).post(residents::admit_resident))
        .route("/residents/:id", get(residents::get_resident).delete(residents::discharge_resident))
        .route(
            "/residents/:id/medications",
            post(residents::add_medication).delete(residents::remove_medication),
        )
        .route("/residents/:id/appointments", get(appointments::list_for_resident))
        .route("/residents/:id/allocations", get(allocations::list_for_resident));

    let appointment_routes = Router::new()
        .route(
            "/appointments",
            get(appointments::list_appointments).post(appointments::schedule_appointment),
        )
        .route(
            "/appointments/:id",
            get(appointments::get_appointment).delete(appointments::cancel_appointment),
        );

    let allocation_routes = Router::new()
        .route(
            "/allocations",
            get(allocations::list_allocations).post(allocations::allocate_resource),
        )
        .route(
            "/allocations/:id",
            get(allocations::get_allocation).delete(allocations::deallocate_resource),
        );

    Router::new()
        .route("/health", get(health))
        .merge(facility_routes)
        .merge(resident_routes)
        .merge(appointment_routes)
        .merge(allocation_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx at ERROR
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
