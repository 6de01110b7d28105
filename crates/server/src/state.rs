use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use models::Principal;
use service::CareHome;

use crate::errors::JsonApiError;

/// Header carrying the authenticated caller, set by the fronting auth layer.
pub const PRINCIPAL_HEADER: &str = "x-principal";

#[derive(Clone)]
pub struct ServerState {
    pub home: Arc<CareHome>,
}

impl ServerState {
    pub fn new(home: CareHome) -> Self {
        Self { home: Arc::new(home) }
    }
}

/// Caller identity taken from the `x-principal` header.
#[derive(Debug, Clone)]
pub struct Caller(pub Principal);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(PRINCIPAL_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        Principal::new(raw)
            .map(Caller)
            .map_err(|_| {
                JsonApiError::unauthorized(format!("missing or empty {PRINCIPAL_HEADER} header"))
            })
    }
}
