use std::{net::SocketAddr, path::PathBuf};

use axum::Router;
use configs::{AppConfig, StorageBackend};
use dotenvy::dotenv;
use models::Principal;
use service::{storage::StorageLocation, CareHome};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn load_bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Open the stores and record the owner on first start.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let location = match cfg.storage.backend {
        StorageBackend::File => {
            common::env::ensure_data_dir(&cfg.storage.data_dir).await?;
            StorageLocation::Dir(PathBuf::from(&cfg.storage.data_dir))
        }
        StorageBackend::Memory => {
            warn!("memory storage backend selected; records will not survive a restart");
            StorageLocation::memory()
        }
    };
    let home = CareHome::open(&location).await?;

    if cfg.facility.uses_anonymous_owner() {
        warn!(
            owner = %cfg.facility.owner,
            "no facility owner configured; any caller presenting this principal can change capacity"
        );
    }
    let owner = Principal::new(cfg.facility.owner.clone())
        .map_err(|e| StartupError::InvalidConfig(format!("facility.owner: {e}")))?;
    if home.ensure_initialized(owner, cfg.facility.max_capacity).await? {
        info!(max_capacity = cfg.facility.max_capacity, "facility initialized on first start");
    }
    Ok(ServerState::new(home))
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    common::utils::logging::init_logging_from_env();

    let cfg = AppConfig::load_or_default()?;
    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr = load_bind_addr(&cfg)?;
    info!(%addr, "starting care home server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
