//! HTTP front for the allocation engine.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::{
    engine::AllocationEngine, error::AllocationError, report::AllocationResult,
    request::AllocationRequest,
};

struct AppState {
    engine: Arc<AllocationEngine>,
    solve_timeout: Duration,
}

pub struct WebServerConfig {
    pub engine: AllocationEngine,
    pub host: String,
    pub port: u16,
    pub solve_timeout: Duration,
}

#[derive(Debug)]
pub enum ApiError {
    Allocation(AllocationError),
    /// The solve did not finish within the configured bound.
    Timeout(Duration),
    Worker(String),
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Allocation(err) => {
                let status = match &err {
                    AllocationError::Validation(_) | AllocationError::UnknownEnclosure(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    AllocationError::InfeasibleAllocation(_)
                    | AllocationError::InfeasibleRedistribution(_) => StatusCode::CONFLICT,
                    AllocationError::Solver(_) | AllocationError::Inconsistent(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.kind(), err.to_string())
            }
            ApiError::Timeout(limit) => (
                StatusCode::GATEWAY_TIMEOUT,
                "timeout",
                format!("solve exceeded {} ms", limit.as_millis()),
            ),
            ApiError::Worker(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "worker", msg),
        };
        (status, Json(ErrorBody { kind, message })).into_response()
    }
}

pub fn router(engine: AllocationEngine, solve_timeout: Duration) -> Router {
    let state = Arc::new(AppState {
        engine: Arc::new(engine),
        solve_timeout,
    });
    Router::new()
        .route("/health", get(health))
        .route("/api/facility", get(facility))
        .route("/optimize", post(optimize))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        engine,
        host,
        port,
        solve_timeout,
    } = config;

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "allocation service listening");

    axum::serve(listener, router(engine, solve_timeout))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
struct FacilityEnclosure {
    id: String,
    area: f64,
}

async fn facility(State(state): State<Arc<AppState>>) -> Json<Vec<FacilityEnclosure>> {
    Json(
        state
            .engine
            .facility()
            .enclosures()
            .map(|(id, area)| FacilityEnclosure {
                id: id.to_string(),
                area,
            })
            .collect(),
    )
}

async fn optimize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AllocationRequest>,
) -> Result<Json<AllocationResult>, ApiError> {
    let engine = Arc::clone(&state.engine);
    // The solver is synchronous; an expired solve keeps its blocking thread
    // until it returns.
    let task = tokio::task::spawn_blocking(move || engine.allocate(&request));

    let outcome = match tokio::time::timeout(state.solve_timeout, task).await {
        Err(_) => Err(ApiError::Timeout(state.solve_timeout)),
        Ok(Err(join)) => Err(ApiError::Worker(join.to_string())),
        Ok(Ok(result)) => result.map_err(ApiError::Allocation),
    };
    if let Err(err) = &outcome {
        warn!(?err, "allocation request failed");
    }
    outcome.map(Json)
}
