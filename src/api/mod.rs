//! Read-only REST API over a finished session snapshot.
//!
//! Endpoints:
//! - `/state`: scenario B summary, budget and the A/B comparison
//! - `/series`: city series with optional hour range filtering
//! - `/recommendations`: risk feed and ranked actions for an hour
//! - `/districts/{id}`: one district's figures and load drivers at an hour

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::city::{CityParams, DistrictOverrides};
use crate::live::LiveInputs;
use crate::session::Session;
use crate::sim::SimulationResult;

/// Immutable application state shared across all request handlers.
///
/// Captured once from a [`Session`] and wrapped in `Arc`; handlers only
/// read it, so no locks are needed.
pub struct AppState {
    /// Label of the pinned comparison scenario.
    pub label_a: String,
    pub result_a: Arc<SimulationResult>,
    pub result_b: Arc<SimulationResult>,
    pub params_b: CityParams,
    pub overrides_b: DistrictOverrides,
    pub live_b: Option<LiveInputs>,
    /// Default hour for endpoints queried without `?hour=`.
    pub selected_hour: usize,
}

impl AppState {
    /// Snapshots the session's A and B scenarios.
    pub fn from_session(session: &mut Session) -> Self {
        Self {
            label_a: session.pinned().label.clone(),
            result_a: session.result_a(),
            result_b: session.result_b(),
            params_b: *session.params(),
            overrides_b: *session.overrides(),
            live_b: session.live().cloned(),
            selected_hour: session.selected_hour(),
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/series", get(handlers::get_series))
        .route("/recommendations", get(handlers::get_recommendations))
        .route("/districts/{id}", get(handlers::get_district))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
