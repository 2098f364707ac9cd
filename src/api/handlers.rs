//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{
    DistrictResponse, ErrorResponse, HourQuery, RangeQuery, SeriesRecord, StateResponse,
};
use crate::budget::compute_budget_used;
use crate::city::catalog::neighbours;
use crate::city::{DistrictId, UnknownDistrict};
use crate::recommend::{
    RecommendationInput, RecommendationOutput, build_recommendations, compare,
};
use crate::sim::{HORIZON_HOURS, drivers};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: String) -> ApiError {
    (status, Json(ErrorResponse { error }))
}

/// Resolves `?hour=` against the session default, rejecting hours past the horizon.
fn resolve_hour(state: &AppState, query: &HourQuery) -> Result<usize, ApiError> {
    let hour = query.hour.unwrap_or(state.selected_hour);
    if hour > HORIZON_HOURS {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("`hour` ({hour}) must be <= {HORIZON_HOURS}"),
        ));
    }
    Ok(hour)
}

/// Returns the scenario B summary, budget state and comparison against A.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let b = &state.result_b;
    Json(StateResponse {
        label_a: state.label_a.clone(),
        params: state.params_b,
        budget_used_m: compute_budget_used(&state.params_b, &state.overrides_b),
        interventions: state.overrides_b.count_interventions(),
        selected_hour: state.selected_hour,
        peak_hour: b.peak_hour,
        peak_load_mw: b.peak_load_mw,
        resilience_score: b.resilience_score,
        summary: b.summary.clone(),
        alerts: b.alerts.clone(),
        live: state.live_b.as_ref().map(|l| l.label.clone()),
        compare: compare(&state.result_a, b),
    })
}

/// Returns the city series, optionally filtered by hour range.
///
/// `GET /series` → 200 + `Vec<SeriesRecord>` JSON (73 records)
/// `GET /series?from=N&to=M` → filtered range (inclusive)
/// `GET /series?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(HORIZON_HOURS);

    if from > to {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("`from` ({from}) must be <= `to` ({to})"),
        ));
    }

    let records: Vec<SeriesRecord> = state
        .result_b
        .hours
        .iter()
        .filter(|&&t| t >= from && t <= to)
        .map(|&t| SeriesRecord::at(&state.result_b, t))
        .collect();

    Ok(Json(records))
}

/// Returns the risk feed, ranked actions and A/B comparison for an hour.
///
/// `GET /recommendations` → selected hour of the session
/// `GET /recommendations?hour=N` → 200 + `RecommendationOutput` JSON
/// `GET /recommendations?hour=99` → 400 + `ErrorResponse`
pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HourQuery>,
) -> Result<Json<RecommendationOutput>, ApiError> {
    let hour = resolve_hour(&state, &query)?;
    let output = build_recommendations(RecommendationInput {
        result_a: &state.result_a,
        result_b: &state.result_b,
        params_b: &state.params_b,
        overrides_b: &state.overrides_b,
        selected_hour: hour,
        live_b: state.live_b.as_ref(),
    });
    Ok(Json(output))
}

/// Returns one district's figures and load drivers at an hour.
///
/// `GET /districts/medical?hour=18` → 200 + `DistrictResponse` JSON
/// `GET /districts/atlantis` → 404 + `ErrorResponse`
pub async fn get_district(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<HourQuery>,
) -> Result<Json<DistrictResponse>, ApiError> {
    let id: DistrictId = id
        .parse()
        .map_err(|e: UnknownDistrict| api_error(StatusCode::NOT_FOUND, e.to_string()))?;
    let hour = resolve_hour(&state, &query)?;

    let series = state.result_b.district(id);
    Ok(Json(DistrictResponse {
        id,
        name: id.name(),
        hour,
        load_mw: series.load_mw[hour],
        capacity_mw: series.capacity_mw[hour],
        stress: series.stress[hour],
        probability: series.probability[hour],
        critical: id.is_critical(),
        neighbours: neighbours(id),
        drivers: drivers(&state.result_b, id, hour),
    }))
}
