//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::city::{CityParams, DistrictId};
use crate::recommend::CompareSummary;
use crate::sim::{Alert, Driver, PeakSummary, SimulationResult};

/// Scenario B overview plus the comparison against A.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub label_a: String,
    pub params: CityParams,
    pub budget_used_m: f64,
    pub interventions: usize,
    pub selected_hour: usize,
    pub peak_hour: usize,
    pub peak_load_mw: f64,
    pub resilience_score: u32,
    pub summary: PeakSummary,
    pub alerts: Vec<Alert>,
    /// Label of the live curves in use, if any.
    pub live: Option<String>,
    pub compare: CompareSummary,
}

/// One hour of the city series.
#[derive(Debug, Serialize)]
pub struct SeriesRecord {
    pub hour: usize,
    pub load_mw: f64,
    pub capacity_mw: f64,
    pub solar_mw: f64,
    pub carbon_intensity: f64,
    pub cost_index: f64,
}

impl SeriesRecord {
    pub fn at(result: &SimulationResult, hour: usize) -> Self {
        let c = &result.city;
        Self {
            hour,
            load_mw: c.load_mw[hour],
            capacity_mw: c.capacity_mw[hour],
            solar_mw: c.solar_mw[hour],
            carbon_intensity: c.carbon_intensity[hour],
            cost_index: c.cost_index[hour],
        }
    }
}

/// One district at one hour.
#[derive(Debug, Serialize)]
pub struct DistrictResponse {
    pub id: DistrictId,
    pub name: &'static str,
    pub hour: usize,
    pub load_mw: f64,
    pub capacity_mw: f64,
    pub stress: f64,
    pub probability: f64,
    pub critical: bool,
    pub neighbours: Vec<DistrictId>,
    pub drivers: Vec<Driver>,
}

/// Optional range query parameters for the series endpoint.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    /// Start hour (inclusive).
    pub from: Option<usize>,
    /// End hour (inclusive).
    pub to: Option<usize>,
}

/// Optional hour selector.
#[derive(Debug, Deserialize)]
pub struct HourQuery {
    pub hour: Option<usize>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
