//! Record shapes handed over by the grid-operator fetch layer, and the
//! substituted curves derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest system-wide operating conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealtimeSnapshot {
    pub timestamp: DateTime<Utc>,
    pub system_demand_mw: f64,
    pub system_capacity_mw: f64,
    pub wind_mw: f64,
    pub solar_mw: f64,
}

/// One hourly point of the system load forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub demand_mw: f64,
}

/// Generation capacity out of service at one hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutagePoint {
    pub timestamp: DateTime<Utc>,
    pub outaged_mw: f64,
}

/// Settlement point price for one interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub settlement_point: String,
    pub price: f64,
}

/// Everything one fetch cycle produced. Each feed may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveBundle {
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub realtime: Option<RealtimeSnapshot>,
    #[serde(default)]
    pub forecast: Option<Vec<ForecastPoint>>,
    #[serde(default)]
    pub outages: Option<Vec<OutagePoint>>,
    #[serde(default)]
    pub prices: Option<Vec<PricePoint>>,
    /// Per-feed problems encountered while assembling the bundle.
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Single-row system snapshot used to seed live mode before a full bundle
/// is available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicSnapshot {
    pub timestamp: DateTime<Utc>,
    pub system_demand_mw: f64,
    pub wind_mw: f64,
    pub solar_mw: f64,
    /// `(wind + solar) / demand` when the feed reports it.
    #[serde(default)]
    pub renewables_share: Option<f64>,
    /// `false` when the snapshot is the built-in fallback.
    #[serde(default)]
    pub ok: bool,
}

/// City curves substituted into a simulation run. Every series holds
/// exactly 73 points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveInputs {
    pub label: String,
    pub fetched_at: DateTime<Utc>,
    pub demand_mw: Vec<f64>,
    pub capacity_mw: Vec<f64>,
    pub wind_mw: Vec<f64>,
    pub solar_mw: Vec<f64>,
    pub carbon_intensity: Vec<f64>,
    pub cost_index: Vec<f64>,
}
