//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};

use citygrid_twin::city::{CityParams, DistrictOverrides};
use citygrid_twin::config::ScenarioConfig;
use citygrid_twin::session::Session;

/// Fixed fetch time for live-feed fixtures (2026-07-14 00:00 UTC).
pub fn fetched_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 14, 0, 0, 0).single().unwrap_or_default()
}

/// Parameters of a built-in preset.
pub fn preset_params(name: &str) -> CityParams {
    ScenarioConfig::from_preset(name)
        .map(|cfg| cfg.params)
        .unwrap_or_default()
}

/// Storm stress parameters: storm and stadium event on, nothing else.
pub fn storm_params() -> CityParams {
    preset_params("storm_stress")
}

/// Session with the baseline pinned as A and `preset` loaded as B.
pub fn session_with(preset: &str) -> Session {
    let mut session = Session::new();
    assert!(session.apply_preset(preset).is_ok(), "preset {preset} should exist");
    session
}

/// No district interventions.
pub fn no_overrides() -> DistrictOverrides {
    DistrictOverrides::new()
}

/// Hourly forecast rows wrapped in a `data` envelope, starting at
/// [`fetched_at`], with a daily swing around 60 GW.
pub fn forecast_payload(hours: usize) -> Value {
    let rows: Vec<Value> = (0..hours)
        .map(|h| {
            let ts = fetched_at() + Duration::hours(h as i64);
            let swing = ((h % 24) as f64 / 24.0 * std::f64::consts::TAU).sin();
            json!({
                "timestampISO": ts.to_rfc3339(),
                "forecastLoadMW": 60_000.0 + 8_000.0 * swing,
                "weatherZone": "North",
            })
        })
        .collect();
    json!({ "data": rows })
}

/// A complete raw feed bundle as saved by the fetch layer.
pub fn raw_feeds_json() -> Value {
    json!({
        "fetched_at": fetched_at().to_rfc3339(),
        "realtime": [{
            "timestamp": fetched_at().to_rfc3339(),
            "systemDemandMW": 58_000.0,
            "availableCapacityMW": 70_000.0,
            "windMW": 14_000.0,
            "solarMW": 6_000.0,
        }],
        "forecast": forecast_payload(73),
        "outages": { "items": [
            { "timestamp": fetched_at().to_rfc3339(), "loadZone": "LZ_SOUTH", "outagedMW": 900.0 },
            { "timestamp": (fetched_at() + Duration::hours(30)).to_rfc3339(), "loadZone": "LZ_SOUTH", "outagedMW": 2_400.0 },
        ]},
        "prices": [
            { "timestamp": fetched_at().to_rfc3339(), "settlementPoint": "LZ_SOUTH", "price": 28.0 },
            { "timestamp": (fetched_at() + Duration::hours(18)).to_rfc3339(), "settlementPoint": "LZ_SOUTH", "price": 140.0 },
            { "timestamp": (fetched_at() + Duration::hours(40)).to_rfc3339(), "settlementPoint": "LZ_SOUTH", "price": 35.0 },
        ],
    })
}
