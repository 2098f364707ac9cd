//! Coercion of loosely-shaped operator report rows into typed records, plus
//! the synthetic fallback series used when a feed returns nothing.
//!
//! Reports arrive either as a bare array of rows or wrapped in an object
//! under one of a handful of keys; field names vary between report
//! versions, so every field is looked up through an alias list.

use std::f64::consts::PI;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde_json::{Map, Value};

use super::types::{BasicSnapshot, ForecastPoint, OutagePoint, PricePoint, RealtimeSnapshot};
use crate::sim::SERIES_LEN;

type Row = Map<String, Value>;

const NESTED_ROW_KEYS: [&str; 4] = ["data", "items", "value", "results"];
const TIME_KEYS: [&str; 6] = [
    "hourISO",
    "timestampISO",
    "timestamp",
    "intervalISO",
    "deliveryDate",
    "datetime",
];
const FORECAST_KEYS: [&str; 5] = [
    "demandMW",
    "forecastLoadMW",
    "loadForecastMW",
    "systemDemandMW",
    "value",
];
const OUTAGE_KEYS: [&str; 4] = ["outagedMW", "outageMW", "capacityOutMW", "value"];
const PRICE_KEYS: [&str; 4] = ["price", "lmp", "spp", "value"];
const SETTLEMENT_KEYS: [&str; 3] = ["settlementPoint", "pointName", "hub"];
const ZONE_KEYS: [&str; 3] = ["weatherZone", "zone", "loadZone"];

/// Load zone the outage and price feeds are filtered to.
pub const LOAD_ZONE: &str = "LZ_SOUTH";
/// Settlement points requested from the price feed.
pub const SETTLEMENT_POINTS: [&str; 2] = ["LZ_SOUTH", "HB_SOUTH"];
/// Minimum number of zone-matched forecast rows before the zone filter is used.
const ZONE_FILTER_MIN_ROWS: usize = 40;

/// Rows of a report payload: the array itself, or the first array found
/// under `data`, `items`, `value` or `results`. Non-object entries are
/// skipped.
pub fn rows_of(payload: &Value) -> Vec<&Row> {
    let array = match payload {
        Value::Array(items) => Some(items),
        Value::Object(obj) => NESTED_ROW_KEYS
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_array)),
        _ => None,
    };
    array
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

/// First alias present with a non-null value.
fn first_present<'a>(row: &'a Row, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find(|v| !v.is_null())
}

/// Numeric value of a JSON scalar, or `fallback` when it is missing or not
/// a finite number. Numeric strings are accepted.
pub fn number_or(value: Option<&Value>, fallback: f64) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    n.filter(|v| v.is_finite()).unwrap_or(fallback)
}

/// First alias whose coerced value is finite and nonzero.
fn first_nonzero(row: &Row, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .map(|k| number_or(row.get(*k), 0.0))
        .find(|v| *v != 0.0)
}

fn string_field(row: &Row, keys: &[&str]) -> String {
    match first_present(row, keys) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Parses RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or a bare
/// date (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Row timestamp from the first time alias, or `now` when absent or
/// unparseable.
pub fn extract_time(row: &Row, now: DateTime<Utc>) -> DateTime<Utc> {
    first_present(row, &TIME_KEYS)
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
        .unwrap_or(now)
}

/// Latest realtime conditions, or `None` when the last row has no positive
/// demand. Missing capacity defaults to 1.2 x demand.
pub fn realtime_snapshot(payload: &Value, now: DateTime<Utc>) -> Option<RealtimeSnapshot> {
    let rows = rows_of(payload);
    let last = rows.last()?;
    let demand = number_or(
        first_present(last, &["systemDemandMW", "demandMW", "totalLoad", "load"]),
        0.0,
    );
    if demand <= 0.0 {
        return None;
    }
    let capacity = number_or(
        first_present(last, &["systemCapacityMW", "availableCapacityMW", "capacityMW"]),
        demand * 1.2,
    );
    Some(RealtimeSnapshot {
        timestamp: extract_time(last, now),
        system_demand_mw: demand,
        system_capacity_mw: if capacity > 0.0 { capacity } else { demand * 1.2 },
        wind_mw: number_or(first_present(last, &["windMW", "windGenMW", "wind"]), 0.0),
        solar_mw: number_or(first_present(last, &["solarMW", "pvMW", "solar"]), 0.0),
    })
}

/// Forecast points with positive demand, at most 73.
///
/// When at least 40 rows carry a south/Austin weather zone only those rows
/// are kept.
pub fn forecast_points(payload: &Value, now: DateTime<Utc>) -> Vec<ForecastPoint> {
    let mapped: Vec<(ForecastPoint, String)> = rows_of(payload)
        .into_iter()
        .map(|row| {
            let point = ForecastPoint {
                timestamp: extract_time(row, now),
                demand_mw: number_or(first_present(row, &FORECAST_KEYS), 0.0),
            };
            (point, string_field(row, &ZONE_KEYS).to_lowercase())
        })
        .filter(|(p, _)| p.demand_mw > 0.0)
        .collect();

    let zoned: Vec<ForecastPoint> = mapped
        .iter()
        .filter(|(_, zone)| zone.contains("south") || zone.contains("austin"))
        .map(|(p, _)| *p)
        .collect();
    let points = if zoned.len() >= ZONE_FILTER_MIN_ROWS {
        zoned
    } else {
        mapped.into_iter().map(|(p, _)| p).collect()
    };
    points.into_iter().take(SERIES_LEN).collect()
}

/// Outage points for `load_zone` (rows without a zone are kept), at most 73.
pub fn outage_points(payload: &Value, load_zone: &str, now: DateTime<Utc>) -> Vec<OutagePoint> {
    rows_of(payload)
        .into_iter()
        .filter(|row| {
            let zone = string_field(row, &["loadZone", "zone"]);
            zone.is_empty() || zone.eq_ignore_ascii_case(load_zone)
        })
        .map(|row| OutagePoint {
            timestamp: extract_time(row, now),
            outaged_mw: number_or(first_present(row, &OUTAGE_KEYS), 0.0),
        })
        .filter(|p| p.outaged_mw >= 0.0)
        .take(SERIES_LEN)
        .collect()
}

/// Price points for the requested settlement points.
pub fn price_points(payload: &Value, points: &[&str], now: DateTime<Utc>) -> Vec<PricePoint> {
    rows_of(payload)
        .into_iter()
        .filter_map(|row| {
            let settlement_point = string_field(row, &SETTLEMENT_KEYS);
            if !points.contains(&settlement_point.as_str()) {
                return None;
            }
            let price = number_or(first_present(row, &PRICE_KEYS), f64::NAN);
            price.is_finite().then(|| PricePoint {
                timestamp: extract_time(row, now),
                settlement_point,
                price,
            })
        })
        .collect()
}

/// Single-row seed snapshot from the latest row, falling back to
/// [`fallback_basic`] when no positive demand is found. Each field tries
/// its aliases in turn until one is nonzero.
pub fn basic_snapshot(payload: &Value, now: DateTime<Utc>) -> BasicSnapshot {
    let last = match payload {
        Value::Object(obj) if rows_of(payload).is_empty() => Some(obj),
        _ => rows_of(payload).last().copied(),
    };
    let Some(row) = last else {
        return fallback_basic(now);
    };
    let Some(demand) = first_nonzero(row, &["systemDemandMW", "demandMW", "totalLoadMW", "loadMW"])
    else {
        return fallback_basic(now);
    };
    let wind = first_nonzero(row, &["windMW", "windGenerationMW", "wind"]).unwrap_or(0.0);
    let solar = first_nonzero(row, &["solarMW", "pvMW", "solarGenerationMW"]).unwrap_or(0.0);
    BasicSnapshot {
        timestamp: first_present(row, &["timestampISO", "timestamp", "deliveryDate", "datetime"])
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or(now),
        system_demand_mw: demand,
        wind_mw: wind,
        solar_mw: solar,
        renewables_share: Some((wind + solar) / demand.max(1.0)),
        ok: true,
    }
}

pub fn fallback_realtime(now: DateTime<Utc>) -> RealtimeSnapshot {
    RealtimeSnapshot {
        timestamp: now,
        system_demand_mw: 46_800.0,
        system_capacity_mw: 61_200.0,
        wind_mw: 12_800.0,
        solar_mw: 5_400.0,
    }
}

/// 73 hourly points of a synthetic diurnal forecast starting at `now`.
pub fn fallback_forecast(now: DateTime<Utc>) -> Vec<ForecastPoint> {
    let start_hour = now.hour() as usize;
    (0..SERIES_LEN)
        .map(|i| {
            let d = ((i + start_hour) % 24) as f64 / 24.0;
            let demand = 46_000.0
                * (0.9
                    + 0.17 * (2.0 * PI * (d - 0.2)).sin()
                    + 0.09 * (-(d - 0.78).powi(2) / (2.0 * 0.08_f64.powi(2))).exp());
            ForecastPoint {
                timestamp: now + Duration::hours(i as i64),
                demand_mw: demand.max(26_000.0),
            }
        })
        .collect()
}

pub fn fallback_outages(now: DateTime<Utc>) -> Vec<OutagePoint> {
    (0..SERIES_LEN)
        .map(|i| OutagePoint {
            timestamp: now + Duration::hours(i as i64),
            outaged_mw: 700.0 + 180.0 * (i as f64 / 24.0 * 2.0 * PI).sin(),
        })
        .collect()
}

pub fn fallback_prices(now: DateTime<Utc>) -> Vec<PricePoint> {
    SETTLEMENT_POINTS
        .iter()
        .map(|p| PricePoint {
            timestamp: now,
            settlement_point: (*p).to_string(),
            price: if *p == LOAD_ZONE { 34.0 } else { 29.0 },
        })
        .collect()
}

pub fn fallback_basic(now: DateTime<Utc>) -> BasicSnapshot {
    BasicSnapshot {
        timestamp: now,
        system_demand_mw: 72_000.0,
        wind_mw: 18_000.0,
        solar_mw: 9_000.0,
        renewables_share: None,
        ok: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 6, 0, 0).unwrap()
    }

    #[test]
    fn rows_of_accepts_array_and_wrappers() {
        assert_eq!(rows_of(&json!([{"a": 1}, {"a": 2}])).len(), 2);
        assert_eq!(rows_of(&json!({"items": [{"a": 1}]})).len(), 1);
        assert_eq!(rows_of(&json!({"results": [{"a": 1}, 3]})).len(), 1);
        assert!(rows_of(&json!({"other": [{"a": 1}]})).is_empty());
        assert!(rows_of(&json!(42)).is_empty());
    }

    #[test]
    fn number_or_coerces_strings() {
        assert_eq!(number_or(Some(&json!("12.5")), 0.0), 12.5);
        assert_eq!(number_or(Some(&json!(7)), 0.0), 7.0);
        assert_eq!(number_or(Some(&json!("n/a")), 3.0), 3.0);
        assert_eq!(number_or(None, 3.0), 3.0);
    }

    #[test]
    fn aliases_resolve_in_order() {
        let payload = json!({"data": [
            {"hourISO": "2026-07-01T06:00:00Z", "forecastLoadMW": "41000"},
            {"timestamp": "2026-07-01T07:00:00", "value": 42000},
            {"deliveryDate": "2026-07-01", "demandMW": 0},
        ]});
        let points = forecast_points(&payload, now());
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].demand_mw, 41_000.0);
        assert_eq!(points[1].timestamp, Utc.with_ymd_and_hms(2026, 7, 1, 7, 0, 0).unwrap());
    }

    #[test]
    fn missing_time_uses_now() {
        let payload = json!([{"outageMW": 500}]);
        let points = outage_points(&payload, LOAD_ZONE, now());
        assert_eq!(points[0].timestamp, now());
    }

    #[test]
    fn outages_filter_by_zone() {
        let payload = json!([
            {"loadZone": "lz_south", "outagedMW": 10},
            {"loadZone": "LZ_NORTH", "outagedMW": 20},
            {"outagedMW": 30},
        ]);
        let mw: Vec<f64> = outage_points(&payload, LOAD_ZONE, now())
            .iter()
            .map(|p| p.outaged_mw)
            .collect();
        assert_eq!(mw, vec![10.0, 30.0]);
    }

    #[test]
    fn prices_keep_requested_points() {
        let payload = json!([
            {"pointName": "LZ_SOUTH", "lmp": 41.2},
            {"hub": "HB_WEST", "price": 12},
            {"settlementPoint": "HB_SOUTH", "spp": "bad"},
        ]);
        let prices = price_points(&payload, &SETTLEMENT_POINTS, now());
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].price, 41.2);
    }

    #[test]
    fn realtime_needs_positive_demand() {
        assert!(realtime_snapshot(&json!([{"demandMW": 0}]), now()).is_none());
        let snap = realtime_snapshot(&json!([{"demandMW": 50000, "wind": 9000}]), now()).unwrap();
        assert_eq!(snap.system_capacity_mw, 60_000.0);
        assert_eq!(snap.wind_mw, 9_000.0);
    }

    #[test]
    fn basic_snapshot_skips_zero_aliases() {
        let snap = basic_snapshot(&json!({"systemDemandMW": 0, "loadMW": 60000, "pvMW": 3000}), now());
        assert!(snap.ok);
        assert_eq!(snap.system_demand_mw, 60_000.0);
        assert_eq!(snap.solar_mw, 3_000.0);
        assert_eq!(snap.renewables_share, Some(0.05));

        let fallback = basic_snapshot(&json!([]), now());
        assert!(!fallback.ok);
        assert_eq!(fallback.system_demand_mw, 72_000.0);
    }

    #[test]
    fn fallback_series_cover_horizon() {
        let forecast = fallback_forecast(now());
        assert_eq!(forecast.len(), SERIES_LEN);
        assert!(forecast.iter().all(|p| p.demand_mw >= 26_000.0));
        assert_eq!(forecast[72].timestamp, now() + Duration::hours(72));
        assert_eq!(fallback_outages(now()).len(), SERIES_LEN);
        assert_eq!(fallback_outages(now())[0].outaged_mw, 700.0);
        assert_eq!(fallback_prices(now())[0].price, 34.0);
    }
}
