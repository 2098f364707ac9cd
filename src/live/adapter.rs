//! Conversion of a fetched [`LiveBundle`] into 73-point [`LiveInputs`].

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::normalize::{
    LOAD_ZONE, SETTLEMENT_POINTS, basic_snapshot, fallback_forecast, fallback_outages, fallback_prices,
    fallback_realtime, forecast_points, outage_points, price_points, realtime_snapshot,
};
use super::types::{BasicSnapshot, LiveBundle, LiveInputs};
use crate::sim::curves::{clamp, day_frac};
use crate::sim::{SERIES_LEN, SimulationResult};

/// Label of inputs built from a full bundle.
pub const BUNDLE_LABEL: &str = "Live system (proxy: LZ_SOUTH)";
/// Label of inputs seeded from a single snapshot.
pub const SEED_LABEL: &str = "Live system seed";

const DEFAULT_DEMAND_MW: f64 = 45_000.0;
const DEFAULT_PRICE: f64 = 30.0;
const OUTAGE_CAPACITY_FACTOR: f64 = 0.18;
const SECONDS_PER_HOUR: i64 = 3600;

/// Errors loading a bundle file.
#[derive(Debug, thiserror::Error)]
pub enum LiveBundleError {
    #[error("failed to read live bundle {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse live bundle {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw per-feed report payloads, as saved from the fetch layer.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawFeeds {
    pub fetched_at: Option<DateTime<Utc>>,
    pub realtime: Option<Value>,
    pub forecast: Option<Value>,
    pub outages: Option<Value>,
    pub prices: Option<Value>,
}

/// Normalizes raw payloads into a bundle. A feed that is absent or yields
/// no usable rows is replaced with its synthetic fallback and noted in
/// `errors`.
pub fn assemble_bundle(raw: &RawFeeds, now: DateTime<Utc>) -> LiveBundle {
    let fetched_at = raw.fetched_at.unwrap_or(now);
    let mut errors = Vec::new();

    let realtime = raw
        .realtime
        .as_ref()
        .and_then(|v| realtime_snapshot(v, fetched_at))
        .unwrap_or_else(|| {
            errors.push("realtime: no usable rows, using fallback".to_string());
            fallback_realtime(fetched_at)
        });

    let mut forecast = raw
        .forecast
        .as_ref()
        .map(|v| forecast_points(v, fetched_at))
        .unwrap_or_default();
    if forecast.is_empty() {
        errors.push("forecast: no usable rows, using fallback".to_string());
        forecast = fallback_forecast(fetched_at);
    }

    let mut outages = raw
        .outages
        .as_ref()
        .map(|v| outage_points(v, LOAD_ZONE, fetched_at))
        .unwrap_or_default();
    if outages.is_empty() {
        errors.push("outages: no usable rows, using fallback".to_string());
        outages = fallback_outages(fetched_at);
    }

    let mut prices = raw
        .prices
        .as_ref()
        .map(|v| price_points(v, &SETTLEMENT_POINTS, fetched_at))
        .unwrap_or_default();
    if prices.is_empty() {
        errors.push("prices: no usable rows, using fallback".to_string());
        prices = fallback_prices(fetched_at);
    }

    for e in &errors {
        warn!("{e}");
    }

    LiveBundle {
        fetched_at,
        realtime: Some(realtime),
        forecast: Some(forecast),
        outages: Some(outages),
        prices: Some(prices),
        errors,
    }
}

/// Reads a JSON file of [`RawFeeds`] and assembles a bundle from it.
pub fn load_bundle(path: &Path, now: DateTime<Utc>) -> Result<LiveBundle, LiveBundleError> {
    let text = fs::read_to_string(path).map_err(|source| LiveBundleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawFeeds = serde_json::from_str(&text).map_err(|source| LiveBundleError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(assemble_bundle(&raw, now))
}

/// Reads a single-row seed snapshot from a JSON file.
///
/// Returns `Ok(None)` when the payload has no positive demand; live mode
/// should then be dropped rather than seeded from the fallback snapshot.
pub fn load_seed(path: &Path, now: DateTime<Utc>) -> Result<Option<BasicSnapshot>, LiveBundleError> {
    let text = fs::read_to_string(path).map_err(|source| LiveBundleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let payload: Value = serde_json::from_str(&text).map_err(|source| LiveBundleError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let seed = basic_snapshot(&payload, now);
    if !seed.ok {
        warn!(path = %path.display(), "seed payload unusable, staying synthetic");
        return Ok(None);
    }
    Ok(Some(seed))
}

fn hour_slot(ts: DateTime<Utc>) -> i64 {
    ts.timestamp().div_euclid(SECONDS_PER_HOUR)
}

/// Buckets points into 73 hourly slots from `start`, averaging duplicates.
/// Empty slots are `None`.
fn hourly_curve(
    points: impl IntoIterator<Item = (DateTime<Utc>, f64)>,
    start: DateTime<Utc>,
) -> Vec<Option<f64>> {
    let mut by_slot: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for (ts, v) in points {
        let entry = by_slot.entry(hour_slot(ts)).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }
    let start_slot = hour_slot(start);
    (0..SERIES_LEN as i64)
        .map(|i| by_slot.get(&(start_slot + i)).map(|(sum, n)| sum / *n as f64))
        .collect()
}

/// Forward-fills gaps; a leading gap takes `fallback`.
fn fill_gaps(curve: &[Option<f64>], fallback: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(curve.len());
    let mut last = fallback;
    for v in curve {
        last = v.unwrap_or(last);
        out.push(last);
    }
    out
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Derives substituted city curves from a bundle, scaled so the external
/// demand peak matches the synthetic city peak.
///
/// Returns `None` when the bundle carries no forecast points.
pub fn to_live_inputs(bundle: &LiveBundle, synthetic: &SimulationResult) -> Option<LiveInputs> {
    let forecast = bundle.forecast.as_deref().filter(|f| !f.is_empty())?;
    let start = forecast[0].timestamp;

    let demand_fallback = bundle
        .realtime
        .map(|r| r.system_demand_mw)
        .unwrap_or(DEFAULT_DEMAND_MW);
    let system_demand = fill_gaps(
        &hourly_curve(forecast.iter().map(|p| (p.timestamp, p.demand_mw)), start),
        demand_fallback,
    );

    let synthetic_peak = max_of(&synthetic.city.load_mw);
    let scale = synthetic_peak / max_of(&system_demand).max(1.0);
    let demand_mw: Vec<f64> = system_demand.iter().map(|v| (v * scale).max(1.0)).collect();

    let outaged = match bundle.outages.as_deref() {
        Some(points) if !points.is_empty() => fill_gaps(
            &hourly_curve(points.iter().map(|p| (p.timestamp, p.outaged_mw)), start),
            0.0,
        ),
        _ => vec![0.0; SERIES_LEN],
    };

    let realtime_cap = bundle.realtime.map(|r| r.system_capacity_mw).unwrap_or(0.0);
    let base_capacity = if realtime_cap > 0.0 {
        realtime_cap * scale * 1.02
    } else {
        max_of(&demand_mw) / 0.78
    };
    let capacity_mw: Vec<f64> = outaged
        .iter()
        .map(|o| (base_capacity - o * scale * OUTAGE_CAPACITY_FACTOR).max(1.0))
        .collect();

    let wind_now = bundle.realtime.map(|r| r.wind_mw).unwrap_or(0.0);
    let solar_now = bundle.realtime.map(|r| r.solar_mw).unwrap_or(0.0);
    let wind_mw = vec![wind_now * scale; SERIES_LEN];
    let solar_mw: Vec<f64> = (0..SERIES_LEN)
        .map(|i| {
            let shaped = (PI * day_frac(i)).sin().max(0.0).powf(1.4);
            (solar_now * scale * (0.4 + shaped)).max(0.0)
        })
        .collect();

    let carbon_intensity: Vec<f64> = demand_mw
        .iter()
        .enumerate()
        .map(|(i, load)| {
            let share = (solar_mw[i] + wind_mw[i]) / load.max(1.0);
            clamp(380.0 - 140.0 * share, 180.0, 520.0)
        })
        .collect();

    let prices = bundle
        .prices
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|points| {
            fill_gaps(
                &hourly_curve(
                    points
                        .iter()
                        .filter(|p| p.settlement_point == LOAD_ZONE)
                        .map(|p| (p.timestamp, p.price)),
                    start,
                ),
                DEFAULT_PRICE,
            )
        });
    let cost_index: Vec<f64> = match &prices {
        Some(prices) => {
            let min_p = prices.iter().copied().fold(f64::INFINITY, f64::min);
            let max_p = max_of(prices);
            prices
                .iter()
                .map(|p| {
                    let n = (p - min_p) / (max_p - min_p).max(1.0);
                    clamp(0.75 + n * 1.45, 0.75, 2.2)
                })
                .collect()
        }
        None => demand_mw
            .iter()
            .zip(&capacity_mw)
            .map(|(d, c)| {
                let util = d / c.max(1.0);
                clamp(1.0 + 0.55 * util * util, 0.75, 2.2)
            })
            .collect(),
    };

    debug!(
        scale,
        forecast_points = forecast.len(),
        priced = prices.is_some(),
        "live inputs derived"
    );

    Some(LiveInputs {
        label: BUNDLE_LABEL.to_string(),
        fetched_at: bundle.fetched_at,
        demand_mw,
        capacity_mw,
        wind_mw,
        solar_mw,
        carbon_intensity,
        cost_index,
    })
}

/// Seeds live inputs from one snapshot by scaling the synthetic city curves.
///
/// System wind and solar are brought down to city size with the same
/// peak ratio [`to_live_inputs`] uses, so their share of demand matches
/// the snapshot's.
pub fn seed_inputs(seed: &BasicSnapshot, synthetic: &SimulationResult) -> LiveInputs {
    let share = seed
        .renewables_share
        .unwrap_or((seed.wind_mw + seed.solar_mw) / seed.system_demand_mw.max(1.0));
    let demand_scale = clamp(seed.system_demand_mw / 72_000.0, 0.7, 1.4);
    let city_scale = synthetic.peak_load_mw / seed.system_demand_mw.max(1.0);
    let renewables_scale = city_scale * demand_scale;
    let carbon_seed = clamp(420.0 - 260.0 * share, 180.0, 520.0);
    let city = &synthetic.city;

    LiveInputs {
        label: SEED_LABEL.to_string(),
        fetched_at: seed.timestamp,
        demand_mw: city.load_mw.iter().map(|v| v * demand_scale).collect(),
        capacity_mw: city.capacity_mw.iter().map(|v| v * demand_scale * 1.02).collect(),
        wind_mw: vec![seed.wind_mw * renewables_scale; city.load_mw.len()],
        solar_mw: vec![seed.solar_mw * renewables_scale; city.load_mw.len()],
        carbon_intensity: vec![carbon_seed; city.carbon_intensity.len()],
        cost_index: city.cost_index.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn hourly_curve_averages_duplicates() {
        let pts = vec![
            (t0(), 10.0),
            (t0() + Duration::minutes(30), 20.0),
            (t0() + Duration::hours(2), 5.0),
        ];
        let curve = hourly_curve(pts, t0());
        assert_eq!(curve.len(), SERIES_LEN);
        assert_eq!(curve[0], Some(15.0));
        assert_eq!(curve[1], None);
        assert_eq!(curve[2], Some(5.0));
    }

    #[test]
    fn fill_gaps_forward_fills() {
        let filled = fill_gaps(&[None, Some(2.0), None, Some(4.0), None], 9.0);
        assert_eq!(filled, vec![9.0, 2.0, 2.0, 4.0, 4.0]);
    }

    #[test]
    fn hour_slot_floors_before_epoch() {
        let ts = Utc.with_ymd_and_hms(1969, 12, 31, 23, 30, 0).unwrap();
        assert_eq!(hour_slot(ts), -1);
    }

    #[test]
    fn assemble_falls_back_per_feed() {
        let bundle = assemble_bundle(&RawFeeds::default(), t0());
        assert_eq!(bundle.errors.len(), 4);
        assert_eq!(bundle.forecast.as_ref().map(Vec::len), Some(SERIES_LEN));
        assert_eq!(bundle.realtime.map(|r| r.system_demand_mw), Some(46_800.0));
    }
}
