//! Deterministic hour-by-hour projection of district load, capacity and risk.

use tracing::debug;

use crate::city::{CityParams, DISTRICT_COUNT, DISTRICTS, District, DistrictId, DistrictOverride, DistrictOverrides};
use crate::live::LiveInputs;

use super::curves::{base_shape, clamp, evening_peak, jitter, sigmoid, solar_shape, temperature_factor};
use super::summary::summarize;
use super::types::{CitySeries, DistrictSeries, LoadComponents, SERIES_LEN, SimulationResult};

/// Evening-peak level above which storage starts discharging.
const STORAGE_DISPATCH_THRESHOLD: f64 = 0.55;
/// Share of local storage energy available per peak hour.
const LOCAL_STORAGE_FACTOR: f64 = 0.2;
/// Share of the global pool available per peak hour.
const GLOBAL_STORAGE_FACTOR: f64 = 0.95;
/// Storage weight of critical districts when critical priority is on.
const CRITICAL_STORAGE_WEIGHT: f64 = 1.25;
const MICROGRID_BOOST_MW: f64 = 18.0;
const EVENT_LOAD_MW: f64 = 22.0;

/// Runs the model on synthetic curves only.
///
/// `None` overrides behaves as all-default overrides.
///
/// # Examples
///
/// ```
/// use citygrid_twin::city::CityParams;
/// use citygrid_twin::sim::run_simulation;
///
/// let result = run_simulation(&CityParams::default(), None);
/// assert_eq!(result.hours.len(), 73);
/// assert!(result.resilience_score <= 100);
/// ```
pub fn run_simulation(params: &CityParams, overrides: Option<&DistrictOverrides>) -> SimulationResult {
    run_simulation_with_live(params, overrides, None)
}

/// Runs the model, substituting the city curves with `live` when given.
///
/// Each district keeps its model-derived share: its load and capacity are
/// rescaled per hour by `live / max(1, synthetic)` and stress and probability
/// are recomputed. City solar, carbon and cost come straight from the live
/// curves. Peak, alerts and resilience are derived after substitution.
pub fn run_simulation_with_live(
    params: &CityParams,
    overrides: Option<&DistrictOverrides>,
    live: Option<&LiveInputs>,
) -> SimulationResult {
    let overrides = overrides.copied().unwrap_or_default();
    let shares = storage_shares(params, &overrides);
    let dr_coverage = if params.demand_response_enabled {
        1.0
    } else {
        overrides.local_dr_count() as f64 / DISTRICT_COUNT as f64
    };

    let mut districts: Vec<DistrictSeries> = DistrictId::ALL
        .into_iter()
        .map(DistrictSeries::with_capacity)
        .collect();
    let mut city = CitySeries::default();

    for t in 0..SERIES_LEN {
        let mut city_load = 0.0;
        let mut city_cap = 0.0;
        let mut city_solar = 0.0;

        for (district, series) in DISTRICTS.iter().zip(districts.iter_mut()) {
            let o = overrides.get(district.id);
            let c = components(district, o, params, shares[district.id.index()], t);
            let load = c.net_load_mw();
            let stress = load / c.capacity_mw;

            series.load_mw.push(load);
            series.capacity_mw.push(c.capacity_mw);
            series.stress.push(stress);
            series.probability.push(overload_probability(stress, district.criticality));
            series.solar_mw.push(c.solar_mw);
            series.components.push(c);

            city_load += load;
            city_cap += c.capacity_mw;
            city_solar += c.solar_mw;
        }

        let peak = evening_peak(t);
        let solar_ratio = city_solar / city_load.max(1.0);

        let mut carbon = 380.0 - 140.0 * solar_ratio;
        if params.storm_enabled {
            carbon += 30.0;
        }
        if params.heatwave_enabled {
            carbon += 15.0;
        }
        let utilization = city_load / city_cap.max(1.0);
        let cost = 1.0 + 0.55 * utilization * utilization - 0.1 * peak * dr_coverage - 0.08 * solar_ratio;

        city.load_mw.push(city_load);
        city.capacity_mw.push(city_cap);
        city.solar_mw.push(city_solar);
        city.carbon_intensity.push(clamp(carbon, 180.0, 520.0));
        city.cost_index.push(clamp(cost, 0.75, 2.2));
    }

    let live_applied = match live {
        Some(live) => {
            apply_live(&mut districts, &mut city, live);
            true
        }
        None => false,
    };

    let result = summarize(districts, city, params, live_applied);
    debug!(
        peak_hour = result.peak_hour,
        peak_load_mw = result.peak_load_mw,
        resilience = result.resilience_score,
        overloads = result.overload_count(),
        live = live_applied,
        "simulation complete"
    );
    result
}

/// Load components for one district at hour `t`.
fn components(
    district: &District,
    o: &DistrictOverride,
    params: &CityParams,
    global_share: f64,
    t: usize,
) -> LoadComponents {
    let peak = evening_peak(t);
    let critical_weighted = params.critical_priority_enabled && district.id.is_critical();

    let mut base = district.base_load_mw * base_shape(t);
    if params.storm_enabled {
        base *= 1.02;
    }

    let adoption = clamp(district.ev_adoption + params.ev_adoption_delta, 0.0, 0.9);
    let ev_base = adoption * f64::from(district.population) / 1000.0 * 0.22;
    let mut ev = ev_base * (0.35 + 0.95 * peak);
    if params.demand_response_enabled || o.dr_enabled {
        ev *= 1.0 - 0.18 * peak;
    }

    let ac = district.base_load_mw
        * 0.18
        * (temperature_factor(t, params) - 0.92).max(0.0)
        * district.sensitivity.heat;

    let hour_of_day = t % 24;
    let event = if params.event_enabled
        && district.id == DistrictId::Downtown
        && (18..=22).contains(&hour_of_day)
    {
        EVENT_LOAD_MW * district.sensitivity.event
    } else {
        0.0
    };

    let penetration = clamp(
        district.solar_penetration + params.solar_delta + o.solar_boost,
        0.0,
        0.85,
    );
    let solar = penetration * district.base_load_mw * 0.55 * solar_shape(t, params);

    let storage_shave = if peak <= STORAGE_DISPATCH_THRESHOLD {
        0.0
    } else if o.storage_mwh > 0.0 {
        let weight = if critical_weighted { CRITICAL_STORAGE_WEIGHT } else { 1.0 };
        o.storage_mwh * 6.0 * peak * weight * LOCAL_STORAGE_FACTOR
    } else if params.storage_mwh > 0.0 {
        params.storage_mwh * 6.0 * peak * global_share * GLOBAL_STORAGE_FACTOR
    } else {
        0.0
    };

    let mut capacity = district.base_capacity_mw;
    if params.storm_enabled {
        capacity *= if district.id == DistrictId::Waterfront { 0.78 } else { 0.90 };
        capacity *= 1.0 - 0.05 * jitter(district.id, t);
    }
    if params.microgrid_enabled && district.id.is_critical() {
        capacity += MICROGRID_BOOST_MW;
    }
    capacity = (capacity + o.cap_boost_mw).max(1.0);

    LoadComponents {
        base_mw: base,
        ev_mw: ev,
        ac_mw: ac,
        event_mw: event,
        solar_mw: solar,
        storage_shave_mw: storage_shave,
        capacity_mw: capacity,
    }
}

/// `clamp(sigmoid((stress - 0.85) * 8) + 0.05 * criticality, 0, 1)`.
pub fn overload_probability(stress: f64, criticality: f64) -> f64 {
    clamp(sigmoid((stress - 0.85) * 8.0) + 0.05 * criticality, 0.0, 1.0)
}

/// Global storage pool shares over districts without local storage.
///
/// Weighted 1.25 for critical districts under critical priority and 0.85
/// otherwise, normalized to sum to 1. All zero if every district has local
/// storage.
fn storage_shares(params: &CityParams, overrides: &DistrictOverrides) -> [f64; DISTRICT_COUNT] {
    let mut weights = [0.0; DISTRICT_COUNT];
    for (id, o) in overrides.iter() {
        if o.storage_mwh > 0.0 {
            continue;
        }
        weights[id.index()] = if params.critical_priority_enabled && id.is_critical() {
            CRITICAL_STORAGE_WEIGHT
        } else {
            0.85
        };
    }
    let total: f64 = weights.iter().sum();
    let total = if total > 0.0 { total } else { 1.0 };
    weights.map(|w| w / total)
}

fn apply_live(districts: &mut [DistrictSeries], city: &mut CitySeries, live: &LiveInputs) {
    for t in 0..SERIES_LEN {
        let load_scale = live.demand_mw[t] / city.load_mw[t].max(1.0);
        let cap_scale = live.capacity_mw[t] / city.capacity_mw[t].max(1.0);

        for series in districts.iter_mut() {
            let criticality = series.id.district().criticality;
            let load = series.load_mw[t] * load_scale;
            let capacity = (series.capacity_mw[t] * cap_scale).max(1.0);
            let stress = load / capacity;
            series.load_mw[t] = load;
            series.capacity_mw[t] = capacity;
            series.stress[t] = stress;
            series.probability[t] = overload_probability(stress, criticality);
        }

        city.load_mw[t] = live.demand_mw[t];
        city.capacity_mw[t] = live.capacity_mw[t];
        city.solar_mw[t] = live.solar_mw[t];
        city.carbon_intensity[t] = live.carbon_intensity[t];
        city.cost_index[t] = live.cost_index[t];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_shares_sum_to_one() {
        let params = CityParams {
            storage_mwh: 2.0,
            critical_priority_enabled: true,
            ..CityParams::default()
        };
        let shares = storage_shares(&params, &DistrictOverrides::new());
        let total: f64 = shares.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(shares[DistrictId::Medical.index()] > shares[DistrictId::North.index()]);
    }

    #[test]
    fn storage_shares_skip_local_storage() {
        let ov = DistrictOverrides::new().updated(DistrictId::North, |o| o.add_storage(1.0));
        let shares = storage_shares(&CityParams::default(), &ov);
        assert_eq!(shares[DistrictId::North.index()], 0.0);
        assert!((shares[DistrictId::South.index()] - 1.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn storage_shares_all_local_is_zero() {
        let ov = DistrictId::ALL
            .into_iter()
            .fold(DistrictOverrides::new(), |ov, id| ov.updated(id, |o| o.add_storage(1.0)));
        assert!(storage_shares(&CityParams::default(), &ov).iter().all(|s| *s == 0.0));
    }

    #[test]
    fn event_load_only_downtown_evening() {
        let params = CityParams {
            event_enabled: true,
            ..CityParams::default()
        };
        let downtown = DistrictId::Downtown.district();
        let o = DistrictOverride::default();
        assert_eq!(components(downtown, &o, &params, 0.0, 20).event_mw, 22.0);
        assert_eq!(components(downtown, &o, &params, 0.0, 44).event_mw, 22.0);
        assert_eq!(components(downtown, &o, &params, 0.0, 17).event_mw, 0.0);
        let uni = DistrictId::University.district();
        assert_eq!(components(uni, &o, &params, 0.0, 20).event_mw, 0.0);
    }

    #[test]
    fn storage_idle_outside_evening_peak() {
        let params = CityParams::default();
        let o = DistrictOverride::default().add_storage(5.0);
        let d = DistrictId::Eastside.district();
        assert_eq!(components(d, &o, &params, 0.0, 12).storage_shave_mw, 0.0);
        // peak = 1 at 18:00: 5 * 6 * 1 * 1 * 0.2
        assert!((components(d, &o, &params, 0.0, 18).storage_shave_mw - 6.0).abs() < 1e-12);
    }

    #[test]
    fn capacity_floored_at_one() {
        let o = DistrictOverride::default().add_capacity(-1000.0);
        let c = components(DistrictId::North.district(), &o, &CityParams::default(), 0.0, 0);
        assert_eq!(c.capacity_mw, 1.0);
    }

    #[test]
    fn microgrid_boosts_critical_capacity() {
        let params = CityParams {
            microgrid_enabled: true,
            ..CityParams::default()
        };
        let o = DistrictOverride::default();
        assert_eq!(components(DistrictId::Medical.district(), &o, &params, 0.0, 0).capacity_mw, 84.0);
        assert_eq!(components(DistrictId::North.district(), &o, &params, 0.0, 0).capacity_mw, 54.0);
    }

    #[test]
    fn probability_includes_criticality_bias() {
        let p = overload_probability(0.85, 1.0);
        assert!((p - 0.55).abs() < 1e-12);
        assert_eq!(overload_probability(10.0, 1.0), 1.0);
    }
}
