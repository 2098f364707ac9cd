//! Budget accounting: spend implied by a scenario, affordability checks and
//! the return-on-investment score.

use crate::city::{CityParams, DistrictOverrides, Toggle};
use crate::sim::SimulationResult;
use crate::sim::curves::round_to;

/// $M per MWh of local storage.
pub const STORAGE_COST_PER_MWH: f64 = 0.6;
/// $M per 10 MW of transformer upgrade.
pub const CAPACITY_COST_PER_10MW: f64 = 0.35;
/// $M per +0.1 rooftop solar boost.
pub const SOLAR_COST_PER_STEP: f64 = 0.25;
/// $M per district with local demand response.
pub const LOCAL_DR_COST: f64 = 0.2;

const AFFORD_EPSILON: f64 = 1e-9;

/// Warning surfaced when a budgeted change is rejected.
pub const BUDGET_EXCEEDED: &str = "Budget exceeded";

/// Total spend ($M) implied by `params` and `overrides`, rounded to 3 dp.
///
/// ```
/// use citygrid_twin::budget::compute_budget_used;
/// use citygrid_twin::city::{CityParams, DistrictId, DistrictOverrides};
///
/// let params = CityParams { microgrid_enabled: true, ..CityParams::default() };
/// let ov = DistrictOverrides::new().updated(DistrictId::Medical, |o| o.add_storage(1.0));
/// assert_eq!(compute_budget_used(&params, &ov), 2.1);
/// ```
pub fn compute_budget_used(params: &CityParams, overrides: &DistrictOverrides) -> f64 {
    let mut used = 0.0;
    for toggle in [Toggle::Microgrid, Toggle::DemandResponse] {
        if let (true, Some(cost)) = (params.flag(toggle), toggle.budget_cost_m()) {
            used += cost;
        }
    }
    for (_, o) in overrides.iter() {
        used += o.storage_mwh * STORAGE_COST_PER_MWH
            + o.cap_boost_mw / 10.0 * CAPACITY_COST_PER_10MW
            + o.solar_boost / 0.1 * SOLAR_COST_PER_STEP;
        if o.dr_enabled {
            used += LOCAL_DR_COST;
        }
    }
    round_to(used, 3)
}

/// `true` when spending `delta` more keeps `used` within `cap`.
///
/// Non-positive deltas always pass.
pub fn can_afford_change(cap: f64, used: f64, delta: f64) -> bool {
    delta <= 0.0 || used + delta <= cap + AFFORD_EPSILON
}

/// Number of active per-district interventions.
pub fn count_interventions(overrides: &DistrictOverrides) -> usize {
    overrides.count_interventions()
}

/// Improvement of B over A per $M spent.
///
/// Rewards lower peak load, fewer overload zones and higher resilience;
/// spend is floored at 0.1 $M.
pub fn roi_score(a: &SimulationResult, b: &SimulationResult, used: f64) -> f64 {
    let peak_gain = (a.peak_load_mw - b.peak_load_mw).max(0.0);
    let zone_gain = (a.overload_count() as f64 - b.overload_count() as f64).max(0.0);
    let resilience_gain = (f64::from(b.resilience_score) - f64::from(a.resilience_score)).max(0.0);
    (peak_gain * 0.6 + zone_gain * 8.0 + resilience_gain * 0.25) / used.max(0.1)
}
