//! The fixed set of counterfactual interventions evaluated per request.

use serde::Serialize;

use crate::city::{CityParams, DistrictId, DistrictOverrides};
use crate::sim::SimulationResult;

/// Storage added to the worst district (MWh).
pub const STORAGE_STEP_MWH: f64 = 1.5;
/// Transformer upgrade for the worst district (MW).
pub const CAPACITY_STEP_MW: f64 = 10.0;
/// Solar boost for each of the two highest-load districts.
pub const SOLAR_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionId {
    #[serde(rename = "storage-worst")]
    StorageWorst,
    #[serde(rename = "dr-enable")]
    DrEnable,
    #[serde(rename = "capacity-worst")]
    CapacityWorst,
    #[serde(rename = "solar-top2")]
    SolarTop2,
}

impl ActionId {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionId::StorageWorst => "storage-worst",
            ActionId::DrEnable => "dr-enable",
            ActionId::CapacityWorst => "capacity-worst",
            ActionId::SolarTop2 => "solar-top2",
        }
    }

    /// Capital cost in $M.
    pub fn cost_m(self) -> f64 {
        match self {
            ActionId::StorageWorst => 0.9,
            ActionId::DrEnable => 0.2,
            ActionId::CapacityWorst => 0.35,
            ActionId::SolarTop2 => 0.5,
        }
    }

    pub fn rationale(self) -> &'static str {
        match self {
            ActionId::StorageWorst => "Targets peak-hour stress where overload probability is highest.",
            ActionId::DrEnable => "Defers EV charging during 6-9pm to flatten feeder spikes.",
            ActionId::CapacityWorst => "Adds immediate headroom in the most constrained district.",
            ActionId::SolarTop2 => "Cuts midday thermal dispatch and lowers evening ramp burden.",
        }
    }

    pub fn drivers(self) -> &'static str {
        match self {
            ActionId::StorageWorst => "Evening ramp and localized peak pressure",
            ActionId::DrEnable => "EV evening concentration",
            ActionId::CapacityWorst => "Transformer loading margin",
            ActionId::SolarTop2 => "Solar offset and carbon pressure",
        }
    }
}

/// A candidate intervention with the scenario it produces.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: ActionId,
    pub title: String,
    pub params: CityParams,
    pub overrides: DistrictOverrides,
}

/// The two districts with the highest load at `result`'s peak hour.
pub fn top_load_districts(result: &SimulationResult) -> [DistrictId; 2] {
    let hour = result.peak_hour;
    let mut ids = DistrictId::ALL;
    ids.sort_by(|a, b| {
        result.district(*b).load_mw[hour].total_cmp(&result.district(*a).load_mw[hour])
    });
    [ids[0], ids[1]]
}

/// Candidates in evaluation order, each applied to a structural copy of
/// the B scenario.
pub fn generate_candidates(
    params: &CityParams,
    overrides: &DistrictOverrides,
    worst: DistrictId,
    result_b: &SimulationResult,
) -> Vec<Candidate> {
    let worst_name = worst.name();

    let storage = Candidate {
        id: ActionId::StorageWorst,
        title: format!("Add +{STORAGE_STEP_MWH} MWh battery in {worst_name}"),
        params: *params,
        overrides: overrides.updated(worst, |o| o.add_storage(STORAGE_STEP_MWH)),
    };

    let dr = if params.demand_response_enabled {
        Candidate {
            id: ActionId::DrEnable,
            title: format!("Enable local DR in {worst_name}"),
            params: *params,
            overrides: overrides.updated(worst, |o| o.with_dr(true)),
        }
    } else {
        Candidate {
            id: ActionId::DrEnable,
            title: "Enable global managed demand response".to_string(),
            params: CityParams {
                demand_response_enabled: true,
                ..*params
            },
            overrides: *overrides,
        }
    };

    let capacity = Candidate {
        id: ActionId::CapacityWorst,
        title: format!("Upgrade transformer +{CAPACITY_STEP_MW} MW in {worst_name}"),
        params: *params,
        overrides: overrides.updated(worst, |o| o.add_capacity(CAPACITY_STEP_MW)),
    };

    let solar = Candidate {
        id: ActionId::SolarTop2,
        title: "Incentivize +10% rooftop solar in top load districts".to_string(),
        params: *params,
        overrides: top_load_districts(result_b)
            .into_iter()
            .fold(*overrides, |ov, id| ov.updated(id, |o| o.add_solar(SOLAR_STEP))),
    };

    vec![storage, dr, capacity, solar]
}
