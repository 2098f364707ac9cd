//! Memoization of simulation runs keyed by a canonical structural key.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::city::{CityParams, DISTRICT_COUNT, DistrictOverrides};
use crate::live::LiveInputs;

use super::engine::run_simulation_with_live;
use super::types::SimulationResult;

/// Canonical form of a float for hashing: `-0.0` and `0.0` share a key.
fn float_key(v: f64) -> u64 {
    if v == 0.0 { 0 } else { v.to_bits() }
}

/// Hashable identity of one simulation input set.
///
/// Covers only the fields the engine reads, so the budget cap is left out.
/// Two inputs with equal keys produce identical results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimKey {
    params: [u64; 3],
    flags: [bool; 6],
    overrides: [([u64; 3], bool); DISTRICT_COUNT],
    live: Option<(String, i64)>,
}

impl SimKey {
    pub fn new(params: &CityParams, overrides: &DistrictOverrides, live: Option<&LiveInputs>) -> Self {
        let mut ov = [([0_u64; 3], false); DISTRICT_COUNT];
        for (id, o) in overrides.iter() {
            ov[id.index()] = (
                [
                    float_key(o.storage_mwh),
                    float_key(o.cap_boost_mw),
                    float_key(o.solar_boost),
                ],
                o.dr_enabled,
            );
        }
        Self {
            params: [
                float_key(params.ev_adoption_delta),
                float_key(params.solar_delta),
                float_key(params.storage_mwh),
            ],
            flags: [
                params.microgrid_enabled,
                params.demand_response_enabled,
                params.heatwave_enabled,
                params.storm_enabled,
                params.event_enabled,
                params.critical_priority_enabled,
            ],
            overrides: ov,
            live: live.map(|l| (l.label.clone(), l.fetched_at.timestamp_millis())),
        }
    }
}

/// Unbounded result cache owned by a session.
#[derive(Debug, Default)]
pub struct SimCache {
    entries: HashMap<SimKey, Arc<SimulationResult>>,
    hits: u64,
    misses: u64,
}

impl SimCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result for these inputs, running the engine on a
    /// miss.
    pub fn get_or_run(
        &mut self,
        params: &CityParams,
        overrides: &DistrictOverrides,
        live: Option<&LiveInputs>,
    ) -> Arc<SimulationResult> {
        let key = SimKey::new(params, overrides, live);
        if let Some(hit) = self.entries.get(&key) {
            self.hits += 1;
            trace!(entries = self.entries.len(), "simulation cache hit");
            return Arc::clone(hit);
        }
        self.misses += 1;
        let result = Arc::new(run_simulation_with_live(params, Some(overrides), live));
        self.entries.insert(key, Arc::clone(&result));
        result
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
