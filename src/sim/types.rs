//! Simulation result types: per-district and city series, peak summary and
//! alert timeline.

use serde::Serialize;

use crate::city::DistrictId;

/// Last hour of the projection horizon.
pub const HORIZON_HOURS: usize = 72;
/// Number of hourly points in every series (`0..=72`).
pub const SERIES_LEN: usize = HORIZON_HOURS + 1;

/// Load composition of one district at one hour (MW).
///
/// `solar_mw` and `storage_shave_mw` are reductions; the net district load is
/// `max(0, base + ev + ac + event - solar - storage_shave)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoadComponents {
    pub base_mw: f64,
    pub ev_mw: f64,
    pub ac_mw: f64,
    pub event_mw: f64,
    pub solar_mw: f64,
    pub storage_shave_mw: f64,
    pub capacity_mw: f64,
}

impl LoadComponents {
    /// Net load implied by the components, floored at zero.
    pub fn net_load_mw(&self) -> f64 {
        (self.base_mw + self.ev_mw + self.ac_mw + self.event_mw
            - self.solar_mw
            - self.storage_shave_mw)
            .max(0.0)
    }
}

/// Hourly series for one district.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictSeries {
    pub id: DistrictId,
    pub load_mw: Vec<f64>,
    pub capacity_mw: Vec<f64>,
    /// `load / capacity`.
    pub stress: Vec<f64>,
    /// Overload probability in `[0, 1]`.
    pub probability: Vec<f64>,
    /// Rooftop solar output (MW).
    pub solar_mw: Vec<f64>,
    /// Model-derived breakdown. Not rescaled by live substitution.
    pub components: Vec<LoadComponents>,
}

impl DistrictSeries {
    pub(crate) fn with_capacity(id: DistrictId) -> Self {
        Self {
            id,
            load_mw: Vec::with_capacity(SERIES_LEN),
            capacity_mw: Vec::with_capacity(SERIES_LEN),
            stress: Vec::with_capacity(SERIES_LEN),
            probability: Vec::with_capacity(SERIES_LEN),
            solar_mw: Vec::with_capacity(SERIES_LEN),
            components: Vec::with_capacity(SERIES_LEN),
        }
    }
}

/// Hourly city-wide aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CitySeries {
    pub load_mw: Vec<f64>,
    pub capacity_mw: Vec<f64>,
    pub solar_mw: Vec<f64>,
    /// gCO2/kWh, `180..=520`.
    pub carbon_intensity: Vec<f64>,
    /// Dimensionless, `0.75..=2.2`.
    pub cost_index: Vec<f64>,
}

/// One district's risk figures at a given hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskEntry {
    pub id: DistrictId,
    pub stress: f64,
    pub probability: f64,
}

/// Snapshot of the grid at the city peak hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakSummary {
    pub hour: usize,
    /// Districts with stress > 1.0, catalog order.
    pub overload_zones: Vec<DistrictId>,
    /// Three highest-probability districts, descending.
    pub top_risk: Vec<RiskEntry>,
    /// Mean of `clamp(stress, 0, 1.2)` over all districts.
    pub mean_stress: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warn,
    Crit,
}

impl AlertLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Warn => "warn",
            AlertLevel::Crit => "crit",
        }
    }
}

/// Hour at which the worst district crossed an alert threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Alert {
    pub hour: usize,
    pub level: AlertLevel,
    pub district: DistrictId,
    pub probability: f64,
    pub stress: f64,
}

/// Complete output of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    /// `0..=72`.
    pub hours: Vec<usize>,
    /// One entry per district, catalog order.
    pub districts: Vec<DistrictSeries>,
    pub city: CitySeries,
    /// First hour attaining the maximum city load.
    pub peak_hour: usize,
    pub peak_load_mw: f64,
    pub summary: PeakSummary,
    pub alerts: Vec<Alert>,
    /// Integer in `0..=100`.
    pub resilience_score: u32,
    /// Whether live curves replaced the synthetic city series.
    pub live_applied: bool,
}

impl SimulationResult {
    pub fn district(&self, id: DistrictId) -> &DistrictSeries {
        &self.districts[id.index()]
    }

    pub fn overload_count(&self) -> usize {
        self.summary.overload_zones.len()
    }

    /// Maximum district overload probability at this run's own peak hour.
    pub fn peak_risk(&self) -> f64 {
        self.districts
            .iter()
            .map(|d| d.probability[self.peak_hour])
            .fold(0.0, f64::max)
    }

    pub fn carbon_at_peak(&self) -> f64 {
        self.city.carbon_intensity[self.peak_hour]
    }

    pub fn cost_at_peak(&self) -> f64 {
        self.city.cost_index[self.peak_hour]
    }

    /// Risk entries for every district at `hour` (clamped into the horizon),
    /// catalog order.
    pub fn risk_at(&self, hour: usize) -> Vec<RiskEntry> {
        let hour = hour.min(HORIZON_HOURS);
        self.districts
            .iter()
            .map(|d| RiskEntry {
                id: d.id,
                stress: d.stress[hour],
                probability: d.probability[hour],
            })
            .collect()
    }

    /// District with the highest overload probability at `hour`; ties go to
    /// the earlier catalog entry.
    pub fn worst_district_at(&self, hour: usize) -> RiskEntry {
        let entries = self.risk_at(hour);
        let mut worst = entries[0];
        for e in &entries[1..] {
            if e.probability > worst.probability {
                worst = *e;
            }
        }
        worst
    }
}
