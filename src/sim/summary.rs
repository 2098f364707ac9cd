//! Scalar summaries derived from the hourly series: peak, overload zones,
//! top risk, alert timeline, resilience score and per-district drivers.

use std::fmt;

use serde::Serialize;

use crate::city::{CityParams, DistrictId};

use super::curves::clamp;
use super::types::{
    Alert, AlertLevel, CitySeries, DistrictSeries, HORIZON_HOURS, PeakSummary, RiskEntry,
    SERIES_LEN, SimulationResult,
};

const TOP_RISK_COUNT: usize = 3;
/// Stress above which a district counts as an overload zone.
pub const OVERLOAD_STRESS: f64 = 1.0;
pub const CRIT_PROBABILITY: f64 = 0.8;
pub const WARN_PROBABILITY: f64 = 0.65;

/// Assembles the final result from completed series.
pub(crate) fn summarize(
    districts: Vec<DistrictSeries>,
    city: CitySeries,
    params: &CityParams,
    live_applied: bool,
) -> SimulationResult {
    let (peak_hour, peak_load_mw) = first_max(&city.load_mw);

    let overload_zones: Vec<DistrictId> = districts
        .iter()
        .filter(|d| d.stress[peak_hour] > OVERLOAD_STRESS)
        .map(|d| d.id)
        .collect();

    let mut ranked: Vec<RiskEntry> = districts
        .iter()
        .map(|d| RiskEntry {
            id: d.id,
            stress: d.stress[peak_hour],
            probability: d.probability[peak_hour],
        })
        .collect();
    ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    ranked.truncate(TOP_RISK_COUNT);

    let mean_stress = districts
        .iter()
        .map(|d| clamp(d.stress[peak_hour], 0.0, 1.2))
        .sum::<f64>()
        / districts.len().max(1) as f64;

    let alerts = alert_timeline(&districts);
    let resilience_score = resilience(mean_stress, overload_zones.len(), params);

    SimulationResult {
        hours: (0..SERIES_LEN).collect(),
        districts,
        city,
        peak_hour,
        peak_load_mw,
        summary: PeakSummary {
            hour: peak_hour,
            overload_zones,
            top_risk: ranked,
            mean_stress,
        },
        alerts,
        resilience_score,
        live_applied,
    }
}

/// Index and value of the first maximum.
fn first_max(values: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, &v) in values.iter().enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    if best.1 == f64::NEG_INFINITY {
        (0, 0.0)
    } else {
        best
    }
}

fn alert_timeline(districts: &[DistrictSeries]) -> Vec<Alert> {
    (0..SERIES_LEN)
        .filter_map(|t| {
            let worst = districts.iter().reduce(|best, d| {
                if d.probability[t] > best.probability[t] { d } else { best }
            })?;
            let probability = worst.probability[t];
            let stress = worst.stress[t];
            let level = if probability > CRIT_PROBABILITY || stress > OVERLOAD_STRESS {
                AlertLevel::Crit
            } else if probability > WARN_PROBABILITY {
                AlertLevel::Warn
            } else {
                return None;
            };
            Some(Alert {
                hour: t,
                level,
                district: worst.id,
                probability,
                stress,
            })
        })
        .collect()
}

fn resilience(mean_stress: f64, zones: usize, params: &CityParams) -> u32 {
    let mut score = 100.0 - 55.0 * mean_stress - 12.0 * zones as f64 + 6.0 * params.storage_mwh;
    if params.microgrid_enabled {
        score += 6.0;
    }
    if params.demand_response_enabled {
        score += 4.0;
    }
    clamp(score, 0.0, 100.0).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverDirection {
    Up,
    Down,
}

/// One contributor to a district's load at a given hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Driver {
    pub label: &'static str,
    pub direction: DriverDirection,
    pub mw: f64,
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.direction {
            DriverDirection::Up => '+',
            DriverDirection::Down => '-',
        };
        write!(f, "{} {sign}{:.1} MW", self.label, self.mw)
    }
}

/// Nonzero load contributors of `id` at `hour`, largest first.
///
/// Base, EV, cooling and event load push stress up; rooftop solar and
/// storage discharge pull it down.
pub fn drivers(result: &SimulationResult, id: DistrictId, hour: usize) -> Vec<Driver> {
    let c = result.district(id).components[hour.min(HORIZON_HOURS)];
    let mut out: Vec<Driver> = [
        ("Base load", DriverDirection::Up, c.base_mw),
        ("EV charging", DriverDirection::Up, c.ev_mw),
        ("Cooling", DriverDirection::Up, c.ac_mw),
        ("Event", DriverDirection::Up, c.event_mw),
        ("Rooftop solar", DriverDirection::Down, c.solar_mw),
        ("Storage discharge", DriverDirection::Down, c.storage_shave_mw),
    ]
    .into_iter()
    .filter(|(_, _, mw)| *mw > 0.0)
    .map(|(label, direction, mw)| Driver { label, direction, mw })
    .collect();
    out.sort_by(|a, b| b.mw.total_cmp(&a.mw));
    out
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Grid Summary ---")?;
        writeln!(f, "Peak hour:             T+{}h", self.peak_hour)?;
        writeln!(f, "Peak load:             {:.1} MW", self.peak_load_mw)?;
        writeln!(
            f,
            "Peak capacity:         {:.1} MW",
            self.city.capacity_mw[self.peak_hour]
        )?;
        writeln!(f, "Resilience score:      {}", self.resilience_score)?;
        let zones: Vec<&str> = self.summary.overload_zones.iter().map(|id| id.as_str()).collect();
        writeln!(
            f,
            "Overload zones:        {}",
            if zones.is_empty() { "none".to_string() } else { zones.join(", ") }
        )?;
        let top: Vec<String> = self
            .summary
            .top_risk
            .iter()
            .map(|r| format!("{} ({:.0}%)", r.id, r.probability * 100.0))
            .collect();
        writeln!(f, "Top risk:              {}", top.join(", "))?;
        writeln!(f, "Alerts:                {}", self.alerts.len())?;
        writeln!(f, "Carbon at peak:        {:.1} gCO2/kWh", self.carbon_at_peak())?;
        writeln!(f, "Cost index at peak:    {:.3}", self.cost_at_peak())?;
        write!(f, "Live curves:           {}", self.live_applied)
    }
}
