//! Scenario-global control vector and the enumerated flag toggles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default budget cap in $M.
pub const DEFAULT_BUDGET_M: f64 = 5.0;

/// Scenario-global parameters: continuous deltas plus stressor and
/// intervention flags.
///
/// Treated as an immutable snapshot: the `with_*` / [`CityParams::toggled`]
/// helpers return a new value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CityParams {
    /// Added to every district's baseline EV adoption fraction.
    pub ev_adoption_delta: f64,
    /// Added to every district's baseline solar penetration fraction.
    pub solar_delta: f64,
    /// City-wide storage pool (MWh), shared by districts without local storage.
    pub storage_mwh: f64,
    /// Budget cap in $M.
    pub budget_m: f64,
    pub microgrid_enabled: bool,
    pub demand_response_enabled: bool,
    pub heatwave_enabled: bool,
    pub storm_enabled: bool,
    pub event_enabled: bool,
    /// Weights storage toward the critical districts.
    pub critical_priority_enabled: bool,
}

impl Default for CityParams {
    fn default() -> Self {
        Self {
            ev_adoption_delta: 0.0,
            solar_delta: 0.0,
            storage_mwh: 0.0,
            budget_m: DEFAULT_BUDGET_M,
            microgrid_enabled: false,
            demand_response_enabled: false,
            heatwave_enabled: false,
            storm_enabled: false,
            event_enabled: false,
            critical_priority_enabled: false,
        }
    }
}

/// One of the boolean fields of [`CityParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toggle {
    Microgrid,
    DemandResponse,
    Heatwave,
    Storm,
    Event,
    CriticalPriority,
}

impl Toggle {
    pub const ALL: [Toggle; 6] = [
        Toggle::Microgrid,
        Toggle::DemandResponse,
        Toggle::Heatwave,
        Toggle::Storm,
        Toggle::Event,
        Toggle::CriticalPriority,
    ];

    /// Budget cost ($M) of switching this flag on, for budgeted flags.
    pub fn budget_cost_m(self) -> Option<f64> {
        match self {
            Toggle::Microgrid => Some(1.5),
            Toggle::DemandResponse => Some(0.2),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Toggle::Microgrid => "Microgrid",
            Toggle::DemandResponse => "Demand Response",
            Toggle::Heatwave => "Heatwave",
            Toggle::Storm => "Storm",
            Toggle::Event => "Event",
            Toggle::CriticalPriority => "Critical Priority",
        }
    }
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Toggle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "microgrid" => Ok(Toggle::Microgrid),
            "demand_response" | "dr" => Ok(Toggle::DemandResponse),
            "heatwave" => Ok(Toggle::Heatwave),
            "storm" => Ok(Toggle::Storm),
            "event" => Ok(Toggle::Event),
            "critical_priority" => Ok(Toggle::CriticalPriority),
            other => Err(format!("unknown toggle \"{other}\"")),
        }
    }
}

impl CityParams {
    /// Current value of a flag.
    pub fn flag(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Microgrid => self.microgrid_enabled,
            Toggle::DemandResponse => self.demand_response_enabled,
            Toggle::Heatwave => self.heatwave_enabled,
            Toggle::Storm => self.storm_enabled,
            Toggle::Event => self.event_enabled,
            Toggle::CriticalPriority => self.critical_priority_enabled,
        }
    }

    /// Returns a copy with `toggle` set to `on`.
    pub fn with_flag(self, toggle: Toggle, on: bool) -> Self {
        let mut next = self;
        let slot = match toggle {
            Toggle::Microgrid => &mut next.microgrid_enabled,
            Toggle::DemandResponse => &mut next.demand_response_enabled,
            Toggle::Heatwave => &mut next.heatwave_enabled,
            Toggle::Storm => &mut next.storm_enabled,
            Toggle::Event => &mut next.event_enabled,
            Toggle::CriticalPriority => &mut next.critical_priority_enabled,
        };
        *slot = on;
        next
    }

    /// Returns a copy with `toggle` inverted.
    pub fn toggled(self, toggle: Toggle) -> Self {
        self.with_flag(toggle, !self.flag(toggle))
    }

    /// Returns a copy with a different budget cap.
    pub fn with_budget(self, budget_m: f64) -> Self {
        Self { budget_m, ..self }
    }
}
