//! TOML-based scenario configuration and preset definitions.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::budget::compute_budget_used;
use crate::city::overrides::{MAX_LOCAL_STORAGE_MWH, MAX_SOLAR_BOOST};
use crate::city::{CityParams, DistrictId, DistrictOverride, DistrictOverrides};

/// Slider range of [`CityParams::ev_adoption_delta`].
pub const EV_DELTA_RANGE: (f64, f64) = (-0.05, 0.3);
/// Slider range of [`CityParams::solar_delta`].
pub const SOLAR_DELTA_RANGE: (f64, f64) = (-0.1, 0.3);
/// Slider range of [`CityParams::storage_mwh`].
pub const STORAGE_RANGE: (f64, f64) = (0.0, 5.0);

/// A scenario: global parameters plus per-district overrides.
///
/// ```toml
/// [params]
/// heatwave_enabled = true
/// ev_adoption_delta = 0.1
///
/// [overrides.medical]
/// storage_mwh = 1.5
/// ```
///
/// Missing tables and fields take their defaults; unknown keys (including
/// unknown district names) are rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    pub params: CityParams,
    pub overrides: BTreeMap<DistrictId, DistrictOverride>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"params.storage_mwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn check_range(errors: &mut Vec<ConfigError>, field: &str, value: f64, (lo, hi): (f64, f64)) {
    if !value.is_finite() || value < lo || value > hi {
        errors.push(ConfigError::new(field, format!("must be in [{lo}, {hi}], got {value}")));
    }
}

impl ScenarioConfig {
    /// Default parameters, no overrides.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Evening heat plus a step-up in EV adoption.
    pub fn heatwave_ev_surge() -> Self {
        Self {
            params: CityParams {
                ev_adoption_delta: 0.22,
                heatwave_enabled: true,
                ..CityParams::default()
            },
            overrides: BTreeMap::new(),
        }
    }

    /// Storm-derated capacity with a downtown evening event.
    pub fn storm_stress() -> Self {
        Self {
            params: CityParams {
                storm_enabled: true,
                event_enabled: true,
                ..CityParams::default()
            },
            overrides: BTreeMap::new(),
        }
    }

    /// Solar, storage, microgrids and demand response all deployed.
    pub fn green_upgrade() -> Self {
        Self {
            params: CityParams {
                ev_adoption_delta: 0.1,
                solar_delta: 0.2,
                storage_mwh: 3.0,
                microgrid_enabled: true,
                demand_response_enabled: true,
                ..CityParams::default()
            },
            overrides: BTreeMap::new(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "heatwave_ev_surge", "storm_stress", "green_upgrade"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "heatwave_ev_surge" => Ok(Self::heatwave_ev_surge()),
            "storm_stress" => Ok(Self::storm_stress()),
            "green_upgrade" => Ok(Self::green_upgrade()),
            _ => Err(ConfigError::new(
                "preset",
                format!("unknown preset \"{name}\", available: {}", Self::PRESETS.join(", ")),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// The overrides as a full per-district set.
    pub fn district_overrides(&self) -> DistrictOverrides {
        self.overrides
            .iter()
            .fold(DistrictOverrides::new(), |ov, (id, o)| ov.updated(*id, |_| *o))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let p = &self.params;

        check_range(&mut errors, "params.ev_adoption_delta", p.ev_adoption_delta, EV_DELTA_RANGE);
        check_range(&mut errors, "params.solar_delta", p.solar_delta, SOLAR_DELTA_RANGE);
        check_range(&mut errors, "params.storage_mwh", p.storage_mwh, STORAGE_RANGE);
        if !p.budget_m.is_finite() || p.budget_m < 0.0 {
            errors.push(ConfigError::new("params.budget_m", "must be >= 0"));
        }

        for (id, o) in &self.overrides {
            check_range(
                &mut errors,
                &format!("overrides.{id}.storage_mwh"),
                o.storage_mwh,
                (0.0, MAX_LOCAL_STORAGE_MWH),
            );
            check_range(
                &mut errors,
                &format!("overrides.{id}.solar_boost"),
                o.solar_boost,
                (0.0, MAX_SOLAR_BOOST),
            );
            if !o.cap_boost_mw.is_finite() {
                errors.push(ConfigError::new(
                    format!("overrides.{id}.cap_boost_mw"),
                    "must be finite",
                ));
            }
        }

        if errors.is_empty() {
            let used = compute_budget_used(p, &self.district_overrides());
            if used > p.budget_m + 1e-9 {
                errors.push(ConfigError::new(
                    "params.budget_m",
                    format!("interventions cost {used:.2}M, over the {:.1}M budget", p.budget_m),
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
        assert_eq!(e.field, "preset");
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[params]
ev_adoption_delta = 0.1
storage_mwh = 2.0
budget_m = 8.0
heatwave_enabled = true
critical_priority_enabled = true

[overrides.medical]
storage_mwh = 1.5
dr_enabled = true

[overrides.waterfront]
cap_boost_mw = 10.0
solar_boost = 0.1
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.params.budget_m), Some(8.0));
        assert_eq!(cfg.as_ref().map(|c| c.params.heatwave_enabled), Some(true));
        let ov = cfg.as_ref().map(ScenarioConfig::district_overrides).unwrap_or_default();
        assert_eq!(ov.get(DistrictId::Medical).storage_mwh, 1.5);
        assert!(ov.get(DistrictId::Medical).dr_enabled);
        assert_eq!(ov.get(DistrictId::Waterfront).cap_boost_mw, 10.0);
        assert_eq!(ov.count_interventions(), 4);
        assert!(cfg.map(|c| c.validate().is_empty()).unwrap_or(false));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[params]
storage_mwh = 1.0
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unknown_district_rejected() {
        let toml = r#"
[overrides.harbor]
storage_mwh = 1.0
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_slider_ranges() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.params.ev_adoption_delta = 0.5;
        cfg.params.solar_delta = -0.2;
        cfg.params.storage_mwh = 6.0;
        cfg.params.budget_m = -1.0;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "params.ev_adoption_delta",
                "params.solar_delta",
                "params.storage_mwh",
                "params.budget_m",
            ]
        );
    }

    #[test]
    fn validation_catches_override_ranges() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.overrides.insert(
            DistrictId::North,
            DistrictOverride {
                storage_mwh: 7.0,
                solar_boost: 0.5,
                ..DistrictOverride::default()
            },
        );
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "overrides.north.storage_mwh"));
        assert!(errors.iter().any(|e| e.field == "overrides.north.solar_boost"));
    }

    #[test]
    fn validation_catches_over_budget() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.params.budget_m = 1.0;
        cfg.params.microgrid_enabled = true;
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("over the 1.0M budget"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(errors.is_empty(), "preset \"{name}\" should be valid: {errors:?}");
        }
    }

    #[test]
    fn presets_differ_from_baseline() {
        let base = ScenarioConfig::baseline();
        for name in &ScenarioConfig::PRESETS[1..] {
            let cfg = ScenarioConfig::from_preset(name).ok();
            assert_ne!(cfg.as_ref(), Some(&base), "preset \"{name}\"");
        }
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[params]
storm_enabled = true
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.params.storm_enabled), Some(true));
        assert_eq!(cfg.as_ref().map(|c| c.params.budget_m), Some(5.0));
        assert_eq!(cfg.as_ref().map(|c| c.overrides.len()), Some(0));
    }

    #[test]
    fn error_display_includes_field() {
        let e = ConfigError::new("params.storage_mwh", "must be in [0, 5], got 6");
        assert_eq!(e.to_string(), "config error: params.storage_mwh: must be in [0, 5], got 6");
    }
}
