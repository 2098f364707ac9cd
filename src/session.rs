//! Working state of one operator session: scenario B under edit, the pinned
//! comparison scenario A, the selected hour and a result cache.

use std::sync::Arc;

use tracing::{info, warn};

use crate::budget::{
    BUDGET_EXCEEDED, CAPACITY_COST_PER_10MW, LOCAL_DR_COST, SOLAR_COST_PER_STEP, STORAGE_COST_PER_MWH,
    can_afford_change, compute_budget_used, roi_score,
};
use crate::city::{CityParams, DistrictId, DistrictOverride, DistrictOverrides, Toggle};
use crate::config::{ConfigError, EV_DELTA_RANGE, SOLAR_DELTA_RANGE, STORAGE_RANGE, ScenarioConfig};
use crate::live::LiveInputs;
use crate::recommend::{RecommendationInput, RecommendationOutput, build_recommendations};
use crate::sim::curves::clamp;
use crate::sim::{HORIZON_HOURS, SimCache, SimulationResult};

/// The comparison scenario captured by [`Session::pin_current`].
#[derive(Debug, Clone, PartialEq)]
pub struct PinnedScenario {
    pub label: String,
    pub params: CityParams,
    pub overrides: DistrictOverrides,
    pub live: Option<LiveInputs>,
}

impl Default for PinnedScenario {
    fn default() -> Self {
        Self {
            label: "Baseline".to_string(),
            params: CityParams::default(),
            overrides: DistrictOverrides::new(),
            live: None,
        }
    }
}

/// Display title of a preset key.
pub fn preset_title(name: &str) -> &'static str {
    match name {
        "heatwave_ev_surge" => "Heatwave + EV Surge",
        "storm_stress" => "Storm Stress",
        "green_upgrade" => "Green Upgrade",
        "custom" => "Custom",
        _ => "Baseline",
    }
}

#[derive(Debug, Default)]
pub struct Session {
    params: CityParams,
    overrides: DistrictOverrides,
    live: Option<LiveInputs>,
    pinned: PinnedScenario,
    selected_hour: usize,
    preset: String,
    budget_warning: Option<String>,
    cache: SimCache,
}

impl Session {
    /// Baseline scenario pinned as A and loaded as B.
    pub fn new() -> Self {
        Self {
            preset: "baseline".to_string(),
            ..Self::default()
        }
    }

    /// Starts from a loaded scenario file. The baseline stays pinned as A.
    pub fn from_config(config: &ScenarioConfig) -> Self {
        let mut session = Self::new();
        session.load_config(config);
        session
    }

    /// Replaces scenario B with a loaded scenario, budget included. The
    /// pinned scenario is kept.
    pub fn load_config(&mut self, config: &ScenarioConfig) {
        self.params = config.params;
        self.overrides = config.district_overrides();
        self.preset = "custom".to_string();
        self.budget_warning = None;
    }

    pub fn params(&self) -> &CityParams {
        &self.params
    }

    pub fn overrides(&self) -> &DistrictOverrides {
        &self.overrides
    }

    pub fn live(&self) -> Option<&LiveInputs> {
        self.live.as_ref()
    }

    pub fn pinned(&self) -> &PinnedScenario {
        &self.pinned
    }

    pub fn selected_hour(&self) -> usize {
        self.selected_hour
    }

    pub fn preset(&self) -> &str {
        &self.preset
    }

    /// Warning left by the last rejected budgeted change, cleared by the
    /// next accepted one.
    pub fn budget_warning(&self) -> Option<&str> {
        self.budget_warning.as_deref()
    }

    pub fn cache(&self) -> &SimCache {
        &self.cache
    }

    /// Loads a preset's parameters, keeping the current budget and
    /// clearing all district overrides.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn apply_preset(&mut self, name: &str) -> Result<(), ConfigError> {
        let preset = ScenarioConfig::from_preset(name)?;
        self.params = preset.params.with_budget(self.params.budget_m);
        self.overrides = DistrictOverrides::new();
        self.preset = name.to_string();
        info!(preset = name, "preset applied");
        Ok(())
    }

    pub fn set_ev_adoption_delta(&mut self, value: f64) {
        self.params.ev_adoption_delta = clamp(value, EV_DELTA_RANGE.0, EV_DELTA_RANGE.1);
    }

    pub fn set_solar_delta(&mut self, value: f64) {
        self.params.solar_delta = clamp(value, SOLAR_DELTA_RANGE.0, SOLAR_DELTA_RANGE.1);
    }

    pub fn set_storage_mwh(&mut self, value: f64) {
        self.params.storage_mwh = clamp(value, STORAGE_RANGE.0, STORAGE_RANGE.1);
    }

    pub fn set_budget_m(&mut self, value: f64) {
        self.params.budget_m = value.max(0.0);
    }

    /// Applies `next` if spending `delta` more fits the budget. Rejections
    /// leave the state untouched and set the budget warning.
    fn budgeted(&mut self, delta: f64, params: CityParams, overrides: DistrictOverrides) -> bool {
        let used = self.budget_used();
        if can_afford_change(self.params.budget_m, used, delta) {
            self.params = params;
            self.overrides = overrides;
            self.budget_warning = None;
            true
        } else {
            warn!(
                used_m = used,
                delta_m = delta,
                budget_m = self.params.budget_m,
                "budgeted change rejected"
            );
            self.budget_warning = Some(BUDGET_EXCEEDED.to_string());
            false
        }
    }

    /// Flips a flag. Microgrid and demand response are charged against the
    /// budget when switched on. Returns `false` if the change was rejected.
    pub fn toggle(&mut self, toggle: Toggle) -> bool {
        let next = self.params.toggled(toggle);
        match toggle.budget_cost_m() {
            Some(cost) => {
                let delta = if self.params.flag(toggle) { -cost } else { cost };
                self.budgeted(delta, next, self.overrides)
            }
            None => {
                self.params = next;
                true
            }
        }
    }

    fn update_district(
        &mut self,
        id: DistrictId,
        delta: f64,
        f: impl FnOnce(DistrictOverride) -> DistrictOverride,
    ) -> bool {
        let next = self.overrides.updated(id, f);
        self.budgeted(delta, self.params, next)
    }

    pub fn add_district_storage(&mut self, id: DistrictId, mwh: f64) -> bool {
        self.update_district(id, mwh * STORAGE_COST_PER_MWH, |o| o.add_storage(mwh))
    }

    pub fn add_district_capacity(&mut self, id: DistrictId, mw: f64) -> bool {
        self.update_district(id, mw / 10.0 * CAPACITY_COST_PER_10MW, |o| o.add_capacity(mw))
    }

    pub fn add_district_solar(&mut self, id: DistrictId, boost: f64) -> bool {
        self.update_district(id, boost / 0.1 * SOLAR_COST_PER_STEP, |o| o.add_solar(boost))
    }

    pub fn toggle_district_dr(&mut self, id: DistrictId) -> bool {
        let delta = if self.overrides.get(id).dr_enabled {
            -LOCAL_DR_COST
        } else {
            LOCAL_DR_COST
        };
        self.update_district(id, delta, DistrictOverride::toggle_dr)
    }

    /// Removes every intervention from one district. Never rejected.
    pub fn clear_district(&mut self, id: DistrictId) {
        self.overrides = self.overrides.cleared(id);
    }

    /// Captures scenario B as the new comparison scenario A.
    pub fn pin_current(&mut self) {
        let live_suffix = if self.live.is_some() { " + Live" } else { "" };
        self.pinned = PinnedScenario {
            label: format!("{}{live_suffix} (Pinned)", preset_title(&self.preset)),
            params: self.params,
            overrides: self.overrides,
            live: self.live.clone(),
        };
        info!(label = %self.pinned.label, "scenario pinned as A");
    }

    /// Back to baseline parameters, no overrides, hour 0. The pinned
    /// scenario, live inputs and cache are kept.
    pub fn reset(&mut self) {
        self.params = CityParams::default();
        self.overrides = DistrictOverrides::new();
        self.selected_hour = 0;
        self.preset = "baseline".to_string();
        self.budget_warning = None;
    }

    /// Selects an hour, clamped into `0..=72`.
    pub fn set_hour(&mut self, hour: usize) {
        self.selected_hour = hour.min(HORIZON_HOURS);
    }

    pub fn set_live(&mut self, live: Option<LiveInputs>) {
        self.live = live;
    }

    pub fn result_a(&mut self) -> Arc<SimulationResult> {
        let pinned = &self.pinned;
        self.cache
            .get_or_run(&pinned.params, &pinned.overrides, pinned.live.as_ref())
    }

    pub fn result_b(&mut self) -> Arc<SimulationResult> {
        self.cache
            .get_or_run(&self.params, &self.overrides, self.live.as_ref())
    }

    pub fn recommendations(&mut self) -> RecommendationOutput {
        let a = self.result_a();
        let b = self.result_b();
        build_recommendations(RecommendationInput {
            result_a: &a,
            result_b: &b,
            params_b: &self.params,
            overrides_b: &self.overrides,
            selected_hour: self.selected_hour,
            live_b: self.live.as_ref(),
        })
    }

    pub fn budget_used(&self) -> f64 {
        compute_budget_used(&self.params, &self.overrides)
    }

    pub fn intervention_count(&self) -> usize {
        self.overrides.count_interventions()
    }

    pub fn roi_score(&mut self) -> f64 {
        let a = self.result_a();
        let b = self.result_b();
        roi_score(&a, &b, self.budget_used())
    }

    /// Plain-text brief of scenario B for hand-off.
    pub fn ops_brief(&mut self) -> String {
        let b = self.result_b();
        let recs = self.recommendations();
        let mode = self.live.as_ref().map_or("Synthetic", |l| l.label.as_str());
        let top_risk: Vec<String> = b
            .summary
            .top_risk
            .iter()
            .map(|r| format!("{} ({:.0}%)", r.id, r.probability * 100.0))
            .collect();
        let top_actions: Vec<String> = recs
            .actions
            .iter()
            .map(|a| {
                let sign = if a.impact.resilience_delta >= 0 { "+" } else { "" };
                format!("{}: {sign}{} resilience", a.title, a.impact.resilience_delta)
            })
            .collect();

        [
            "CityGrid Twin Ops Brief".to_string(),
            format!("Mode: {mode}"),
            format!("Peak Hour: T+{}h", b.peak_hour),
            format!("Top Risk Districts: {}", top_risk.join(", ")),
            format!(
                "Budget Used: {:.2}M / {:.1}M",
                self.budget_used(),
                self.params.budget_m
            ),
            format!(
                "Compare Delta: Peak {:.1} MW, Overloads {}, Resilience {}",
                recs.compare.peak_delta_mw, recs.compare.overload_delta, recs.compare.resilience_delta
            ),
            format!("Top Actions: {}", top_actions.join(" | ")),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_baseline() {
        let s = Session::new();
        assert_eq!(s.params(), &CityParams::default());
        assert_eq!(s.pinned().label, "Baseline");
        assert_eq!(s.preset(), "baseline");
        assert_eq!(s.budget_warning(), None);
    }

    #[test]
    fn preset_keeps_budget_and_clears_overrides() {
        let mut s = Session::new();
        s.set_budget_m(9.0);
        assert!(s.add_district_storage(DistrictId::Downtown, 1.0));
        assert!(s.apply_preset("storm_stress").is_ok());
        assert_eq!(s.params().budget_m, 9.0);
        assert!(s.params().storm_enabled);
        assert!(!s.overrides().has_overrides());
        assert!(s.apply_preset("tornado").is_err());
        assert_eq!(s.preset(), "storm_stress");
    }

    #[test]
    fn rejected_change_leaves_state_unchanged() {
        let mut s = Session::new();
        s.set_budget_m(1.0);
        assert!(s.add_district_storage(DistrictId::Medical, 1.5));
        let before = *s.overrides();
        assert!(!s.toggle(Toggle::Microgrid));
        assert!(!s.params().microgrid_enabled);
        assert_eq!(s.overrides(), &before);
        assert_eq!(s.budget_warning(), Some(BUDGET_EXCEEDED));

        // a refund always passes and clears the warning
        assert!(s.add_district_storage(DistrictId::Medical, -1.5));
        assert_eq!(s.budget_warning(), None);
    }

    #[test]
    fn switching_budgeted_flag_off_always_passes() {
        let mut s = Session::new();
        assert!(s.toggle(Toggle::Microgrid));
        s.set_budget_m(0.0);
        assert!(s.toggle(Toggle::Microgrid));
        assert!(!s.params().microgrid_enabled);
    }

    #[test]
    fn unbudgeted_toggles_ignore_budget() {
        let mut s = Session::new();
        s.set_budget_m(0.0);
        assert!(s.toggle(Toggle::Heatwave));
        assert!(s.params().heatwave_enabled);
    }

    #[test]
    fn sliders_clamp_to_range() {
        let mut s = Session::new();
        s.set_ev_adoption_delta(1.0);
        s.set_solar_delta(-1.0);
        s.set_storage_mwh(99.0);
        assert_eq!(s.params().ev_adoption_delta, 0.3);
        assert_eq!(s.params().solar_delta, -0.1);
        assert_eq!(s.params().storage_mwh, 5.0);
    }

    #[test]
    fn hour_is_clamped() {
        let mut s = Session::new();
        s.set_hour(500);
        assert_eq!(s.selected_hour(), 72);
    }

    #[test]
    fn pin_captures_current_scenario() {
        let mut s = Session::new();
        assert!(s.apply_preset("heatwave_ev_surge").is_ok());
        s.pin_current();
        assert_eq!(s.pinned().label, "Heatwave + EV Surge (Pinned)");
        assert!(s.pinned().params.heatwave_enabled);
        s.reset();
        assert!(!s.params().heatwave_enabled);
        assert!(s.pinned().params.heatwave_enabled);
    }

    #[test]
    fn results_are_cached() {
        let mut s = Session::new();
        let a = s.result_a();
        let b = s.result_b();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(s.cache().len(), 1);
    }

    #[test]
    fn clear_district_is_free() {
        let mut s = Session::new();
        assert!(s.toggle_district_dr(DistrictId::North));
        s.set_budget_m(0.0);
        s.clear_district(DistrictId::North);
        assert_eq!(s.intervention_count(), 0);
    }

    #[test]
    fn ops_brief_lines() {
        let mut s = Session::new();
        let brief = s.ops_brief();
        let lines: Vec<&str> = brief.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], "Mode: Synthetic");
        assert!(lines[4].starts_with("Budget Used: 0.00M / 5.0M"));
        assert!(lines[5].starts_with("Compare Delta: Peak 0.0 MW, Overloads 0, Resilience 0"));
    }
}
