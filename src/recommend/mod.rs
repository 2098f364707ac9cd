//! Counterfactual recommendation engine.
//!
//! Re-simulates scenario B under each of a fixed set of candidate
//! interventions, scores the deltas and ranks the best three. Evaluation is
//! a bounded greedy pass in a fixed order, so identical inputs always yield
//! identical rankings.

pub mod candidates;
pub mod feed;

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::budget::{can_afford_change, compute_budget_used};
use crate::city::{CityParams, DistrictId, DistrictOverrides};
use crate::live::LiveInputs;
use crate::sim::curves::round_to;
use crate::sim::{SimulationResult, run_simulation_with_live};

pub use candidates::{ActionId, Candidate, generate_candidates, top_load_districts};
pub use feed::{FeedItem, FeedLevel, build_risk_feed};

const MAX_ACTIONS: usize = 3;

/// Everything the engine needs about the A/B pair.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationInput<'a> {
    pub result_a: &'a SimulationResult,
    pub result_b: &'a SimulationResult,
    pub params_b: &'a CityParams,
    pub overrides_b: &'a DistrictOverrides,
    pub selected_hour: usize,
    /// Live curves of scenario B, reused for every counterfactual run.
    pub live_b: Option<&'a LiveInputs>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    High,
    Med,
}

/// Deltas of a counterfactual run against scenario B.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActionImpact {
    /// MW, 1 dp.
    pub peak_load_delta_mw: f64,
    pub overload_delta: i64,
    /// Probability, 3 dp.
    pub peak_risk_delta: f64,
    pub resilience_delta: i64,
    /// gCO2/kWh at each run's own peak, 1 dp.
    pub carbon_delta: f64,
    /// Cost index at each run's own peak, 3 dp.
    pub cost_delta: f64,
    /// Percent, 1 dp.
    pub cost_savings_pct: f64,
}

impl ActionImpact {
    /// Ranking score; higher is better.
    pub fn score(&self) -> f64 {
        self.resilience_delta as f64 - 12.0 * (self.overload_delta.max(0) as f64)
            - 0.12 * self.peak_load_delta_mw
            - 30.0 * self.peak_risk_delta
            + 0.5 * self.cost_savings_pct
    }

    pub fn confidence(&self) -> Confidence {
        if self.resilience_delta >= 8 || self.overload_delta <= -1 || self.peak_risk_delta <= -0.12 {
            Confidence::High
        } else {
            Confidence::Med
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionItem {
    pub id: ActionId,
    pub title: String,
    pub rationale: &'static str,
    pub drivers: &'static str,
    pub confidence: Confidence,
    pub impact: ActionImpact,
    pub cost_m: f64,
    pub over_budget: bool,
    pub best_bang_for_buck: bool,
    pub score: f64,
}

impl fmt::Display for ActionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}, {:?}{}{}] {}",
            self.title,
            cost_chip(self),
            self.confidence,
            if self.over_budget { ", over budget" } else { "" },
            if self.best_bang_for_buck { ", best value" } else { "" },
            action_impact_line(self)
        )
    }
}

/// Scenario B relative to the pinned scenario A.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompareSummary {
    pub peak_delta_mw: f64,
    pub overload_delta: i64,
    pub resilience_delta: i64,
    pub carbon_delta: f64,
    pub cost_savings_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationOutput {
    pub risk_feed: Vec<FeedItem>,
    pub actions: Vec<ActionItem>,
    pub compare: CompareSummary,
    pub worst_district: DistrictId,
}

fn cost_savings_pct(before: f64, after: f64) -> f64 {
    (before - after) / before.max(0.1) * 100.0
}

/// Compares B against A at each run's own peak.
pub fn compare(result_a: &SimulationResult, result_b: &SimulationResult) -> CompareSummary {
    CompareSummary {
        peak_delta_mw: round_to(result_b.peak_load_mw - result_a.peak_load_mw, 1),
        overload_delta: result_b.overload_count() as i64 - result_a.overload_count() as i64,
        resilience_delta: i64::from(result_b.resilience_score) - i64::from(result_a.resilience_score),
        carbon_delta: round_to(result_b.carbon_at_peak() - result_a.carbon_at_peak(), 1),
        cost_savings_pct: round_to(
            cost_savings_pct(result_a.cost_at_peak(), result_b.cost_at_peak()),
            1,
        ),
    }
}

fn evaluate(candidate: &Candidate, base: &SimulationResult, live: Option<&LiveInputs>) -> ActionImpact {
    let sim = run_simulation_with_live(&candidate.params, Some(&candidate.overrides), live);
    ActionImpact {
        peak_load_delta_mw: round_to(sim.peak_load_mw - base.peak_load_mw, 1),
        overload_delta: sim.overload_count() as i64 - base.overload_count() as i64,
        peak_risk_delta: round_to(sim.peak_risk() - base.peak_risk(), 3),
        resilience_delta: i64::from(sim.resilience_score) - i64::from(base.resilience_score),
        carbon_delta: round_to(sim.carbon_at_peak() - base.carbon_at_peak(), 1),
        cost_delta: round_to(sim.cost_at_peak() - base.cost_at_peak(), 3),
        cost_savings_pct: round_to(cost_savings_pct(base.cost_at_peak(), sim.cost_at_peak()), 1),
    }
}

/// Ranks the candidate interventions for scenario B and builds the risk
/// feed and A/B comparison.
pub fn build_recommendations(input: RecommendationInput<'_>) -> RecommendationOutput {
    let RecommendationInput {
        result_a,
        result_b,
        params_b,
        overrides_b,
        selected_hour,
        live_b,
    } = input;

    let worst = result_b.worst_district_at(selected_hour);
    let used = compute_budget_used(params_b, overrides_b);

    let mut actions: Vec<ActionItem> = generate_candidates(params_b, overrides_b, worst.id, result_b)
        .into_iter()
        .map(|candidate| {
            let impact = evaluate(&candidate, result_b, live_b);
            let cost_m = candidate.id.cost_m();
            ActionItem {
                id: candidate.id,
                title: candidate.title,
                rationale: candidate.id.rationale(),
                drivers: candidate.id.drivers(),
                confidence: impact.confidence(),
                impact,
                cost_m,
                over_budget: !can_afford_change(params_b.budget_m, used, cost_m),
                best_bang_for_buck: false,
                score: impact.score(),
            }
        })
        .collect();

    actions.sort_by(|a, b| b.score.total_cmp(&a.score));
    actions.truncate(MAX_ACTIONS);

    let mut best: Option<(usize, f64)> = None;
    for (i, action) in actions.iter().enumerate().filter(|(_, a)| !a.over_budget) {
        let value = action.score / action.cost_m.max(0.1);
        if best.is_none_or(|(_, v)| value > v) {
            best = Some((i, value));
        }
    }
    if let Some((i, _)) = best {
        actions[i].best_bang_for_buck = true;
    }

    debug!(
        worst = %worst.id,
        ranked = actions.len(),
        top = actions.first().map(|a| a.id.as_str()).unwrap_or("none"),
        "recommendations built"
    );

    RecommendationOutput {
        risk_feed: build_risk_feed(result_b, params_b, worst, selected_hour, used),
        actions,
        compare: compare(result_a, result_b),
        worst_district: worst.id,
    }
}

/// `+1.2` / `-0.4`; the sign is always present.
///
/// ```
/// use citygrid_twin::recommend::format_signed;
///
/// assert_eq!(format_signed(3.14159, 1), "+3.1");
/// assert_eq!(format_signed(-2.0, 0), "-2");
/// assert_eq!(format_signed(0.0, 1), "+0.0");
/// ```
pub fn format_signed(n: f64, digits: usize) -> String {
    let sign = if n >= 0.0 { '+' } else { '-' };
    format!("{sign}{:.*}", digits, n.abs())
}

pub fn action_impact_line(action: &ActionItem) -> String {
    format!(
        "Peak: {} MW • Risk: {}% • Resilience: {}",
        format_signed(action.impact.peak_load_delta_mw, 1),
        format_signed(action.impact.peak_risk_delta * 100.0, 1),
        format_signed(action.impact.resilience_delta as f64, 0)
    )
}

pub fn compare_line(compare: &CompareSummary) -> String {
    format!(
        "Peak {} MW • Overloads {} • Resilience {} • Cost {}%",
        format_signed(compare.peak_delta_mw, 1),
        format_signed(compare.overload_delta as f64, 0),
        format_signed(compare.resilience_delta as f64, 0),
        format_signed(compare.cost_savings_pct, 1)
    )
}

/// `0.90M`.
pub fn cost_chip(action: &ActionItem) -> String {
    format!("{:.2}M", action.cost_m)
}

/// Probability as a whole percentage, e.g. `73%`.
pub fn risk_label(probability: f64) -> String {
    format!("{:.0}%", probability * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::run_simulation;

    fn impact(resilience: i64, overload: i64, peak: f64, risk: f64, savings: f64) -> ActionImpact {
        ActionImpact {
            peak_load_delta_mw: peak,
            overload_delta: overload,
            peak_risk_delta: risk,
            resilience_delta: resilience,
            carbon_delta: 0.0,
            cost_delta: 0.0,
            cost_savings_pct: savings,
        }
    }

    #[test]
    fn score_penalizes_new_overloads_only() {
        assert_eq!(impact(0, 2, 0.0, 0.0, 0.0).score(), -24.0);
        assert_eq!(impact(0, -1, 0.0, 0.0, 0.0).score(), 0.0);
        let s = impact(5, 0, -10.0, -0.1, 2.0).score();
        assert!((s - (5.0 + 1.2 + 3.0 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn confidence_thresholds() {
        assert_eq!(impact(8, 0, 0.0, 0.0, 0.0).confidence(), Confidence::High);
        assert_eq!(impact(0, -1, 0.0, 0.0, 0.0).confidence(), Confidence::High);
        assert_eq!(impact(0, 0, 0.0, -0.12, 0.0).confidence(), Confidence::High);
        assert_eq!(impact(7, 0, 0.0, -0.11, 0.0).confidence(), Confidence::Med);
    }

    #[test]
    fn compare_identical_is_zero() {
        let r = run_simulation(&CityParams::default(), None);
        let c = compare(&r, &r);
        assert_eq!(c.peak_delta_mw, 0.0);
        assert_eq!(c.overload_delta, 0);
        assert_eq!(c.resilience_delta, 0);
        assert_eq!(compare_line(&c), "Peak +0.0 MW • Overloads +0 • Resilience +0 • Cost +0.0%");
    }

    #[test]
    fn at_most_one_best_value_action() {
        let p = CityParams::default();
        let ov = DistrictOverrides::new();
        let r = run_simulation(&p, None);
        let out = build_recommendations(RecommendationInput {
            result_a: &r,
            result_b: &r,
            params_b: &p,
            overrides_b: &ov,
            selected_hour: 18,
            live_b: None,
        });
        assert!(out.actions.len() <= 3);
        assert_eq!(out.actions.iter().filter(|a| a.best_bang_for_buck).count(), 1);
        for pair in out.actions.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn zero_budget_marks_everything_over_budget() {
        let p = CityParams {
            budget_m: 0.0,
            ..CityParams::default()
        };
        let ov = DistrictOverrides::new();
        let r = run_simulation(&p, None);
        let out = build_recommendations(RecommendationInput {
            result_a: &r,
            result_b: &r,
            params_b: &p,
            overrides_b: &ov,
            selected_hour: 0,
            live_b: None,
        });
        assert!(out.actions.iter().all(|a| a.over_budget && !a.best_bang_for_buck));
    }

    #[test]
    fn chips_and_labels() {
        assert_eq!(risk_label(0.734), "73%");
        assert_eq!(format_signed(-0.05, 1), "-0.1");
    }
}
