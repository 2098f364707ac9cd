//! Risk feed: short operator-facing lines about scenario B.

use std::fmt;

use serde::Serialize;

use crate::city::CityParams;
use crate::sim::{HORIZON_HOURS, RiskEntry, SimulationResult};

/// Midday hours of day two used for the renewables share.
const MIDDAY_HOURS: std::ops::RangeInclusive<usize> = 35..=38;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedLevel {
    Warn,
    Info,
    Ok,
}

impl FeedLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedLevel::Warn => "warn",
            FeedLevel::Info => "info",
            FeedLevel::Ok => "ok",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub level: FeedLevel,
    pub text: String,
}

impl FeedItem {
    fn new(level: FeedLevel, text: String) -> Self {
        Self { level, text }
    }
}

impl fmt::Display for FeedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level.as_str(), self.text)
    }
}

/// Builds the feed for scenario B at `hour`.
pub fn build_risk_feed(
    result_b: &SimulationResult,
    params_b: &CityParams,
    worst: RiskEntry,
    hour: usize,
    budget_used: f64,
) -> Vec<FeedItem> {
    let hour = hour.min(HORIZON_HOURS);
    let mut feed = Vec::with_capacity(6);

    let level = if worst.probability > 0.75 || worst.stress > 1.0 {
        FeedLevel::Warn
    } else {
        FeedLevel::Info
    };
    feed.push(FeedItem::new(
        level,
        format!(
            "T+{hour}h worst zone: {} (Stress {:.2}, Risk {:.0}%).",
            worst.id.name(),
            worst.stress,
            worst.probability * 100.0
        ),
    ));

    if let Some(top) = result_b.summary.top_risk.first() {
        let level = if top.stress > 1.0 { FeedLevel::Warn } else { FeedLevel::Info };
        feed.push(FeedItem::new(
            level,
            format!(
                "Peak projection at T+{}h flags {} as top overload candidate.",
                result_b.peak_hour,
                top.id.name()
            ),
        ));
    }

    let solar: f64 = MIDDAY_HOURS.map(|h| result_b.city.solar_mw[h]).sum();
    let load: f64 = MIDDAY_HOURS.map(|h| result_b.city.load_mw[h]).sum();
    feed.push(FeedItem::new(
        FeedLevel::Ok,
        format!(
            "Renewables offset {:.1}% of midday demand in Scenario B.",
            solar / load.max(1.0) * 100.0
        ),
    ));

    let peak_cost = result_b.cost_at_peak();
    if peak_cost > 1.5 {
        feed.push(FeedItem::new(
            FeedLevel::Warn,
            format!("Cost pressure elevated at peak (Index {peak_cost:.2}). Dispatch optimization advised."),
        ));
    }

    if worst.id.is_critical() && worst.probability > 0.62 {
        feed.push(FeedItem::new(
            FeedLevel::Warn,
            format!(
                "Critical infrastructure exposure detected in {}. Prioritize protective interventions.",
                worst.id.name()
            ),
        ));
    }

    let verdict = if budget_used > params_b.budget_m {
        "Over allocation risk."
    } else {
        "Within approved cap."
    };
    feed.push(FeedItem::new(
        FeedLevel::Info,
        format!(
            "Budget utilization {budget_used:.2}M / {:.1}M. {verdict}",
            params_b.budget_m
        ),
    ));

    feed
}
