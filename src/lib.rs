//! City-scale power grid digital twin: a 73-hour district simulation with
//! budgeted interventions, counterfactual recommendations and live-data
//! substitution.

/// Intervention costs and budget accounting.
pub mod budget;
pub mod city;
pub mod config;
pub mod io;
/// Live operator feed normalization and substitution inputs.
pub mod live;
pub mod recommend;
pub mod session;
/// Simulation engine, series types, summaries and result cache.
pub mod sim;

#[cfg(feature = "api")]
pub mod api;
