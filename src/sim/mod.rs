/// Memoized simulation results.
pub mod cache;
/// Time-of-day curve functions.
pub mod curves;
pub mod engine;
pub mod summary;
pub mod types;

pub use cache::{SimCache, SimKey};
pub use engine::{overload_probability, run_simulation, run_simulation_with_live};
pub use summary::{Driver, DriverDirection, drivers};
pub use types::{
    Alert, AlertLevel, CitySeries, DistrictSeries, HORIZON_HOURS, LoadComponents, PeakSummary,
    RiskEntry, SERIES_LEN, SimulationResult,
};
