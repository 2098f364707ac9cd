//! City model inputs: the fixed district catalog, the scenario-global
//! parameters and per-district overrides.

pub mod catalog;
pub mod overrides;
pub mod params;

pub use catalog::{DISTRICT_COUNT, DISTRICTS, District, DistrictId, EDGES, Sensitivity, UnknownDistrict};
pub use overrides::{DistrictOverride, DistrictOverrides};
pub use params::{CityParams, DEFAULT_BUDGET_M, Toggle};
