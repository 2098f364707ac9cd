//! Live-data adapter: normalizes operator feed payloads and derives city
//! curves that replace the synthetic ones in a simulation run.

pub mod adapter;
pub mod normalize;
pub mod types;

pub use adapter::{
    BUNDLE_LABEL, LiveBundleError, RawFeeds, SEED_LABEL, assemble_bundle, load_bundle, load_seed,
    seed_inputs, to_live_inputs,
};
pub use types::{BasicSnapshot, ForecastPoint, LiveBundle, LiveInputs, OutagePoint, PricePoint, RealtimeSnapshot};
