/// CSV export of city and per-district series.
pub mod export;
