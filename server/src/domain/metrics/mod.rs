//! Metrics Processing Pipeline
//!
//! Turns decoded collectd samples into InfluxDB points: rate normalization
//! of cumulative values, point mapping and dual-threshold batching.

mod batch;
mod mapper;
mod normalize;
mod pipeline;
mod series;

pub use batch::{BatchAccumulator, FlushOutcome};
pub use mapper::MetricMapper;
pub use normalize::{RateCacheEntry, RateNormalizer};
pub use pipeline::MetricsPipeline;
pub use series::{series_key, series_label};
