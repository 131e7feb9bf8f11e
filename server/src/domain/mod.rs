//! Domain logic for metrics forwarding
//!
//! - `metrics` - collectd sample processing pipeline

pub mod metrics;

pub use metrics::MetricsPipeline;
