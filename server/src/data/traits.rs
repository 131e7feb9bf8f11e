//! Sink traits
//!
//! The pipeline writes batches through [`PointSink`] so the storage backend
//! can be swapped (InfluxDB in production, in-memory recorders in tests).

use async_trait::async_trait;

use crate::data::influx::SinkError;
use crate::data::types::OutputPoint;

/// Destination for batches of points
///
/// `write` is awaited inline by the pipeline: a slow sink backpressures the
/// listener. Implementations must not assume the call is retried.
#[async_trait]
pub trait PointSink: Send + Sync {
    /// Sink name for logging
    fn name(&self) -> &str;

    /// Write one batch; either the whole batch is accepted or an error is returned
    async fn write(&self, points: &[OutputPoint]) -> Result<(), SinkError>;
}
