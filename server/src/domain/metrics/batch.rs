//! Batch accumulation and flushing
//!
//! Points are buffered until either the flush window has elapsed or the
//! pending count reaches the limit. Every flush attempt, successful or not,
//! starts a new window. Failed batches are dropped.

use std::time::{Duration, Instant};

use crate::core::config::BatchConfig;
use crate::data::traits::PointSink;
use crate::data::types::OutputPoint;

/// Result of a flush attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was pending; only the window was reset
    Empty,
    /// Batch of this many points written
    Written(usize),
    /// Batch of this many points dropped after a sink error
    Failed(usize),
}

pub struct BatchAccumulator {
    points: Vec<OutputPoint>,
    window_start: Instant,
    flush_interval: Duration,
    flush_limit: usize,
}

impl BatchAccumulator {
    pub fn new(config: &BatchConfig, now: Instant) -> Self {
        Self {
            points: Vec::with_capacity(config.flush_limit),
            window_start: now,
            flush_interval: config.flush_interval,
            flush_limit: config.flush_limit,
        }
    }

    pub fn accept(&mut self, point: OutputPoint) {
        self.points.push(point);
    }

    pub fn pending(&self) -> usize {
        self.points.len()
    }

    /// When the current window elapses
    pub fn deadline(&self) -> Instant {
        self.window_start + self.flush_interval
    }

    pub fn should_flush(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.window_start) >= self.flush_interval
            || self.points.len() >= self.flush_limit
    }

    /// Write pending points to the sink and start a new window
    pub async fn flush(&mut self, sink: &dyn PointSink, now: Instant) -> FlushOutcome {
        self.window_start = now;

        if self.points.is_empty() {
            return FlushOutcome::Empty;
        }

        let points = std::mem::replace(&mut self.points, Vec::with_capacity(self.flush_limit));
        let count = points.len();

        match sink.write(&points).await {
            Ok(()) => FlushOutcome::Written(count),
            Err(e) => {
                tracing::error!(
                    sink = sink.name(),
                    error = %e,
                    points = count,
                    "Failed to write batch, dropping it"
                );
                FlushOutcome::Failed(count)
            }
        }
    }
}
