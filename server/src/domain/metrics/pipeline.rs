//! Metrics Processing Pipeline
//!
//! Single consumer of decoded samples: rate normalization, point mapping,
//! batching and inline sink writes. Owns all of its state, no locks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::batch::{BatchAccumulator, FlushOutcome};
use super::mapper::MetricMapper;
use super::normalize::RateNormalizer;
use super::series::series_key;
use crate::core::config::AppConfig;
use crate::data::traits::PointSink;
use crate::data::types::{DecodedSample, OutputPoint};
use crate::data::typesdb::TypeCatalog;
use crate::utils::time::{millis_to_iso, now_millis};

pub struct MetricsPipeline {
    catalog: Arc<TypeCatalog>,
    sink: Arc<dyn PointSink>,
    normalizer: RateNormalizer,
    mapper: MetricMapper,
    batch: BatchAccumulator,
    max_idle: Option<Duration>,
    drain: bool,
    verbose: bool,
}

impl MetricsPipeline {
    pub fn new(catalog: Arc<TypeCatalog>, sink: Arc<dyn PointSink>, config: &AppConfig) -> Self {
        Self {
            catalog,
            sink,
            normalizer: RateNormalizer::new(&config.rates),
            mapper: MetricMapper::new(config.format.clone()),
            batch: BatchAccumulator::new(&config.batch, Instant::now()),
            max_idle: config.rates.max_idle,
            drain: config.shutdown.drain,
            verbose: config.log.verbose,
        }
    }

    pub fn start(
        mut self,
        mut rx: mpsc::Receiver<DecodedSample>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let deadline = tokio::time::Instant::from_std(self.batch.deadline());

                tokio::select! {
                    biased;
                    result = shutdown_rx.changed() => {
                        if result.is_err() || *shutdown_rx.borrow() {
                            tracing::debug!("MetricsPipeline received shutdown");
                            break;
                        }
                    }
                    sample = rx.recv() => {
                        match sample {
                            Some(sample) => {
                                self.process(sample, Instant::now()).await;
                            }
                            None => {
                                tracing::debug!("Sample channel closed");
                                break;
                            }
                        }
                    }
                    _ = tokio::time::sleep_until(deadline) => {
                        self.tick(Instant::now()).await;
                    }
                }
            }

            if self.drain {
                let outcome = self.flush(Instant::now()).await;
                tracing::info!(outcome = ?outcome, "Final flush on shutdown");
            }
            tracing::debug!("MetricsPipeline shutdown complete");
        })
    }

    /// Run one sample through the pipeline, flushing when a threshold trips
    pub async fn process(&mut self, sample: DecodedSample, now: Instant) -> Option<FlushOutcome> {
        if let Some(point) = self.prepare(&sample) {
            self.batch.accept(point);
        }

        if self.batch.should_flush(now) {
            Some(self.flush(now).await)
        } else {
            None
        }
    }

    /// Time-driven flush
    pub async fn tick(&mut self, now: Instant) -> FlushOutcome {
        self.flush(now).await
    }

    pub fn pending(&self) -> usize {
        self.batch.pending()
    }

    pub fn cached_series(&self) -> usize {
        self.normalizer.len()
    }

    fn prepare(&mut self, sample: &DecodedSample) -> Option<OutputPoint> {
        let sources = self.catalog.lookup(&sample.type_name);
        if sources.is_none() && sample.type_instance.is_empty() {
            tracing::debug!(
                plugin = %sample.plugin,
                type_name = %sample.type_name,
                "Unknown type without type instance, skipping"
            );
            return None;
        }

        let key = series_key(sample, sources);
        let value = self.normalizer.normalize(sample, &key)?;

        match self.mapper.map(sample, value, sources) {
            Ok(point) => {
                if self.verbose {
                    tracing::trace!(
                        series = %key,
                        measurement = point.measurement(),
                        value,
                        time = %millis_to_iso(sample.timestamp_ms),
                        "Ready to send"
                    );
                }
                Some(point)
            }
            Err(e) => {
                tracing::warn!(series = %key, error = %e, "Skipping sample");
                None
            }
        }
    }

    async fn flush(&mut self, now: Instant) -> FlushOutcome {
        let outcome = self.batch.flush(self.sink.as_ref(), now).await;
        if self.verbose
            && let FlushOutcome::Written(count) = outcome
        {
            tracing::trace!(sink = self.sink.name(), points = count, "Wrote batch");
        }
        self.evict_idle();
        outcome
    }

    /// Every flush attempt also drops idle series from the rate cache
    fn evict_idle(&mut self) {
        let Some(max_idle) = self.max_idle else {
            return;
        };
        let evicted = self.normalizer.evict_idle(now_millis(), max_idle);
        if evicted > 0 {
            tracing::debug!(
                evicted,
                remaining = self.normalizer.len(),
                "Evicted idle series from rate cache"
            );
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
