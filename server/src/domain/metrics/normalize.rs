//! Rate normalization
//!
//! Turns cumulative COUNTER/DERIVE samples into per-second rates using the
//! last value seen for the same series. The first sample of a series only
//! seeds the cache. There is no wraparound handling: a counter reset shows
//! up as a negative rate.

use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::core::config::RateConfig;
use crate::data::types::{DataKind, DecodedSample};

/// Last sample seen for a series
#[derive(Debug, Clone, PartialEq)]
pub struct RateCacheEntry {
    pub timestamp_ms: i64,
    pub value: f64,
    /// Normalized host the entry belongs to
    pub host: String,
}

pub struct RateNormalizer {
    cache: FxHashMap<String, RateCacheEntry>,
    normalize_counters: bool,
    store_rates: bool,
}

impl RateNormalizer {
    pub fn new(config: &RateConfig) -> Self {
        Self {
            cache: FxHashMap::default(),
            normalize_counters: config.normalize,
            store_rates: config.store_rates,
        }
    }

    fn applies_to(&self, kind: DataKind) -> bool {
        match kind {
            DataKind::Counter => self.normalize_counters,
            DataKind::Derive => self.store_rates,
            DataKind::Gauge | DataKind::Absolute => false,
        }
    }

    /// Value to emit for `sample`, or `None` on the first sighting of a series
    pub fn normalize(&mut self, sample: &DecodedSample, key: &str) -> Option<f64> {
        if !self.applies_to(sample.kind) {
            return Some(sample.value);
        }

        let current = RateCacheEntry {
            timestamp_ms: sample.timestamp_ms,
            value: sample.value,
            host: sample.normalized_host(),
        };

        let Some(previous) = self.cache.insert(key.to_string(), current) else {
            tracing::trace!(series = key, "Seeded rate cache, first sample dropped");
            return None;
        };

        let dv = sample.value - previous.value;
        let dt_ms = sample.timestamp_ms - previous.timestamp_ms;
        if dt_ms > 0 {
            Some(dv / (dt_ms as f64 / 1000.0))
        } else {
            Some(dv)
        }
    }

    /// Drop entries whose last sample is older than `now_ms - max_idle`
    ///
    /// Returns the number of evicted series.
    pub fn evict_idle(&mut self, now_ms: i64, max_idle: Duration) -> usize {
        let max_idle_ms = i64::try_from(max_idle.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now_ms.saturating_sub(max_idle_ms);
        let before = self.cache.len();
        self.cache.retain(|_, entry| entry.timestamp_ms >= cutoff);
        before - self.cache.len()
    }

    pub fn entry(&self, key: &str) -> Option<&RateCacheEntry> {
        self.cache.get(key)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
