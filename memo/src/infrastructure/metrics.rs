// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics
//!
//! Prometheus metrics for memoized caches: a registry owned by the
//! service, one `IntCounterVec`/`IntGaugeVec` per signal, labeled by
//! cache name since a process can host several named memoized caches
//! side by side.

use memo_core::{MemoError, Result};
use prometheus::{IntCounterVec, IntGaugeVec, Opts, Registry};
use tracing::debug;

/// Prometheus counters/gauges for every memoized cache in a process,
/// labeled by cache name.
#[derive(Clone)]
pub struct MemoMetrics {
    registry: Registry,
    hits_total: IntCounterVec,
    misses_total: IntCounterVec,
    loads_total: IntCounterVec,
    errors_total: IntCounterVec,
    entries: IntGaugeVec,
    capacity: IntGaugeVec,
}

impl MemoMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let hits_total = IntCounterVec::new(
            Opts::new("memo_cache_hits_total", "Total cache hits").namespace("memo"),
            &["cache"],
        )
        .map_err(metrics_err)?;
        let misses_total = IntCounterVec::new(
            Opts::new("memo_cache_misses_total", "Total cache misses").namespace("memo"),
            &["cache"],
        )
        .map_err(metrics_err)?;
        let loads_total = IntCounterVec::new(
            Opts::new("memo_cache_loads_total", "Total archive promotions into the cache").namespace("memo"),
            &["cache"],
        )
        .map_err(metrics_err)?;
        let errors_total = IntCounterVec::new(
            Opts::new("memo_cache_errors_total", "Total key-encoding errors absorbed by the safe decorator")
                .namespace("memo"),
            &["cache"],
        )
        .map_err(metrics_err)?;
        let entries = IntGaugeVec::new(
            Opts::new("memo_cache_entries", "Current number of entries held in the cache").namespace("memo"),
            &["cache"],
        )
        .map_err(metrics_err)?;
        let capacity = IntGaugeVec::new(
            Opts::new("memo_cache_capacity", "Configured cache capacity").namespace("memo"),
            &["cache"],
        )
        .map_err(metrics_err)?;

        registry.register(Box::new(hits_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(misses_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(loads_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(errors_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(entries.clone())).map_err(metrics_err)?;
        registry.register(Box::new(capacity.clone())).map_err(metrics_err)?;

        debug!("memo metrics registry initialized");

        Ok(Self {
            registry,
            hits_total,
            misses_total,
            loads_total,
            errors_total,
            entries,
            capacity,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Records one sample from a named cache's [`crate::decorator::Stats`]
    /// and its current entry count, incrementing the monotone counters by
    /// the observed delta against `prev_*` and overwriting the
    /// point-in-time gauges.
    pub fn record(
        &self,
        cache_name: &str,
        stats: &crate::decorator::Stats,
        entry_count: usize,
        prev: StatsSample,
    ) {
        let hit_delta = stats.hits.saturating_sub(prev.hits);
        let miss_delta = stats.misses.saturating_sub(prev.misses);
        let load_delta = stats.loads.saturating_sub(prev.loads);
        let error_delta = stats.errors.saturating_sub(prev.errors);

        self.hits_total.with_label_values(&[cache_name]).inc_by(hit_delta);
        self.misses_total.with_label_values(&[cache_name]).inc_by(miss_delta);
        self.loads_total.with_label_values(&[cache_name]).inc_by(load_delta);
        self.errors_total.with_label_values(&[cache_name]).inc_by(error_delta);
        self.entries.with_label_values(&[cache_name]).set(entry_count as i64);
        self.capacity.with_label_values(&[cache_name]).set(stats.capacity as i64);
    }
}

/// The cumulative counters from a previous [`MemoMetrics::record`] call,
/// used to compute the monotone counters' deltas on the next call.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSample {
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub errors: u64,
}

impl From<&crate::decorator::Stats> for StatsSample {
    fn from(stats: &crate::decorator::Stats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            loads: stats.loads,
            errors: stats.errors,
        }
    }
}

fn metrics_err(e: prometheus::Error) -> MemoError {
    MemoError::invariant(format!("metrics error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(hits: u64, misses: u64, loads: u64, errors: u64) -> crate::decorator::Stats {
        crate::decorator::Stats {
            hits,
            misses,
            loads,
            errors,
            capacity: 16,
            policy: "lru",
        }
    }

    #[test]
    fn recording_registers_a_labeled_series() {
        let metrics = MemoMetrics::new().unwrap();
        metrics.record("squares", &stats(3, 1, 0, 0), 3, StatsSample::default());
        let families = metrics.registry().gather();
        assert!(families.iter().any(|f| f.name().contains("hits_total")));
    }

    #[test]
    fn second_record_only_adds_the_delta() {
        let metrics = MemoMetrics::new().unwrap();
        let first = stats(3, 1, 0, 0);
        metrics.record("squares", &first, 3, StatsSample::default());
        let second = stats(5, 2, 0, 0);
        metrics.record("squares", &second, 3, StatsSample::from(&first));

        let families = metrics.registry().gather();
        let hits_family = families.iter().find(|f| f.name().contains("hits_total")).unwrap();
        let total: f64 = hits_family.get_metric().iter().map(|m| m.get_counter().value()).sum();
        assert_eq!(total, 5.0);
    }
}
