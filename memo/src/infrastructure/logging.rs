// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging and observability
//!
//! `init_logging` wires up `tracing-subscriber`'s `fmt` layer at the
//! configured [`crate::config::LogLevel`]. [`CacheObservability`] is a
//! small, synchronous hit-rate tracker: it watches a cache's rolling hit
//! rate and logs a warning when it drops below a threshold. It uses
//! `parking_lot::Mutex` and `Instant` rather than an async lock or
//! wall-clock timestamps, since nothing here needs either an async
//! runtime or wall-clock formatting.

use parking_lot::Mutex;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::LogLevel;
use crate::decorator::Stats;

/// Initializes the global `tracing` subscriber at `level`. Call once, at
/// process start; a second call is a silent no-op (mirrors
/// `tracing_subscriber`'s own "first one wins" global-default behavior).
pub fn init_logging(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level.to_tracing_level())
        .try_init();
}

/// Rolling hit-rate threshold below which [`CacheObservability`] logs a
/// warning.
const LOW_HIT_RATE_WARNING_THRESHOLD: f64 = 0.10;

#[derive(Debug, Clone, Copy)]
struct Sample {
    hits: u64,
    misses: u64,
}

/// Tracks a named cache's hit rate over time and logs when it looks
/// unhealthy. This has no metrics-backend dependency of its own —
/// [`crate::infrastructure::metrics`] is the Prometheus side; this is
/// purely the `tracing` side.
pub struct CacheObservability {
    name: String,
    last_sample: Mutex<Sample>,
    started_at: Instant,
}

impl CacheObservability {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_sample: Mutex::new(Sample { hits: 0, misses: 0 }),
            started_at: Instant::now(),
        }
    }

    /// Compares `stats` against the previous observation, logs the delta's
    /// hit rate, and warns if it's below [`LOW_HIT_RATE_WARNING_THRESHOLD`].
    pub fn observe(&self, stats: Stats) {
        let mut last = self.last_sample.lock();
        let delta_hits = stats.hits.saturating_sub(last.hits);
        let delta_misses = stats.misses.saturating_sub(last.misses);
        *last = Sample {
            hits: stats.hits,
            misses: stats.misses,
        };
        drop(last);

        let total = delta_hits + delta_misses;
        if total == 0 {
            return;
        }
        let hit_rate = delta_hits as f64 / total as f64;

        debug!(
            cache = %self.name,
            hits = delta_hits,
            misses = delta_misses,
            hit_rate,
            uptime_secs = self.started_at.elapsed().as_secs(),
            "cache activity"
        );

        if hit_rate < LOW_HIT_RATE_WARNING_THRESHOLD {
            warn!(
                cache = %self.name,
                hit_rate,
                threshold = LOW_HIT_RATE_WARNING_THRESHOLD,
                "low cache hit rate"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(hits: u64, misses: u64) -> Stats {
        Stats {
            hits,
            misses,
            loads: 0,
            errors: 0,
            capacity: 16,
            policy: "lru",
        }
    }

    #[test]
    fn first_observation_establishes_the_baseline() {
        let obs = CacheObservability::new("test");
        obs.observe(stats(5, 5));
        assert_eq!(obs.last_sample.lock().hits, 5);
    }

    #[test]
    fn second_observation_tracks_the_delta_not_the_total() {
        let obs = CacheObservability::new("test");
        obs.observe(stats(10, 0));
        obs.observe(stats(20, 0));
        assert_eq!(obs.last_sample.lock().hits, 20);
    }
}
