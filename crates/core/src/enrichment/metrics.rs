//! Enrichment counters
//!
//! Tracks cache effectiveness and metadata fetch outcomes for one stage.
//!
//! ## Design
//! - **Relaxed ordering**: every counter is independent, no derived metric
//!   needs a consistent snapshot across counters
//! - **No locking needed** - simple atomic counters

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters updated by [`MetadataEnricher`](super::MetadataEnricher).
#[derive(Debug, Default)]
pub struct EnrichmentMetrics {
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
    fetches: AtomicUsize,
    fetch_errors: AtomicUsize,
    fetch_timeouts: AtomicUsize,
    passthroughs: AtomicUsize,
}

/// Point-in-time copy of [`EnrichmentMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub fetches: usize,
    pub fetch_errors: usize,
    pub fetch_timeouts: usize,
    pub passthroughs: usize,
}

impl EnrichmentStats {
    /// Cache hit rate as a percentage (0.0 to 100.0), 0.0 when unused.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            return 0.0;
        }
        (self.cache_hits as f64 / total as f64) * 100.0
    }
}

impl EnrichmentMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_error(&self) {
        self.fetch_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_timeout(&self) {
        self.fetch_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// A record left the enricher without the requested tags.
    pub fn record_passthrough(&self) {
        self.passthroughs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EnrichmentStats {
        EnrichmentStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            fetch_timeouts: self.fetch_timeouts.load(Ordering::Relaxed),
            passthroughs: self.passthroughs.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let metrics = EnrichmentMetrics::new();
        assert_eq!(metrics.snapshot(), EnrichmentStats::default());
        assert_eq!(metrics.snapshot().hit_rate(), 0.0);
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = EnrichmentMetrics::new();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();
        metrics.record_fetch();
        metrics.record_fetch_error();
        metrics.record_fetch_timeout();
        metrics.record_passthrough();

        let stats = metrics.snapshot();
        assert_eq!(stats.cache_hits, 3);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.fetch_errors, 1);
        assert_eq!(stats.fetch_timeouts, 1);
        assert_eq!(stats.passthroughs, 1);
        assert_eq!(stats.hit_rate(), 75.0);
    }
}
