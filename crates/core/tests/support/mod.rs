//! Shared test helpers for `imds-tagger-core` integration tests.
//!
//! Lightweight mocks for the core ports so tests can focus on behaviour:
//! a scriptable metadata provider that counts calls, and an attribute cache
//! driven by Tokio's clock so TTL tests can run with paused time.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use imds_tagger_core::{AttributeCache, InstanceMetadataProvider};
use imds_tagger_domain::{InstanceDocument, InstanceField, Metric, Result, TaggerError};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Scriptable `InstanceMetadataProvider` that records how often it is called.
pub struct MockMetadataProvider {
    outcome: Mutex<Result<InstanceDocument>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockMetadataProvider {
    pub fn succeeding(document: InstanceDocument) -> Self {
        Self { outcome: Mutex::new(Ok(document)), delay: Duration::ZERO, calls: AtomicUsize::new(0) }
    }

    pub fn failing(error: TaggerError) -> Self {
        Self { outcome: Mutex::new(Err(error)), delay: Duration::ZERO, calls: AtomicUsize::new(0) }
    }

    /// Delay every response by `delay` (Tokio clock).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_outcome(&self, outcome: Result<InstanceDocument>) {
        *self.outcome.lock() = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InstanceMetadataProvider for MockMetadataProvider {
    async fn fetch(&self, _timeout: Duration) -> Result<InstanceDocument> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.lock().clone()
    }
}

/// Provider whose fetch panics, standing in for a crashing worker.
pub struct PanickingProvider;

#[async_trait]
impl InstanceMetadataProvider for PanickingProvider {
    async fn fetch(&self, _timeout: Duration) -> Result<InstanceDocument> {
        panic!("metadata provider exploded");
    }
}

/// In-memory `AttributeCache` whose expiry follows `tokio::time::Instant`.
pub struct TokioClockCache {
    ttl: Duration,
    entries: Mutex<HashMap<InstanceField, (String, Instant)>>,
    purges: AtomicUsize,
}

impl TokioClockCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()), purges: AtomicUsize::new(0) }
    }

    /// Number of sweeps run so far.
    pub fn purge_count(&self) -> usize {
        self.purges.load(Ordering::SeqCst)
    }
}

impl AttributeCache for TokioClockCache {
    fn get(&self, field: InstanceField) -> Option<String> {
        let entries = self.entries.lock();
        entries
            .get(&field)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(value, _)| value.clone())
    }

    fn set(&self, field: InstanceField, value: String) {
        self.entries.lock().insert(field, (value, Instant::now() + self.ttl));
    }

    fn purge_expired(&self) {
        self.purges.fetch_add(1, Ordering::SeqCst);
        let now = Instant::now();
        self.entries.lock().retain(|_, (_, expires_at)| now < *expires_at);
    }

    fn entry_count(&self) -> u64 {
        self.entries.lock().len() as u64
    }
}

/// The document used across tests: location and zone set, everything else
/// empty.
pub fn eastus_document() -> InstanceDocument {
    InstanceDocument { location: "eastus".into(), zone: "1".into(), ..Default::default() }
}

/// A record with a distinguishing `seq` tag and a couple of fields.
pub fn sample_metric(seq: usize) -> Metric {
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    Metric::new("cpu", ts)
        .with_tag("host", "vm-1")
        .with_tag("seq", seq.to_string())
        .with_field("usage_idle", 97.5)
        .with_field("count", seq as i64)
}

/// Drain everything currently buffered in `rx`.
pub fn drain(rx: &mut mpsc::Receiver<Metric>) -> Vec<Metric> {
    let mut out = Vec::new();
    while let Ok(metric) = rx.try_recv() {
        out.push(metric);
    }
    out
}

pub fn seq_of(metric: &Metric) -> usize {
    metric.tag("seq").and_then(|s| s.parse().ok()).unwrap()
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
