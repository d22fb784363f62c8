//! Integration tests for the `Dispatcher`
//!
//! **Coverage:**
//! - Exactly one output per input in both modes
//! - Ordered mode preserves arrival order under variable per-record latency
//! - Ordered mode applies backpressure once the reorder buffer is full
//! - A panicking worker yields the unmodified record
//! - A closed downstream does not stall shutdown

mod support;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use imds_tagger_core::{DispatchMode, Dispatcher, DispatcherConfig, RecordEnricher};
use imds_tagger_domain::Metric;
use support::{drain, sample_metric, seq_of};
use tokio::sync::{mpsc, Semaphore};

/// Sleeps longer for earlier records so completion order is the reverse of
/// arrival order within each group of ten.
struct DelayBySeq;

#[async_trait]
impl RecordEnricher for DelayBySeq {
    async fn enrich(&self, mut metric: Metric) -> Metric {
        let seq = seq_of(&metric);
        tokio::time::sleep(Duration::from_millis(((10 - seq % 10) * 10) as u64)).await;
        metric.add_tag("done", "true");
        metric
    }
}

/// Holds record 0 until the gate is opened.
struct GatedFirst {
    gate: Arc<Semaphore>,
}

#[async_trait]
impl RecordEnricher for GatedFirst {
    async fn enrich(&self, metric: Metric) -> Metric {
        if seq_of(&metric) == 0 {
            let _permit = self.gate.acquire().await;
        }
        metric
    }
}

/// Panics on even records after tagging them.
struct PanicOnEven;

#[async_trait]
impl RecordEnricher for PanicOnEven {
    async fn enrich(&self, mut metric: Metric) -> Metric {
        metric.add_tag("touched", "yes");
        if seq_of(&metric) % 2 == 0 {
            panic!("worker crashed on record {}", seq_of(&metric));
        }
        metric
    }
}

fn ordered(max_parallel: usize) -> DispatcherConfig {
    DispatcherConfig {
        max_parallel,
        queue_capacity: 10_000,
        mode: DispatchMode::Ordered { reorder_capacity: 10_000 },
    }
}

#[tokio::test(start_paused = true)]
async fn test_ordered_output_matches_arrival_order() {
    let (tx, mut rx) = mpsc::channel(128);
    let mut dispatcher = Dispatcher::spawn(Arc::new(DelayBySeq), Arc::new(tx), ordered(8)).unwrap();

    for seq in 0..50 {
        dispatcher.submit(sample_metric(seq)).await.unwrap();
    }
    dispatcher.shutdown().await.unwrap();

    let seqs: Vec<usize> = drain(&mut rx).iter().map(seq_of).collect();
    assert_eq!(seqs, (0..50).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_unordered_emits_every_record_exactly_once() {
    let (tx, mut rx) = mpsc::channel(128);
    let config = DispatcherConfig { max_parallel: 8, ..Default::default() };
    let mut dispatcher = Dispatcher::spawn(Arc::new(DelayBySeq), Arc::new(tx), config).unwrap();

    for seq in 0..50 {
        dispatcher.submit(sample_metric(seq)).await.unwrap();
    }
    dispatcher.shutdown().await.unwrap();

    let output = drain(&mut rx);
    assert!(output.iter().all(|m| m.tag("done") == Some("true")));

    let mut seqs: Vec<usize> = output.iter().map(seq_of).collect();
    assert_ne!(seqs, (0..50).collect::<Vec<_>>(), "completion order should differ");
    seqs.sort_unstable();
    assert_eq!(seqs, (0..50).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_ordered_mode_blocks_submit_when_reorder_buffer_is_full() {
    let gate = Arc::new(Semaphore::new(0));
    let (tx, mut rx) = mpsc::channel(16);
    let config = DispatcherConfig {
        max_parallel: 4,
        queue_capacity: 1,
        mode: DispatchMode::Ordered { reorder_capacity: 2 },
    };
    let mut dispatcher =
        Dispatcher::spawn(Arc::new(GatedFirst { gate: gate.clone() }), Arc::new(tx), config)
            .unwrap();

    // Records 0 and 1 fill the reorder buffer, record 2 fills the queue.
    for seq in 0..3 {
        dispatcher.submit(sample_metric(seq)).await.unwrap();
    }

    let blocked =
        tokio::time::timeout(Duration::from_millis(100), dispatcher.submit(sample_metric(3))).await;
    assert!(blocked.is_err(), "submit must wait while record 0 is outstanding");
    assert!(drain(&mut rx).is_empty(), "nothing may be released ahead of record 0");

    gate.add_permits(1);
    dispatcher.submit(sample_metric(3)).await.unwrap();
    dispatcher.shutdown().await.unwrap();

    let seqs: Vec<usize> = drain(&mut rx).iter().map(seq_of).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_panicking_worker_emits_original_record() {
    let (tx, mut rx) = mpsc::channel(16);
    let mut dispatcher = Dispatcher::spawn(Arc::new(PanicOnEven), Arc::new(tx), ordered(2)).unwrap();

    let inputs: Vec<Metric> = (0..6).map(sample_metric).collect();
    for metric in inputs.iter().cloned() {
        dispatcher.submit(metric).await.unwrap();
    }
    dispatcher.shutdown().await.unwrap();

    let output = drain(&mut rx);
    assert_eq!(output.len(), 6);
    for (input, output) in inputs.iter().zip(&output) {
        if seq_of(input) % 2 == 0 {
            assert_eq!(output, input);
        } else {
            assert_eq!(output.tag("touched"), Some("yes"));
        }
    }
}

#[tokio::test]
async fn test_closed_downstream_does_not_block_shutdown() {
    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    let mut dispatcher =
        Dispatcher::spawn(Arc::new(DelayBySeq), Arc::new(tx), DispatcherConfig::default()).unwrap();

    for seq in 0..5 {
        dispatcher.submit(sample_metric(seq)).await.unwrap();
    }

    tokio::time::timeout(Duration::from_secs(5), dispatcher.shutdown())
        .await
        .expect("shutdown should finish")
        .unwrap();
}
