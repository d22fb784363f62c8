//! Bounded concurrent dispatch of records to enrichment workers.
//!
//! Records are queued on a bounded channel and drained by a single driver
//! task. The driver runs at most `max_parallel` enrichments at a time, each
//! in its own task so a panicking worker cannot take the pipeline down.
//!
//! - **Unordered**: results are emitted as workers finish.
//! - **Ordered**: results are released in arrival order. Finished results
//!   wait in a reorder buffer of `reorder_capacity` slots; when it is full the
//!   driver stops draining the queue and `submit` waits (backpressure).
//!
//! Every submitted record produces exactly one emitted record.

pub mod ports;

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use imds_tagger_domain::constants::{
    DEFAULT_MAX_ORDERED_QUEUE_SIZE, DEFAULT_MAX_PARALLEL_CALLS, DEFAULT_QUEUE_CAPACITY,
};
use imds_tagger_domain::{Metric, Result, TaggerConfig, TaggerError};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use self::ports::{MetricSink, RecordEnricher};

/// Output ordering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Emit in completion order.
    Unordered,
    /// Emit in arrival order, holding at most `reorder_capacity` records.
    Ordered { reorder_capacity: usize },
}

/// Configuration for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Maximum number of concurrently running enrichments.
    pub max_parallel: usize,
    /// Depth of the input queue.
    pub queue_capacity: usize,
    pub mode: DispatchMode,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL_CALLS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            mode: DispatchMode::Unordered,
        }
    }
}

impl DispatcherConfig {
    /// Derive dispatcher settings from the stage configuration.
    pub fn from_tagger_config(config: &TaggerConfig) -> Self {
        let mode = if config.ordered {
            DispatchMode::Ordered { reorder_capacity: DEFAULT_MAX_ORDERED_QUEUE_SIZE }
        } else {
            DispatchMode::Unordered
        };
        Self { max_parallel: config.max_parallel_calls, queue_capacity: config.queue_capacity, mode }
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns `TaggerError::Config` if any capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_parallel == 0 {
            return Err(TaggerError::Config("max_parallel must be greater than 0".into()));
        }
        if self.queue_capacity == 0 {
            return Err(TaggerError::Config("queue_capacity must be greater than 0".into()));
        }
        if let DispatchMode::Ordered { reorder_capacity: 0 } = self.mode {
            return Err(TaggerError::Config("reorder_capacity must be greater than 0".into()));
        }
        Ok(())
    }
}

/// Running dispatcher: an input queue plus the driver task draining it.
pub struct Dispatcher {
    sender: Option<mpsc::Sender<Metric>>,
    driver: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawn the driver task. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns `TaggerError::Config` if the configuration is invalid.
    pub fn spawn(
        enricher: Arc<dyn RecordEnricher>,
        sink: Arc<dyn MetricSink>,
        config: DispatcherConfig,
    ) -> Result<Self> {
        config.validate()?;

        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        info!(
            max_parallel = config.max_parallel,
            queue_capacity = config.queue_capacity,
            mode = ?config.mode,
            "Starting dispatcher"
        );
        let driver = tokio::spawn(drive(receiver, enricher, sink, config));

        Ok(Self { sender: Some(sender), driver: Some(driver) })
    }

    /// Queue one record, waiting while the queue is full.
    ///
    /// # Errors
    /// `TaggerError::InvalidState` after [`shutdown`](Self::shutdown);
    /// `TaggerError::Internal` if the driver task is gone.
    pub async fn submit(&self, metric: Metric) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| TaggerError::InvalidState("dispatcher is shut down".into()))?;

        sender
            .send(metric)
            .await
            .map_err(|_| TaggerError::Internal("dispatcher driver is no longer running".into()))
    }

    /// Returns true until [`shutdown`](Self::shutdown) is called.
    pub fn is_running(&self) -> bool {
        self.sender.is_some()
    }

    /// Close the queue and wait until every accepted record has been emitted.
    ///
    /// # Errors
    /// `TaggerError::InvalidState` when already shut down;
    /// `TaggerError::Internal` if the driver task panicked.
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.sender.take().is_none() {
            return Err(TaggerError::InvalidState("dispatcher is shut down".into()));
        }

        if let Some(driver) = self.driver.take() {
            driver
                .await
                .map_err(|err| TaggerError::Internal(format!("dispatcher driver failed: {err}")))?;
        }

        info!("Dispatcher drained and stopped");
        Ok(())
    }
}

async fn drive(
    receiver: mpsc::Receiver<Metric>,
    enricher: Arc<dyn RecordEnricher>,
    sink: Arc<dyn MetricSink>,
    config: DispatcherConfig,
) {
    let permits = Arc::new(Semaphore::new(config.max_parallel));

    let incoming = stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|metric| (metric, receiver))
    });
    let work = incoming.map(move |metric| {
        run_contained(Arc::clone(&enricher), Arc::clone(&permits), metric)
    });
    let emit = |metric: Metric| {
        let sink = Arc::clone(&sink);
        async move { sink.emit(metric).await }
    };

    match config.mode {
        DispatchMode::Unordered => work.buffer_unordered(config.max_parallel).for_each(emit).await,
        DispatchMode::Ordered { reorder_capacity } => {
            work.buffered(reorder_capacity).for_each(emit).await
        }
    }

    debug!("Dispatcher queue closed and drained");
}

/// Run one enrichment under a worker permit, in its own task.
///
/// A panicking enrichment is replaced by the record as it was submitted.
async fn run_contained(
    enricher: Arc<dyn RecordEnricher>,
    permits: Arc<Semaphore>,
    metric: Metric,
) -> Metric {
    // The semaphore is never closed, so acquisition only waits.
    let _permit = permits.acquire_owned().await.ok();

    let fallback = metric.clone();
    match tokio::spawn(async move { enricher.enrich(metric).await }).await {
        Ok(enriched) => enriched,
        Err(err) => {
            error!(
                metric = %fallback.name,
                error = %err,
                "Enrichment worker failed; emitting record untagged"
            );
            fallback
        }
    }
}
