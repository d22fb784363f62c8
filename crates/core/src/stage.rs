//! Stage lifecycle
//!
//! Validates the configuration, owns the enricher and its cache, and runs the
//! dispatcher plus a background sweep that purges expired cache entries.
//! Join handles are tracked and cancellation is explicit.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use imds_tagger_domain::constants::CACHE_PURGE_INTERVAL;
use imds_tagger_domain::{Metric, Result, TaggerConfig, TaggerError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::dispatch::ports::MetricSink;
use crate::dispatch::{Dispatcher, DispatcherConfig};
use crate::enrichment::ports::{AttributeCache, InstanceMetadataProvider};
use crate::enrichment::{EnrichmentMetrics, MetadataEnricher};
use crate::processor_ports::StreamingProcessor;

const SWEEPER_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Metadata tagging stage with explicit lifecycle management.
pub struct TaggerStage {
    enricher: Arc<MetadataEnricher>,
    cache: Arc<dyn AttributeCache>,
    dispatcher_config: DispatcherConfig,
    purge_interval: Duration,
    dispatcher: Option<Dispatcher>,
    sweeper: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
}

impl TaggerStage {
    /// Validate `config` and build a stopped stage.
    ///
    /// # Errors
    /// Returns `TaggerError::Config` when the configuration is invalid; the
    /// stage is not created.
    pub fn new(
        config: &TaggerConfig,
        provider: Arc<dyn InstanceMetadataProvider>,
        cache: Arc<dyn AttributeCache>,
    ) -> Result<Self> {
        let fields = config.validate()?;
        let dispatcher_config = DispatcherConfig::from_tagger_config(config);
        dispatcher_config.validate()?;

        debug!(
            fields = ?fields.iter().map(|f| f.as_str()).collect::<Vec<_>>(),
            timeout_ms = config.timeout.as_millis() as u64,
            "Initializing metadata tagging stage"
        );

        let enricher =
            Arc::new(MetadataEnricher::new(fields, provider, Arc::clone(&cache), config.timeout));

        Ok(Self {
            enricher,
            cache,
            dispatcher_config,
            purge_interval: CACHE_PURGE_INTERVAL,
            dispatcher: None,
            sweeper: None,
            cancellation: CancellationToken::new(),
        })
    }

    /// Override how often expired cache entries are purged.
    #[must_use]
    pub fn with_purge_interval(mut self, interval: Duration) -> Self {
        self.purge_interval = interval;
        self
    }

    pub fn metrics(&self) -> Arc<EnrichmentMetrics> {
        self.enricher.metrics()
    }

    pub fn enricher(&self) -> Arc<MetadataEnricher> {
        Arc::clone(&self.enricher)
    }

    /// Returns true between `start` and `stop`.
    pub fn is_running(&self) -> bool {
        self.dispatcher.is_some()
    }

    /// Start the dispatcher and the cache sweeper.
    ///
    /// # Errors
    /// `TaggerError::InvalidState` if the stage is already running.
    #[instrument(skip(self, sink))]
    pub async fn start(&mut self, sink: Arc<dyn MetricSink>) -> Result<()> {
        if self.is_running() {
            return Err(TaggerError::InvalidState("stage already running".into()));
        }

        if self.purge_interval.is_zero() {
            return Err(TaggerError::Config("purge interval must be greater than 0".into()));
        }

        let enricher: Arc<MetadataEnricher> = Arc::clone(&self.enricher);
        let dispatcher = Dispatcher::spawn(enricher, sink, self.dispatcher_config.clone())?;

        self.cancellation = CancellationToken::new();
        let cache = Arc::clone(&self.cache);
        let interval = self.purge_interval;
        let cancel = self.cancellation.clone();
        self.sweeper = Some(tokio::spawn(async move {
            sweep_loop(cache, interval, cancel).await;
        }));
        self.dispatcher = Some(dispatcher);

        info!("Metadata tagging stage started");
        Ok(())
    }

    /// Submit one record for enrichment.
    ///
    /// # Errors
    /// `TaggerError::InvalidState` if the stage is not running.
    pub async fn process(&self, metric: Metric) -> Result<()> {
        match &self.dispatcher {
            Some(dispatcher) => dispatcher.submit(metric).await,
            None => Err(TaggerError::InvalidState("stage is not running".into())),
        }
    }

    /// Stop accepting records, flush everything in flight, then stop the
    /// sweeper.
    ///
    /// # Errors
    /// `TaggerError::InvalidState` if the stage is not running;
    /// `TaggerError::Internal` if a background task failed.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<()> {
        let mut dispatcher = self
            .dispatcher
            .take()
            .ok_or_else(|| TaggerError::InvalidState("stage is not running".into()))?;

        info!("Stopping metadata tagging stage");
        let drained = dispatcher.shutdown().await;

        self.cancellation.cancel();
        if let Some(handle) = self.sweeper.take() {
            match tokio::time::timeout(SWEEPER_JOIN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(error = %err, "Cache sweeper task failed"),
                Err(_) => warn!("Cache sweeper did not stop within timeout"),
            }
        }

        drained?;
        let stats = self.enricher.metrics().snapshot();
        info!(
            fetches = stats.fetches,
            fetch_errors = stats.fetch_errors,
            fetch_timeouts = stats.fetch_timeouts,
            passthroughs = stats.passthroughs,
            cache_hit_rate = stats.hit_rate(),
            "Metadata tagging stage stopped"
        );
        Ok(())
    }
}

#[async_trait]
impl StreamingProcessor for TaggerStage {
    async fn start(&mut self, sink: Arc<dyn MetricSink>) -> Result<()> {
        TaggerStage::start(self, sink).await
    }

    async fn process(&self, metric: Metric) -> Result<()> {
        TaggerStage::process(self, metric).await
    }

    async fn stop(&mut self) -> Result<()> {
        TaggerStage::stop(self).await
    }
}

impl Drop for TaggerStage {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("TaggerStage dropped while running; cancelling cache sweeper");
            self.cancellation.cancel();
        }
    }
}

/// Purge expired cache entries every `interval` until cancelled.
async fn sweep_loop(cache: Arc<dyn AttributeCache>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Cache sweeper cancelled");
                break;
            }
            _ = ticker.tick() => {
                cache.purge_expired();
                debug!(entries = cache.entry_count(), "Purged expired attribute cache entries");
            }
        }
    }
}
