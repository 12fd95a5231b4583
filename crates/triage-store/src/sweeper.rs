//! Background expiry sweep for the in-process backend
//!
//! Reads already hide expired contexts; the sweep only reclaims memory.

use crate::store::ContextStore;
use std::sync::Arc;
use tokio::time::{interval, Duration};

/// Counters kept across sweep cycles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepMetrics {
    /// Completed sweep cycles
    pub sweep_count: usize,

    /// Expired contexts dropped
    pub evicted: usize,
}

impl SweepMetrics {
    fn record(&mut self, evicted: usize) {
        self.sweep_count += 1;
        self.evicted += evicted;
    }

    /// One-line report
    pub fn summary(&self) -> String {
        format!(
            "Sweep cycles: {}, expired contexts evicted: {}",
            self.sweep_count, self.evicted
        )
    }
}

/// Runs [`ContextStore::sweep_expired`] on a fixed interval
pub struct ExpirySweeper {
    interval: Duration,
    metrics: SweepMetrics,
}

impl ExpirySweeper {
    /// Create a sweeper firing every `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            metrics: SweepMetrics::default(),
        }
    }

    async fn cycle(&mut self, store: &ContextStore) -> usize {
        let evicted = store.sweep_expired().await;
        self.metrics.record(evicted);
        if evicted > 0 {
            tracing::debug!("Swept {} expired contexts", evicted);
        }
        evicted
    }

    /// Sweep until Ctrl+C
    pub async fn run(&mut self, store: Arc<ContextStore>) {
        let mut ticker = interval(self.interval);
        tracing::info!("Expiry sweeper started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.cycle(&store).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping expiry sweeper");
                    break;
                }
            }
        }

        tracing::info!("Expiry sweeper stopped. {}", self.metrics.summary());
    }

    /// Run a fixed number of cycles
    pub async fn run_cycles(&mut self, store: &ContextStore, cycles: usize) -> usize {
        let mut ticker = interval(self.interval);
        let mut evicted = 0;
        for _ in 0..cycles {
            ticker.tick().await;
            evicted += self.cycle(store).await;
        }
        evicted
    }

    /// Counters so far
    pub fn metrics(&self) -> &SweepMetrics {
        &self.metrics
    }
}
