//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `transactions_created_total` - Transactions written
//! - `transactions_rejected_total` - Requests rejected before or at write
//! - `discharges_total` - Discharge jobs finished
//! - `discharge_failures_total` - Discharge jobs failed or timed out
//! - `debits_settled_total` - Debits brought to zero by discharge
//! - `discharge_duration_seconds` - Histogram of discharge job latencies
//!
//! Collectors are registered on the collector's own registry, so several
//! ledgers (or tests) can live in one process.

use crate::discharge::{DischargeOutcome, DischargeReport};
use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Transactions written
    pub transactions_created: IntCounter,

    /// Requests rejected
    pub transactions_rejected: IntCounter,

    /// Discharge jobs finished, whatever the outcome
    pub discharges_total: IntCounter,

    /// Discharge jobs that failed or timed out
    pub discharge_failures: IntCounter,

    /// Debits fully settled
    pub debits_settled: IntCounter,

    /// Discharge duration histogram
    pub discharge_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_created =
            IntCounter::new("transactions_created_total", "Total number of transactions written")?;
        registry.register(Box::new(transactions_created.clone()))?;

        let transactions_rejected = IntCounter::new(
            "transactions_rejected_total",
            "Total number of transaction requests rejected",
        )?;
        registry.register(Box::new(transactions_rejected.clone()))?;

        let discharges_total =
            IntCounter::new("discharges_total", "Total number of discharge jobs finished")?;
        registry.register(Box::new(discharges_total.clone()))?;

        let discharge_failures = IntCounter::new(
            "discharge_failures_total",
            "Total number of discharge jobs that failed or timed out",
        )?;
        registry.register(Box::new(discharge_failures.clone()))?;

        let debits_settled = IntCounter::new(
            "debits_settled_total",
            "Total number of debits brought to zero by discharge",
        )?;
        registry.register(Box::new(debits_settled.clone()))?;

        let discharge_duration = Histogram::with_opts(
            HistogramOpts::new(
                "discharge_duration_seconds",
                "Histogram of discharge job latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(discharge_duration.clone()))?;

        Ok(Self {
            transactions_created,
            transactions_rejected,
            discharges_total,
            discharge_failures,
            debits_settled,
            discharge_duration,
            registry,
        })
    }

    /// Record transaction write
    pub fn record_transaction_created(&self) {
        self.transactions_created.inc();
    }

    /// Record rejected request
    pub fn record_transaction_rejected(&self) {
        self.transactions_rejected.inc();
    }

    /// Record a finished discharge job
    pub fn record_discharge(&self, report: &DischargeReport) {
        self.discharges_total.inc();
        self.discharge_duration.observe(report.elapsed.as_secs_f64());

        if report.outcome.is_failure() {
            self.discharge_failures.inc();
        }

        if let DischargeOutcome::Settled { debits_cleared, .. } = report.outcome {
            self.debits_settled.inc_by(debits_cleared as u64);
        }
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
