//! Actor-based discharge workers
//!
//! Discharge runs off the request path on a fixed pool of worker actors:
//! - Each account is routed to one worker by hashing its ID, so discharges
//!   of the same account never run concurrently
//! - Different accounts proceed in parallel on different workers
//! - Each worker has an unbounded intake feeding a bounded mailbox: the
//!   mailbox caps the worker's queue, the intake keeps submission order and
//!   never blocks the request path
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │              TransactionService                       │
//! │        credit written → DischargeJob                  │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ blake3(account_id) % workers
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │             DischargeHandle (Clone)                   │
//! │   one intake per worker → bounded mailbox, in order   │
//! └──────┬──────────────────┬──────────────────┬─────────┘
//!        ▼                  ▼                  ▼
//! ┌─────────────┐   ┌─────────────┐    ┌─────────────┐
//! │  Worker 0   │   │  Worker 1   │ .. │  Worker N   │
//! │ one job at  │   │ one job at  │    │ one job at  │
//! │ a time      │   │ a time      │    │ a time      │
//! └──────┬──────┘   └──────┬──────┘    └──────┬──────┘
//!        └──────────────────┼──────────────────┘
//!                           ▼
//!              broadcast::Sender<DischargeReport>
//! ```

use crate::config::DischargeConfig;
use crate::discharge::{DischargeEngine, DischargeJob, DischargeOutcome, DischargeReport};
use crate::metrics::Metrics;
use crate::types::AccountId;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Message sent to a discharge worker
pub enum DischargeMessage {
    /// Discharge one credit
    Discharge {
        /// Credit to discharge
        job: DischargeJob,
        /// Receives the report when set
        response: Option<oneshot::Sender<DischargeReport>>,
    },

    /// Answer once every earlier message has been processed
    Flush {
        /// Answered when the worker reaches this message
        response: oneshot::Sender<()>,
    },

    /// Finish queued jobs, then stop
    Shutdown {
        /// Answered once the queue is drained
        response: oneshot::Sender<()>,
    },
}

/// Worker actor processing discharge jobs one at a time
pub struct DischargeWorker {
    /// Worker index, for logs
    id: usize,

    /// Discharge engine
    engine: Arc<DischargeEngine>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<DischargeMessage>,

    /// Per-job deadline
    job_timeout: Option<Duration>,

    /// Metrics
    metrics: Metrics,

    /// Report fan-out
    reports: broadcast::Sender<DischargeReport>,
}

impl DischargeWorker {
    /// Create new worker
    pub fn new(
        id: usize,
        engine: Arc<DischargeEngine>,
        mailbox: mpsc::Receiver<DischargeMessage>,
        job_timeout: Option<Duration>,
        metrics: Metrics,
        reports: broadcast::Sender<DischargeReport>,
    ) -> Self {
        Self {
            id,
            engine,
            mailbox,
            job_timeout,
            metrics,
            reports,
        }
    }

    /// Run the worker event loop
    pub async fn run(mut self) {
        tracing::debug!(worker = self.id, "Discharge worker started");

        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                DischargeMessage::Discharge { job, response } => {
                    let report = self.process(&job).await;
                    if let Some(response) = response {
                        let _ = response.send(report);
                    }
                }

                DischargeMessage::Flush { response } => {
                    let _ = response.send(());
                }

                DischargeMessage::Shutdown { response } => {
                    self.mailbox.close();
                    while let Ok(queued) = self.mailbox.try_recv() {
                        match queued {
                            DischargeMessage::Discharge { job, response: waiter } => {
                                let report = self.process(&job).await;
                                if let Some(waiter) = waiter {
                                    let _ = waiter.send(report);
                                }
                            }
                            DischargeMessage::Flush { response: waiter }
                            | DischargeMessage::Shutdown { response: waiter } => {
                                let _ = waiter.send(());
                            }
                        }
                    }
                    let _ = response.send(());
                    break;
                }
            }
        }

        tracing::debug!(worker = self.id, "Discharge worker stopped");
    }

    /// Run one job under the deadline, then log, count and publish it
    async fn process(&self, job: &DischargeJob) -> DischargeReport {
        let report = match self.job_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.engine.discharge(job)).await {
                Ok(report) => report,
                Err(_) => DischargeReport::timed_out(job, limit),
            },
            None => self.engine.discharge(job).await,
        };

        match &report.outcome {
            DischargeOutcome::Settled {
                debits_touched,
                settled_amount,
                credit_residual,
                ..
            } => tracing::info!(
                worker = self.id,
                account_id = %report.account_id,
                credit_id = %report.credit_id,
                debits_touched,
                settled_amount = %settled_amount,
                credit_residual = %credit_residual,
                "Credit discharged"
            ),
            DischargeOutcome::NoOpenDebits | DischargeOutcome::Skipped { .. } => tracing::debug!(
                worker = self.id,
                account_id = %report.account_id,
                credit_id = %report.credit_id,
                outcome = ?report.outcome,
                "Nothing to discharge"
            ),
            DischargeOutcome::Failed { reason } => tracing::error!(
                worker = self.id,
                account_id = %report.account_id,
                credit_id = %report.credit_id,
                reason = %reason,
                "Discharge failed"
            ),
            DischargeOutcome::TimedOut { timeout_ms } => tracing::error!(
                worker = self.id,
                account_id = %report.account_id,
                credit_id = %report.credit_id,
                timeout_ms,
                "Discharge timed out"
            ),
        }

        self.metrics.record_discharge(&report);

        // No subscriber is not an error
        let _ = self.reports.send(report.clone());

        report
    }
}

/// Worker index for an account
pub fn partition_for(account_id: &AccountId, partitions: usize) -> usize {
    let hash = blake3::hash(account_id.as_str().as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    (u64::from_le_bytes(prefix) % partitions.max(1) as u64) as usize
}

/// Handle for sending jobs to the worker pool
#[derive(Clone)]
pub struct DischargeHandle {
    intakes: Arc<Vec<mpsc::UnboundedSender<DischargeMessage>>>,
    reports: broadcast::Sender<DischargeReport>,
}

impl DischargeHandle {
    /// Number of workers
    pub fn workers(&self) -> usize {
        self.intakes.len()
    }

    /// Worker that owns an account
    pub fn worker_for(&self, account_id: &AccountId) -> usize {
        partition_for(account_id, self.intakes.len())
    }

    fn intake_for(&self, account_id: &AccountId) -> &mpsc::UnboundedSender<DischargeMessage> {
        &self.intakes[self.worker_for(account_id)]
    }

    /// Queue a job without waiting for it.
    ///
    /// Never blocks: jobs wait in the worker's intake, in submission order,
    /// while its mailbox is full.
    pub fn submit(&self, job: DischargeJob) -> Result<()> {
        self.intake_for(&job.account_id)
            .send(DischargeMessage::Discharge {
                job,
                response: None,
            })
            .map_err(|_| Error::Concurrency("Discharge mailbox closed".to_string()))
    }

    /// Queue a job and wait for its report
    pub async fn submit_and_wait(&self, job: DischargeJob) -> Result<DischargeReport> {
        let (tx, rx) = oneshot::channel();
        self.intake_for(&job.account_id)
            .send(DischargeMessage::Discharge {
                job,
                response: Some(tx),
            })
            .map_err(|_| Error::Concurrency("Discharge mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Subscribe to reports of jobs finished from now on
    pub fn subscribe(&self) -> broadcast::Receiver<DischargeReport> {
        self.reports.subscribe()
    }

    /// Wait until every job accepted so far has finished
    pub async fn flush(&self) -> Result<()> {
        for intake in self.intakes.iter() {
            let (tx, rx) = oneshot::channel();
            intake
                .send(DischargeMessage::Flush { response: tx })
                .map_err(|_| Error::Concurrency("Discharge mailbox closed".to_string()))?;
            rx.await
                .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?;
        }
        Ok(())
    }

    /// Drain queued jobs and stop every worker
    pub async fn shutdown(&self) -> Result<()> {
        let mut pending = Vec::with_capacity(self.intakes.len());
        for intake in self.intakes.iter() {
            let (tx, rx) = oneshot::channel();
            if intake.send(DischargeMessage::Shutdown { response: tx }).is_ok() {
                pending.push(rx);
            }
        }

        for rx in pending {
            let _ = rx.await;
        }

        tracing::info!(workers = self.intakes.len(), "Discharge workers stopped");
        Ok(())
    }
}

/// Move messages from a worker's intake into its bounded mailbox, in order.
///
/// A shutdown closes the intake, so later submits fail, and is forwarded
/// after everything that was already queued.
async fn forward(
    worker: usize,
    mut intake: mpsc::UnboundedReceiver<DischargeMessage>,
    mailbox: mpsc::Sender<DischargeMessage>,
) {
    while let Some(msg) = intake.recv().await {
        let msg = match msg {
            DischargeMessage::Shutdown { response } => {
                intake.close();

                let mut waiting = vec![response];
                while let Ok(queued) = intake.try_recv() {
                    match queued {
                        DischargeMessage::Shutdown { response } => waiting.push(response),
                        other => {
                            if !deliver(worker, &mailbox, other).await {
                                break;
                            }
                        }
                    }
                }

                let (tx, rx) = oneshot::channel();
                if deliver(worker, &mailbox, DischargeMessage::Shutdown { response: tx }).await {
                    let _ = rx.await;
                }
                for response in waiting {
                    let _ = response.send(());
                }
                break;
            }
            other => other,
        };

        if !deliver(worker, &mailbox, msg).await {
            break;
        }
    }

    tracing::debug!(worker, "Discharge intake closed");
}

/// Hand one message to the mailbox, waiting for room when it is full
async fn deliver(
    worker: usize,
    mailbox: &mpsc::Sender<DischargeMessage>,
    msg: DischargeMessage,
) -> bool {
    let msg = match mailbox.try_send(msg) {
        Ok(()) => return true,
        Err(TrySendError::Full(msg)) => msg,
        Err(TrySendError::Closed(_)) => {
            tracing::error!(worker, "Discharge mailbox closed with messages queued");
            return false;
        }
    };

    tracing::debug!(worker, "Discharge mailbox full, holding intake");
    if mailbox.send(msg).await.is_err() {
        tracing::error!(worker, "Discharge mailbox closed with messages queued");
        return false;
    }
    true
}

/// Spawn the discharge worker pool
pub fn spawn_discharge_workers(
    engine: Arc<DischargeEngine>,
    config: &DischargeConfig,
    metrics: Metrics,
) -> DischargeHandle {
    let (reports, _) = broadcast::channel(config.report_capacity.max(1));
    let workers = config.workers.max(1);

    let mut intakes = Vec::with_capacity(workers);
    for id in 0..workers {
        let (tx, rx) = mpsc::channel(config.mailbox_capacity.max(1));
        let worker = DischargeWorker::new(
            id,
            engine.clone(),
            rx,
            config.job_timeout(),
            metrics.clone(),
            reports.clone(),
        );

        tokio::spawn(async move {
            worker.run().await;
        });

        let (intake_tx, intake_rx) = mpsc::unbounded_channel();
        tokio::spawn(forward(id, intake_rx, tx));

        intakes.push(intake_tx);
    }

    tracing::info!(
        workers,
        mailbox_capacity = config.mailbox_capacity,
        job_timeout_ms = config.job_timeout_ms,
        "Discharge workers started"
    );

    DischargeHandle {
        intakes: Arc::new(intakes),
        reports,
    }
}
