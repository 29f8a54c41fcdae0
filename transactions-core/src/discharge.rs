//! Discharge (settlement) of open debits by a later credit
//!
//! A credit pays down the account's open debits oldest first until either the
//! credit is exhausted or no debt remains:
//!
//! ```text
//!   remaining = credit.balance
//!   for debit in open_debits (event_date, sequence ascending):
//!       remaining += debit.balance
//!       remaining >= 0  → debit.balance = 0, keep going
//!       remaining <  0  → debit.balance = remaining, remaining = 0, stop
//!   credit.balance = remaining
//! ```
//!
//! The walk only produces a `DischargePlan`. The store commits the plan as a
//! single batch guarded by the balances it was computed from, so a failed or
//! cancelled discharge never leaves the account half settled.

use crate::store::LedgerStore;
use crate::types::{AccountId, Transaction};
use crate::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// One guarded balance change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceUpdate {
    /// Transaction to update
    pub transaction_id: Uuid,

    /// Balance the row must still hold at commit time
    pub expected: Decimal,

    /// Balance to write
    pub new_balance: Decimal,
}

/// Balance changes produced by one discharge walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DischargePlan {
    /// Account the walk ran against
    pub account_id: AccountId,

    /// Debits touched, in settlement order
    pub debits: Vec<BalanceUpdate>,

    /// The credit's own residual
    pub credit: BalanceUpdate,
}

impl DischargePlan {
    /// Walk the open debits with the credit's current balance.
    ///
    /// Returns `None` when nothing would change: the credit has no balance
    /// left, or there is no open debit to pay.
    pub fn compute(credit: &Transaction, open_debits: &[Transaction]) -> Option<Self> {
        if !credit.is_open_credit() {
            return None;
        }

        let mut remaining = credit.balance;
        let mut debits = Vec::new();

        for debit in open_debits.iter().filter(|d| d.is_open_debit()) {
            if remaining.is_zero() {
                break;
            }

            remaining += debit.balance;

            let new_balance = if remaining >= Decimal::ZERO {
                Decimal::ZERO
            } else {
                let partial = remaining;
                remaining = Decimal::ZERO;
                partial
            };

            debits.push(BalanceUpdate {
                transaction_id: debit.transaction_id,
                expected: debit.balance,
                new_balance,
            });
        }

        if debits.is_empty() {
            return None;
        }

        Some(Self {
            account_id: credit.account_id.clone(),
            debits,
            credit: BalanceUpdate {
                transaction_id: credit.transaction_id,
                expected: credit.balance,
                new_balance: remaining,
            },
        })
    }

    /// Every update of the plan, debits first
    pub fn updates(&self) -> impl Iterator<Item = &BalanceUpdate> {
        self.debits.iter().chain(std::iter::once(&self.credit))
    }

    /// Debits the plan settles completely
    pub fn cleared_debits(&self) -> usize {
        self.debits
            .iter()
            .filter(|u| u.new_balance.is_zero())
            .count()
    }

    /// Value moved from the credit to the debits
    pub fn settled_amount(&self) -> Decimal {
        self.credit.expected - self.credit.new_balance
    }
}

/// Request to discharge one credit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DischargeJob {
    /// Credit transaction to settle with
    pub credit_id: Uuid,

    /// Account owning the credit, used for worker routing
    pub account_id: AccountId,
}

impl DischargeJob {
    /// Job for a freshly written credit
    pub fn for_credit(credit: &Transaction) -> Self {
        Self {
            credit_id: credit.transaction_id,
            account_id: credit.account_id.clone(),
        }
    }
}

/// How a discharge job ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DischargeOutcome {
    /// The account had no open debit; the credit keeps its balance
    NoOpenDebits,

    /// The credit had nothing left to allocate
    Skipped {
        /// Credit balance found at job start
        balance: Decimal,
    },

    /// Plan committed
    Settled {
        /// Debits whose balance changed
        debits_touched: usize,

        /// Debits brought to zero
        debits_cleared: usize,

        /// Value moved from the credit to the debits
        settled_amount: Decimal,

        /// Credit balance after settlement
        credit_residual: Decimal,
    },

    /// Read or commit failed; nothing was written
    Failed {
        /// Error description
        reason: String,
    },

    /// Job exceeded its deadline; nothing was written
    TimedOut {
        /// Deadline in milliseconds
        timeout_ms: u64,
    },
}

impl DischargeOutcome {
    /// Failure outcomes
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::TimedOut { .. })
    }
}

/// Result of a discharge job, delivered to report subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DischargeReport {
    /// Credit the job ran for
    pub credit_id: Uuid,

    /// Account of the credit
    pub account_id: AccountId,

    /// Outcome
    pub outcome: DischargeOutcome,

    /// Wall time spent on the job
    pub elapsed: Duration,
}

impl DischargeReport {
    /// Report for a job that did not finish before its deadline
    pub fn timed_out(job: &DischargeJob, timeout: Duration) -> Self {
        Self {
            credit_id: job.credit_id,
            account_id: job.account_id.clone(),
            outcome: DischargeOutcome::TimedOut {
                timeout_ms: timeout.as_millis() as u64,
            },
            elapsed: timeout,
        }
    }
}

/// Runs discharge walks against a ledger store
pub struct DischargeEngine {
    store: Arc<dyn LedgerStore>,
}

impl DischargeEngine {
    /// Create engine
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Discharge one credit; never returns an error, failures land in the report
    pub async fn discharge(&self, job: &DischargeJob) -> DischargeReport {
        let started = Instant::now();

        let outcome = match self.settle(job.credit_id).await {
            Ok(outcome) => outcome,
            Err(e) => DischargeOutcome::Failed {
                reason: e.to_string(),
            },
        };

        DischargeReport {
            credit_id: job.credit_id,
            account_id: job.account_id.clone(),
            outcome,
            elapsed: started.elapsed(),
        }
    }

    async fn settle(&self, credit_id: Uuid) -> Result<DischargeOutcome> {
        let credit = self.store.get(credit_id).await?;

        if !credit.is_open_credit() {
            return Ok(DischargeOutcome::Skipped {
                balance: credit.balance,
            });
        }

        let open_debits = self.store.list_open_debits(&credit.account_id).await?;

        let Some(plan) = DischargePlan::compute(&credit, &open_debits) else {
            tracing::debug!(
                account_id = %credit.account_id,
                credit_id = %credit_id,
                "No open debits to discharge"
            );
            return Ok(DischargeOutcome::NoOpenDebits);
        };

        self.store.apply_discharge(&plan).await?;

        tracing::debug!(
            account_id = %plan.account_id,
            credit_id = %credit_id,
            debits = plan.debits.len(),
            residual = %plan.credit.new_balance,
            "Discharge plan committed"
        );

        Ok(DischargeOutcome::Settled {
            debits_touched: plan.debits.len(),
            debits_cleared: plan.cleared_debits(),
            settled_amount: plan.settled_amount(),
            credit_residual: plan.credit.new_balance,
        })
    }
}
