//! Transaction service
//!
//! Request path for recording movements:
//!
//! ```text
//! validate amount → resolve operation sign → account exists → write
//!                                                               │
//!                                      credit? → submit DischargeJob
//! ```
//!
//! Everything up to and including the write runs under the request
//! deadline. Discharge runs on the worker pool afterwards; its outcome is
//! only visible through `discharge_reports` and the logs.

use crate::actor::DischargeHandle;
use crate::amount;
use crate::discharge::{DischargeJob, DischargeReport};
use crate::metrics::Metrics;
use crate::store::{AccountLookup, LedgerStore, OperationCatalog};
use crate::types::{AccountId, MakeTransaction, NewTransaction, Transaction};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Records transactions and schedules their discharge
pub struct TransactionService {
    store: Arc<dyn LedgerStore>,
    accounts: Arc<dyn AccountLookup>,
    catalog: Arc<dyn OperationCatalog>,
    discharge: DischargeHandle,
    metrics: Metrics,
    request_timeout: Duration,
}

impl TransactionService {
    /// Create a service over its collaborators.
    ///
    /// `request_timeout` bounds validation, lookups and the write.
    pub fn new(
        store: Arc<dyn LedgerStore>,
        accounts: Arc<dyn AccountLookup>,
        catalog: Arc<dyn OperationCatalog>,
        discharge: DischargeHandle,
        metrics: Metrics,
        request_timeout: Duration,
    ) -> Self {
        Self {
            store,
            accounts,
            catalog,
            discharge,
            metrics,
            request_timeout,
        }
    }

    /// Record a movement and return it as written, before any discharge
    pub async fn make_transaction(&self, request: MakeTransaction) -> Result<Transaction> {
        let account_id = request.account_id.clone();

        let result = match tokio::time::timeout(self.request_timeout, self.record(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.request_timeout.as_millis() as u64)),
        };

        let transaction = match result {
            Ok(transaction) => transaction,
            Err(e) => {
                self.metrics.record_transaction_rejected();
                tracing::warn!(account_id = %account_id, error = %e, "Transaction rejected");
                return Err(e);
            }
        };

        self.metrics.record_transaction_created();
        tracing::info!(
            transaction_id = %transaction.transaction_id,
            account_id = %transaction.account_id,
            operation_type_id = transaction.operation_type_id,
            amount = %transaction.amount,
            "Transaction recorded"
        );

        if transaction.is_credit() {
            // The write already succeeded; a lost job is recoverable through resettle_account
            if let Err(e) = self.discharge.submit(DischargeJob::for_credit(&transaction)) {
                tracing::error!(
                    transaction_id = %transaction.transaction_id,
                    account_id = %transaction.account_id,
                    error = %e,
                    "Failed to schedule discharge"
                );
            }
        }

        Ok(transaction)
    }

    async fn record(&self, request: MakeTransaction) -> Result<Transaction> {
        let magnitude = amount::validate(request.amount)?;

        // Lookup failures are reported as not-found; the cause goes to the log
        let operation_type = match self.catalog.get_by_id(request.operation_type_id).await {
            Ok(Some(operation_type)) => operation_type,
            Ok(None) => return Err(Error::OperationTypeNotFound(request.operation_type_id)),
            Err(e) => {
                tracing::warn!(
                    operation_type_id = request.operation_type_id,
                    error = %e,
                    "Operation type lookup failed"
                );
                return Err(Error::OperationTypeNotFound(request.operation_type_id));
            }
        };

        match self.accounts.exists(&request.account_id).await {
            Ok(true) => {}
            Ok(false) => return Err(Error::AccountNotFound(request.account_id)),
            Err(e) => {
                tracing::warn!(
                    account_id = %request.account_id,
                    error = %e,
                    "Account lookup failed"
                );
                return Err(Error::AccountNotFound(request.account_id));
            }
        }

        let new = NewTransaction {
            account_id: request.account_id,
            operation_type_id: operation_type.operation_type_id,
            amount: operation_type.apply(magnitude),
        };

        self.store
            .create(new)
            .await
            .map_err(|e| Error::TransactionWriteFailed(e.to_string()))
    }

    /// Get transaction by ID
    pub async fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction> {
        self.store.get(transaction_id).await
    }

    /// All transactions of an account, in insertion order
    pub async fn list_account_transactions(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<Transaction>> {
        self.store.list_by_account(account_id).await
    }

    /// Queue a discharge for every open credit of an account, oldest first.
    ///
    /// Returns the number of jobs queued.
    pub async fn resettle_account(&self, account_id: &AccountId) -> Result<usize> {
        let open_credits = self.store.list_open_credits(account_id).await?;

        for credit in &open_credits {
            self.discharge.submit(DischargeJob::for_credit(credit))?;
        }

        tracing::info!(
            account_id = %account_id,
            credits = open_credits.len(),
            "Account resettlement queued"
        );

        Ok(open_credits.len())
    }

    /// Subscribe to discharge reports
    pub fn discharge_reports(&self) -> broadcast::Receiver<DischargeReport> {
        self.discharge.subscribe()
    }

    /// Wait for every discharge accepted so far
    pub async fn flush_discharges(&self) -> Result<()> {
        self.discharge.flush().await
    }

    /// Drain queued discharges and stop the workers
    pub async fn shutdown(&self) -> Result<()> {
        self.discharge.shutdown().await
    }
}
