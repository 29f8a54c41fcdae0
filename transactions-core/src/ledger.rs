//! Main ledger orchestration layer
//!
//! This module ties together storage, the lookup caches, the discharge
//! workers and the transaction service.
//!
//! # Example
//!
//! ```no_run
//! use rust_decimal::Decimal;
//! use transactions_core::{Config, Ledger, MakeTransaction};
//!
//! #[tokio::main]
//! async fn main() -> transactions_core::Result<()> {
//!     let ledger = Ledger::open(Config::default()).await?;
//!
//!     let account = ledger.accounts().create("12345678900").await?;
//!     ledger
//!         .service()
//!         .make_transaction(MakeTransaction {
//!             account_id: account.account_id,
//!             operation_type_id: 4,
//!             amount: Decimal::new(6000, 2),
//!         })
//!         .await?;
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::{
    accounts::AccountDirectory,
    actor::spawn_discharge_workers,
    catalog::{self, CachedCatalog},
    discharge::DischargeEngine,
    metrics::Metrics,
    service::TransactionService,
    store::OperationCatalog,
    Config, Result, Storage,
};
use std::sync::Arc;

/// Main ledger interface
pub struct Ledger {
    /// Transaction request path
    service: TransactionService,

    /// Account registry
    accounts: AccountDirectory,

    /// Metrics
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Ledger {
    /// Open ledger with configuration
    pub async fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Open storage and make sure the catalog is present
        let storage = Arc::new(Storage::open(&config)?);
        catalog::seed(&storage)?;

        let metrics = Metrics::new()?;

        let cache = &config.cache;
        let accounts =
            AccountDirectory::new(storage.clone(), cache.enabled.then(|| cache.account_ttl()));
        let operation_types: Arc<dyn OperationCatalog> = if cache.enabled {
            Arc::new(CachedCatalog::new(
                storage.clone(),
                cache.operation_type_ttl(),
            ))
        } else {
            Arc::new(CachedCatalog::uncached(storage.clone()))
        };

        // Spawn discharge workers
        let engine = Arc::new(DischargeEngine::new(storage.clone()));
        let discharge = spawn_discharge_workers(engine, &config.discharge, metrics.clone());

        let service = TransactionService::new(
            storage,
            Arc::new(accounts.clone()),
            operation_types,
            discharge,
            metrics.clone(),
            config.service.request_timeout(),
        );

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            data_dir = ?config.data_dir,
            cache_enabled = cache.enabled,
            "Ledger opened"
        );

        Ok(Self {
            service,
            accounts,
            metrics,
            config,
        })
    }

    /// Transaction service
    pub fn service(&self) -> &TransactionService {
        &self.service
    }

    /// Account registry
    pub fn accounts(&self) -> &AccountDirectory {
        &self.accounts
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drain pending discharges and stop the workers
    pub async fn shutdown(&self) -> Result<()> {
        self.service.shutdown().await?;
        tracing::info!("Ledger shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MakeTransaction;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_ledger_open_and_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let ledger = Ledger::open(config).await.unwrap();
        let account = ledger.accounts().create("98765432100").await.unwrap();

        let debit = ledger
            .service()
            .make_transaction(MakeTransaction {
                account_id: account.account_id.clone(),
                operation_type_id: 2,
                amount: dec!(80),
            })
            .await
            .unwrap();
        let credit = ledger
            .service()
            .make_transaction(MakeTransaction {
                account_id: account.account_id.clone(),
                operation_type_id: 4,
                amount: dec!(30),
            })
            .await
            .unwrap();

        ledger.service().flush_discharges().await.unwrap();

        let service = ledger.service();
        assert_eq!(
            service.get_transaction(debit.transaction_id).await.unwrap().balance,
            dec!(-50)
        );
        assert_eq!(
            service.get_transaction(credit.transaction_id).await.unwrap().balance,
            dec!(0)
        );
        assert_eq!(ledger.metrics().transactions_created.get(), 2);
        assert_eq!(ledger.metrics().discharges_total.get(), 1);

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.discharge.workers = 0;

        assert!(Ledger::open(config).await.is_err());
    }
}
