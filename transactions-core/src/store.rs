//! Collaborator contracts consumed by the transaction service
//!
//! The service and the discharge engine only see these traits. `Storage`
//! (RocksDB) and `MemoryStore` implement all of them.

use crate::discharge::DischargePlan;
use crate::types::{Account, AccountId, NewTransaction, OperationType, Transaction};
use crate::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Transaction ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persist a new transaction with `balance == amount`
    async fn create(&self, new: NewTransaction) -> Result<Transaction>;

    /// Fetch a transaction by ID
    async fn get(&self, transaction_id: Uuid) -> Result<Transaction>;

    /// All transactions of an account, in insertion order
    async fn list_by_account(&self, account_id: &AccountId) -> Result<Vec<Transaction>>;

    /// Debits with `balance < 0`, ordered by `(event_date, sequence)` ascending
    async fn list_open_debits(&self, account_id: &AccountId) -> Result<Vec<Transaction>>;

    /// Credits with `balance > 0`, ordered by `(event_date, sequence)` ascending
    async fn list_open_credits(&self, account_id: &AccountId) -> Result<Vec<Transaction>>;

    /// Overwrite a single balance.
    ///
    /// Administrative hook outside the discharge path. The balance must lie
    /// between zero and the signed amount, else `InvalidBalance`.
    async fn update_balance(&self, transaction_id: Uuid, balance: Decimal) -> Result<()>;

    /// Apply every balance change of a plan atomically.
    ///
    /// Fails with `DischargeConflict` without writing anything when any row no
    /// longer holds the balance the plan expects.
    async fn apply_discharge(&self, plan: &DischargePlan) -> Result<()>;
}

/// Account existence check
#[async_trait]
pub trait AccountLookup: Send + Sync {
    /// Whether the account is registered
    async fn exists(&self, account_id: &AccountId) -> Result<bool>;
}

/// Account persistence
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account, rejecting duplicate document numbers
    async fn insert_account(&self, account: &Account) -> Result<()>;

    /// Lookup by ID
    async fn account_by_id(&self, account_id: &AccountId) -> Result<Option<Account>>;

    /// Lookup by document number
    async fn account_by_document(&self, document_number: &str) -> Result<Option<Account>>;
}

/// Operation type catalog
#[async_trait]
pub trait OperationCatalog: Send + Sync {
    /// Lookup by ID
    async fn get_by_id(&self, operation_type_id: i32) -> Result<Option<OperationType>>;
}
