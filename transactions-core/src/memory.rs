//! In-memory store
//!
//! Implements every store trait over plain maps behind a single async lock.
//! Used by tests and by embedders that do not need durability. Failure
//! switches let tests exercise the error paths of the service and the
//! discharge workers.

use crate::discharge::DischargePlan;
use crate::store::{AccountLookup, AccountStore, LedgerStore, OperationCatalog};
use crate::types::{Account, AccountId, NewTransaction, OperationType, Transaction};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    transactions: HashMap<Uuid, Transaction>,
    accounts: HashMap<AccountId, Account>,
    documents: HashMap<String, AccountId>,
    operation_types: HashMap<i32, OperationType>,
    next_sequence: u64,
}

impl MemoryState {
    fn account_transactions<F>(&self, account_id: &AccountId, keep: F) -> Vec<Transaction>
    where
        F: Fn(&Transaction) -> bool,
    {
        let mut rows: Vec<Transaction> = self
            .transactions
            .values()
            .filter(|tx| &tx.account_id == account_id && keep(*tx))
            .cloned()
            .collect();
        rows.sort_by_key(|tx| tx.discharge_order());
        rows
    }
}

/// Map-backed store
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with the default operation type catalog
    pub async fn with_default_catalog() -> Self {
        let store = Self::new();
        for operation_type in crate::catalog::default_operation_types() {
            store.put_operation_type(operation_type).await;
        }
        store
    }

    /// Add or replace a catalog entry
    pub async fn put_operation_type(&self, operation_type: OperationType) {
        let mut state = self.state.write().await;
        state
            .operation_types
            .insert(operation_type.operation_type_id, operation_type);
    }

    /// Insert a fully formed row, bypassing `create` (for seeding fixtures)
    pub async fn insert_transaction(&self, transaction: Transaction) {
        let mut state = self.state.write().await;
        state.next_sequence = state.next_sequence.max(transaction.sequence);
        state
            .transactions
            .insert(transaction.transaction_id, transaction);
    }

    /// Make every transaction write fail
    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Make every account scan (`list_*`) fail
    pub fn fail_reads(&self, enabled: bool) {
        self.fail_reads.store(enabled, Ordering::SeqCst);
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage("write rejected by memory store".to_string()));
        }
        Ok(())
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Storage("read rejected by memory store".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn create(&self, new: NewTransaction) -> Result<Transaction> {
        self.check_writes()?;

        let mut state = self.state.write().await;
        state.next_sequence += 1;
        let transaction = Transaction::from_new(new, Utc::now(), state.next_sequence);
        state
            .transactions
            .insert(transaction.transaction_id, transaction.clone());

        Ok(transaction)
    }

    async fn get(&self, transaction_id: Uuid) -> Result<Transaction> {
        let state = self.state.read().await;
        state
            .transactions
            .get(&transaction_id)
            .cloned()
            .ok_or(Error::TransactionNotFound(transaction_id))
    }

    async fn list_by_account(&self, account_id: &AccountId) -> Result<Vec<Transaction>> {
        self.check_reads()?;
        let state = self.state.read().await;
        let mut rows = state.account_transactions(account_id, |_| true);
        rows.sort_by_key(|tx| tx.sequence);
        Ok(rows)
    }

    async fn list_open_debits(&self, account_id: &AccountId) -> Result<Vec<Transaction>> {
        self.check_reads()?;
        let state = self.state.read().await;
        Ok(state.account_transactions(account_id, Transaction::is_open_debit))
    }

    async fn list_open_credits(&self, account_id: &AccountId) -> Result<Vec<Transaction>> {
        self.check_reads()?;
        let state = self.state.read().await;
        Ok(state.account_transactions(account_id, Transaction::is_open_credit))
    }

    async fn update_balance(&self, transaction_id: Uuid, balance: Decimal) -> Result<()> {
        self.check_writes()?;

        let mut state = self.state.write().await;
        let transaction = state
            .transactions
            .get_mut(&transaction_id)
            .ok_or(Error::TransactionNotFound(transaction_id))?;
        if !transaction.allows_balance(balance) {
            return Err(Error::InvalidBalance {
                transaction_id,
                balance,
            });
        }
        transaction.balance = balance;
        Ok(())
    }

    async fn apply_discharge(&self, plan: &DischargePlan) -> Result<()> {
        self.check_writes()?;

        let mut state = self.state.write().await;

        for update in plan.updates() {
            let current = state
                .transactions
                .get(&update.transaction_id)
                .ok_or(Error::TransactionNotFound(update.transaction_id))?;
            if current.balance != update.expected {
                return Err(Error::DischargeConflict(update.transaction_id));
            }
        }

        for update in plan.updates() {
            if let Some(transaction) = state.transactions.get_mut(&update.transaction_id) {
                transaction.balance = update.new_balance;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_account(&self, account: &Account) -> Result<()> {
        let mut state = self.state.write().await;

        if state.documents.contains_key(&account.document_number) {
            return Err(Error::DuplicateDocument(account.document_number.clone()));
        }

        state
            .documents
            .insert(account.document_number.clone(), account.account_id.clone());
        state
            .accounts
            .insert(account.account_id.clone(), account.clone());
        Ok(())
    }

    async fn account_by_id(&self, account_id: &AccountId) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(account_id).cloned())
    }

    async fn account_by_document(&self, document_number: &str) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state
            .documents
            .get(document_number)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }
}

#[async_trait]
impl AccountLookup for MemoryStore {
    async fn exists(&self, account_id: &AccountId) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.accounts.contains_key(account_id))
    }
}

#[async_trait]
impl OperationCatalog for MemoryStore {
    async fn get_by_id(&self, operation_type_id: i32) -> Result<Option<OperationType>> {
        let state = self.state.read().await;
        Ok(state.operation_types.get(&operation_type_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discharge::BalanceUpdate;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn debit(account: &AccountId, amount: Decimal) -> NewTransaction {
        NewTransaction {
            account_id: account.clone(),
            operation_type_id: 1,
            amount,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_sequence() {
        let store = MemoryStore::new();
        let account = AccountId::new("acc");

        let first = store.create(debit(&account, dec!(-1))).await.unwrap();
        let second = store.create(debit(&account, dec!(-2))).await.unwrap();

        assert!(second.sequence > first.sequence);
        assert_eq!(first.balance, dec!(-1));
    }

    #[tokio::test]
    async fn test_open_debits_break_ties_by_sequence() {
        let store = MemoryStore::new();
        let account = AccountId::new("acc");
        let same_instant = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        for (sequence, amount) in [(3u64, dec!(-3)), (1, dec!(-1)), (2, dec!(-2))] {
            store
                .insert_transaction(Transaction {
                    transaction_id: Uuid::now_v7(),
                    account_id: account.clone(),
                    operation_type_id: 1,
                    amount,
                    balance: amount,
                    event_date: same_instant,
                    sequence,
                })
                .await;
        }

        let open = store.list_open_debits(&account).await.unwrap();
        let order: Vec<u64> = open.iter().map(|tx| tx.sequence).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_open_debits_exclude_settled_and_other_accounts() {
        let store = MemoryStore::new();
        let account = AccountId::new("acc");
        let other = AccountId::new("other");

        let settled = store.create(debit(&account, dec!(-5))).await.unwrap();
        store.create(debit(&account, dec!(-6))).await.unwrap();
        store.create(debit(&other, dec!(-7))).await.unwrap();
        store
            .update_balance(settled.transaction_id, Decimal::ZERO)
            .await
            .unwrap();

        let open = store.list_open_debits(&account).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].balance, dec!(-6));
    }

    #[tokio::test]
    async fn test_stale_plan_is_rejected_without_writes() {
        let store = MemoryStore::new();
        let account = AccountId::new("acc");

        let a = store.create(debit(&account, dec!(-10))).await.unwrap();
        let b = store.create(debit(&account, dec!(-10))).await.unwrap();

        let plan = DischargePlan {
            account_id: account.clone(),
            debits: vec![
                BalanceUpdate {
                    transaction_id: a.transaction_id,
                    expected: dec!(-10),
                    new_balance: dec!(0),
                },
                BalanceUpdate {
                    transaction_id: b.transaction_id,
                    expected: dec!(-9),
                    new_balance: dec!(0),
                },
            ],
            credit: BalanceUpdate {
                transaction_id: b.transaction_id,
                expected: dec!(-10),
                new_balance: dec!(0),
            },
        };

        let err = store.apply_discharge(&plan).await.unwrap_err();
        assert!(matches!(err, Error::DischargeConflict(id) if id == b.transaction_id));
        assert_eq!(store.get(a.transaction_id).await.unwrap().balance, dec!(-10));
    }

    #[tokio::test]
    async fn test_duplicate_document_rejected() {
        let store = MemoryStore::new();
        let account = Account {
            account_id: AccountId::generate(),
            document_number: "12345678900".to_string(),
            created_at: Utc::now(),
        };

        store.insert_account(&account).await.unwrap();

        let duplicate = Account {
            account_id: AccountId::generate(),
            ..account.clone()
        };
        let err = store.insert_account(&duplicate).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateDocument(_)));

        assert!(store.exists(&account.account_id).await.unwrap());
        assert!(!store.exists(&duplicate.account_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_balance_stays_within_amount() {
        let store = MemoryStore::new();
        let account = AccountId::new("acc");
        let tx = store.create(debit(&account, dec!(-10))).await.unwrap();

        assert!(matches!(
            store.update_balance(tx.transaction_id, dec!(0.01)).await,
            Err(Error::InvalidBalance { .. })
        ));
        assert!(matches!(
            store.update_balance(tx.transaction_id, dec!(-10.01)).await,
            Err(Error::InvalidBalance { .. })
        ));
        assert_eq!(store.get(tx.transaction_id).await.unwrap().balance, dec!(-10));

        store.update_balance(tx.transaction_id, dec!(-4)).await.unwrap();
        assert_eq!(store.get(tx.transaction_id).await.unwrap().balance, dec!(-4));
    }

    #[tokio::test]
    async fn test_failure_switches() {
        let store = MemoryStore::new();
        let account = AccountId::new("acc");

        store.fail_writes(true);
        assert!(store.create(debit(&account, dec!(-1))).await.is_err());
        store.fail_writes(false);
        assert!(store.create(debit(&account, dec!(-1))).await.is_ok());

        store.fail_reads(true);
        assert!(store.list_open_debits(&account).await.is_err());
    }
}
