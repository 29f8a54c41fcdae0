//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `transactions` - Transaction rows (key: transaction_id)
//! - `account_transactions` - Per-account index (key: account || sequence)
//! - `open_debits` - Debits with balance < 0 (key: account || event_date || sequence)
//! - `open_credits` - Credits with balance > 0 (key: account || event_date || sequence)
//! - `accounts` - Account rows (key: account_id)
//! - `account_documents` - Document number index (key: document_number)
//! - `operation_types` - Operation type catalog (key: operation_type_id)
//! - `meta` - Sequence counter
//!
//! Every multi-row change goes through a single `WriteBatch`. Writers take
//! `write_lock` so that read-check-write sequences (sequence allocation,
//! discharge balance guards, document uniqueness) are not interleaved.

use crate::{
    discharge::DischargePlan,
    error::{Error, Result},
    store::{AccountLookup, AccountStore, LedgerStore, OperationCatalog},
    types::{Account, AccountId, NewTransaction, OperationType, Transaction},
    Config,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DBCompressionType, Direction, IteratorMode, Options,
    WriteBatch, DB,
};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_TRANSACTIONS: &str = "transactions";
const CF_ACCOUNT_TRANSACTIONS: &str = "account_transactions";
const CF_OPEN_DEBITS: &str = "open_debits";
const CF_OPEN_CREDITS: &str = "open_credits";
const CF_ACCOUNTS: &str = "accounts";
const CF_DOCUMENTS: &str = "account_documents";
const CF_OPERATION_TYPES: &str = "operation_types";
const CF_META: &str = "meta";

const COLUMN_FAMILIES: [&str; 8] = [
    CF_TRANSACTIONS,
    CF_ACCOUNT_TRANSACTIONS,
    CF_OPEN_DEBITS,
    CF_OPEN_CREDITS,
    CF_ACCOUNTS,
    CF_DOCUMENTS,
    CF_OPERATION_TYPES,
    CF_META,
];

const META_SEQUENCE: &[u8] = b"sequence";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
    write_lock: Mutex<()>,
    sequence: AtomicU64,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Self::cf_options(name)))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        let storage = Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
            sequence: AtomicU64::new(0),
        };

        let last_sequence = storage.load_sequence()?;
        storage.sequence.store(last_sequence, Ordering::SeqCst);

        tracing::info!(
            path = ?path,
            column_families = COLUMN_FAMILIES.len(),
            last_sequence,
            "Opened transaction store"
        );

        Ok(storage)
    }

    fn cf_options(name: &str) -> Options {
        let mut opts = Options::default();
        match name {
            // Rows are written once and read by point lookups
            CF_TRANSACTIONS | CF_ACCOUNTS => {
                opts.set_compression_type(DBCompressionType::Zstd);
            }
            // Indices are scanned by account prefix on every discharge
            _ => {
                opts.set_compression_type(DBCompressionType::Lz4);
                let mut block_opts = rocksdb::BlockBasedOptions::default();
                block_opts.set_bloom_filter(10.0, false);
                opts.set_block_based_table_factory(&block_opts);
            }
        }
        opts
    }

    // Helper: get column family handle

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    fn load_sequence(&self) -> Result<u64> {
        let cf = self.cf_handle(CF_META)?;
        match self.db.get_cf(cf, META_SEQUENCE)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Storage("corrupt sequence counter".to_string()))?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }

    // Transaction operations

    /// Insert a new transaction with `balance == amount`
    pub fn create_transaction(&self, new: NewTransaction) -> Result<Transaction> {
        let _guard = self.write_lock.lock();

        let sequence = self.sequence.load(Ordering::SeqCst) + 1;
        let transaction = Transaction::from_new(new, Utc::now(), sequence);

        let mut batch = WriteBatch::default();
        self.stage_transaction(&mut batch, &transaction)?;

        let cf_accounts = self.cf_handle(CF_ACCOUNT_TRANSACTIONS)?;
        let mut account_key = Self::account_prefix(&transaction.account_id);
        account_key.extend_from_slice(&sequence.to_be_bytes());
        batch.put_cf(cf_accounts, &account_key, transaction.transaction_id.as_bytes());

        let cf_meta = self.cf_handle(CF_META)?;
        batch.put_cf(cf_meta, META_SEQUENCE, sequence.to_be_bytes());

        self.db.write(batch)?;
        self.sequence.store(sequence, Ordering::SeqCst);

        tracing::debug!(
            transaction_id = %transaction.transaction_id,
            account_id = %transaction.account_id,
            amount = %transaction.amount,
            sequence,
            "Transaction created"
        );

        Ok(transaction)
    }

    /// Get transaction by ID
    pub fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;

        let value = self
            .db
            .get_cf(cf, transaction_id.as_bytes())?
            .ok_or(Error::TransactionNotFound(transaction_id))?;

        let transaction: Transaction = bincode::deserialize(&value)?;
        Ok(transaction)
    }

    /// All transactions of an account in insertion order
    pub fn account_transactions(&self, account_id: &AccountId) -> Result<Vec<Transaction>> {
        self.scan_index(CF_ACCOUNT_TRANSACTIONS, &Self::account_prefix(account_id))
    }

    /// Open debits of an account, oldest first
    pub fn open_debits(&self, account_id: &AccountId) -> Result<Vec<Transaction>> {
        self.scan_index(CF_OPEN_DEBITS, &Self::account_prefix(account_id))
    }

    /// Open credits of an account, oldest first
    pub fn open_credits(&self, account_id: &AccountId) -> Result<Vec<Transaction>> {
        self.scan_index(CF_OPEN_CREDITS, &Self::account_prefix(account_id))
    }

    /// Overwrite one balance, keeping the open indices in step.
    ///
    /// Rejects a balance outside `[amount, 0]` for a debit or `[0, amount]`
    /// for a credit.
    pub fn set_balance(&self, transaction_id: Uuid, balance: Decimal) -> Result<()> {
        let _guard = self.write_lock.lock();

        let mut transaction = self.get_transaction(transaction_id)?;
        if !transaction.allows_balance(balance) {
            return Err(Error::InvalidBalance {
                transaction_id,
                balance,
            });
        }
        transaction.balance = balance;

        let mut batch = WriteBatch::default();
        self.stage_transaction(&mut batch, &transaction)?;
        self.db.write(batch)?;

        Ok(())
    }

    /// Commit a discharge plan atomically (all rows or none)
    pub fn commit_discharge(&self, plan: &DischargePlan) -> Result<()> {
        let _guard = self.write_lock.lock();

        let mut batch = WriteBatch::default();

        for update in plan.updates() {
            let mut transaction = self.get_transaction(update.transaction_id)?;
            if transaction.balance != update.expected {
                tracing::warn!(
                    transaction_id = %update.transaction_id,
                    expected = %update.expected,
                    found = %transaction.balance,
                    "Discharge plan is stale"
                );
                return Err(Error::DischargeConflict(update.transaction_id));
            }
            transaction.balance = update.new_balance;
            self.stage_transaction(&mut batch, &transaction)?;
        }

        self.db.write(batch)?;
        Ok(())
    }

    // Account operations

    /// Insert account, enforcing document number uniqueness
    pub fn put_account(&self, account: &Account) -> Result<()> {
        let _guard = self.write_lock.lock();

        let cf_documents = self.cf_handle(CF_DOCUMENTS)?;
        if self
            .db
            .get_cf(cf_documents, account.document_number.as_bytes())?
            .is_some()
        {
            return Err(Error::DuplicateDocument(account.document_number.clone()));
        }

        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(
            cf_accounts,
            account.account_id.as_str().as_bytes(),
            bincode::serialize(account)?,
        );
        batch.put_cf(
            cf_documents,
            account.document_number.as_bytes(),
            account.account_id.as_str().as_bytes(),
        );
        self.db.write(batch)?;

        Ok(())
    }

    /// Get account by ID
    pub fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        match self.db.get_cf(cf, account_id.as_str().as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Get account by document number
    pub fn get_account_by_document(&self, document_number: &str) -> Result<Option<Account>> {
        let cf = self.cf_handle(CF_DOCUMENTS)?;
        match self.db.get_cf(cf, document_number.as_bytes())? {
            Some(id) => {
                let account_id = AccountId::new(String::from_utf8_lossy(&id).into_owned());
                self.get_account(&account_id)
            }
            None => Ok(None),
        }
    }

    // Operation type operations

    /// Add or replace a catalog entry
    pub fn put_operation_type(&self, operation_type: &OperationType) -> Result<()> {
        let cf = self.cf_handle(CF_OPERATION_TYPES)?;
        self.db.put_cf(
            cf,
            operation_type.operation_type_id.to_be_bytes(),
            bincode::serialize(operation_type)?,
        )?;
        Ok(())
    }

    /// Get catalog entry
    pub fn get_operation_type(&self, operation_type_id: i32) -> Result<Option<OperationType>> {
        let cf = self.cf_handle(CF_OPERATION_TYPES)?;
        match self.db.get_cf(cf, operation_type_id.to_be_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    // Batch staging

    fn stage_transaction(&self, batch: &mut WriteBatch, transaction: &Transaction) -> Result<()> {
        let cf_transactions = self.cf_handle(CF_TRANSACTIONS)?;
        batch.put_cf(
            cf_transactions,
            transaction.transaction_id.as_bytes(),
            bincode::serialize(transaction)?,
        );

        let order_key = Self::order_key(transaction);
        let id = transaction.transaction_id.as_bytes();

        let cf_debits = self.cf_handle(CF_OPEN_DEBITS)?;
        if transaction.is_open_debit() {
            batch.put_cf(cf_debits, &order_key, id);
        } else {
            batch.delete_cf(cf_debits, &order_key);
        }

        let cf_credits = self.cf_handle(CF_OPEN_CREDITS)?;
        if transaction.is_open_credit() {
            batch.put_cf(cf_credits, &order_key, id);
        } else {
            batch.delete_cf(cf_credits, &order_key);
        }

        Ok(())
    }

    fn scan_index(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<Transaction>> {
        let cf = self.cf_handle(cf_name)?;
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));

        let mut rows = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }

            let transaction_id = Uuid::from_slice(&value)
                .map_err(|e| Error::Storage(format!("corrupt index entry: {}", e)))?;
            rows.push(self.get_transaction(transaction_id)?);
        }

        Ok(rows)
    }

    // Index key helpers

    /// Length-prefixed account bytes, so no account prefix is a prefix of another
    fn account_prefix(account_id: &AccountId) -> Vec<u8> {
        let bytes = account_id.as_str().as_bytes();
        let mut key = Vec::with_capacity(4 + bytes.len() + 16);
        key.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        key.extend_from_slice(bytes);
        key
    }

    fn order_key(transaction: &Transaction) -> Vec<u8> {
        let mut key = Self::account_prefix(&transaction.account_id);
        key.extend_from_slice(&Self::sortable_timestamp(transaction.event_date));
        key.extend_from_slice(&transaction.sequence.to_be_bytes());
        key
    }

    /// Big-endian bytes that sort like the signed timestamp
    fn sortable_timestamp(event_date: DateTime<Utc>) -> [u8; 8] {
        let nanos = event_date.timestamp_nanos_opt().unwrap_or(i64::MAX);
        ((nanos as u64) ^ (1 << 63)).to_be_bytes()
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for Storage {
    async fn create(&self, new: NewTransaction) -> Result<Transaction> {
        self.create_transaction(new)
    }

    async fn get(&self, transaction_id: Uuid) -> Result<Transaction> {
        self.get_transaction(transaction_id)
    }

    async fn list_by_account(&self, account_id: &AccountId) -> Result<Vec<Transaction>> {
        self.account_transactions(account_id)
    }

    async fn list_open_debits(&self, account_id: &AccountId) -> Result<Vec<Transaction>> {
        self.open_debits(account_id)
    }

    async fn list_open_credits(&self, account_id: &AccountId) -> Result<Vec<Transaction>> {
        self.open_credits(account_id)
    }

    async fn update_balance(&self, transaction_id: Uuid, balance: Decimal) -> Result<()> {
        self.set_balance(transaction_id, balance)
    }

    async fn apply_discharge(&self, plan: &DischargePlan) -> Result<()> {
        self.commit_discharge(plan)
    }
}

#[async_trait]
impl AccountStore for Storage {
    async fn insert_account(&self, account: &Account) -> Result<()> {
        self.put_account(account)
    }

    async fn account_by_id(&self, account_id: &AccountId) -> Result<Option<Account>> {
        self.get_account(account_id)
    }

    async fn account_by_document(&self, document_number: &str) -> Result<Option<Account>> {
        self.get_account_by_document(document_number)
    }
}

#[async_trait]
impl AccountLookup for Storage {
    async fn exists(&self, account_id: &AccountId) -> Result<bool> {
        Ok(self.get_account(account_id)?.is_some())
    }
}

#[async_trait]
impl OperationCatalog for Storage {
    async fn get_by_id(&self, operation_type_id: i32) -> Result<Option<OperationType>> {
        self.get_operation_type(operation_type_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discharge::BalanceUpdate;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn test_config() -> (Config, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (config, temp_dir)
    }

    fn new_tx(account: &AccountId, amount: Decimal) -> NewTransaction {
        NewTransaction {
            account_id: account.clone(),
            operation_type_id: if amount < Decimal::ZERO { 1 } else { 4 },
            amount,
        }
    }

    #[test]
    fn test_storage_open() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();
        for name in COLUMN_FAMILIES {
            assert!(storage.db.cf_handle(name).is_some());
        }
    }

    #[test]
    fn test_create_and_get_transaction() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();
        let account = AccountId::generate();

        let created = storage.create_transaction(new_tx(&account, dec!(-10.50))).unwrap();
        let retrieved = storage.get_transaction(created.transaction_id).unwrap();

        assert_eq!(retrieved, created);
        assert_eq!(retrieved.balance, dec!(-10.50));
        assert_eq!(retrieved.sequence, 1);
    }

    #[test]
    fn test_missing_transaction() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();

        let id = Uuid::now_v7();
        let err = storage.get_transaction(id).unwrap_err();
        assert!(matches!(err, Error::TransactionNotFound(missing) if missing == id));
    }

    #[test]
    fn test_open_indices_follow_balance() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();
        let account = AccountId::generate();

        let debit = storage.create_transaction(new_tx(&account, dec!(-20))).unwrap();
        let credit = storage.create_transaction(new_tx(&account, dec!(5))).unwrap();

        assert_eq!(storage.open_debits(&account).unwrap().len(), 1);
        assert_eq!(storage.open_credits(&account).unwrap().len(), 1);

        storage.set_balance(debit.transaction_id, Decimal::ZERO).unwrap();
        storage.set_balance(credit.transaction_id, Decimal::ZERO).unwrap();

        assert!(storage.open_debits(&account).unwrap().is_empty());
        assert!(storage.open_credits(&account).unwrap().is_empty());
        assert_eq!(storage.account_transactions(&account).unwrap().len(), 2);
    }

    #[test]
    fn test_scans_are_scoped_to_account() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();
        let short = AccountId::new("ab");
        let long = AccountId::new("abc");

        storage.create_transaction(new_tx(&short, dec!(-1))).unwrap();
        storage.create_transaction(new_tx(&long, dec!(-2))).unwrap();
        storage.create_transaction(new_tx(&long, dec!(-3))).unwrap();

        assert_eq!(storage.open_debits(&short).unwrap().len(), 1);
        assert_eq!(storage.open_debits(&long).unwrap().len(), 2);
    }

    #[test]
    fn test_long_account_ids_keep_their_own_prefix() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();
        let empty = AccountId::new("");
        let long = AccountId::new("x".repeat(u16::MAX as usize + 1));

        storage.create_transaction(new_tx(&empty, dec!(-1))).unwrap();
        storage.create_transaction(new_tx(&long, dec!(-2))).unwrap();

        let empty_open = storage.open_debits(&empty).unwrap();
        assert_eq!(empty_open.len(), 1);
        assert_eq!(empty_open[0].account_id, empty);

        let long_open = storage.open_debits(&long).unwrap();
        assert_eq!(long_open.len(), 1);
        assert_eq!(long_open[0].account_id, long);
    }

    #[test]
    fn test_set_balance_rejects_out_of_range() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();
        let account = AccountId::generate();

        let debit = storage.create_transaction(new_tx(&account, dec!(-20))).unwrap();
        let credit = storage.create_transaction(new_tx(&account, dec!(5))).unwrap();

        for (id, balance) in [
            (debit.transaction_id, dec!(1)),
            (debit.transaction_id, dec!(-21)),
            (credit.transaction_id, dec!(-1)),
            (credit.transaction_id, dec!(6)),
        ] {
            assert!(matches!(
                storage.set_balance(id, balance),
                Err(Error::InvalidBalance { .. })
            ));
        }

        assert_eq!(
            storage.get_transaction(debit.transaction_id).unwrap().balance,
            dec!(-20)
        );
        assert_eq!(storage.open_debits(&account).unwrap().len(), 1);
        assert_eq!(storage.open_credits(&account).unwrap().len(), 1);

        storage.set_balance(debit.transaction_id, dec!(-7.50)).unwrap();
        assert_eq!(
            storage.get_transaction(debit.transaction_id).unwrap().balance,
            dec!(-7.50)
        );
    }

    #[test]
    fn test_open_debits_oldest_first() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();
        let account = AccountId::generate();

        let first = storage.create_transaction(new_tx(&account, dec!(-1))).unwrap();
        let second = storage.create_transaction(new_tx(&account, dec!(-2))).unwrap();
        let third = storage.create_transaction(new_tx(&account, dec!(-3))).unwrap();

        let ids: Vec<Uuid> = storage
            .open_debits(&account)
            .unwrap()
            .iter()
            .map(|tx| tx.transaction_id)
            .collect();
        assert_eq!(
            ids,
            vec![first.transaction_id, second.transaction_id, third.transaction_id]
        );
    }

    #[test]
    fn test_sortable_timestamp_orders_like_dates() {
        let before_epoch = Utc.with_ymd_and_hms(1965, 1, 1, 0, 0, 0).unwrap();
        let after_epoch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert!(
            Storage::sortable_timestamp(before_epoch) < Storage::sortable_timestamp(after_epoch)
        );
    }

    #[test]
    fn test_sequence_survives_reopen() {
        let (config, _temp) = test_config();
        let account = AccountId::generate();

        {
            let storage = Storage::open(&config).unwrap();
            storage.create_transaction(new_tx(&account, dec!(-1))).unwrap();
            storage.create_transaction(new_tx(&account, dec!(-2))).unwrap();
            storage.close().unwrap();
        }

        let storage = Storage::open(&config).unwrap();
        let next = storage.create_transaction(new_tx(&account, dec!(-3))).unwrap();
        assert_eq!(next.sequence, 3);
    }

    #[test]
    fn test_commit_discharge_is_atomic() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();
        let account = AccountId::generate();

        let debit = storage.create_transaction(new_tx(&account, dec!(-50))).unwrap();
        let credit = storage.create_transaction(new_tx(&account, dec!(60))).unwrap();

        let stale = DischargePlan {
            account_id: account.clone(),
            debits: vec![BalanceUpdate {
                transaction_id: debit.transaction_id,
                expected: dec!(-50),
                new_balance: dec!(0),
            }],
            credit: BalanceUpdate {
                transaction_id: credit.transaction_id,
                expected: dec!(70),
                new_balance: dec!(20),
            },
        };
        assert!(matches!(
            storage.commit_discharge(&stale),
            Err(Error::DischargeConflict(_))
        ));
        assert_eq!(
            storage.get_transaction(debit.transaction_id).unwrap().balance,
            dec!(-50)
        );

        let open = storage.open_debits(&account).unwrap();
        let plan = DischargePlan::compute(&credit, &open).unwrap();
        storage.commit_discharge(&plan).unwrap();

        assert_eq!(
            storage.get_transaction(debit.transaction_id).unwrap().balance,
            dec!(0)
        );
        assert_eq!(
            storage.get_transaction(credit.transaction_id).unwrap().balance,
            dec!(10)
        );
        assert!(storage.open_debits(&account).unwrap().is_empty());
        assert_eq!(storage.open_credits(&account).unwrap().len(), 1);
    }

    #[test]
    fn test_accounts_and_documents() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();

        let account = Account {
            account_id: AccountId::generate(),
            document_number: "12345678900".to_string(),
            created_at: Utc::now(),
        };
        storage.put_account(&account).unwrap();

        assert_eq!(
            storage.get_account(&account.account_id).unwrap(),
            Some(account.clone())
        );
        assert_eq!(
            storage.get_account_by_document("12345678900").unwrap(),
            Some(account.clone())
        );
        assert!(matches!(
            storage.put_account(&Account {
                account_id: AccountId::generate(),
                ..account
            }),
            Err(Error::DuplicateDocument(_))
        ));
    }

    #[test]
    fn test_operation_types() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();

        storage
            .put_operation_type(&OperationType::new(4, "Credit Voucher", 1))
            .unwrap();

        assert_eq!(storage.get_operation_type(4).unwrap().unwrap().multiplier, 1);
        assert!(storage.get_operation_type(99).unwrap().is_none());
    }
}
