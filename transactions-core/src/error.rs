//! Error types for the transactions core

use crate::types::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Result type for transactions core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reason an amount was rejected by the validator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidAmount {
    /// Amount is exactly zero
    #[error("amount 0 is invalid")]
    Zero,

    /// Amount carries more than two decimal digits
    #[error("amount {0} is invalid, use at most 2 decimals")]
    Precision(Decimal),
}

/// Transactions core errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB or in-memory store)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Amount failed validation
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] InvalidAmount),

    /// Operation type is not in the catalog
    #[error("Operation type id not found: {0}")]
    OperationTypeNotFound(i32),

    /// Account does not exist
    #[error("Account id not found: {0}")]
    AccountNotFound(AccountId),

    /// Transaction does not exist
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    /// Primary write of a transaction failed
    #[error("Fail to make transaction: {0}")]
    TransactionWriteFailed(String),

    /// A discharge plan was computed against balances that changed before commit
    #[error("Discharge conflict on transaction {0}: balance changed since it was read")]
    DischargeConflict(Uuid),

    /// Balance outside the range allowed by the transaction's amount
    #[error("Balance {balance} invalid for transaction {transaction_id}")]
    InvalidBalance {
        /// Transaction being updated
        transaction_id: Uuid,
        /// Rejected balance
        balance: Decimal,
    },

    /// Document number is malformed
    #[error("Document number invalid: {0}")]
    InvalidDocument(String),

    /// Document number already registered
    #[error("Document number already registered: {0}")]
    DuplicateDocument(String),

    /// Request exceeded its deadline
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Concurrency error (worker mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Config(format!("metrics registration failed: {}", err))
    }
}
