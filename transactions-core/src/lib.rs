//! Transactions Core
//!
//! Account ledger that records signed monetary movements and settles debts:
//! every credit pays down the account's open debits, oldest first.
//!
//! # Architecture
//!
//! - **Request path**: validate → resolve sign → check account → write,
//!   under a request deadline
//! - **Discharge workers**: per-account ordered actors settle credits in
//!   the background
//! - **Atomic settlement**: each discharge commits as one guarded batch
//! - **Reports**: every discharge produces a `DischargeReport`
//!
//! # Invariants
//!
//! - A debit balance never goes positive and never moves away from zero
//! - A credit balance never goes negative
//! - Discharge conserves value: Σ(balances) is unchanged by settlement
//! - Discharges of the same account never run concurrently

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod accounts;
pub mod actor;
pub mod amount;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod discharge;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod metrics;
pub mod service;
pub mod storage;
pub mod store;
pub mod types;

// Re-exports
pub use accounts::AccountDirectory;
pub use config::Config;
pub use discharge::{DischargeJob, DischargeOutcome, DischargeReport};
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use memory::MemoryStore;
pub use service::TransactionService;
pub use storage::Storage;
pub use types::{Account, AccountId, MakeTransaction, OperationType, Transaction};
