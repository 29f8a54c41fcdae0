//! Core types for the transactions ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (Decimal for money)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh, time-ordered account ID
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registered account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID
    pub account_id: AccountId,

    /// Holder document number (11 digits)
    pub document_number: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Operation type catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationType {
    /// Catalog identifier
    pub operation_type_id: i32,

    /// Human readable description
    pub description: String,

    /// Sign applied to the requested amount: -1 (debit) or +1 (credit)
    pub multiplier: i8,
}

impl OperationType {
    /// Create a catalog entry
    pub fn new(operation_type_id: i32, description: impl Into<String>, multiplier: i8) -> Self {
        Self {
            operation_type_id,
            description: description.into(),
            multiplier,
        }
    }

    /// Signed amount for a validated magnitude.
    ///
    /// The sign of the requested amount is ignored; direction comes from the
    /// operation type alone.
    pub fn apply(&self, amount: Decimal) -> Decimal {
        amount.abs() * Decimal::from(self.multiplier)
    }
}

/// Caller request to record a movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeTransaction {
    /// Owning account
    pub account_id: AccountId,

    /// Operation applied
    pub operation_type_id: i32,

    /// Raw amount as requested (sign not yet applied)
    pub amount: Decimal,
}

/// Validated, signed movement ready to be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Owning account
    pub account_id: AccountId,

    /// Operation applied
    pub operation_type_id: i32,

    /// Signed amount (magnitude × operation multiplier)
    pub amount: Decimal,
}

/// Recorded transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned ID (UUIDv7)
    pub transaction_id: Uuid,

    /// Owning account
    pub account_id: AccountId,

    /// Operation applied
    pub operation_type_id: i32,

    /// Signed recorded amount, immutable
    pub amount: Decimal,

    /// Remaining unsettled value
    pub balance: Decimal,

    /// Creation timestamp, discharge ordering key
    pub event_date: DateTime<Utc>,

    /// Store-assigned insertion sequence, tie-break for equal event dates
    pub sequence: u64,
}

impl Transaction {
    /// Build the stored row for a new transaction
    pub fn from_new(new: NewTransaction, event_date: DateTime<Utc>, sequence: u64) -> Self {
        Self {
            transaction_id: Uuid::now_v7(),
            account_id: new.account_id,
            operation_type_id: new.operation_type_id,
            amount: new.amount,
            balance: new.amount,
            event_date,
            sequence,
        }
    }

    /// Positive signed amount
    pub fn is_credit(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Negative signed amount
    pub fn is_debit(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Debit with debt still outstanding
    pub fn is_open_debit(&self) -> bool {
        self.balance < Decimal::ZERO
    }

    /// Credit with value still unconsumed
    pub fn is_open_credit(&self) -> bool {
        self.balance > Decimal::ZERO
    }

    /// Balance lies between zero and the signed amount
    pub fn allows_balance(&self, balance: Decimal) -> bool {
        if self.is_debit() {
            self.amount <= balance && balance <= Decimal::ZERO
        } else {
            Decimal::ZERO <= balance && balance <= self.amount
        }
    }

    /// Discharge ordering key: oldest first, insertion order on ties
    pub fn discharge_order(&self) -> (DateTime<Utc>, u64) {
        (self.event_date, self.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_apply_uses_operation_sign() {
        let purchase = OperationType::new(1, "Normal Purchase", -1);
        let voucher = OperationType::new(4, "Credit Voucher", 1);

        assert_eq!(purchase.apply(dec!(10.50)), dec!(-10.50));
        assert_eq!(purchase.apply(dec!(-10.50)), dec!(-10.50));
        assert_eq!(voucher.apply(dec!(60)), dec!(60));
        assert_eq!(voucher.apply(dec!(-60)), dec!(60));
    }

    #[test]
    fn test_new_transaction_balance_equals_amount() {
        let tx = Transaction::from_new(
            NewTransaction {
                account_id: AccountId::new("acc"),
                operation_type_id: 1,
                amount: dec!(-23.50),
            },
            Utc::now(),
            7,
        );

        assert_eq!(tx.balance, tx.amount);
        assert!(tx.is_debit());
        assert!(tx.is_open_debit());
        assert!(!tx.is_credit());
        assert_eq!(tx.sequence, 7);
    }

    #[test]
    fn test_allowed_balance_range() {
        let debit = Transaction::from_new(
            NewTransaction {
                account_id: AccountId::new("acc"),
                operation_type_id: 1,
                amount: dec!(-50),
            },
            Utc::now(),
            1,
        );
        assert!(debit.allows_balance(dec!(-50)));
        assert!(debit.allows_balance(dec!(-12.50)));
        assert!(debit.allows_balance(dec!(0)));
        assert!(!debit.allows_balance(dec!(0.01)));
        assert!(!debit.allows_balance(dec!(-50.01)));

        let credit = Transaction::from_new(
            NewTransaction {
                account_id: AccountId::new("acc"),
                operation_type_id: 4,
                amount: dec!(60),
            },
            Utc::now(),
            2,
        );
        assert!(credit.allows_balance(dec!(60)));
        assert!(credit.allows_balance(dec!(0)));
        assert!(!credit.allows_balance(dec!(-1)));
        assert!(!credit.allows_balance(dec!(60.01)));
    }
}
