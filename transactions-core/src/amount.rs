//! Amount validation
//!
//! Amounts are exact decimals. A valid amount is non-zero and carries at most
//! two decimal digits once trailing zeros are dropped, so `10.50` and `10.5`
//! are accepted while `10.001` is not. The sign is left untouched.

use crate::error::{InvalidAmount, Result};
use rust_decimal::Decimal;

/// Maximum number of decimal digits accepted
pub const MAX_SCALE: u32 = 2;

/// Validate a raw amount and return it unchanged
pub fn validate(amount: Decimal) -> Result<Decimal> {
    if amount.is_zero() {
        return Err(InvalidAmount::Zero.into());
    }

    if amount.normalize().scale() > MAX_SCALE {
        return Err(InvalidAmount::Precision(amount).into());
    }

    Ok(amount)
}
