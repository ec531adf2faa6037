//! Utility functions shared across modules

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::AMOUNT_SCALE;

/// Current time truncated to microseconds, the precision the journal keeps
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Round a monetary amount to [`AMOUNT_SCALE`] places, halves away from zero
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Shorten an address for human readable descriptions
pub fn short_address(address: &str) -> String {
    let prefix: String = address.chars().take(6).collect();
    format!("{prefix}…")
}
