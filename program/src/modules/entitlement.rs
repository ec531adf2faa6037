//! Entitlement calculation
//!
//! Dividends pay `balance × payout_per_share` rounded to six places. Splits change share
//! counts, not cash, so their entitlement is always zero.

use rust_decimal::Decimal;

use crate::{
    error::CorporateActionError,
    state::{ActionKind, PayoutTerms},
    utils::round_amount,
};

/// Cash entitlement of a holder
pub fn compute_entitlement(
    kind: ActionKind,
    payout_per_share: Option<Decimal>,
    balance: Decimal,
) -> Result<Decimal, CorporateActionError> {
    match kind {
        ActionKind::Split => Ok(Decimal::ZERO),
        ActionKind::Dividend => {
            let rate = payout_per_share.unwrap_or(Decimal::ZERO);
            balance
                .checked_mul(rate)
                .map(round_amount)
                .ok_or_else(|| {
                    CorporateActionError::InvalidInput(format!(
                        "entitlement of {balance} shares at {rate} overflows"
                    ))
                })
        }
    }
}

/// Entitlement under the terms of an action
pub fn entitlement_for(terms: &PayoutTerms, balance: Decimal) -> Result<Decimal, CorporateActionError> {
    compute_entitlement(terms.kind(), terms.payout_per_share(), balance)
}
