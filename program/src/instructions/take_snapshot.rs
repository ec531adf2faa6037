use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::Deserialize;

use crate::{error::CorporateActionError, gateway::address::is_valid_classic_address};

/// Holder balance as supplied by a collaborator
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct HolderInput {
    pub address: String,
    pub balance: f64,
}

impl HolderInput {
    pub fn new(address: impl Into<String>, balance: f64) -> Self {
        Self {
            address: address.into(),
            balance,
        }
    }
}

/// A holder that survived sanitization
#[derive(Clone, Debug, PartialEq)]
pub struct SanitizedHolder {
    pub address: String,
    pub balance: Decimal,
}

/// Clamp a raw balance to a non-negative decimal. NaN and infinities become zero.
pub fn clamp_balance(balance: f64) -> Decimal {
    if !balance.is_finite() || balance <= 0.0 {
        return Decimal::ZERO;
    }
    Decimal::from_f64(balance).unwrap_or(Decimal::ZERO)
}

/// Drop invalid addresses and empty balances, merging repeated addresses in first-seen order
pub fn sanitize_holders(holders: &[HolderInput]) -> Result<Vec<SanitizedHolder>, CorporateActionError> {
    let mut sanitized: Vec<SanitizedHolder> = Vec::with_capacity(holders.len());

    for holder in holders {
        let address = holder.address.trim();
        if !is_valid_classic_address(address) {
            continue;
        }
        let balance = clamp_balance(holder.balance);
        if balance.is_zero() {
            continue;
        }
        match sanitized.iter_mut().find(|h| h.address == address) {
            Some(existing) => {
                existing.balance = existing.balance.checked_add(balance).ok_or_else(|| {
                    CorporateActionError::InvalidInput(format!("merged balance of {address} overflows"))
                })?;
            }
            None => sanitized.push(SanitizedHolder {
                address: address.to_owned(),
                balance,
            }),
        }
    }

    Ok(sanitized)
}
