//! Snapshot state
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{constants::prefixes, define_id, error::CorporateActionError, state::ActionId};

define_id!(
    /// Unique snapshot id
    SnapshotId,
    prefixes::SNAPSHOT
);

/// One holder captured by a snapshot
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SnapshotHolder {
    pub address: String,
    pub balance: Decimal,
    #[serde(rename = "entitlementXrp")]
    pub entitlement: Decimal,
}

/// Immutable point-in-time capture of holder balances
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: SnapshotId,
    pub action_id: ActionId,
    pub taken_at: DateTime<Utc>,
    pub holders: Vec<SnapshotHolder>,
    pub total_holders: usize,
    /// Sum of holder balances
    pub total_shares: Decimal,
    #[serde(rename = "totalEntitlementXrp")]
    pub total_entitlement: Decimal,
}

impl Snapshot {
    /// Build a snapshot and derive its aggregates. Fails when a total does not fit a decimal.
    pub fn new(
        id: SnapshotId,
        action_id: ActionId,
        taken_at: DateTime<Utc>,
        holders: Vec<SnapshotHolder>,
    ) -> Result<Self, CorporateActionError> {
        let total_shares = checked_total(holders.iter().map(|h| h.balance), "shares")?;
        let total_entitlement = checked_total(holders.iter().map(|h| h.entitlement), "entitlement")?;

        Ok(Self {
            id,
            action_id,
            taken_at,
            total_holders: holders.len(),
            holders,
            total_shares,
            total_entitlement,
        })
    }

    pub fn holder(&self, address: &str) -> Option<&SnapshotHolder> {
        self.holders.iter().find(|h| h.address == address)
    }
}

fn checked_total(
    mut values: impl Iterator<Item = Decimal>,
    what: &str,
) -> Result<Decimal, CorporateActionError> {
    values
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(value))
        .ok_or_else(|| CorporateActionError::InvalidInput(format!("total {what} overflows")))
}
