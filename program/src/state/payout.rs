//! Payout state
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    constants::prefixes,
    define_id,
    state::{ActionId, DividendMemo},
};

define_id!(
    /// Unique payout record id
    PayoutId,
    prefixes::PAYOUT
);

/// Outcome of one payout attempt
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    /// Reserved, never written by the orchestrator
    Pending = 0,
    Sent = 1,
    Failed = 2,
}

impl From<PayoutStatus> for u8 {
    fn from(status: PayoutStatus) -> Self {
        status as u8
    }
}

impl TryFrom<u8> for PayoutStatus {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(PayoutStatus::Pending),
            1 => Ok(PayoutStatus::Sent),
            2 => Ok(PayoutStatus::Failed),
            other => Err(other),
        }
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Sent => "sent",
            PayoutStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Reference to a finalized ledger transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TxReference {
    /// Transaction hash
    Hash(String),
    /// Validated ledger position, used when the node did not return a hash
    #[serde(rename_all = "camelCase")]
    LedgerPosition {
        ledger_index: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        ctid: Option<String>,
    },
}

impl fmt::Display for TxReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxReference::Hash(hash) => f.write_str(hash),
            TxReference::LedgerPosition {
                ledger_index,
                ctid: Some(ctid),
            } => write!(f, "ledger:{ledger_index}/{ctid}"),
            TxReference::LedgerPosition { ledger_index, .. } => write!(f, "ledger:{ledger_index}"),
        }
    }
}

/// One attempted payment to one holder for one action
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payout {
    pub id: PayoutId,
    pub action_id: ActionId,
    pub address: String,
    pub amount_xrp: Decimal,
    pub status: PayoutStatus,
    /// Present iff the payment was sent
    #[serde(rename = "txHash", skip_serializing_if = "Option::is_none")]
    pub tx: Option<TxReference>,
    #[serde(rename = "memoJson")]
    pub memo: DividendMemo,
    pub created_at: DateTime<Utc>,
}

impl Payout {
    /// Record of a settled payment
    pub fn sent(memo: DividendMemo, address: &str, tx: TxReference, at: DateTime<Utc>) -> Self {
        Self::record(memo, address, PayoutStatus::Sent, Some(tx), at)
    }

    /// Record of a payment that did not settle
    pub fn failed(memo: DividendMemo, address: &str, at: DateTime<Utc>) -> Self {
        Self::record(memo, address, PayoutStatus::Failed, None, at)
    }

    fn record(
        memo: DividendMemo,
        address: &str,
        status: PayoutStatus,
        tx: Option<TxReference>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PayoutId::generate(),
            action_id: memo.action_id.clone(),
            address: address.to_owned(),
            amount_xrp: memo.amount_xrp,
            status,
            tx,
            memo,
            created_at: at,
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == PayoutStatus::Sent
    }
}
