//! Structured memos carried by ledger transactions
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    constants::DIVIDEND_REASON,
    state::{ActionId, ActionKind, PayoutTerms},
};

/// Memo broadcast when an action is announced
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementMemo {
    pub event: ActionKind,
    pub token: String,
    pub record_at: DateTime<Utc>,
    pub payable_at: DateTime<Utc>,
    /// Always present on the wire, `null` for splits
    pub payout_per_share: Option<Decimal>,
}

impl AnnouncementMemo {
    pub fn new(
        token: &str,
        terms: &PayoutTerms,
        record_at: DateTime<Utc>,
        payable_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event: terms.kind(),
            token: token.to_owned(),
            record_at,
            payable_at,
            payout_per_share: terms.payout_per_share(),
        }
    }
}

/// Memo attached to every dividend payment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendMemo {
    pub action_id: ActionId,
    pub reason: String,
    /// Shares held at snapshot time
    pub shares: Decimal,
    pub amount_xrp: Decimal,
}

impl DividendMemo {
    pub fn new(action_id: ActionId, shares: Decimal, amount_xrp: Decimal) -> Self {
        Self {
            action_id,
            reason: DIVIDEND_REASON.to_owned(),
            shares,
            amount_xrp,
        }
    }
}

/// Memo payload handed to the ledger gateway
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Memo {
    Announcement(AnnouncementMemo),
    Dividend(DividendMemo),
}

impl Memo {
    /// JSON body as it appears in `MemoData`
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Upper-case hex of the JSON body
    pub fn to_hex(&self) -> Result<String, serde_json::Error> {
        Ok(hex_upper(self.to_json()?.as_bytes()))
    }
}

impl AnnouncementMemo {
    pub fn to_hex(&self) -> Result<String, serde_json::Error> {
        Memo::Announcement(self.clone()).to_hex()
    }
}

/// Upper-case hex encoding used by ledger memo fields
pub fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02X}");
        out
    })
}
