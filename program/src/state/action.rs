//! Corporate action state
use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    constants::prefixes, define_id, error::CorporateActionError, state::AnnouncementMemo,
    state::TxReference,
};

define_id!(
    /// Unique corporate action id
    ActionId,
    prefixes::ACTION
);

/// Kind of corporate event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Cash distribution per share
    Dividend,
    /// Share count adjustment
    Split,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Dividend => f.write_str("dividend"),
            ActionKind::Split => f.write_str("split"),
        }
    }
}

/// Lifecycle status of an action. Ordering follows the lifecycle.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Draft = 0,
    Announced = 1,
    Snapshotted = 2,
    Paid = 3,
}

impl From<ActionStatus> for u8 {
    fn from(status: ActionStatus) -> Self {
        status as u8
    }
}

impl TryFrom<u8> for ActionStatus {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(ActionStatus::Draft),
            1 => Ok(ActionStatus::Announced),
            2 => Ok(ActionStatus::Snapshotted),
            3 => Ok(ActionStatus::Paid),
            other => Err(other),
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionStatus::Draft => "draft",
            ActionStatus::Announced => "announced",
            ActionStatus::Snapshotted => "snapshotted",
            ActionStatus::Paid => "paid",
        };
        f.write_str(name)
    }
}

/// Split ratio written as `numerator:denominator`, e.g. `2:1`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitRatio {
    /// New shares
    pub numerator: u32,
    /// Old shares
    pub denominator: u32,
}

impl SplitRatio {
    /// Create a validated ratio
    pub fn new(numerator: u32, denominator: u32) -> Result<Self, CorporateActionError> {
        let ratio = Self {
            numerator,
            denominator,
        };
        ratio.validate()?;
        Ok(ratio)
    }

    /// Both sides must be positive
    pub fn validate(&self) -> Result<(), CorporateActionError> {
        if self.numerator == 0 || self.denominator == 0 {
            return Err(CorporateActionError::InvalidInput(format!(
                "split ratio {self} must have positive terms"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for SplitRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.numerator, self.denominator)
    }
}

impl FromStr for SplitRatio {
    type Err = CorporateActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CorporateActionError::InvalidInput(format!("invalid split ratio '{s}'"));
        let (numerator, denominator) = s.trim().split_once(':').ok_or_else(invalid)?;
        let numerator = numerator.trim().parse().map_err(|_| invalid())?;
        let denominator = denominator.trim().parse().map_err(|_| invalid())?;
        Self::new(numerator, denominator)
    }
}

impl Serialize for SplitRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SplitRatio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Kind-specific terms. A dividend always carries a rate, a split always a ratio.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PayoutTerms {
    Dividend {
        #[serde(rename = "payoutPerShare")]
        payout_per_share: Decimal,
    },
    Split {
        #[serde(rename = "splitRatio")]
        split_ratio: SplitRatio,
    },
}

impl PayoutTerms {
    pub fn kind(&self) -> ActionKind {
        match self {
            PayoutTerms::Dividend { .. } => ActionKind::Dividend,
            PayoutTerms::Split { .. } => ActionKind::Split,
        }
    }

    pub fn payout_per_share(&self) -> Option<Decimal> {
        match self {
            PayoutTerms::Dividend { payout_per_share } => Some(*payout_per_share),
            PayoutTerms::Split { .. } => None,
        }
    }

    pub fn split_ratio(&self) -> Option<SplitRatio> {
        match self {
            PayoutTerms::Dividend { .. } => None,
            PayoutTerms::Split { split_ratio } => Some(*split_ratio),
        }
    }
}

/// A declared corporate event
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: ActionId,
    pub company: String,
    pub token: String,
    #[serde(flatten)]
    pub terms: PayoutTerms,
    pub record_at: DateTime<Utc>,
    pub payable_at: DateTime<Utc>,
    /// Memo broadcast (or to be broadcast) with the announcement
    pub memo: AnnouncementMemo,
    /// Announcement transaction, absent while the action is a draft
    #[serde(rename = "xrplAnnounceTx", skip_serializing_if = "Option::is_none")]
    pub announce_tx: Option<TxReference>,
    pub status: ActionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        self.terms.kind()
    }

    /// Hex preview of the announcement memo as it travels on the ledger
    pub fn memo_hex(&self) -> Result<String, serde_json::Error> {
        self.memo.to_hex()
    }
}
