use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    error::CorporateActionError,
    state::{ActionKind, PayoutTerms, SplitRatio},
};

fn announce_by_default() -> bool {
    true
}

/// Arguments to create a corporate action
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActionArgs {
    pub company: String,
    pub token: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub record_at: DateTime<Utc>,
    pub payable_at: DateTime<Utc>,
    /// Required for dividends
    #[serde(default)]
    pub payout_per_share: Option<Decimal>,
    /// Required for splits, e.g. `2:1`
    #[serde(default)]
    pub split_ratio: Option<String>,
    /// Broadcast the announcement now; `false` stores a draft
    #[serde(default = "announce_by_default")]
    pub announce: bool,
}

impl CreateActionArgs {
    /// Validate the arguments and derive kind-specific terms
    pub fn validate(&self) -> Result<PayoutTerms, CorporateActionError> {
        if self.company.trim().is_empty() {
            return Err(CorporateActionError::InvalidInput("company is required".into()));
        }
        if self.token.trim().is_empty() {
            return Err(CorporateActionError::InvalidInput("token is required".into()));
        }
        if self.payable_at < self.record_at {
            return Err(CorporateActionError::InvalidInput(
                "payable date precedes record date".into(),
            ));
        }

        match self.kind {
            ActionKind::Dividend => {
                let payout_per_share = self.payout_per_share.ok_or_else(|| {
                    CorporateActionError::InvalidInput("dividend requires payoutPerShare".into())
                })?;
                if payout_per_share <= Decimal::ZERO {
                    return Err(CorporateActionError::InvalidInput(
                        "payoutPerShare must be positive".into(),
                    ));
                }
                Ok(PayoutTerms::Dividend { payout_per_share })
            }
            ActionKind::Split => {
                let raw = self.split_ratio.as_deref().ok_or_else(|| {
                    CorporateActionError::InvalidInput("split requires splitRatio".into())
                })?;
                let split_ratio: SplitRatio = raw.parse()?;
                Ok(PayoutTerms::Split { split_ratio })
            }
        }
    }
}
