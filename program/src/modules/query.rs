//! Query Module
//!
//! Read-only views over the store: per-address holdings, the operator dashboard and plain
//! listings. Nothing here writes.

use std::{cmp::Reverse, collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    error::CorporateActionError,
    state::{Action, ActionId, ActionStatus, Payout, PayoutTerms, Snapshot},
    store::Store,
    utils::{now, short_address},
};

/// Balance of one token summed over the latest snapshot of every action on it
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TokenBalance {
    pub symbol: String,
    pub balance: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holdings {
    pub address: String,
    pub tokens: Vec<TokenBalance>,
    /// Actions on held tokens whose record date is still ahead
    pub upcoming_actions: Vec<Action>,
    /// Payouts to this address, newest first
    pub payout_history: Vec<Payout>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub announcements_posted: usize,
    pub snapshots_taken: usize,
    pub payouts_completed: usize,
    #[serde(rename = "totalXRPDistributed")]
    pub total_xrp_distributed: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineKind {
    Announcement,
    Snapshot,
    Payout,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TimelineKind,
    pub action_id: ActionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dashboard {
    pub kpis: Kpis,
    /// Newest first
    pub timeline: Vec<TimelineEvent>,
}

/// Full contents of the store
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoreDump {
    pub actions: Vec<Action>,
    pub snapshots: Vec<Snapshot>,
    pub payouts: Vec<Payout>,
}

pub struct QueryModule {
    store: Arc<dyn Store>,
}

impl QueryModule {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn get_action(&self, id: &ActionId) -> Result<Action, CorporateActionError> {
        self.store
            .get_action(id)?
            .ok_or_else(|| CorporateActionError::action_not_found(id))
    }

    /// Newest first
    pub fn list_actions(&self) -> Result<Vec<Action>, CorporateActionError> {
        Ok(self.store.list_actions()?)
    }

    /// Newest first, optionally restricted to one action
    pub fn list_snapshots(&self, action_id: Option<&ActionId>) -> Result<Vec<Snapshot>, CorporateActionError> {
        let mut snapshots = self.store.list_snapshots()?;
        if let Some(action_id) = action_id {
            snapshots.retain(|s| &s.action_id == action_id);
        }
        Ok(snapshots)
    }

    /// Newest first, optionally restricted to one action
    pub fn list_payouts(&self, action_id: Option<&ActionId>) -> Result<Vec<Payout>, CorporateActionError> {
        let mut payouts = match action_id {
            Some(action_id) => self.store.list_payouts_for_action(action_id)?,
            None => self.store.list_payouts()?,
        };
        newest_first(&mut payouts);
        Ok(payouts)
    }

    pub fn export_state(&self) -> Result<StoreDump, CorporateActionError> {
        Ok(StoreDump {
            actions: self.store.list_actions()?,
            snapshots: self.store.list_snapshots()?,
            payouts: self.store.list_payouts()?,
        })
    }

    pub fn holdings(&self, address: &str) -> Result<Holdings, CorporateActionError> {
        self.holdings_at(address, now())
    }

    /// Holdings of `address` with upcoming actions judged against `at`
    pub fn holdings_at(&self, address: &str, at: DateTime<Utc>) -> Result<Holdings, CorporateActionError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(CorporateActionError::InvalidInput("Address is required".to_owned()));
        }

        let actions = self.store.list_actions()?;

        // Balances from each action's latest snapshot add up per token
        let mut balances: BTreeMap<&str, Decimal> = BTreeMap::new();
        for action in &actions {
            let Some(snapshot) = self.store.latest_snapshot(&action.id)? else {
                continue;
            };
            let Some(holder) = snapshot.holder(address) else {
                continue;
            };
            let total = balances.entry(action.token.as_str()).or_default();
            *total = total.checked_add(holder.balance).ok_or_else(|| {
                CorporateActionError::InvalidInput(format!("{} balance of {address} overflows", action.token))
            })?;
        }

        let upcoming_actions = actions
            .iter()
            .filter(|a| balances.contains_key(a.token.as_str()) && a.record_at > at)
            .cloned()
            .collect();

        let tokens = balances
            .into_iter()
            .map(|(symbol, balance)| TokenBalance {
                symbol: symbol.to_owned(),
                balance,
            })
            .collect();

        let mut payout_history: Vec<Payout> = self
            .store
            .list_payouts()?
            .into_iter()
            .filter(|p| p.address == address)
            .collect();
        newest_first(&mut payout_history);

        Ok(Holdings {
            address: address.to_owned(),
            tokens,
            upcoming_actions,
            payout_history,
        })
    }

    pub fn dashboard(&self) -> Result<Dashboard, CorporateActionError> {
        let actions = self.store.list_actions()?;
        let snapshots = self.store.list_snapshots()?;
        let payouts = self.store.list_payouts()?;

        let sent: Vec<&Payout> = payouts.iter().filter(|p| p.is_sent()).collect();
        let kpis = Kpis {
            announcements_posted: actions.len(),
            snapshots_taken: snapshots.len(),
            payouts_completed: sent.len(),
            total_xrp_distributed: sent.iter().map(|p| p.amount_xrp).sum(),
        };

        let find_action = |id: &ActionId| actions.iter().find(|a| &a.id == id);
        let mut timeline = Vec::with_capacity(actions.len() + snapshots.len() + payouts.len());

        for payout in payouts.iter().rev() {
            let action = find_action(&payout.action_id);
            timeline.push(TimelineEvent {
                id: payout.id.to_string(),
                kind: TimelineKind::Payout,
                action_id: payout.action_id.clone(),
                company: action.map(|a| a.company.clone()),
                token: action.map(|a| a.token.clone()),
                description: format!(
                    "Payout {} • {} XRP to {} • {}",
                    payout.status,
                    payout.amount_xrp.normalize(),
                    short_address(&payout.address),
                    action.map_or_else(|| payout.action_id.to_string(), |a| a.company.clone())
                ),
                timestamp: payout.created_at,
            });
        }

        for snapshot in &snapshots {
            let action = find_action(&snapshot.action_id);
            timeline.push(TimelineEvent {
                id: snapshot.id.to_string(),
                kind: TimelineKind::Snapshot,
                action_id: snapshot.action_id.clone(),
                company: action.map(|a| a.company.clone()),
                token: action.map(|a| a.token.clone()),
                description: format!(
                    "Snapshot taken • {} • {} holders",
                    subject(action, &snapshot.action_id),
                    snapshot.total_holders
                ),
                timestamp: snapshot.taken_at,
            });
        }

        for action in actions.iter().filter(|a| a.status != ActionStatus::Draft) {
            timeline.push(TimelineEvent {
                id: format!("{}-announcement", action.id),
                kind: TimelineKind::Announcement,
                action_id: action.id.clone(),
                company: Some(action.company.clone()),
                token: Some(action.token.clone()),
                description: announcement_description(action),
                timestamp: action.created_at,
            });
        }

        // Stable; same-instant events stay newest first as pushed
        timeline.sort_by_key(|e| Reverse(e.timestamp));

        Ok(Dashboard { kpis, timeline })
    }
}

fn newest_first(payouts: &mut [Payout]) {
    payouts.reverse();
    payouts.sort_by_key(|p| Reverse(p.created_at));
}

fn subject(action: Option<&Action>, action_id: &ActionId) -> String {
    match action {
        Some(action) => format!("{} ({})", action.company, action.token),
        None => action_id.to_string(),
    }
}

fn announcement_description(action: &Action) -> String {
    let subject = subject(Some(action), &action.id);
    match &action.terms {
        PayoutTerms::Dividend { payout_per_share } => format!(
            "Dividend announced • {subject} • {} XRP/share",
            payout_per_share.normalize()
        ),
        PayoutTerms::Split { split_ratio } => {
            format!("Stock split announced • {subject} • {split_ratio}")
        }
    }
}
