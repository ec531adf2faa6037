//! Snapshot Module
//!
//! Captures holder balances for an action, computes entitlements and persists the
//! immutable result. A successful snapshot moves the action to `snapshotted`.

use std::sync::Arc;

use tracing::info;

use crate::{
    error::CorporateActionError,
    instructions::{sanitize_holders, HolderInput},
    modules::{entitlement::entitlement_for, lifecycle::LifecycleModule},
    state::{ActionId, ActionStatus, Snapshot, SnapshotHolder, SnapshotId},
    store::Store,
    utils::now,
};

pub struct SnapshotModule {
    store: Arc<dyn Store>,
    lifecycle: Arc<LifecycleModule>,
}

impl SnapshotModule {
    pub fn new(store: Arc<dyn Store>, lifecycle: Arc<LifecycleModule>) -> Self {
        Self { store, lifecycle }
    }

    /// Sanitize `holders`, compute entitlements and persist a new snapshot.
    /// Nothing is written when no holder survives sanitization.
    pub fn take_snapshot(
        &self,
        action_id: &ActionId,
        holders: &[HolderInput],
    ) -> Result<Snapshot, CorporateActionError> {
        let action = self
            .store
            .get_action(action_id)?
            .ok_or_else(|| CorporateActionError::action_not_found(action_id))?;

        let sanitized = sanitize_holders(holders)?;
        if sanitized.is_empty() {
            return Err(CorporateActionError::InvalidInput(
                "No valid holders supplied".to_owned(),
            ));
        }

        let holders = sanitized
            .into_iter()
            .map(|h| {
                Ok(SnapshotHolder {
                    entitlement: entitlement_for(&action.terms, h.balance)?,
                    address: h.address,
                    balance: h.balance,
                })
            })
            .collect::<Result<Vec<_>, CorporateActionError>>()?;

        let snapshot = Snapshot::new(SnapshotId::generate(), action_id.clone(), now(), holders)?;
        self.store.create_snapshot(&snapshot)?;
        info!(
            action_id = %action_id,
            snapshot_id = %snapshot.id,
            holders = snapshot.total_holders,
            total_shares = %snapshot.total_shares,
            total_entitlement = %snapshot.total_entitlement,
            "Snapshot taken"
        );

        self.lifecycle.advance(action_id, ActionStatus::Snapshotted)?;
        Ok(snapshot)
    }

    pub fn latest_snapshot(&self, action_id: &ActionId) -> Result<Option<Snapshot>, CorporateActionError> {
        Ok(self.store.latest_snapshot(action_id)?)
    }
}
