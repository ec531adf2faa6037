//! Action Lifecycle Module
//!
//! Sole writer of an action's status after creation.
//! `draft → announced → snapshotted → paid`

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::{
    error::CorporateActionError,
    state::{Action, ActionId, ActionStatus, TxReference},
    store::{Store, StoreError},
    utils::now,
};

pub struct LifecycleModule {
    store: Arc<dyn Store>,
    /// Serializes read-modify-write of action rows
    transitions: Mutex<()>,
}

impl LifecycleModule {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            transitions: Mutex::new(()),
        }
    }

    fn update<F>(&self, id: &ActionId, apply: F) -> Result<Action, CorporateActionError>
    where
        F: FnOnce(&mut Action) -> bool,
    {
        let _guard = self.transitions.lock().map_err(|_| StoreError::Poisoned)?;
        let mut action = self
            .store
            .get_action(id)?
            .ok_or_else(|| CorporateActionError::action_not_found(id))?;
        if apply(&mut action) {
            action.updated_at = now();
            self.store.update_action(&action)?;
        }
        Ok(action)
    }

    /// Overwrite the status without checking the transition
    pub fn set_status(&self, id: &ActionId, status: ActionStatus) -> Result<Action, CorporateActionError> {
        self.update(id, |action| {
            info!(action_id = %id, from = %action.status, to = %status, "Action status set");
            action.status = status;
            true
        })
    }

    /// Move forward to `target`; an action already at or past it is left alone
    pub fn advance(&self, id: &ActionId, target: ActionStatus) -> Result<Action, CorporateActionError> {
        self.update(id, |action| {
            if action.status >= target {
                debug!(action_id = %id, current = %action.status, target = %target, "Status transition skipped");
                return false;
            }
            info!(action_id = %id, from = %action.status, to = %target, "Action status advanced");
            action.status = target;
            true
        })
    }

    /// Attach the announcement transaction of a draft and mark it announced
    pub fn record_announcement(&self, id: &ActionId, tx: TxReference) -> Result<Action, CorporateActionError> {
        self.update(id, |action| {
            info!(action_id = %id, tx = %tx, "Action announced");
            action.announce_tx = Some(tx);
            if action.status < ActionStatus::Announced {
                action.status = ActionStatus::Announced;
            }
            true
        })
    }
}
