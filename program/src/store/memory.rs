//! In-memory store
use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    state::{Action, ActionId, Payout, PayoutId, Snapshot, SnapshotId},
    store::{Store, StoreError},
};

/// Rows in insertion order
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub actions: Vec<Action>,
    pub snapshots: Vec<Snapshot>,
    pub payouts: Vec<Payout>,
    /// Position of each payout in `payouts`
    payout_index: HashMap<PayoutId, usize>,
}

impl Tables {
    pub fn insert_action(&mut self, action: &Action) -> Result<(), StoreError> {
        if self.actions.iter().any(|a| a.id == action.id) {
            return Err(StoreError::Duplicate {
                entity: "Action",
                id: action.id.to_string(),
            });
        }
        self.actions.push(action.clone());
        Ok(())
    }

    pub fn replace_action(&mut self, action: &Action) -> Result<(), StoreError> {
        let slot = self
            .actions
            .iter_mut()
            .find(|a| a.id == action.id)
            .ok_or_else(|| StoreError::Missing {
                entity: "Action",
                id: action.id.to_string(),
            })?;
        *slot = action.clone();
        Ok(())
    }

    pub fn insert_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if self.snapshots.iter().any(|s| s.id == snapshot.id) {
            return Err(StoreError::Duplicate {
                entity: "Snapshot",
                id: snapshot.id.to_string(),
            });
        }
        self.snapshots.push(snapshot.clone());
        Ok(())
    }

    pub fn insert_payout(&mut self, payout: &Payout) -> Result<(), StoreError> {
        if self.payout_index.contains_key(&payout.id) {
            return Err(StoreError::Duplicate {
                entity: "Payout",
                id: payout.id.to_string(),
            });
        }
        self.payout_index.insert(payout.id.clone(), self.payouts.len());
        self.payouts.push(payout.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_tables(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
        }
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Store for MemoryStore {
    fn get_action(&self, id: &ActionId) -> Result<Option<Action>, StoreError> {
        Ok(self.read()?.actions.iter().find(|a| &a.id == id).cloned())
    }

    fn list_actions(&self) -> Result<Vec<Action>, StoreError> {
        Ok(self.read()?.actions.iter().rev().cloned().collect())
    }

    fn create_action(&self, action: &Action) -> Result<(), StoreError> {
        self.write()?.insert_action(action)
    }

    fn update_action(&self, action: &Action) -> Result<(), StoreError> {
        self.write()?.replace_action(action)
    }

    fn get_snapshot(&self, id: &SnapshotId) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.read()?.snapshots.iter().find(|s| &s.id == id).cloned())
    }

    fn list_snapshots(&self) -> Result<Vec<Snapshot>, StoreError> {
        Ok(self.read()?.snapshots.iter().rev().cloned().collect())
    }

    fn create_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.write()?.insert_snapshot(snapshot)
    }

    fn latest_snapshot(&self, action_id: &ActionId) -> Result<Option<Snapshot>, StoreError> {
        Ok(self
            .read()?
            .snapshots
            .iter()
            .rev()
            .find(|s| &s.action_id == action_id)
            .cloned())
    }

    fn get_payout(&self, id: &PayoutId) -> Result<Option<Payout>, StoreError> {
        let tables = self.read()?;
        Ok(tables.payout_index.get(id).and_then(|&i| tables.payouts.get(i)).cloned())
    }

    fn list_payouts(&self) -> Result<Vec<Payout>, StoreError> {
        Ok(self.read()?.payouts.clone())
    }

    fn create_payout(&self, payout: &Payout) -> Result<(), StoreError> {
        self.write()?.insert_payout(payout)
    }
}
