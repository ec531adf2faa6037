//! Storage for actions, snapshots and payouts
//!
//! Orchestration code depends only on [`Store`]; [`MemoryStore`] and [`JournalStore`]
//! are the two shipped backends.

pub mod journal;
pub mod memory;
pub mod records;

use thiserror::Error;

use crate::state::{Action, ActionId, Payout, PayoutId, Snapshot, SnapshotId};

pub use journal::JournalStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} already exists: {id}")]
    Duplicate { entity: &'static str, id: String },
    #[error("{entity} does not exist: {id}")]
    Missing { entity: &'static str, id: String },
    #[error("Store lock poisoned")]
    Poisoned,
    #[error("Journal I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Repository over the three collections.
///
/// List operations return newest first for actions and snapshots and insertion order for
/// payouts. Implementations must never expose a partially written row.
pub trait Store: Send + Sync {
    fn get_action(&self, id: &ActionId) -> Result<Option<Action>, StoreError>;
    fn list_actions(&self) -> Result<Vec<Action>, StoreError>;
    fn create_action(&self, action: &Action) -> Result<(), StoreError>;
    /// Replace the stored row with the same id
    fn update_action(&self, action: &Action) -> Result<(), StoreError>;

    fn get_snapshot(&self, id: &SnapshotId) -> Result<Option<Snapshot>, StoreError>;
    fn list_snapshots(&self) -> Result<Vec<Snapshot>, StoreError>;
    fn create_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Most recently created snapshot of `action_id`
    fn latest_snapshot(&self, action_id: &ActionId) -> Result<Option<Snapshot>, StoreError> {
        Ok(self
            .list_snapshots()?
            .into_iter()
            .find(|s| &s.action_id == action_id))
    }

    fn get_payout(&self, id: &PayoutId) -> Result<Option<Payout>, StoreError>;
    fn list_payouts(&self) -> Result<Vec<Payout>, StoreError>;
    fn create_payout(&self, payout: &Payout) -> Result<(), StoreError>;

    fn list_payouts_for_action(&self, action_id: &ActionId) -> Result<Vec<Payout>, StoreError> {
        Ok(self
            .list_payouts()?
            .into_iter()
            .filter(|p| &p.action_id == action_id)
            .collect())
    }
}
