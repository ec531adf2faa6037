//! Append-only journal store
//!
//! Each frame is a little-endian `u32` body length followed by a record produced by
//! [`RecordSerialize::to_bytes`]. Opening the journal replays every frame into a
//! [`MemoryStore`]; action frames are full rows and the last one wins.

use std::{
    fs::{File, OpenOptions},
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use tracing::{info, warn};

use crate::{
    state::{Action, ActionId, Payout, PayoutId, Snapshot, SnapshotId},
    store::{
        memory::{MemoryStore, Tables},
        records::{Record, RecordSerialize},
        Store, StoreError,
    },
};

const FRAME_HEADER_LEN: usize = 4;

#[derive(Debug, Default, PartialEq, Eq)]
struct ReplayStats {
    frames: usize,
    /// Length of the intact prefix
    valid_len: usize,
}

pub struct JournalStore {
    path: PathBuf,
    file: Mutex<File>,
    memory: MemoryStore,
}

impl JournalStore {
    /// Open or create the journal at `path` and replay it
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let mut tables = Tables::default();
        let stats = replay(&data, &mut tables)?;
        if stats.valid_len < data.len() {
            warn!(
                path = %path.display(),
                dropped_bytes = data.len() - stats.valid_len,
                "Truncating torn journal tail"
            );
            file.set_len(stats.valid_len as u64)?;
            file.sync_data()?;
        }
        info!(
            path = %path.display(),
            frames = stats.frames,
            actions = tables.actions.len(),
            snapshots = tables.snapshots.len(),
            payouts = tables.payouts.len(),
            "Journal replayed"
        );

        Ok(Self {
            path,
            file: Mutex::new(file),
            memory: MemoryStore::from_tables(tables),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_file(&self) -> Result<MutexGuard<'_, File>, StoreError> {
        self.file.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn append<R: RecordSerialize>(file: &mut File, record: &R) -> Result<(), StoreError> {
    let body = record.to_bytes()?;
    let len = u32::try_from(body.len())
        .map_err(|_| StoreError::Corrupt(format!("record of {} bytes too large", body.len())))?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&body);
    file.write_all(&frame)?;
    file.sync_data()?;
    Ok(())
}

fn replay(data: &[u8], tables: &mut Tables) -> Result<ReplayStats, StoreError> {
    let mut stats = ReplayStats::default();
    let mut offset = 0;

    while offset < data.len() {
        let Some(header) = data.get(offset..offset + FRAME_HEADER_LEN) else {
            break;
        };
        let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let start = offset + FRAME_HEADER_LEN;
        let Some(body) = data.get(start..start + len) else {
            break;
        };

        match Record::decode(body)? {
            Record::Action(action) => {
                if tables.actions.iter().any(|a| a.id == action.id) {
                    tables.replace_action(&action)?;
                } else {
                    tables.insert_action(&action)?;
                }
            }
            Record::Snapshot(snapshot) => tables.insert_snapshot(&snapshot)?,
            Record::Payout(payout) => tables.insert_payout(&payout)?,
        }

        offset = start + len;
        stats.frames += 1;
        stats.valid_len = offset;
    }

    Ok(stats)
}

impl Store for JournalStore {
    fn get_action(&self, id: &ActionId) -> Result<Option<Action>, StoreError> {
        self.memory.get_action(id)
    }

    fn list_actions(&self) -> Result<Vec<Action>, StoreError> {
        self.memory.list_actions()
    }

    fn create_action(&self, action: &Action) -> Result<(), StoreError> {
        let mut file = self.lock_file()?;
        if self.memory.get_action(&action.id)?.is_some() {
            return Err(StoreError::Duplicate {
                entity: "Action",
                id: action.id.to_string(),
            });
        }
        append(&mut file, action)?;
        self.memory.write()?.insert_action(action)
    }

    fn update_action(&self, action: &Action) -> Result<(), StoreError> {
        let mut file = self.lock_file()?;
        if self.memory.get_action(&action.id)?.is_none() {
            return Err(StoreError::Missing {
                entity: "Action",
                id: action.id.to_string(),
            });
        }
        append(&mut file, action)?;
        self.memory.write()?.replace_action(action)
    }

    fn get_snapshot(&self, id: &SnapshotId) -> Result<Option<Snapshot>, StoreError> {
        self.memory.get_snapshot(id)
    }

    fn list_snapshots(&self) -> Result<Vec<Snapshot>, StoreError> {
        self.memory.list_snapshots()
    }

    fn create_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let mut file = self.lock_file()?;
        if self.memory.get_snapshot(&snapshot.id)?.is_some() {
            return Err(StoreError::Duplicate {
                entity: "Snapshot",
                id: snapshot.id.to_string(),
            });
        }
        append(&mut file, snapshot)?;
        self.memory.write()?.insert_snapshot(snapshot)
    }

    fn latest_snapshot(&self, action_id: &ActionId) -> Result<Option<Snapshot>, StoreError> {
        self.memory.latest_snapshot(action_id)
    }

    fn get_payout(&self, id: &PayoutId) -> Result<Option<Payout>, StoreError> {
        self.memory.get_payout(id)
    }

    fn list_payouts(&self) -> Result<Vec<Payout>, StoreError> {
        self.memory.list_payouts()
    }

    fn create_payout(&self, payout: &Payout) -> Result<(), StoreError> {
        let mut file = self.lock_file()?;
        if self.memory.get_payout(&payout.id)?.is_some() {
            return Err(StoreError::Duplicate {
                entity: "Payout",
                id: payout.id.to_string(),
            });
        }
        append(&mut file, payout)?;
        self.memory.write()?.insert_payout(payout)
    }
}
