//! Journal record encoding
//!
//! Every record starts with a discriminator byte so the journal reader can pick the
//! concrete layout, followed by a borsh body. Decimals are stored as their 16-byte
//! representation and timestamps as microseconds since the epoch.

use borsh::{BorshDeserialize, BorshSerialize};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    state::{
        Action, ActionId, ActionStatus, AnnouncementMemo, DividendMemo, Payout, PayoutId,
        PayoutStatus, PayoutTerms, Snapshot, SnapshotHolder, SnapshotId, SplitRatio, TxReference,
    },
    store::StoreError,
};

/// Unique discriminator byte of a record type
pub trait Discriminator {
    const DISCRIMINATOR: u8;
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordDiscriminators {
    ActionDiscriminator = 0,
    SnapshotDiscriminator = 1,
    PayoutDiscriminator = 2,
}

impl TryFrom<u8> for RecordDiscriminators {
    type Error = StoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RecordDiscriminators::ActionDiscriminator),
            1 => Ok(RecordDiscriminators::SnapshotDiscriminator),
            2 => Ok(RecordDiscriminators::PayoutDiscriminator),
            other => Err(StoreError::Corrupt(format!("unknown discriminator {other}"))),
        }
    }
}

pub trait RecordSerialize: Discriminator {
    fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        let mut data = vec![Self::DISCRIMINATOR];
        data.extend(self.to_bytes_inner()?);
        Ok(data)
    }

    /// Serialize the body without the discriminator byte.
    fn to_bytes_inner(&self) -> Result<Vec<u8>, StoreError>;
}

pub trait RecordDeserialize: Discriminator + Sized {
    fn try_from_bytes_inner(data: &[u8]) -> Result<Self, StoreError>;

    fn try_from_bytes(data: &[u8]) -> Result<Self, StoreError> {
        let (disc, rest) = data
            .split_first()
            .ok_or_else(|| StoreError::Corrupt("empty record".to_owned()))?;
        if *disc != Self::DISCRIMINATOR {
            return Err(StoreError::Corrupt(format!(
                "expected discriminator {}, found {disc}",
                Self::DISCRIMINATOR
            )));
        }
        Self::try_from_bytes_inner(rest)
    }
}

/// Any journal record
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Action(Action),
    Snapshot(Snapshot),
    Payout(Payout),
}

impl Record {
    pub fn decode(data: &[u8]) -> Result<Self, StoreError> {
        let disc = data
            .first()
            .copied()
            .ok_or_else(|| StoreError::Corrupt("empty record".to_owned()))?;
        match RecordDiscriminators::try_from(disc)? {
            RecordDiscriminators::ActionDiscriminator => Action::try_from_bytes(data).map(Record::Action),
            RecordDiscriminators::SnapshotDiscriminator => {
                Snapshot::try_from_bytes(data).map(Record::Snapshot)
            }
            RecordDiscriminators::PayoutDiscriminator => Payout::try_from_bytes(data).map(Record::Payout),
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize)]
enum TxRow {
    Hash(String),
    LedgerPosition { ledger_index: u64, ctid: Option<String> },
}

impl From<&TxReference> for TxRow {
    fn from(tx: &TxReference) -> Self {
        match tx {
            TxReference::Hash(hash) => TxRow::Hash(hash.clone()),
            TxReference::LedgerPosition { ledger_index, ctid } => TxRow::LedgerPosition {
                ledger_index: *ledger_index,
                ctid: ctid.clone(),
            },
        }
    }
}

impl From<TxRow> for TxReference {
    fn from(row: TxRow) -> Self {
        match row {
            TxRow::Hash(hash) => TxReference::Hash(hash),
            TxRow::LedgerPosition { ledger_index, ctid } => {
                TxReference::LedgerPosition { ledger_index, ctid }
            }
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize)]
enum TermsRow {
    Dividend { payout_per_share: [u8; 16] },
    Split { numerator: u32, denominator: u32 },
}

#[derive(BorshSerialize, BorshDeserialize)]
struct ActionRow {
    id: String,
    company: String,
    token: String,
    terms: TermsRow,
    record_at: i64,
    payable_at: i64,
    announce_tx: Option<TxRow>,
    status: u8,
    created_at: i64,
    updated_at: i64,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct HolderRow {
    address: String,
    balance: [u8; 16],
    entitlement: [u8; 16],
}

#[derive(BorshSerialize, BorshDeserialize)]
struct SnapshotRow {
    id: String,
    action_id: String,
    taken_at: i64,
    holders: Vec<HolderRow>,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct PayoutRow {
    id: String,
    action_id: String,
    address: String,
    amount: [u8; 16],
    shares: [u8; 16],
    status: u8,
    tx: Option<TxRow>,
    created_at: i64,
}

fn timestamp(micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {micros}")))
}

fn encode<T: BorshSerialize>(row: &T) -> Result<Vec<u8>, StoreError> {
    row.try_to_vec().map_err(StoreError::Io)
}

fn decode<T: BorshDeserialize>(data: &[u8]) -> Result<T, StoreError> {
    T::try_from_slice(data).map_err(|e| StoreError::Corrupt(e.to_string()))
}

impl Discriminator for Action {
    const DISCRIMINATOR: u8 = RecordDiscriminators::ActionDiscriminator as u8;
}

impl RecordSerialize for Action {
    fn to_bytes_inner(&self) -> Result<Vec<u8>, StoreError> {
        let terms = match &self.terms {
            PayoutTerms::Dividend { payout_per_share } => TermsRow::Dividend {
                payout_per_share: payout_per_share.serialize(),
            },
            PayoutTerms::Split { split_ratio } => TermsRow::Split {
                numerator: split_ratio.numerator,
                denominator: split_ratio.denominator,
            },
        };
        encode(&ActionRow {
            id: self.id.to_string(),
            company: self.company.clone(),
            token: self.token.clone(),
            terms,
            record_at: self.record_at.timestamp_micros(),
            payable_at: self.payable_at.timestamp_micros(),
            announce_tx: self.announce_tx.as_ref().map(TxRow::from),
            status: self.status.into(),
            created_at: self.created_at.timestamp_micros(),
            updated_at: self.updated_at.timestamp_micros(),
        })
    }
}

impl RecordDeserialize for Action {
    fn try_from_bytes_inner(data: &[u8]) -> Result<Self, StoreError> {
        let row: ActionRow = decode(data)?;
        let terms = match row.terms {
            TermsRow::Dividend { payout_per_share } => PayoutTerms::Dividend {
                payout_per_share: Decimal::deserialize(payout_per_share),
            },
            TermsRow::Split {
                numerator,
                denominator,
            } => PayoutTerms::Split {
                split_ratio: SplitRatio::new(numerator, denominator)
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            },
        };
        let status = ActionStatus::try_from(row.status)
            .map_err(|v| StoreError::Corrupt(format!("unknown action status {v}")))?;
        let record_at = timestamp(row.record_at)?;
        let payable_at = timestamp(row.payable_at)?;

        Ok(Action {
            memo: AnnouncementMemo::new(&row.token, &terms, record_at, payable_at),
            id: ActionId::from(row.id),
            company: row.company,
            token: row.token,
            terms,
            record_at,
            payable_at,
            announce_tx: row.announce_tx.map(TxReference::from),
            status,
            created_at: timestamp(row.created_at)?,
            updated_at: timestamp(row.updated_at)?,
        })
    }
}

impl Discriminator for Snapshot {
    const DISCRIMINATOR: u8 = RecordDiscriminators::SnapshotDiscriminator as u8;
}

impl RecordSerialize for Snapshot {
    fn to_bytes_inner(&self) -> Result<Vec<u8>, StoreError> {
        encode(&SnapshotRow {
            id: self.id.to_string(),
            action_id: self.action_id.to_string(),
            taken_at: self.taken_at.timestamp_micros(),
            holders: self
                .holders
                .iter()
                .map(|h| HolderRow {
                    address: h.address.clone(),
                    balance: h.balance.serialize(),
                    entitlement: h.entitlement.serialize(),
                })
                .collect(),
        })
    }
}

impl RecordDeserialize for Snapshot {
    fn try_from_bytes_inner(data: &[u8]) -> Result<Self, StoreError> {
        let row: SnapshotRow = decode(data)?;
        let holders = row
            .holders
            .into_iter()
            .map(|h| SnapshotHolder {
                address: h.address,
                balance: Decimal::deserialize(h.balance),
                entitlement: Decimal::deserialize(h.entitlement),
            })
            .collect();

        Snapshot::new(
            SnapshotId::from(row.id),
            ActionId::from(row.action_id),
            timestamp(row.taken_at)?,
            holders,
        )
        .map_err(|e| StoreError::Corrupt(e.to_string()))
    }
}

impl Discriminator for Payout {
    const DISCRIMINATOR: u8 = RecordDiscriminators::PayoutDiscriminator as u8;
}

impl RecordSerialize for Payout {
    fn to_bytes_inner(&self) -> Result<Vec<u8>, StoreError> {
        encode(&PayoutRow {
            id: self.id.to_string(),
            action_id: self.action_id.to_string(),
            address: self.address.clone(),
            amount: self.amount_xrp.serialize(),
            shares: self.memo.shares.serialize(),
            status: self.status.into(),
            tx: self.tx.as_ref().map(TxRow::from),
            created_at: self.created_at.timestamp_micros(),
        })
    }
}

impl RecordDeserialize for Payout {
    fn try_from_bytes_inner(data: &[u8]) -> Result<Self, StoreError> {
        let row: PayoutRow = decode(data)?;
        let action_id = ActionId::from(row.action_id);
        let amount_xrp = Decimal::deserialize(row.amount);
        let status = PayoutStatus::try_from(row.status)
            .map_err(|v| StoreError::Corrupt(format!("unknown payout status {v}")))?;

        Ok(Payout {
            id: PayoutId::from(row.id),
            memo: DividendMemo::new(action_id.clone(), Decimal::deserialize(row.shares), amount_xrp),
            action_id,
            address: row.address,
            amount_xrp,
            status,
            tx: row.tx.map(TxReference::from),
            created_at: timestamp(row.created_at)?,
        })
    }
}
