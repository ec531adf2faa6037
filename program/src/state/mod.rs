//! State structures for corporate actions
//!
//! Contains the three persisted entities and the types they are built from:
//! - Actions with their payout terms and lifecycle status
//! - Snapshots of holder balances with computed entitlements
//! - Payout records, one per attempted ledger payment
//! - Structured memos attached to ledger transactions

pub mod action;
pub mod memo;
pub mod payout;
pub mod snapshot;

// Re-export all structures for convenience
pub use action::*;
pub use memo::*;
pub use payout::*;
pub use snapshot::*;
