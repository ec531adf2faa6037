//! Corporate action modules
//!
//! - Lifecycle Module: sole writer of action status
//! - Snapshot Module: captures holders and their entitlements
//! - Payout Module: pays a snapshot out through the ledger gateway
//! - Query Module: read-only holdings, dashboard and listings

/// Entitlement arithmetic shared by snapshots and payouts.
pub mod entitlement;
pub mod lifecycle;
pub mod payout;
pub mod query;
pub mod snapshot;

// Re-export modules for convenience
pub use entitlement::*;
pub use lifecycle::*;
pub use payout::*;
pub use query::*;
pub use snapshot::*;
