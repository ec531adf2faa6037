//! Corporate actions engine on the XRP Ledger
//!
//! Announces dividends and splits, snapshots holder balances with their entitlements and
//! pays dividends out through a ledger gateway, recording one payout per holder.

#![allow(clippy::arithmetic_side_effects)]

#[macro_use]
mod macros;

/// Engine configuration
pub mod config;
/// Constants
pub mod constants;
/// Error types
pub mod error;
/// Ledger gateway
pub mod gateway;
/// Collaborator-facing instruction definitions
pub mod instruction;
/// Instruction arguments
pub mod instructions;
/// Corporate action modules
pub mod modules;
/// Instruction processor
pub mod processor;
/// State structures
pub mod state;
/// Persistence
pub mod store;
/// Utility functions
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use config::EngineConfig;
pub use error::CorporateActionError;
pub use instruction::{Instruction, Response};
pub use processor::Processor;
