//! Ledger payment gateway
//!
//! The gateway turns "pay this amount to this address with this memo" into one finalized
//! ledger transaction, or a typed failure. It never retries; retry policy belongs to callers.

pub mod address;
pub mod xrpl;

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::state::{Memo, TxReference};

pub use xrpl::{LedgerTransport, XrplGateway};

/// Errors surfaced by a ledger gateway. Any of them means the payment did not settle.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GatewayError {
    /// Connection or request failure
    #[error("Transport error: {0}")]
    Transport(String),
    /// Ledger engine rejected the transaction
    #[error("Ledger rejected transaction: {code} {message}")]
    Rejected {
        /// Engine result code
        code: String,
        /// Engine message, possibly empty
        message: String,
    },
    /// Response neither proves success nor identifies the transaction
    #[error("Ambiguous ledger response: {0}")]
    Ambiguous(String),
    /// Amount not positive or not representable in drops
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),
    /// Destination is not a ledger address
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),
    /// Call did not complete in time
    #[error("Gateway call timed out after {0:?}")]
    Timeout(Duration),
    /// Gateway lacks a required credential or account
    #[error("Gateway misconfigured: {0}")]
    Configuration(String),
    /// Memo could not be encoded
    #[error("Memo encoding failed: {0}")]
    Memo(String),
}

/// Ledger network identification
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub network_id: Option<u32>,
}

/// Balance lookup result
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub address: String,
    pub exists: bool,
    #[serde(rename = "balanceXRP", skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
}

/// Account funded by a test network faucet
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundedAccount {
    pub address: String,
    /// Seed of a newly created account; absent on top-ups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    #[serde(rename = "amountXRP", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx: Option<TxReference>,
}

/// Submit a payment and await final validation
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Send `amount` (in XRP) to `destination` with `memo`, returning the finalized transaction
    async fn submit_payment(
        &self,
        destination: &str,
        amount: Decimal,
        memo: &Memo,
    ) -> Result<TxReference, GatewayError>;

    /// Network the gateway talks to
    async fn server_info(&self) -> Result<NetworkInfo, GatewayError>;

    /// Balance of `address`; unknown accounts report `exists: false`
    async fn account_info(&self, address: &str) -> Result<AccountInfo, GatewayError>;

    /// Top up `address` from the test network faucet, or create a new funded account when
    /// no address is given. Ledgers without a faucet refuse.
    async fn fund_account(&self, _address: Option<&str>) -> Result<FundedAccount, GatewayError> {
        Err(GatewayError::Configuration("ledger has no faucet".to_owned()))
    }
}
