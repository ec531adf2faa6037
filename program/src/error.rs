//! Corporate action errors

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive as _, ToPrimitive as _};
use serde::Serialize;
use thiserror::Error;

use crate::{
    gateway::GatewayError,
    state::{ActionId, TxReference},
    store::StoreError,
};

/// Errors that may be returned by corporate action operations
#[derive(Debug, Error)]
pub enum CorporateActionError {
    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity name
        entity: &'static str,
        /// Requested id
        id: String,
    },
    /// Payout requested before any snapshot was taken
    #[error("No snapshot found for action {0}")]
    NoSnapshot(ActionId),
    /// Malformed request
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Ledger gateway failure outside a payout batch
    #[error("Gateway failure: {0}")]
    Gateway(#[from] GatewayError),
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Another payout run holds the action
    #[error("Payout already in progress for action {0}")]
    PayoutInProgress(ActionId),
    /// Storage failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    /// Payout run stopped by a storage failure after some payments had settled
    #[error(
        "Payout run for action {action_id} stopped on store error: {source}; {} settled payments unrecorded",
        .unrecorded.len()
    )]
    PayoutUnrecorded {
        action_id: ActionId,
        /// Transactions of settled payments that have no payout row
        unrecorded: Vec<TxReference>,
        source: StoreError,
    },
}

impl CorporateActionError {
    /// Shorthand for a missing action
    pub fn action_not_found(id: &ActionId) -> Self {
        Self::NotFound {
            entity: "Action",
            id: id.to_string(),
        }
    }

    /// Stable classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NoSnapshot(_) => ErrorKind::NoSnapshot,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Gateway(_) => ErrorKind::GatewayFailure,
            Self::Configuration(_) => ErrorKind::ConfigurationError,
            Self::PayoutInProgress(_) => ErrorKind::PayoutInProgress,
            Self::Store(_) | Self::PayoutUnrecorded { .. } => ErrorKind::StoreFailure,
        }
    }
}

/// Numeric error codes exposed to collaborators
#[repr(u32)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, ToPrimitive, Serialize)]
pub enum ErrorKind {
    /// Action or snapshot absent
    NotFound = 1,
    /// Payout requested before a snapshot exists
    NoSnapshot = 2,
    /// Malformed address, balance or action terms
    InvalidInput = 3,
    /// Network or ledger rejection
    GatewayFailure = 4,
    /// Missing credential or destination
    ConfigurationError = 5,
    /// Concurrent payout run for the same action
    PayoutInProgress = 6,
    /// Storage backend failure
    StoreFailure = 7,
}

impl ErrorKind {
    /// Numeric code
    pub fn code(self) -> u32 {
        self.to_u32().unwrap_or_default()
    }

    /// Decode a numeric code
    pub fn from_code(code: u32) -> Option<Self> {
        Self::from_u32(code)
    }

    /// HTTP-style status a collaborator should surface
    pub fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::NoSnapshot | Self::InvalidInput => 400,
            Self::PayoutInProgress => 409,
            Self::GatewayFailure => 502,
            Self::ConfigurationError | Self::StoreFailure => 500,
        }
    }
}

/// Serializable error envelope
#[derive(Clone, Debug, Serialize)]
pub struct ErrorResponse {
    /// Numeric code, see [`ErrorKind`]
    pub code: u32,
    /// Error classification
    pub kind: ErrorKind,
    /// Human readable message
    pub message: String,
}

impl From<&CorporateActionError> for ErrorResponse {
    fn from(e: &CorporateActionError) -> Self {
        let kind = e.kind();
        ErrorResponse {
            code: kind.code(),
            kind,
            message: e.to_string(),
        }
    }
}
