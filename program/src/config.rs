//! Engine configuration
//!
//! Everything the gateway and the announcement flow need is passed in explicitly.
//! [`EngineConfig::from_env`] is a convenience for binaries; library code never reads
//! the process environment on its own.

use std::{str::FromStr, time::Duration};

use rust_decimal::Decimal;

use crate::{
    constants::{
        env, DEFAULT_MAX_IN_FLIGHT, DEFAULT_RPC_URL, DEFAULT_SUBMIT_TIMEOUT_SECS,
        DEMO_HOLDER_BALANCE,
    },
    error::CorporateActionError,
    gateway::address::is_valid_classic_address,
};

/// Ledger connection and account settings
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerConfig {
    pub rpc_url: String,
    /// Funding account payments originate from
    pub platform_account: Option<String>,
    /// Account receiving announcement memos
    pub announce_destination: Option<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_owned(),
            platform_account: None,
            announce_destination: None,
        }
    }
}

impl LedgerConfig {
    pub fn require_platform_account(&self) -> Result<&str, CorporateActionError> {
        self.platform_account
            .as_deref()
            .ok_or_else(|| CorporateActionError::Configuration(format!("{} not set", env::PLATFORM_ACCOUNT)))
    }

    /// Announce destination, which must differ from the platform account
    pub fn require_announce_destination(&self) -> Result<&str, CorporateActionError> {
        let destination = self.announce_destination.as_deref().ok_or_else(|| {
            CorporateActionError::Configuration(format!("{} not set", env::ANNOUNCE_DEST))
        })?;
        if self.platform_account.as_deref() == Some(destination) {
            return Err(CorporateActionError::Configuration(format!(
                "{} must be a different address than the platform account",
                env::ANNOUNCE_DEST
            )));
        }
        Ok(destination)
    }
}

/// Payout run limits
#[derive(Clone, Debug, PartialEq)]
pub struct PayoutConfig {
    /// Gateway calls in flight per run
    pub max_in_flight: usize,
    /// Expiry of a single gateway call, counted as a failed payment
    pub submit_timeout: Duration,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            submit_timeout: Duration::from_secs(DEFAULT_SUBMIT_TIMEOUT_SECS),
        }
    }
}

/// Holder used when a snapshot is requested without a holder list
#[derive(Clone, Debug, PartialEq)]
pub struct DemoHolder {
    pub address: String,
    pub balance: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineConfig {
    pub ledger: LedgerConfig,
    pub payout: PayoutConfig,
    pub demo_holder: Option<DemoHolder>,
}

impl EngineConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, CorporateActionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CorporateActionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let ledger = LedgerConfig {
            rpc_url: read(env::RPC_URL).unwrap_or_else(|| DEFAULT_RPC_URL.to_owned()),
            platform_account: read(env::PLATFORM_ACCOUNT),
            announce_destination: read(env::ANNOUNCE_DEST),
        };

        let mut payout = PayoutConfig::default();
        if let Some(raw) = read(env::MAX_IN_FLIGHT) {
            payout.max_in_flight = parse_value(env::MAX_IN_FLIGHT, &raw)?;
        }
        if let Some(raw) = read(env::SUBMIT_TIMEOUT_SECS) {
            payout.submit_timeout = Duration::from_secs(parse_value(env::SUBMIT_TIMEOUT_SECS, &raw)?);
        }

        let demo_holder = ledger.announce_destination.clone().map(|address| DemoHolder {
            address,
            balance: DEMO_HOLDER_BALANCE,
        });

        let config = Self {
            ledger,
            payout,
            demo_holder,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CorporateActionError> {
        if self.payout.max_in_flight == 0 {
            return Err(CorporateActionError::Configuration(format!(
                "{} must be at least 1",
                env::MAX_IN_FLIGHT
            )));
        }
        if self.payout.submit_timeout.is_zero() {
            return Err(CorporateActionError::Configuration(format!(
                "{} must be positive",
                env::SUBMIT_TIMEOUT_SECS
            )));
        }
        for (key, address) in [
            (env::PLATFORM_ACCOUNT, &self.ledger.platform_account),
            (env::ANNOUNCE_DEST, &self.ledger.announce_destination),
        ] {
            if let Some(address) = address {
                if !is_valid_classic_address(address) {
                    return Err(CorporateActionError::Configuration(format!(
                        "{key} is not a valid ledger address: {address}"
                    )));
                }
            }
        }
        if self.ledger.announce_destination.is_some() {
            self.ledger.require_announce_destination()?;
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, CorporateActionError> {
    raw.parse()
        .map_err(|_| CorporateActionError::Configuration(format!("{key} has invalid value '{raw}'")))
}
