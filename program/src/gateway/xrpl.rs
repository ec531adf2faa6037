//! XRP Ledger payment gateway
//!
//! Builds `Payment` transactions with a JSON memo, hands them to a [`LedgerTransport`] for
//! signing and submission, and normalizes whatever the node answers into a
//! [`TxReference`] or a [`GatewayError`].

use async_trait::async_trait;
use rust_decimal::{
    prelude::{FromPrimitive, ToPrimitive},
    Decimal,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::LedgerConfig,
    constants::{DROPS_PER_XRP, ENGINE_SUCCESS, MEMO_FORMAT, MEMO_TYPE},
    gateway::{
        address::is_valid_classic_address, AccountInfo, FundedAccount, GatewayError, LedgerGateway,
        NetworkInfo,
    },
    state::{hex_upper, Memo, TxReference},
};

const PAYMENT: &str = "Payment";

/// Unsigned payment transaction in ledger JSON form
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentTransaction {
    pub transaction_type: &'static str,
    pub account: String,
    pub destination: String,
    /// Amount in drops
    pub amount: String,
    pub memos: Vec<MemoEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemoEntry {
    pub memo: MemoFields,
}

/// Memo fields, each hex encoded
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemoFields {
    pub memo_type: String,
    pub memo_format: String,
    pub memo_data: String,
}

impl MemoFields {
    pub fn from_memo(memo: &Memo) -> Result<Self, GatewayError> {
        let data = memo.to_json().map_err(|e| GatewayError::Memo(e.to_string()))?;
        Ok(Self {
            memo_type: hex_upper(MEMO_TYPE.as_bytes()),
            memo_format: hex_upper(MEMO_FORMAT.as_bytes()),
            memo_data: hex_upper(data.as_bytes()),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SubmittedTxJson {
    pub hash: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransactionMeta {
    pub transaction_result: Option<String>,
}

/// Result of submit-and-wait. Node versions disagree on which fields they fill, so
/// everything is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SubmitResponse {
    pub engine_result: Option<String>,
    pub engine_result_message: Option<String>,
    pub error: Option<String>,
    pub error_message: Option<String>,
    pub hash: Option<String>,
    pub tx_json: Option<SubmittedTxJson>,
    pub meta: Option<TransactionMeta>,
    pub ledger_index: Option<u64>,
    pub ctid: Option<String>,
    pub validated: Option<bool>,
}

impl SubmitResponse {
    /// Final result code; the validated metadata wins over the preliminary engine result
    pub fn result_code(&self) -> &str {
        self.meta
            .as_ref()
            .and_then(|m| m.transaction_result.as_deref())
            .or(self.engine_result.as_deref())
            .or(self.error.as_deref())
            .unwrap_or("unknown")
    }

    pub fn into_tx_reference(self) -> Result<TxReference, GatewayError> {
        let code = self.result_code().to_owned();
        if code != ENGINE_SUCCESS {
            let message = self
                .engine_result_message
                .or(self.error_message)
                .unwrap_or_default();
            return Err(GatewayError::Rejected { code, message });
        }
        if self.validated == Some(false) {
            return Err(GatewayError::Ambiguous("transaction not validated".to_owned()));
        }

        let hash = self.hash.or_else(|| self.tx_json.and_then(|t| t.hash));
        match (hash, self.ledger_index) {
            (Some(hash), _) if !hash.is_empty() => Ok(TxReference::Hash(hash)),
            (_, Some(ledger_index)) => Ok(TxReference::LedgerPosition {
                ledger_index,
                ctid: self.ctid,
            }),
            _ => Err(GatewayError::Ambiguous(
                "success reported without hash or ledger index".to_owned(),
            )),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ServerInfoBody {
    pub network_id: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ServerInfoResponse {
    pub info: ServerInfoBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AccountData {
    /// Balance in drops
    #[serde(rename = "Balance")]
    pub balance: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AccountInfoResponse {
    pub account_data: AccountData,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaucetAccount {
    pub classic_address: Option<String>,
    pub address: Option<String>,
    pub secret: Option<String>,
}

/// Faucet answer. Faucets disagree on the layout, so everything is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaucetResponse {
    pub account: Option<FaucetAccount>,
    pub seed: Option<String>,
    /// XRP granted
    pub amount: Option<f64>,
    pub transaction_hash: Option<String>,
}

impl FaucetResponse {
    /// A top-up names `requested`; a new account must come back with an address and a seed
    pub fn into_funded_account(self, requested: Option<&str>) -> Result<FundedAccount, GatewayError> {
        let account = self.account.unwrap_or_default();
        let seed = account.secret.or(self.seed);
        let address = match requested {
            Some(address) => address.to_owned(),
            None => {
                let address = account.classic_address.or(account.address);
                match (address, &seed) {
                    (Some(address), Some(_)) => address,
                    _ => {
                        return Err(GatewayError::Ambiguous(
                            "faucet response lacks account address or seed".to_owned(),
                        ))
                    }
                }
            }
        };

        Ok(FundedAccount {
            address,
            seed,
            amount: self.amount.and_then(Decimal::from_f64),
            tx: self
                .transaction_hash
                .filter(|h| !h.is_empty())
                .map(TxReference::Hash),
        })
    }
}

/// Signing and submission capability of a ledger client. Implementations own the key material.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Autofill, sign, submit and wait for the validated result
    async fn submit_and_wait(&self, tx: &PaymentTransaction) -> Result<SubmitResponse, GatewayError>;

    async fn server_info(&self) -> Result<ServerInfoResponse, GatewayError>;

    /// `None` when the account does not exist in the validated ledger
    async fn account_info(&self, address: &str) -> Result<Option<AccountInfoResponse>, GatewayError>;

    /// Ask the network faucet to fund `address`, or a fresh account when `None`
    async fn fund_account(&self, _address: Option<&str>) -> Result<FaucetResponse, GatewayError> {
        Err(GatewayError::Configuration("transport has no faucet".to_owned()))
    }
}

/// Convert an XRP amount to drops. It must be positive and whole in drops.
pub fn xrp_to_drops(amount: Decimal) -> Result<u64, GatewayError> {
    if amount <= Decimal::ZERO {
        return Err(GatewayError::InvalidAmount(amount));
    }
    let drops = amount
        .checked_mul(Decimal::from(DROPS_PER_XRP))
        .ok_or(GatewayError::InvalidAmount(amount))?;
    if drops.fract() != Decimal::ZERO {
        return Err(GatewayError::InvalidAmount(amount));
    }
    drops.to_u64().ok_or(GatewayError::InvalidAmount(amount))
}

pub fn drops_to_xrp(drops: u64) -> Decimal {
    Decimal::from(drops) / Decimal::from(DROPS_PER_XRP)
}

pub struct XrplGateway<T> {
    transport: T,
    config: LedgerConfig,
}

impl<T: LedgerTransport> XrplGateway<T> {
    pub fn new(transport: T, config: LedgerConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Build the unsigned payment for `destination`
    pub fn build_payment(
        &self,
        destination: &str,
        amount: Decimal,
        memo: &Memo,
    ) -> Result<PaymentTransaction, GatewayError> {
        let account = self
            .config
            .platform_account
            .clone()
            .ok_or_else(|| GatewayError::Configuration("platform account not set".to_owned()))?;
        if !is_valid_classic_address(destination) {
            return Err(GatewayError::InvalidDestination(destination.to_owned()));
        }
        let drops = xrp_to_drops(amount)?;

        Ok(PaymentTransaction {
            transaction_type: PAYMENT,
            account,
            destination: destination.to_owned(),
            amount: drops.to_string(),
            memos: vec![MemoEntry {
                memo: MemoFields::from_memo(memo)?,
            }],
        })
    }
}

#[async_trait]
impl<T: LedgerTransport> LedgerGateway for XrplGateway<T> {
    async fn submit_payment(
        &self,
        destination: &str,
        amount: Decimal,
        memo: &Memo,
    ) -> Result<TxReference, GatewayError> {
        let tx = self.build_payment(destination, amount, memo)?;
        debug!(destination, drops = %tx.amount, "Submitting payment");
        let response = self.transport.submit_and_wait(&tx).await?;
        response.into_tx_reference()
    }

    async fn server_info(&self) -> Result<NetworkInfo, GatewayError> {
        let response = self.transport.server_info().await?;
        Ok(NetworkInfo {
            network_id: response.info.network_id,
        })
    }

    async fn account_info(&self, address: &str) -> Result<AccountInfo, GatewayError> {
        let Some(response) = self.transport.account_info(address).await? else {
            return Ok(AccountInfo {
                address: address.to_owned(),
                exists: false,
                balance: None,
            });
        };
        let drops: u64 = response.account_data.balance.parse().map_err(|_| {
            GatewayError::Ambiguous(format!("unparseable balance '{}'", response.account_data.balance))
        })?;
        Ok(AccountInfo {
            address: address.to_owned(),
            exists: true,
            balance: Some(drops_to_xrp(drops)),
        })
    }

    async fn fund_account(&self, address: Option<&str>) -> Result<FundedAccount, GatewayError> {
        if let Some(address) = address {
            if !is_valid_classic_address(address) {
                return Err(GatewayError::InvalidDestination(address.to_owned()));
            }
        }
        let funded = self
            .transport
            .fund_account(address)
            .await?
            .into_funded_account(address)?;
        info!(address = %funded.address, created = address.is_none(), "Account funded from faucet");
        Ok(funded)
    }
}
