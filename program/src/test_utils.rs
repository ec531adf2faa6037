use std::{collections::HashSet, path::PathBuf, sync::Mutex};

use async_trait::async_trait;
use chrono::Duration;
use rust_decimal::Decimal;

use crate::{
    config::LedgerConfig,
    constants::ACCOUNT_ID_LEN,
    gateway::{address::encode_classic_address, AccountInfo, GatewayError, LedgerGateway, NetworkInfo},
    state::{
        Action, ActionId, ActionStatus, AnnouncementMemo, DividendMemo, Memo, Payout, PayoutTerms,
        Snapshot, SnapshotHolder, SnapshotId, TxReference,
    },
    utils::now,
};

pub fn random_address() -> String {
    encode_classic_address(&rand::random::<[u8; ACCOUNT_ID_LEN]>())
}

fn action_with_terms(terms: PayoutTerms) -> Action {
    let created_at = now();
    let record_at = created_at + Duration::days(7);
    let payable_at = created_at + Duration::days(14);
    Action {
        id: ActionId::generate(),
        company: "DemoCo".into(),
        token: "DIS.Share".into(),
        memo: AnnouncementMemo::new("DIS.Share", &terms, record_at, payable_at),
        terms,
        record_at,
        payable_at,
        announce_tx: None,
        status: ActionStatus::Announced,
        created_at,
        updated_at: created_at,
    }
}

pub fn sample_action() -> Action {
    action_with_terms(PayoutTerms::Dividend {
        payout_per_share: Decimal::new(25, 1),
    })
}

pub fn sample_split_action() -> Action {
    action_with_terms(PayoutTerms::Split {
        split_ratio: "2:1".parse().unwrap(),
    })
}

pub fn sample_snapshot(action_id: &ActionId) -> Snapshot {
    let holders = [(100, 250), (40, 100)]
        .into_iter()
        .map(|(balance, entitlement)| SnapshotHolder {
            address: random_address(),
            balance: Decimal::from(balance),
            entitlement: Decimal::from(entitlement),
        })
        .collect();
    Snapshot::new(SnapshotId::generate(), action_id.clone(), now(), holders).unwrap()
}

pub fn sample_payout(action_id: &ActionId, tx: Option<TxReference>) -> Payout {
    let memo = DividendMemo::new(action_id.clone(), Decimal::from(100), Decimal::new(2505, 1));
    match tx {
        Some(tx) => Payout::sent(memo, &random_address(), tx, now()),
        None => Payout::failed(memo, &random_address(), now()),
    }
}

pub fn temp_journal_path() -> PathBuf {
    std::env::temp_dir().join(format!("corporate-actions-{}.journal", uuid::Uuid::new_v4().simple()))
}

/// Gateway double that settles every payment except those to `failing` addresses
#[derive(Default)]
pub struct StubGateway {
    pub failing: HashSet<String>,
    pub delay: Option<std::time::Duration>,
    pub calls: Mutex<Vec<(String, Decimal)>>,
}

impl StubGateway {
    pub fn failing(addresses: &[&str]) -> Self {
        Self {
            failing: addresses.iter().map(|a| a.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Decimal)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerGateway for StubGateway {
    async fn submit_payment(
        &self,
        destination: &str,
        amount: Decimal,
        _memo: &Memo,
    ) -> Result<TxReference, GatewayError> {
        self.calls.lock().unwrap().push((destination.to_owned(), amount));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(destination) {
            return Err(GatewayError::Rejected {
                code: "tecNO_DST_INSUF_XRP".into(),
                message: "Destination does not exist".into(),
            });
        }
        Ok(TxReference::Hash(format!("{:064X}", rand::random::<u128>())))
    }

    async fn server_info(&self) -> Result<NetworkInfo, GatewayError> {
        Ok(NetworkInfo { network_id: Some(1) })
    }

    async fn account_info(&self, address: &str) -> Result<AccountInfo, GatewayError> {
        Ok(AccountInfo {
            address: address.to_owned(),
            exists: true,
            balance: Some(Decimal::from(1_000)),
        })
    }
}

/// Ledger settings with both accounts filled in
pub fn ledger_config() -> LedgerConfig {
    LedgerConfig {
        platform_account: Some(random_address()),
        announce_destination: Some(random_address()),
        ..LedgerConfig::default()
    }
}
