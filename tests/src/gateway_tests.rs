use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use assert_matches::assert_matches;
use async_trait::async_trait;
use corporate_actions::{
    gateway::{
        xrpl::{
            AccountInfoResponse, FaucetAccount, FaucetResponse, LedgerTransport,
            PaymentTransaction, ServerInfoBody, ServerInfoResponse, SubmitResponse,
            TransactionMeta,
        },
        GatewayError, XrplGateway,
    },
    state::{ActionStatus, PayoutStatus, TxReference},
    store::MemoryStore,
    CorporateActionError, Instruction, Processor,
};
use rust_decimal::Decimal;

use crate::helpers::{dividend_args, holders, random_address, test_config};

/// Ledger node double answering per destination with a canned result code
#[derive(Default)]
struct ScriptedTransport {
    results: HashMap<String, &'static str>,
    submitted: Mutex<Vec<PaymentTransaction>>,
}

#[async_trait]
impl LedgerTransport for ScriptedTransport {
    async fn submit_and_wait(&self, tx: &PaymentTransaction) -> Result<SubmitResponse, GatewayError> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(tx.clone());
        let code = self.results.get(&tx.destination).copied().unwrap_or("tesSUCCESS");
        Ok(SubmitResponse {
            meta: Some(TransactionMeta {
                transaction_result: Some(code.to_owned()),
            }),
            hash: Some(format!("{:064X}", submitted.len())),
            validated: Some(true),
            ..SubmitResponse::default()
        })
    }

    async fn server_info(&self) -> Result<ServerInfoResponse, GatewayError> {
        Ok(ServerInfoResponse {
            info: ServerInfoBody { network_id: Some(1) },
        })
    }

    async fn account_info(&self, _address: &str) -> Result<Option<AccountInfoResponse>, GatewayError> {
        Ok(None)
    }
}

struct SharedTransport(Arc<ScriptedTransport>);

#[async_trait]
impl LedgerTransport for SharedTransport {
    async fn submit_and_wait(&self, tx: &PaymentTransaction) -> Result<SubmitResponse, GatewayError> {
        self.0.submit_and_wait(tx).await
    }

    async fn server_info(&self) -> Result<ServerInfoResponse, GatewayError> {
        self.0.server_info().await
    }

    async fn account_info(&self, address: &str) -> Result<Option<AccountInfoResponse>, GatewayError> {
        self.0.account_info(address).await
    }
}

fn decode_hex(hex: &str) -> String {
    let bytes: Vec<u8> = (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect();
    String::from_utf8(bytes).unwrap()
}

#[tokio::test]
async fn test_full_flow_over_xrpl_gateway() {
    let config = test_config();
    let (a, b) = (random_address(), random_address());
    let transport = Arc::new(ScriptedTransport {
        results: HashMap::from([(b.clone(), "tecNO_DST_INSUF_XRP")]),
        ..ScriptedTransport::default()
    });
    let gateway = XrplGateway::new(SharedTransport(transport.clone()), config.ledger.clone());
    let processor = Processor::new(config.clone(), Arc::new(MemoryStore::new()), Arc::new(gateway)).unwrap();

    let action = processor.create_action(&dividend_args(Decimal::from(5))).await.unwrap();
    assert_eq!(action.announce_tx, Some(TxReference::Hash(format!("{:064X}", 1))));

    processor
        .take_snapshot(&action.id, Some(holders(&[(&a, 100.0), (&b, 250.0)])))
        .unwrap();
    let run = processor.run_payout(&action.id).await.unwrap();

    assert_eq!(run.status, ActionStatus::Paid);
    assert_eq!(run.results[0].payout.status, PayoutStatus::Sent);
    assert_eq!(run.results[1].payout.status, PayoutStatus::Failed);
    assert!(run.results[1]
        .error
        .as_deref()
        .unwrap()
        .contains("tecNO_DST_INSUF_XRP"));

    let submitted = transport.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 3);

    let announcement = &submitted[0];
    assert_eq!(Some(&announcement.account), config.ledger.platform_account.as_ref());
    assert_eq!(Some(&announcement.destination), config.ledger.announce_destination.as_ref());
    assert_eq!(announcement.amount, "1");
    let memo: serde_json::Value =
        serde_json::from_str(&decode_hex(&announcement.memos[0].memo.memo_data)).unwrap();
    assert_eq!(memo["event"], "dividend");
    assert_eq!(memo["token"], "DIS.Share");
    assert_eq!(memo["payoutPerShare"], 5.0);
    assert_eq!(announcement.memos[0].memo.memo_data, action.memo_hex().unwrap());

    let payment = &submitted[1];
    assert_eq!(payment.destination, a);
    assert_eq!(payment.amount, "500000000");
    let memo: serde_json::Value =
        serde_json::from_str(&decode_hex(&payment.memos[0].memo.memo_data)).unwrap();
    assert_eq!(memo["actionId"], action.id.as_str());
    assert_eq!(memo["shares"], 100.0);
    assert_eq!(submitted[2].amount, "1250000000");
}

/// Test network node with a faucet that hands out fresh accounts
struct FaucetTransport {
    created: String,
}

#[async_trait]
impl LedgerTransport for FaucetTransport {
    async fn submit_and_wait(&self, _tx: &PaymentTransaction) -> Result<SubmitResponse, GatewayError> {
        Err(GatewayError::Transport("submission disabled".into()))
    }

    async fn server_info(&self) -> Result<ServerInfoResponse, GatewayError> {
        Ok(ServerInfoResponse::default())
    }

    async fn account_info(&self, _address: &str) -> Result<Option<AccountInfoResponse>, GatewayError> {
        Ok(None)
    }

    async fn fund_account(&self, address: Option<&str>) -> Result<FaucetResponse, GatewayError> {
        let account = match address {
            Some(_) => None,
            None => Some(FaucetAccount {
                classic_address: Some(self.created.clone()),
                secret: Some("sEdTestnetOnly".into()),
                ..FaucetAccount::default()
            }),
        };
        Ok(FaucetResponse {
            account,
            amount: Some(100.0),
            transaction_hash: Some("BEEF".into()),
            ..FaucetResponse::default()
        })
    }
}

#[tokio::test]
async fn test_faucet_funding() {
    let config = test_config();
    let created = random_address();
    let gateway = XrplGateway::new(
        FaucetTransport {
            created: created.clone(),
        },
        config.ledger.clone(),
    );
    let processor = Processor::new(config, Arc::new(MemoryStore::new()), Arc::new(gateway)).unwrap();

    let response = processor
        .process(Instruction::FundAccount { address: None })
        .await
        .unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["address"], created.as_str());
    assert_eq!(json["seed"], "sEdTestnetOnly");
    assert_eq!(json["amountXRP"], 100.0);
    assert_eq!(json["tx"], "BEEF");

    let existing = random_address();
    let topped_up = processor.fund_account(Some(&existing)).await.unwrap();
    assert_eq!(topped_up.address, existing);
    assert_eq!(topped_up.seed, None);
}

#[tokio::test]
async fn test_transport_without_faucet() {
    let config = test_config();
    let gateway = XrplGateway::new(ScriptedTransport::default(), config.ledger.clone());
    let processor = Processor::new(config, Arc::new(MemoryStore::new()), Arc::new(gateway)).unwrap();

    let result = processor.fund_account(None).await;
    assert_matches!(
        result,
        Err(CorporateActionError::Gateway(GatewayError::Configuration(_)))
    );
}
