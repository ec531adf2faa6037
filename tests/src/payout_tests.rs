use std::{sync::Arc, time::Duration};

use assert_matches::assert_matches;
use corporate_actions::{
    error::{CorporateActionError, ErrorKind},
    state::{ActionStatus, Memo, PayoutStatus},
    store::MemoryStore,
    Instruction, Response,
};
use rust_decimal::Decimal;

use crate::helpers::{
    announced_dividend, assert_error_kind, holders, random_address, split_args, start,
    start_with_gateway, start_with_store, test_config, Outcome, ScriptedGateway,
};

#[tokio::test]
async fn test_mixed_outcome_pays_and_marks_paid() {
    let (processor, gateway) = start();
    let (a, b) = (random_address(), random_address());
    gateway.reject(&b);
    let action = announced_dividend(&processor, Decimal::from(5)).await;
    let snapshot = processor
        .take_snapshot(&action.id, Some(holders(&[(&a, 100.0), (&b, 250.0)])))
        .unwrap();
    assert_eq!(snapshot.total_entitlement, Decimal::from(1750));

    let run = processor.run_payout(&action.id).await.unwrap();

    assert_eq!((run.sent, run.failed), (1, 1));
    assert_eq!(run.status, ActionStatus::Paid);
    let rows: Vec<_> = run
        .results
        .iter()
        .map(|o| (o.payout.address.clone(), o.payout.amount_xrp, o.payout.status))
        .collect();
    assert_eq!(
        rows,
        vec![
            (a.clone(), Decimal::from(500), PayoutStatus::Sent),
            (b.clone(), Decimal::from(1250), PayoutStatus::Failed),
        ]
    );
    assert!(run.results[0].payout.tx.is_some());
    assert!(run.results[1].payout.tx.is_none());
    assert_eq!(processor.get_action(&action.id).unwrap().status, ActionStatus::Paid);

    let json = serde_json::to_value(&run.results[0]).unwrap();
    assert_eq!(json["status"], "sent");
    assert_eq!(json["amountXrp"], 500.0);
    assert_eq!(json["memoJson"]["reason"], "dividend");
    assert!(json["txHash"].is_string());
    let json = serde_json::to_value(&run.results[1]).unwrap();
    assert!(json.get("txHash").is_none());
    assert!(json["error"].as_str().unwrap().contains("tecNO_DST"));
}

#[tokio::test]
async fn test_all_failed_keeps_snapshotted() {
    let (processor, gateway) = start();
    let (a, b) = (random_address(), random_address());
    gateway.reject(&a);
    gateway.reject(&b);
    let action = announced_dividend(&processor, Decimal::from(5)).await;
    processor
        .take_snapshot(&action.id, Some(holders(&[(&a, 100.0), (&b, 250.0)])))
        .unwrap();

    let run = processor.run_payout(&action.id).await.unwrap();

    assert_eq!((run.sent, run.failed), (0, 2));
    assert_eq!(run.status, ActionStatus::Snapshotted);
    assert_eq!(processor.list_payouts(Some(&action.id)).unwrap().len(), 2);
    assert_eq!(
        processor.get_action(&action.id).unwrap().status,
        ActionStatus::Snapshotted
    );
}

#[tokio::test]
async fn test_one_record_per_positive_entitlement() {
    let (processor, gateway) = start();
    let addresses: Vec<String> = (0..6).map(|_| random_address()).collect();
    gateway.reject(&addresses[1]);
    gateway.reject(&addresses[4]);
    // 0.0000001 × 1 rounds to zero and is skipped
    let action = announced_dividend(&processor, Decimal::ONE).await;
    let mut entries: Vec<(&str, f64)> = addresses.iter().map(|a| (a.as_str(), 10.0)).collect();
    entries[5].1 = 0.0000001;
    processor
        .take_snapshot(&action.id, Some(holders(&entries)))
        .unwrap();

    let run = processor.run_payout(&action.id).await.unwrap();

    assert_eq!(run.results.len(), 5);
    assert_eq!((run.sent, run.failed), (3, 2));
    assert_eq!(gateway.call_count(), 5 + 1);
    assert_eq!(processor.list_payouts(Some(&action.id)).unwrap().len(), 5);
    let order: Vec<&str> = run.results.iter().map(|o| o.payout.address.as_str()).collect();
    assert_eq!(order, addresses[..5].iter().map(String::as_str).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_rerun_pays_again() {
    let (processor, _) = start();
    let address = random_address();
    let action = announced_dividend(&processor, Decimal::from(2)).await;
    processor
        .take_snapshot(&action.id, Some(holders(&[(&address, 10.0)])))
        .unwrap();

    let first = processor.run_payout(&action.id).await.unwrap();
    let second = processor.run_payout(&action.id).await.unwrap();

    assert_eq!(first.sent, 1);
    assert_eq!(second.sent, 1);
    assert_eq!(second.status, ActionStatus::Paid);
    let payouts = processor.list_payouts(Some(&action.id)).unwrap();
    assert_eq!(payouts.len(), 2);
    assert!(payouts.iter().all(|p| p.address == address && p.is_sent()));
    assert_ne!(payouts[0].id, payouts[1].id);
}

#[tokio::test]
async fn test_split_produces_no_payouts() {
    let (processor, gateway) = start();
    let action = processor.create_action(&split_args("2:1")).await.unwrap();
    processor
        .take_snapshot(&action.id, Some(holders(&[(&random_address(), 100.0)])))
        .unwrap();
    let announcements = gateway.call_count();

    let run = processor.run_payout(&action.id).await.unwrap();

    assert!(run.results.is_empty());
    assert_eq!(run.status, ActionStatus::Snapshotted);
    assert_eq!(gateway.call_count(), announcements);
    assert!(processor.list_payouts(Some(&action.id)).unwrap().is_empty());
}

#[tokio::test]
async fn test_payout_preconditions() {
    let (processor, gateway) = start();
    let action = announced_dividend(&processor, Decimal::ONE).await;

    assert_error_kind(processor.run_payout(&"action-missing".into()).await, ErrorKind::NotFound);
    assert_error_kind(processor.run_payout(&action.id).await, ErrorKind::NoSnapshot);
    assert_eq!(gateway.call_count(), 1);
    assert!(processor.list_payouts(None).unwrap().is_empty());
}

#[tokio::test]
async fn test_payout_requires_platform_account() {
    let mut config = test_config();
    config.ledger.platform_account = None;
    let (processor, gateway) = start_with_store(config, Arc::new(MemoryStore::new()), ScriptedGateway::new());
    let args = corporate_actions::instructions::CreateActionArgs {
        announce: false,
        ..crate::helpers::dividend_args(Decimal::ONE)
    };
    let action = processor.create_action(&args).await.unwrap();
    processor
        .take_snapshot(&action.id, Some(holders(&[(&random_address(), 1.0)])))
        .unwrap();

    assert_error_kind(processor.run_payout(&action.id).await, ErrorKind::ConfigurationError);
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_hanging_submission_times_out_as_failed() {
    let (processor, gateway) = start();
    let (slow, fast) = (random_address(), random_address());
    gateway.script(&slow, Outcome::Hang);
    let action = announced_dividend(&processor, Decimal::ONE).await;
    processor
        .take_snapshot(&action.id, Some(holders(&[(&slow, 1.0), (&fast, 2.0)])))
        .unwrap();

    let run = processor.run_payout(&action.id).await.unwrap();

    assert_eq!(run.results[0].payout.status, PayoutStatus::Failed);
    assert_matches!(run.results[0].error.as_deref(), Some(e) if e.contains("timed out"));
    assert_eq!(run.results[1].payout.status, PayoutStatus::Sent);
    assert_eq!(run.status, ActionStatus::Paid);
}

#[tokio::test]
async fn test_concurrent_run_is_refused() {
    let (processor, gateway) = start_with_gateway(ScriptedGateway::with_delay(Duration::from_millis(50)));
    let action = announced_dividend(&processor, Decimal::ONE).await;
    processor
        .take_snapshot(&action.id, Some(holders(&[(&random_address(), 1.0)])))
        .unwrap();
    let before = gateway.call_count();

    let (first, second) = tokio::join!(processor.run_payout(&action.id), async {
        tokio::task::yield_now().await;
        processor
            .process(Instruction::RunPayout {
                action_id: action.id.clone(),
            })
            .await
    });

    assert_eq!(first.unwrap().sent, 1);
    assert_matches!(second, Err(CorporateActionError::PayoutInProgress(ref id)) if *id == action.id);
    assert_eq!(gateway.call_count(), before + 1);
    assert_eq!(processor.list_payouts(Some(&action.id)).unwrap().len(), 1);
}

#[tokio::test]
async fn test_runs_for_different_actions_proceed_together() {
    let (processor, _) = start_with_gateway(ScriptedGateway::with_delay(Duration::from_millis(20)));
    let one = announced_dividend(&processor, Decimal::ONE).await;
    let two = announced_dividend(&processor, Decimal::ONE).await;
    for action in [&one, &two] {
        processor
            .take_snapshot(&action.id, Some(holders(&[(&random_address(), 1.0)])))
            .unwrap();
    }

    let (a, b) = tokio::join!(processor.run_payout(&one.id), processor.run_payout(&two.id));

    assert_eq!(a.unwrap().sent, 1);
    assert_eq!(b.unwrap().sent, 1);
}

#[tokio::test]
async fn test_in_flight_submissions_are_bounded() {
    let mut config = test_config();
    config.payout.max_in_flight = 2;
    let (processor, gateway) = start_with_store(
        config,
        Arc::new(MemoryStore::new()),
        ScriptedGateway::with_delay(Duration::from_millis(10)),
    );
    let action = announced_dividend(&processor, Decimal::ONE).await;
    let addresses: Vec<String> = (0..8).map(|_| random_address()).collect();
    let entries: Vec<(&str, f64)> = addresses.iter().map(|a| (a.as_str(), 1.0)).collect();
    processor
        .take_snapshot(&action.id, Some(holders(&entries)))
        .unwrap();

    let run = processor.run_payout(&action.id).await.unwrap();

    assert_eq!(run.sent, 8);
    assert!(gateway.max_in_flight() <= 2, "saw {} in flight", gateway.max_in_flight());
    let order: Vec<&String> = run.results.iter().map(|o| &o.payout.address).collect();
    assert_eq!(order, addresses.iter().collect::<Vec<_>>());
}

#[tokio::test]
async fn test_dividend_memo_carried_to_gateway() {
    let (processor, gateway) = start();
    let address = random_address();
    let action = announced_dividend(&processor, Decimal::new(15, 1)).await;
    processor
        .take_snapshot(&action.id, Some(holders(&[(&address, 4.0)])))
        .unwrap();

    let response = processor
        .process(Instruction::RunPayout {
            action_id: action.id.clone(),
        })
        .await
        .unwrap();
    assert_matches!(response, Response::PayoutRun(ref run) if run.sent == 1);

    let (destination, amount, memo) = gateway.calls().pop().unwrap();
    assert_eq!(destination, address);
    assert_eq!(amount, Decimal::from(6));
    assert_matches!(memo, Memo::Dividend(ref memo) if memo.action_id == action.id && memo.shares == Decimal::from(4));
    let json: serde_json::Value = serde_json::from_str(&memo.to_json().unwrap()).unwrap();
    assert_eq!(json["reason"], "dividend");
    assert_eq!(json["amountXrp"], 6.0);
}
