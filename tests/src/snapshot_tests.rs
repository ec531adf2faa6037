use corporate_actions::{error::ErrorKind, state::ActionStatus};
use rstest::rstest;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::helpers::{
    announced_dividend, assert_error_kind, holders, random_address, split_args, start,
};

#[rstest]
#[case(100.0, Decimal::from(5))]
#[case(0.5, Decimal::new(25, 1))]
#[case(3.0, Decimal::new(3333335, 7))]
#[case(12345.678901, Decimal::new(17, 2))]
#[tokio::test]
async fn test_dividend_entitlement_is_rounded_product(#[case] balance: f64, #[case] payout_per_share: Decimal) {
    let (processor, _) = start();
    let action = announced_dividend(&processor, payout_per_share).await;
    let address = random_address();

    let snapshot = processor
        .take_snapshot(&action.id, Some(holders(&[(&address, balance)])))
        .unwrap();

    let holder = snapshot.holder(&address).unwrap();
    let expected = (holder.balance * payout_per_share)
        .round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero);
    assert_eq!(holder.entitlement, expected);
    assert_eq!(snapshot.total_entitlement, expected);
}

#[tokio::test]
async fn test_split_entitlements_are_zero() {
    let (processor, _) = start();
    let action = processor.create_action(&split_args("2:1")).await.unwrap();

    let snapshot = processor
        .take_snapshot(
            &action.id,
            Some(holders(&[(&random_address(), 100.0), (&random_address(), 7.5)])),
        )
        .unwrap();

    assert!(snapshot.holders.iter().all(|h| h.entitlement.is_zero()));
    assert_eq!(snapshot.total_shares, Decimal::new(1075, 1));
    assert_eq!(
        processor.get_action(&action.id).unwrap().status,
        ActionStatus::Snapshotted
    );
}

#[tokio::test]
async fn test_sanitization_drops_invalid_entries() {
    let (processor, _) = start();
    let action = announced_dividend(&processor, Decimal::from(2)).await;
    let (a, b) = (random_address(), random_address());

    let snapshot = processor
        .take_snapshot(
            &action.id,
            Some(holders(&[
                (&a, 10.0),
                ("rNotAnAddress", 50.0),
                (&b, -4.0),
                (&random_address(), 0.0),
                (&random_address(), f64::NAN),
                (&a, 5.0),
            ])),
        )
        .unwrap();

    assert_eq!(snapshot.total_holders, 1);
    assert_eq!(snapshot.holders[0].address, a);
    assert_eq!(snapshot.holders[0].balance, Decimal::from(15));
    assert_eq!(snapshot.holders[0].entitlement, Decimal::from(30));
}

#[tokio::test]
async fn test_empty_sanitized_list_is_rejected() {
    let (processor, _) = start();
    let action = announced_dividend(&processor, Decimal::ONE).await;

    assert_error_kind(
        processor.take_snapshot(&action.id, Some(holders(&[("bogus", 10.0), (&random_address(), -1.0)]))),
        ErrorKind::InvalidInput,
    );

    assert!(processor.list_snapshots(Some(&action.id)).unwrap().is_empty());
    assert_eq!(
        processor.get_action(&action.id).unwrap().status,
        ActionStatus::Announced
    );
}

#[rstest]
#[case::distinct_holders(false)]
#[case::repeated_holder(true)]
#[tokio::test]
async fn test_oversized_balances_are_rejected(#[case] repeated: bool) {
    let (processor, _) = start();
    let action = announced_dividend(&processor, Decimal::new(1, 6)).await;
    let a = random_address();
    let b = if repeated { a.clone() } else { random_address() };

    assert_error_kind(
        processor.take_snapshot(&action.id, Some(holders(&[(&a, 5e28), (&b, 5e28)]))),
        ErrorKind::InvalidInput,
    );
    assert!(processor.list_snapshots(Some(&action.id)).unwrap().is_empty());
    assert_eq!(
        processor.get_action(&action.id).unwrap().status,
        ActionStatus::Announced
    );
}

#[tokio::test]
async fn test_snapshot_of_unknown_action() {
    let (processor, _) = start();

    assert_error_kind(
        processor.take_snapshot(&"action-missing".into(), Some(holders(&[(&random_address(), 1.0)]))),
        ErrorKind::NotFound,
    );
}

#[tokio::test]
async fn test_omitted_holders_use_demo_holder() {
    let (processor, _) = start();
    let action = announced_dividend(&processor, Decimal::from(3)).await;
    let demo = processor.config().demo_holder.clone().unwrap();

    let snapshot = processor.take_snapshot(&action.id, None).unwrap();

    assert_eq!(snapshot.total_holders, 1);
    assert_eq!(snapshot.holders[0].address, demo.address);
    assert_eq!(snapshot.holders[0].entitlement, Decimal::from(300));
}

#[tokio::test]
async fn test_resnapshot_of_paid_action_stays_paid() {
    let (processor, _) = start();
    let action = announced_dividend(&processor, Decimal::ONE).await;
    let address = random_address();
    processor
        .take_snapshot(&action.id, Some(holders(&[(&address, 10.0)])))
        .unwrap();
    processor.run_payout(&action.id).await.unwrap();

    let latest = processor
        .take_snapshot(&action.id, Some(holders(&[(&address, 20.0)])))
        .unwrap();

    assert_eq!(processor.get_action(&action.id).unwrap().status, ActionStatus::Paid);
    assert_eq!(processor.latest_snapshot(&action.id).unwrap(), Some(latest));
    assert_eq!(processor.list_snapshots(Some(&action.id)).unwrap().len(), 2);
}
