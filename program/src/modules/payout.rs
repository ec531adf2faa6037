//! Payout Module
//!
//! Pays every holder of an action's latest snapshot through the ledger gateway and records
//! one payout row per attempt, sent or failed. A failing holder never stops the run.
//!
//! Runs are exclusive per action. Within a run, up to `max_in_flight` gateway calls proceed
//! concurrently, each bounded by `submit_timeout`; outcomes are recorded in snapshot order.
//! A store failure stops further submissions. Payments already in flight still complete and
//! their rows are still attempted; settled payments that could not be recorded are returned
//! in [`CorporateActionError::PayoutUnrecorded`].
//!
//! Re-running a paid action pays every holder again. Nothing deduplicates against earlier
//! successful payouts.

use std::{
    collections::HashSet,
    pin::pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use futures::{future, stream, StreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    config::{LedgerConfig, PayoutConfig},
    error::CorporateActionError,
    gateway::{GatewayError, LedgerGateway},
    modules::{entitlement::entitlement_for, lifecycle::LifecycleModule},
    state::{Action, ActionId, ActionStatus, DividendMemo, Memo, Payout, Snapshot},
    store::{Store, StoreError},
    utils::now,
};

/// One processed holder
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PayoutOutcome {
    #[serde(flatten)]
    pub payout: Payout,
    /// Why the payment did not settle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one payout run
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRun {
    pub action_id: ActionId,
    pub results: Vec<PayoutOutcome>,
    pub sent: usize,
    pub failed: usize,
    /// Action status once the run finished
    pub status: ActionStatus,
}

struct PlannedPayment {
    address: String,
    memo: DividendMemo,
}

/// Marks an action as having a run in flight until dropped
struct RunGuard<'a> {
    in_flight: &'a Mutex<HashSet<ActionId>>,
    action_id: ActionId,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.action_id);
    }
}

pub struct PayoutModule {
    store: Arc<dyn Store>,
    gateway: Arc<dyn LedgerGateway>,
    lifecycle: Arc<LifecycleModule>,
    ledger: LedgerConfig,
    config: PayoutConfig,
    in_flight: Mutex<HashSet<ActionId>>,
}

impl PayoutModule {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn LedgerGateway>,
        lifecycle: Arc<LifecycleModule>,
        ledger: LedgerConfig,
        config: PayoutConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            lifecycle,
            ledger,
            config,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn acquire(&self, action_id: &ActionId) -> Result<RunGuard<'_>, CorporateActionError> {
        let mut in_flight = self.in_flight.lock().map_err(|_| StoreError::Poisoned)?;
        if !in_flight.insert(action_id.clone()) {
            return Err(CorporateActionError::PayoutInProgress(action_id.clone()));
        }
        Ok(RunGuard {
            in_flight: &self.in_flight,
            action_id: action_id.clone(),
        })
    }

    /// Holders with a positive amount, in snapshot order
    fn plan(action: &Action, snapshot: &Snapshot) -> Result<Vec<PlannedPayment>, CorporateActionError> {
        let mut plan = Vec::with_capacity(snapshot.holders.len());
        for holder in &snapshot.holders {
            let amount = entitlement_for(&action.terms, holder.balance)?;
            if amount <= Decimal::ZERO {
                continue;
            }
            plan.push(PlannedPayment {
                address: holder.address.clone(),
                memo: DividendMemo::new(action.id.clone(), holder.balance, amount),
            });
        }
        Ok(plan)
    }

    async fn attempt(&self, payment: PlannedPayment) -> PayoutOutcome {
        let memo = Memo::Dividend(payment.memo.clone());
        let amount = payment.memo.amount_xrp;
        let result = tokio::time::timeout(
            self.config.submit_timeout,
            self.gateway.submit_payment(&payment.address, amount, &memo),
        )
        .await
        .unwrap_or(Err(GatewayError::Timeout(self.config.submit_timeout)));

        match result {
            Ok(tx) => {
                info!(action_id = %payment.memo.action_id, address = %payment.address, %amount, tx = %tx, "Payout sent");
                PayoutOutcome {
                    payout: Payout::sent(payment.memo, &payment.address, tx, now()),
                    error: None,
                }
            }
            Err(e) => {
                warn!(action_id = %payment.memo.action_id, address = %payment.address, %amount, error = %e, "Payout failed");
                PayoutOutcome {
                    payout: Payout::failed(payment.memo, &payment.address, now()),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Pay every holder of the latest snapshot of `action_id`
    pub async fn run_payout(&self, action_id: &ActionId) -> Result<PayoutRun, CorporateActionError> {
        let _guard = self.acquire(action_id)?;

        let action = self
            .store
            .get_action(action_id)?
            .ok_or_else(|| CorporateActionError::action_not_found(action_id))?;
        let snapshot = self
            .store
            .latest_snapshot(action_id)?
            .ok_or_else(|| CorporateActionError::NoSnapshot(action_id.clone()))?;
        self.ledger.require_platform_account()?;

        let plan = Self::plan(&action, &snapshot)?;
        info!(
            action_id = %action_id,
            snapshot_id = %snapshot.id,
            kind = %action.kind(),
            holders = snapshot.total_holders,
            payable = plan.len(),
            "Starting payout run"
        );

        // Set on the first store failure: nothing new is submitted, in-flight payments drain
        let halted = AtomicBool::new(false);
        let mut outcomes = pin!(stream::iter(plan)
            .take_while(|_| future::ready(!halted.load(Ordering::Acquire)))
            .map(|payment| self.attempt(payment))
            .buffered(self.config.max_in_flight.max(1)));

        let mut results = Vec::with_capacity(snapshot.holders.len());
        let mut store_error = None;
        let mut unrecorded = Vec::new();
        while let Some(outcome) = outcomes.next().await {
            match self.store.create_payout(&outcome.payout) {
                Ok(()) => results.push(outcome),
                Err(e) => {
                    halted.store(true, Ordering::Release);
                    error!(
                        action_id = %action_id,
                        address = %outcome.payout.address,
                        status = %outcome.payout.status,
                        tx = ?outcome.payout.tx,
                        error = %e,
                        "Failed to record payout"
                    );
                    unrecorded.extend(outcome.payout.tx);
                    store_error.get_or_insert(e);
                }
            }
        }

        let sent = results.iter().filter(|o| o.payout.is_sent()).count();
        let failed = results.len() - sent;
        let advanced = (sent > 0 || !unrecorded.is_empty())
            .then(|| self.lifecycle.advance(action_id, ActionStatus::Paid));

        if let Some(source) = store_error {
            if let Some(Err(e)) = &advanced {
                error!(action_id = %action_id, error = %e, "Failed to mark action paid");
            }
            for tx in &unrecorded {
                error!(action_id = %action_id, tx = %tx, "Settled payment left unrecorded");
            }
            return Err(CorporateActionError::PayoutUnrecorded {
                action_id: action_id.clone(),
                unrecorded,
                source,
            });
        }

        let status = match advanced {
            Some(paid) => paid?.status,
            None => action.status,
        };
        info!(action_id = %action_id, sent, failed, status = %status, "Payout run finished");

        Ok(PayoutRun {
            action_id: action_id.clone(),
            results,
            sent,
            failed,
            status,
        })
    }
}
