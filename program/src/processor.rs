use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, info, warn};

use crate::{
    config::EngineConfig,
    constants::ANNOUNCEMENT_AMOUNT,
    error::CorporateActionError,
    gateway::{
        address::is_valid_classic_address, AccountInfo, FundedAccount, GatewayError, LedgerGateway,
        NetworkInfo,
    },
    instruction::{Instruction, Response},
    instructions::{CreateActionArgs, HolderInput},
    modules::{
        Dashboard, Holdings, LifecycleModule, PayoutModule, PayoutRun, QueryModule,
        SnapshotModule, StoreDump,
    },
    state::{Action, ActionId, ActionStatus, AnnouncementMemo, Memo, Payout, Snapshot, TxReference},
    store::Store,
    utils::now,
};

/// Entry point for collaborators: owns the modules and routes each operation to them
pub struct Processor {
    config: EngineConfig,
    store: Arc<dyn Store>,
    gateway: Arc<dyn LedgerGateway>,
    lifecycle: Arc<LifecycleModule>,
    snapshots: SnapshotModule,
    payouts: PayoutModule,
    queries: QueryModule,
}

impl Processor {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn Store>,
        gateway: Arc<dyn LedgerGateway>,
    ) -> Result<Self, CorporateActionError> {
        config.validate()?;

        let lifecycle = Arc::new(LifecycleModule::new(store.clone()));
        let snapshots = SnapshotModule::new(store.clone(), lifecycle.clone());
        let payouts = PayoutModule::new(
            store.clone(),
            gateway.clone(),
            lifecycle.clone(),
            config.ledger.clone(),
            config.payout.clone(),
        );
        let queries = QueryModule::new(store.clone());

        Ok(Self {
            config,
            store,
            gateway,
            lifecycle,
            snapshots,
            payouts,
            queries,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Processes an instruction. Failed writes are logged at `warn`, failed reads at `debug`.
    pub async fn process(&self, instruction: Instruction) -> Result<Response, CorporateActionError> {
        let mutating = instruction.is_mutating();
        let result = self.dispatch(instruction).await;
        if let Err(e) = &result {
            let code = e.kind().code();
            if mutating {
                warn!(code, error = %e, "Instruction failed");
            } else {
                debug!(code, error = %e, "Query failed");
            }
        }
        result
    }

    async fn dispatch(&self, instruction: Instruction) -> Result<Response, CorporateActionError> {
        match instruction {
            Instruction::CreateAction(args) => self.create_action(&args).await.map(Response::Action),
            Instruction::AnnounceAction { action_id } => {
                self.announce_action(&action_id).await.map(Response::Action)
            }
            Instruction::GetAction { action_id } => self.get_action(&action_id).map(Response::Action),
            Instruction::ListActions => self.list_actions().map(Response::Actions),
            Instruction::TakeSnapshot { action_id, holders } => self
                .take_snapshot(&action_id, holders)
                .map(Response::Snapshot),
            Instruction::ListSnapshots { action_id } => self
                .list_snapshots(action_id.as_ref())
                .map(Response::Snapshots),
            Instruction::RunPayout { action_id } => {
                self.run_payout(&action_id).await.map(Response::PayoutRun)
            }
            Instruction::ListPayouts { action_id } => {
                self.list_payouts(action_id.as_ref()).map(Response::Payouts)
            }
            Instruction::GetHoldings { address } => self.holdings(&address).map(Response::Holdings),
            Instruction::GetDashboard => self.dashboard().map(Response::Dashboard),
            Instruction::ExportState => self.export_state().map(Response::State),
            Instruction::Ping => self.ping().await.map(Response::Network),
            Instruction::AccountInfo { address } => {
                self.account_info(&address).await.map(Response::Account)
            }
            Instruction::FundAccount { address } => {
                self.fund_account(address.as_deref()).await.map(Response::Funded)
            }
        }
    }

    /// Broadcast an announcement memo as a 1-drop payment to the announce destination
    async fn broadcast(&self, memo: AnnouncementMemo) -> Result<TxReference, CorporateActionError> {
        let destination = self.config.ledger.require_announce_destination()?;
        self.config.ledger.require_platform_account()?;

        let timeout = self.config.payout.submit_timeout;
        let memo = Memo::Announcement(memo);
        let tx = tokio::time::timeout(
            timeout,
            self.gateway
                .submit_payment(destination, ANNOUNCEMENT_AMOUNT, &memo),
        )
        .await
        .unwrap_or(Err(GatewayError::Timeout(timeout)))
        .map_err(|e| {
            warn!(destination, error = %e, "Announcement broadcast failed");
            e
        })?;
        Ok(tx)
    }

    /// Validate and persist a new action, announcing it first unless `args.announce` is off.
    /// A failed announcement leaves nothing behind.
    pub async fn create_action(&self, args: &CreateActionArgs) -> Result<Action, CorporateActionError> {
        let terms = args.validate()?;
        let token = args.token.trim();
        let memo = AnnouncementMemo::new(token, &terms, args.record_at, args.payable_at);

        let (status, announce_tx) = if args.announce {
            (ActionStatus::Announced, Some(self.broadcast(memo.clone()).await?))
        } else {
            (ActionStatus::Draft, None)
        };

        let created_at = now();
        let action = Action {
            id: ActionId::generate(),
            company: args.company.trim().to_owned(),
            token: token.to_owned(),
            terms,
            record_at: args.record_at,
            payable_at: args.payable_at,
            memo,
            announce_tx,
            status,
            created_at,
            updated_at: created_at,
        };
        self.store.create_action(&action)?;
        info!(
            action_id = %action.id,
            kind = %action.kind(),
            company = %action.company,
            token = %action.token,
            status = %action.status,
            "Action created"
        );
        Ok(action)
    }

    /// Announce a draft action
    pub async fn announce_action(&self, action_id: &ActionId) -> Result<Action, CorporateActionError> {
        let action = self.get_action(action_id)?;
        if action.status != ActionStatus::Draft {
            return Err(CorporateActionError::InvalidInput(format!(
                "Action {action_id} is already {}",
                action.status
            )));
        }
        let tx = self.broadcast(action.memo).await?;
        self.lifecycle.record_announcement(action_id, tx)
    }

    pub fn get_action(&self, action_id: &ActionId) -> Result<Action, CorporateActionError> {
        self.queries.get_action(action_id)
    }

    pub fn list_actions(&self) -> Result<Vec<Action>, CorporateActionError> {
        self.queries.list_actions()
    }

    /// Snapshot `holders`, or the configured demo holder when none are given
    pub fn take_snapshot(
        &self,
        action_id: &ActionId,
        holders: Option<Vec<HolderInput>>,
    ) -> Result<Snapshot, CorporateActionError> {
        match holders {
            Some(holders) if !holders.is_empty() => self.snapshots.take_snapshot(action_id, &holders),
            _ => {
                let fallback: Vec<HolderInput> = self
                    .config
                    .demo_holder
                    .iter()
                    .map(|demo| HolderInput::new(&demo.address, demo.balance.to_f64().unwrap_or_default()))
                    .collect();
                self.snapshots.take_snapshot(action_id, &fallback)
            }
        }
    }

    pub fn latest_snapshot(&self, action_id: &ActionId) -> Result<Option<Snapshot>, CorporateActionError> {
        self.snapshots.latest_snapshot(action_id)
    }

    pub fn list_snapshots(&self, action_id: Option<&ActionId>) -> Result<Vec<Snapshot>, CorporateActionError> {
        self.queries.list_snapshots(action_id)
    }

    pub async fn run_payout(&self, action_id: &ActionId) -> Result<PayoutRun, CorporateActionError> {
        self.payouts.run_payout(action_id).await
    }

    pub fn list_payouts(&self, action_id: Option<&ActionId>) -> Result<Vec<Payout>, CorporateActionError> {
        self.queries.list_payouts(action_id)
    }

    pub fn holdings(&self, address: &str) -> Result<Holdings, CorporateActionError> {
        self.queries.holdings(address)
    }

    pub fn dashboard(&self) -> Result<Dashboard, CorporateActionError> {
        self.queries.dashboard()
    }

    pub fn export_state(&self) -> Result<StoreDump, CorporateActionError> {
        self.queries.export_state()
    }

    /// Network id of the connected ledger
    pub async fn ping(&self) -> Result<NetworkInfo, CorporateActionError> {
        Ok(self.gateway.server_info().await?)
    }

    pub async fn account_info(&self, address: &str) -> Result<AccountInfo, CorporateActionError> {
        let address = address.trim();
        if !is_valid_classic_address(address) {
            return Err(CorporateActionError::InvalidInput(format!("Invalid address: {address}")));
        }
        Ok(self.gateway.account_info(address).await?)
    }

    /// Fund `address` from the test network faucet. A missing or blank address asks the
    /// faucet for a new account.
    pub async fn fund_account(&self, address: Option<&str>) -> Result<FundedAccount, CorporateActionError> {
        let address = address.map(str::trim).filter(|a| !a.is_empty());
        if let Some(address) = address {
            if !is_valid_classic_address(address) {
                return Err(CorporateActionError::InvalidInput(format!("Invalid address: {address}")));
            }
        }

        let timeout = self.config.payout.submit_timeout;
        let funded = tokio::time::timeout(timeout, self.gateway.fund_account(address))
            .await
            .unwrap_or(Err(GatewayError::Timeout(timeout)))?;
        Ok(funded)
    }
}
