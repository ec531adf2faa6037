//! Collaborator-facing requests and their responses
use serde::{Deserialize, Serialize};

use crate::{
    gateway::{AccountInfo, FundedAccount, NetworkInfo},
    instructions::{CreateActionArgs, HolderInput},
    modules::{Dashboard, Holdings, PayoutRun, StoreDump},
    state::{Action, ActionId, Payout, Snapshot},
};

/// One operation against the engine, tagged by `instruction`
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "instruction", rename_all = "camelCase")]
pub enum Instruction {
    CreateAction(CreateActionArgs),
    #[serde(rename_all = "camelCase")]
    AnnounceAction { action_id: ActionId },
    #[serde(rename_all = "camelCase")]
    GetAction { action_id: ActionId },
    ListActions,
    /// Without holders the configured demo holder is used
    #[serde(rename_all = "camelCase")]
    TakeSnapshot {
        action_id: ActionId,
        #[serde(default)]
        holders: Option<Vec<HolderInput>>,
    },
    #[serde(rename_all = "camelCase")]
    ListSnapshots {
        #[serde(default)]
        action_id: Option<ActionId>,
    },
    #[serde(rename_all = "camelCase")]
    RunPayout { action_id: ActionId },
    #[serde(rename_all = "camelCase")]
    ListPayouts {
        #[serde(default)]
        action_id: Option<ActionId>,
    },
    GetHoldings { address: String },
    GetDashboard,
    ExportState,
    Ping,
    AccountInfo { address: String },
    /// Test network faucet; without an address a new account is created
    FundAccount { address: Option<String> },
}

impl Instruction {
    /// Whether the instruction can change persisted state or move funds
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Instruction::CreateAction(_)
                | Instruction::AnnounceAction { .. }
                | Instruction::TakeSnapshot { .. }
                | Instruction::RunPayout { .. }
                | Instruction::FundAccount { .. }
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Action(Action),
    Actions(Vec<Action>),
    Snapshot(Snapshot),
    Snapshots(Vec<Snapshot>),
    PayoutRun(PayoutRun),
    Payouts(Vec<Payout>),
    Holdings(Holdings),
    Dashboard(Dashboard),
    State(StoreDump),
    Network(NetworkInfo),
    Account(AccountInfo),
    Funded(FundedAccount),
}
