//! Every externally callable operation, as one serialisable enum.

use dac_custodian::{BudgetUpdate, ConfigUpdate};
use dac_messages::{AccountBalanceDelta, AccountStakeDelta, AccountWeightDelta};
use dac_proposals::{NewProposal, ProposalConfig, PublicVote, WhitelistKind};
use dac_types::{AccountName, Asset, ExtendedAsset, PermissionName, Timestamp};
use serde::{Deserialize, Serialize};

/// One action submitted against a tenant.
///
/// The serialised names follow the on-chain action names (`nominatecane`,
/// `votecust`, `startwork`, ...), so a script reads like a transaction log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Action {
    // ── Candidates ──
    #[serde(rename = "nominatecane")]
    Nominate { cand: AccountName, requestedpay: Asset },
    #[serde(rename = "nominate")]
    NominateUnpaid { cand: AccountName },
    #[serde(rename = "withdrawcane")]
    Withdraw { cand: AccountName },
    #[serde(rename = "removecand")]
    RemoveCandidate { cand: AccountName },
    #[serde(rename = "resigncust")]
    Resign { cust: AccountName },
    #[serde(rename = "updatereqpay")]
    UpdateRequestedPay { cand: AccountName, requestedpay: Asset },
    #[serde(rename = "stprofile")]
    SetProfile { cand: AccountName, profile: String },
    #[serde(rename = "updatebio")]
    UpdateBio { cand: AccountName, bio: String },
    #[serde(rename = "setperm")]
    SetPermission { cand: AccountName, permission: PermissionName },
    #[serde(rename = "appointcust")]
    AppointCustodians { custs: Vec<AccountName> },
    #[serde(rename = "addwl")]
    AddWhitelist { cand: AccountName, rating: u64 },
    #[serde(rename = "updwl")]
    UpdateWhitelist { cand: AccountName, rating: u64 },
    #[serde(rename = "rmvwl")]
    RemoveWhitelist { cand: AccountName },
    #[serde(rename = "setrequirewl")]
    SetRequireWhitelist { required: bool },

    // ── Votes and proxies ──
    #[serde(rename = "votecust")]
    VoteCustodians { voter: AccountName, candidates: Vec<AccountName> },
    #[serde(rename = "voteproxy")]
    VoteProxy { voter: AccountName, proxy: AccountName },
    #[serde(rename = "removecstvte")]
    RemoveVote { voter: AccountName },
    #[serde(rename = "regproxy")]
    RegisterProxy { proxy: AccountName },
    #[serde(rename = "unregproxy")]
    UnregisterProxy { proxy: AccountName },

    // ── Inbound notifications ──
    #[serde(rename = "weightobsv")]
    WeightObserve { deltas: Vec<AccountWeightDelta> },
    #[serde(rename = "balanceobsv")]
    BalanceObserve { deltas: Vec<AccountBalanceDelta> },
    #[serde(rename = "stakeobsv")]
    StakeObserve { deltas: Vec<AccountStakeDelta> },
    /// A token transfer into one of the tenant's accounts: funds an escrow
    /// or credits a proposal deposit.
    #[serde(rename = "transfer")]
    Transfer {
        from: AccountName,
        to: AccountName,
        quantity: ExtendedAsset,
        #[serde(default)]
        memo: String,
    },

    // ── Periods, pay and budget ──
    #[serde(rename = "newperiod")]
    NewPeriod { message: String },
    #[serde(rename = "runnewperiod")]
    RunNewPeriod { message: String },
    #[serde(rename = "claimpay")]
    ClaimPay { payid: u64 },
    #[serde(rename = "rejectcuspay")]
    RejectPay { payid: u64 },
    #[serde(rename = "removecuspay")]
    RemovePay { payid: u64 },
    #[serde(rename = "claimbudget")]
    ClaimBudget,
    #[serde(rename = "budget")]
    Budget { update: BudgetUpdate },
    #[serde(rename = "electionconfig")]
    ElectionConfig { update: ConfigUpdate },

    // ── Maintenance ──
    #[serde(rename = "maintenance")]
    Maintenance { enabled: bool },
    #[serde(rename = "resetvotes")]
    ResetVotes { voter: AccountName },
    #[serde(rename = "collectvotes")]
    CollectVotes { from: AccountName, to: AccountName },
    #[serde(rename = "resetcands")]
    ResetCandidates,
    #[serde(rename = "resetstate")]
    ResetState,
    #[serde(rename = "clearcands")]
    ClearCandidates,
    #[serde(rename = "clearcusts")]
    ClearCustodians,
    #[serde(rename = "clrprxvotes")]
    ClearProxyVotes,
    #[serde(rename = "clrproxies")]
    ClearProxies,
    #[serde(rename = "cleanorphans")]
    CleanOrphans { from: AccountName, to: AccountName },
    #[serde(rename = "clearrank")]
    ClearRank,
    #[serde(rename = "migraterank")]
    MigrateRank,

    // ── Escrow ──
    #[serde(rename = "init")]
    EscrowInit {
        sender: AccountName,
        receiver: AccountName,
        arb: AccountName,
        expires: Timestamp,
        #[serde(default)]
        memo: String,
        ext_reference: AccountName,
    },
    #[serde(rename = "approve")]
    EscrowApprove { key: AccountName, approver: AccountName },
    #[serde(rename = "disapprove")]
    EscrowDisapprove { key: AccountName, disapprover: AccountName },
    #[serde(rename = "refund")]
    EscrowRefund { key: AccountName },
    #[serde(rename = "dispute")]
    EscrowDispute { key: AccountName },
    #[serde(rename = "cancel")]
    EscrowCancel { key: AccountName },

    // ── Proposals ──
    #[serde(rename = "createprop")]
    CreateProposal(NewProposal),
    #[serde(rename = "arbagree")]
    ArbiterAgree { arbiter: AccountName, id: AccountName },
    #[serde(rename = "startwork")]
    StartWork { id: AccountName },
    #[serde(rename = "completework")]
    CompleteWork { id: AccountName },
    #[serde(rename = "finalize")]
    Finalize { id: AccountName },
    #[serde(rename = "propdispute")]
    ProposalDispute { id: AccountName },
    #[serde(rename = "arbapprove")]
    ArbiterApprove { arbiter: AccountName, id: AccountName },
    #[serde(rename = "arbdeny")]
    ArbiterDeny { arbiter: AccountName, id: AccountName },
    #[serde(rename = "cancelprop")]
    CancelProposal { id: AccountName },
    #[serde(rename = "cancelwip")]
    CancelWorkInProgress { id: AccountName },
    #[serde(rename = "clearexpprop")]
    ClearExpired { id: AccountName },
    #[serde(rename = "rmvcompleted")]
    RemoveCompleted { id: AccountName },
    #[serde(rename = "comment")]
    Comment {
        commenter: AccountName,
        id: AccountName,
        comment: String,
        #[serde(default)]
        comment_category: String,
    },
    #[serde(rename = "voteprop")]
    VoteProposal { custodian: AccountName, id: AccountName, vote: PublicVote },
    #[serde(rename = "votepropfin")]
    VoteProposalFinalize { custodian: AccountName, id: AccountName, vote: PublicVote },
    #[serde(rename = "delegatevote")]
    DelegateVote { custodian: AccountName, id: AccountName, delegatee: AccountName },
    #[serde(rename = "delegatecat")]
    DelegateCategory { custodian: AccountName, category: u16, delegatee: AccountName },
    #[serde(rename = "undelegateca")]
    UndelegateCategory { custodian: AccountName, category: u16 },
    #[serde(rename = "updpropvotes")]
    UpdateProposalVotes { id: AccountName },
    #[serde(rename = "refunddeposit")]
    RefundDeposit { account: AccountName },
    #[serde(rename = "updateconfig")]
    ProposalConfig { config: ProposalConfig },
    #[serde(rename = "setpropfee")]
    SetProposalFee { fee: ExtendedAsset },
    #[serde(rename = "minduration")]
    MinDuration { seconds: u32 },
    #[serde(rename = "addpropwl")]
    AddProposalWhitelist { list: WhitelistKind, account: AccountName, rating: u64 },
    #[serde(rename = "updpropwl")]
    UpdateProposalWhitelist { list: WhitelistKind, account: AccountName, rating: u64 },
    #[serde(rename = "rmvpropwl")]
    RemoveProposalWhitelist { list: WhitelistKind, account: AccountName },
    #[serde(rename = "safermvarbwl")]
    SafeRemoveArbiter { arbiter: AccountName },
}

impl Action {
    /// The on-chain action name, used for spans and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Nominate { .. } => "nominatecane",
            Action::NominateUnpaid { .. } => "nominate",
            Action::Withdraw { .. } => "withdrawcane",
            Action::RemoveCandidate { .. } => "removecand",
            Action::Resign { .. } => "resigncust",
            Action::UpdateRequestedPay { .. } => "updatereqpay",
            Action::SetProfile { .. } => "stprofile",
            Action::UpdateBio { .. } => "updatebio",
            Action::SetPermission { .. } => "setperm",
            Action::AppointCustodians { .. } => "appointcust",
            Action::AddWhitelist { .. } => "addwl",
            Action::UpdateWhitelist { .. } => "updwl",
            Action::RemoveWhitelist { .. } => "rmvwl",
            Action::SetRequireWhitelist { .. } => "setrequirewl",
            Action::VoteCustodians { .. } => "votecust",
            Action::VoteProxy { .. } => "voteproxy",
            Action::RemoveVote { .. } => "removecstvte",
            Action::RegisterProxy { .. } => "regproxy",
            Action::UnregisterProxy { .. } => "unregproxy",
            Action::WeightObserve { .. } => "weightobsv",
            Action::BalanceObserve { .. } => "balanceobsv",
            Action::StakeObserve { .. } => "stakeobsv",
            Action::Transfer { .. } => "transfer",
            Action::NewPeriod { .. } => "newperiod",
            Action::RunNewPeriod { .. } => "runnewperiod",
            Action::ClaimPay { .. } => "claimpay",
            Action::RejectPay { .. } => "rejectcuspay",
            Action::RemovePay { .. } => "removecuspay",
            Action::ClaimBudget => "claimbudget",
            Action::Budget { .. } => "budget",
            Action::ElectionConfig { .. } => "electionconfig",
            Action::Maintenance { .. } => "maintenance",
            Action::ResetVotes { .. } => "resetvotes",
            Action::CollectVotes { .. } => "collectvotes",
            Action::ResetCandidates => "resetcands",
            Action::ResetState => "resetstate",
            Action::ClearCandidates => "clearcands",
            Action::ClearCustodians => "clearcusts",
            Action::ClearProxyVotes => "clrprxvotes",
            Action::ClearProxies => "clrproxies",
            Action::CleanOrphans { .. } => "cleanorphans",
            Action::ClearRank => "clearrank",
            Action::MigrateRank => "migraterank",
            Action::EscrowInit { .. } => "init",
            Action::EscrowApprove { .. } => "approve",
            Action::EscrowDisapprove { .. } => "disapprove",
            Action::EscrowRefund { .. } => "refund",
            Action::EscrowDispute { .. } => "dispute",
            Action::EscrowCancel { .. } => "cancel",
            Action::CreateProposal(_) => "createprop",
            Action::ArbiterAgree { .. } => "arbagree",
            Action::StartWork { .. } => "startwork",
            Action::CompleteWork { .. } => "completework",
            Action::Finalize { .. } => "finalize",
            Action::ProposalDispute { .. } => "propdispute",
            Action::ArbiterApprove { .. } => "arbapprove",
            Action::ArbiterDeny { .. } => "arbdeny",
            Action::CancelProposal { .. } => "cancelprop",
            Action::CancelWorkInProgress { .. } => "cancelwip",
            Action::ClearExpired { .. } => "clearexpprop",
            Action::RemoveCompleted { .. } => "rmvcompleted",
            Action::Comment { .. } => "comment",
            Action::VoteProposal { .. } => "voteprop",
            Action::VoteProposalFinalize { .. } => "votepropfin",
            Action::DelegateVote { .. } => "delegatevote",
            Action::DelegateCategory { .. } => "delegatecat",
            Action::UndelegateCategory { .. } => "undelegateca",
            Action::UpdateProposalVotes { .. } => "updpropvotes",
            Action::RefundDeposit { .. } => "refunddeposit",
            Action::ProposalConfig { .. } => "updateconfig",
            Action::SetProposalFee { .. } => "setpropfee",
            Action::MinDuration { .. } => "minduration",
            Action::AddProposalWhitelist { .. } => "addpropwl",
            Action::UpdateProposalWhitelist { .. } => "updpropwl",
            Action::RemoveProposalWhitelist { .. } => "rmvpropwl",
            Action::SafeRemoveArbiter { .. } => "safermvarbwl",
        }
    }
}
