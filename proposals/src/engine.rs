//! Worker-proposal lifecycle.
//!
//! ```text
//! pendingappr <-> apprvtes --startwork--> inprogress --completework--> pendingfin <-> apprfinvtes
//!     |                                        |                            |
//!  (expiry)                                cancelwip                   finalize | dispute
//!     v                                        v                            v
//!  expired                                  (erased)          completed <-- indispute
//!                                                                  arbapprove / arbdeny
//! ```
//!
//! Starting work opens an escrow keyed by the proposal id and funds it from
//! the treasury; every later money movement is an escrow transition run with
//! the engine's own authority.

use crate::auth::{require_auth, require_contract, tenant_account};
use crate::config::ProposalConfig;
use crate::error::ProposalError;
use crate::proposal::{Proposal, ProposalStatus, VoteType};
use crate::state::ProposalState;
use dac_custodian::CustodianRoster;
use dac_escrow::{EscrowService, EscrowState, FundingLeg, FundingMemo};
use dac_messages::ActionContext;
use dac_types::{AccountName, AccountType, ExtendedAsset};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const MAX_TITLE_LEN: usize = 256;
pub const MAX_SUMMARY_LEN: usize = 512;
pub const MAX_CONTENT_HASH_LEN: usize = 32;

pub struct ProposalEngine;

/// Arguments of `createprop`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProposal {
    pub proposer: AccountName,
    pub title: String,
    pub summary: String,
    pub arbiter: AccountName,
    pub proposal_pay: ExtendedAsset,
    pub arbiter_pay: ExtendedAsset,
    #[serde(default)]
    pub content_hash: String,
    pub id: AccountName,
    #[serde(default)]
    pub category: u16,
    pub job_duration: u32,
}

impl NewProposal {
    fn validate(&self) -> Result<(), ProposalError> {
        if self.id.is_empty() {
            return Err(ProposalError::InvalidField {
                field: "id",
                reason: "must not be empty".into(),
            });
        }
        let title = self.title.len();
        if title <= 3 || title > MAX_TITLE_LEN {
            return Err(ProposalError::InvalidField {
                field: "title",
                reason: format!("length {title} outside 4..={MAX_TITLE_LEN}"),
            });
        }
        let summary = self.summary.len();
        if summary <= 3 || summary > MAX_SUMMARY_LEN {
            return Err(ProposalError::InvalidField {
                field: "summary",
                reason: format!("length {summary} outside 4..={MAX_SUMMARY_LEN}"),
            });
        }
        if self.content_hash.len() > MAX_CONTENT_HASH_LEN {
            return Err(ProposalError::InvalidField {
                field: "content_hash",
                reason: format!("longer than {MAX_CONTENT_HASH_LEN}"),
            });
        }
        if self.job_duration == 0 {
            return Err(ProposalError::InvalidField {
                field: "job_duration",
                reason: "must be positive".into(),
            });
        }
        if !self.proposal_pay.quantity.is_positive() {
            return Err(ProposalError::InvalidPay(format!(
                "proposal pay {} must be positive",
                self.proposal_pay
            )));
        }
        if self.arbiter_pay.quantity.amount < 0 {
            return Err(ProposalError::InvalidPay(format!(
                "arbiter pay {} must not be negative",
                self.arbiter_pay
            )));
        }
        if self.proposal_pay.extended_symbol() != self.arbiter_pay.extended_symbol() {
            return Err(ProposalError::InvalidPay(format!(
                "proposal pay {} and arbiter pay {} differ in currency",
                self.proposal_pay, self.arbiter_pay
            )));
        }
        Ok(())
    }
}

fn wrong_state(proposal: &Proposal, action: &'static str) -> ProposalError {
    ProposalError::WrongState {
        id: proposal.proposal_id,
        state: proposal.state,
        action,
    }
}

impl ProposalEngine {
    /// `createprop`
    pub fn create_proposal(
        &self,
        state: &mut ProposalState,
        ctx: &mut ActionContext<'_>,
        args: NewProposal,
    ) -> Result<(), ProposalError> {
        require_auth(ctx, &args.proposer)?;
        if !ctx.is_member(&args.proposer) {
            return Err(ProposalError::NotMember(args.proposer));
        }
        if !state.receiver_whitelist.contains(&args.proposer) {
            return Err(ProposalError::ReceiverNotWhitelisted(args.proposer));
        }
        if !state.arbiter_whitelist.contains(&args.arbiter) {
            return Err(ProposalError::ArbiterNotWhitelisted(args.arbiter));
        }
        if args.arbiter == args.proposer {
            return Err(ProposalError::ArbiterIsProposer);
        }
        if state.proposals.contains(&args.id) {
            return Err(ProposalError::AlreadyExists(args.id));
        }
        args.validate()?;

        if let Some(fee) = state.config.fee() {
            let holder = tenant_account(ctx, AccountType::Proposals)?;
            let treasury = tenant_account(ctx, AccountType::Treasury)?;
            state.charge_deposit(args.proposer, fee)?;
            ctx.transfer(holder, treasury, fee, format!("proposal fee {}", args.id));
        }

        let now = ctx.now;
        state.proposals.insert(Proposal {
            proposal_id: args.id,
            proposer: args.proposer,
            arbiter: args.arbiter,
            title: args.title,
            summary: args.summary,
            content_hash: args.content_hash,
            proposal_pay: args.proposal_pay,
            arbiter_pay: args.arbiter_pay,
            arbiter_agreed: false,
            state: ProposalStatus::PendingApproval,
            expiry: now.plus_secs(state.config.approval_duration as u64),
            created_at: now,
            job_duration: args.job_duration,
            category: args.category,
        })?;
        info!(dac = %ctx.dac_id(), id = %args.id, proposer = %args.proposer, "proposal created");
        Ok(())
    }

    /// `arbagree`: the named arbiter accepts the job.
    pub fn arbiter_agree(
        &self,
        state: &mut ProposalState,
        ctx: &ActionContext<'_>,
        arbiter: AccountName,
        id: AccountName,
    ) -> Result<(), ProposalError> {
        require_auth(ctx, &arbiter)?;
        let proposal = state.proposal(&id)?;
        if proposal.arbiter != arbiter {
            return Err(ProposalError::NotArbiter(arbiter));
        }
        if !proposal.state.is_approval_phase() {
            return Err(wrong_state(proposal, "agree to arbitrate"));
        }
        if proposal.has_expired(ctx.now) {
            return Err(ProposalError::Expired(id));
        }
        state.proposals.modify(&id, |p| p.arbiter_agreed = true)?;
        info!(dac = %ctx.dac_id(), %id, %arbiter, "arbiter agreed");
        Ok(())
    }

    /// `startwork`: open and fund the escrow once enough custodians approve.
    ///
    /// An expired proposal is marked `expired` instead and the new state is
    /// returned without an error, so the marking persists.
    pub fn start_work(
        &self,
        state: &mut ProposalState,
        escrow: &mut EscrowState,
        roster: &dyn CustodianRoster,
        ctx: &mut ActionContext<'_>,
        id: AccountName,
    ) -> Result<ProposalStatus, ProposalError> {
        let proposal = state.proposal(&id)?.clone();
        if !proposal.state.is_approval_phase() {
            return Err(wrong_state(&proposal, "start work"));
        }
        require_auth(ctx, &proposal.proposer)?;
        if proposal.has_expired(ctx.now) {
            state.proposals.modify(&id, |p| p.state = ProposalStatus::Expired)?;
            warn!(dac = %ctx.dac_id(), %id, "proposal expired before work started");
            return Ok(ProposalStatus::Expired);
        }
        if !proposal.arbiter_agreed {
            return Err(ProposalError::ArbiterNotAgreed(id));
        }
        let approvals = state.count_votes(&proposal, VoteType::ProposalApprove, roster)?;
        let needed = state.config.proposal_threshold as u32;
        if approvals < needed {
            return Err(ProposalError::InsufficientVotes {
                have: approvals,
                need: needed,
            });
        }

        let treasury = tenant_account(ctx, AccountType::Treasury)?;
        let escrow_account = tenant_account(ctx, AccountType::Escrow)?;
        let dac_id = ctx.dac_id();
        let memo_for = |leg| {
            FundingMemo {
                leg,
                key: id,
                dac_id,
            }
            .to_string()
        };
        let receiver_memo = memo_for(FundingLeg::Receiver);
        let arbiter_memo = memo_for(FundingLeg::Arbiter);
        let pays_arbiter = proposal.arbiter_pay.quantity.is_positive();

        let expires = ctx.now.plus_secs(proposal.job_duration as u64);
        let escrow_memo = format!("{}:{}:{}", proposal.proposer, id, proposal.content_hash);
        ctx.with_contract_authority(|ctx| -> Result<(), ProposalError> {
            EscrowService.init(
                escrow,
                ctx,
                treasury,
                proposal.proposer,
                proposal.arbiter,
                expires,
                escrow_memo,
                id,
            )?;
            EscrowService.fund(escrow, ctx, treasury, proposal.proposal_pay, &receiver_memo)?;
            if pays_arbiter {
                EscrowService.fund(escrow, ctx, treasury, proposal.arbiter_pay, &arbiter_memo)?;
            }
            Ok(())
        })?;
        ctx.transfer(treasury, escrow_account, proposal.proposal_pay, receiver_memo);
        if pays_arbiter {
            ctx.transfer(treasury, escrow_account, proposal.arbiter_pay, arbiter_memo);
        }

        state.proposals.modify(&id, |p| p.state = ProposalStatus::WorkInProgress)?;
        info!(dac = %ctx.dac_id(), %id, approvals, "work started");
        Ok(ProposalStatus::WorkInProgress)
    }

    /// `completework`: the proposer reports the job done.
    pub fn complete_work(
        &self,
        state: &mut ProposalState,
        ctx: &ActionContext<'_>,
        id: AccountName,
    ) -> Result<(), ProposalError> {
        let proposal = state.proposal(&id)?;
        require_auth(ctx, &proposal.proposer)?;
        if proposal.state != ProposalStatus::WorkInProgress {
            return Err(wrong_state(proposal, "complete work"));
        }
        state.proposals.modify(&id, |p| p.state = ProposalStatus::PendingFinalize)?;
        info!(dac = %ctx.dac_id(), %id, "work completed");
        Ok(())
    }

    /// `finalize`: release the escrow to the proposer once enough custodians
    /// sign off and the minimum duration has passed. Anyone may call it.
    pub fn finalize(
        &self,
        state: &mut ProposalState,
        escrow: &mut EscrowState,
        roster: &dyn CustodianRoster,
        ctx: &mut ActionContext<'_>,
        id: AccountName,
    ) -> Result<(), ProposalError> {
        let proposal = state.proposal(&id)?.clone();
        if !proposal.state.is_finalize_phase() {
            return Err(wrong_state(&proposal, "finalize"));
        }
        let approvals = state.count_votes(&proposal, VoteType::FinalizeApprove, roster)?;
        let needed = state.config.finalize_threshold as u32;
        if approvals < needed {
            return Err(ProposalError::InsufficientVotes {
                have: approvals,
                need: needed,
            });
        }
        let elapsed = proposal.created_at.elapsed_since(ctx.now);
        let required = state.config.min_proposal_duration as u64;
        if elapsed < required {
            return Err(ProposalError::MinDurationNotMet { elapsed, required });
        }
        let sender = escrow
            .escrows
            .get(&id)
            .map(|e| e.sender)
            .ok_or(ProposalError::NoEscrow(id))?;
        ctx.with_contract_authority(|ctx| EscrowService.approve(escrow, ctx, id, sender))?;
        state.proposals.modify(&id, |p| p.state = ProposalStatus::Completed)?;
        info!(dac = %ctx.dac_id(), %id, approvals, "proposal finalized");
        Ok(())
    }

    /// `dispute`: the proposer asks the arbiter to rule.
    pub fn dispute(
        &self,
        state: &mut ProposalState,
        escrow: &mut EscrowState,
        ctx: &mut ActionContext<'_>,
        id: AccountName,
    ) -> Result<(), ProposalError> {
        let proposal = state.proposal(&id)?;
        require_auth(ctx, &proposal.proposer)?;
        if !proposal.state.is_finalize_phase() {
            return Err(wrong_state(proposal, "dispute"));
        }
        if !escrow.escrows.contains(&id) {
            return Err(ProposalError::NoEscrow(id));
        }
        ctx.with_contract_authority(|ctx| EscrowService.dispute(escrow, ctx, id))?;
        state.proposals.modify(&id, |p| p.state = ProposalStatus::InDispute)?;
        info!(dac = %ctx.dac_id(), %id, "proposal disputed");
        Ok(())
    }

    /// `arbapprove`: the arbiter rules for the proposer.
    pub fn arbiter_approve(
        &self,
        state: &mut ProposalState,
        escrow: &mut EscrowState,
        ctx: &mut ActionContext<'_>,
        arbiter: AccountName,
        id: AccountName,
    ) -> Result<(), ProposalError> {
        self.arbiter_rule(state, escrow, ctx, arbiter, id, true)
    }

    /// `arbdeny`: the arbiter rules against the proposer; the treasury is refunded.
    pub fn arbiter_deny(
        &self,
        state: &mut ProposalState,
        escrow: &mut EscrowState,
        ctx: &mut ActionContext<'_>,
        arbiter: AccountName,
        id: AccountName,
    ) -> Result<(), ProposalError> {
        self.arbiter_rule(state, escrow, ctx, arbiter, id, false)
    }

    fn arbiter_rule(
        &self,
        state: &mut ProposalState,
        escrow: &mut EscrowState,
        ctx: &mut ActionContext<'_>,
        arbiter: AccountName,
        id: AccountName,
        approve: bool,
    ) -> Result<(), ProposalError> {
        require_auth(ctx, &arbiter)?;
        let proposal = state.proposal(&id)?;
        if proposal.arbiter != arbiter {
            return Err(ProposalError::NotArbiter(arbiter));
        }
        if proposal.state != ProposalStatus::InDispute {
            return Err(wrong_state(proposal, "rule on"));
        }
        ctx.with_contract_authority(|ctx| {
            if approve {
                EscrowService.approve(escrow, ctx, id, arbiter)
            } else {
                EscrowService.disapprove(escrow, ctx, id, arbiter)
            }
        })?;
        state.proposals.modify(&id, |p| p.state = ProposalStatus::Completed)?;
        info!(dac = %ctx.dac_id(), %id, %arbiter, approve, "arbiter ruled");
        Ok(())
    }

    /// `cancelprop`: withdraw a proposal that never opened an escrow.
    pub fn cancel_proposal(
        &self,
        state: &mut ProposalState,
        escrow: &EscrowState,
        ctx: &ActionContext<'_>,
        id: AccountName,
    ) -> Result<(), ProposalError> {
        let proposal = state.proposal(&id)?;
        require_auth(ctx, &proposal.proposer)?;
        if escrow.escrows.contains(&id) {
            return Err(ProposalError::EscrowExists(id));
        }
        if !(proposal.state.is_approval_phase() || proposal.state == ProposalStatus::Expired) {
            return Err(wrong_state(proposal, "cancel"));
        }
        state.clear_proposal(&id)?;
        info!(dac = %ctx.dac_id(), %id, "proposal cancelled");
        Ok(())
    }

    /// `cancelwip`: abandon started work and refund the treasury.
    pub fn cancel_work_in_progress(
        &self,
        state: &mut ProposalState,
        escrow: &mut EscrowState,
        ctx: &mut ActionContext<'_>,
        id: AccountName,
    ) -> Result<(), ProposalError> {
        let proposal = state.proposal(&id)?;
        require_auth(ctx, &proposal.proposer)?;
        if !escrow.escrows.contains(&id) {
            return Err(ProposalError::NoEscrow(id));
        }
        ctx.with_contract_authority(|ctx| EscrowService.refund(escrow, ctx, id))?;
        state.clear_proposal(&id)?;
        info!(dac = %ctx.dac_id(), %id, "work in progress cancelled");
        Ok(())
    }

    /// `clearexpprop`: anyone may drop a proposal that expired unstarted.
    pub fn clear_expired(
        &self,
        state: &mut ProposalState,
        ctx: &ActionContext<'_>,
        id: AccountName,
    ) -> Result<(), ProposalError> {
        let proposal = state.proposal(&id)?;
        let expired = proposal.state == ProposalStatus::Expired
            || (proposal.state.is_approval_phase() && proposal.has_expired(ctx.now));
        if !expired {
            return Err(ProposalError::NotExpired(id));
        }
        state.clear_proposal(&id)?;
        info!(dac = %ctx.dac_id(), %id, "expired proposal cleared");
        Ok(())
    }

    /// `rmvcompleted`
    pub fn remove_completed(
        &self,
        state: &mut ProposalState,
        ctx: &ActionContext<'_>,
        id: AccountName,
    ) -> Result<(), ProposalError> {
        let proposal = state.proposal(&id)?;
        if proposal.state != ProposalStatus::Completed {
            return Err(wrong_state(proposal, "remove"));
        }
        state.clear_proposal(&id)?;
        info!(dac = %ctx.dac_id(), %id, "completed proposal removed");
        Ok(())
    }

    /// `comment`: the proposer or a custodian annotates a proposal.
    #[allow(clippy::too_many_arguments)]
    pub fn comment(
        &self,
        state: &ProposalState,
        roster: &dyn CustodianRoster,
        ctx: &ActionContext<'_>,
        commenter: AccountName,
        id: AccountName,
        comment: &str,
        category: &str,
    ) -> Result<(), ProposalError> {
        require_auth(ctx, &commenter)?;
        let proposal = state.proposal(&id)?;
        if commenter != proposal.proposer && !roster.is_custodian(&commenter) {
            return Err(ProposalError::NotCustodian(commenter));
        }
        info!(dac = %ctx.dac_id(), %id, %commenter, category, len = comment.len(), "proposal comment");
        Ok(())
    }

    /// `updateconfig`
    pub fn update_config(
        &self,
        state: &mut ProposalState,
        ctx: &ActionContext<'_>,
        config: ProposalConfig,
    ) -> Result<(), ProposalError> {
        require_contract(ctx)?;
        config.validate()?;
        state.config = config;
        info!(dac = %ctx.dac_id(), "proposal config updated");
        Ok(())
    }

    /// `setpropfee`
    pub fn set_proposal_fee(
        &self,
        state: &mut ProposalState,
        ctx: &ActionContext<'_>,
        fee: ExtendedAsset,
    ) -> Result<(), ProposalError> {
        require_contract(ctx)?;
        let config = ProposalConfig {
            proposal_fee: Some(fee),
            ..state.config.clone()
        };
        config.validate()?;
        state.config = config;
        info!(dac = %ctx.dac_id(), %fee, "proposal fee set");
        Ok(())
    }

    /// `minduration`
    pub fn set_min_duration(
        &self,
        state: &mut ProposalState,
        ctx: &ActionContext<'_>,
        secs: u32,
    ) -> Result<(), ProposalError> {
        require_contract(ctx)?;
        state.config.min_proposal_duration = secs;
        info!(dac = %ctx.dac_id(), secs, "minimum proposal duration set");
        Ok(())
    }
}
