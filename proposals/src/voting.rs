//! Custodian votes and delegations on proposals.

use crate::auth::require_custodian;
use crate::engine::ProposalEngine;
use crate::error::ProposalError;
use crate::proposal::{Ballot, ProposalStatus, PublicVote, VoteScope, VoteType};
use crate::state::ProposalState;
use dac_custodian::CustodianRoster;
use dac_messages::ActionContext;
use dac_types::AccountName;
use tracing::{debug, info};

impl ProposalState {
    /// Drop the voter's row for `scope`, returning whether one existed.
    pub fn withdraw(&mut self, voter: &AccountName, scope: VoteScope) -> Result<bool, ProposalError> {
        let existing = match scope {
            VoteScope::Proposal(id) => self.proposal_vote(&id, voter)?,
            VoteScope::Category(category) => self.category_vote(category, voter)?,
        }
        .map(|v| v.vote_id);
        Ok(match existing {
            Some(vote_id) => self.votes.remove(&vote_id).is_some(),
            None => false,
        })
    }

    /// Recompute the derived `apprvtes` / `apprfinvtes` state from the tally.
    /// Other states are returned unchanged.
    pub fn refresh_status(
        &mut self,
        id: &AccountName,
        roster: &dyn CustodianRoster,
    ) -> Result<ProposalStatus, ProposalError> {
        let proposal = self.proposal(id)?.clone();
        let next = if proposal.state.is_approval_phase() {
            let approvals = self.count_votes(&proposal, VoteType::ProposalApprove, roster)?;
            if approvals >= self.config.proposal_threshold as u32 {
                ProposalStatus::HasEnoughApprovalVotes
            } else {
                ProposalStatus::PendingApproval
            }
        } else if proposal.state.is_finalize_phase() {
            let approvals = self.count_votes(&proposal, VoteType::FinalizeApprove, roster)?;
            if approvals >= self.config.finalize_threshold as u32 {
                ProposalStatus::HasEnoughFinalizeVotes
            } else {
                ProposalStatus::PendingFinalize
            }
        } else {
            proposal.state
        };
        if next != proposal.state {
            self.proposals.modify(id, |p| p.state = next)?;
            debug!(%id, from = %proposal.state, to = %next, "proposal vote state changed");
        }
        Ok(next)
    }
}

impl ProposalEngine {
    /// `voteprop`: the vote applies to whichever phase the proposal is in.
    pub fn vote_proposal(
        &self,
        state: &mut ProposalState,
        roster: &dyn CustodianRoster,
        ctx: &ActionContext<'_>,
        custodian: AccountName,
        id: AccountName,
        vote: PublicVote,
    ) -> Result<ProposalStatus, ProposalError> {
        require_custodian(ctx, roster, &custodian)?;
        let proposal = state.proposal(&id)?;
        let (approve, deny) = if proposal.state.is_approval_phase() {
            if proposal.has_expired(ctx.now) {
                return Err(ProposalError::Expired(id));
            }
            (VoteType::ProposalApprove, VoteType::ProposalDeny)
        } else if proposal.state.is_finalize_phase() {
            (VoteType::FinalizeApprove, VoteType::FinalizeDeny)
        } else {
            return Err(ProposalError::WrongState {
                id,
                state: proposal.state,
                action: "vote on",
            });
        };
        let scope = VoteScope::Proposal(id);
        match vote {
            PublicVote::Approve => {
                state.cast(custodian, scope, Ballot::Vote(approve))?;
            }
            PublicVote::Deny => {
                state.cast(custodian, scope, Ballot::Vote(deny))?;
            }
            PublicVote::Abstain => {
                state.withdraw(&custodian, scope)?;
            }
        }
        let status = state.refresh_status(&id, roster)?;
        info!(dac = %ctx.dac_id(), %id, %custodian, ?vote, %status, "proposal vote");
        Ok(status)
    }

    /// `votepropfin`: like `voteprop` but only accepted after work is completed.
    pub fn vote_proposal_finalize(
        &self,
        state: &mut ProposalState,
        roster: &dyn CustodianRoster,
        ctx: &ActionContext<'_>,
        custodian: AccountName,
        id: AccountName,
        vote: PublicVote,
    ) -> Result<ProposalStatus, ProposalError> {
        let proposal = state.proposal(&id)?;
        if !proposal.state.is_finalize_phase() {
            return Err(ProposalError::WrongState {
                id,
                state: proposal.state,
                action: "vote to finalize",
            });
        }
        self.vote_proposal(state, roster, ctx, custodian, id, vote)
    }

    /// `delegatevote`: hand this proposal's vote to another custodian.
    pub fn delegate_vote(
        &self,
        state: &mut ProposalState,
        roster: &dyn CustodianRoster,
        ctx: &ActionContext<'_>,
        custodian: AccountName,
        id: AccountName,
        delegatee: AccountName,
    ) -> Result<ProposalStatus, ProposalError> {
        require_custodian(ctx, roster, &custodian)?;
        if custodian == delegatee {
            return Err(ProposalError::SelfDelegation);
        }
        let proposal = state.proposal(&id)?;
        if !(proposal.state.is_approval_phase() || proposal.state.is_finalize_phase()) {
            return Err(ProposalError::WrongState {
                id,
                state: proposal.state,
                action: "delegate a vote on",
            });
        }
        state.cast(custodian, VoteScope::Proposal(id), Ballot::Delegate(delegatee))?;
        let status = state.refresh_status(&id, roster)?;
        info!(dac = %ctx.dac_id(), %id, %custodian, %delegatee, "proposal vote delegated");
        Ok(status)
    }

    /// `delegatecat`: hand every proposal of a category to another custodian.
    pub fn delegate_category(
        &self,
        state: &mut ProposalState,
        roster: &dyn CustodianRoster,
        ctx: &ActionContext<'_>,
        custodian: AccountName,
        category: u16,
        delegatee: AccountName,
    ) -> Result<(), ProposalError> {
        require_custodian(ctx, roster, &custodian)?;
        if custodian == delegatee {
            return Err(ProposalError::SelfDelegation);
        }
        state.cast(custodian, VoteScope::Category(category), Ballot::Delegate(delegatee))?;
        info!(dac = %ctx.dac_id(), category, %custodian, %delegatee, "category delegated");
        Ok(())
    }

    /// `undelegateca`
    pub fn undelegate_category(
        &self,
        state: &mut ProposalState,
        roster: &dyn CustodianRoster,
        ctx: &ActionContext<'_>,
        custodian: AccountName,
        category: u16,
    ) -> Result<(), ProposalError> {
        require_custodian(ctx, roster, &custodian)?;
        if !state.withdraw(&custodian, VoteScope::Category(category))? {
            return Err(ProposalError::DelegationNotFound {
                voter: custodian,
                category,
            });
        }
        info!(dac = %ctx.dac_id(), category, %custodian, "category delegation removed");
        Ok(())
    }

    /// `updpropvotes`: re-derive the vote state, e.g. after the custodian set changed.
    pub fn update_votes(
        &self,
        state: &mut ProposalState,
        roster: &dyn CustodianRoster,
        ctx: &ActionContext<'_>,
        id: AccountName,
    ) -> Result<ProposalStatus, ProposalError> {
        let status = state.refresh_status(&id, roster)?;
        debug!(dac = %ctx.dac_id(), %id, %status, "proposal votes refreshed");
        Ok(status)
    }
}
