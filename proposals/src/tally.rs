//! Custodian vote counting with one-hop delegation.
//!
//! Every serving custodian is worth at most one vote on a proposal:
//!
//! 1. their own direct vote on the proposal, if any;
//! 2. else the direct vote of the custodian they delegated this proposal to;
//! 3. else the direct vote of the custodian they delegated the proposal's
//!    category to.
//!
//! Delegation is not followed further, and votes by or through accounts that
//! no longer serve do not count.

use crate::error::ProposalError;
use crate::proposal::{Ballot, Proposal, VoteType};
use crate::state::ProposalState;
use dac_custodian::CustodianRoster;
use dac_types::AccountName;
use std::collections::BTreeSet;

impl ProposalState {
    fn direct_vote(&self, proposal: &Proposal, voter: &AccountName) -> Result<Option<VoteType>, ProposalError> {
        Ok(match self.proposal_vote(&proposal.proposal_id, voter)? {
            Some(row) => match row.ballot {
                Ballot::Vote(vote) => Some(vote),
                Ballot::Delegate(_) => None,
            },
            None => None,
        })
    }

    /// The custodian who votes on `voter`'s behalf, proposal delegation first.
    fn delegate_for(&self, proposal: &Proposal, voter: &AccountName) -> Result<Option<AccountName>, ProposalError> {
        if let Some(row) = self.proposal_vote(&proposal.proposal_id, voter)? {
            if let Ballot::Delegate(delegatee) = row.ballot {
                return Ok(Some(delegatee));
            }
        }
        Ok(match self.category_vote(proposal.category, voter)? {
            Some(row) => match row.ballot {
                Ballot::Delegate(delegatee) => Some(delegatee),
                Ballot::Vote(_) => None,
            },
            None => None,
        })
    }

    /// Votes of type `vote_type` on `proposal` from the current custodians.
    pub fn count_votes(
        &self,
        proposal: &Proposal,
        vote_type: VoteType,
        roster: &dyn CustodianRoster,
    ) -> Result<u32, ProposalError> {
        let custodians: BTreeSet<AccountName> = roster.custodian_names().into_iter().collect();
        let mut count = 0u32;
        for custodian in &custodians {
            let effective = match self.direct_vote(proposal, custodian)? {
                Some(vote) => Some(vote),
                None => match self.delegate_for(proposal, custodian)? {
                    Some(delegatee) if custodians.contains(&delegatee) => {
                        self.direct_vote(proposal, &delegatee)?
                    }
                    _ => None,
                },
            };
            if effective == Some(vote_type) {
                count += 1;
            }
        }
        Ok(count)
    }
}
