//! All worker-proposal tables of one tenant.

use crate::config::ProposalConfig;
use crate::error::ProposalError;
use crate::proposal::{Ballot, Deposit, Proposal, ProposalVote, VoteScope, Whitelisted};
use dac_store::{combine_ids, Table};
use dac_types::AccountName;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProposalState {
    #[serde(default)]
    pub config: ProposalConfig,
    #[serde(default)]
    pub proposals: Table<Proposal>,
    #[serde(default)]
    pub votes: Table<ProposalVote>,
    #[serde(default)]
    pub deposits: Table<Deposit>,
    #[serde(default)]
    pub arbiter_whitelist: Table<Whitelisted>,
    #[serde(default)]
    pub receiver_whitelist: Table<Whitelisted>,
    /// Next vote row id; never reused.
    #[serde(default)]
    pub next_vote_id: u64,
}

impl ProposalState {
    pub fn new(config: ProposalConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn proposal(&self, id: &AccountName) -> Result<&Proposal, ProposalError> {
        self.proposals.get(id).ok_or(ProposalError::NotFound(*id))
    }

    /// The voter's row on a single proposal, vote or delegation.
    pub fn proposal_vote(&self, id: &AccountName, voter: &AccountName) -> Result<Option<&ProposalVote>, ProposalError> {
        let key = combine_ids(id.raw(), voter.raw());
        Ok(self
            .votes
            .index_range("propandvoter", key..=key)?
            .find(|v| v.scope == VoteScope::Proposal(*id)))
    }

    /// The voter's delegation for a whole category.
    pub fn category_vote(&self, category: u16, voter: &AccountName) -> Result<Option<&ProposalVote>, ProposalError> {
        let key = combine_ids(category as u64, voter.raw());
        Ok(self
            .votes
            .index_range("catandvoter", key..=key)?
            .find(|v| v.scope == VoteScope::Category(category)))
    }

    /// Rows scoped to proposal `id`.
    pub fn votes_on(&self, id: &AccountName) -> Result<Vec<&ProposalVote>, ProposalError> {
        let raw = id.raw() as u128;
        Ok(self
            .votes
            .index_range("proposal", raw..=raw)?
            .filter(|v| v.scope == VoteScope::Proposal(*id))
            .collect())
    }

    /// Insert or replace the voter's row for `scope`.
    pub fn cast(&mut self, voter: AccountName, scope: VoteScope, ballot: Ballot) -> Result<u64, ProposalError> {
        let existing = match scope {
            VoteScope::Proposal(id) => self.proposal_vote(&id, &voter)?,
            VoteScope::Category(category) => self.category_vote(category, &voter)?,
        }
        .map(|v| v.vote_id);
        match existing {
            Some(vote_id) => {
                self.votes.modify(&vote_id, |v| v.ballot = ballot)?;
                Ok(vote_id)
            }
            None => {
                let vote_id = self.next_vote_id;
                self.votes.insert(ProposalVote {
                    vote_id,
                    voter,
                    scope,
                    ballot,
                    comment_hash: None,
                })?;
                self.next_vote_id += 1;
                Ok(vote_id)
            }
        }
    }

    /// Drop the proposal and every row scoped to it.
    pub fn clear_proposal(&mut self, id: &AccountName) -> Result<Option<Proposal>, ProposalError> {
        let vote_ids: Vec<u64> = self.votes_on(id)?.iter().map(|v| v.vote_id).collect();
        for vote_id in vote_ids {
            self.votes.remove(&vote_id);
        }
        Ok(self.proposals.remove(id))
    }
}
