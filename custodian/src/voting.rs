//! Custodian votes and proxy delegation.

use crate::auth::{require_auth, require_member};
use crate::error::CustodianError;
use crate::registry::CandidateRegistry;
use crate::state::CustodianState;
use crate::vote::{Proxy, Vote, VoteTarget};
use dac_messages::ActionContext;
use dac_types::AccountName;
use std::collections::BTreeSet;
use tracing::info;

impl CandidateRegistry {
    /// `votecust`: replace the voter's vote with `candidates`. An empty list
    /// removes the vote.
    pub fn vote_custodians(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        voter: AccountName,
        candidates: Vec<AccountName>,
    ) -> Result<(), CustodianError> {
        require_auth(ctx, &voter)?;
        require_member(ctx, &voter)?;
        if candidates.is_empty() {
            self.clear_vote(state, &voter)?;
            return Ok(());
        }
        let max = state.config().maxvotes;
        if candidates.len() > max as usize {
            return Err(CustodianError::TooManyVotes {
                have: candidates.len(),
                max,
            });
        }
        let mut seen = BTreeSet::new();
        for cand in &candidates {
            if !seen.insert(*cand) {
                return Err(CustodianError::DuplicateVote(*cand));
            }
            match state.candidates.get(cand) {
                None => return Err(CustodianError::CandidateNotFound(*cand)),
                Some(c) if !c.is_active => return Err(CustodianError::CandidateNotActive(*cand)),
                Some(_) => {}
            }
        }
        let links = candidates.len();
        self.cast(state, ctx, voter, VoteTarget::Candidates(candidates))?;
        info!(dac = %ctx.dac_id(), %voter, candidates = links, "custodian vote cast");
        Ok(())
    }

    /// `voteproxy`: delegate the voter's whole weight to a registered proxy.
    pub fn vote_proxy(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        voter: AccountName,
        proxy: AccountName,
    ) -> Result<(), CustodianError> {
        require_auth(ctx, &voter)?;
        require_member(ctx, &voter)?;
        if voter == proxy {
            return Err(CustodianError::ProxySelfVote);
        }
        if !state.proxies.contains(&proxy) {
            return Err(CustodianError::ProxyNotRegistered(proxy));
        }
        if state.proxies.contains(&voter) {
            return Err(CustodianError::ProxyCannotDelegate(voter));
        }
        self.cast(state, ctx, voter, VoteTarget::Proxy(proxy))?;
        info!(dac = %ctx.dac_id(), %voter, %proxy, "vote delegated to proxy");
        Ok(())
    }

    /// `removecstvte`
    pub fn remove_vote(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        voter: AccountName,
    ) -> Result<(), CustodianError> {
        require_auth(ctx, &voter)?;
        self.clear_vote(state, &voter)?;
        info!(dac = %ctx.dac_id(), %voter, "vote removed");
        Ok(())
    }

    /// `regproxy`
    pub fn register_proxy(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        proxy: AccountName,
    ) -> Result<(), CustodianError> {
        require_auth(ctx, &proxy)?;
        require_member(ctx, &proxy)?;
        if state.proxies.contains(&proxy) {
            return Err(CustodianError::ProxyAlreadyRegistered(proxy));
        }
        if state.votes.get(&proxy).and_then(|v| v.target.proxy()).is_some() {
            return Err(CustodianError::DelegatingVoterCannotProxy(proxy));
        }
        state.proxies.insert(Proxy {
            proxy,
            total_weight: 0,
        })?;
        info!(dac = %ctx.dac_id(), %proxy, "proxy registered");
        Ok(())
    }

    /// `unregproxy`: clear every delegated vote, then drop the proxy.
    ///
    /// Clearing the delegators pulls their weight off the proxy's own
    /// candidates, so the proxy's vote keeps only its own weight afterwards.
    pub fn unregister_proxy(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        proxy: AccountName,
    ) -> Result<(), CustodianError> {
        require_auth(ctx, &proxy)?;
        let cleared = self.drop_proxy(state, &proxy)?;
        info!(dac = %ctx.dac_id(), %proxy, delegators = cleared, "proxy unregistered");
        Ok(())
    }

    pub(crate) fn drop_proxy(
        &self,
        state: &mut CustodianState,
        proxy: &AccountName,
    ) -> Result<usize, CustodianError> {
        if !state.proxies.contains(proxy) {
            return Err(CustodianError::ProxyNotRegistered(*proxy));
        }
        let key = proxy.raw() as u128;
        let delegators: Vec<AccountName> = state
            .votes
            .index_range("byproxy", key..=key)?
            .map(|v| v.voter)
            .collect();
        for voter in &delegators {
            self.clear_vote(state, voter)?;
        }
        state.proxies.remove(proxy);
        Ok(delegators.len())
    }

    /// Remove a vote and every unit of weight it placed.
    pub(crate) fn clear_vote(
        &self,
        state: &mut CustodianState,
        voter: &AccountName,
    ) -> Result<Vote, CustodianError> {
        let vote = state
            .votes
            .get(voter)
            .cloned()
            .ok_or(CustodianError::NoVote(*voter))?;
        let mut ledger = state.ledger();
        let weight = ledger.voting_weight(voter);
        let (_, weight_quorum) = ledger.cached_weight(voter);
        ledger.retarget(voter, Some((&vote.target, vote.vote_time_stamp)), None, weight, true);
        ledger.adjust_totals(-(vote.target.candidates().len() as i64), -weight_quorum);
        state.votes.remove(voter);
        Ok(vote)
    }

    /// Point the voter's weight at `target`, replacing any previous vote.
    fn cast(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        voter: AccountName,
        target: VoteTarget,
    ) -> Result<(), CustodianError> {
        let existing = state.votes.get(&voter).cloned();
        let now = ctx.now;
        let mut ledger = state.ledger();
        let weight = ledger.voting_weight(&voter);
        let (_, weight_quorum) = ledger.cached_weight(&voter);
        ledger.retarget(
            &voter,
            existing.as_ref().map(|v| (&v.target, v.vote_time_stamp)),
            Some((&target, now)),
            weight,
            true,
        );
        let old_links = existing.as_ref().map_or(0, |v| v.target.candidates().len()) as i64;
        let new_links = target.candidates().len() as i64;
        let new_quorum = if existing.is_none() { weight_quorum } else { 0 };
        ledger.adjust_totals(new_links - old_links, new_quorum);

        let vote_count = existing.map_or(0, |v| v.vote_count).wrapping_add(1);
        state.votes.upsert(Vote {
            voter,
            target,
            vote_time_stamp: now,
            vote_count,
        });
        Ok(())
    }
}
