//! Vote-weight bookkeeping.
//!
//! A voter's weight supports exactly the targets in its [`Vote`] record:
//! each listed candidate receives the full weight, or the chosen proxy adds it
//! to `total_weight`. A proxy's own vote carries its own weight plus everything
//! delegated to it, so weight changes reaching a proxy are forwarded to the
//! candidates the proxy voted for, at the proxy vote's timestamp.
//!
//! The ledger never checks authority and never emits messages; callers
//! validate first and update the vote record after retargeting.

use crate::candidate::Candidate;
use crate::globals::DacGlobals;
use crate::vote::{Proxy, Vote, VoteTarget, VoteWeight};
use dac_store::Table;
use dac_types::{AccountName, Timestamp};
use tracing::debug;

pub struct VoteWeightLedger<'s> {
    pub(crate) candidates: &'s mut Table<Candidate>,
    pub(crate) proxies: &'s mut Table<Proxy>,
    pub(crate) votes: &'s Table<Vote>,
    pub(crate) weights: &'s mut Table<VoteWeight>,
    pub(crate) globals: &'s mut DacGlobals,
}

impl VoteWeightLedger<'_> {
    /// Cached (weight, weight_quorum) of `voter`, zero when unknown.
    pub fn cached_weight(&self, voter: &AccountName) -> (i64, i64) {
        self.weights
            .get(voter)
            .map_or((0, 0), |w| (w.weight, w.weight_quorum))
    }

    /// Weight a vote by `voter` moves: its own plus, for a proxy, everything
    /// delegated to it.
    pub fn voting_weight(&self, voter: &AccountName) -> i64 {
        let own = self.cached_weight(voter).0;
        let delegated = self.proxies.get(voter).map_or(0, |p| p.total_weight);
        own.saturating_add(delegated)
    }

    /// Update the cached weights of `voter` without touching any vote.
    pub fn apply_weight_delta(&mut self, voter: AccountName, delta: i64, delta_quorum: i64) {
        let (weight, weight_quorum) = self.cached_weight(&voter);
        self.weights.upsert(VoteWeight {
            voter,
            weight: weight.saturating_add(delta),
            weight_quorum: weight_quorum.saturating_add(delta_quorum),
        });
    }

    /// Cache a weight change and re-apply it to the voter's current targets at
    /// the vote's original timestamp.
    pub fn observe_weight_delta(&mut self, voter: AccountName, delta: i64, delta_quorum: i64) {
        self.apply_weight_delta(voter, delta, delta_quorum);
        let Some(vote) = self.votes.get(&voter) else {
            return;
        };
        let (target, at) = (vote.target.clone(), vote.vote_time_stamp);
        self.shift_target(&target, delta, at, 0);
        self.adjust_totals(0, delta_quorum);
    }

    /// Move `weight` from `old` targets to `new` targets.
    ///
    /// Removal happens at the old vote timestamp so that the running average
    /// of each candidate sheds exactly what it gained. With `from_voting` the
    /// candidates' voter counts follow.
    pub fn retarget(
        &mut self,
        voter: &AccountName,
        old: Option<(&VoteTarget, Timestamp)>,
        new: Option<(&VoteTarget, Timestamp)>,
        weight: i64,
        from_voting: bool,
    ) {
        debug!(%voter, weight, from_voting, "retarget vote weight");
        let step = |added: i32| if from_voting { added } else { 0 };
        if let Some((target, at)) = old {
            self.shift_target(target, weight.saturating_neg(), at, step(-1));
        }
        if let Some((target, at)) = new {
            self.shift_target(target, weight, at, step(1));
        }
    }

    /// Add `links` (voter, candidate) pairs and `quorum_weight` to the totals.
    pub fn adjust_totals(&mut self, links: i64, quorum_weight: i64) {
        self.globals.total_votes_on_candidates =
            (self.globals.total_votes_on_candidates + links).max(0);
        self.globals.total_weight_of_votes = self
            .globals
            .total_weight_of_votes
            .saturating_add(quorum_weight)
            .max(0);
    }

    /// `voter_step` is added to each candidate's voter count.
    fn shift_target(&mut self, target: &VoteTarget, weight: i64, at: Timestamp, voter_step: i32) {
        match target {
            VoteTarget::Candidates(names) => {
                for name in names {
                    self.shift_candidate(name, weight, at, voter_step);
                }
            }
            VoteTarget::Proxy(proxy) => self.shift_proxy(proxy, weight),
        }
    }

    fn shift_candidate(&mut self, name: &AccountName, weight: i64, at: Timestamp, voter_step: i32) {
        let result = self.candidates.modify(name, |c| {
            c.apply_weight(weight, at);
            c.number_voters = c.number_voters.saturating_add_signed(voter_step);
        });
        if result.is_err() {
            debug!(candidate = %name, "vote references an unknown candidate");
        }
    }

    /// Change a proxy's aggregate and forward the change to its own vote.
    fn shift_proxy(&mut self, proxy: &AccountName, weight: i64) {
        if self
            .proxies
            .modify(proxy, |p| p.total_weight = p.total_weight.saturating_add(weight).max(0))
            .is_err()
        {
            debug!(%proxy, "vote references an unregistered proxy");
            return;
        }
        let forwarded = self
            .votes
            .get(proxy)
            .and_then(|v| match &v.target {
                VoteTarget::Candidates(names) => Some((names.clone(), v.vote_time_stamp)),
                // a proxy cannot delegate further
                VoteTarget::Proxy(_) => None,
            });
        if let Some((names, at)) = forwarded {
            for name in &names {
                self.shift_candidate(name, weight, at, 0);
            }
        }
    }
}
