//! Operator bulk repairs, gated by the tenant's maintenance flag.

use crate::auth::require_contract;
use crate::error::CustodianError;
use crate::registry::CandidateRegistry;
use crate::state::CustodianState;
use crate::vote::VoteTarget;
use dac_messages::ActionContext;
use dac_types::AccountName;
use tracing::{info, warn};

pub struct Maintenance;

impl Maintenance {
    /// `maintenance`: toggle the flag. Always allowed with contract authority.
    pub fn set_mode(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        enabled: bool,
    ) -> Result<(), CustodianError> {
        require_contract(ctx)?;
        state.globals.maintenance_mode = enabled;
        warn!(dac = %ctx.dac_id(), enabled, "maintenance mode changed");
        Ok(())
    }

    fn guard(&self, state: &CustodianState, ctx: &ActionContext<'_>) -> Result<(), CustodianError> {
        require_contract(ctx)?;
        if !state.globals.maintenance_mode {
            return Err(CustodianError::MaintenanceModeOff);
        }
        Ok(())
    }

    /// `resetvotes`: drop one voter's vote and its weight.
    pub fn reset_votes(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        voter: AccountName,
    ) -> Result<(), CustodianError> {
        self.guard(state, ctx)?;
        CandidateRegistry.clear_vote(state, &voter)?;
        Ok(())
    }

    /// `collectvotes`: re-apply the cached weights of the votes in `[from, to)`.
    ///
    /// Meant to follow `resetcands` and `resetstate`, which zero what this adds.
    pub fn collect_votes(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        from: AccountName,
        to: AccountName,
    ) -> Result<usize, CustodianError> {
        self.guard(state, ctx)?;
        let votes: Vec<_> = state
            .votes
            .iter_from(&from)
            .take_while(|v| v.voter < to)
            .cloned()
            .collect();
        let mut ledger = state.ledger();
        for vote in &votes {
            // own weight only: delegators forward theirs through the proxy
            let (weight, weight_quorum) = ledger.cached_weight(&vote.voter);
            ledger.retarget(
                &vote.voter,
                None,
                Some((&vote.target, vote.vote_time_stamp)),
                weight,
                true,
            );
            ledger.adjust_totals(vote.target.candidates().len() as i64, weight_quorum);
        }
        info!(dac = %ctx.dac_id(), %from, %to, collected = votes.len(), "votes collected");
        Ok(votes.len())
    }

    /// `resetcands`: zero the vote-derived fields of every candidate.
    pub fn reset_candidates(&self, state: &mut CustodianState, ctx: &ActionContext<'_>) -> Result<(), CustodianError> {
        self.guard(state, ctx)?;
        let names: Vec<AccountName> = state.candidates.keys().copied().collect();
        for name in &names {
            state.candidates.modify(name, |c| c.reset_votes())?;
        }
        for proxy in state.proxies.keys().copied().collect::<Vec<_>>() {
            state.proxies.modify(&proxy, |p| p.total_weight = 0)?;
        }
        Ok(())
    }

    /// `resetstate`: zero the vote totals.
    pub fn reset_state(&self, state: &mut CustodianState, ctx: &ActionContext<'_>) -> Result<(), CustodianError> {
        self.guard(state, ctx)?;
        state.globals.total_weight_of_votes = 0;
        state.globals.total_votes_on_candidates = 0;
        Ok(())
    }

    /// `clearcands`
    pub fn clear_candidates(&self, state: &mut CustodianState, ctx: &ActionContext<'_>) -> Result<(), CustodianError> {
        self.guard(state, ctx)?;
        state.candidates.clear();
        state.globals.number_active_candidates = 0;
        Ok(())
    }

    /// `clearcusts`
    pub fn clear_custodians(&self, state: &mut CustodianState, ctx: &ActionContext<'_>) -> Result<(), CustodianError> {
        self.guard(state, ctx)?;
        state.custodians.clear();
        state.pending_custodians.clear();
        state.globals.pending_period_time = None;
        Ok(())
    }

    /// `clrprxvotes`: remove every vote that delegates to a proxy.
    pub fn clear_proxy_votes(&self, state: &mut CustodianState, ctx: &ActionContext<'_>) -> Result<usize, CustodianError> {
        self.guard(state, ctx)?;
        let delegators: Vec<AccountName> = state
            .votes
            .iter()
            .filter(|v| v.target.proxy().is_some())
            .map(|v| v.voter)
            .collect();
        for voter in &delegators {
            CandidateRegistry.clear_vote(state, voter)?;
        }
        Ok(delegators.len())
    }

    /// `clrproxies`: unregister every proxy.
    pub fn clear_proxies(&self, state: &mut CustodianState, ctx: &ActionContext<'_>) -> Result<usize, CustodianError> {
        self.guard(state, ctx)?;
        let proxies: Vec<AccountName> = state.proxies.keys().copied().collect();
        for proxy in &proxies {
            CandidateRegistry.drop_proxy(state, proxy)?;
        }
        Ok(proxies.len())
    }

    /// `cleanorphans`: drop references to deleted candidates from the votes
    /// in `[from, to)`.
    pub fn clean_orphans(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        from: AccountName,
        to: AccountName,
    ) -> Result<usize, CustodianError> {
        self.guard(state, ctx)?;
        let mut repaired = Vec::new();
        for vote in state.votes.iter_from(&from).take_while(|v| v.voter < to) {
            if let VoteTarget::Candidates(names) = &vote.target {
                let kept: Vec<AccountName> = names
                    .iter()
                    .copied()
                    .filter(|n| state.candidates.contains(n))
                    .collect();
                if kept.len() != names.len() {
                    let dropped = names.len() - kept.len();
                    repaired.push((vote.voter, kept, dropped));
                }
            }
        }
        let mut dropped_links = 0;
        for (voter, kept, dropped) in &repaired {
            let kept = kept.clone();
            state.votes.modify(voter, |v| v.target = VoteTarget::Candidates(kept))?;
            dropped_links += *dropped as i64;
        }
        state.ledger().adjust_totals(-dropped_links, 0);
        info!(dac = %ctx.dac_id(), repaired = repaired.len(), "orphaned vote references removed");
        Ok(repaired.len())
    }

    /// `migraterank`: recompute every candidate rank from its vote fields.
    pub fn recompute_ranks(&self, state: &mut CustodianState, ctx: &ActionContext<'_>) -> Result<(), CustodianError> {
        self.guard(state, ctx)?;
        let names: Vec<AccountName> = state.candidates.keys().copied().collect();
        for name in &names {
            state.candidates.modify(name, |c| c.update_index())?;
        }
        Ok(())
    }

    /// `clearrank`: mark every candidate as unranked until the next recompute.
    pub fn clear_ranks(&self, state: &mut CustodianState, ctx: &ActionContext<'_>) -> Result<(), CustodianError> {
        self.guard(state, ctx)?;
        let names: Vec<AccountName> = state.candidates.keys().copied().collect();
        for name in &names {
            state.candidates.modify(name, |c| c.rank = u64::MAX)?;
        }
        Ok(())
    }
}
