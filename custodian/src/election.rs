//! Period state machine.
//!
//! ```text
//! Steady --(periodlength elapsed, quorum met)--> Pending   prepare_custodians
//! Pending --(pending delay elapsed, quorum met)--> Steady  pay, allocate, tiers
//! ```
//!
//! `newperiod` is the public entry point; it re-dispatches itself as
//! `runnewperiod` with the engine's own authority.

use crate::auth::{require_auth, require_contract};
use crate::candidate::Custodian;
use crate::config::ElectionConfig;
use crate::error::CustodianError;
use crate::state::CustodianState;
use dac_messages::{ActionContext, InlineAction, OutboundAction};
use dac_types::{AccountType, ExtendedAsset};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub struct ElectionEngine;

/// Where a tenant's election cycle stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodPhase {
    Steady,
    Pending,
}

/// Configuration changes, one per setter action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfigUpdate {
    /// `updateconfige`
    Replace { config: ElectionConfig },
    /// `setlockasset`
    LockAsset { asset: ExtendedAsset },
    /// `setdaogov`
    DaoGov {
        maxvotes: u8,
        numelected: u8,
        threshold: u8,
    },
    /// `setperiodlen`
    PeriodLength { seconds: u32 },
    /// `setpenddelay`
    PendingDelay { seconds: u32 },
    /// `setpayvia`
    PayVia { via_service: bool },
    /// `setinitvote`
    InitialVoteQuorum { percent: u32 },
    /// `setvotequor`
    VoteQuorum { percent: u32 },
    /// `setlockdelay`
    LockDelay { seconds: u32 },
    /// `setpaymax`
    PayMax { max: ExtendedAsset },
    /// `settokensup`
    TokenSupplyThreshold { threshold: u64 },
}

impl ElectionEngine {
    pub fn phase(&self, state: &CustodianState) -> PeriodPhase {
        if state.globals.period_is_pending() {
            PeriodPhase::Pending
        } else {
            PeriodPhase::Steady
        }
    }

    /// `newperiod`: anyone may call; the activation account must sign when
    /// the tenant has one.
    pub fn new_period(
        &self,
        ctx: &mut ActionContext<'_>,
        message: String,
    ) -> Result<(), CustodianError> {
        if let Some(activation) = ctx.account_for_type(AccountType::Activation) {
            require_auth(ctx, &activation)?;
        }
        debug!(dac = %ctx.dac_id(), "new period requested");
        ctx.schedule(InlineAction::RunNewPeriod { message });
        Ok(())
    }

    /// `runnewperiod`: advance the period state machine by one step.
    pub fn run_new_period(
        &self,
        state: &mut CustodianState,
        ctx: &mut ActionContext<'_>,
        message: &str,
    ) -> Result<(), CustodianError> {
        let owner = ctx.tenant.owner;
        if !ctx.is_contract() && !ctx.has_auth(&owner) {
            return Err(CustodianError::NotAuthorized(owner.to_string()));
        }
        let dac_id = ctx.dac_id();

        match ctx.account_for_type(AccountType::Activation) {
            Some(activation_account) => {
                require_auth(ctx, &activation_account)?;
                ctx.emit(OutboundAction::AssertUnlock {
                    activation_account,
                    dac_id,
                });
            }
            None => self.check_quorum(state, ctx)?,
        }
        state.globals.met_initial_votes_threshold = true;

        let config = state.config().clone();
        match state.globals.pending_period_time {
            None => {
                let elapsed = state.globals.lastperiodtime.elapsed_since(ctx.now);
                if elapsed <= config.periodlength as u64 {
                    return Err(CustodianError::PeriodNotElapsed {
                        elapsed,
                        required: config.periodlength as u64,
                    });
                }
                self.prepare_custodians(state, ctx)?;
                state.globals.pending_period_time = Some(ctx.now);
                info!(dac = %dac_id, %message, "election prepared, custodians pending");
            }
            Some(pending_since) => {
                let elapsed = pending_since.elapsed_since(ctx.now);
                if elapsed < config.pending_period_delay as u64 {
                    return Err(CustodianError::PendingPeriodNotElapsed {
                        elapsed,
                        required: config.pending_period_delay as u64,
                    });
                }
                self.distribute_mean_pay(state, ctx)?;
                self.allocate_custodians(state, ctx)?;
                self.set_msig_auths(state, ctx)?;
                state.globals.lastperiodtime = ctx.now;
                info!(dac = %dac_id, %message, "new period started");
            }
        }
        Ok(())
    }

    /// Supply must exceed the threshold and engagement must exceed the quorum
    /// (the initial quorum until it has been met once).
    fn check_quorum(&self, state: &CustodianState, ctx: &ActionContext<'_>) -> Result<(), CustodianError> {
        let config = state.config();
        let token = &ctx.tenant.symbol;
        let supply = ctx
            .collaborators
            .tokens
            .total_supply(&token.contract, &token.symbol)?;
        if supply.amount <= 0 || (supply.amount as u64) <= config.token_supply_threshold {
            return Err(CustodianError::TokenSupplyTooLow {
                supply: supply.amount,
                threshold: config.token_supply_threshold,
            });
        }
        let engagement = state.globals.total_weight_of_votes as f64 / supply.amount as f64 * 100.0;
        if !state.globals.met_initial_votes_threshold
            && engagement <= config.initial_vote_quorum_percent as f64
        {
            return Err(CustodianError::EngagementTooLow {
                engagement,
                required: config.initial_vote_quorum_percent,
            });
        }
        if engagement <= config.vote_quorum_percent as f64 {
            return Err(CustodianError::EngagementTooLow {
                engagement,
                required: config.vote_quorum_percent,
            });
        }
        Ok(())
    }

    /// Select the top `numelected` active candidates by decayed rank.
    pub fn prepare_custodians(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
    ) -> Result<(), CustodianError> {
        let need = state.config().numelected;
        let mut selected: Vec<Custodian> = Vec::with_capacity(need as usize);
        for cand in state.candidates.by_index("bydecayed")? {
            if selected.len() == need as usize {
                break;
            }
            if !cand.is_active {
                continue;
            }
            // zero support sorts last, so nothing eligible follows
            if cand.total_vote_power == 0 {
                break;
            }
            selected.push(Custodian::from(cand));
        }
        if selected.len() < need as usize {
            return Err(CustodianError::NotEnoughCandidates {
                have: selected.len(),
                need,
            });
        }
        state.pending_custodians.clear();
        for custodian in selected {
            debug!(dac = %ctx.dac_id(), custodian = %custodian.cust_name, rank = custodian.rank, "custodian selected");
            state.pending_custodians.insert(custodian)?;
        }
        Ok(())
    }

    /// Swap the pending set in as the serving set.
    pub fn allocate_custodians(
        &self,
        state: &mut CustodianState,
        ctx: &mut ActionContext<'_>,
    ) -> Result<(), CustodianError> {
        let new_custodians = state
            .pending_custodians
            .keys()
            .filter(|name| !state.custodians.contains(name))
            .count() as u32;

        state.custodians.clear();
        for pending in state.pending_custodians.iter() {
            state.custodians.insert(pending.clone())?;
        }
        state.pending_custodians.clear();
        state.globals.pending_period_time = None;

        let dac_id = ctx.dac_id();
        info!(dac = %dac_id, serving = state.custodians.len(), new = new_custodians, "custodians allocated");
        if new_custodians >= state.config().auth_threshold_high as u32 {
            ctx.emit(OutboundAction::GovernanceChanged {
                dac_id,
                new_custodians,
            });
        }
        Ok(())
    }

    pub fn update_config(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        update: ConfigUpdate,
    ) -> Result<(), CustodianError> {
        require_contract(ctx)?;
        let tenant = ctx.tenant;
        let config = &mut state.globals.config;
        match update {
            ConfigUpdate::Replace { config: replacement } => {
                replacement.validate(tenant)?;
                *config = replacement;
            }
            ConfigUpdate::LockAsset { asset } => config.set_lock_asset(asset, tenant)?,
            ConfigUpdate::DaoGov {
                maxvotes,
                numelected,
                threshold,
            } => config.set_dao_gov(maxvotes, numelected, threshold)?,
            ConfigUpdate::PeriodLength { seconds } => config.set_period_length(seconds)?,
            ConfigUpdate::PendingDelay { seconds } => config.set_pending_delay(seconds)?,
            ConfigUpdate::PayVia { via_service } => config.set_pay_via(via_service, tenant)?,
            ConfigUpdate::InitialVoteQuorum { percent } => config.set_initial_vote_quorum(percent)?,
            ConfigUpdate::VoteQuorum { percent } => config.set_vote_quorum(percent)?,
            ConfigUpdate::LockDelay { seconds } => config.set_lock_delay(seconds)?,
            ConfigUpdate::PayMax { max } => config.set_pay_max(max)?,
            ConfigUpdate::TokenSupplyThreshold { threshold } => {
                config.set_token_supply_threshold(threshold)?
            }
        }
        info!(dac = %ctx.dac_id(), "election config updated");
        Ok(())
    }
}
