//! Candidate lifecycle, profiles, signing permissions and the candidate whitelist.

use crate::auth::{require_auth, require_contract, require_member};
use crate::candidate::{Candidate, CandidatePermission, CandidateProfile, Custodian, WhitelistEntry};
use crate::config::ElectionConfig;
use crate::election::ElectionEngine;
use crate::error::CustodianError;
use crate::state::CustodianState;
use dac_messages::{ActionContext, InlineAction};
use dac_types::{AccountName, Asset, PermissionName};
use tracing::info;

/// Profiles and bios must stay below this many bytes.
pub const MAX_PROFILE_LEN: usize = 16_256;

pub struct CandidateRegistry;

impl CandidateRegistry {
    /// `nominatecane`: register or re-activate `cand` asking for `requestedpay`.
    pub fn nominate(
        &self,
        state: &mut CustodianState,
        ctx: &mut ActionContext<'_>,
        cand: AccountName,
        requestedpay: Asset,
    ) -> Result<(), CustodianError> {
        require_auth(ctx, &cand)?;
        require_member(ctx, &cand)?;
        if state.globals.requires_whitelist && !state.whitelist.contains(&cand) {
            return Err(CustodianError::NotWhitelisted(cand));
        }
        validate_requested_pay(state.config(), &requestedpay)?;
        validate_min_stake(state.config(), ctx, &cand)?;

        match state.candidates.get(&cand).map(|c| c.is_active) {
            Some(true) => return Err(CustodianError::AlreadyActive(cand)),
            Some(false) => {
                state.candidates.modify(&cand, |c| {
                    c.is_active = true;
                    c.requestedpay = requestedpay;
                })?;
            }
            None => state.candidates.insert(Candidate::new(cand, requestedpay))?,
        }
        state.globals.number_active_candidates += 1;
        info!(dac = %ctx.dac_id(), candidate = %cand, pay = %requestedpay, "candidate nominated");
        Ok(())
    }

    /// `nominate`: nominate with zero pay in the pay-cap currency.
    pub fn nominate_unpaid(
        &self,
        state: &mut CustodianState,
        ctx: &mut ActionContext<'_>,
        cand: AccountName,
    ) -> Result<(), CustodianError> {
        let zero = Asset::zero(state.config().requested_pay_max.quantity.symbol);
        self.nominate(state, ctx, cand, zero)
    }

    /// `withdrawcane`: the candidate must currently be active.
    pub fn withdraw(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        cand: AccountName,
    ) -> Result<(), CustodianError> {
        require_auth(ctx, &cand)?;
        let candidate = state
            .candidates
            .get(&cand)
            .ok_or(CustodianError::CandidateNotFound(cand))?;
        if !candidate.is_active {
            return Err(CustodianError::CandidateNotActive(cand));
        }
        self.disable_candidate(state, &cand)?;
        info!(dac = %ctx.dac_id(), candidate = %cand, "candidate withdrew");
        Ok(())
    }

    /// `removecand`: idempotent withdrawal.
    pub fn remove(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        cand: AccountName,
    ) -> Result<(), CustodianError> {
        require_auth(ctx, &cand)?;
        self.disable_candidate(state, &cand)?;
        Ok(())
    }

    /// Mark `cand` inactive. Returns whether anything changed; the row is kept.
    pub fn disable_candidate(
        &self,
        state: &mut CustodianState,
        cand: &AccountName,
    ) -> Result<bool, CustodianError> {
        if !state.candidates.contains(cand) {
            return Err(CustodianError::CandidateNotFound(*cand));
        }
        let was_active = state.candidates.modify(cand, |c| std::mem::replace(&mut c.is_active, false))?;
        if was_active {
            state.globals.number_active_candidates =
                state.globals.number_active_candidates.saturating_sub(1);
        }
        Ok(was_active)
    }

    /// `resigncust`: leave the serving set and recompute the signing tiers.
    pub fn resign_custodian(
        &self,
        state: &mut CustodianState,
        ctx: &mut ActionContext<'_>,
        cust: AccountName,
    ) -> Result<(), CustodianError> {
        require_auth(ctx, &cust)?;
        state
            .custodians
            .remove(&cust)
            .ok_or(CustodianError::NotCustodian(cust))?;
        state.pending_custodians.remove(&cust);
        if state.candidates.contains(&cust) {
            self.disable_candidate(state, &cust)?;
        }
        info!(dac = %ctx.dac_id(), custodian = %cust, "custodian resigned");
        ElectionEngine.set_msig_auths(state, ctx)
    }

    /// `updatereqpay`: also updates the serving row so the next pay run sees it.
    pub fn update_requested_pay(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        cand: AccountName,
        requestedpay: Asset,
    ) -> Result<(), CustodianError> {
        require_auth(ctx, &cand)?;
        if !state.candidates.contains(&cand) {
            return Err(CustodianError::CandidateNotFound(cand));
        }
        validate_requested_pay(state.config(), &requestedpay)?;
        state.candidates.modify(&cand, |c| c.requestedpay = requestedpay)?;
        if state.custodians.contains(&cand) {
            state.custodians.modify(&cand, |c| c.requestedpay = requestedpay)?;
        }
        Ok(())
    }

    /// `stprofile`
    pub fn set_profile(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        cand: AccountName,
        profile: String,
    ) -> Result<(), CustodianError> {
        let len = profile.len();
        self.store_profile(state, ctx, cand, len, move |p| p.profile = profile)
    }

    /// `updatebio`
    pub fn update_bio(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        cand: AccountName,
        bio: String,
    ) -> Result<(), CustodianError> {
        let len = bio.len();
        self.store_profile(state, ctx, cand, len, move |p| p.bio = bio)
    }

    fn store_profile(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        cand: AccountName,
        len: usize,
        update: impl FnOnce(&mut CandidateProfile),
    ) -> Result<(), CustodianError> {
        require_auth(ctx, &cand)?;
        require_member(ctx, &cand)?;
        if len >= MAX_PROFILE_LEN {
            return Err(CustodianError::ProfileTooLarge {
                len,
                max: MAX_PROFILE_LEN - 1,
            });
        }
        let mut row = state.profiles.get(&cand).cloned().unwrap_or(CandidateProfile {
            cand,
            ..Default::default()
        });
        update(&mut row);
        state.profiles.upsert(row);
        Ok(())
    }

    /// `setperm`: sign with `permission` instead of `active`.
    pub fn set_permission(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        cand: AccountName,
        permission: PermissionName,
    ) -> Result<(), CustodianError> {
        require_auth(ctx, &cand)?;
        require_member(ctx, &cand)?;
        if !ctx.collaborators.directory.permission_exists(&cand, &permission) {
            return Err(CustodianError::PermissionNotFound {
                account: cand,
                permission,
            });
        }
        if !state.candidates.contains(&cand) {
            return Err(CustodianError::CandidateNotFound(cand));
        }
        if permission == active_permission() {
            state.candidate_permissions.remove(&cand);
        } else {
            state
                .candidate_permissions
                .upsert(CandidatePermission { cand, permission });
        }
        Ok(())
    }

    /// `appointcust`: seat an initial custodian set before any election.
    pub fn appoint_custodians(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        custs: Vec<AccountName>,
    ) -> Result<(), CustodianError> {
        let owner = ctx.tenant.owner;
        require_auth(ctx, &owner)?;
        if !state.custodians.is_empty() {
            return Err(CustodianError::CustodiansNotEmpty);
        }
        let zero = Asset::zero(state.config().requested_pay_max.quantity.symbol);
        for cust in custs {
            match state.candidates.get(&cust).map(|c| c.is_active) {
                Some(true) => {}
                Some(false) => {
                    state.candidates.modify(&cust, |c| c.is_active = true)?;
                    state.globals.number_active_candidates += 1;
                }
                None => {
                    state.candidates.insert(Candidate::new(cust, zero))?;
                    state.globals.number_active_candidates += 1;
                }
            }
            let candidate = state
                .candidates
                .get(&cust)
                .ok_or(CustodianError::CandidateNotFound(cust))?;
            let custodian = Custodian::from(candidate);
            state.custodians.upsert(custodian);
        }
        info!(dac = %ctx.dac_id(), count = state.custodians.len(), "custodians appointed");
        Ok(())
    }

    // ── Whitelist ───────────────────────────────────────────────────────

    /// `addwl`: also drops `cand` from the arbiter whitelist.
    pub fn add_whitelist(
        &self,
        state: &mut CustodianState,
        ctx: &mut ActionContext<'_>,
        cand: AccountName,
        rating: u64,
    ) -> Result<(), CustodianError> {
        require_contract(ctx)?;
        if state.whitelist.contains(&cand) {
            return Err(CustodianError::WhitelistDuplicate(cand));
        }
        state.whitelist.insert(WhitelistEntry { cand, rating })?;
        ctx.schedule(InlineAction::SafeRemoveArbiter { arbiter: cand });
        Ok(())
    }

    pub fn update_whitelist(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        cand: AccountName,
        rating: u64,
    ) -> Result<(), CustodianError> {
        require_contract(ctx)?;
        if !state.whitelist.contains(&cand) {
            return Err(CustodianError::WhitelistNotFound(cand));
        }
        state.whitelist.modify(&cand, |w| w.rating = rating)?;
        Ok(())
    }

    pub fn remove_whitelist(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        cand: AccountName,
    ) -> Result<(), CustodianError> {
        require_contract(ctx)?;
        if state.candidates.contains(&cand) {
            return Err(CustodianError::RegisteredCandidate(cand));
        }
        state
            .whitelist
            .remove(&cand)
            .ok_or(CustodianError::WhitelistNotFound(cand))?;
        Ok(())
    }

    pub fn set_require_whitelist(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        required: bool,
    ) -> Result<(), CustodianError> {
        require_contract(ctx)?;
        state.globals.requires_whitelist = required;
        Ok(())
    }
}

pub(crate) fn active_permission() -> PermissionName {
    PermissionName::parse("active").unwrap_or_default()
}

/// Non-negative, in the cap currency, not above the cap.
pub fn validate_requested_pay(config: &ElectionConfig, pay: &Asset) -> Result<(), CustodianError> {
    let cap = config.requested_pay_max.quantity;
    if pay.amount < 0 {
        return Err(CustodianError::InvalidPay(format!("{pay} is negative")));
    }
    if pay.symbol != cap.symbol {
        return Err(CustodianError::InvalidPay(format!(
            "{pay} is not denominated in {}",
            cap.symbol
        )));
    }
    if pay.amount > cap.amount {
        return Err(CustodianError::PayLimitExceeded {
            requested: pay.to_string(),
            max: cap.to_string(),
        });
    }
    Ok(())
}

/// Stake amount and lock duration, checked only when a lockup is configured.
pub fn validate_min_stake(
    config: &ElectionConfig,
    ctx: &ActionContext<'_>,
    cand: &AccountName,
) -> Result<(), CustodianError> {
    let lockup = config.lockupasset;
    if lockup.quantity.amount <= 0 {
        return Ok(());
    }
    let tokens = ctx.collaborators.tokens;
    let staked = tokens.staked_amount(cand, &lockup.contract, &lockup.quantity.symbol)?;
    if staked.amount < lockup.quantity.amount {
        return Err(CustodianError::InsufficientStake {
            staked: staked.to_string(),
            required: lockup.quantity.to_string(),
        });
    }
    let lock = tokens.stake_lock_duration(cand, &ctx.dac_id())?;
    let need = config.lockup_release_time_delay as u64;
    if lock < need {
        return Err(CustodianError::StakeTimeTooShort { have: lock, need });
    }
    Ok(())
}
