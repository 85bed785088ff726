//! Treasury budget settings and the once-per-period `claimbudget` split.
//!
//! The optional settings resolve to a [`BudgetStrategy`]. Fixed amounts win
//! whenever either one is configured; they ramp down pro rata when the treasury
//! cannot cover both. Otherwise both shares are percentages of the same
//! treasury balance, each capped by what is still left to move. The
//! spending percentage comes from the override or, failing that, the tenant's
//! [`BudgetSource`](dac_store::BudgetSource).

use crate::auth::{require_auth, require_contract};
use crate::election::ElectionEngine;
use crate::error::CustodianError;
use crate::state::CustodianState;
use dac_messages::ActionContext;
use dac_types::{AccountType, Asset, ExtendedAsset};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Allocations below this many whole tokens are rounded up to it.
pub const MIN_BUDGET_TRANSFER_TOKENS: i64 = 10;
/// Raw units always left in the treasury.
pub const TREASURY_DUST: i64 = 1;
/// Percentages are in hundredths of a percent.
pub const BASIS_POINTS: u32 = 10_000;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSettings {
    /// Spending share override.
    #[serde(default)]
    pub budget_percentage: Option<u32>,
    #[serde(default)]
    pub prop_budget_percentage: Option<u32>,
    #[serde(default)]
    pub prop_budget_amount: Option<Asset>,
    #[serde(default)]
    pub spendings_budget_amount: Option<Asset>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BudgetStrategy {
    Fixed {
        prop: Option<Asset>,
        spendings: Option<Asset>,
    },
    Percentage {
        prop_bp: Option<u32>,
        spend_bp: Option<u32>,
    },
}

impl BudgetSettings {
    pub fn strategy(&self) -> BudgetStrategy {
        if self.prop_budget_amount.is_some() || self.spendings_budget_amount.is_some() {
            BudgetStrategy::Fixed {
                prop: self.prop_budget_amount,
                spendings: self.spendings_budget_amount,
            }
        } else {
            BudgetStrategy::Percentage {
                prop_bp: self.prop_budget_percentage,
                spend_bp: self.budget_percentage,
            }
        }
    }
}

/// Changes to [`BudgetSettings`], one per setter action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum BudgetUpdate {
    SpendPercentage(u32),
    PropPercentage(u32),
    PropAmount(Asset),
    SpendAmount(Asset),
    Unset,
}

/// Raw amounts to move out of the treasury.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetPlan {
    pub prop: i64,
    pub spendings: i64,
}

/// Split `treasury` according to `strategy`.
///
/// `spend_bp` is consulted only in percentage mode without an override.
pub fn plan_budget(
    strategy: &BudgetStrategy,
    treasury: Asset,
    spend_bp: impl FnOnce() -> Result<u32, CustodianError>,
) -> Result<BudgetPlan, CustodianError> {
    let available = treasury.amount.saturating_sub(TREASURY_DUST);
    if available <= 0 {
        return Ok(BudgetPlan::default());
    }
    match strategy {
        BudgetStrategy::Fixed { prop, spendings } => {
            let zero = Asset::zero(treasury.symbol);
            let prop = zero.checked_add(prop.unwrap_or(zero))?.amount.max(0);
            let spendings = zero.checked_add(spendings.unwrap_or(zero))?.amount.max(0);
            let total = prop as i128 + spendings as i128;
            if total <= available as i128 {
                return Ok(BudgetPlan { prop, spendings });
            }
            // ramp down
            Ok(BudgetPlan {
                prop: (prop as i128 * available as i128 / total) as i64,
                spendings: (spendings as i128 * available as i128 / total) as i64,
            })
        }
        BudgetStrategy::Percentage { prop_bp, spend_bp: override_bp } => {
            let min = MIN_BUDGET_TRANSFER_TOKENS.saturating_mul(treasury.symbol.unit());
            let prop = match prop_bp {
                Some(bp) => allocate(treasury.amount, *bp, min, available),
                None => 0,
            };
            let remaining = available - prop;
            let bp = match override_bp {
                Some(bp) => *bp,
                None => spend_bp()?,
            };
            let spendings = allocate(treasury.amount, bp, min, remaining);
            Ok(BudgetPlan { prop, spendings })
        }
    }
}

fn allocate(base: i64, bp: u32, min: i64, cap: i64) -> i64 {
    let share = base as i128 * bp as i128 / BASIS_POINTS as i128;
    if share <= 0 || cap <= 0 {
        return 0;
    }
    (share.min(i64::MAX as i128) as i64).max(min).min(cap)
}

impl ElectionEngine {
    /// Move this period's budget out of the treasury.
    pub fn claim_budget(
        &self,
        state: &mut CustodianState,
        ctx: &mut ActionContext<'_>,
    ) -> Result<BudgetPlan, CustodianError> {
        let owner = ctx.tenant.owner;
        require_auth(ctx, &owner)?;
        let globals = &state.globals;
        if globals.lastclaimbudgettime >= globals.lastperiodtime {
            return Err(CustodianError::BudgetAlreadyClaimed);
        }
        let treasury_account = ctx
            .account_for_type(AccountType::Treasury)
            .ok_or(CustodianError::MissingAccount(AccountType::Treasury))?;
        let token = globals.config.requested_pay_max;
        let symbol = token.quantity.symbol;
        let treasury = ctx
            .collaborators
            .tokens
            .balance_of(&treasury_account, &token.contract, &symbol)?;

        let dac_id = ctx.dac_id();
        let source = ctx.collaborators.budget;
        let plan = plan_budget(&globals.budget.strategy(), treasury, || {
            Ok(source.budget_percentage(&dac_id)?)
        })?;

        if plan.prop > 0 {
            let prop_funds = ctx
                .account_for_type(AccountType::PropFunds)
                .ok_or(CustodianError::MissingAccount(AccountType::PropFunds))?;
            let quantity = ExtendedAsset::new(Asset::new(plan.prop, symbol), token.contract);
            ctx.transfer(treasury_account, prop_funds, quantity, "period proposal budget");
        }
        if plan.spendings > 0 {
            let spendings = ctx.account_for_type(AccountType::Spendings).unwrap_or(owner);
            let quantity = ExtendedAsset::new(Asset::new(plan.spendings, symbol), token.contract);
            ctx.transfer(treasury_account, spendings, quantity, "period budget");
        }
        state.globals.lastclaimbudgettime = ctx.now;
        info!(
            dac = %dac_id,
            treasury = %treasury,
            prop = plan.prop,
            spendings = plan.spendings,
            "budget claimed"
        );
        Ok(plan)
    }

    pub fn update_budget(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        update: BudgetUpdate,
    ) -> Result<(), CustodianError> {
        require_contract(ctx)?;
        let pay_symbol = state.globals.config.requested_pay_max.quantity.symbol;
        let budget = &mut state.globals.budget;
        match update {
            BudgetUpdate::SpendPercentage(bp) => budget.budget_percentage = Some(check_bp(bp)?),
            BudgetUpdate::PropPercentage(bp) => budget.prop_budget_percentage = Some(check_bp(bp)?),
            BudgetUpdate::PropAmount(amount) => {
                budget.prop_budget_amount = Some(check_amount(amount, pay_symbol)?)
            }
            BudgetUpdate::SpendAmount(amount) => {
                budget.spendings_budget_amount = Some(check_amount(amount, pay_symbol)?)
            }
            BudgetUpdate::Unset => *budget = BudgetSettings::default(),
        }
        Ok(())
    }
}

fn check_bp(bp: u32) -> Result<u32, CustodianError> {
    if bp > BASIS_POINTS {
        return Err(CustodianError::InvalidConfig(format!(
            "budget percentage {bp} exceeds {BASIS_POINTS}"
        )));
    }
    Ok(bp)
}

fn check_amount(amount: Asset, symbol: dac_types::Symbol) -> Result<Asset, CustodianError> {
    if amount.symbol != symbol || amount.amount < 0 {
        return Err(CustodianError::InvalidConfig(format!(
            "budget amount {amount} must be a non-negative {symbol} quantity"
        )));
    }
    Ok(amount)
}


#[cfg(test)]
mod claim_tests {
    use super::*;
    use crate::test_support::*;
    use dac_messages::OutboundAction;
    use dac_types::{Authorization, ErrorKind, Timestamp};

    fn funded() -> Harness {
        let mut h = Harness::new();
        h.tenant = h
            .tenant
            .clone()
            .with_account(AccountType::PropFunds, name("propfunds"));
        h.world.tokens.set_balance(name("treasury"), ext_tlm(10_000_000_000));
        h.world.budget.set(name("testdac"), 500);
        h.state.globals.lastperiodtime = Timestamp::new(900_000);
        h
    }

    #[test]
    fn claim_splits_treasury() {
        let mut h = funded();
        h.run(Authorization::contract(), |s, ctx| {
            ElectionEngine.update_budget(s, ctx, BudgetUpdate::PropPercentage(1_000))
        })
        .unwrap();
        let plan = h
            .run(signed("owner"), |s, ctx| ElectionEngine.claim_budget(s, ctx))
            .unwrap();
        assert_eq!(plan, BudgetPlan { prop: 1_000_000_000, spendings: 500_000_000 });
        let sent = h.sent();
        assert_eq!(sent.len(), 2);
        assert!(matches!(
            &sent[0],
            OutboundAction::Transfer { to, memo, .. }
                if *to == name("propfunds") && memo == "period proposal budget"
        ));
        // no SPENDINGS account: the owner receives the spending share
        assert!(matches!(
            &sent[1],
            OutboundAction::Transfer { to, memo, .. } if *to == name("owner") && memo == "period budget"
        ));
        assert_eq!(h.state.globals.lastclaimbudgettime, h.now);
    }

    #[test]
    fn second_claim_in_a_period_fails() {
        let mut h = funded();
        h.run(signed("owner"), |s, ctx| ElectionEngine.claim_budget(s, ctx))
            .unwrap();
        let err = h
            .run(signed("owner"), |s, ctx| ElectionEngine.claim_budget(s, ctx))
            .unwrap_err();
        assert!(matches!(err, CustodianError::BudgetAlreadyClaimed));
        assert_eq!(err.kind(), ErrorKind::StateConflict);

        // a new period opens the next claim
        h.advance(10);
        h.state.globals.lastperiodtime = h.now;
        h.advance(10);
        h.run(signed("owner"), |s, ctx| ElectionEngine.claim_budget(s, ctx))
            .unwrap();
    }

    #[test]
    fn claim_needs_owner() {
        let mut h = funded();
        let err = h
            .run(signed("mallory"), |s, ctx| ElectionEngine.claim_budget(s, ctx))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
    }

    #[test]
    fn budget_settings_are_validated() {
        let mut h = funded();
        let contract = Authorization::contract;
        let err = h
            .run(contract(), |s, ctx| {
                ElectionEngine.update_budget(s, ctx, BudgetUpdate::SpendPercentage(10_001))
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = h
            .run(contract(), |s, ctx| {
                ElectionEngine.update_budget(s, ctx, BudgetUpdate::PropAmount(ext_dac(5).quantity))
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        h.run(contract(), |s, ctx| {
            ElectionEngine.update_budget(s, ctx, BudgetUpdate::SpendAmount(tlm(100)))
        })
        .unwrap();
        assert!(matches!(
            h.state.globals.budget.strategy(),
            BudgetStrategy::Fixed { spendings: Some(_), .. }
        ));
        h.run(contract(), |s, ctx| ElectionEngine.update_budget(s, ctx, BudgetUpdate::Unset))
            .unwrap();
        assert_eq!(h.state.globals.budget, BudgetSettings::default());
    }
}
