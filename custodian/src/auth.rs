use crate::error::CustodianError;
use dac_messages::ActionContext;
use dac_types::AccountName;

pub(crate) fn require_auth(ctx: &ActionContext<'_>, account: &AccountName) -> Result<(), CustodianError> {
    if !ctx.has_auth(account) {
        return Err(CustodianError::NotAuthorized(account.to_string()));
    }
    Ok(())
}

/// The engine's own authority.
pub(crate) fn require_contract(ctx: &ActionContext<'_>) -> Result<(), CustodianError> {
    if !ctx.is_contract() {
        return Err(CustodianError::NotAuthorized("contract".into()));
    }
    Ok(())
}

pub(crate) fn require_member(ctx: &ActionContext<'_>, account: &AccountName) -> Result<(), CustodianError> {
    if !ctx.is_member(account) {
        return Err(CustodianError::NotMember(*account));
    }
    Ok(())
}
