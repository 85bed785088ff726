use crate::error::ProposalError;
use dac_custodian::CustodianRoster;
use dac_messages::ActionContext;
use dac_types::{AccountName, AccountType};

pub(crate) fn require_auth(ctx: &ActionContext<'_>, account: &AccountName) -> Result<(), ProposalError> {
    if !ctx.auth.has_auth_or_contract(account) {
        return Err(ProposalError::NotAuthorized(account.to_string()));
    }
    Ok(())
}

pub(crate) fn require_contract(ctx: &ActionContext<'_>) -> Result<(), ProposalError> {
    if !ctx.is_contract() {
        return Err(ProposalError::NotAuthorized("contract".into()));
    }
    Ok(())
}

pub(crate) fn require_custodian(
    ctx: &ActionContext<'_>,
    roster: &dyn CustodianRoster,
    account: &AccountName,
) -> Result<(), ProposalError> {
    require_auth(ctx, account)?;
    if !roster.is_custodian(account) {
        return Err(ProposalError::NotCustodian(*account));
    }
    Ok(())
}

pub(crate) fn tenant_account(ctx: &ActionContext<'_>, account_type: AccountType) -> Result<AccountName, ProposalError> {
    ctx.account_for_type(account_type)
        .ok_or(ProposalError::MissingAccount(account_type))
}
