//! Per-action execution context handed to every engine operation.

use crate::outbound::{InlineAction, Outbox, OutboundAction};
use dac_store::{BudgetSource, Directory, TokenLedger};
use dac_types::{AccountName, AccountType, Authorization, DacId, ExtendedAsset, Tenant, Timestamp};

/// Read-only access to the external collaborators.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub directory: &'a dyn Directory,
    pub tokens: &'a dyn TokenLedger,
    pub budget: &'a dyn BudgetSource,
}

/// Everything an operation may consult besides tenant state.
pub struct ActionContext<'a> {
    pub tenant: &'a Tenant,
    pub now: Timestamp,
    pub auth: &'a Authorization,
    pub collaborators: Collaborators<'a>,
    pub outbox: &'a mut Outbox,
}

impl<'a> ActionContext<'a> {
    pub fn dac_id(&self) -> DacId {
        self.tenant.dac_id
    }

    pub fn has_auth(&self, account: &AccountName) -> bool {
        self.auth.has_auth(account)
    }

    pub fn is_contract(&self) -> bool {
        self.auth.is_contract()
    }

    pub fn account_for_type(&self, account_type: AccountType) -> Option<AccountName> {
        self.tenant.account_for_type(account_type)
    }

    /// Whether `account` is a member of this tenant's token community.
    pub fn is_member(&self, account: &AccountName) -> bool {
        self.collaborators
            .tokens
            .is_member(account, &self.tenant.symbol.contract)
    }

    pub fn emit(&mut self, action: OutboundAction) {
        self.outbox.push(action);
    }

    pub fn transfer(
        &mut self,
        from: AccountName,
        to: AccountName,
        quantity: ExtendedAsset,
        memo: impl Into<String>,
    ) {
        self.outbox.transfer(from, to, quantity, memo);
    }

    pub fn schedule(&mut self, action: InlineAction) {
        self.outbox.schedule(action);
    }

    /// Run `f` with the engine's own authority added to the current signers,
    /// sharing this action's clock and outbox.
    pub fn with_contract_authority<T>(&mut self, f: impl FnOnce(&mut ActionContext<'_>) -> T) -> T {
        let auth = Authorization {
            signers: self.auth.signers.clone(),
            contract: true,
        };
        let mut inner = ActionContext {
            tenant: self.tenant,
            now: self.now,
            auth: &auth,
            collaborators: self.collaborators,
            outbox: &mut *self.outbox,
        };
        f(&mut inner)
    }
}
