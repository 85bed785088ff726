//! Signer sets attached to every action.

use crate::name::AccountName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The accounts that authorized an action.
///
/// `contract` marks the engine's own authority: inline follow-up actions and
/// operator maintenance run with it set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    #[serde(default)]
    pub signers: BTreeSet<AccountName>,
    #[serde(default)]
    pub contract: bool,
}

impl Authorization {
    /// No signers at all. Housekeeping actions accept this.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_by(account: AccountName) -> Self {
        Self {
            signers: BTreeSet::from([account]),
            contract: false,
        }
    }

    /// The engine's own authority.
    pub fn contract() -> Self {
        Self {
            signers: BTreeSet::new(),
            contract: true,
        }
    }

    pub fn with_signer(mut self, account: AccountName) -> Self {
        self.signers.insert(account);
        self
    }

    pub fn has_auth(&self, account: &AccountName) -> bool {
        self.signers.contains(account)
    }

    pub fn is_contract(&self) -> bool {
        self.contract
    }

    /// Either the account itself or the engine's own authority signed.
    pub fn has_auth_or_contract(&self, account: &AccountName) -> bool {
        self.contract || self.has_auth(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_authority_is_not_a_signer() {
        let alice: AccountName = "alice".parse().unwrap();
        let auth = Authorization::contract();
        assert!(!auth.has_auth(&alice));
        assert!(auth.has_auth_or_contract(&alice));
    }

    #[test]
    fn signer_set() {
        let alice: AccountName = "alice".parse().unwrap();
        let bob: AccountName = "bob".parse().unwrap();
        let auth = Authorization::signed_by(alice).with_signer(bob);
        assert!(auth.has_auth(&alice));
        assert!(auth.has_auth(&bob));
        assert!(!auth.is_contract());
    }
}
