//! Tiered signing authority derived from the serving custodian set.
//!
//! | tier   | parent   | threshold             |
//! |--------|----------|-----------------------|
//! | `high` | `active` | `auth_threshold_high` |
//! | `med`  | `high`   | `auth_threshold_mid`  |
//! | `low`  | `med`    | `auth_threshold_low`  |
//! | `one`  | `low`    | 1                     |

use crate::election::ElectionEngine;
use crate::error::CustodianError;
use crate::registry::active_permission;
use crate::state::CustodianState;
use dac_messages::{ActionContext, OutboundAction, PermissionLevelWeight};
use dac_types::{AccountType, PermissionName};
use tracing::{debug, info};

/// One permission tier to publish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthTier {
    pub permission: PermissionName,
    pub parent: PermissionName,
    pub threshold: u32,
}

fn perm(name: &str) -> PermissionName {
    PermissionName::parse(name).unwrap_or_default()
}

pub fn auth_tiers(state: &CustodianState) -> [AuthTier; 4] {
    let config = state.config();
    [
        AuthTier {
            permission: perm("high"),
            parent: active_permission(),
            threshold: config.auth_threshold_high as u32,
        },
        AuthTier {
            permission: perm("med"),
            parent: perm("high"),
            threshold: config.auth_threshold_mid as u32,
        },
        AuthTier {
            permission: perm("low"),
            parent: perm("med"),
            threshold: config.auth_threshold_low as u32,
        },
        AuthTier {
            permission: perm("one"),
            parent: perm("low"),
            threshold: 1,
        },
    ]
}

impl ElectionEngine {
    /// Publish every tier for the current custodians. Does nothing while
    /// no custodian serves.
    pub fn set_msig_auths(
        &self,
        state: &CustodianState,
        ctx: &mut ActionContext<'_>,
    ) -> Result<(), CustodianError> {
        if state.custodians.is_empty() {
            debug!(dac = %ctx.dac_id(), "no custodians, authority tiers unchanged");
            return Ok(());
        }
        let mut signers: Vec<PermissionLevelWeight> = state
            .custodians
            .keys()
            .map(|actor| PermissionLevelWeight {
                actor: *actor,
                permission: state
                    .candidate_permissions
                    .get(actor)
                    .map_or_else(active_permission, |p| p.permission),
                weight: 1,
            })
            .collect();
        signers.sort_by(|a, b| a.actor.cmp(&b.actor));

        let owned = ctx.account_for_type(AccountType::MsigOwned);
        let account = owned.unwrap_or(ctx.tenant.owner);
        let msig = owned.and(ctx.account_for_type(AccountType::Msig));

        for tier in auth_tiers(state) {
            let mut weights = signers.clone();
            match msig {
                Some(msig) => {
                    let weight = u16::try_from(tier.threshold).map_err(|_| {
                        CustodianError::InvalidConfig(format!("threshold {} too large", tier.threshold))
                    })?;
                    weights.push(PermissionLevelWeight {
                        actor: msig,
                        permission: active_permission(),
                        weight,
                    });
                    weights.sort_by(|a, b| a.actor.cmp(&b.actor));
                }
                None if signers.len() < tier.threshold as usize => {
                    return Err(CustodianError::AuthThresholdUnreachable {
                        permission: tier.permission,
                        have: signers.len(),
                        need: tier.threshold,
                    });
                }
                None => {}
            }
            ctx.emit(OutboundAction::UpdatePermission {
                account,
                permission: tier.permission,
                parent: tier.parent,
                threshold: tier.threshold,
                weights,
            });
        }
        info!(dac = %ctx.dac_id(), %account, custodians = signers.len(), "authority tiers updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{Candidate, CandidatePermission, Custodian};
    use crate::test_support::*;
    use dac_types::{AccountName, ErrorKind};

    fn seat(h: &mut Harness, names: &[&str]) {
        for n in names {
            let custodian = Custodian::from(&Candidate::new(name(n), tlm(0)));
            h.state.custodians.upsert(custodian);
        }
    }

    fn updates(h: &mut Harness) -> Vec<(AccountName, PermissionName, PermissionName, u32, Vec<PermissionLevelWeight>)> {
        h.sent()
            .into_iter()
            .filter_map(|m| match m {
                OutboundAction::UpdatePermission {
                    account,
                    permission,
                    parent,
                    threshold,
                    weights,
                } => Some((account, permission, parent, threshold, weights)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn nothing_emitted_without_custodians() {
        let mut h = Harness::new();
        h.run(signed("owner"), |s, ctx| ElectionEngine.set_msig_auths(s, ctx))
            .unwrap();
        assert!(h.sent().is_empty());
    }

    #[test]
    fn tiers_cascade_on_the_owner() {
        let mut h = Harness::new();
        seat(&mut h, &["carol", "alice", "bob"]);
        h.state.candidate_permissions.upsert(CandidatePermission {
            cand: name("bob"),
            permission: name("custodian"),
        });
        h.run(signed("owner"), |s, ctx| ElectionEngine.set_msig_auths(s, ctx))
            .unwrap();
        let tiers = updates(&mut h);
        let shape: Vec<(String, String, u32)> = tiers
            .iter()
            .map(|(_, p, parent, t, _)| (p.to_string(), parent.to_string(), *t))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("high".into(), "active".into(), 2),
                ("med".into(), "high".into(), 2),
                ("low".into(), "med".into(), 1),
                ("one".into(), "low".into(), 1),
            ]
        );
        let (account, _, _, _, weights) = &tiers[0];
        assert_eq!(*account, name("owner"));
        let actors: Vec<AccountName> = weights.iter().map(|w| w.actor).collect();
        assert_eq!(actors, vec![name("alice"), name("bob"), name("carol")]);
        assert_eq!(weights[1].permission, name("custodian"));
        assert!(weights.iter().all(|w| w.weight == 1));
    }

    #[test]
    fn msig_owned_account_gets_msig_signer() {
        let mut h = Harness::new();
        h.tenant = h
            .tenant
            .clone()
            .with_account(AccountType::MsigOwned, name("dao.owned"))
            .with_account(AccountType::Msig, name("dao.msig"));
        seat(&mut h, &["alice"]);
        h.run(signed("owner"), |s, ctx| ElectionEngine.set_msig_auths(s, ctx))
            .unwrap();
        let tiers = updates(&mut h);
        assert_eq!(tiers.len(), 4);
        let (account, _, _, threshold, weights) = &tiers[0];
        assert_eq!(*account, name("dao.owned"));
        let msig = weights.iter().find(|w| w.actor == name("dao.msig")).unwrap();
        assert_eq!(msig.weight as u32, *threshold);
    }

    #[test]
    fn unreachable_threshold_fails() {
        let mut h = Harness::new();
        seat(&mut h, &["alice"]);
        let err = h
            .run(signed("owner"), |s, ctx| ElectionEngine.set_msig_auths(s, ctx))
            .unwrap_err();
        assert!(matches!(err, CustodianError::AuthThresholdUnreachable { have: 1, need: 2, .. }));
        assert_eq!(err.kind(), ErrorKind::InsufficientSupport);
    }

    #[test]
    fn tier_table_follows_config() {
        let h = Harness::new();
        let tiers = auth_tiers(&h.state);
        assert_eq!(tiers[0].threshold, 2);
        assert_eq!(tiers[2].threshold, 1);
        assert_eq!(tiers[3].parent, perm("low"));
    }
}
