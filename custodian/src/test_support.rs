//! Shared fixtures for the engine unit tests.

use crate::config::ElectionConfig;
use crate::state::CustodianState;
use dac_messages::{ActionContext, Outbox, OutboundAction};
use dac_nullables::NullWorld;
use dac_types::{
    AccountName, AccountType, Asset, Authorization, ExtendedAsset, ExtendedSymbol, Symbol, Tenant,
    Timestamp,
};
use std::collections::BTreeMap;

pub fn name(s: &str) -> AccountName {
    s.parse().unwrap()
}

pub fn dac_symbol() -> Symbol {
    Symbol::new("DAC", 4).unwrap()
}

pub fn tlm_symbol() -> Symbol {
    Symbol::new("TLM", 4).unwrap()
}

pub fn tlm(amount: i64) -> Asset {
    Asset::new(amount, tlm_symbol())
}

pub fn ext_tlm(amount: i64) -> ExtendedAsset {
    ExtendedAsset::new(tlm(amount), name("alien.worlds"))
}

pub fn ext_dac(amount: i64) -> ExtendedAsset {
    ExtendedAsset::new(Asset::new(amount, dac_symbol()), name("token"))
}

pub fn signed(account: &str) -> Authorization {
    Authorization::signed_by(name(account))
}

/// Three seats, up to three votes each, tiers 2/2/1, pay cap 1000 TLM.
pub fn small_config() -> ElectionConfig {
    let mut config = ElectionConfig::new(ext_dac(0), ext_tlm(10_000_000));
    config.numelected = 3;
    config.maxvotes = 3;
    config.auth_threshold_high = 2;
    config.auth_threshold_mid = 2;
    config.auth_threshold_low = 1;
    config
}

pub struct Harness {
    pub world: NullWorld,
    pub tenant: Tenant,
    pub state: CustodianState,
    pub now: Timestamp,
    pub outbox: Outbox,
}

impl Harness {
    pub fn new() -> Self {
        let tenant = Tenant {
            dac_id: name("testdac"),
            owner: name("owner"),
            title: "Test DAC".into(),
            symbol: ExtendedSymbol::new(dac_symbol(), name("token")),
            accounts: BTreeMap::new(),
        }
        .with_account(AccountType::Treasury, name("treasury"));
        Self {
            world: NullWorld::new(),
            tenant,
            state: CustodianState::new(small_config()),
            now: Timestamp::new(1_000_000),
            outbox: Outbox::new(),
        }
    }

    pub fn members(&self, accounts: &[&str]) {
        for account in accounts {
            self.world.tokens.add_member(name(account), name("token"));
        }
    }

    /// Give `voter` a cached weight (and the same quorum weight).
    pub fn weight(&mut self, voter: &str, weight: i64) {
        self.state.ledger().apply_weight_delta(name(voter), weight, weight);
    }

    pub fn advance(&mut self, secs: u64) {
        self.now = self.now.plus_secs(secs);
    }

    pub fn run<T>(
        &mut self,
        auth: Authorization,
        f: impl FnOnce(&mut CustodianState, &mut ActionContext<'_>) -> T,
    ) -> T {
        let Harness {
            world,
            tenant,
            state,
            now,
            outbox,
        } = self;
        let mut ctx = world.context(tenant, *now, &auth, outbox);
        f(state, &mut ctx)
    }

    pub fn sent(&mut self) -> Vec<OutboundAction> {
        self.outbox.drain()
    }

    pub fn power(&self, cand: &str) -> u64 {
        self.state.candidates.get(&name(cand)).unwrap().total_vote_power
    }
}
