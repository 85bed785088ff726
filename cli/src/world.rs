//! A simulated chain seeded from the config's token fixtures.

use dac_messages::MessageKind;
use dac_nullables::{NullBudgetSource, NullClock, NullDirectory, NullStateStore, NullTokenLedger, RecordingHandler};
use dac_runtime::{DacRuntime, RuntimeConfig};
use std::sync::Arc;
use tracing::debug;

pub struct SimWorld {
    pub runtime: DacRuntime,
    pub clock: Arc<NullClock>,
    pub tokens: Arc<NullTokenLedger>,
    pub messages: Arc<RecordingHandler>,
}

impl SimWorld {
    /// Register every configured tenant, seed its fixtures and initialise
    /// its state.
    pub fn from_config(config: &RuntimeConfig, start_time: u64) -> anyhow::Result<Self> {
        let directory = Arc::new(NullDirectory::new());
        let tokens = Arc::new(NullTokenLedger::new());
        let budget = Arc::new(NullBudgetSource::new());
        let clock = Arc::new(NullClock::new(start_time));
        let messages = Arc::new(RecordingHandler::new());

        for tenant in &config.tenants {
            let dac_id = tenant.tenant.dac_id;
            directory.add_tenant(tenant.tenant.clone());
            let fixtures = &tenant.fixtures;
            if let Some(supply) = fixtures.supply {
                tokens.set_supply(supply);
            }
            for member in &fixtures.members {
                tokens.add_member(*member, tenant.tenant.symbol.contract);
            }
            for holding in &fixtures.balances {
                tokens.set_balance(holding.account, holding.quantity);
            }
            for holding in &fixtures.stakes {
                tokens.set_stake(holding.account, holding.quantity);
                tokens.set_lock_duration(holding.account, dac_id, tenant.election.lockup_release_time_delay as u64);
            }
            if let Some(bp) = fixtures.budget_percentage {
                budget.set(dac_id, bp);
            }
            debug!(dac = %dac_id, members = fixtures.members.len(), "fixtures seeded");
        }

        let mut runtime = DacRuntime::new(
            Arc::new(NullStateStore::new()),
            directory,
            tokens.clone(),
            budget,
            clock.clone(),
        );
        runtime.register_handler(MessageKind::Transfer, tokens.clone());
        for kind in [
            MessageKind::Transfer,
            MessageKind::UpdatePermission,
            MessageKind::GovernanceChanged,
            MessageKind::AssertUnlock,
        ] {
            runtime.register_handler(kind, messages.clone());
        }
        runtime.init_from_config(config)?;

        Ok(Self {
            runtime,
            clock,
            tokens,
            messages,
        })
    }
}
