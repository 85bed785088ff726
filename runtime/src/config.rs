//! Runtime configuration with TOML file support.

use crate::RuntimeError;
use dac_custodian::ElectionConfig;
use dac_proposals::ProposalConfig;
use dac_types::{AccountName, DacId, ExtendedAsset, Tenant};
use dac_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Configuration for a runtime hosting one or more tenants.
///
/// Can be loaded from a TOML file via [`RuntimeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter, e.g. "info" or "debug,dac_custodian=trace".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
}

/// One tenant's directory entry and initial parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TenantConfig {
    pub tenant: Tenant,
    pub election: ElectionConfig,
    #[serde(default)]
    pub proposals: ProposalConfig,
    /// Token-ledger contents seeded into a simulated world.
    #[serde(default)]
    pub fixtures: TokenFixtures,
}

/// Balances and memberships for simulation runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFixtures {
    #[serde(default)]
    pub supply: Option<ExtendedAsset>,
    #[serde(default)]
    pub members: Vec<AccountName>,
    #[serde(default)]
    pub balances: Vec<Holding>,
    #[serde(default)]
    pub stakes: Vec<Holding>,
    /// Budget percentage in hundredths of a percent.
    #[serde(default)]
    pub budget_percentage: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub account: AccountName,
    pub quantity: ExtendedAsset,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}

impl RuntimeConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, RuntimeError> {
        let config: Self = toml::from_str(contents).map_err(|e| RuntimeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, RuntimeError> {
        toml::to_string_pretty(self).map_err(|e| RuntimeError::Config(e.to_string()))
    }

    /// Every tenant appears once and carries valid parameters.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        let mut seen = BTreeSet::new();
        for entry in &self.tenants {
            let dac_id = entry.tenant.dac_id;
            if !seen.insert(dac_id) {
                return Err(RuntimeError::Config(format!("tenant {dac_id} configured twice")));
            }
            entry.election.validate(&entry.tenant)?;
            entry.proposals.validate()?;
        }
        Ok(())
    }

    pub fn tenant(&self, dac_id: &DacId) -> Option<&TenantConfig> {
        self.tenants.iter().find(|t| t.tenant.dac_id == *dac_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
log_format = "json"

[[tenants]]
[tenants.tenant]
dac_id = "testdac"
owner = "owner"
symbol = { symbol = "4,DAC", contract = "token" }

[tenants.tenant.accounts]
TREASURY = "treasury"

[tenants.election]
lockupasset = { quantity = "0.0000 DAC", contract = "token" }
requested_pay_max = { quantity = "1000.0000 TLM", contract = "alien.worlds" }
numelected = 3
maxvotes = 3
auth_threshold_high = 2
auth_threshold_mid = 2
auth_threshold_low = 1

[tenants.fixtures]
members = ["alice", "bob"]
"#;

    #[test]
    fn parses_with_defaults() {
        let config = RuntimeConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "info");
        let tenant = config.tenant(&"testdac".parse().unwrap()).unwrap();
        assert_eq!(tenant.election.numelected, 3);
        assert_eq!(tenant.election.periodlength, 7 * 86_400);
        assert_eq!(tenant.proposals, ProposalConfig::default());
        assert_eq!(tenant.fixtures.members.len(), 2);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = RuntimeConfig::from_toml_str(SAMPLE).unwrap();
        let text = config.to_toml_string().unwrap();
        let again = RuntimeConfig::from_toml_str(&text).unwrap();
        assert_eq!(again.tenants[0].election, config.tenants[0].election);
        assert_eq!(again.tenants[0].tenant, config.tenants[0].tenant);
    }

    #[test]
    fn rejects_invalid_election_config() {
        let broken = SAMPLE.replace("maxvotes = 3", "maxvotes = 9");
        let err = RuntimeConfig::from_toml_str(&broken).unwrap_err();
        assert_eq!(err.kind(), dac_types::ErrorKind::Validation);
    }

    #[test]
    fn rejects_duplicate_tenants() {
        let mut config = RuntimeConfig::from_toml_str(SAMPLE).unwrap();
        config.tenants.push(config.tenants[0].clone());
        assert!(matches!(config.validate(), Err(RuntimeError::Config(_))));
    }
}
