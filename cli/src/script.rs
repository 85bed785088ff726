//! Action scripts: a JSON list of signed steps.

use anyhow::Context;
use dac_runtime::Action;
use dac_types::{Authorization, DacId, ErrorKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One submitted action.
///
/// ```json
/// {"signers": ["bob"], "advance": 60, "action": {"action": "votecust", "voter": "bob", "candidates": ["alice"]}}
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Step {
    /// Target tenant; defaults to the script-wide tenant.
    #[serde(default)]
    pub dac: Option<DacId>,
    #[serde(flatten)]
    pub auth: Authorization,
    /// Seconds to move the clock forward before the action runs.
    #[serde(default)]
    pub advance: u64,
    pub action: Action,
    /// The step is expected to fail with this kind.
    #[serde(default)]
    pub expect_error: Option<ErrorKind>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub dac: Option<DacId>,
    /// Clock value when the script starts, in seconds.
    #[serde(default)]
    pub start_time: Option<u64>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("reading script {}", path.display()))?;
        Self::from_json_str(&contents).with_context(|| format!("parsing script {}", path.display()))
    }

    pub fn from_json_str(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// The tenant a step runs against.
    pub fn tenant_for(&self, step: &Step) -> anyhow::Result<DacId> {
        step.dac
            .or(self.dac)
            .context("step names no tenant and the script has no default \"dac\"")
    }
}
