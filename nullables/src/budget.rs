//! Nullable budget-percentage source.

use dac_store::{BudgetSource, LookupError};
use dac_types::DacId;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Fixed budget percentages per tenant. Unknown tenants have no source.
#[derive(Debug, Default)]
pub struct NullBudgetSource {
    percentages: Mutex<BTreeMap<DacId, u32>>,
}

impl NullBudgetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, dac_id: DacId, basis_points: u32) {
        self.percentages.lock().unwrap().insert(dac_id, basis_points);
    }
}

impl BudgetSource for NullBudgetSource {
    fn budget_percentage(&self, dac_id: &DacId) -> Result<u32, LookupError> {
        self.percentages
            .lock()
            .unwrap()
            .get(dac_id)
            .copied()
            .ok_or_else(|| LookupError::NoBudgetSource(dac_id.to_string()))
    }
}
