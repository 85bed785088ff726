//! Budget-percentage source.

use crate::LookupError;
use dac_types::DacId;

/// Supplies the spending budget percentage when no explicit override is set.
pub trait BudgetSource {
    /// Budget percentage in hundredths of a percent (`250` is 2.5%).
    fn budget_percentage(&self, dac_id: &DacId) -> Result<u32, LookupError>;
}
