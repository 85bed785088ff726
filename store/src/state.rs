//! Per-tenant state persistence.

use crate::StoreError;
use dac_types::DacId;

/// Stores one opaque state blob per tenant scope.
///
/// The engine loads the blob at the start of an action and writes it back
/// only when the action succeeds.
pub trait StateStore {
    /// Load the blob for a tenant, or `None` if the tenant has no state yet.
    fn load(&self, dac_id: &DacId) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the blob for a tenant.
    fn save(&self, dac_id: &DacId, data: &[u8]) -> Result<(), StoreError>;

    /// All tenant scopes with stored state.
    fn scopes(&self) -> Result<Vec<DacId>, StoreError>;
}
