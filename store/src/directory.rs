//! Tenant directory lookups.

use crate::LookupError;
use dac_types::{AccountName, DacId, PermissionName, Tenant};

/// Read access to the DAC directory and to account permissions.
pub trait Directory {
    /// Resolve a tenant's directory entry.
    fn resolve_tenant(&self, dac_id: &DacId) -> Result<Tenant, LookupError>;

    /// Whether `permission` exists on `account`.
    fn permission_exists(&self, account: &AccountName, permission: &PermissionName) -> bool;
}
