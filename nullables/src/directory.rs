//! Nullable tenant directory.

use dac_store::{Directory, LookupError};
use dac_types::{AccountName, DacId, PermissionName, Tenant};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Tenants and account permissions registered by the test.
#[derive(Debug, Default)]
pub struct NullDirectory {
    tenants: Mutex<BTreeMap<DacId, Tenant>>,
    permissions: Mutex<BTreeSet<(AccountName, PermissionName)>>,
}

impl NullDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tenant(&self, tenant: Tenant) {
        self.tenants.lock().unwrap().insert(tenant.dac_id, tenant);
    }

    /// Make `permission` exist on `account`.
    pub fn add_permission(&self, account: AccountName, permission: PermissionName) {
        self.permissions.lock().unwrap().insert((account, permission));
    }
}

impl Directory for NullDirectory {
    fn resolve_tenant(&self, dac_id: &DacId) -> Result<Tenant, LookupError> {
        self.tenants
            .lock()
            .unwrap()
            .get(dac_id)
            .cloned()
            .ok_or_else(|| LookupError::TenantNotFound(dac_id.to_string()))
    }

    fn permission_exists(&self, account: &AccountName, permission: &PermissionName) -> bool {
        if permission.to_string() == "active" || permission.to_string() == "owner" {
            return true;
        }
        self.permissions
            .lock()
            .unwrap()
            .contains(&(*account, *permission))
    }
}
