//! Nullable state store: thread-safe in-memory blobs for testing.

use dac_store::{StateStore, StoreError};
use dac_types::DacId;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// An in-memory [`StateStore`] that also counts writes.
#[derive(Debug, Default)]
pub struct NullStateStore {
    blobs: Mutex<BTreeMap<DacId, Vec<u8>>>,
    saves: Mutex<usize>,
}

impl NullStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl StateStore for NullStateStore {
    fn load(&self, dac_id: &DacId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.blobs.lock().unwrap().get(dac_id).cloned())
    }

    fn save(&self, dac_id: &DacId, data: &[u8]) -> Result<(), StoreError> {
        self.blobs.lock().unwrap().insert(*dac_id, data.to_vec());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }

    fn scopes(&self) -> Result<Vec<DacId>, StoreError> {
        Ok(self.blobs.lock().unwrap().keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dac(s: &str) -> DacId {
        s.parse().unwrap()
    }

    #[test]
    fn save_then_load() {
        let store = NullStateStore::new();
        assert!(store.load(&dac("alpha")).unwrap().is_none());
        store.save(&dac("alpha"), b"state").unwrap();
        assert_eq!(store.load(&dac("alpha")).unwrap().unwrap(), b"state");
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn scopes_are_isolated() {
        let store = NullStateStore::new();
        store.save(&dac("alpha"), b"a").unwrap();
        store.save(&dac("beta"), b"b").unwrap();
        assert_eq!(store.scopes().unwrap(), vec![dac("alpha"), dac("beta")]);
        assert_eq!(store.load(&dac("beta")).unwrap().unwrap(), b"b");
    }
}
