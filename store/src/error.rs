use dac_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("state is corrupted: {0}")]
    Corruption(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Duplicate(_) => ErrorKind::Duplicate,
            StoreError::Corruption(_) => ErrorKind::Invariant,
        }
    }
}

/// Failures reported by external collaborators (directory, token ledger,
/// budget source).
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("tenant {0} not found")]
    TenantNotFound(String),

    #[error("no budget source for tenant {0}")]
    NoBudgetSource(String),

    #[error("token stats not found for {0}")]
    StatsNotFound(String),

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

impl LookupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LookupError::Unavailable(_) => ErrorKind::Invariant,
            _ => ErrorKind::NotFound,
        }
    }
}
