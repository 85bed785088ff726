use dac_custodian::CustodianError;
use dac_escrow::EscrowError;
use dac_proposals::ProposalError;
use dac_store::{LookupError, StoreError};
use dac_types::{AccountName, DacId, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Custodian(#[from] CustodianError),

    #[error(transparent)]
    Escrow(#[from] EscrowError),

    #[error(transparent)]
    Proposal(#[from] ProposalError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("tenant {0} has no state; initialise it first")]
    UnknownTenant(DacId),

    #[error("tenant {0} is already initialised")]
    TenantExists(DacId),

    #[error("transfer to {0} is not addressed to the escrow or proposals account")]
    UnroutedTransfer(AccountName),

    #[error("state codec error: {0}")]
    Codec(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::Custodian(e) => e.kind(),
            RuntimeError::Escrow(e) => e.kind(),
            RuntimeError::Proposal(e) => e.kind(),
            RuntimeError::Store(e) => e.kind(),
            RuntimeError::Lookup(e) => e.kind(),
            RuntimeError::UnknownTenant(_) => ErrorKind::NotFound,
            RuntimeError::TenantExists(_) => ErrorKind::Duplicate,
            RuntimeError::UnroutedTransfer(_) | RuntimeError::Config(_) => ErrorKind::Validation,
            RuntimeError::Codec(_) | RuntimeError::Io(_) => ErrorKind::Invariant,
        }
    }
}

impl From<bincode::Error> for RuntimeError {
    fn from(e: bincode::Error) -> Self {
        RuntimeError::Codec(e.to_string())
    }
}
