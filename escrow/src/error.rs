use dac_store::StoreError;
use dac_types::{AccountName, AccountType, ErrorKind, TypesError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EscrowError {
    #[error("missing authority of {0}")]
    NotAuthorized(String),

    #[error("{0} may not approve this escrow")]
    NotParty(AccountName),

    #[error("only the arbiter may disapprove")]
    NotArbiter,

    #[error("invalid parties: {0}")]
    InvalidParties(&'static str),

    #[error("expiry {expires} is not after {now}")]
    ExpiryInPast { expires: u64, now: u64 },

    #[error("escrow {0} already exists")]
    AlreadyExists(AccountName),

    #[error("escrow {0} not found")]
    NotFound(AccountName),

    #[error("invalid funding memo: {0}")]
    InvalidMemo(String),

    #[error("funding memo names tenant {0}")]
    WrongTenant(AccountName),

    #[error("funding amount must be positive, got {0}")]
    InvalidAmount(String),

    #[error("escrow {0} has not been funded")]
    NotFunded(AccountName),

    #[error("escrow {0} holds funds and cannot be cancelled")]
    Funded(AccountName),

    #[error("escrow {key} already holds the {leg} payment")]
    AlreadyFunded { key: AccountName, leg: &'static str },

    #[error("escrow {0} is disputed and only the arbiter may rule")]
    Disputed(AccountName),

    #[error("escrow {0} is not disputed")]
    NotDisputed(AccountName),

    #[error("escrow {key} has not expired, {remaining}s left")]
    NotExpired { key: AccountName, remaining: u64 },

    #[error("tenant has no {0} account")]
    MissingAccount(AccountType),

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EscrowError {
    pub fn kind(&self) -> ErrorKind {
        use EscrowError::*;
        match self {
            NotAuthorized(_) | NotParty(_) | NotArbiter => ErrorKind::NotAuthorized,
            InvalidParties(_)
            | ExpiryInPast { .. }
            | InvalidMemo(_)
            | WrongTenant(_)
            | InvalidAmount(_) => ErrorKind::Validation,
            AlreadyExists(_) => ErrorKind::Duplicate,
            NotFound(_) | MissingAccount(_) => ErrorKind::NotFound,
            NotFunded(_) | Funded(_) | Disputed(_) | NotDisputed(_) | NotExpired { .. } => {
                ErrorKind::StateConflict
            }
            AlreadyFunded { .. } => ErrorKind::Invariant,
            Types(e) => e.kind(),
            Store(e) => e.kind(),
        }
    }
}
