use crate::proposal::ProposalStatus;
use dac_escrow::EscrowError;
use dac_store::StoreError;
use dac_types::{AccountName, AccountType, ErrorKind, TypesError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProposalError {
    #[error("missing authority of {0}")]
    NotAuthorized(String),

    #[error("{0} is not a registered member")]
    NotMember(AccountName),

    #[error("{0} is not a current custodian")]
    NotCustodian(AccountName),

    #[error("{0} is not on the receiver whitelist")]
    ReceiverNotWhitelisted(AccountName),

    #[error("{0} is not on the arbiter whitelist")]
    ArbiterNotWhitelisted(AccountName),

    #[error("the proposer cannot arbitrate their own proposal")]
    ArbiterIsProposer,

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("invalid pay: {0}")]
    InvalidPay(String),

    #[error("proposal {0} already exists")]
    AlreadyExists(AccountName),

    #[error("proposal {0} not found")]
    NotFound(AccountName),

    #[error("proposal {id} is {state}, cannot {action}")]
    WrongState {
        id: AccountName,
        state: ProposalStatus,
        action: &'static str,
    },

    #[error("proposal {0} has expired")]
    Expired(AccountName),

    #[error("proposal {0} has not expired")]
    NotExpired(AccountName),

    #[error("cannot delegate to yourself")]
    SelfDelegation,

    #[error("no delegation by {voter} for category {category}")]
    DelegationNotFound { voter: AccountName, category: u16 },

    #[error("arbiter has not agreed to proposal {0}")]
    ArbiterNotAgreed(AccountName),

    #[error("{0} is not the arbiter of this proposal")]
    NotArbiter(AccountName),

    #[error("insufficient votes: {have} of {need}")]
    InsufficientVotes { have: u32, need: u32 },

    #[error("proposal has run {elapsed}s of the required {required}s")]
    MinDurationNotMet { elapsed: u64, required: u64 },

    #[error("proposal {0} has an escrow; cancel the work in progress instead")]
    EscrowExists(AccountName),

    #[error("proposal {0} has no escrow")]
    NoEscrow(AccountName),

    #[error("deposit of {account} is {have}, {need} required")]
    InsufficientDeposit {
        account: AccountName,
        have: String,
        need: String,
    },

    #[error("no deposit for {0}")]
    DepositNotFound(AccountName),

    #[error("{0} is already whitelisted")]
    WhitelistDuplicate(AccountName),

    #[error("{0} is not whitelisted")]
    WhitelistNotFound(AccountName),

    #[error("{0} arbitrates a live proposal")]
    ArbiterBusy(AccountName),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("tenant has no {0} account")]
    MissingAccount(AccountType),

    #[error(transparent)]
    Escrow(#[from] EscrowError),

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ProposalError {
    pub fn kind(&self) -> ErrorKind {
        use ProposalError::*;
        match self {
            NotAuthorized(_) | NotCustodian(_) | NotArbiter(_) => ErrorKind::NotAuthorized,
            NotMember(_)
            | ReceiverNotWhitelisted(_)
            | ArbiterNotWhitelisted(_)
            | ArbiterIsProposer
            | InvalidField { .. }
            | InvalidPay(_)
            | SelfDelegation
            | InsufficientDeposit { .. }
            | InvalidConfig(_) => ErrorKind::Validation,
            AlreadyExists(_) | WhitelistDuplicate(_) => ErrorKind::Duplicate,
            NotFound(_)
            | DelegationNotFound { .. }
            | DepositNotFound(_)
            | WhitelistNotFound(_)
            | MissingAccount(_) => ErrorKind::NotFound,
            WrongState { .. }
            | Expired(_)
            | NotExpired(_)
            | ArbiterNotAgreed(_)
            | MinDurationNotMet { .. }
            | EscrowExists(_)
            | NoEscrow(_)
            | ArbiterBusy(_) => ErrorKind::StateConflict,
            InsufficientVotes { .. } => ErrorKind::InsufficientSupport,
            Escrow(e) => e.kind(),
            Types(e) => e.kind(),
            Store(e) => e.kind(),
        }
    }
}
