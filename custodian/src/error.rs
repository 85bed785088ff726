use dac_store::{LookupError, StoreError};
use dac_types::{AccountName, AccountType, ErrorKind, PermissionName, TypesError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CustodianError {
    #[error("missing authority of {0}")]
    NotAuthorized(String),

    #[error("{0} is not a registered member")]
    NotMember(AccountName),

    #[error("{0} is not on the candidate whitelist")]
    NotWhitelisted(AccountName),

    #[error("invalid requested pay: {0}")]
    InvalidPay(String),

    #[error("requested pay {requested} exceeds the maximum {max}")]
    PayLimitExceeded { requested: String, max: String },

    #[error("insufficient stake: {staked} staked, {required} required")]
    InsufficientStake { staked: String, required: String },

    #[error("stake lock of {have}s is shorter than the required {need}s")]
    StakeTimeTooShort { have: u64, need: u64 },

    #[error("unstaking would leave candidate {account} with {staked}, below the required {required}")]
    StakeBelowLockup {
        account: AccountName,
        staked: String,
        required: String,
    },

    #[error("candidate {0} is already registered and active")]
    AlreadyActive(AccountName),

    #[error("candidate {0} not found")]
    CandidateNotFound(AccountName),

    #[error("candidate {0} is not active")]
    CandidateNotActive(AccountName),

    #[error("{0} is not a custodian")]
    NotCustodian(AccountName),

    #[error("custodians are already appointed")]
    CustodiansNotEmpty,

    #[error("profile of {len} bytes exceeds the {max} byte limit")]
    ProfileTooLarge { len: usize, max: usize },

    #[error("permission {permission} does not exist on {account}")]
    PermissionNotFound {
        account: AccountName,
        permission: PermissionName,
    },

    #[error("{0} is already whitelisted")]
    WhitelistDuplicate(AccountName),

    #[error("{0} is not whitelisted")]
    WhitelistNotFound(AccountName),

    #[error("{0} is a registered candidate")]
    RegisteredCandidate(AccountName),

    #[error("too many votes: {have} > {max}")]
    TooManyVotes { have: usize, max: u8 },

    #[error("duplicate vote for {0}")]
    DuplicateVote(AccountName),

    #[error("{0} has no vote")]
    NoVote(AccountName),

    #[error("{0} is not a registered proxy")]
    ProxyNotRegistered(AccountName),

    #[error("{0} is already a registered proxy")]
    ProxyAlreadyRegistered(AccountName),

    #[error("cannot vote for yourself as proxy")]
    ProxySelfVote,

    #[error("{0} is a registered proxy and cannot delegate its vote")]
    ProxyCannotDelegate(AccountName),

    #[error("{0} delegates to a proxy; remove that vote first")]
    DelegatingVoterCannotProxy(AccountName),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("period has not elapsed: {elapsed}s of {required}s")]
    PeriodNotElapsed { elapsed: u64, required: u64 },

    #[error("pending period delay has not elapsed: {elapsed}s of {required}s")]
    PendingPeriodNotElapsed { elapsed: u64, required: u64 },

    #[error("token supply {supply} does not exceed the threshold {threshold}")]
    TokenSupplyTooLow { supply: i64, threshold: u64 },

    #[error("voter engagement {engagement:.4}% does not exceed the {required}% quorum")]
    EngagementTooLow { engagement: f64, required: u32 },

    #[error("only {have} candidates with votes, {need} seats to fill")]
    NotEnoughCandidates { have: usize, need: u8 },

    #[error("permission {permission} needs weight {need}, custodians provide {have}")]
    AuthThresholdUnreachable {
        permission: PermissionName,
        have: usize,
        need: u32,
    },

    #[error("budget already claimed for this period")]
    BudgetAlreadyClaimed,

    #[error("tenant has no {0} account")]
    MissingAccount(AccountType),

    #[error("pending pay {0} not found")]
    PayNotFound(u64),

    #[error("maintenance mode is off")]
    MaintenanceModeOff,

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl CustodianError {
    pub fn kind(&self) -> ErrorKind {
        use CustodianError::*;
        match self {
            NotAuthorized(_) => ErrorKind::NotAuthorized,
            NotMember(_)
            | NotWhitelisted(_)
            | InvalidPay(_)
            | PayLimitExceeded { .. }
            | InsufficientStake { .. }
            | StakeTimeTooShort { .. }
            | StakeBelowLockup { .. }
            | ProfileTooLarge { .. }
            | TooManyVotes { .. }
            | DuplicateVote(_)
            | ProxySelfVote
            | InvalidConfig(_) => ErrorKind::Validation,
            CandidateNotFound(_)
            | NotCustodian(_)
            | PermissionNotFound { .. }
            | WhitelistNotFound(_)
            | NoVote(_)
            | ProxyNotRegistered(_)
            | MissingAccount(_)
            | PayNotFound(_) => ErrorKind::NotFound,
            AlreadyActive(_) | WhitelistDuplicate(_) | ProxyAlreadyRegistered(_) => {
                ErrorKind::Duplicate
            }
            CandidateNotActive(_)
            | CustodiansNotEmpty
            | RegisteredCandidate(_)
            | ProxyCannotDelegate(_)
            | DelegatingVoterCannotProxy(_)
            | PeriodNotElapsed { .. }
            | PendingPeriodNotElapsed { .. }
            | BudgetAlreadyClaimed
            | MaintenanceModeOff => ErrorKind::StateConflict,
            TokenSupplyTooLow { .. } | EngagementTooLow { .. } | AuthThresholdUnreachable { .. } => {
                ErrorKind::InsufficientSupport
            }
            NotEnoughCandidates { .. } => ErrorKind::InsufficientCandidates,
            Types(e) => e.kind(),
            Store(e) => e.kind(),
            Lookup(e) => e.kind(),
        }
    }
}
