//! Vote, proxy and cached-weight records.

use dac_store::{IndexDef, Record};
use dac_types::{AccountName, Timestamp};
use serde::{Deserialize, Serialize};

/// What a voter's weight currently supports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteTarget {
    Candidates(Vec<AccountName>),
    Proxy(AccountName),
}

impl VoteTarget {
    pub fn candidates(&self) -> &[AccountName] {
        match self {
            VoteTarget::Candidates(names) => names,
            VoteTarget::Proxy(_) => &[],
        }
    }

    pub fn proxy(&self) -> Option<AccountName> {
        match self {
            VoteTarget::Proxy(p) => Some(*p),
            VoteTarget::Candidates(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: AccountName,
    pub target: VoteTarget,
    pub vote_time_stamp: Timestamp,
    /// Wraps at 256.
    pub vote_count: u8,
}

impl Record for Vote {
    type Key = AccountName;

    fn primary_key(&self) -> AccountName {
        self.voter
    }

    fn indexes() -> &'static [IndexDef<Self>] {
        VOTE_INDEXES
    }
}

const VOTE_INDEXES: &[IndexDef<Vote>] = &[IndexDef {
    name: "byproxy",
    key: |v| v.target.proxy().map_or(0, |p| p.raw()) as u128,
}];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    pub proxy: AccountName,
    /// Sum of the weights of voters delegating to this proxy.
    pub total_weight: i64,
}

impl Record for Proxy {
    type Key = AccountName;

    fn primary_key(&self) -> AccountName {
        self.proxy
    }
}

/// Cached voting weight of one account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteWeight {
    pub voter: AccountName,
    pub weight: i64,
    /// Weight counted toward the election quorum.
    pub weight_quorum: i64,
}

impl Record for VoteWeight {
    type Key = AccountName;

    fn primary_key(&self) -> AccountName {
        self.voter
    }
}
