//! Notifications pushed into the engine by the token ledger.

use dac_types::{AccountName, Asset};
use serde::{Deserialize, Serialize};

/// A change in an account's liquid balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalanceDelta {
    pub account: AccountName,
    pub balance_delta: Asset,
}

/// A change in an account's staked balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStakeDelta {
    pub account: AccountName,
    pub stake_delta: Asset,
    #[serde(default)]
    pub unstake_delay: u64,
}

/// A change in an account's vote weight.
///
/// `weight_delta` moves candidate support; `weight_delta_quorum` moves the
/// engagement total used by the election quorum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountWeightDelta {
    pub account: AccountName,
    pub weight_delta: i64,
    pub weight_delta_quorum: i64,
}
