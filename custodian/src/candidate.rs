//! Candidate and custodian records, and the decayed ranking index.

use dac_store::{IndexDef, Record};
use dac_types::{AccountName, Asset, PermissionName, Timestamp};
use serde::{Deserialize, Serialize};

/// Seconds of vote recency worth one doubling of vote power.
pub const SECONDS_TO_DOUBLE: f64 = 2_592_000.0;
const RANK_SCALE: f64 = 10_000.0;

/// `(log2(power + 1) + avg / SECONDS_TO_DOUBLE) * 10000`.
pub fn decayed_index(total_vote_power: u64, avg_vote_time_stamp: Timestamp) -> u64 {
    let raw = ((total_vote_power as f64 + 1.0).log2()
        + avg_vote_time_stamp.as_secs() as f64 / SECONDS_TO_DOUBLE)
        * RANK_SCALE;
    // float-to-int casts saturate
    raw as u64
}

/// Ascending rank key: lower is better.
pub fn rank_for(total_vote_power: u64, avg_vote_time_stamp: Timestamp) -> u64 {
    u64::MAX - decayed_index(total_vote_power, avg_vote_time_stamp)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub candidate_name: AccountName,
    pub requestedpay: Asset,
    pub rank: u64,
    pub total_vote_power: u64,
    pub is_active: bool,
    pub number_voters: u32,
    pub avg_vote_time_stamp: Timestamp,
    pub running_weight_time: u128,
}

impl Candidate {
    pub fn new(candidate_name: AccountName, requestedpay: Asset) -> Self {
        Self {
            candidate_name,
            requestedpay,
            rank: rank_for(0, Timestamp::EPOCH),
            total_vote_power: 0,
            is_active: true,
            number_voters: 0,
            avg_vote_time_stamp: Timestamp::EPOCH,
            running_weight_time: 0,
        }
    }

    pub fn update_index(&mut self) {
        self.rank = rank_for(self.total_vote_power, self.avg_vote_time_stamp);
    }

    /// Add (or with a negative `weight`, remove) support cast at `at`.
    ///
    /// The average vote time is the weight-averaged timestamp of the support
    /// still held. Power and the accumulator never go below zero.
    pub fn apply_weight(&mut self, weight: i64, at: Timestamp) {
        let running = self.running_weight_time as i128 + at.as_secs() as i128 * weight as i128;
        let power = self.total_vote_power as i128 + weight as i128;
        self.total_vote_power = power.clamp(0, u64::MAX as i128) as u64;
        if self.total_vote_power == 0 {
            self.running_weight_time = 0;
            self.avg_vote_time_stamp = Timestamp::EPOCH;
        } else {
            let running = running.max(0);
            self.running_weight_time = running as u128;
            let avg = running / self.total_vote_power as i128;
            self.avg_vote_time_stamp = Timestamp::new(avg.clamp(0, u64::MAX as i128) as u64);
        }
        self.update_index();
    }

    /// Zero every vote-derived field.
    pub fn reset_votes(&mut self) {
        self.total_vote_power = 0;
        self.number_voters = 0;
        self.avg_vote_time_stamp = Timestamp::EPOCH;
        self.running_weight_time = 0;
        self.update_index();
    }
}

impl Record for Candidate {
    type Key = AccountName;

    fn primary_key(&self) -> AccountName {
        self.candidate_name
    }

    fn indexes() -> &'static [IndexDef<Self>] {
        CANDIDATE_INDEXES
    }
}

const CANDIDATE_INDEXES: &[IndexDef<Candidate>] = &[
    IndexDef {
        name: "byvotes",
        key: |c| c.total_vote_power as u128,
    },
    IndexDef {
        name: "byvotesrank",
        key: |c| (u64::MAX - c.total_vote_power) as u128,
    },
    IndexDef {
        name: "byreqpay",
        key: |c| c.requestedpay.amount.max(0) as u128,
    },
    IndexDef {
        name: "bydecayed",
        key: |c| c.rank as u128,
    },
];

/// A serving (or pending) custodian: the candidate fields frozen at selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Custodian {
    pub cust_name: AccountName,
    pub requestedpay: Asset,
    pub total_vote_power: u64,
    pub rank: u64,
    pub number_voters: u32,
    pub avg_vote_time_stamp: Timestamp,
}

impl From<&Candidate> for Custodian {
    fn from(c: &Candidate) -> Self {
        Self {
            cust_name: c.candidate_name,
            requestedpay: c.requestedpay,
            total_vote_power: c.total_vote_power,
            rank: c.rank,
            number_voters: c.number_voters,
            avg_vote_time_stamp: c.avg_vote_time_stamp,
        }
    }
}

impl Record for Custodian {
    type Key = AccountName;

    fn primary_key(&self) -> AccountName {
        self.cust_name
    }

    fn indexes() -> &'static [IndexDef<Self>] {
        CUSTODIAN_INDEXES
    }
}

const CUSTODIAN_INDEXES: &[IndexDef<Custodian>] = &[
    IndexDef {
        name: "byvotesrank",
        key: |c| (u64::MAX - c.total_vote_power) as u128,
    },
    IndexDef {
        name: "byreqpay",
        key: |c| c.requestedpay.amount.max(0) as u128,
    },
    IndexDef {
        name: "bydecayed",
        key: |c| c.rank as u128,
    },
];

/// Permission a custodian signs with, when not `active`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePermission {
    pub cand: AccountName,
    pub permission: PermissionName,
}

impl Record for CandidatePermission {
    type Key = AccountName;

    fn primary_key(&self) -> AccountName {
        self.cand
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub cand: AccountName,
    pub rating: u64,
}

impl Record for WhitelistEntry {
    type Key = AccountName;

    fn primary_key(&self) -> AccountName {
        self.cand
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub cand: AccountName,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub bio: String,
}

impl Record for CandidateProfile {
    type Key = AccountName;

    fn primary_key(&self) -> AccountName {
        self.cand
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dac_types::Symbol;

    fn cand(name: &str) -> Candidate {
        Candidate::new(name.parse().unwrap(), Asset::zero(Symbol::new("TLM", 4).unwrap()))
    }

    // ── Decayed index ───────────────────────────────────────────────────

    #[test]
    fn zero_support_ranks_last() {
        assert_eq!(decayed_index(0, Timestamp::EPOCH), 0);
        assert_eq!(rank_for(0, Timestamp::EPOCH), u64::MAX);
    }

    #[test]
    fn more_power_ranks_better() {
        let t = Timestamp::new(1_700_000_000);
        assert!(rank_for(1_000, t) < rank_for(10, t));
    }

    #[test]
    fn more_recent_ranks_better() {
        let early = Timestamp::new(1_700_000_000);
        let late = early.plus_secs(SECONDS_TO_DOUBLE as u64);
        assert!(rank_for(100, late) < rank_for(100, early));
        // one doubling of recency matches one doubling of power
        let a = decayed_index(2 * 100 + 1, early);
        let b = decayed_index(100, late);
        assert!(a.abs_diff(b) <= 1);
    }

    // ── Weight application ──────────────────────────────────────────────

    #[test]
    fn average_is_weighted() {
        let mut c = cand("alice");
        c.apply_weight(100, Timestamp::new(1_000));
        c.apply_weight(300, Timestamp::new(2_000));
        assert_eq!(c.total_vote_power, 400);
        assert_eq!(c.avg_vote_time_stamp, Timestamp::new(1_750));

        c.apply_weight(-300, Timestamp::new(2_000));
        assert_eq!(c.avg_vote_time_stamp, Timestamp::new(1_000));
    }

    #[test]
    fn removal_clamps_and_resets() {
        let mut c = cand("alice");
        c.apply_weight(50, Timestamp::new(1_000));
        c.apply_weight(-80, Timestamp::new(1_000));
        assert_eq!(c.total_vote_power, 0);
        assert_eq!(c.running_weight_time, 0);
        assert_eq!(c.avg_vote_time_stamp, Timestamp::EPOCH);
        assert_eq!(c.rank, u64::MAX);
    }
}
