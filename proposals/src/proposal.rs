//! Proposal, vote, deposit and whitelist records.

use dac_store::{combine_ids, IndexDef, Record};
use dac_types::{AccountName, ExtendedAsset, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a worker proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    #[serde(rename = "pendingappr")]
    PendingApproval,
    /// Enough approval votes to start work.
    #[serde(rename = "apprvtes")]
    HasEnoughApprovalVotes,
    #[serde(rename = "inprogress")]
    WorkInProgress,
    #[serde(rename = "pendingfin")]
    PendingFinalize,
    /// Enough finalize votes to release payment.
    #[serde(rename = "apprfinvtes")]
    HasEnoughFinalizeVotes,
    #[serde(rename = "expired")]
    Expired,
    #[serde(rename = "indispute")]
    InDispute,
    #[serde(rename = "completed")]
    Completed,
}

impl ProposalStatus {
    pub fn name(&self) -> &'static str {
        match self {
            ProposalStatus::PendingApproval => "pendingappr",
            ProposalStatus::HasEnoughApprovalVotes => "apprvtes",
            ProposalStatus::WorkInProgress => "inprogress",
            ProposalStatus::PendingFinalize => "pendingfin",
            ProposalStatus::HasEnoughFinalizeVotes => "apprfinvtes",
            ProposalStatus::Expired => "expired",
            ProposalStatus::InDispute => "indispute",
            ProposalStatus::Completed => "completed",
        }
    }

    /// Waiting for custodian approval to start.
    pub fn is_approval_phase(&self) -> bool {
        matches!(
            self,
            ProposalStatus::PendingApproval | ProposalStatus::HasEnoughApprovalVotes
        )
    }

    /// Work delivered, waiting for custodian sign-off.
    pub fn is_finalize_phase(&self) -> bool {
        matches!(
            self,
            ProposalStatus::PendingFinalize | ProposalStatus::HasEnoughFinalizeVotes
        )
    }

    /// Still holds, or may come to hold, an arbiter's attention.
    pub fn is_live(&self) -> bool {
        !matches!(self, ProposalStatus::Expired | ProposalStatus::Completed)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposal_id: AccountName,
    pub proposer: AccountName,
    pub arbiter: AccountName,
    pub title: String,
    pub summary: String,
    pub content_hash: String,
    pub proposal_pay: ExtendedAsset,
    pub arbiter_pay: ExtendedAsset,
    pub arbiter_agreed: bool,
    pub state: ProposalStatus,
    pub expiry: Timestamp,
    pub created_at: Timestamp,
    /// Seconds the proposer has to deliver once work starts.
    pub job_duration: u32,
    pub category: u16,
}

impl Proposal {
    pub fn has_expired(&self, now: Timestamp) -> bool {
        now >= self.expiry
    }
}

impl Record for Proposal {
    type Key = AccountName;

    fn primary_key(&self) -> AccountName {
        self.proposal_id
    }

    fn indexes() -> &'static [IndexDef<Self>] {
        PROPOSAL_INDEXES
    }
}

const PROPOSAL_INDEXES: &[IndexDef<Proposal>] = &[
    IndexDef {
        name: "proposer",
        key: |p| p.proposer.raw() as u128,
    },
    IndexDef {
        name: "arbiter",
        key: |p| p.arbiter.raw() as u128,
    },
    IndexDef {
        name: "category",
        key: |p| p.category as u128,
    },
];

/// Internal vote values. Which pair applies depends on the proposal phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteType {
    #[serde(rename = "propapprove")]
    ProposalApprove,
    #[serde(rename = "propdeny")]
    ProposalDeny,
    #[serde(rename = "finalapprove")]
    FinalizeApprove,
    #[serde(rename = "finaldeny")]
    FinalizeDeny,
}

/// Vote values custodians submit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicVote {
    Approve,
    Deny,
    /// Withdraw any vote or delegation on the proposal.
    Abstain,
}

/// What a proposal-vote row applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteScope {
    Proposal(AccountName),
    Category(u16),
}

/// Either a vote cast by the row's voter or a hand-off to another custodian.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ballot {
    Vote(VoteType),
    Delegate(AccountName),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalVote {
    pub vote_id: u64,
    pub voter: AccountName,
    pub scope: VoteScope,
    pub ballot: Ballot,
    #[serde(default)]
    pub comment_hash: Option<String>,
}

impl ProposalVote {
    fn proposal_key(&self) -> u64 {
        match self.scope {
            VoteScope::Proposal(id) => id.raw(),
            VoteScope::Category(_) => 0,
        }
    }

    fn category_key(&self) -> u64 {
        match self.scope {
            VoteScope::Category(category) => category as u64,
            VoteScope::Proposal(_) => u64::MAX,
        }
    }
}

impl Record for ProposalVote {
    type Key = u64;

    fn primary_key(&self) -> u64 {
        self.vote_id
    }

    fn indexes() -> &'static [IndexDef<Self>] {
        VOTE_INDEXES
    }
}

const VOTE_INDEXES: &[IndexDef<ProposalVote>] = &[
    IndexDef {
        name: "voter",
        key: |v| v.voter.raw() as u128,
    },
    IndexDef {
        name: "proposal",
        key: |v| v.proposal_key() as u128,
    },
    IndexDef {
        name: "category",
        key: |v| v.category_key() as u128,
    },
    IndexDef {
        name: "propandvoter",
        key: |v| combine_ids(v.proposal_key(), v.voter.raw()),
    },
    IndexDef {
        name: "catandvoter",
        key: |v| combine_ids(v.category_key(), v.voter.raw()),
    },
];

/// Tokens an account has sent to the proposals account, held against fees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub account: AccountName,
    pub deposit: ExtendedAsset,
}

impl Record for Deposit {
    type Key = AccountName;

    fn primary_key(&self) -> AccountName {
        self.account
    }
}

/// An arbiter or receiver approved to take part in proposals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Whitelisted {
    pub account: AccountName,
    pub rating: u64,
}

impl Record for Whitelisted {
    type Key = AccountName;

    fn primary_key(&self) -> AccountName {
        self.account
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_to_short_names() {
        let json = serde_json::to_string(&ProposalStatus::HasEnoughFinalizeVotes).unwrap();
        assert_eq!(json, "\"apprfinvtes\"");
        let back: ProposalStatus = serde_json::from_str("\"indispute\"").unwrap();
        assert_eq!(back, ProposalStatus::InDispute);
        assert_eq!(ProposalStatus::WorkInProgress.to_string(), "inprogress");
    }

    #[test]
    fn phases() {
        assert!(ProposalStatus::HasEnoughApprovalVotes.is_approval_phase());
        assert!(!ProposalStatus::WorkInProgress.is_approval_phase());
        assert!(ProposalStatus::PendingFinalize.is_finalize_phase());
        assert!(ProposalStatus::InDispute.is_live());
        assert!(!ProposalStatus::Completed.is_live());
    }
}
