//! Worker proposals.
//!
//! A whitelisted member proposes paid work with a named arbiter. Custodians
//! approve it to start (the pay moves from the treasury into escrow), approve
//! it again once delivered (the escrow releases), or leave the arbiter to
//! settle a dispute. Custodians may hand their vote to another custodian per
//! proposal or per category.

mod auth;
pub mod config;
pub mod deposits;
pub mod engine;
pub mod error;
pub mod proposal;
pub mod state;
pub mod tally;
pub mod voting;
pub mod whitelist;

#[cfg(test)]
mod test_support;

pub use config::ProposalConfig;
pub use engine::{NewProposal, ProposalEngine};
pub use error::ProposalError;
pub use proposal::{
    Ballot, Deposit, Proposal, ProposalStatus, ProposalVote, PublicVote, VoteScope, VoteType, Whitelisted,
};
pub use state::ProposalState;
pub use whitelist::WhitelistKind;
