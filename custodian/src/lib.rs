//! Custodian elections for a DAC tenant.
//!
//! Members vote for candidates directly or through a proxy. Vote weight flows
//! into each candidate's decayed rank, a composite of support and recency. Every
//! period the top-ranked active candidates are selected, held pending for a
//! short delay, then seated as custodians: the outgoing set is paid the mean of
//! their requested pay and the tiered signing permissions are rebuilt.
//!
//! Engines are stateless unit structs operating on a [`CustodianState`] with an
//! [`ActionContext`](dac_messages::ActionContext) carrying the caller's
//! authority, the clock and the outbox.

mod auth;
pub mod budget;
pub mod candidate;
pub mod config;
pub mod election;
pub mod error;
pub mod globals;
pub mod ledger;
pub mod maintenance;
pub mod observers;
pub mod pay;
pub mod permissions;
pub mod registry;
pub mod state;
pub mod vote;
mod voting;

#[cfg(test)]
mod test_support;

pub use budget::{BudgetPlan, BudgetSettings, BudgetStrategy, BudgetUpdate};
pub use candidate::{Candidate, Custodian};
pub use config::ElectionConfig;
pub use election::{ConfigUpdate, ElectionEngine, PeriodPhase};
pub use error::CustodianError;
pub use globals::DacGlobals;
pub use ledger::VoteWeightLedger;
pub use maintenance::Maintenance;
pub use observers::InboundObserver;
pub use pay::PendingPay;
pub use registry::CandidateRegistry;
pub use state::{CustodianRoster, CustodianState};
pub use vote::{Proxy, Vote, VoteTarget, VoteWeight};
