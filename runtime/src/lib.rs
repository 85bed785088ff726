//! Transactional runtime hosting many DAC tenants.
//!
//! A [`DacRuntime`] owns the collaborators (state store, directory, token
//! ledger, budget source, clock) and a message [`Dispatcher`](dac_messages::Dispatcher).
//! Callers submit an [`Action`] for a tenant; the runtime loads that tenant's
//! [`TenantState`], runs the matching engine operation and its inline
//! follow-ups, persists the result and dispatches the queued messages.
//! Tenants never share state.

pub mod action;
pub mod config;
pub mod error;
pub mod runtime;
pub mod state;
pub mod tracing_spans;

pub use action::Action;
pub use config::{Holding, RuntimeConfig, TenantConfig, TokenFixtures};
pub use error::RuntimeError;
pub use runtime::{ActionOutcome, DacRuntime, ExecutionReport};
pub use state::TenantState;
