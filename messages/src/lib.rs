//! Message plumbing between the DAC engines and the outside world.
//!
//! Engines never call collaborators that mutate state. Instead they queue
//! [`OutboundAction`]s (token transfers, permission updates, notifications)
//! in an [`Outbox`]. The runtime drains the outbox after the triggering action
//! commits and hands each message to the [`Dispatcher`], which routes it to
//! the handlers registered for its [`MessageKind`]. Follow-up calls into the
//! engine itself are queued as [`InlineAction`]s and run inside the same
//! transaction.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod inbound;
pub mod outbound;

pub use context::{ActionContext, Collaborators};
pub use dispatch::{DispatchReport, Dispatcher, MessageHandler};
pub use error::DispatchError;
pub use inbound::{AccountBalanceDelta, AccountStakeDelta, AccountWeightDelta};
pub use outbound::{InlineAction, MessageKind, Outbox, OutboundAction, PermissionLevelWeight};
