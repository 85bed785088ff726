//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator the engine consults (clock, state store, tenant
//! directory, token ledger, budget source, message sinks) has an in-memory
//! implementation here that:
//! - returns deterministic values
//! - can be controlled programmatically
//! - never touches the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests. [`NullWorld`]
//! bundles the read-only collaborators so a test can build an
//! [`ActionContext`](dac_messages::ActionContext) in one line.

pub mod budget;
pub mod clock;
pub mod directory;
pub mod handlers;
pub mod store;
pub mod tokens;
pub mod world;

pub use budget::NullBudgetSource;
pub use clock::NullClock;
pub use directory::NullDirectory;
pub use handlers::RecordingHandler;
pub use store::NullStateStore;
pub use tokens::NullTokenLedger;
pub use world::NullWorld;
