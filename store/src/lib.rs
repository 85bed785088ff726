//! Storage and collaborator traits for the DAC engine.
//!
//! Tenant state lives in ordered [`Table`]s with secondary indexes and is
//! persisted through a [`StateStore`]. Everything the engine reads from the
//! outside world goes through the narrow [`Directory`], [`TokenLedger`] and
//! [`BudgetSource`] traits.

pub mod budget;
pub mod clock;
pub mod directory;
pub mod error;
pub mod state;
pub mod table;
pub mod token;

pub use budget::BudgetSource;
pub use clock::{Clock, SystemClock};
pub use directory::Directory;
pub use error::{LookupError, StoreError};
pub use state::StateStore;
pub use table::{combine_ids, IndexDef, Record, Table};
pub use token::TokenLedger;
