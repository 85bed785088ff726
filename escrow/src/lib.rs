//! Three-party escrow.
//!
//! A sender locks a receiver payment (and optionally an arbiter fee) under an
//! external reference. The sender releases it, the receiver hands it back,
//! or, once the receiver disputes, the arbiter rules. Every resolution erases
//! the record, so each escrow resolves exactly once.

pub mod error;
pub mod escrow;
pub mod service;

pub use error::EscrowError;
pub use escrow::{Escrow, EscrowState, FundingLeg, FundingMemo};
pub use service::EscrowService;
