//! Fundamental types for the DAC governance engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! account names, assets and symbols, timestamps, signer sets, tenant directory
//! entries and the error taxonomy every engine maps onto.

pub mod asset;
pub mod auth;
pub mod error;
pub mod name;
pub mod tenant;
pub mod time;

pub use asset::{Asset, ExtendedAsset, ExtendedSymbol, Symbol};
pub use auth::Authorization;
pub use error::{ErrorKind, TypesError};
pub use name::{AccountName, DacId, PermissionName};
pub use tenant::{AccountType, Tenant};
pub use time::Timestamp;
