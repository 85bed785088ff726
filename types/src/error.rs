//! Top-level error types shared across crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Parsing and arithmetic errors for the primitive types in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid account name: {0}")]
    InvalidName(String),

    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    #[error("symbol mismatch: {left} vs {right}")]
    SymbolMismatch { left: String, right: String },

    #[error("asset arithmetic overflow")]
    Overflow,
}

/// Classification of every failure an engine can surface.
///
/// All kinds abort the enclosing action with no partial state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,
    /// The caller lacks a required signer.
    NotAuthorized,
    /// A referenced entity is absent.
    NotFound,
    /// The action is invalid for the current lifecycle state.
    StateConflict,
    /// Unique-key violation.
    Duplicate,
    /// A vote or quorum threshold was not met.
    InsufficientSupport,
    /// Not enough eligible candidates to fill the seats.
    InsufficientCandidates,
    /// Internal bookkeeping would be violated. Indicates a defect.
    Invariant,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotAuthorized => "not_authorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::StateConflict => "state_conflict",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::InsufficientSupport => "insufficient_support",
            ErrorKind::InsufficientCandidates => "insufficient_candidates",
            ErrorKind::Invariant => "invariant",
        };
        f.write_str(s)
    }
}

impl TypesError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TypesError::Overflow => ErrorKind::Invariant,
            _ => ErrorKind::Validation,
        }
    }
}
