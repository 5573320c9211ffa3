//! Shared types for the VCoin distribution and vesting ledger
//!
//! This crate holds the persisted data model, constants, raw-amount
//! conversion and the error taxonomy used by the ledger components and CLI.

pub mod amount;
pub mod constants;
pub mod errors;
pub mod metadata;
pub mod presale;
pub mod serde_utils;
pub mod vesting;

// Re-export all public types
pub use amount::*;
pub use constants::*;
pub use errors::*;
pub use metadata::*;
pub use presale::*;
pub use vesting::*;

/// Result type alias using the shared error type
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
