use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::metadata::AllocationCategory;

// ============================================================================
// Main Error Enum
// ============================================================================

/// Errors raised by the distribution and vesting ledger.
///
/// Every variant is fatal at the process boundary. Informational outcomes
/// (a release that is not yet due, a presale that is already active, ...)
/// are reported through the ledgers' outcome enums instead.
#[derive(Error, Debug)]
pub enum LedgerError {
    // ========================================================================
    // Configuration
    // ========================================================================

    /// Configuration value failed validation
    #[error("Invalid configuration '{key}' = '{value}': {reason}")]
    Config { key: String, value: String, reason: String },

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Stored checksum does not match the recomputed digest
    #[error("Integrity check failed for {path}: {reason}. File may have been tampered with")]
    Integrity { path: String, reason: String },

    /// Required state file does not exist
    #[error("Required file not found: {path}")]
    MissingFile { path: String },

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(String),

    /// Key material could not be validated, loaded or written
    #[error("Keystore error: {0}")]
    Keystore(String),

    // ========================================================================
    // Ledger state
    // ========================================================================

    /// Balance below what the operation needs
    #[error("Insufficient {asset} balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        asset: String,
        account: Pubkey,
        required: u64,
        available: u64,
    },

    /// A loaded identity does not match the one recorded in metadata
    #[error("Identity mismatch for {role}: expected {expected}, loaded {actual}")]
    IdentityMismatch {
        role: String,
        expected: String,
        actual: String,
    },

    /// Release number outside the schedule
    #[error("Invalid release number {requested}. Valid range: 1-{count}")]
    ScheduleRange { requested: u32, count: u32 },

    /// Purchase attempted while the presale is closed
    #[error("Presale is not active: {reason}")]
    PresaleInactive { reason: String },

    /// Presale has no recorded end time
    #[error("Presale has not ended yet. End the presale before initializing vesting")]
    PresaleNotEnded,

    /// Category allocation has not been performed
    #[error("Allocation for '{category}' is not recorded. Run the allocation first")]
    AllocationMissing { category: AllocationCategory },

    /// Token transfer or account resolution failed on-chain
    #[error("Transfer failed for {operation}: {reason}")]
    TransferFailed { operation: String, reason: String },

    /// Amount is zero, negative, or does not fit the raw representation
    #[error("Invalid amount '{value}': {reason}")]
    InvalidAmount { value: String, reason: String },

    /// Address string is not a valid public key
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    /// Chain client failure
    #[error("RPC error: {0}")]
    Rpc(String),
}

impl LedgerError {
    /// Create a configuration error naming the key and offending value
    pub fn config(key: &str, value: impl ToString, reason: &str) -> Self {
        Self::Config {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an integrity error for a state file
    pub fn integrity(path: impl ToString, reason: &str) -> Self {
        Self::Integrity {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an identity mismatch error
    pub fn identity_mismatch(role: &str, expected: impl ToString, actual: impl ToString) -> Self {
        Self::IdentityMismatch {
            role: role.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an invalid amount error
    pub fn invalid_amount(value: impl ToString, reason: &str) -> Self {
        Self::InvalidAmount {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a transfer failure for the named operation
    pub fn transfer_failed(operation: &str, reason: impl ToString) -> Self {
        Self::TransferFailed {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}
