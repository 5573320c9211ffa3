//! Ledger constants shared by the allocation, presale and vesting components

// ============================================================================
// Native Currency Constants
// ============================================================================

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Minimum authority balance before allocation may start (0.1 SOL)
pub const MIN_AUTHORITY_LAMPORTS: u64 = LAMPORTS_PER_SOL / 10;

/// Allocation wallets below this balance cannot pay their own fees (0.01 SOL)
pub const MIN_WALLET_LAMPORTS: u64 = LAMPORTS_PER_SOL / 100;

// ============================================================================
// Token Constants
// ============================================================================

/// Maximum supported token decimals
pub const MAX_DECIMALS: u8 = 9;

/// Maximum token name length
pub const MAX_NAME_LEN: usize = 32;

/// Maximum token symbol length
pub const MAX_SYMBOL_LEN: usize = 10;

// ============================================================================
// Vesting Constants
// ============================================================================

/// Number of releases in every vesting schedule
pub const VESTING_RELEASE_COUNT: u32 = 7;

/// Milliseconds per day, used for the remaining-time report
pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

// ============================================================================
// State Files
// ============================================================================

/// Token metadata file name
pub const TOKEN_METADATA_FILE: &str = "token-metadata.json";

/// Vesting schedule file name
pub const VESTING_DATA_FILE: &str = "vesting-data.json";

/// Presale state file name
pub const PRESALE_DATA_FILE: &str = "presale-data.json";

/// Directory holding key material, relative to the data directory
pub const KEYPAIR_DIR: &str = "keypairs";

/// Field carrying the integrity digest in every persisted document
pub const CHECKSUM_FIELD: &str = "checksum";

// ============================================================================
// Identity Names
// ============================================================================

/// Token mint authority
pub const AUTHORITY_KEY: &str = "authority";

/// Development allocation wallet
pub const DEV_WALLET_KEY: &str = "dev_wallet";

/// Presale allocation wallet
pub const PRESALE_WALLET_KEY: &str = "presale_wallet";

/// Airdrop allocation wallet
pub const AIRDROP_WALLET_KEY: &str = "airdrop_wallet";

/// Vesting allocation wallet
pub const VESTING_WALLET_KEY: &str = "vesting_wallet";
