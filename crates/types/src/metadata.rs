//! Token metadata and category allocation records

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::*;
use crate::errors::LedgerError;
use crate::serde_utils::{pubkey_string, u64_string};
use crate::LedgerResult;

// ============================================================================
// Allocation Categories
// ============================================================================

/// One of the four fixed portions of total supply.
///
/// Declaration order is the order allocation transfers are executed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationCategory {
    Development,
    Presale,
    Airdrop,
    Vesting,
}

impl AllocationCategory {
    /// All categories in execution order
    pub const ALL: [AllocationCategory; 4] = [
        AllocationCategory::Development,
        AllocationCategory::Presale,
        AllocationCategory::Airdrop,
        AllocationCategory::Vesting,
    ];

    /// Keystore name of the wallet receiving this category
    pub fn wallet_key(&self) -> &'static str {
        match self {
            AllocationCategory::Development => DEV_WALLET_KEY,
            AllocationCategory::Presale => PRESALE_WALLET_KEY,
            AllocationCategory::Airdrop => AIRDROP_WALLET_KEY,
            AllocationCategory::Vesting => VESTING_WALLET_KEY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationCategory::Development => "development",
            AllocationCategory::Presale => "presale",
            AllocationCategory::Airdrop => "airdrop",
            AllocationCategory::Vesting => "vesting",
        }
    }
}

impl fmt::Display for AllocationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of transferring one category allocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AllocationRecord {
    /// Whole tokens transferred
    #[serde(with = "u64_string")]
    pub amount: u64,

    /// Owner of the destination account
    #[serde(with = "pubkey_string")]
    pub wallet_address: Pubkey,

    /// Associated token account that received the allocation
    #[serde(with = "pubkey_string")]
    pub token_account_address: Pubkey,

    /// Transaction signature of the transfer
    pub transaction_id: String,
}

// ============================================================================
// Token Metadata
// ============================================================================

/// Token identity written at mint creation and completed by the allocation run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TokenMetadata {
    #[serde(with = "pubkey_string")]
    pub mint_address: Pubkey,

    #[serde(with = "pubkey_string")]
    pub authority_address: Pubkey,

    #[serde(with = "pubkey_string")]
    pub authority_token_account: Pubkey,

    /// Whole tokens minted
    #[serde(with = "u64_string")]
    pub total_supply: u64,

    pub decimals: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_tx: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocations: Option<BTreeMap<AllocationCategory, AllocationRecord>>,
}

impl TokenMetadata {
    /// Recorded allocation for a category, if any
    pub fn allocation(&self, category: AllocationCategory) -> Option<&AllocationRecord> {
        self.allocations.as_ref().and_then(|a| a.get(&category))
    }

    /// Recorded allocation for a category, failing when absent
    pub fn require_allocation(&self, category: AllocationCategory) -> LedgerResult<&AllocationRecord> {
        self.allocation(category)
            .ok_or(LedgerError::AllocationMissing { category })
    }

    /// Categories without a recorded transaction id, in execution order
    pub fn pending_categories(&self) -> Vec<AllocationCategory> {
        AllocationCategory::ALL
            .into_iter()
            .filter(|c| {
                self.allocation(*c)
                    .map(|r| r.transaction_id.is_empty())
                    .unwrap_or(true)
            })
            .collect()
    }

    /// Display symbol, falling back to a generic unit
    pub fn display_symbol(&self) -> &str {
        self.symbol.as_deref().unwrap_or("tokens")
    }
}
