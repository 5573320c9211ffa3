//! Token-economics configuration
//!
//! Values are layered from built-in defaults, an optional TOML file and the
//! process environment (highest precedence), then validated into an
//! immutable [`TokenomicsConfig`]. Any violation fails with
//! [`LedgerError::Config`] naming the offending key and value.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use vcoin_types::{
    parse_tokens, AllocationCategory, LedgerError, LedgerResult, MAX_DECIMALS, MAX_NAME_LEN,
    MAX_SYMBOL_LEN,
};

/// Cluster the ledger operates against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl FromStr for Network {
    type Err = LedgerError;

    fn from_str(s: &str) -> LedgerResult<Self> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            other => Err(LedgerError::config(
                "SOLANA_NETWORK",
                other,
                "must be one of: mainnet, testnet, devnet",
            )),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => f.write_str("mainnet"),
            Network::Testnet => f.write_str("testnet"),
            Network::Devnet => f.write_str("devnet"),
        }
    }
}

/// Unvalidated configuration as read from file and environment.
///
/// Every value is a string so that validation can report the exact input.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RawConfig {
    pub solana_network: String,
    pub solana_rpc_url: String,
    pub token_name: String,
    pub token_symbol: String,
    pub token_decimals: String,
    pub token_total_supply: String,
    pub dev_allocation: String,
    pub presale_allocation: String,
    pub airdrop_allocation: String,
    pub vesting_allocation: String,
    pub presale_price_usd: String,
    pub presale_start_date: String,
    pub presale_end_date: String,
    pub vesting_release_amount: String,
    pub vesting_release_interval_months: String,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            solana_network: "devnet".to_string(),
            solana_rpc_url: "https://api.devnet.solana.com".to_string(),
            token_name: "VCoin".to_string(),
            token_symbol: "VCN".to_string(),
            token_decimals: "6".to_string(),
            token_total_supply: "1000000000".to_string(),
            dev_allocation: "500000000".to_string(),
            presale_allocation: "100000000".to_string(),
            airdrop_allocation: "50000000".to_string(),
            vesting_allocation: "350000000".to_string(),
            presale_price_usd: "0.03".to_string(),
            presale_start_date: "2025-03-05".to_string(),
            presale_end_date: "2025-08-31".to_string(),
            vesting_release_amount: "50000000".to_string(),
            vesting_release_interval_months: "3".to_string(),
        }
    }
}

/// Token identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: u64,
}

/// Whole-token amounts per category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationConfig {
    pub development: u64,
    pub presale: u64,
    pub airdrop: u64,
    pub vesting: u64,
}

impl AllocationConfig {
    pub fn amount(&self, category: AllocationCategory) -> u64 {
        match category {
            AllocationCategory::Development => self.development,
            AllocationCategory::Presale => self.presale,
            AllocationCategory::Airdrop => self.airdrop,
            AllocationCategory::Vesting => self.vesting,
        }
    }

    /// Sum over all categories, `None` on overflow
    pub fn total(&self) -> Option<u64> {
        AllocationCategory::ALL
            .iter()
            .try_fold(0u64, |acc, c| acc.checked_add(self.amount(*c)))
    }
}

/// Presale price and purchase window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresaleConfig {
    /// USD per whole token
    pub price_usd: Decimal,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PresaleConfig {
    /// Whether `now` lies inside the window, both bounds inclusive
    pub fn window_contains(&self, now: DateTime<Utc>) -> bool {
        now >= self.start && now <= self.end
    }
}

/// Release cadence of the vesting allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VestingConfig {
    /// Whole tokens per release
    pub release_amount: u64,
    pub interval_months: u32,
}

/// Validated, immutable token-economics configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TokenomicsConfig {
    pub network: Network,
    pub rpc_url: Url,
    pub token: TokenConfig,
    pub allocations: AllocationConfig,
    pub presale: PresaleConfig,
    pub vesting: VestingConfig,
}

impl TokenomicsConfig {
    /// Load from an optional TOML file overlaid with the process environment
    pub fn load(file: Option<&Path>) -> LedgerResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let raw: RawConfig = builder
            .add_source(config::Environment::default())
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| LedgerError::config("config", "<sources>", &e.to_string()))?;

        Self::from_raw(&raw)
    }

    /// Validate raw values, failing on the first violation
    pub fn from_raw(raw: &RawConfig) -> LedgerResult<Self> {
        let network = Network::from_str(&raw.solana_network)?;

        let rpc_url = Url::parse(&raw.solana_rpc_url)
            .map_err(|e| LedgerError::config("SOLANA_RPC_URL", &raw.solana_rpc_url, &e.to_string()))?;
        if !matches!(rpc_url.scheme(), "http" | "https") {
            return Err(LedgerError::config(
                "SOLANA_RPC_URL",
                &raw.solana_rpc_url,
                "must be an http or https URL",
            ));
        }

        let name_len = raw.token_name.chars().count();
        if name_len == 0 || name_len > MAX_NAME_LEN {
            return Err(LedgerError::config(
                "TOKEN_NAME",
                &raw.token_name,
                &format!("must be non-empty and at most {} characters", MAX_NAME_LEN),
            ));
        }

        let symbol_len = raw.token_symbol.chars().count();
        if symbol_len == 0 || symbol_len > MAX_SYMBOL_LEN {
            return Err(LedgerError::config(
                "TOKEN_SYMBOL",
                &raw.token_symbol,
                &format!("must be non-empty and at most {} characters", MAX_SYMBOL_LEN),
            ));
        }

        let decimals = raw
            .token_decimals
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|d| *d <= MAX_DECIMALS)
            .ok_or_else(|| {
                LedgerError::config(
                    "TOKEN_DECIMALS",
                    &raw.token_decimals,
                    &format!("must be an integer between 0 and {}", MAX_DECIMALS),
                )
            })?;

        let total_supply = parse_amount("TOKEN_TOTAL_SUPPLY", &raw.token_total_supply)?;
        if total_supply == 0 {
            return Err(LedgerError::config(
                "TOKEN_TOTAL_SUPPLY",
                total_supply,
                "must be greater than 0",
            ));
        }
        if vcoin_types::tokens_to_raw(total_supply, decimals).is_err() {
            return Err(LedgerError::config(
                "TOKEN_TOTAL_SUPPLY",
                total_supply,
                "raw supply overflows u64 at the configured decimals",
            ));
        }

        let allocations = AllocationConfig {
            development: parse_amount("DEV_ALLOCATION", &raw.dev_allocation)?,
            presale: parse_amount("PRESALE_ALLOCATION", &raw.presale_allocation)?,
            airdrop: parse_amount("AIRDROP_ALLOCATION", &raw.airdrop_allocation)?,
            vesting: parse_amount("VESTING_ALLOCATION", &raw.vesting_allocation)?,
        };
        match allocations.total() {
            Some(total) if total == total_supply => {}
            Some(total) => {
                return Err(LedgerError::config(
                    "TOKEN_TOTAL_SUPPLY",
                    total_supply,
                    &format!("total allocation ({}) does not match total supply", total),
                ))
            }
            None => {
                return Err(LedgerError::config(
                    "TOKEN_TOTAL_SUPPLY",
                    total_supply,
                    "sum of allocations overflows",
                ))
            }
        }

        let price_usd = Decimal::from_str(raw.presale_price_usd.trim())
            .ok()
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| {
                LedgerError::config(
                    "PRESALE_PRICE_USD",
                    &raw.presale_price_usd,
                    "must be a decimal number greater than 0",
                )
            })?;
        let start = parse_date("PRESALE_START_DATE", &raw.presale_start_date)?;
        let end = parse_date("PRESALE_END_DATE", &raw.presale_end_date)?;
        if end <= start {
            return Err(LedgerError::config(
                "PRESALE_END_DATE",
                &raw.presale_end_date,
                "presale end date must be after start date",
            ));
        }

        let release_amount = parse_amount("VESTING_RELEASE_AMOUNT", &raw.vesting_release_amount)?;
        if release_amount == 0 {
            return Err(LedgerError::config(
                "VESTING_RELEASE_AMOUNT",
                release_amount,
                "must be greater than 0",
            ));
        }
        let interval_months = raw
            .vesting_release_interval_months
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|m| *m > 0)
            .ok_or_else(|| {
                LedgerError::config(
                    "VESTING_RELEASE_INTERVAL_MONTHS",
                    &raw.vesting_release_interval_months,
                    "must be an integer greater than 0",
                )
            })?;
        if allocations.vesting % release_amount != 0 {
            return Err(LedgerError::config(
                "VESTING_ALLOCATION",
                allocations.vesting,
                &format!("must be divisible by release amount ({})", release_amount),
            ));
        }

        Ok(Self {
            network,
            rpc_url,
            token: TokenConfig {
                name: raw.token_name.clone(),
                symbol: raw.token_symbol.clone(),
                decimals,
                total_supply,
            },
            allocations,
            presale: PresaleConfig {
                price_usd,
                start,
                end,
            },
            vesting: VestingConfig {
                release_amount,
                interval_months,
            },
        })
    }
}

impl From<&TokenomicsConfig> for RawConfig {
    fn from(config: &TokenomicsConfig) -> Self {
        Self {
            solana_network: config.network.to_string(),
            solana_rpc_url: config.rpc_url.to_string(),
            token_name: config.token.name.clone(),
            token_symbol: config.token.symbol.clone(),
            token_decimals: config.token.decimals.to_string(),
            token_total_supply: config.token.total_supply.to_string(),
            dev_allocation: config.allocations.development.to_string(),
            presale_allocation: config.allocations.presale.to_string(),
            airdrop_allocation: config.allocations.airdrop.to_string(),
            vesting_allocation: config.allocations.vesting.to_string(),
            presale_price_usd: config.presale.price_usd.to_string(),
            presale_start_date: config.presale.start.to_rfc3339(),
            presale_end_date: config.presale.end.to_rfc3339(),
            vesting_release_amount: config.vesting.release_amount.to_string(),
            vesting_release_interval_months: config.vesting.interval_months.to_string(),
        }
    }
}

fn parse_amount(key: &str, value: &str) -> LedgerResult<u64> {
    parse_tokens(value).map_err(|e| LedgerError::config(key, value, &e.to_string()))
}

/// Parse `YYYY-MM-DD` (UTC midnight) or an RFC 3339 timestamp
fn parse_date(key: &str, value: &str) -> LedgerResult<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| LedgerError::config(key, value, "must be a date (YYYY-MM-DD) or RFC 3339 timestamp"))
}
