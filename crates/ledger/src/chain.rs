//! Collaborator ports consumed by the ledgers
//!
//! The ledgers never talk to a cluster directly. Account resolution,
//! transfers, balance queries, exchange rates and the current time are all
//! reached through the traits below so the ledgers can run against an RPC
//! node or the in-memory doubles in [`crate::testing`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;

use vcoin_types::LedgerResult;

/// Idempotent create-or-fetch of the associated token account for a mint and owner
#[async_trait]
pub trait AccountResolver: Send + Sync {
    /// Returns the account address, creating it with `payer` funding when absent
    async fn resolve_account(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> LedgerResult<Pubkey>;
}

/// A raw-amount token transfer between two token accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub mint: Pubkey,
    pub source: Pubkey,
    pub destination: Pubkey,
    pub raw_amount: u64,
    pub decimals: u8,
}

/// Moves tokens and returns the transaction signature
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    async fn transfer(&self, owner: &Keypair, request: TransferRequest) -> LedgerResult<String>;
}

/// Balance queries
#[async_trait]
pub trait BalanceReader: Send + Sync {
    /// Native balance in lamports
    async fn native_balance(&self, address: &Pubkey) -> LedgerResult<u64>;

    /// Raw token balance of a token account
    async fn token_balance(&self, token_account: &Pubkey) -> LedgerResult<u64>;
}

/// External-currency to native-currency exchange rate
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// USD value of one whole native unit
    async fn usd_per_native(&self) -> LedgerResult<Decimal>;
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock UTC time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Constant exchange rate.
///
/// This is a placeholder and must not be used for production pricing.
#[derive(Debug, Clone, Copy)]
pub struct FixedRateOracle {
    usd_per_native: Decimal,
}

impl FixedRateOracle {
    pub const DEFAULT_USD_PER_NATIVE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

    pub fn new(usd_per_native: Decimal) -> Self {
        Self { usd_per_native }
    }
}

impl Default for FixedRateOracle {
    fn default() -> Self {
        Self::new(Self::DEFAULT_USD_PER_NATIVE)
    }
}

#[async_trait]
impl PriceOracle for FixedRateOracle {
    async fn usd_per_native(&self) -> LedgerResult<Decimal> {
        Ok(self.usd_per_native)
    }
}

/// Native amount worth `usd` at the oracle's rate, in whole native units
pub async fn usd_to_native(oracle: &dyn PriceOracle, usd: Decimal) -> LedgerResult<Decimal> {
    let rate = oracle.usd_per_native().await?;
    if rate <= Decimal::ZERO {
        return Err(vcoin_types::LedgerError::invalid_amount(
            rate,
            "exchange rate must be positive",
        ));
    }
    Ok(usd / rate)
}
