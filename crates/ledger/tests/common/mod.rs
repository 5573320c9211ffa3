//! Shared fixture for ledger integration tests
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use tempfile::TempDir;

use vcoin_ledger::testing::{FixedClock, MockChain};
use vcoin_ledger::{
    AllocationLedger, IntegrityStore, PresaleLedger, RawConfig, Services, TokenomicsConfig,
    VestingScheduler,
};
use vcoin_types::{tokens_to_raw, TokenMetadata, AUTHORITY_KEY, LAMPORTS_PER_SOL};

pub const DECIMALS: u8 = 6;

pub fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub struct Harness {
    _dir: TempDir,
    pub chain: Arc<MockChain>,
    pub clock: Arc<FixedClock>,
    pub services: Services,
    pub authority: Keypair,
    pub mint: Pubkey,
    pub authority_token_account: Pubkey,
}

impl Harness {
    /// Minted supply held by the authority, metadata written, nothing allocated
    pub fn new(now: DateTime<Utc>) -> Self {
        let dir = TempDir::new().unwrap();
        let config = TokenomicsConfig::from_raw(&RawConfig::default()).unwrap();
        let chain = Arc::new(MockChain::new());
        let clock = Arc::new(FixedClock::new(now));
        let services = Services::with_chain(config, dir.path(), chain.clone(), clock.clone());

        let authority = services.keystore.get_or_create(AUTHORITY_KEY).unwrap();
        let mint = Pubkey::new_unique();
        let authority_token_account = chain.fund_token_account(
            &mint,
            &authority.pubkey(),
            tokens_to_raw(1_000_000_000, DECIMALS).unwrap(),
        );
        chain.set_native_balance(&authority.pubkey(), LAMPORTS_PER_SOL);

        let metadata = TokenMetadata {
            mint_address: mint,
            authority_address: authority.pubkey(),
            authority_token_account,
            total_supply: 1_000_000_000,
            decimals: DECIMALS,
            name: Some("VCoin".to_string()),
            symbol: Some("VCN".to_string()),
            program_id: None,
            network: Some("devnet".to_string()),
            metadata_address: None,
            metadata_tx: None,
            allocations: None,
        };
        IntegrityStore::save(&services.paths.metadata, &metadata).unwrap();

        Self {
            _dir: dir,
            chain,
            clock,
            services,
            authority,
            mint,
            authority_token_account,
        }
    }

    pub fn metadata(&self) -> TokenMetadata {
        IntegrityStore::load(&self.services.paths.metadata).unwrap()
    }

    pub async fn allocate(&self) {
        AllocationLedger::new(self.services.clone()).allocate().await.unwrap();
    }

    pub fn presale(&self) -> PresaleLedger {
        PresaleLedger::new(self.services.clone())
    }

    pub fn vesting(&self) -> VestingScheduler {
        VestingScheduler::new(self.services.clone())
    }
}
