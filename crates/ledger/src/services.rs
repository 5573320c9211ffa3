//! Wiring of configuration, state locations and collaborators

use std::path::{Path, PathBuf};
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use tracing::{info, warn};

use vcoin_types::{
    LedgerError, LedgerResult, TokenMetadata, KEYPAIR_DIR, MIN_WALLET_LAMPORTS, PRESALE_DATA_FILE,
    TOKEN_METADATA_FILE, VESTING_DATA_FILE,
};

use crate::chain::{
    AccountResolver, BalanceReader, Clock, FixedRateOracle, PriceOracle, SystemClock,
    TransferExecutor,
};
use crate::config::TokenomicsConfig;
use crate::keystore::Keystore;
use crate::rpc::RpcChainClient;
use crate::store::IntegrityStore;

/// Locations of the persisted ledger documents and key material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub metadata: PathBuf,
    pub vesting: PathBuf,
    pub presale: PathBuf,
    pub keypairs: PathBuf,
}

impl StatePaths {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            metadata: data_dir.join(TOKEN_METADATA_FILE),
            vesting: data_dir.join(VESTING_DATA_FILE),
            presale: data_dir.join(PRESALE_DATA_FILE),
            keypairs: data_dir.join(KEYPAIR_DIR),
        }
    }
}

/// Everything a ledger component needs for one invocation
#[derive(Clone)]
pub struct Services {
    pub config: Arc<TokenomicsConfig>,
    pub paths: StatePaths,
    pub keystore: Keystore,
    pub accounts: Arc<dyn AccountResolver>,
    pub transfers: Arc<dyn TransferExecutor>,
    pub balances: Arc<dyn BalanceReader>,
    pub oracle: Arc<dyn PriceOracle>,
    pub clock: Arc<dyn Clock>,
}

impl Services {
    /// Services backed by the configured RPC endpoint and the wall clock
    pub fn connect(config: TokenomicsConfig, data_dir: &Path) -> Self {
        info!(network = %config.network, rpc_url = %config.rpc_url, "Connecting to cluster");
        let chain = Arc::new(RpcChainClient::new(config.rpc_url.as_str()));
        Self::with_chain(config, data_dir, chain, Arc::new(SystemClock))
    }

    /// Services backed by a single chain implementation
    pub fn with_chain<C>(
        config: TokenomicsConfig,
        data_dir: &Path,
        chain: Arc<C>,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        C: AccountResolver + TransferExecutor + BalanceReader + 'static,
    {
        let paths = StatePaths::new(data_dir);
        Self {
            config: Arc::new(config),
            keystore: Keystore::new(paths.keypairs.clone()),
            paths,
            accounts: chain.clone(),
            transfers: chain.clone(),
            balances: chain,
            oracle: Arc::new(FixedRateOracle::default()),
            clock,
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn PriceOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    /// Load and verify token metadata against the configured decimals
    pub fn load_metadata(&self) -> LedgerResult<TokenMetadata> {
        let metadata: TokenMetadata = IntegrityStore::load(&self.paths.metadata)?;
        if metadata.decimals != self.config.token.decimals {
            return Err(LedgerError::identity_mismatch(
                "token decimals",
                self.config.token.decimals,
                metadata.decimals,
            ));
        }
        Ok(metadata)
    }

    /// Load a stored keypair and require it to match the recorded address
    pub fn load_identity(&self, name: &str, expected: &Pubkey) -> LedgerResult<Keypair> {
        let keypair = self.keystore.load(name)?;
        if keypair.pubkey() != *expected {
            return Err(LedgerError::identity_mismatch(name, expected, keypair.pubkey()));
        }
        Ok(keypair)
    }

    /// Warn when a wallet cannot cover future transaction fees. Never fails.
    pub async fn warn_if_underfunded(&self, name: &str, address: &Pubkey) {
        let lamports = match self.balances.native_balance(address).await {
            Ok(lamports) => lamports,
            Err(e) => {
                warn!(wallet = name, %address, error = %e, "Could not read wallet balance");
                return;
            }
        };
        if lamports < MIN_WALLET_LAMPORTS {
            warn!(
                wallet = name,
                %address,
                lamports,
                minimum = MIN_WALLET_LAMPORTS,
                "Wallet balance is low and will need SOL for transaction fees"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_paths_live_under_data_dir() {
        let paths = StatePaths::new(Path::new("/var/lib/vcoin"));
        assert_eq!(paths.metadata, Path::new("/var/lib/vcoin/token-metadata.json"));
        assert_eq!(paths.vesting, Path::new("/var/lib/vcoin/vesting-data.json"));
        assert_eq!(paths.presale, Path::new("/var/lib/vcoin/presale-data.json"));
        assert_eq!(paths.keypairs, Path::new("/var/lib/vcoin/keypairs"));
    }
}
