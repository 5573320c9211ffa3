//! In-memory collaborators for tests and dry runs

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use spl_associated_token_account::get_associated_token_address_with_program_id;

use vcoin_types::{LedgerError, LedgerResult};

use crate::chain::{AccountResolver, BalanceReader, Clock, TransferExecutor, TransferRequest};

/// A transfer accepted by [`MockChain`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransfer {
    pub signature: String,
    pub owner: Pubkey,
    pub request: TransferRequest,
}

#[derive(Default)]
struct ChainState {
    native: HashMap<Pubkey, u64>,
    token: HashMap<Pubkey, u64>,
    account_owners: HashMap<Pubkey, Pubkey>,
    created_accounts: Vec<Pubkey>,
    transfers: Vec<RecordedTransfer>,
    transfer_limit: Option<usize>,
    unreadable_native: HashSet<Pubkey>,
}

/// Token ledger held in memory.
///
/// Token accounts are derived the same way as on-chain associated accounts
/// and must exist before they can receive a transfer.
#[derive(Default)]
pub struct MockChain {
    state: Mutex<ChainState>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Associated token account address for `owner`
    pub fn token_account(mint: &Pubkey, owner: &Pubkey) -> Pubkey {
        get_associated_token_address_with_program_id(owner, mint, &spl_token_2022::id())
    }

    pub fn set_native_balance(&self, address: &Pubkey, lamports: u64) {
        self.state().native.insert(*address, lamports);
    }

    /// Create `owner`'s token account holding `raw_amount` and return its address
    pub fn fund_token_account(&self, mint: &Pubkey, owner: &Pubkey, raw_amount: u64) -> Pubkey {
        let address = Self::token_account(mint, owner);
        let mut state = self.state();
        state.token.insert(address, raw_amount);
        state.account_owners.insert(address, *owner);
        address
    }

    /// Reject every transfer after the first `limit` succeed
    pub fn fail_transfers_after(&self, limit: usize) {
        self.state().transfer_limit = Some(limit);
    }

    /// Make native balance queries for `address` fail
    pub fn fail_native_balance_for(&self, address: &Pubkey) {
        self.state().unreadable_native.insert(*address);
    }

    pub fn balance_of(&self, token_account: &Pubkey) -> u64 {
        self.state().token.get(token_account).copied().unwrap_or(0)
    }

    pub fn transfers(&self) -> Vec<RecordedTransfer> {
        self.state().transfers.clone()
    }

    /// Token accounts created through [`AccountResolver`]
    pub fn created_accounts(&self) -> Vec<Pubkey> {
        self.state().created_accounts.clone()
    }
}

#[async_trait]
impl AccountResolver for MockChain {
    async fn resolve_account(
        &self,
        _payer: &Keypair,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> LedgerResult<Pubkey> {
        let address = Self::token_account(mint, owner);
        let mut state = self.state();
        if !state.account_owners.contains_key(&address) {
            state.account_owners.insert(address, *owner);
            state.token.insert(address, 0);
            state.created_accounts.push(address);
        }
        Ok(address)
    }
}

#[async_trait]
impl TransferExecutor for MockChain {
    async fn transfer(&self, owner: &Keypair, request: TransferRequest) -> LedgerResult<String> {
        let mut state = self.state();

        if let Some(limit) = state.transfer_limit {
            if state.transfers.len() >= limit {
                return Err(LedgerError::Rpc("injected transfer failure".to_string()));
            }
        }

        match state.account_owners.get(&request.source) {
            Some(source_owner) if *source_owner == owner.pubkey() => {}
            Some(_) => return Err(LedgerError::Rpc("owner does not match source account".to_string())),
            None => return Err(LedgerError::Rpc(format!("source account {} not found", request.source))),
        }
        if !state.account_owners.contains_key(&request.destination) {
            return Err(LedgerError::Rpc(format!(
                "destination account {} not found",
                request.destination
            )));
        }

        let available = state.token.get(&request.source).copied().unwrap_or(0);
        if available < request.raw_amount {
            return Err(LedgerError::Rpc(format!(
                "insufficient funds: {} < {}",
                available, request.raw_amount
            )));
        }
        state.token.insert(request.source, available - request.raw_amount);
        *state.token.entry(request.destination).or_insert(0) += request.raw_amount;

        let signature = format!("mock-tx-{}", state.transfers.len() + 1);
        state.transfers.push(RecordedTransfer {
            signature: signature.clone(),
            owner: owner.pubkey(),
            request,
        });
        Ok(signature)
    }
}

#[async_trait]
impl BalanceReader for MockChain {
    async fn native_balance(&self, address: &Pubkey) -> LedgerResult<u64> {
        let state = self.state();
        if state.unreadable_native.contains(address) {
            return Err(LedgerError::Rpc(format!("balance query for {} failed", address)));
        }
        Ok(state.native.get(address).copied().unwrap_or(0))
    }

    async fn token_balance(&self, token_account: &Pubkey) -> LedgerResult<u64> {
        self.state()
            .token
            .get(token_account)
            .copied()
            .ok_or_else(|| LedgerError::Rpc(format!("token account {} not found", token_account)))
    }
}

/// Settable clock
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transfer_moves_balance() {
        let chain = MockChain::new();
        let mint = Pubkey::new_unique();
        let owner = Keypair::new();
        let recipient = Pubkey::new_unique();

        let source = chain.fund_token_account(&mint, &owner.pubkey(), 100);
        let destination = chain.resolve_account(&owner, &mint, &recipient).await.unwrap();
        assert_eq!(chain.resolve_account(&owner, &mint, &recipient).await.unwrap(), destination);
        assert_eq!(chain.created_accounts(), vec![destination]);

        let request = TransferRequest {
            mint,
            source,
            destination,
            raw_amount: 40,
            decimals: 6,
        };
        let signature = chain.transfer(&owner, request).await.unwrap();

        assert_eq!(signature, "mock-tx-1");
        assert_eq!(chain.balance_of(&source), 60);
        assert_eq!(chain.balance_of(&destination), 40);
    }

    #[tokio::test]
    async fn test_rejects_wrong_owner_and_overdraft() {
        let chain = MockChain::new();
        let mint = Pubkey::new_unique();
        let owner = Keypair::new();
        let source = chain.fund_token_account(&mint, &owner.pubkey(), 10);
        let destination = chain.fund_token_account(&mint, &Pubkey::new_unique(), 0);

        let request = TransferRequest {
            mint,
            source,
            destination,
            raw_amount: 11,
            decimals: 0,
        };
        assert!(chain.transfer(&owner, request).await.is_err());
        assert!(chain
            .transfer(&Keypair::new(), TransferRequest { raw_amount: 1, ..request })
            .await
            .is_err());
        assert!(chain.transfers().is_empty());
    }

    #[test]
    fn test_fixed_clock_advances() {
        let start = Utc::now();
        let clock = FixedClock::new(start);
        clock.advance(Duration::days(2));
        assert_eq!(clock.now(), start + Duration::days(2));
    }
}
