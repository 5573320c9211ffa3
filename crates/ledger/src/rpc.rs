//! Solana RPC adapter for the chain ports
//!
//! Token accounts are SPL Token-2022 associated token accounts. Account
//! creation uses the idempotent instruction so resolving an existing
//! account is a plain address derivation plus a no-op transaction.

use std::sync::Arc;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use spl_associated_token_account::{
    get_associated_token_address_with_program_id,
    instruction::create_associated_token_account_idempotent,
};
use tracing::debug;

use vcoin_types::{LedgerError, LedgerResult};

use crate::chain::{AccountResolver, BalanceReader, TransferExecutor, TransferRequest};

/// Chain client over a JSON-RPC endpoint
pub struct RpcChainClient {
    rpc: Arc<RpcClient>,
}

impl RpcChainClient {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            rpc: Arc::new(RpcClient::new_with_commitment(
                rpc_url.to_string(),
                CommitmentConfig::confirmed(),
            )),
        }
    }

    pub fn with_client(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }

    /// Get the RPC endpoint URL
    pub fn rpc_url(&self) -> String {
        self.rpc.url()
    }

    /// Sign with `signers[0]` as fee payer, send and wait for confirmation
    async fn send_transaction(
        &self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> LedgerResult<Signature> {
        let payer = signers
            .first()
            .ok_or_else(|| LedgerError::Rpc("transaction requires at least one signer".to_string()))?;
        let recent_blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;

        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&payer.pubkey()),
            signers,
            recent_blockhash,
        );

        self.rpc
            .send_and_confirm_transaction(&tx)
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))
    }
}

#[async_trait]
impl AccountResolver for RpcChainClient {
    async fn resolve_account(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> LedgerResult<Pubkey> {
        let token_program = spl_token_2022::id();
        let address = get_associated_token_address_with_program_id(owner, mint, &token_program);

        if self
            .rpc
            .get_account_with_commitment(&address, self.rpc.commitment())
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?
            .value
            .is_some()
        {
            debug!(%owner, %address, "Token account exists");
            return Ok(address);
        }

        let ix = create_associated_token_account_idempotent(
            &payer.pubkey(),
            owner,
            mint,
            &token_program,
        );
        let signature = self.send_transaction(&[ix], &[payer]).await?;
        debug!(%owner, %address, %signature, "Created token account");
        Ok(address)
    }
}

#[async_trait]
impl TransferExecutor for RpcChainClient {
    async fn transfer(&self, owner: &Keypair, request: TransferRequest) -> LedgerResult<String> {
        let ix = spl_token_2022::instruction::transfer_checked(
            &spl_token_2022::id(),
            &request.source,
            &request.mint,
            &request.destination,
            &owner.pubkey(),
            &[],
            request.raw_amount,
            request.decimals,
        )
        .map_err(|e| LedgerError::Rpc(format!("failed to build transfer: {}", e)))?;

        let signature = self.send_transaction(&[ix], &[owner]).await?;
        Ok(signature.to_string())
    }
}

#[async_trait]
impl BalanceReader for RpcChainClient {
    async fn native_balance(&self, address: &Pubkey) -> LedgerResult<u64> {
        self.rpc
            .get_balance(address)
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))
    }

    async fn token_balance(&self, token_account: &Pubkey) -> LedgerResult<u64> {
        let balance = self
            .rpc
            .get_token_account_balance(token_account)
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;
        balance.amount.parse::<u64>().map_err(|e| {
            LedgerError::Rpc(format!(
                "unexpected token balance '{}' for {}: {}",
                balance.amount, token_account, e
            ))
        })
    }
}
