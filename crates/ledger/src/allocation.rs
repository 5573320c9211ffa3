//! Category allocation of the minted supply
//!
//! The authority's token account is split across the four fixed categories
//! in declaration order. Each category gets its own wallet and associated
//! token account. The metadata file records one entry per category and is
//! only written once every pending category has been transferred.
//!
//! A failure part way through leaves the earlier transfers on-chain but not
//! in metadata. The error log lists their signatures so the records can be
//! reconciled by hand before re-running.

use std::collections::BTreeMap;

use solana_sdk::signature::{Keypair, Signer};
use tracing::{error, info};

use vcoin_types::{
    tokens_to_raw, AllocationCategory, AllocationRecord, LedgerError, LedgerResult, TokenMetadata,
    AUTHORITY_KEY, MIN_AUTHORITY_LAMPORTS,
};

use crate::chain::TransferRequest;
use crate::services::Services;
use crate::store::IntegrityStore;

/// What happened to one category during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryOutcome {
    Transferred(AllocationRecord),
    AlreadyRecorded(AllocationRecord),
}

impl CategoryOutcome {
    pub fn record(&self) -> &AllocationRecord {
        match self {
            CategoryOutcome::Transferred(record) | CategoryOutcome::AlreadyRecorded(record) => record,
        }
    }
}

/// Result of an allocation run
#[derive(Debug, Clone)]
pub struct AllocationReport {
    /// Metadata as persisted after the run
    pub metadata: TokenMetadata,
    pub outcomes: Vec<(AllocationCategory, CategoryOutcome)>,
}

impl AllocationReport {
    /// Whether every category had already been recorded
    pub fn is_noop(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, outcome)| matches!(outcome, CategoryOutcome::AlreadyRecorded(_)))
    }
}

/// Splits total supply across the allocation categories
pub struct AllocationLedger {
    services: Services,
}

impl AllocationLedger {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Transfer every category not yet recorded in metadata and persist the result
    pub async fn allocate(&self) -> LedgerResult<AllocationReport> {
        let mut metadata = self.services.load_metadata()?;
        let config = &self.services.config;
        let authority = self
            .services
            .load_identity(AUTHORITY_KEY, &metadata.authority_address)?;

        let pending = metadata.pending_categories();
        if pending.is_empty() {
            info!("All allocations already recorded, nothing to do");
            return Ok(Self::report(metadata, &pending, BTreeMap::new()));
        }

        let lamports = self.services.balances.native_balance(&authority.pubkey()).await?;
        if lamports < MIN_AUTHORITY_LAMPORTS {
            return Err(LedgerError::InsufficientBalance {
                asset: "SOL".to_string(),
                account: authority.pubkey(),
                required: MIN_AUTHORITY_LAMPORTS,
                available: lamports,
            });
        }

        let mut required = 0u64;
        for category in &pending {
            let raw = tokens_to_raw(config.allocations.amount(*category), metadata.decimals)?;
            required = required
                .checked_add(raw)
                .ok_or_else(|| LedgerError::invalid_amount(category, "allocation total overflows u64"))?;
        }
        let available = self
            .services
            .balances
            .token_balance(&metadata.authority_token_account)
            .await?;
        if available < required {
            return Err(LedgerError::InsufficientBalance {
                asset: metadata.display_symbol().to_string(),
                account: metadata.authority_token_account,
                required,
                available,
            });
        }

        info!(
            categories = pending.len(),
            raw_total = required,
            mint = %metadata.mint_address,
            "Starting token allocation"
        );

        let mut completed: BTreeMap<AllocationCategory, AllocationRecord> = BTreeMap::new();
        for category in &pending {
            match self.allocate_category(&metadata, &authority, *category).await {
                Ok(record) => {
                    info!(
                        category = %category,
                        amount = record.amount,
                        tx = %record.transaction_id,
                        "Allocation transferred"
                    );
                    completed.insert(*category, record);
                }
                Err(e) => {
                    let done: Vec<String> = completed
                        .iter()
                        .map(|(c, r)| format!("{}={}", c, r.transaction_id))
                        .collect();
                    error!(
                        category = %category,
                        completed = ?done,
                        "Allocation aborted; completed transfers are not recorded in metadata and need manual reconciliation"
                    );
                    return Err(e);
                }
            }
        }

        let allocations = metadata.allocations.get_or_insert_with(BTreeMap::new);
        for (category, record) in &completed {
            allocations.insert(*category, record.clone());
        }
        IntegrityStore::save(&self.services.paths.metadata, &metadata)?;
        info!(path = %self.services.paths.metadata.display(), "Allocation records saved");

        Ok(Self::report(metadata, &pending, completed))
    }

    async fn allocate_category(
        &self,
        metadata: &TokenMetadata,
        authority: &Keypair,
        category: AllocationCategory,
    ) -> LedgerResult<AllocationRecord> {
        let amount = self.services.config.allocations.amount(category);
        let raw_amount = tokens_to_raw(amount, metadata.decimals)?;

        let wallet = self.services.keystore.get_or_create(category.wallet_key())?;
        self.services
            .warn_if_underfunded(category.wallet_key(), &wallet.pubkey())
            .await;

        let token_account = self
            .services
            .accounts
            .resolve_account(authority, &metadata.mint_address, &wallet.pubkey())
            .await
            .map_err(|e| LedgerError::transfer_failed(category.as_str(), e))?;

        let transaction_id = self
            .services
            .transfers
            .transfer(
                authority,
                TransferRequest {
                    mint: metadata.mint_address,
                    source: metadata.authority_token_account,
                    destination: token_account,
                    raw_amount,
                    decimals: metadata.decimals,
                },
            )
            .await
            .map_err(|e| LedgerError::transfer_failed(category.as_str(), e))?;

        Ok(AllocationRecord {
            amount,
            wallet_address: wallet.pubkey(),
            token_account_address: token_account,
            transaction_id,
        })
    }

    fn report(
        metadata: TokenMetadata,
        pending: &[AllocationCategory],
        mut completed: BTreeMap<AllocationCategory, AllocationRecord>,
    ) -> AllocationReport {
        let outcomes = AllocationCategory::ALL
            .into_iter()
            .filter_map(|category| {
                if pending.contains(&category) {
                    completed
                        .remove(&category)
                        .map(|record| (category, CategoryOutcome::Transferred(record)))
                } else {
                    metadata
                        .allocation(category)
                        .cloned()
                        .map(|record| (category, CategoryOutcome::AlreadyRecorded(record)))
                }
            })
            .collect();

        AllocationReport { metadata, outcomes }
    }
}
