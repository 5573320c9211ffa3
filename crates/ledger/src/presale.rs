//! Presale window and purchase processing

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};

use vcoin_types::{
    decimal_to_raw, raw_to_decimal, AllocationCategory, LedgerError, LedgerResult, Participant,
    PresaleState, PRESALE_WALLET_KEY,
};

use crate::chain::{usd_to_native, TransferRequest};
use crate::services::Services;
use crate::store::IntegrityStore;

/// Result of `start`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { start_time: DateTime<Utc> },
    AlreadyActive { start_time: Option<DateTime<Utc>> },
    OutsideWindow {
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    },
}

/// Result of `end`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndOutcome {
    Ended {
        end_time: DateTime<Utc>,
        total_tokens_sold: Decimal,
        total_usd_raised: Decimal,
        participants: usize,
    },
    NotActive,
}

/// A completed purchase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub participant: Participant,
    pub raw_amount: u64,
    /// Native-currency equivalent of the contribution at the oracle rate
    pub native_amount: Decimal,
    pub buyer_token_account: Pubkey,
    pub transaction_id: String,
}

/// Presale summary as of `as_of`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresaleStatus {
    pub as_of: DateTime<Utc>,
    pub is_active: bool,
    pub window_open: bool,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub price_usd: Decimal,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_tokens_sold: Decimal,
    pub total_usd_raised: Decimal,
    pub participants: usize,
}

/// Sells the presale allocation inside the configured window
pub struct PresaleLedger {
    services: Services,
}

impl PresaleLedger {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    fn load(&self) -> LedgerResult<PresaleState> {
        IntegrityStore::load_or_default(&self.services.paths.presale)
    }

    fn save(&self, state: &PresaleState) -> LedgerResult<()> {
        IntegrityStore::save(&self.services.paths.presale, state).map(|_| ())
    }

    /// Open the presale if the current time is inside the window
    pub fn start(&self) -> LedgerResult<StartOutcome> {
        let mut state = self.load()?;
        if state.is_active {
            warn!("Presale is already active");
            return Ok(StartOutcome::AlreadyActive {
                start_time: state.start_time,
            });
        }

        let window = &self.services.config.presale;
        let now = self.services.clock.now();
        if !window.window_contains(now) {
            warn!(%now, start = %window.start, end = %window.end, "Outside the presale window");
            return Ok(StartOutcome::OutsideWindow {
                now,
                window_start: window.start,
                window_end: window.end,
            });
        }

        state.is_active = true;
        state.start_time = Some(now);
        state.end_time = None;
        self.save(&state)?;

        info!(start_time = %now, "Presale started");
        Ok(StartOutcome::Started { start_time: now })
    }

    /// Close an active presale and record its end time
    pub fn end(&self) -> LedgerResult<EndOutcome> {
        let mut state = self.load()?;
        if !state.is_active {
            warn!("Presale is not active");
            return Ok(EndOutcome::NotActive);
        }

        let now = self.services.clock.now();
        state.is_active = false;
        state.end_time = Some(now);
        self.save(&state)?;

        info!(
            end_time = %now,
            tokens_sold = %state.total_tokens_sold,
            usd_raised = %state.total_usd_raised,
            "Presale ended"
        );
        Ok(EndOutcome::Ended {
            end_time: now,
            total_tokens_sold: state.total_tokens_sold,
            total_usd_raised: state.total_usd_raised,
            participants: state.participant_count(),
        })
    }

    /// Sell tokens worth `usd_amount` to `buyer`
    pub async fn process_purchase(
        &self,
        buyer: &str,
        usd_amount: Decimal,
    ) -> LedgerResult<PurchaseReceipt> {
        let mut state = self.load()?;
        if !state.is_active {
            return Err(LedgerError::PresaleInactive {
                reason: "presale has not been started".to_string(),
            });
        }
        let config = &self.services.config;
        let now = self.services.clock.now();
        if !config.presale.window_contains(now) {
            return Err(LedgerError::PresaleInactive {
                reason: format!(
                    "current time {} is outside the presale window {} - {}",
                    now, config.presale.start, config.presale.end
                ),
            });
        }

        let buyer_address =
            Pubkey::from_str(buyer).map_err(|_| LedgerError::InvalidAddress(buyer.to_string()))?;
        if usd_amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(usd_amount, "USD amount must be positive"));
        }

        let metadata = self.services.load_metadata()?;
        let record = metadata.require_allocation(AllocationCategory::Presale)?;
        let wallet = self
            .services
            .load_identity(PRESALE_WALLET_KEY, &record.wallet_address)?;

        let tokens = usd_amount
            .checked_div(config.presale.price_usd)
            .ok_or_else(|| LedgerError::invalid_amount(usd_amount, "token amount out of range"))?;
        let raw_amount = decimal_to_raw(tokens, metadata.decimals)?;
        if raw_amount == 0 {
            return Err(LedgerError::invalid_amount(
                usd_amount,
                "amount buys less than one raw token unit",
            ));
        }
        let token_amount = raw_to_decimal(raw_amount, metadata.decimals).normalize();

        let native_amount = usd_to_native(self.services.oracle.as_ref(), usd_amount).await?;
        info!(
            buyer = %buyer_address,
            usd = %usd_amount,
            tokens = %token_amount,
            native = %native_amount,
            "Processing presale purchase"
        );

        let buyer_token_account = self
            .services
            .accounts
            .resolve_account(&wallet, &metadata.mint_address, &buyer_address)
            .await
            .map_err(|e| LedgerError::transfer_failed("presale purchase", e))?;
        let transaction_id = self
            .services
            .transfers
            .transfer(
                &wallet,
                TransferRequest {
                    mint: metadata.mint_address,
                    source: record.token_account_address,
                    destination: buyer_token_account,
                    raw_amount,
                    decimals: metadata.decimals,
                },
            )
            .await
            .map_err(|e| LedgerError::transfer_failed("presale purchase", e))?;

        let participant = Participant {
            address: buyer_address.to_string(),
            usd_amount,
            token_amount,
            timestamp: now,
        };
        state.record_purchase(participant.clone());
        self.save(&state)?;

        info!(
            buyer = %buyer_address,
            tx = %transaction_id,
            participants = state.participant_count(),
            "Presale purchase recorded"
        );
        Ok(PurchaseReceipt {
            participant,
            raw_amount,
            native_amount,
            buyer_token_account,
            transaction_id,
        })
    }

    pub fn status(&self) -> LedgerResult<PresaleStatus> {
        let state = self.load()?;
        let window = &self.services.config.presale;
        let now = self.services.clock.now();

        Ok(PresaleStatus {
            as_of: now,
            is_active: state.is_active,
            window_open: window.window_contains(now),
            window_start: window.start,
            window_end: window.end,
            price_usd: window.price_usd,
            start_time: state.start_time,
            end_time: state.end_time,
            total_tokens_sold: state.total_tokens_sold,
            total_usd_raised: state.total_usd_raised,
            participants: state.participant_count(),
        })
    }
}
