//! Vesting release scheduler
//!
//! The schedule is anchored at the presale end and built once. Each release
//! moves Pending -> Due by the clock alone and Due -> Executed through a
//! transfer from the vesting wallet to the token authority. Executed is
//! terminal; repeating a release returns its recorded transaction.

use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};

use vcoin_types::{
    tokens_to_raw, AllocationCategory, LedgerError, LedgerResult, PresaleState, ReleaseStatus,
    VestingRelease, VestingSchedule, VESTING_WALLET_KEY,
};

use crate::chain::TransferRequest;
use crate::services::Services;
use crate::store::IntegrityStore;

/// Result of `initialize`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Created(VestingSchedule),
    /// The stored schedule, unchanged
    AlreadyInitialized(VestingSchedule),
}

impl InitOutcome {
    pub fn schedule(&self) -> &VestingSchedule {
        match self {
            InitOutcome::Created(schedule) | InitOutcome::AlreadyInitialized(schedule) => schedule,
        }
    }
}

/// Result of `execute_release`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// No schedule has been built yet
    NotInitialized,
    /// Scheduled date is still ahead; nothing changed
    NotYetDue {
        release_number: u32,
        scheduled_date: DateTime<Utc>,
        days_remaining: i64,
    },
    /// Release was executed earlier; the stored record is returned
    AlreadyExecuted(VestingRelease),
    /// Transfer made by this call
    Executed {
        release: VestingRelease,
        total_released: u64,
        next_release_date: Option<DateTime<Utc>>,
    },
}

/// One row of the status report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseView {
    pub release: VestingRelease,
    pub status: ReleaseStatus,
    pub days_remaining: i64,
}

/// Schedule summary as of `as_of`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VestingStatus {
    pub as_of: DateTime<Utc>,
    pub initialized: bool,
    pub presale_end_date: Option<DateTime<Utc>>,
    pub total_scheduled: u64,
    pub total_released: u64,
    pub next_release_date: Option<DateTime<Utc>>,
    pub releases: Vec<ReleaseView>,
}

/// Drives the vesting schedule
pub struct VestingScheduler {
    services: Services,
}

impl VestingScheduler {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    fn load(&self) -> LedgerResult<VestingSchedule> {
        IntegrityStore::load_or_default(&self.services.paths.vesting)
    }

    /// End time recorded by the presale, required to anchor the schedule
    pub fn presale_end_date(&self) -> LedgerResult<DateTime<Utc>> {
        let state: PresaleState = IntegrityStore::load(&self.services.paths.presale)?;
        state.end_time.ok_or(LedgerError::PresaleNotEnded)
    }

    /// Build and persist the schedule unless one already exists
    pub fn initialize(&self, presale_end: DateTime<Utc>) -> LedgerResult<InitOutcome> {
        let existing = self.load()?;
        if existing.initialized {
            warn!("Vesting schedule already initialized");
            return Ok(InitOutcome::AlreadyInitialized(existing));
        }

        let vesting = &self.services.config.vesting;
        let schedule = VestingSchedule::build(
            presale_end,
            vesting.release_amount,
            vesting.interval_months,
            self.services.clock.now(),
        )?;
        IntegrityStore::save(&self.services.paths.vesting, &schedule)?;

        info!(
            releases = schedule.release_count(),
            release_amount = vesting.release_amount,
            interval_months = vesting.interval_months,
            first_release = %presale_end,
            "Vesting schedule initialized"
        );
        Ok(InitOutcome::Created(schedule))
    }

    /// Execute release `release_number` (1-based) if it is due
    pub async fn execute_release(&self, release_number: u32) -> LedgerResult<ReleaseOutcome> {
        let mut schedule = self.load()?;
        if !schedule.initialized {
            warn!("Vesting schedule not initialized");
            return Ok(ReleaseOutcome::NotInitialized);
        }

        let release = schedule.release(release_number)?.clone();
        if release.executed {
            info!(
                release_number,
                tx = release.transaction_id.as_deref().unwrap_or_default(),
                "Release already executed"
            );
            return Ok(ReleaseOutcome::AlreadyExecuted(release));
        }

        let now = self.services.clock.now();
        if release.status(now) == ReleaseStatus::Pending {
            let days_remaining = release.days_remaining(now);
            info!(
                release_number,
                scheduled = %release.scheduled_date,
                days_remaining,
                "Release not yet due"
            );
            return Ok(ReleaseOutcome::NotYetDue {
                release_number,
                scheduled_date: release.scheduled_date,
                days_remaining,
            });
        }

        let transaction_id = self.transfer_release(&release).await?;
        let executed = schedule
            .mark_executed(release_number, now, transaction_id)?
            .clone();
        IntegrityStore::save(&self.services.paths.vesting, &schedule)?;

        info!(
            release_number,
            amount = executed.amount,
            tx = executed.transaction_id.as_deref().unwrap_or_default(),
            total_released = schedule.total_released,
            "Vesting release executed"
        );
        Ok(ReleaseOutcome::Executed {
            release: executed,
            total_released: schedule.total_released,
            next_release_date: schedule.next_release_date,
        })
    }

    async fn transfer_release(&self, release: &VestingRelease) -> LedgerResult<String> {
        let metadata = self.services.load_metadata()?;
        let record = metadata.require_allocation(AllocationCategory::Vesting)?;
        let wallet = self
            .services
            .load_identity(VESTING_WALLET_KEY, &record.wallet_address)?;
        let beneficiary: Pubkey = metadata.authority_address;
        let operation = format!("vesting release #{}", release.release_number);

        let destination = self
            .services
            .accounts
            .resolve_account(&wallet, &metadata.mint_address, &beneficiary)
            .await
            .map_err(|e| LedgerError::transfer_failed(&operation, e))?;

        self.services
            .transfers
            .transfer(
                &wallet,
                TransferRequest {
                    mint: metadata.mint_address,
                    source: record.token_account_address,
                    destination,
                    raw_amount: tokens_to_raw(release.amount, metadata.decimals)?,
                    decimals: metadata.decimals,
                },
            )
            .await
            .map_err(|e| LedgerError::transfer_failed(&operation, e))
    }

    /// Per-release state against the current time
    pub fn status(&self) -> LedgerResult<VestingStatus> {
        let schedule = self.load()?;
        let now = self.services.clock.now();

        Ok(VestingStatus {
            as_of: now,
            initialized: schedule.initialized,
            presale_end_date: schedule.presale_end_date,
            total_scheduled: schedule.total_scheduled(),
            total_released: schedule.total_released,
            next_release_date: schedule.next_release_date,
            releases: schedule
                .releases
                .iter()
                .map(|release| ReleaseView {
                    release: release.clone(),
                    status: release.status(now),
                    days_remaining: release.days_remaining(now),
                })
                .collect(),
        })
    }
}
