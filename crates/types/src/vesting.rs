//! Vesting schedule model and its per-release state machine

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MILLIS_PER_DAY, VESTING_RELEASE_COUNT};
use crate::errors::LedgerError;
use crate::serde_utils::u64_string;
use crate::LedgerResult;

// ============================================================================
// Release State
// ============================================================================

/// Lifecycle of a single release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStatus {
    /// Scheduled date is still in the future
    Pending,
    /// Scheduled date has passed, transfer not yet made
    Due,
    /// Transfer completed (terminal)
    Executed,
}

impl std::fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseStatus::Pending => f.write_str("Pending"),
            ReleaseStatus::Due => f.write_str("Due"),
            ReleaseStatus::Executed => f.write_str("Executed"),
        }
    }
}

/// One scheduled vesting disbursement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VestingRelease {
    /// 1-based position in the schedule
    pub release_number: u32,
    pub scheduled_date: DateTime<Utc>,
    /// Whole tokens released
    #[serde(with = "u64_string")]
    pub amount: u64,
    pub executed: bool,
    pub execution_date: Option<DateTime<Utc>>,
    pub transaction_id: Option<String>,
}

impl VestingRelease {
    pub fn status(&self, now: DateTime<Utc>) -> ReleaseStatus {
        if self.executed {
            ReleaseStatus::Executed
        } else if self.scheduled_date <= now {
            ReleaseStatus::Due
        } else {
            ReleaseStatus::Pending
        }
    }

    /// Whole days until the release is due, rounded up
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        let gap_ms = (self.scheduled_date - now).num_milliseconds();
        if gap_ms <= 0 {
            return 0;
        }
        (gap_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    }
}

// ============================================================================
// Schedule
// ============================================================================

/// Persisted vesting schedule.
///
/// `next_release_date` is the earliest scheduled date among non-executed
/// releases and `total_released` the sum of executed amounts; both are
/// recomputed by [`VestingSchedule::mark_executed`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VestingSchedule {
    pub releases: Vec<VestingRelease>,
    pub total_released: u64,
    pub next_release_date: Option<DateTime<Utc>>,
    pub initialized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialized_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presale_end_date: Option<DateTime<Utc>>,
}

/// Add whole calendar months, clamping the day to the end of the target month
pub fn add_months(date: DateTime<Utc>, months: u32) -> LedgerResult<DateTime<Utc>> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| LedgerError::invalid_amount(months, "release date out of range"))
}

impl VestingSchedule {
    /// Build a fresh schedule of [`VESTING_RELEASE_COUNT`] releases anchored at the presale end
    pub fn build(
        presale_end: DateTime<Utc>,
        release_amount: u64,
        interval_months: u32,
        initialized_at: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        let releases = (0..VESTING_RELEASE_COUNT)
            .map(|i| {
                let offset = i
                    .checked_mul(interval_months)
                    .ok_or_else(|| LedgerError::invalid_amount(interval_months, "interval overflows"))?;
                Ok(VestingRelease {
                    release_number: i + 1,
                    scheduled_date: add_months(presale_end, offset)?,
                    amount: release_amount,
                    executed: false,
                    execution_date: None,
                    transaction_id: None,
                })
            })
            .collect::<LedgerResult<Vec<_>>>()?;

        let mut schedule = Self {
            releases,
            total_released: 0,
            next_release_date: None,
            initialized: true,
            initialized_at: Some(initialized_at),
            presale_end_date: Some(presale_end),
        };
        schedule.refresh_derived();
        Ok(schedule)
    }

    pub fn release_count(&self) -> u32 {
        self.releases.len() as u32
    }

    /// Release by 1-based number
    pub fn release(&self, release_number: u32) -> LedgerResult<&VestingRelease> {
        self.check_range(release_number)?;
        Ok(&self.releases[(release_number - 1) as usize])
    }

    fn check_range(&self, release_number: u32) -> LedgerResult<()> {
        if release_number < 1 || release_number > self.release_count() {
            return Err(LedgerError::ScheduleRange {
                requested: release_number,
                count: self.release_count(),
            });
        }
        Ok(())
    }

    /// Transition a due release to executed and refresh derived totals
    pub fn mark_executed(
        &mut self,
        release_number: u32,
        executed_at: DateTime<Utc>,
        transaction_id: String,
    ) -> LedgerResult<&VestingRelease> {
        self.check_range(release_number)?;
        let release = &mut self.releases[(release_number - 1) as usize];
        if release.executed {
            return Err(LedgerError::transfer_failed(
                &format!("vesting release #{}", release_number),
                "release already executed",
            ));
        }
        release.executed = true;
        release.execution_date = Some(executed_at);
        release.transaction_id = Some(transaction_id);

        self.refresh_derived();
        Ok(&self.releases[(release_number - 1) as usize])
    }

    /// Recompute `total_released` and `next_release_date` from the releases
    pub fn refresh_derived(&mut self) {
        self.total_released = self
            .releases
            .iter()
            .filter(|r| r.executed)
            .map(|r| r.amount)
            .sum();
        self.next_release_date = self
            .releases
            .iter()
            .filter(|r| !r.executed)
            .map(|r| r.scheduled_date)
            .min();
    }

    /// Sum of all release amounts
    pub fn total_scheduled(&self) -> u64 {
        self.releases.iter().map(|r| r.amount).sum()
    }
}
