// Vesting commands

use anyhow::Result;
use clap::{Args, Subcommand};
use vcoin_ledger::{InitOutcome, ReleaseOutcome, Services, VestingScheduler};

use super::utils::{format_date, format_optional_date, format_tokens, info, success, warn};

#[derive(Args)]
pub struct VestingCmd {
    #[command(subcommand)]
    command: VestingSubcommand,
}

#[derive(Subcommand)]
enum VestingSubcommand {
    /// Build the release schedule from the presale end time
    Init,

    /// Execute a due release
    Release {
        /// Release number (1-based)
        release_number: u32,
    },

    /// Show the release schedule
    Status,
}

pub async fn execute(cmd: VestingCmd, services: Services) -> Result<()> {
    let scheduler = VestingScheduler::new(services);

    match cmd.command {
        VestingSubcommand::Init => {
            let presale_end = scheduler.presale_end_date()?;
            match scheduler.initialize(presale_end)? {
                InitOutcome::Created(schedule) => {
                    success(&format!(
                        "Vesting schedule initialized with {} releases",
                        schedule.release_count()
                    ));
                    for release in &schedule.releases {
                        info(&format!(
                            "Release #{}: {} tokens on {}",
                            release.release_number,
                            format_tokens(release.amount),
                            format_date(release.scheduled_date)
                        ));
                    }
                }
                InitOutcome::AlreadyInitialized(schedule) => {
                    info(&format!(
                        "Vesting schedule already initialized (next release {})",
                        format_optional_date(schedule.next_release_date)
                    ));
                }
            }
        }

        VestingSubcommand::Release { release_number } => {
            match scheduler.execute_release(release_number).await? {
                ReleaseOutcome::NotInitialized => {
                    warn("Vesting schedule not initialized. Run `vesting init` first");
                }
                ReleaseOutcome::NotYetDue {
                    release_number,
                    scheduled_date,
                    days_remaining,
                } => {
                    info(&format!(
                        "Release #{} is not due until {} ({} days remaining)",
                        release_number,
                        format_date(scheduled_date),
                        days_remaining
                    ));
                }
                ReleaseOutcome::AlreadyExecuted(release) => {
                    info(&format!(
                        "Release #{} already executed on {} (tx {})",
                        release.release_number,
                        format_optional_date(release.execution_date),
                        release.transaction_id.as_deref().unwrap_or("-")
                    ));
                }
                ReleaseOutcome::Executed {
                    release,
                    total_released,
                    next_release_date,
                } => {
                    success(&format!(
                        "Release #{} executed: {} tokens (tx {})",
                        release.release_number,
                        format_tokens(release.amount),
                        release.transaction_id.as_deref().unwrap_or("-")
                    ));
                    info(&format!("Total released: {}", format_tokens(total_released)));
                    info(&format!("Next release: {}", format_optional_date(next_release_date)));
                }
            }
        }

        VestingSubcommand::Status => {
            let status = scheduler.status()?;
            if !status.initialized {
                warn("Vesting schedule not initialized");
                return Ok(());
            }

            println!("Vesting status as of {}", status.as_of.to_rfc3339());
            println!("  Presale end:    {}", format_optional_date(status.presale_end_date));
            println!("  Total released: {} / {}", format_tokens(status.total_released), format_tokens(status.total_scheduled));
            println!("  Next release:   {}", format_optional_date(status.next_release_date));
            println!();
            for view in &status.releases {
                let detail = match view.release.transaction_id.as_deref() {
                    Some(tx) => format!("tx {}", tx),
                    None if view.days_remaining > 0 => format!("{} days remaining", view.days_remaining),
                    None => String::new(),
                };
                println!(
                    "  #{:<2} {}  {:>15}  {:<8} {}",
                    view.release.release_number,
                    format_date(view.release.scheduled_date),
                    format_tokens(view.release.amount),
                    view.status.to_string(),
                    detail
                );
            }
        }
    }

    Ok(())
}
