// Presale commands

use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use vcoin_ledger::{EndOutcome, PresaleLedger, Services, StartOutcome};

use super::utils::{format_optional_date, format_usd, info, success, warn};

#[derive(Args)]
pub struct PresaleCmd {
    #[command(subcommand)]
    command: PresaleSubcommand,
}

#[derive(Subcommand)]
enum PresaleSubcommand {
    /// Open the presale (only inside the configured window)
    Start,

    /// Close the presale and record its end time
    End,

    /// Sell tokens to a buyer
    Buy {
        /// Buyer wallet address
        address: String,

        /// Contribution in USD
        usd_amount: String,
    },

    /// Show presale state and totals
    Status,
}

pub async fn execute(cmd: PresaleCmd, services: Services) -> Result<()> {
    let ledger = PresaleLedger::new(services);

    match cmd.command {
        PresaleSubcommand::Start => match ledger.start()? {
            StartOutcome::Started { start_time } => {
                success(&format!("Presale started at {}", start_time.to_rfc3339()));
            }
            StartOutcome::AlreadyActive { start_time } => {
                info(&format!(
                    "Presale is already active (started {})",
                    format_optional_date(start_time)
                ));
            }
            StartOutcome::OutsideWindow {
                now,
                window_start,
                window_end,
            } => {
                warn(&format!(
                    "Current time {} is outside the presale window {} - {}",
                    now.to_rfc3339(),
                    window_start.to_rfc3339(),
                    window_end.to_rfc3339()
                ));
            }
        },

        PresaleSubcommand::End => match ledger.end()? {
            EndOutcome::Ended {
                end_time,
                total_tokens_sold,
                total_usd_raised,
                participants,
            } => {
                success(&format!("Presale ended at {}", end_time.to_rfc3339()));
                info(&format!("Tokens sold: {}", total_tokens_sold));
                info(&format!("USD raised: {}", format_usd(total_usd_raised)));
                info(&format!("Participants: {}", participants));
            }
            EndOutcome::NotActive => info("Presale is not active"),
        },

        PresaleSubcommand::Buy {
            address,
            usd_amount,
        } => {
            let usd = Decimal::from_str(usd_amount.trim())
                .with_context(|| format!("Invalid USD amount '{}'", usd_amount))?;
            let receipt = ledger.process_purchase(&address, usd).await?;

            success(&format!(
                "Sold {} tokens to {} for {}",
                receipt.participant.token_amount,
                receipt.participant.address,
                format_usd(receipt.participant.usd_amount)
            ));
            info(&format!("Equivalent native amount: {} SOL", receipt.native_amount.round_dp(9)));
            info(&format!("Token account: {}", receipt.buyer_token_account));
            info(&format!("Transaction: {}", receipt.transaction_id));
        }

        PresaleSubcommand::Status => {
            let status = ledger.status()?;
            println!("Presale status as of {}", status.as_of.to_rfc3339());
            println!("  Active:        {}", status.is_active);
            println!(
                "  Window:        {} - {} ({})",
                status.window_start.to_rfc3339(),
                status.window_end.to_rfc3339(),
                if status.window_open { "open" } else { "closed" }
            );
            println!("  Price:         ${} per token", status.price_usd);
            println!("  Started:       {}", format_optional_date(status.start_time));
            println!("  Ended:         {}", format_optional_date(status.end_time));
            println!("  Tokens sold:   {}", status.total_tokens_sold);
            println!("  USD raised:    {}", format_usd(status.total_usd_raised));
            println!("  Participants:  {}", status.participants);
        }
    }

    Ok(())
}
