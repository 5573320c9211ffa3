// Configuration inspection

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use vcoin_ledger::{RawConfig, TokenomicsConfig};

use super::utils::{format_tokens, success};

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Print the effective configuration as TOML
    Show,

    /// Validate the configuration and summarize the token economics
    Check,
}

pub fn execute(cmd: ConfigCmd, config: &TokenomicsConfig) -> Result<()> {
    match cmd.command {
        ConfigSubcommand::Show => {
            let rendered = toml::to_string_pretty(&RawConfig::from(config))
                .context("Failed to render configuration")?;
            print!("{}", rendered);
        }
        ConfigSubcommand::Check => {
            success(&format!(
                "{} ({}) on {}: {} tokens, {} decimals",
                config.token.name,
                config.token.symbol,
                config.network,
                format_tokens(config.token.total_supply),
                config.token.decimals
            ));
            println!("  Development: {}", format_tokens(config.allocations.development));
            println!("  Presale:     {}", format_tokens(config.allocations.presale));
            println!("  Airdrop:     {}", format_tokens(config.allocations.airdrop));
            println!("  Vesting:     {}", format_tokens(config.allocations.vesting));
            println!(
                "  Presale window {} - {} at ${} per token",
                config.presale.start.to_rfc3339(),
                config.presale.end.to_rfc3339(),
                config.presale.price_usd
            );
            println!(
                "  Vesting: {} tokens every {} months",
                format_tokens(config.vesting.release_amount),
                config.vesting.interval_months
            );
        }
    }
    Ok(())
}
