// CLI for the VCoin distribution ledger
//
// Each invocation performs one ledger operation against the state files in
// the data directory and exits. Soft outcomes exit 0; any error exits 1.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vcoin_ledger::{Services, TokenomicsConfig};

#[derive(Parser)]
#[command(name = "vcoin")]
#[command(about = "VCoin allocation, presale and vesting ledger", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the ledger state files and keypairs/
    #[arg(long, global = true, default_value = ".")]
    data_dir: PathBuf,

    /// Optional TOML configuration file (environment variables take precedence)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transfer each category allocation from the authority
    Allocate,

    /// Presale window and purchases
    Presale(commands::presale::PresaleCmd),

    /// Vesting schedule and releases
    Vesting(commands::vesting::VestingCmd),

    /// Inspect the effective configuration
    Config(commands::config::ConfigCmd),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        data_dir,
        config: config_path,
        command,
        ..
    } = cli;
    let config = TokenomicsConfig::load(config_path.as_deref())
        .context("Failed to load configuration")?;

    match command {
        Commands::Config(cmd) => commands::config::execute(cmd, &config),
        Commands::Allocate => {
            commands::allocate::execute(Services::connect(config, &data_dir)).await
        }
        Commands::Presale(cmd) => {
            commands::presale::execute(cmd, Services::connect(config, &data_dir)).await
        }
        Commands::Vesting(cmd) => {
            commands::vesting::execute(cmd, Services::connect(config, &data_dir)).await
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("vcoin={}", default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
