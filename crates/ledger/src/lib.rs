//! VCoin distribution, presale and vesting ledger
//!
//! Validated configuration feeds three ledger components that share a
//! checksummed file store and reach the chain through collaborator ports:
//!
//! - [`allocation::AllocationLedger`] splits the minted supply into the four categories
//! - [`presale::PresaleLedger`] sells the presale allocation inside a date window
//! - [`vesting::VestingScheduler`] releases the vesting allocation on a calendar schedule

pub mod allocation;
pub mod chain;
pub mod config;
pub mod keystore;
pub mod presale;
pub mod rpc;
pub mod services;
pub mod store;
pub mod testing;
pub mod vesting;

pub use allocation::{AllocationLedger, AllocationReport, CategoryOutcome};
pub use chain::{
    AccountResolver, BalanceReader, Clock, FixedRateOracle, PriceOracle, SystemClock,
    TransferExecutor, TransferRequest,
};
pub use config::{Network, RawConfig, TokenomicsConfig};
pub use keystore::Keystore;
pub use presale::{EndOutcome, PresaleLedger, PresaleStatus, PurchaseReceipt, StartOutcome};
pub use rpc::RpcChainClient;
pub use services::{Services, StatePaths};
pub use store::IntegrityStore;
pub use vesting::{InitOutcome, ReleaseOutcome, VestingScheduler, VestingStatus};

pub use vcoin_types::{LedgerError, LedgerResult};
