// Command implementations for the vcoin CLI

pub mod allocate;
pub mod config;
pub mod presale;
pub mod utils;
pub mod vesting;
