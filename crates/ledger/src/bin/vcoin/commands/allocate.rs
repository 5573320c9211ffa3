// Allocation command

use anyhow::Result;
use vcoin_ledger::{AllocationLedger, CategoryOutcome, Services};

use super::utils::{format_tokens, info, success};

pub async fn execute(services: Services) -> Result<()> {
    info("Allocating token supply...");

    let report = AllocationLedger::new(services).allocate().await?;
    let symbol = report.metadata.display_symbol().to_string();

    for (category, outcome) in &report.outcomes {
        let record = outcome.record();
        let line = format!(
            "{}: {} {} -> {} (tx {})",
            category,
            format_tokens(record.amount),
            symbol,
            record.token_account_address,
            record.transaction_id
        );
        match outcome {
            CategoryOutcome::Transferred(_) => success(&line),
            CategoryOutcome::AlreadyRecorded(_) => info(&format!("{} [already recorded]", line)),
        }
    }

    if report.is_noop() {
        info("All allocations were already complete");
    } else {
        success("Token allocation completed");
    }
    Ok(())
}
