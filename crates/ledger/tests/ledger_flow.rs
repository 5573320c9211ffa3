//! End-to-end ledger flows over the in-memory chain

mod common;

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;

use common::{date, Harness, DECIMALS};
use vcoin_ledger::{
    AllocationLedger, CategoryOutcome, EndOutcome, InitOutcome, IntegrityStore, LedgerError,
    ReleaseOutcome, StartOutcome,
};
use vcoin_types::{
    tokens_to_raw, AllocationCategory, AllocationRecord, PresaleState, ReleaseStatus,
    VestingSchedule, LAMPORTS_PER_SOL,
};

// ============================================================================
// Allocation
// ============================================================================

#[tokio::test]
async fn test_allocation_transfers_each_category_once() {
    let h = Harness::new(date(2025, 3, 1));
    let ledger = AllocationLedger::new(h.services.clone());

    let report = ledger.allocate().await.unwrap();
    assert!(!report.is_noop());
    let categories: Vec<_> = report.outcomes.iter().map(|(c, _)| *c).collect();
    assert_eq!(categories, AllocationCategory::ALL.to_vec());
    assert!(report
        .outcomes
        .iter()
        .all(|(_, o)| matches!(o, CategoryOutcome::Transferred(_))));

    let transfers = h.chain.transfers();
    assert_eq!(transfers.len(), 4);
    assert_eq!(transfers[0].request.raw_amount, 500_000_000_000_000);
    assert_eq!(transfers[3].request.raw_amount, 350_000_000_000_000);
    assert_eq!(h.chain.balance_of(&h.authority_token_account), 0);

    let metadata = h.metadata();
    let presale = metadata.allocation(AllocationCategory::Presale).unwrap();
    assert_eq!(presale.amount, 100_000_000);
    assert_eq!(h.chain.balance_of(&presale.token_account_address), 100_000_000_000_000);
    assert_eq!(presale.transaction_id, transfers[1].signature);
    assert!(metadata.pending_categories().is_empty());

    // Second run is a no-op
    let again = ledger.allocate().await.unwrap();
    assert!(again.is_noop());
    assert_eq!(h.chain.transfers().len(), 4);
    assert_eq!(again.metadata, metadata);
}

#[tokio::test]
async fn test_allocation_requires_authority_funds() {
    let h = Harness::new(date(2025, 3, 1));
    h.chain.set_native_balance(&h.authority.pubkey(), LAMPORTS_PER_SOL / 20);

    let err = AllocationLedger::new(h.services.clone()).allocate().await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { ref asset, .. } if asset == "SOL"));
    assert!(h.chain.transfers().is_empty());
}

#[tokio::test]
async fn test_unreadable_wallet_balance_does_not_block_allocation() {
    let h = Harness::new(date(2025, 3, 1));
    let airdrop = h
        .services
        .keystore
        .get_or_create(AllocationCategory::Airdrop.wallet_key())
        .unwrap();
    h.chain.fail_native_balance_for(&airdrop.pubkey());

    let report = AllocationLedger::new(h.services.clone()).allocate().await.unwrap();

    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(h.chain.transfers().len(), 4);
    let recorded = h.metadata();
    assert!(recorded.pending_categories().is_empty());
    assert_eq!(
        recorded.allocation(AllocationCategory::Airdrop).unwrap().wallet_address,
        airdrop.pubkey()
    );
}

#[tokio::test]
async fn test_rerun_transfers_only_pending_categories() {
    let h = Harness::new(date(2025, 3, 1));
    let previous = AllocationRecord {
        amount: 500_000_000,
        wallet_address: Pubkey::new_unique(),
        token_account_address: Pubkey::new_unique(),
        transaction_id: "old".to_string(),
    };
    let mut metadata = h.metadata();
    metadata.allocations = Some(
        [(AllocationCategory::Development, previous.clone())]
            .into_iter()
            .collect(),
    );
    IntegrityStore::save(&h.services.paths.metadata, &metadata).unwrap();
    // Only presale, airdrop and vesting remain: 100M + 50M + 350M
    h.chain.fund_token_account(
        &h.mint,
        &h.authority.pubkey(),
        tokens_to_raw(500_000_000, DECIMALS).unwrap(),
    );

    let report = AllocationLedger::new(h.services.clone()).allocate().await.unwrap();

    assert_eq!(h.chain.transfers().len(), 3);
    assert_eq!(h.chain.balance_of(&h.authority_token_account), 0);
    assert_eq!(
        report.outcomes[0],
        (AllocationCategory::Development, CategoryOutcome::AlreadyRecorded(previous.clone()))
    );
    assert!(report.outcomes[1..]
        .iter()
        .all(|(_, o)| matches!(o, CategoryOutcome::Transferred(_))));

    let recorded = h.metadata();
    assert_eq!(recorded.allocation(AllocationCategory::Development), Some(&previous));
    assert!(recorded.pending_categories().is_empty());
}

#[tokio::test]
async fn test_allocation_rejects_decimals_mismatch() {
    let h = Harness::new(date(2025, 3, 1));
    let mut metadata = h.metadata();
    metadata.decimals = 9;
    IntegrityStore::save(&h.services.paths.metadata, &metadata).unwrap();

    let err = AllocationLedger::new(h.services.clone()).allocate().await.unwrap_err();
    assert!(matches!(err, LedgerError::IdentityMismatch { .. }));
    assert!(h.chain.transfers().is_empty());
}

#[tokio::test]
async fn test_allocation_requires_token_balance() {
    let h = Harness::new(date(2025, 3, 1));
    h.chain.fund_token_account(&h.mint, &h.authority.pubkey(), 1);

    let err = AllocationLedger::new(h.services.clone()).allocate().await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientBalance { required: 1_000_000_000_000_000, available: 1, .. }
    ));
}

#[tokio::test]
async fn test_partial_failure_names_category_and_records_nothing() {
    let h = Harness::new(date(2025, 3, 1));
    h.chain.fail_transfers_after(2);

    let err = AllocationLedger::new(h.services.clone()).allocate().await.unwrap_err();
    match err {
        LedgerError::TransferFailed { operation, .. } => assert_eq!(operation, "airdrop"),
        other => panic!("unexpected error {:?}", other),
    }

    // Two transfers landed on-chain but metadata was not rewritten
    assert_eq!(h.chain.transfers().len(), 2);
    assert!(h.metadata().allocations.is_none());
}

#[tokio::test]
async fn test_allocation_rejects_foreign_authority() {
    let h = Harness::new(date(2025, 3, 1));
    let mut metadata = h.metadata();
    metadata.authority_address = Pubkey::new_unique();
    IntegrityStore::save(&h.services.paths.metadata, &metadata).unwrap();

    let err = AllocationLedger::new(h.services.clone()).allocate().await.unwrap_err();
    assert!(matches!(err, LedgerError::IdentityMismatch { .. }));
}

#[tokio::test]
async fn test_tampered_metadata_is_rejected() {
    let h = Harness::new(date(2025, 3, 1));
    let contents = std::fs::read_to_string(&h.services.paths.metadata).unwrap();
    let tampered = contents.replace("\"decimals\": 6", "\"decimals\": 9");
    std::fs::write(&h.services.paths.metadata, tampered).unwrap();

    let err = AllocationLedger::new(h.services.clone()).allocate().await.unwrap_err();
    assert!(matches!(err, LedgerError::Integrity { .. }));
}

// ============================================================================
// Presale
// ============================================================================

#[tokio::test]
async fn test_presale_purchase_at_fixed_price() {
    let h = Harness::new(date(2025, 4, 1));
    h.allocate().await;
    let presale = h.presale();

    assert!(matches!(presale.start().unwrap(), StartOutcome::Started { .. }));
    assert!(matches!(presale.start().unwrap(), StartOutcome::AlreadyActive { .. }));

    let buyer = Pubkey::new_unique();
    let receipt = presale
        .process_purchase(&buyer.to_string(), Decimal::from(30))
        .await
        .unwrap();

    assert_eq!(receipt.participant.token_amount, Decimal::from(1000));
    assert_eq!(receipt.raw_amount, 1_000_000_000);
    assert_eq!(receipt.native_amount, Decimal::from_str("0.6").unwrap());
    assert_eq!(h.chain.balance_of(&receipt.buyer_token_account), 1_000_000_000);

    let status = presale.status().unwrap();
    assert_eq!(status.participants, 1);
    assert_eq!(status.total_tokens_sold, Decimal::from(1000));
    assert_eq!(status.total_usd_raised, Decimal::from(30));
    assert!(status.window_open);
}

#[tokio::test]
async fn test_purchase_truncates_to_token_decimals() {
    let h = Harness::new(date(2025, 4, 1));
    h.allocate().await;
    let presale = h.presale();
    presale.start().unwrap();

    let receipt = presale
        .process_purchase(&Pubkey::new_unique().to_string(), Decimal::from(10))
        .await
        .unwrap();

    assert_eq!(receipt.raw_amount, 333_333_333);
    assert_eq!(receipt.participant.token_amount, Decimal::from_str("333.333333").unwrap());
}

#[tokio::test]
async fn test_purchase_rejected_while_inactive() {
    let h = Harness::new(date(2025, 4, 1));
    h.allocate().await;
    let presale = h.presale();
    let buyer = Pubkey::new_unique().to_string();

    let err = presale.process_purchase(&buyer, Decimal::from(30)).await.unwrap_err();
    assert!(matches!(err, LedgerError::PresaleInactive { .. }));
    assert!(!h.services.paths.presale.exists());

    presale.start().unwrap();
    h.clock.set(date(2025, 9, 1));
    let err = presale.process_purchase(&buyer, Decimal::from(30)).await.unwrap_err();
    assert!(matches!(err, LedgerError::PresaleInactive { .. }));

    let state: PresaleState = IntegrityStore::load(&h.services.paths.presale).unwrap();
    assert!(state.is_active);
    assert!(state.participants.is_empty());
    assert_eq!(state.total_tokens_sold, Decimal::ZERO);
    assert_eq!(h.chain.transfers().len(), 4);
}

#[tokio::test]
async fn test_purchase_validates_input() {
    let h = Harness::new(date(2025, 4, 1));
    h.allocate().await;
    let presale = h.presale();
    presale.start().unwrap();
    let buyer = Pubkey::new_unique().to_string();

    assert!(matches!(
        presale.process_purchase("not-an-address", Decimal::ONE).await,
        Err(LedgerError::InvalidAddress(_))
    ));
    assert!(matches!(
        presale.process_purchase(&buyer, Decimal::ZERO).await,
        Err(LedgerError::InvalidAmount { .. })
    ));
    assert!(matches!(
        presale.process_purchase(&buyer, Decimal::from(-5)).await,
        Err(LedgerError::InvalidAmount { .. })
    ));
    assert!(matches!(
        presale
            .process_purchase(&buyer, Decimal::from_str("0.00000001").unwrap())
            .await,
        Err(LedgerError::InvalidAmount { .. })
    ));
}

#[tokio::test]
async fn test_start_outside_window_is_a_noop() {
    let h = Harness::new(date(2025, 1, 1));
    let presale = h.presale();

    assert!(matches!(presale.start().unwrap(), StartOutcome::OutsideWindow { .. }));
    assert!(!h.services.paths.presale.exists());
    assert_eq!(presale.end().unwrap(), EndOutcome::NotActive);
}

#[tokio::test]
async fn test_end_records_end_time() {
    let h = Harness::new(date(2025, 4, 1));
    let presale = h.presale();
    presale.start().unwrap();

    h.clock.set(date(2025, 10, 1));
    match presale.end().unwrap() {
        EndOutcome::Ended { end_time, participants, .. } => {
            assert_eq!(end_time, date(2025, 10, 1));
            assert_eq!(participants, 0);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(h.vesting().presale_end_date().unwrap(), date(2025, 10, 1));
}

// ============================================================================
// Vesting
// ============================================================================

#[tokio::test]
async fn test_vesting_anchor_requires_ended_presale() {
    let h = Harness::new(date(2025, 4, 1));
    let vesting = h.vesting();

    assert!(matches!(vesting.presale_end_date(), Err(LedgerError::MissingFile { .. })));
    h.presale().start().unwrap();
    assert!(matches!(vesting.presale_end_date(), Err(LedgerError::PresaleNotEnded)));
}

#[tokio::test]
async fn test_initialize_is_idempotent() {
    let h = Harness::new(date(2025, 9, 1));
    let vesting = h.vesting();

    let created = match vesting.initialize(date(2025, 8, 31)).unwrap() {
        InitOutcome::Created(schedule) => schedule,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(created.release_count(), 7);
    assert_eq!(created.total_scheduled(), 350_000_000);
    assert_eq!(created.initialized_at, Some(date(2025, 9, 1)));

    match vesting.initialize(date(2026, 1, 1)).unwrap() {
        InitOutcome::AlreadyInitialized(schedule) => assert_eq!(schedule, created),
        other => panic!("unexpected outcome {:?}", other),
    }
    let stored: VestingSchedule = IntegrityStore::load(&h.services.paths.vesting).unwrap();
    assert_eq!(stored, created);
}

#[tokio::test]
async fn test_release_waits_until_due_then_executes_once() {
    let h = Harness::new(date(2025, 5, 1));
    h.allocate().await;
    let vesting = h.vesting();
    vesting.initialize(date(2025, 6, 1)).unwrap();
    let before: VestingSchedule = IntegrityStore::load(&h.services.paths.vesting).unwrap();

    match vesting.execute_release(1).await.unwrap() {
        ReleaseOutcome::NotYetDue { days_remaining, scheduled_date, .. } => {
            assert_eq!(days_remaining, 31);
            assert_eq!(scheduled_date, date(2025, 6, 1));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    let unchanged: VestingSchedule = IntegrityStore::load(&h.services.paths.vesting).unwrap();
    assert_eq!(unchanged, before);
    assert_eq!(h.chain.transfers().len(), 4);

    h.clock.set(date(2025, 6, 1));
    let executed = match vesting.execute_release(1).await.unwrap() {
        ReleaseOutcome::Executed { release, total_released, next_release_date } => {
            assert_eq!(total_released, 50_000_000);
            assert_eq!(next_release_date, Some(date(2025, 9, 1)));
            release
        }
        other => panic!("unexpected outcome {:?}", other),
    };
    assert!(executed.executed);
    assert_eq!(executed.execution_date, Some(date(2025, 6, 1)));

    // Beneficiary is the token authority
    assert_eq!(h.chain.transfers().len(), 5);
    assert_eq!(h.chain.balance_of(&h.authority_token_account), 50_000_000_000_000);

    match vesting.execute_release(1).await.unwrap() {
        ReleaseOutcome::AlreadyExecuted(release) => {
            assert_eq!(release.transaction_id, executed.transaction_id)
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(h.chain.transfers().len(), 5);

    let status = vesting.status().unwrap();
    assert_eq!(status.total_released, 50_000_000);
    assert_eq!(status.releases[0].status, ReleaseStatus::Executed);
    assert_eq!(status.releases[1].status, ReleaseStatus::Pending);
    assert_eq!(status.releases[1].days_remaining, 92);
}

#[tokio::test]
async fn test_release_range_and_uninitialized() {
    let h = Harness::new(date(2025, 5, 1));
    let vesting = h.vesting();

    assert_eq!(vesting.execute_release(1).await.unwrap(), ReleaseOutcome::NotInitialized);
    assert!(!vesting.status().unwrap().initialized);

    vesting.initialize(date(2025, 6, 1)).unwrap();
    assert!(matches!(
        vesting.execute_release(0).await,
        Err(LedgerError::ScheduleRange { requested: 0, count: 7 })
    ));
    assert!(matches!(
        vesting.execute_release(8).await,
        Err(LedgerError::ScheduleRange { requested: 8, count: 7 })
    ));
}

#[tokio::test]
async fn test_due_release_requires_vesting_allocation() {
    let h = Harness::new(date(2025, 7, 1));
    let vesting = h.vesting();
    vesting.initialize(date(2025, 6, 1)).unwrap();

    assert!(matches!(
        vesting.execute_release(1).await,
        Err(LedgerError::AllocationMissing { category: AllocationCategory::Vesting })
    ));
    let stored: VestingSchedule = IntegrityStore::load(&h.services.paths.vesting).unwrap();
    assert_eq!(stored.total_released, 0);
}

#[tokio::test]
async fn test_tampered_schedule_blocks_release() {
    let h = Harness::new(date(2025, 7, 1));
    h.allocate().await;
    let vesting = h.vesting();
    vesting.initialize(date(2025, 6, 1)).unwrap();

    let path = &h.services.paths.vesting;
    let mut value: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    value["releases"][0]["amount"] = Value::String("350000000".to_string());
    std::fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();

    assert!(matches!(
        vesting.execute_release(1).await,
        Err(LedgerError::Integrity { .. })
    ));
    assert_eq!(h.chain.transfers().len(), 4);
}
