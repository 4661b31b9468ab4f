//! End-to-end tests of the Ledger facade over both store backends.

use std::num::NonZeroU64;
use std::sync::Arc;

use contentledger::store::{MemoryStore, SqliteStore, Store};
use contentledger::{
    compute_ledger_digest, verify_revenue_consistency, ContentId, ContentMetadata, ErrorCode,
    Ledger, LedgerConfig, LedgerError, ManualClock, Payment, Principal, RevenueRecord, Timestamp,
};

const PERIOD: u64 = 1_000;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn creator() -> Principal {
    Principal::new("ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG").unwrap()
}

fn user() -> Principal {
    Principal::new("ST2JHG361ZXG51QTKY2NQCVBPPRRE2KZB1HR05NNC").unwrap()
}

fn meta(price: u64, royalty: u64) -> ContentMetadata {
    ContentMetadata::new("Test Content", "Description", "QmHash", price, royalty).unwrap()
}

fn config() -> LedgerConfig {
    LedgerConfig {
        subscription_period_ms: NonZeroU64::new(PERIOD).unwrap(),
        ..LedgerConfig::default()
    }
}

fn memory_ledger() -> Ledger<MemoryStore, ManualClock> {
    init_tracing();
    Ledger::with_clock(MemoryStore::new(), config(), ManualClock::new(Timestamp(0)))
}

async fn run_mixed_workload<S: Store>(ledger: &Ledger<S, ManualClock>) {
    let x = Principal::new("x").unwrap();

    let a = ledger.create_content(&creator(), meta(100, 10)).await.unwrap();
    let b = ledger.create_content(&creator(), meta(33, 50)).await.unwrap();

    ledger.purchase_content(&user(), a).await.unwrap();
    ledger.subscribe_content(&x, b).await.unwrap();
    ledger.transfer_content(&creator(), b, &x).await.unwrap();
    ledger.subscribe_content(&user(), b).await.unwrap();
    ledger.record_revenue(&x, a, 7).await.unwrap();
    ledger
        .update_content(&creator(), a, meta(250, 20))
        .await
        .unwrap();
    ledger.purchase_content(&x, a).await.unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ids_start_at_zero_and_increase() {
    let ledger = memory_ledger();

    for expected in 0..5 {
        let id = ledger.create_content(&creator(), meta(1, 0)).await.unwrap();
        assert_eq!(id, ContentId(expected));
    }
}

#[tokio::test]
async fn test_new_entry_fields() {
    let ledger = memory_ledger();
    let id = ledger.create_content(&creator(), meta(100, 10)).await.unwrap();

    let entry = ledger.get_content(id).await.unwrap().unwrap();
    assert_eq!(entry.creator, creator());
    assert_eq!(entry.owner, creator());
    assert_eq!(entry.price, 100);
    assert_eq!(entry.royalty_percentage.get(), 10);
    assert_eq!(entry.total_revenue, 0);
}

#[tokio::test]
async fn test_update_only_by_creator() {
    let ledger = memory_ledger();
    let id = ledger.create_content(&creator(), meta(100, 10)).await.unwrap();

    let err = ledger
        .update_content(&user(), id, meta(200, 15))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(ledger.get_content(id).await.unwrap().unwrap().price, 100);

    ledger
        .update_content(&creator(), id, meta(200, 15))
        .await
        .unwrap();
    let entry = ledger.get_content(id).await.unwrap().unwrap();
    assert_eq!(entry.price, 200);
    assert_eq!(entry.royalty_percentage.get(), 15);
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    let ledger = memory_ledger();

    let err = ledger
        .update_content(&creator(), ContentId(999), meta(1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ContentNotFound(ContentId(999))));
}

#[tokio::test]
async fn test_update_keeps_revenue_and_roles() {
    let ledger = memory_ledger();
    let id = ledger.create_content(&creator(), meta(100, 10)).await.unwrap();
    ledger.purchase_content(&user(), id).await.unwrap();
    ledger.transfer_content(&creator(), id, &user()).await.unwrap();

    ledger
        .update_content(&creator(), id, meta(5, 0))
        .await
        .unwrap();

    let entry = ledger.get_content(id).await.unwrap().unwrap();
    assert_eq!(entry.total_revenue, 100);
    assert_eq!(entry.owner, user());
    assert_eq!(entry.creator, creator());
}

#[tokio::test]
async fn test_transfer_chain_keeps_creator_rights() {
    let ledger = memory_ledger();
    let y = Principal::new("y").unwrap();
    let id = ledger.create_content(&creator(), meta(100, 10)).await.unwrap();

    ledger.transfer_content(&creator(), id, &user()).await.unwrap();

    // Previous owner lost transfer rights
    let err = ledger
        .transfer_content(&creator(), id, &creator())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unauthorized);

    ledger.transfer_content(&user(), id, &y).await.unwrap();
    assert_eq!(ledger.get_content(id).await.unwrap().unwrap().owner, y);

    ledger
        .update_content(&creator(), id, meta(1, 1))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_listing_views() {
    let ledger = memory_ledger();
    ledger.create_content(&creator(), meta(1, 0)).await.unwrap();
    ledger.create_content(&user(), meta(1, 0)).await.unwrap();
    ledger.create_content(&creator(), meta(1, 0)).await.unwrap();

    let mine: Vec<_> = ledger
        .contents_by_creator(&creator())
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(mine, vec![ContentId(0), ContentId(2)]);
    assert_eq!(ledger.list_contents().await.unwrap().len(), 3);
}

// ─────────────────────────────────────────────────────────────────────────────
// Monetization
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_purchase_missing_is_not_found() {
    let ledger = memory_ledger();

    let err = ledger
        .purchase_content(&user(), ContentId(999))
        .await
        .unwrap_err();
    assert_eq!(err.code().as_u16(), 404);
}

#[tokio::test]
async fn test_purchase_splits_royalty() {
    let ledger = memory_ledger();
    let id = ledger.create_content(&creator(), meta(100, 10)).await.unwrap();
    ledger.transfer_content(&creator(), id, &user()).await.unwrap();

    let buyer = Principal::new("buyer").unwrap();
    let payment = ledger.purchase_content(&buyer, id).await.unwrap();

    match payment {
        Payment::Charged { split, grant } => {
            assert_eq!(split.creator_share, 10);
            assert_eq!(split.owner_share, 90);
            assert!(grant.is_purchase());
        }
        other => panic!("expected charge, got {:?}", other),
    }

    assert_eq!(ledger.earnings(&creator()).await.unwrap(), 10);
    assert_eq!(ledger.earnings(&user()).await.unwrap(), 90);
    assert_eq!(ledger.earnings(&buyer).await.unwrap(), 0);
    assert!(ledger.is_subscribed(&buyer, id).await.unwrap());
}

#[tokio::test]
async fn test_repeat_purchase_changes_nothing() {
    let ledger = memory_ledger();
    let id = ledger.create_content(&creator(), meta(100, 10)).await.unwrap();

    ledger.purchase_content(&user(), id).await.unwrap();
    let digest = compute_ledger_digest(ledger.store()).await.unwrap();

    let again = ledger.purchase_content(&user(), id).await.unwrap();
    assert_eq!(again, Payment::AlreadyGranted);
    assert_eq!(compute_ledger_digest(ledger.store()).await.unwrap(), digest);
    assert_eq!(ledger.earnings(&creator()).await.unwrap(), 100);
}

#[tokio::test]
async fn test_purchase_uses_current_price() {
    let ledger = memory_ledger();
    let id = ledger.create_content(&creator(), meta(100, 10)).await.unwrap();
    ledger
        .update_content(&creator(), id, meta(40, 10))
        .await
        .unwrap();

    ledger.purchase_content(&user(), id).await.unwrap();
    assert_eq!(
        ledger.get_content_revenue(id).await.unwrap(),
        RevenueRecord::new(40)
    );
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let ledger = memory_ledger();
    let id = ledger.create_content(&creator(), meta(10, 0)).await.unwrap();

    assert!(!ledger.is_subscribed(&user(), id).await.unwrap());

    let payment = ledger.subscribe_content(&user(), id).await.unwrap();
    assert_eq!(payment.expires_at(), Some(Timestamp(PERIOD)));
    assert!(ledger.is_subscribed(&user(), id).await.unwrap());
    assert_eq!(ledger.accessible_contents(&user()).await.unwrap(), vec![id]);

    // Renewal while live extends from the current expiry
    ledger.clock().advance(PERIOD / 2);
    let payment = ledger.subscribe_content(&user(), id).await.unwrap();
    assert_eq!(payment.expires_at(), Some(Timestamp(2 * PERIOD)));

    // Expired reads the same as never subscribed
    ledger.clock().set(Timestamp(2 * PERIOD));
    assert!(!ledger.is_subscribed(&user(), id).await.unwrap());
    assert!(ledger.accessible_contents(&user()).await.unwrap().is_empty());

    // Renewal after expiry starts from now
    ledger.clock().advance(5 * PERIOD);
    let payment = ledger.subscribe_content(&user(), id).await.unwrap();
    assert_eq!(payment.expires_at(), Some(Timestamp(8 * PERIOD)));

    assert_eq!(
        ledger.get_content_revenue(id).await.unwrap(),
        RevenueRecord::new(30)
    );
}

#[tokio::test]
async fn test_purchase_upgrades_subscription_and_blocks_downgrade() {
    let ledger = memory_ledger();
    let id = ledger.create_content(&creator(), meta(10, 0)).await.unwrap();

    ledger.subscribe_content(&user(), id).await.unwrap();
    ledger.purchase_content(&user(), id).await.unwrap();

    ledger.clock().advance(100 * PERIOD);
    assert!(ledger.is_subscribed(&user(), id).await.unwrap());

    let payment = ledger.subscribe_content(&user(), id).await.unwrap();
    assert_eq!(payment, Payment::AlreadyGranted);
    assert_eq!(
        ledger.get_content_revenue(id).await.unwrap(),
        RevenueRecord::new(20)
    );
}

#[tokio::test]
async fn test_subscribe_missing_is_not_found() {
    let ledger = memory_ledger();

    let err = ledger
        .subscribe_content(&user(), ContentId(3))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

// ─────────────────────────────────────────────────────────────────────────────
// Revenue
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_record_revenue_updates_both_totals() {
    let ledger = memory_ledger();
    let id = ledger.create_content(&creator(), meta(100, 10)).await.unwrap();

    ledger.record_revenue(&creator(), id, 100).await.unwrap();
    ledger.record_revenue(&user(), id, 0).await.unwrap();
    ledger.record_revenue(&user(), id, 23).await.unwrap();

    let entry = ledger.get_content(id).await.unwrap().unwrap();
    let record = ledger.get_content_revenue(id).await.unwrap();
    assert_eq!(entry.total_revenue, 123);
    assert_eq!(record.total_revenue, 123);
    assert!(verify_revenue_consistency(ledger.store())
        .await
        .unwrap()
        .is_consistent());
}

#[tokio::test]
async fn test_record_revenue_errors() {
    let ledger = memory_ledger();
    let id = ledger.create_content(&creator(), meta(100, 10)).await.unwrap();

    let err = ledger
        .record_revenue(&creator(), ContentId(999), 1)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    ledger.record_revenue(&creator(), id, u64::MAX).await.unwrap();
    let err = ledger.record_revenue(&creator(), id, 1).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadRequest);
    assert_eq!(
        ledger.get_content_revenue(id).await.unwrap(),
        RevenueRecord::new(u64::MAX)
    );
}

#[tokio::test]
async fn test_unfunded_revenue_is_zero() {
    let ledger = memory_ledger();
    ledger.create_content(&creator(), meta(100, 10)).await.unwrap();

    assert_eq!(
        ledger.get_content_revenue(ContentId(0)).await.unwrap(),
        RevenueRecord::ZERO
    );
    assert_eq!(
        ledger.get_content_revenue(ContentId(999)).await.unwrap(),
        RevenueRecord::ZERO
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Concurrency and backends
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_purchases_are_serialized() {
    let ledger = Arc::new(memory_ledger());
    let id = ledger.create_content(&creator(), meta(10, 30)).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..32 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            let buyer = Principal::new(format!("buyer-{}", i % 16)).unwrap();
            ledger.purchase_content(&buyer, id).await.unwrap()
        }));
    }

    let mut charged = 0;
    for handle in handles {
        if handle.await.unwrap().is_charged() {
            charged += 1;
        }
    }

    // 16 distinct buyers, each charged exactly once
    assert_eq!(charged, 16);
    assert_eq!(
        ledger.get_content_revenue(id).await.unwrap(),
        RevenueRecord::new(160)
    );
    assert_eq!(ledger.earnings(&creator()).await.unwrap(), 160);
    assert!(verify_revenue_consistency(ledger.store())
        .await
        .unwrap()
        .is_consistent());
}

#[tokio::test]
async fn test_sqlite_matches_memory() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let memory = memory_ledger();
    let sqlite = Ledger::with_clock(
        SqliteStore::open(dir.path().join("ledger.db")).unwrap(),
        config(),
        ManualClock::new(Timestamp(0)),
    );

    run_mixed_workload(&memory).await;
    run_mixed_workload(&sqlite).await;

    assert_eq!(
        compute_ledger_digest(memory.store()).await.unwrap(),
        compute_ledger_digest(sqlite.store()).await.unwrap()
    );
    for who in [creator(), user(), Principal::new("x").unwrap()] {
        assert_eq!(
            memory.earnings(&who).await.unwrap(),
            sqlite.earnings(&who).await.unwrap()
        );
    }
    assert_eq!(
        memory.accessible_contents(&user()).await.unwrap(),
        sqlite.accessible_contents(&user()).await.unwrap()
    );
}

#[tokio::test]
async fn test_sqlite_accepts_prices_beyond_i64() {
    init_tracing();

    let memory = memory_ledger();
    let sqlite = Ledger::with_clock(
        SqliteStore::open_memory().unwrap(),
        config(),
        ManualClock::new(Timestamp(0)),
    );

    let calls: Vec<(&str, Vec<serde_json::Value>)> = vec![
        (
            "create-content",
            vec!["T".into(), "D".into(), "Q".into(), u64::MAX.into(), 10.into()],
        ),
        ("record-revenue", vec![0.into(), (1u64 << 63).into()]),
        ("purchase-content", vec![0.into()]),
        ("record-revenue", vec![0.into(), (1u64 << 63).into()]),
        ("get-content", vec![0.into()]),
    ];

    for (method, args) in &calls {
        let a = memory.call(&creator(), method, args).await;
        let b = sqlite.call(&creator(), method, args).await;
        assert_eq!(a, b, "{} {:?}", method, args);
    }

    let entry = sqlite.get_content(ContentId(0)).await.unwrap().unwrap();
    assert_eq!(entry.price, u64::MAX);
    assert_eq!(entry.total_revenue, 1 << 63);
    assert_eq!(
        compute_ledger_digest(memory.store()).await.unwrap(),
        compute_ledger_digest(sqlite.store()).await.unwrap()
    );
}

#[tokio::test]
async fn test_sqlite_ledger_survives_reopen() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    let digest = {
        let ledger = Ledger::with_clock(
            SqliteStore::open(&path).unwrap(),
            config(),
            ManualClock::new(Timestamp(0)),
        );
        run_mixed_workload(&ledger).await;
        compute_ledger_digest(ledger.store()).await.unwrap()
    };

    let ledger = Ledger::with_clock(
        SqliteStore::open(&path).unwrap(),
        config(),
        ManualClock::new(Timestamp(0)),
    );
    assert_eq!(compute_ledger_digest(ledger.store()).await.unwrap(), digest);
    assert_eq!(
        ledger.create_content(&creator(), meta(1, 0)).await.unwrap(),
        ContentId(2)
    );
}
