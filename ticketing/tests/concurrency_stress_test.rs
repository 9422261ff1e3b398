//! Concurrency stress tests for last-seat scenarios.
//!
//! These tests verify that under concurrent load the ticket type row lock
//! serialises purchases, prevents overselling, and is always released, even
//! when a transaction panics or overruns its deadline.
//!
//! Run with: `cargo test --test concurrency_stress_test -- --nocapture`

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // Test code can use unwrap/expect

use std::sync::Arc;
use std::time::Duration;
use ticketing::{PurchaseRequest, PurchaseTicket};
use time2meet_core::error::{AppError, ErrorCode};
use time2meet_core::ids::{TicketTypeId, UserId};
use time2meet_core::store::{AuditContextSetter, TicketInventory};
use time2meet_core::{Capacity, UnitOfWork};
use time2meet_testing::{InMemoryStore, init_test_tracing, test_clock};
use tokio::task::JoinSet;

fn request(buyer: UserId, ticket_type: TicketTypeId, qr_code: String) -> PurchaseRequest {
    PurchaseRequest {
        actor_id: buyer,
        origin_address: String::new(),
        ticket_type_id: ticket_type,
        qr_code,
        amount_paid: "10".to_string(),
        currency: None,
    }
}

/// Test: 100 concurrent purchases for 10 seats.
///
/// Verifies that:
/// - Exactly 10 purchases succeed
/// - Exactly 90 purchases fail with "sold out"
/// - `quantity_sold` ends equal to `quantity_total`
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_purchases_never_oversell() {
    const SEATS: u32 = 10;
    const BUYERS: usize = 100;
    init_test_tracing();

    let store = InMemoryStore::new();
    let buyer = store.seed_user("crowd@example.com");
    let event = store.seed_event(buyer);
    let ticket_type = store.seed_ticket_type(event, SEATS);
    let purchase = Arc::new(PurchaseTicket::new(store.clone(), Arc::new(test_clock())));

    let mut tasks = JoinSet::new();
    for i in 0..BUYERS {
        let purchase = Arc::clone(&purchase);
        tasks.spawn(async move {
            purchase
                .purchase(request(buyer, ticket_type, format!("QR-{i:03}")))
                .await
        });
    }

    let mut sold = 0;
    let mut sold_out = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.expect("task should not panic") {
            Ok(_) => sold += 1,
            Err(e) => {
                assert_eq!(e, AppError::conflict("sold out"));
                sold_out += 1;
            }
        }
    }

    println!("✅ {sold} sold, {sold_out} rejected");
    assert_eq!(sold, SEATS as usize);
    assert_eq!(sold_out, BUYERS - SEATS as usize);
    assert_eq!(store.tickets().len(), SEATS as usize);
    assert_eq!(store.capacity(ticket_type), Some(Capacity::new(SEATS, SEATS)));
    assert_eq!(store.open_transactions(), 0);
}

/// Test: two ticket types are locked independently.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_separate_ticket_types_do_not_interfere() {
    let store = InMemoryStore::new();
    let buyer = store.seed_user("two@example.com");
    let event = store.seed_event(buyer);
    let vip = store.seed_ticket_type(event, 3);
    let general = store.seed_ticket_type(event, 5);
    let purchase = Arc::new(PurchaseTicket::new(store.clone(), Arc::new(test_clock())));

    let mut tasks = JoinSet::new();
    for i in 0..20 {
        let purchase = Arc::clone(&purchase);
        let ticket_type = if i % 2 == 0 { vip } else { general };
        tasks.spawn(async move {
            purchase
                .purchase(request(buyer, ticket_type, format!("QR-MIX-{i}")))
                .await
        });
    }
    while tasks.join_next().await.is_some() {}

    assert_eq!(store.capacity(vip), Some(Capacity::new(3, 3)));
    assert_eq!(store.capacity(general), Some(Capacity::new(5, 5)));
}

/// Test: a panic while holding the row lock releases it.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(unreachable_code)]
async fn test_panicking_transaction_releases_lock() {
    init_test_tracing();
    let store = InMemoryStore::new();
    let buyer = store.seed_user("panic@example.com");
    let event = store.seed_event(buyer);
    let ticket_type = store.seed_ticket_type(event, 1);

    let uow = UnitOfWork::new(store.clone());
    let inner = store.clone();
    let crashed = tokio::spawn(async move {
        uow.with_transaction(move |tx| {
            Box::pin(async move {
                inner.lock_ticket_type_for_update(tx, ticket_type).await?;
                panic!("callback crashed while holding the lock");
                Ok(())
            })
        })
        .await
    })
    .await;

    assert!(crashed.unwrap_err().is_panic());
    assert_eq!(store.open_transactions(), 0);

    let purchase = PurchaseTicket::new(store.clone(), Arc::new(test_clock()));
    tokio::time::timeout(
        Duration::from_secs(5),
        purchase.purchase(request(buyer, ticket_type, "QR-AFTER-PANIC".to_string())),
    )
    .await
    .expect("lock should have been released")
    .expect("purchase should succeed");
    assert!(store.tickets().iter().all(|t| t.qr_code == "QR-AFTER-PANIC"));
}

/// Test: a purchase stuck behind a held lock is abandoned at its deadline.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_deadline_abandons_blocked_purchase() {
    let store = InMemoryStore::new();
    let buyer = store.seed_user("slow@example.com");
    let event = store.seed_event(buyer);
    let ticket_type = store.seed_ticket_type(event, 1);

    let (locked_tx, locked_rx) = tokio::sync::oneshot::channel();
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
    let holder_store = store.clone();
    let holder = tokio::spawn(async move {
        let uow = UnitOfWork::new(holder_store.clone());
        uow.with_transaction(move |tx| {
            Box::pin(async move {
                holder_store
                    .lock_ticket_type_for_update(tx, ticket_type)
                    .await?;
                let _ = locked_tx.send(());
                let _ = release_rx.await;
                Err::<(), _>(AppError::conflict("holder gives up"))
            })
        })
        .await
    });
    locked_rx.await.unwrap();

    let purchase = PurchaseTicket::new(store.clone(), Arc::new(test_clock()))
        .with_deadline(Duration::from_millis(50));
    let err = purchase
        .purchase(request(buyer, ticket_type, "QR-BLOCKED".to_string()))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Unavailable);
    assert_eq!(err.message(), "transaction deadline exceeded");

    release_tx.send(()).unwrap();
    let held = holder.await.unwrap().unwrap_err();
    assert_eq!(held, AppError::conflict("holder gives up"));
    assert!(store.tickets().is_empty());
    assert_eq!(store.open_transactions(), 0);
}

/// Test: concurrent transactions keep their own audit identity.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_audit_context_is_scoped_per_transaction() {
    let store = InMemoryStore::new();
    let alice = store.seed_user("alice@example.com");
    let bob = store.seed_user("bob@example.com");
    let event = store.seed_event(alice);
    let ticket_type = store.seed_ticket_type(event, 100);
    let purchase = Arc::new(PurchaseTicket::new(store.clone(), Arc::new(test_clock())));

    let mut tasks = JoinSet::new();
    for i in 0..20 {
        let purchase = Arc::clone(&purchase);
        let (actor, address) = if i % 2 == 0 {
            (alice, "10.0.0.1")
        } else {
            (bob, "10.0.0.2")
        };
        tasks.spawn(async move {
            let mut req = request(actor, ticket_type, format!("QR-AUD-{i}"));
            req.origin_address = address.to_string();
            purchase.purchase(req).await.map(|id| (id, actor, address))
        });
    }

    let mut expected = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        expected.push(joined.unwrap().unwrap());
    }

    let audit = store.audit_log();
    assert_eq!(audit.len(), 20);
    for (ticket_id, actor, address) in expected {
        let entry = audit
            .iter()
            .find(|e| e.row_id == *ticket_id.as_uuid())
            .expect("every ticket is audited");
        assert_eq!(entry.actor_id, Some(actor));
        assert_eq!(entry.origin_address.as_deref(), Some(address));
    }
}

/// Test: a stamp in one transaction is invisible to the next.
#[tokio::test]
async fn test_audit_context_does_not_leak_between_transactions() {
    let store = InMemoryStore::new();
    let buyer = store.seed_user("leak@example.com");
    let event = store.seed_event(buyer);
    let ticket_type = store.seed_ticket_type(event, 2);

    let uow = UnitOfWork::new(store.clone());
    let stamping = store.clone();
    uow.with_transaction(move |tx| {
        Box::pin(async move { stamping.stamp(tx, buyer, "192.0.2.1").await })
    })
    .await
    .unwrap();

    let anonymous = PurchaseTicket::new(store.clone(), Arc::new(test_clock()));
    let mut req = request(buyer, ticket_type, "QR-LEAK".to_string());
    req.origin_address = String::new();
    anonymous.purchase(req).await.unwrap();

    let audit = store.audit_log();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].origin_address, None);
}
