//! Bulk ingestion tests against the in-memory store.
//!
//! Run with: `cargo test --test batch_test -- --nocapture`

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use ticketing::{BatchImport, BatchRequest};
use time2meet_core::batch::{
    BatchError, BatchResult, ImportEventItem, ImportTicketItem, ImportUserItem,
};
use time2meet_core::environment::Clock;
use time2meet_core::error::ErrorCode;
use time2meet_core::ids::UserId;
use time2meet_core::status::{EventStatus, TicketStatus, UserRole};
use time2meet_testing::{InMemoryStore, init_test_tracing, test_clock};

fn user(email: &str) -> ImportUserItem {
    ImportUserItem {
        email: email.to_string(),
        password_hash: "$argon2id$v=19$stub".to_string(),
        full_name: "Imported User".to_string(),
        phone: String::new(),
        role: "attendee".to_string(),
    }
}

fn batch<I>(actor_id: UserId, continue_on_error: bool, items: Vec<I>) -> BatchRequest<I> {
    BatchRequest {
        actor_id,
        origin_address: "203.0.113.9".to_string(),
        continue_on_error,
        items,
    }
}

#[tokio::test]
async fn continue_mode_keeps_good_rows() {
    init_test_tracing();
    let store = InMemoryStore::new();
    let admin = store.seed_user("admin@example.com");
    let import = BatchImport::new(store.clone());

    let result = import
        .import_users(batch(
            admin,
            true,
            vec![
                user("first@example.com"),
                user("not-an-email"),
                user("admin@example.com"),
                user("second@example.com"),
            ],
        ))
        .await
        .expect("continue mode commits");

    assert_eq!(result.total, 4);
    assert_eq!(result.success, 2);
    assert_eq!(result.failed, 2);
    assert_eq!(
        result.errors.iter().map(|e| e.index).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert!(result.errors[0].error.contains("invalid email"));
    assert!(result.errors[1].error.starts_with("unique constraint violated"));

    let emails: Vec<_> = store.users().into_iter().map(|u| u.email).collect();
    assert_eq!(
        emails,
        vec!["admin@example.com", "first@example.com", "second@example.com"]
    );
    assert_eq!(store.commits(), 1);
}

#[tokio::test]
async fn stop_mode_rolls_back_everything() {
    let store = InMemoryStore::new();
    let admin = store.seed_user("admin@example.com");
    let import = BatchImport::new(store.clone());

    let err = import
        .import_users(batch(
            admin,
            false,
            vec![
                user("kept-until-abort@example.com"),
                user("dup@example.com"),
                user("dup@example.com"),
                user("never-reached@example.com"),
            ],
        ))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), "batch import users failed");
    let cause = err.cause().unwrap();
    assert!(cause.starts_with("row 2: unique constraint violated"), "{cause}");

    assert_eq!(store.users().len(), 1);
    assert!(store.audit_log().is_empty());
    assert_eq!(store.open_transactions(), 0);
}

#[tokio::test]
async fn empty_batch_opens_no_transaction() {
    let store = InMemoryStore::new();
    store.fail_begin(true);
    let import = BatchImport::new(store.clone());

    let result = import
        .import_events(batch(UserId::nil(), false, Vec::new()))
        .await
        .unwrap();

    assert_eq!(result, BatchResult::new(0));
    assert_eq!(store.commits(), 0);
}

#[tokio::test]
async fn events_with_missing_organizer_fail_per_row() {
    let store = InMemoryStore::new();
    let organizer = store.seed_user("org@example.com");
    let import = BatchImport::new(store.clone());

    let event = |organizer_id: String, title: &str| ImportEventItem {
        organizer_id,
        title: title.to_string(),
        description: "  ".to_string(),
        status: "published".to_string(),
        is_public: true,
        max_participants: Some(250),
        cover_image: String::new(),
    };

    let result = import
        .import_events(batch(
            organizer,
            true,
            vec![
                event(organizer.to_string(), "Rust Meetup"),
                event(UserId::new().to_string(), "Ghost Meetup"),
                event(organizer.to_string(), ""),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(result.success, 1);
    assert_eq!(result.failed, 2);
    assert!(result.errors[0].error.starts_with("referenced row does not exist"));
    assert_eq!(result.errors[1].error, "title is required");

    let events = store.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Rust Meetup");
    assert_eq!(events[0].status, EventStatus::Published);
    assert_eq!(events[0].description, None);
    assert_eq!(events[0].cover_image, None);
}

#[tokio::test]
async fn tickets_default_purchase_date_to_now() {
    let clock = Arc::new(test_clock());
    let store = InMemoryStore::with_clock(clock.clone());
    let buyer = store.seed_user("buyer@example.com");
    let event = store.seed_event(buyer);
    let ticket_type = store.seed_ticket_type(event, 10);
    let import = BatchImport::new(store.clone());
    let backdated = Utc.with_ymd_and_hms(2024, 6, 1, 18, 30, 0).unwrap();

    let ticket = |qr: &str, purchase_date| ImportTicketItem {
        ticket_type_id: ticket_type.to_string(),
        buyer_id: buyer.to_string(),
        purchase_date,
        status: "paid".to_string(),
        qr_code: qr.to_string(),
        amount_paid: "12.5".to_string(),
    };

    let result = import
        .import_tickets(batch(
            buyer,
            false,
            vec![ticket("QR-NOW", None), ticket("QR-THEN", Some(backdated))],
        ))
        .await
        .unwrap();
    assert_eq!(result.success, 2);

    let tickets = store.tickets();
    assert_eq!(tickets[0].purchase_date, clock.now());
    assert_eq!(tickets[1].purchase_date, backdated);
    assert!(tickets.iter().all(|t| t.status == TicketStatus::Paid));
    assert_eq!(tickets[0].amount_paid.to_string(), "12.50");
}

#[tokio::test]
async fn anonymous_import_is_audited_without_actor() {
    let store = InMemoryStore::new();
    let import = BatchImport::new(store.clone());

    let mut request = batch(UserId::nil(), false, vec![user("anon@example.com")]);
    request.origin_address = String::new();
    import.import_users(request).await.unwrap();

    let audit = store.audit_log();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].table, "users");
    assert_eq!(audit[0].actor_id, None);
    assert_eq!(audit[0].origin_address, None);
    assert_eq!(store.users()[0].role, UserRole::Attendee);
}

#[tokio::test]
async fn audited_rows_carry_the_importer() {
    let store = InMemoryStore::new();
    let admin = store.seed_user("admin@example.com");
    let import = BatchImport::new(store.clone());

    import
        .import_users(batch(
            admin,
            true,
            vec![user("a@example.com"), user("bad"), user("b@example.com")],
        ))
        .await
        .unwrap();

    let audit = store.audit_log();
    assert_eq!(audit.len(), 2);
    assert!(audit.iter().all(|e| e.actor_id == Some(admin)));
    assert!(
        audit
            .iter()
            .all(|e| e.origin_address.as_deref() == Some("203.0.113.9"))
    );
}

#[tokio::test]
async fn request_and_result_json_shape() {
    let request: BatchRequest<ImportUserItem> = serde_json::from_value(json!({
        "continue_on_error": true,
        "items": [{
            "email": "json@example.com",
            "password_hash": "h",
            "full_name": "Jay Son",
            "role": "organizer"
        }]
    }))
    .unwrap();
    assert!(request.actor_id.is_nil());
    assert!(request.origin_address.is_empty());
    assert_eq!(request.items[0].phone, "");

    let result = BatchResult {
        total: 2,
        success: 1,
        failed: 1,
        errors: vec![BatchError {
            index: 1,
            error: "email is empty".to_string(),
        }],
    };
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({
            "total": 2,
            "success": 1,
            "failed": 1,
            "errors": [{ "index": 1, "error": "email is empty" }]
        })
    );
}
