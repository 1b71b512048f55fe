//! Integration tests for CashRegisterLedger.

mod common;

use chrono::Utc;
use common::{today, TestPos, PASSWORD};
use meridian_core::{CashRegister, Direction, ErrorKind, LedgerEntryKind, Money, RegisterKind};
use meridian_db::RegisterRepository;
use meridian_engine::{Actor, RegisterDraft};

fn cents(value: i64) -> Money {
    Money::from_cents(value)
}

async fn open(pos: &TestPos, kind: RegisterKind, opening_cents: i64) -> String {
    pos.ledger()
        .open(RegisterDraft::new(kind, cents(opening_cents)), &pos.actor)
        .await
        .unwrap()
}

// =============================================================================
// Open
// =============================================================================

#[tokio::test]
async fn opening_balance_is_the_first_ledger_entry() {
    let pos = TestPos::spawn().await;
    let id = open(&pos, RegisterKind::Drawer, 1).await;

    let entries = pos.ledger().entries(&id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, LedgerEntryKind::OpeningBalance);
    assert_eq!(entries[0].direction, Direction::Entry);
    assert_eq!(entries[0].amount(), cents(1));
    assert_eq!(entries[0].description, "Cash drawer opening");
    assert_eq!(entries[0].user_id, pos.actor.user_id);

    let register = pos.ledger().get(&id).await.unwrap();
    assert!(register.is_open());
    assert_eq!(register.opening_balance(), cents(1));
    assert_eq!(register.running_total(), cents(1));
    assert_eq!(register.description, "Daily cash drawer");
    assert_eq!(register.opened_by, pos.actor.user_id);
    assert_eq!(register.opened_on, today());
}

#[tokio::test]
async fn zero_opening_balance_writes_no_entry() {
    let pos = TestPos::spawn().await;
    let id = open(&pos, RegisterKind::Safe, 0).await;

    assert!(pos.ledger().entries(&id).await.unwrap().is_empty());
    assert_eq!(pos.ledger().get(&id).await.unwrap().running_total(), Money::zero());
}

#[tokio::test]
async fn negative_opening_balance_is_validation() {
    let pos = TestPos::spawn().await;

    let err = pos
        .ledger()
        .open(RegisterDraft::new(RegisterKind::Drawer, cents(-1)), &pos.actor)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(pos.ledger().list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn only_one_drawer_and_one_safe_may_be_open() {
    let pos = TestPos::spawn().await;
    open(&pos, RegisterKind::Drawer, 1000).await;
    open(&pos, RegisterKind::Safe, 0).await;

    let other = pos.add_user("bruno", "other-pass").await;
    let err = pos
        .ledger()
        .open(RegisterDraft::new(RegisterKind::Drawer, cents(0)), &other)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::StateConflict);
    assert_eq!(err.message, "A drawer register is already open");

    let err = pos
        .ledger()
        .open(RegisterDraft::new(RegisterKind::Safe, cents(0)), &pos.actor)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::StateConflict);

    open(&pos, RegisterKind::Bank, 0).await;
    open(&pos, RegisterKind::Bank, 0).await;

    assert_eq!(pos.ledger().list_open().await.unwrap().len(), 4);
    assert_eq!(
        pos.ledger()
            .list_open_by_kind(RegisterKind::Bank)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn unique_index_rejects_a_second_open_drawer() {
    let pos = TestPos::spawn().await;
    open(&pos, RegisterKind::Drawer, 0).await;

    let now = Utc::now();
    let duplicate = CashRegister {
        id: "drawer-2".to_string(),
        kind: RegisterKind::Drawer,
        description: "Second drawer".to_string(),
        opening_balance_cents: 0,
        running_total_cents: 0,
        closing_balance_cents: None,
        opened_by: pos.actor.user_id.clone(),
        opened_on: now.date_naive(),
        agency: None,
        account: None,
        opened_at: now,
        closed_at: None,
    };

    let mut conn = pos.db.acquire().await.unwrap();
    let err = RegisterRepository::insert(&mut conn, &duplicate)
        .await
        .unwrap_err();

    assert!(err.is_unique_violation_on(meridian_db::OPEN_REGISTER_UNIQUE_COLUMN));
}

#[tokio::test]
async fn bank_details_are_reduced_to_digits() {
    let pos = TestPos::spawn().await;
    let draft = RegisterDraft {
        kind: RegisterKind::Bank,
        description: Some("  Main account ".to_string()),
        opening_balance: cents(250000),
        agency: Some("0123-4".to_string()),
        account: Some("98.765-0".to_string()),
    };

    let id = pos.ledger().open(draft, &pos.actor).await.unwrap();
    let bank = pos.ledger().get(&id).await.unwrap();

    assert_eq!(bank.description, "Main account");
    assert_eq!(bank.agency.as_deref(), Some("01234"));
    assert_eq!(bank.account.as_deref(), Some("987650"));

    let entries = pos.ledger().entries(&id).await.unwrap();
    assert_eq!(entries[0].description, "Bank account opening");
}

#[tokio::test]
async fn drawer_ignores_bank_details() {
    let pos = TestPos::spawn().await;
    let draft = RegisterDraft {
        agency: Some("0123".to_string()),
        account: Some("4567".to_string()),
        ..RegisterDraft::new(RegisterKind::Drawer, cents(0))
    };

    let id = pos.ledger().open(draft, &pos.actor).await.unwrap();
    let drawer = pos.ledger().get(&id).await.unwrap();

    assert_eq!(drawer.agency, None);
    assert_eq!(drawer.account, None);
}

#[tokio::test]
async fn unknown_operator_cannot_open() {
    let pos = TestPos::spawn().await;

    let err = pos
        .ledger()
        .open(
            RegisterDraft::new(RegisterKind::Drawer, cents(0)),
            &Actor::new("ghost"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(!pos.ledger().drawer_is_open().await.unwrap());
}

// =============================================================================
// Close
// =============================================================================

#[tokio::test]
async fn close_freezes_the_running_total() {
    let pos = TestPos::spawn().await;
    let id = open(&pos, RegisterKind::Drawer, 4200).await;

    let closed = pos.ledger().close(&id, PASSWORD, &pos.actor).await.unwrap();

    assert_eq!(closed.register_id, id);
    assert_eq!(closed.kind, RegisterKind::Drawer);
    assert_eq!(closed.closing_balance, cents(4200));

    let register = pos.ledger().get(&id).await.unwrap();
    assert!(!register.is_open());
    assert_eq!(register.closing_balance(), Some(cents(4200)));
    assert!(register.closed_at.is_some());
    assert!(!pos.ledger().drawer_is_open().await.unwrap());
}

#[tokio::test]
async fn close_checks_run_in_order() {
    let pos = TestPos::spawn().await;
    let id = open(&pos, RegisterKind::Drawer, 0).await;
    let ledger = pos.ledger();

    let err = ledger.close("no-such-register", "  ", &pos.actor).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.message, "Password is required");

    let err = ledger
        .close("no-such-register", "wrong", &pos.actor)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Auth);
    assert_eq!(err.message, "Incorrect password");

    let err = ledger
        .close("no-such-register", PASSWORD, &pos.actor)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    ledger.close(&id, PASSWORD, &pos.actor).await.unwrap();
    let err = ledger.close(&id, PASSWORD, &pos.actor).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::StateConflict);
}

#[tokio::test]
async fn wrong_password_leaves_the_register_open() {
    let pos = TestPos::spawn().await;
    let id = open(&pos, RegisterKind::Drawer, 0).await;

    let err = pos.ledger().close(&id, "guess", &pos.actor).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Auth);
    assert!(pos.ledger().get(&id).await.unwrap().is_open());
}

#[tokio::test]
async fn password_is_checked_against_the_closing_operator() {
    let pos = TestPos::spawn().await;
    let id = open(&pos, RegisterKind::Drawer, 0).await;
    let bruno = pos.add_user("bruno", "bruno-pass").await;

    let err = pos.ledger().close(&id, PASSWORD, &bruno).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Auth);

    pos.ledger().close(&id, "bruno-pass", &bruno).await.unwrap();
}

#[tokio::test]
async fn unknown_operator_cannot_close() {
    let pos = TestPos::spawn().await;
    let id = open(&pos, RegisterKind::Drawer, 0).await;

    let err = pos
        .ledger()
        .close(&id, PASSWORD, &Actor::new("ghost"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Auth);
}

#[tokio::test]
async fn a_new_drawer_can_open_after_close() {
    let pos = TestPos::spawn().await;
    let first = open(&pos, RegisterKind::Drawer, 1000).await;
    pos.ledger().close(&first, PASSWORD, &pos.actor).await.unwrap();

    let second = open(&pos, RegisterKind::Drawer, 500).await;

    assert_ne!(first, second);
    assert!(pos.ledger().drawer_is_open().await.unwrap());
    assert_eq!(pos.ledger().list_all().await.unwrap().len(), 2);
    assert_eq!(
        pos.ledger().get(&first).await.unwrap().closing_balance(),
        Some(cents(1000))
    );
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test]
async fn open_register_of_follows_the_operator() {
    let pos = TestPos::spawn().await;
    let bruno = pos.add_user("bruno", "bruno-pass").await;

    assert!(pos.ledger().open_register_of(&pos.actor).await.unwrap().is_none());

    let id = open(&pos, RegisterKind::Drawer, 0).await;

    let found = pos.ledger().open_register_of(&pos.actor).await.unwrap().unwrap();
    assert_eq!(found.id, id);
    assert!(pos.ledger().open_register_of(&bruno).await.unwrap().is_none());

    pos.ledger().close(&id, PASSWORD, &pos.actor).await.unwrap();
    assert!(pos.ledger().open_register_of(&pos.actor).await.unwrap().is_none());
}

#[tokio::test]
async fn registers_are_listed_by_business_date() {
    let pos = TestPos::spawn().await;
    let id = open(&pos, RegisterKind::Drawer, 0).await;
    pos.ledger().close(&id, PASSWORD, &pos.actor).await.unwrap();
    open(&pos, RegisterKind::Safe, 0).await;

    assert_eq!(pos.ledger().list_opened_on(today()).await.unwrap().len(), 2);

    let yesterday = today().pred_opt().unwrap();
    assert!(pos.ledger().list_opened_on(yesterday).await.unwrap().is_empty());
}

#[tokio::test]
async fn entries_of_unknown_register_is_not_found() {
    let pos = TestPos::spawn().await;

    let err = pos.ledger().entries("no-such-register").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = pos.ledger().get("no-such-register").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
