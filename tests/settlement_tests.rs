// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, TimeZone, Utc};
use grailcap::accrual::accrue_or_complete;
use grailcap::cadence::Cadence;
use grailcap::commands::{admin, deposits, users};
use grailcap::db;
use grailcap::error::LedgerError;
use grailcap::models::{Cryptocurrency, InvestmentStatus, NewUser, TxStatus, User, UserStatus};
use grailcap::notify::{DepositNotice, Notifier, NotifyError};
use grailcap::settlement::{DEFAULT_CONFIRMATION_DELAY, settle_pending_deposits};
use grailcap::store;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::sync::Mutex;

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<DepositNotice>>,
}

impl Notifier for RecordingNotifier {
    fn deposit_confirmed(&self, notice: &DepositNotice) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

struct BrokenMailer;

impl Notifier for BrokenMailer {
    fn deposit_confirmed(&self, notice: &DepositNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery {
            to: notice.email.clone(),
            reason: "smtp unreachable".into(),
        })
    }
}

fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, day, hour, min, 0).unwrap()
}

fn setup() -> (Connection, User) {
    let conn = db::open_in_memory().unwrap();
    let user = users::register(
        &conn,
        NewUser {
            full_name: "Grace Hopper".into(),
            email: "grace@example.com".into(),
            country: "US".into(),
            gender: "female".into(),
            is_verified: false,
            is_admin: false,
        },
        at(1, 8, 0),
    )
    .unwrap();
    (conn, user)
}

fn request(conn: &Connection, user_id: i64, plan: i64, amount: i64, now: DateTime<Utc>) -> i64 {
    let mut rng = StdRng::seed_from_u64(7);
    deposits::request_deposit(
        conn,
        user_id,
        plan,
        Decimal::from(amount),
        Cryptocurrency::Btc,
        now,
        &mut rng,
    )
    .unwrap()
    .transaction
    .id
}

#[test]
fn deposit_waits_out_the_confirmation_delay() {
    let (conn, user) = setup();
    let id = request(&conn, user.id, 2, 1000, at(1, 12, 0));
    let mailer = RecordingNotifier::default();

    let early = settle_pending_deposits(&conn, &mailer, at(1, 12, 4), DEFAULT_CONFIRMATION_DELAY)
        .unwrap();
    assert!(early.is_empty());
    assert_eq!(
        store::require_transaction(&conn, id).unwrap().status,
        TxStatus::Pending
    );
    assert!(store::require_user(&conn, user.id).unwrap().balance.is_zero());

    let settled = settle_pending_deposits(&conn, &mailer, at(1, 12, 6), DEFAULT_CONFIRMATION_DELAY)
        .unwrap();
    assert_eq!(settled, vec![id]);
    let again = settle_pending_deposits(&conn, &mailer, at(1, 12, 16), DEFAULT_CONFIRMATION_DELAY)
        .unwrap();
    assert!(again.is_empty());

    assert_eq!(
        store::require_user(&conn, user.id).unwrap().balance.to_string(),
        "1000.00"
    );
    let inv = store::active_investment(&conn, user.id).unwrap().unwrap();
    assert_eq!(inv.plan_id, 2);
    assert_eq!(inv.start_date, at(1, 12, 6));

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].email, "grace@example.com");
    assert_eq!(sent[0].plan_name, "Gold");
}

#[test]
fn failed_notification_keeps_the_credit() {
    let (conn, user) = setup();
    let id = request(&conn, user.id, 1, 250, at(1, 12, 0));

    let settled =
        settle_pending_deposits(&conn, &BrokenMailer, at(1, 13, 0), DEFAULT_CONFIRMATION_DELAY)
            .unwrap();
    assert_eq!(settled, vec![id]);
    assert_eq!(
        store::require_transaction(&conn, id).unwrap().status,
        TxStatus::Completed
    );
    assert_eq!(
        store::require_user(&conn, user.id).unwrap().balance,
        Decimal::from(250)
    );
}

#[test]
fn new_enrollment_completes_the_previous_one() {
    let (conn, user) = setup();
    let mailer = RecordingNotifier::default();
    request(&conn, user.id, 2, 1000, at(1, 12, 0));
    settle_pending_deposits(&conn, &mailer, at(1, 12, 10), DEFAULT_CONFIRMATION_DELAY).unwrap();
    let first = store::active_investment(&conn, user.id).unwrap().unwrap();
    accrue_or_complete(&conn, &first, at(2, 0, 0), &Cadence::daily()).unwrap();

    request(&conn, user.id, 3, 500, at(3, 9, 0));
    settle_pending_deposits(&conn, &mailer, at(3, 9, 10), DEFAULT_CONFIRMATION_DELAY).unwrap();

    let first = store::require_investment(&conn, first.id).unwrap();
    assert_eq!(first.status, InvestmentStatus::Completed);
    // no pro-rating of the cut-short term
    assert_eq!(first.total_profit.to_string(), "30.00");

    let active = store::list_investments(&conn, Some(user.id), true).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].plan_id, 3);
    assert_eq!(active[0].amount.to_string(), "500.00");
    assert_eq!(
        store::require_user(&conn, user.id).unwrap().balance.to_string(),
        "1530.00"
    );
}

#[test]
fn deposit_requests_are_validated() {
    let (conn, user) = setup();
    let mut rng = StdRng::seed_from_u64(1);

    let below = deposits::request_deposit(
        &conn,
        user.id,
        2,
        Decimal::from(100),
        Cryptocurrency::Sol,
        at(1, 12, 0),
        &mut rng,
    )
    .unwrap_err();
    assert!(matches!(below, LedgerError::BelowMinimum { .. }));

    let unknown = deposits::request_deposit(
        &conn,
        user.id,
        99,
        Decimal::from(1000),
        Cryptocurrency::Sol,
        at(1, 12, 0),
        &mut rng,
    )
    .unwrap_err();
    assert!(matches!(unknown, LedgerError::NotFound { .. }));

    admin::set_user_status(&conn, user.id, UserStatus::Suspended, at(1, 12, 0)).unwrap();
    let suspended = deposits::request_deposit(
        &conn,
        user.id,
        2,
        Decimal::from(1000),
        Cryptocurrency::Sol,
        at(1, 12, 0),
        &mut rng,
    )
    .unwrap_err();
    assert!(matches!(suspended, LedgerError::InactiveUser(_)));
    assert!(store::wallets_for_user(&conn, user.id).unwrap().is_empty());
}

#[test]
fn rejected_deposit_is_never_credited() {
    let (conn, user) = setup();
    let id = request(&conn, user.id, 2, 1000, at(1, 12, 0));

    let failed = deposits::reject_deposit(&conn, id, Some("no funds arrived"), at(1, 12, 2)).unwrap();
    assert_eq!(failed.status, TxStatus::Failed);
    assert_eq!(failed.note.as_deref(), Some("no funds arrived"));

    let settled = settle_pending_deposits(
        &conn,
        &RecordingNotifier::default(),
        at(2, 0, 0),
        DEFAULT_CONFIRMATION_DELAY,
    )
    .unwrap();
    assert!(settled.is_empty());
    assert!(store::require_user(&conn, user.id).unwrap().balance.is_zero());
    assert!(deposits::reject_deposit(&conn, id, None, at(2, 0, 0)).is_err());
}
