// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Duration, TimeZone, Utc};
use grailcap::accrual::{AccrualOutcome, accrue_or_complete, run_accrual_sweep};
use grailcap::cadence::Cadence;
use grailcap::commands::doctor::{self, Issue};
use grailcap::commands::{admin, deposits, reports, users, withdrawals};
use grailcap::db;
use grailcap::error::LedgerError;
use grailcap::models::{Cryptocurrency, NewUser, TxKind, TxStatus, User, UserStatus};
use grailcap::notify::LogNotifier;
use grailcap::settlement::{DEFAULT_CONFIRMATION_DELAY, settle_pending_deposits};
use grailcap::store::{self, TxFilter};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::path::Path;
use std::thread;
use std::time::Duration as StdDuration;

const ETH_ADDRESS: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, day, hour, min, 0).unwrap()
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        full_name: "Katherine Johnson".into(),
        email: email.into(),
        country: "US".into(),
        gender: "female".into(),
        is_verified: false,
        is_admin: false,
    }
}

/// User with 1000 in Gold, settled Aug 1 12:06.
fn setup() -> (Connection, User) {
    let conn = db::open_in_memory().unwrap();
    let user = fund(&conn);
    (conn, user)
}

fn fund(conn: &Connection) -> User {
    let user = users::register(conn, new_user("kj@example.com"), at(1, 8, 0)).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    deposits::request_deposit(
        conn,
        user.id,
        2,
        Decimal::from(1000),
        Cryptocurrency::Eth,
        at(1, 12, 0),
        &mut rng,
    )
    .unwrap();
    settle_pending_deposits(conn, &LogNotifier, at(1, 12, 6), DEFAULT_CONFIRMATION_DELAY)
        .unwrap();
    user
}

fn file_db(dir: &Path) -> (std::path::PathBuf, Connection) {
    let path = dir.join("grailcap.sqlite");
    let conn = db::open_at(&path).unwrap();
    (path, conn)
}

fn balance(conn: &Connection, id: i64) -> Decimal {
    store::require_user(conn, id).unwrap().balance
}

#[test]
fn emails_are_unique_ignoring_case() {
    let conn = db::open_in_memory().unwrap();
    users::register(&conn, new_user("kj@example.com"), at(1, 8, 0)).unwrap();
    let dup = users::register(&conn, new_user("KJ@Example.com"), at(1, 8, 0)).unwrap_err();
    assert!(matches!(dup, LedgerError::DuplicateEmail(_)));
    let bad = users::register(&conn, new_user("not-an-email"), at(1, 8, 0)).unwrap_err();
    assert!(matches!(bad, LedgerError::Parse(_)));
}

#[test]
fn withdrawal_debits_and_records() {
    let (conn, user) = setup();
    let tx = withdrawals::withdraw(
        &conn,
        user.id,
        Decimal::from(200),
        Cryptocurrency::Eth,
        ETH_ADDRESS,
        at(2, 9, 0),
    )
    .unwrap();
    assert_eq!(tx.kind, TxKind::Withdrawal);
    assert_eq!(tx.status, TxStatus::Completed);
    assert_eq!(tx.wallet_address.as_deref(), Some(ETH_ADDRESS));
    assert_eq!(balance(&conn, user.id).to_string(), "800.00");
}

#[test]
fn withdrawals_below_minimum_or_above_balance_are_rejected() {
    let (conn, user) = setup();
    let w = |amount: Decimal, address: &str| {
        withdrawals::withdraw(&conn, user.id, amount, Cryptocurrency::Eth, address, at(2, 9, 0))
    };

    // minimum is a tenth of 1000
    let small = w(Decimal::from(50), ETH_ADDRESS).unwrap_err();
    assert!(matches!(small, LedgerError::BelowMinimum { .. }));
    let large = w(Decimal::from(2000), ETH_ADDRESS).unwrap_err();
    assert!(matches!(large, LedgerError::InsufficientBalance { .. }));
    let negative = w(Decimal::from(-5), ETH_ADDRESS).unwrap_err();
    assert!(matches!(negative, LedgerError::InvalidAmount(_)));
    let nowhere = w(Decimal::from(200), "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq").unwrap_err();
    assert!(matches!(nowhere, LedgerError::InvalidAddress { .. }));

    admin::set_user_status(&conn, user.id, UserStatus::Suspended, at(2, 8, 0)).unwrap();
    let blocked = w(Decimal::from(200), ETH_ADDRESS).unwrap_err();
    assert!(matches!(blocked, LedgerError::InactiveUser(_)));

    assert_eq!(balance(&conn, user.id).to_string(), "1000.00");
    let outgoing = store::list_transactions(
        &conn,
        &TxFilter {
            kind: Some(TxKind::Withdrawal),
            ..TxFilter::default()
        },
    )
    .unwrap();
    assert!(outgoing.is_empty());
}

#[test]
fn balance_equals_ledger_after_mixed_activity() {
    let (conn, user) = setup();
    let daily = Cadence::daily();
    for day in 2..=4 {
        run_accrual_sweep(&conn, at(day, 0, 0), &daily).unwrap();
    }
    withdrawals::withdraw(
        &conn,
        user.id,
        Decimal::new(12345, 2),
        Cryptocurrency::Eth,
        ETH_ADDRESS,
        at(4, 10, 0),
    )
    .unwrap();
    run_accrual_sweep(&conn, at(5, 0, 0), &daily).unwrap();

    // 1000 + 4 * 30 - 123.45
    assert_eq!(balance(&conn, user.id).to_string(), "996.55");
    assert!(doctor::reconcile(&conn).unwrap().is_empty());

    let dash = reports::user_dashboard(&conn, user.id, at(5, 13, 0)).unwrap();
    assert_eq!(dash.total_profit.to_string(), "120.00");
    let values: Vec<String> = dash.performance.iter().map(|p| p.value.to_string()).collect();
    assert_eq!(values, ["1000.00", "1030.00", "1060.00", "1090.00", "1120.00"]);
    assert_eq!(dash.performance[0].date, at(1, 0, 0).date_naive());
    let plan = dash.active_plan.unwrap();
    assert_eq!(plan.daily_growth.to_string(), "30.00");
    assert_eq!(plan.plan_name, "Gold");
    assert_eq!(plan.days_invested, 4);
    assert_eq!(plan.days_remaining, 10);
    assert_eq!(plan.progress_percent, 28);

    let stats = admin::dashboard_stats(&conn, at(5, 13, 0)).unwrap();
    assert_eq!(stats.total_users, 1);
    assert_eq!(stats.new_users, 1);
    assert_eq!(stats.active_investments, 1);
    assert_eq!(stats.total_deposits.to_string(), "1000.00");
    assert_eq!(stats.total_withdrawals.to_string(), "123.45");
    assert_eq!(stats.total_roi_paid.to_string(), "120.00");
}

#[test]
fn doctor_reports_injected_drift() {
    let (conn, user) = setup();
    conn.execute(
        "UPDATE users SET balance='1010.00' WHERE id=?1",
        params![user.id],
    )
    .unwrap();

    let issues = doctor::reconcile(&conn).unwrap();
    assert_eq!(
        issues,
        vec![Issue::BalanceDrift {
            user_id: user.id,
            stored: Decimal::new(101000, 2),
            ledger: Decimal::new(100000, 2),
        }]
    );
}

#[test]
fn admins_are_not_verified_implicitly() {
    let conn = db::open_in_memory().unwrap();
    let admin = users::register(
        &conn,
        NewUser {
            is_admin: true,
            ..new_user("ops@example.com")
        },
        at(1, 8, 0),
    )
    .unwrap();
    assert!(admin.is_admin);
    assert!(!admin.is_verified);

    let verified = users::register(
        &conn,
        NewUser {
            is_verified: true,
            ..new_user("kyc@example.com")
        },
        at(1, 8, 0),
    )
    .unwrap();
    assert!(verified.is_verified);
    assert!(!verified.is_admin);
}

#[test]
fn sub_cent_withdrawal_is_rounded_before_the_debit() {
    let (conn, user) = setup();
    let tx = withdrawals::withdraw(
        &conn,
        user.id,
        Decimal::new(100005, 3),
        Cryptocurrency::Eth,
        ETH_ADDRESS,
        at(2, 9, 0),
    )
    .unwrap();
    assert_eq!(tx.amount.to_string(), "100.01");
    assert_eq!(balance(&conn, user.id).to_string(), "899.99");
    assert!(doctor::reconcile(&conn).unwrap().is_empty());
}

#[test]
fn sub_cent_deposit_is_checked_at_its_stored_value() {
    let conn = db::open_in_memory().unwrap();
    let user = users::register(&conn, new_user("kj@example.com"), at(1, 8, 0)).unwrap();
    // 149.995 rounds to the Gold minimum of 150.00
    let req = deposits::request_deposit(
        &conn,
        user.id,
        2,
        Decimal::new(149995, 3),
        Cryptocurrency::Btc,
        at(1, 12, 0),
        &mut StdRng::seed_from_u64(9),
    )
    .unwrap();
    assert_eq!(req.transaction.amount.to_string(), "150.00");
    settle_pending_deposits(&conn, &LogNotifier, at(1, 12, 10), DEFAULT_CONFIRMATION_DELAY)
        .unwrap();
    assert_eq!(balance(&conn, user.id).to_string(), "150.00");
    assert!(doctor::reconcile(&conn).unwrap().is_empty());
}

#[test]
fn concurrent_credits_are_never_lost() {
    let dir = tempfile::tempdir().unwrap();
    let (path, conn) = file_db(dir.path());
    let user = users::register(&conn, new_user("kj@example.com"), at(1, 8, 0)).unwrap();

    // Connections are opened up front and handed to the threads.
    let conns: Vec<Connection> = (0..4).map(|_| db::open_at(&path).unwrap()).collect();
    let workers: Vec<_> = conns
        .into_iter()
        .map(|c| {
            let id = user.id;
            thread::spawn(move || {
                for _ in 0..200 {
                    db::write_tx(&c, |tx| store::adjust_balance(tx, id, Decimal::ONE, Utc::now()))
                        .unwrap();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(balance(&conn, user.id), Decimal::from(800));
}

#[test]
fn withdrawals_and_accruals_interleave_without_drift() {
    let dir = tempfile::tempdir().unwrap();
    let (path, conn) = file_db(dir.path());
    let user = fund(&conn);
    let investment_id = store::active_investment(&conn, user.id).unwrap().unwrap().id;

    let accrual_conn = db::open_at(&path).unwrap();
    let withdraw_conn = db::open_at(&path).unwrap();
    let user_id = user.id;

    let accruer = thread::spawn(move || {
        let minutely = Cadence::every(StdDuration::from_secs(60));
        for i in 1..=20 {
            let inv = store::require_investment(&accrual_conn, investment_id).unwrap();
            let as_of = at(2, 0, 0) + Duration::minutes(i);
            let out = accrue_or_complete(&accrual_conn, &inv, as_of, &minutely).unwrap();
            assert!(matches!(out, AccrualOutcome::Credited { .. }));
        }
    });
    let withdrawer = thread::spawn(move || {
        for i in 0..5 {
            withdrawals::withdraw(
                &withdraw_conn,
                user_id,
                Decimal::from(200),
                Cryptocurrency::Eth,
                ETH_ADDRESS,
                at(2, 1, 0) + Duration::minutes(i),
            )
            .unwrap();
        }
    });
    accruer.join().unwrap();
    withdrawer.join().unwrap();

    // 1000 + 20 * 30 - 5 * 200
    assert_eq!(balance(&conn, user.id).to_string(), "600.00");
    assert!(doctor::reconcile(&conn).unwrap().is_empty());
}
