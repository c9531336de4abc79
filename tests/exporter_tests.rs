// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{TimeZone, Utc};
use grailcap::commands::{deposits, exporter, users};
use grailcap::models::{Cryptocurrency, NewUser};
use grailcap::notify::LogNotifier;
use grailcap::settlement::{DEFAULT_CONFIRMATION_DELAY, settle_pending_deposits};
use grailcap::{cli, db};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tempfile::tempdir;

/// One settled Silver deposit and one still pending.
fn base_conn() -> Connection {
    let conn = db::open_in_memory().unwrap();
    let t0 = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
    let user = users::register(
        &conn,
        NewUser {
            full_name: "Edsger Dijkstra".into(),
            email: "ewd@example.com".into(),
            country: "NL".into(),
            gender: "male".into(),
            is_verified: false,
            is_admin: false,
        },
        t0,
    )
    .unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    deposits::request_deposit(&conn, user.id, 1, Decimal::from(300), Cryptocurrency::Btc, t0, &mut rng)
        .unwrap();
    settle_pending_deposits(
        &conn,
        &LogNotifier,
        t0 + chrono::Duration::minutes(10),
        DEFAULT_CONFIRMATION_DELAY,
    )
    .unwrap();
    deposits::request_deposit(
        &conn,
        user.id,
        2,
        Decimal::from(150),
        Cryptocurrency::Sol,
        t0 + chrono::Duration::hours(1),
        &mut rng,
    )
    .unwrap();
    conn
}

fn run_export(conn: &Connection, format: &str, out: &str) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from([
        "grailcap",
        "export",
        "transactions",
        "--format",
        format,
        "--out",
        out,
    ]);
    match matches.subcommand() {
        Some(("export", export_m)) => exporter::handle(conn, export_m),
        _ => panic!("no export subcommand"),
    }
}

#[test]
fn csv_export_lists_the_ledger_oldest_first() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("ledger.csv");
    run_export(&conn, "csv", &out_path.to_string_lossy()).unwrap();

    let mut rdr = csv::Reader::from_path(&out_path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[3], "type");
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][4], "300.00");
    assert_eq!(&rows[0][7], "completed");
    assert_eq!(&rows[1][5], "sol");
    assert_eq!(&rows[1][7], "pending");
}

#[test]
fn json_export_is_an_array_of_transactions() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("ledger.json");
    run_export(&conn, "JSON", &out_path.to_string_lossy()).unwrap();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["type"], "deposit");
    assert_eq!(items[0]["note"], "Deposit for Silver plan");
    assert_eq!(items[1]["plan_id"], 2);
}

#[test]
fn unknown_format_writes_nothing() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("ledger.xml");
    assert!(run_export(&conn, "xml", &out_path.to_string_lossy()).is_err());
    assert!(!out_path.exists());
}
