// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, TransactionBehavior};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::LedgerError;
use crate::plans;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.grailcap", "Grailcap", "grailcap"));

/// Environment variable that overrides the platform data dir.
pub const DB_ENV: &str = "GRAILCAP_DB";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(DB_ENV) {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p));
        }
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("grailcap.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    open_at(&path)
}

/// Opens (and migrates) the database at `path`. Every scheduler thread gets its
/// own connection through this.
pub fn open_at(path: &Path) -> Result<Connection> {
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Runs `f` inside a `BEGIN IMMEDIATE` transaction. The write lock is taken up
/// front, so read-then-write sequences in `f` cannot interleave with another
/// writer. Rolls back when `f` fails.
pub fn write_tx<T, F>(conn: &Connection, f: F) -> Result<T, LedgerError>
where
    F: FnOnce(&Connection) -> Result<T, LedgerError>,
{
    let tx = rusqlite::Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let out = f(&tx)?;
    tx.commit()?;
    Ok(out)
}

/// Creates missing tables and seeds the plan catalog under one write lock, so
/// connections opened side by side never race on the first writes.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    write_tx(conn, |c| {
        c.execute_batch(SCHEMA)?;
        plans::seed_default_plans(c)
    })?;
    Ok(())
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS users(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        full_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        country TEXT NOT NULL,
        gender TEXT NOT NULL,
        balance TEXT NOT NULL DEFAULT '0.00',
        status TEXT NOT NULL DEFAULT 'active'
            CHECK(status IN ('active','pending','suspended')),
        is_verified INTEGER NOT NULL DEFAULT 0,
        is_admin INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS investment_plans(
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        daily_roi TEXT NOT NULL,
        duration_days INTEGER NOT NULL,
        min_investment TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS investments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        plan_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        daily_roi TEXT NOT NULL, -- copied from the plan at enrollment
        duration_days INTEGER NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active','completed')),
        total_profit TEXT NOT NULL DEFAULT '0.00',
        last_accrual_at TEXT, -- start of the tick that last credited ROI
        created_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id),
        FOREIGN KEY(plan_id) REFERENCES investment_plans(id)
    );
    CREATE INDEX IF NOT EXISTS idx_investments_user ON investments(user_id);
    CREATE UNIQUE INDEX IF NOT EXISTS idx_investments_one_active
        ON investments(user_id) WHERE status = 'active';

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('deposit','withdrawal','roi')),
        amount TEXT NOT NULL,
        cryptocurrency TEXT,
        wallet_address TEXT,
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK(status IN ('pending','completed','failed')),
        note TEXT,
        plan_id INTEGER,
        investment_id INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id)
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);
    CREATE INDEX IF NOT EXISTS idx_transactions_pending ON transactions(type, status);

    CREATE TABLE IF NOT EXISTS wallets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        cryptocurrency TEXT NOT NULL,
        address TEXT NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS job_watermarks(
        job TEXT PRIMARY KEY,
        last_tick TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"#;
