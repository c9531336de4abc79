// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger store: row-level reads and writes over users, investments,
//! transactions, wallets and job watermarks.
//!
//! Functions here never open a transaction themselves. Operations that touch
//! more than one row wrap their calls in [`crate::db::write_tx`].

use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::models::{
    Cryptocurrency, INVESTMENT_COLUMNS, Investment, InvestmentStatus, NewInvestment,
    NewTransaction, NewUser, TRANSACTION_COLUMNS, Transaction, TxKind, TxStatus, USER_COLUMNS,
    User, UserStatus, WALLET_COLUMNS, Wallet,
};
use crate::utils::to_money;

const CAS_ATTEMPTS: usize = 8;

// ---------- users ----------

pub fn create_user(conn: &Connection, new: &NewUser, now: DateTime<Utc>) -> Result<User> {
    let email = new.email.trim();
    if find_user_by_email(conn, email)?.is_some() {
        return Err(LedgerError::DuplicateEmail(email.to_string()));
    }
    conn.execute(
        "INSERT INTO users(full_name, email, country, gender, balance, status, is_verified, is_admin, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, '0.00', ?5, ?6, ?7, ?8, ?8)",
        params![
            new.full_name.trim(),
            email,
            new.country.trim(),
            new.gender.trim(),
            UserStatus::Active,
            new.is_verified,
            new.is_admin,
            now
        ],
    )?;
    require_user(conn, conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id=?1");
    Ok(conn.query_row(&sql, params![id], User::from_row).optional()?)
}

pub fn require_user(conn: &Connection, id: i64) -> Result<User> {
    get_user(conn, id)?.ok_or(LedgerError::NotFound { entity: "User", id })
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email=?1 COLLATE NOCASE");
    Ok(conn
        .query_row(&sql, params![email.trim()], User::from_row)
        .optional()?)
}

pub fn all_users(conn: &Connection) -> Result<Vec<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], User::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn set_user_status(
    conn: &Connection,
    id: i64,
    status: UserStatus,
    now: DateTime<Utc>,
) -> Result<User> {
    let changed = conn.execute(
        "UPDATE users SET status=?1, updated_at=?2 WHERE id=?3",
        params![status, now, id],
    )?;
    if changed == 0 {
        return Err(LedgerError::NotFound { entity: "User", id });
    }
    require_user(conn, id)
}

/// Applies `delta` to the user's balance as one atomic step and returns the new
/// balance. The write is a compare-and-swap on the previous value, retried when
/// another writer got in between, so a concurrent credit and debit can never
/// lose each other. Refuses to take the balance below zero.
pub fn adjust_balance(
    conn: &Connection,
    user_id: i64,
    delta: Decimal,
    now: DateTime<Utc>,
) -> Result<Decimal> {
    let delta = to_money(delta);
    for attempt in 0..CAS_ATTEMPTS {
        let raw: String = conn
            .query_row(
                "SELECT balance FROM users WHERE id=?1",
                params![user_id],
                |r| r.get(0),
            )
            .optional()?
            .ok_or(LedgerError::NotFound {
                entity: "User",
                id: user_id,
            })?;
        let current = raw
            .parse::<Decimal>()
            .map_err(|e| LedgerError::Parse(format!("balance '{}' of user #{}: {}", raw, user_id, e)))?;
        let next = to_money(current + delta);
        if next < Decimal::ZERO {
            return Err(LedgerError::InsufficientBalance {
                available: current,
                requested: -delta,
            });
        }
        let changed = conn.execute(
            "UPDATE users SET balance=?1, updated_at=?2 WHERE id=?3 AND balance=?4",
            params![next.to_string(), now, user_id, raw],
        )?;
        if changed == 1 {
            return Ok(next);
        }
        debug!(
            "balance of user #{} changed concurrently, retrying (attempt {})",
            user_id,
            attempt + 1
        );
    }
    Err(LedgerError::Contention(user_id))
}

// ---------- investments ----------

pub fn create_investment(
    conn: &Connection,
    new: &NewInvestment,
    now: DateTime<Utc>,
) -> Result<Investment> {
    conn.execute(
        "INSERT INTO investments(user_id, plan_id, amount, daily_roi, duration_days, start_date, end_date, status, total_profit, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, '0.00', ?9)",
        params![
            new.user_id,
            new.plan_id,
            to_money(new.amount).to_string(),
            new.daily_roi.to_string(),
            new.duration_days,
            new.start_date,
            new.end_date,
            InvestmentStatus::Active,
            now
        ],
    )?;
    require_investment(conn, conn.last_insert_rowid())
}

pub fn get_investment(conn: &Connection, id: i64) -> Result<Option<Investment>> {
    let sql = format!("SELECT {INVESTMENT_COLUMNS} FROM investments WHERE id=?1");
    Ok(conn
        .query_row(&sql, params![id], Investment::from_row)
        .optional()?)
}

pub fn require_investment(conn: &Connection, id: i64) -> Result<Investment> {
    get_investment(conn, id)?.ok_or(LedgerError::NotFound {
        entity: "Investment",
        id,
    })
}

pub fn active_investment(conn: &Connection, user_id: i64) -> Result<Option<Investment>> {
    let sql = format!(
        "SELECT {INVESTMENT_COLUMNS} FROM investments WHERE user_id=?1 AND status=?2 ORDER BY id DESC LIMIT 1"
    );
    Ok(conn
        .query_row(
            &sql,
            params![user_id, InvestmentStatus::Active],
            Investment::from_row,
        )
        .optional()?)
}

/// Investments newest first, optionally for one user and/or active only.
pub fn list_investments(
    conn: &Connection,
    user_id: Option<i64>,
    active_only: bool,
) -> Result<Vec<Investment>> {
    let mut sql = format!("SELECT {INVESTMENT_COLUMNS} FROM investments WHERE 1=1");
    let mut params_vec: Vec<i64> = Vec::new();
    if let Some(uid) = user_id {
        sql.push_str(" AND user_id=?");
        params_vec.push(uid);
    }
    if active_only {
        sql.push_str(" AND status='active'");
    }
    sql.push_str(" ORDER BY id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params_vec), Investment::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Moves an investment from `from` to `to`. Returns false when the row was not
/// in `from`, which makes repeated transitions harmless.
pub fn update_investment_status(
    conn: &Connection,
    id: i64,
    from: InvestmentStatus,
    to: InvestmentStatus,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE investments SET status=?1 WHERE id=?2 AND status=?3",
        params![to, id, from],
    )?;
    Ok(changed == 1)
}

/// Stores a credited ROI: new running profit and the start of the tick it was
/// credited for.
pub fn record_accrual(
    conn: &Connection,
    id: i64,
    total_profit: Decimal,
    tick: DateTime<Utc>,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE investments SET total_profit=?1, last_accrual_at=?2 WHERE id=?3 AND status='active'",
        params![to_money(total_profit).to_string(), tick, id],
    )?;
    Ok(changed == 1)
}

// ---------- transactions ----------

pub fn create_transaction(conn: &Connection, new: &NewTransaction) -> Result<Transaction> {
    conn.execute(
        "INSERT INTO transactions(user_id, type, amount, cryptocurrency, wallet_address, status, note, plan_id, investment_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            new.user_id,
            new.kind,
            to_money(new.amount).to_string(),
            new.cryptocurrency,
            new.wallet_address,
            new.status,
            new.note,
            new.plan_id,
            new.investment_id,
            new.created_at
        ],
    )?;
    require_transaction(conn, conn.last_insert_rowid())
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Option<Transaction>> {
    let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id=?1");
    Ok(conn
        .query_row(&sql, params![id], Transaction::from_row)
        .optional()?)
}

pub fn require_transaction(conn: &Connection, id: i64) -> Result<Transaction> {
    get_transaction(conn, id)?.ok_or(LedgerError::NotFound {
        entity: "Transaction",
        id,
    })
}

/// Filters for [`list_transactions`]. Everything unset means "all".
#[derive(Debug, Clone, Default)]
pub struct TxFilter {
    pub user_id: Option<i64>,
    pub kind: Option<TxKind>,
    pub status: Option<TxStatus>,
    pub limit: Option<usize>,
}

/// Transactions newest first.
pub fn list_transactions(conn: &Connection, filter: &TxFilter) -> Result<Vec<Transaction>> {
    let mut sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE 1=1");
    let mut params_vec: Vec<String> = Vec::new();
    if let Some(uid) = filter.user_id {
        sql.push_str(" AND user_id=?");
        params_vec.push(uid.to_string());
    }
    if let Some(kind) = filter.kind {
        sql.push_str(" AND type=?");
        params_vec.push(kind.as_str().to_string());
    }
    if let Some(status) = filter.status {
        sql.push_str(" AND status=?");
        params_vec.push(status.as_str().to_string());
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params_vec.iter()), Transaction::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn all_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    list_transactions(conn, &TxFilter::default())
}

/// Pending deposits, oldest first.
pub fn pending_deposits(conn: &Connection) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE type=?1 AND status=?2 ORDER BY created_at, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![TxKind::Deposit, TxStatus::Pending],
        Transaction::from_row,
    )?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Status-only transition of a ledger entry, applied only when the row is
/// still in `from`. Amount and type are never touched. Returns whether the
/// row moved.
pub fn transition_transaction(
    conn: &Connection,
    id: i64,
    from: TxStatus,
    to: TxStatus,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE transactions SET status=?1, note=COALESCE(?2, note), updated_at=?3
         WHERE id=?4 AND status=?5",
        params![to, note, now, id, from],
    )?;
    Ok(changed == 1)
}

// ---------- wallets ----------

pub fn create_wallet(
    conn: &Connection,
    user_id: i64,
    crypto: Cryptocurrency,
    address: &str,
    now: DateTime<Utc>,
) -> Result<Wallet> {
    conn.execute(
        "INSERT INTO wallets(user_id, cryptocurrency, address, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, crypto, address, now],
    )?;
    let id = conn.last_insert_rowid();
    let sql = format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE id=?1");
    Ok(conn.query_row(&sql, params![id], Wallet::from_row)?)
}

pub fn wallets_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Wallet>> {
    let sql = format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE user_id=?1 ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], Wallet::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// ---------- job watermarks ----------

/// Start of the last tick `job` fully processed.
pub fn get_watermark(conn: &Connection, job: &str) -> Result<Option<DateTime<Utc>>> {
    Ok(conn
        .query_row(
            "SELECT last_tick FROM job_watermarks WHERE job=?1",
            params![job],
            |r| r.get(0),
        )
        .optional()?)
}

pub fn set_watermark(
    conn: &Connection,
    job: &str,
    tick: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO job_watermarks(job, last_tick, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(job) DO UPDATE SET last_tick=excluded.last_tick, updated_at=excluded.updated_at",
        params![job, tick, now],
    )?;
    Ok(())
}

/// All watermarks as `(job, last_tick, updated_at)`.
pub fn watermarks(conn: &Connection) -> Result<Vec<(String, DateTime<Utc>, DateTime<Utc>)>> {
    let mut stmt = conn.prepare("SELECT job, last_tick, updated_at FROM job_watermarks ORDER BY job")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, DateTime<Utc>>(1)?,
            r.get::<_, DateTime<Utc>>(2)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
