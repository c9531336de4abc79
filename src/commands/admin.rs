// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::Result as LedgerResult;
use crate::models::{InvestmentStatus, Transaction, TxKind, TxStatus, User, UserStatus};
use crate::store;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use log::info;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

const RECENT_WINDOW_DAYS: i64 = 7;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("stats", sub)) = m.subcommand() {
        stats(conn, sub)?;
    }
    Ok(())
}

/// Suspending a user blocks deposits and withdrawals. Accrual on an existing
/// investment continues.
pub fn set_user_status(
    conn: &Connection,
    user_id: i64,
    status: UserStatus,
    now: DateTime<Utc>,
) -> LedgerResult<User> {
    let user = store::set_user_status(conn, user_id, status, now)?;
    info!("user #{} ({}) set to {}", user.id, user.email, user.status);
    Ok(user)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformStats {
    pub total_users: usize,
    pub new_users: usize,
    pub active_investments: usize,
    pub pending_deposits: usize,
    pub total_deposits: Decimal,
    pub new_deposits: Decimal,
    pub total_withdrawals: Decimal,
    pub total_roi_paid: Decimal,
}

fn sum_completed<'a>(
    entries: impl Iterator<Item = &'a Transaction>,
    kind: TxKind,
    since: Option<DateTime<Utc>>,
) -> Decimal {
    entries
        .filter(|t| t.kind == kind && t.status == TxStatus::Completed)
        .filter(|t| since.is_none_or(|s| t.created_at >= s))
        .map(|t| t.amount)
        .sum()
}

/// Platform totals. "New" means created within the last seven days of `now`.
pub fn dashboard_stats(conn: &Connection, now: DateTime<Utc>) -> LedgerResult<PlatformStats> {
    let since = now - Duration::days(RECENT_WINDOW_DAYS);
    let users = store::all_users(conn)?;
    let ledger = store::all_transactions(conn)?;
    let active = store::list_investments(conn, None, true)?;

    Ok(PlatformStats {
        total_users: users.len(),
        new_users: users.iter().filter(|u| u.created_at >= since).count(),
        active_investments: active
            .iter()
            .filter(|i| i.status == InvestmentStatus::Active)
            .count(),
        pending_deposits: ledger
            .iter()
            .filter(|t| t.kind == TxKind::Deposit && t.status == TxStatus::Pending)
            .count(),
        total_deposits: sum_completed(ledger.iter(), TxKind::Deposit, None),
        new_deposits: sum_completed(ledger.iter(), TxKind::Deposit, Some(since)),
        total_withdrawals: sum_completed(ledger.iter(), TxKind::Withdrawal, None),
        total_roi_paid: sum_completed(ledger.iter(), TxKind::Roi, None),
    })
}

fn stats(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let s = dashboard_stats(conn, Utc::now())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        let rows = vec![
            vec!["Users".into(), s.total_users.to_string()],
            vec!["New users (7d)".into(), s.new_users.to_string()],
            vec!["Active investments".into(), s.active_investments.to_string()],
            vec!["Pending deposits".into(), s.pending_deposits.to_string()],
            vec!["Deposits".into(), fmt_money(&s.total_deposits)],
            vec!["Deposits (7d)".into(), fmt_money(&s.new_deposits)],
            vec!["Withdrawals".into(), fmt_money(&s.total_withdrawals)],
            vec!["ROI paid".into(), fmt_money(&s.total_roi_paid)],
        ];
        println!("{}", pretty_table(&["Metric", "Value"], rows));
    }
    Ok(())
}
