// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::accrual::daily_roi_amount;
use crate::error::Result as LedgerResult;
use crate::models::{Investment, Transaction, TxKind, TxStatus};
use crate::store::{self, TxFilter};
use crate::utils::{fmt_money, pretty_table, required_id};
use crate::plans;
use anyhow::Result;
use chrono::{DateTime, Days, NaiveDate, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanProgress {
    pub investment_id: i64,
    pub plan_name: String,
    pub daily_roi: Decimal,
    pub amount: Decimal,
    pub days_invested: i64,
    pub days_remaining: i64,
    pub progress_percent: i64,
    /// ROI credited per tick at the locked rate.
    pub daily_growth: Decimal,
}

/// Value of the active investment (principal plus ROI booked so far) at the
/// end of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformancePoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDashboard {
    pub user_id: i64,
    pub full_name: String,
    pub balance: Decimal,
    pub active_plan: Option<PlanProgress>,
    /// Sum of every completed ROI entry for the user, across all investments.
    pub total_profit: Decimal,
    /// One point per day from the start of the active investment; empty
    /// without one.
    pub performance: Vec<PerformancePoint>,
}

/// Daily value series of `inv` from its start date through `now` (or its end
/// date, whichever comes first), built from the ROI entries booked against it.
pub fn performance_series(
    inv: &Investment,
    roi: &[Transaction],
    now: DateTime<Utc>,
) -> Vec<PerformancePoint> {
    let first = inv.start_date.date_naive();
    let last = now.min(inv.end_date).date_naive();
    let mut credits: Vec<(NaiveDate, Decimal)> = roi
        .iter()
        .filter(|t| t.investment_id == Some(inv.id) && t.status == TxStatus::Completed)
        .map(|t| (t.created_at.date_naive(), t.amount))
        .collect();
    credits.sort();

    let mut out = Vec::new();
    let mut booked = Decimal::ZERO;
    let mut pending = credits.into_iter().peekable();
    let mut day = first;
    while day <= last {
        while let Some((_, amount)) = pending.next_if(|(d, _)| *d <= day) {
            booked += amount;
        }
        out.push(PerformancePoint {
            date: day,
            value: inv.amount + booked,
        });
        match day.checked_add_days(Days::new(1)) {
            Some(next) => day = next,
            None => break,
        }
    }
    out
}

pub fn user_dashboard(
    conn: &Connection,
    user_id: i64,
    now: DateTime<Utc>,
) -> LedgerResult<UserDashboard> {
    let user = store::require_user(conn, user_id)?;
    let roi = store::list_transactions(
        conn,
        &TxFilter {
            user_id: Some(user.id),
            kind: Some(TxKind::Roi),
            status: Some(TxStatus::Completed),
            limit: None,
        },
    )?;
    let active = store::active_investment(conn, user.id)?;
    let active_plan = match &active {
        Some(inv) => {
            let duration = i64::from(inv.duration_days);
            let days_invested = (now - inv.start_date).num_days().clamp(0, duration);
            let progress_percent = if duration == 0 {
                100
            } else {
                days_invested * 100 / duration
            };
            Some(PlanProgress {
                investment_id: inv.id,
                plan_name: plans::plan_name(conn, inv.plan_id)?,
                daily_roi: inv.daily_roi,
                amount: inv.amount,
                days_invested,
                days_remaining: duration - days_invested,
                progress_percent,
                daily_growth: daily_roi_amount(inv.amount, inv.daily_roi),
            })
        }
        None => None,
    };
    let total_profit: Decimal = roi.iter().map(|t| t.amount).sum();
    let performance = active
        .as_ref()
        .map(|inv| performance_series(inv, &roi, now))
        .unwrap_or_default();

    Ok(UserDashboard {
        user_id: user.id,
        full_name: user.full_name,
        balance: user.balance,
        active_plan,
        total_profit,
        performance,
    })
}

/// `dashboard --user <id>`
pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let dash = user_dashboard(conn, required_id(sub, "user")?, Utc::now())?;
    if crate::utils::maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &dash)? {
        return Ok(());
    }
    let mut rows = vec![
        vec!["User".to_string(), format!("#{} {}", dash.user_id, dash.full_name)],
        vec!["Balance".to_string(), fmt_money(&dash.balance)],
        vec!["Total profit".to_string(), fmt_money(&dash.total_profit)],
    ];
    match &dash.active_plan {
        Some(p) => {
            rows.push(vec![
                "Active plan".to_string(),
                format!("{} ({}% daily)", p.plan_name, p.daily_roi.normalize()),
            ]);
            rows.push(vec!["Invested".to_string(), fmt_money(&p.amount)]);
            rows.push(vec!["Daily growth".to_string(), fmt_money(&p.daily_growth)]);
            rows.push(vec![
                "Progress".to_string(),
                format!(
                    "{}% ({} days in, {} to go)",
                    p.progress_percent, p.days_invested, p.days_remaining
                ),
            ]);
        }
        None => rows.push(vec!["Active plan".to_string(), "none".to_string()]),
    }
    println!("{}", pretty_table(&["Field", "Value"], rows));
    if !dash.performance.is_empty() {
        let series = dash
            .performance
            .iter()
            .map(|p| vec![p.date.to_string(), fmt_money(&p.value)])
            .collect();
        println!("{}", pretty_table(&["Date", "Value"], series));
    }
    Ok(())
}
