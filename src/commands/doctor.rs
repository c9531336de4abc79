// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::Result as LedgerResult;
use crate::models::{InvestmentStatus, TxKind, TxStatus};
use crate::store;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum Issue {
    /// Stored balance differs from completed deposits + ROI - withdrawals.
    BalanceDrift {
        user_id: i64,
        stored: Decimal,
        ledger: Decimal,
    },
    MultipleActiveInvestments { user_id: i64, count: usize },
    /// `total_profit` differs from the ROI entries booked against it.
    ProfitMismatch {
        investment_id: i64,
        recorded: Decimal,
        ledger: Decimal,
    },
}

impl Issue {
    fn row(&self) -> Vec<String> {
        match self {
            Issue::BalanceDrift {
                user_id,
                stored,
                ledger,
            } => vec![
                "balance_drift".into(),
                format!("user #{}: stored {:.2}, ledger {:.2}", user_id, stored, ledger),
            ],
            Issue::MultipleActiveInvestments { user_id, count } => vec![
                "multiple_active_investments".into(),
                format!("user #{}: {} active", user_id, count),
            ],
            Issue::ProfitMismatch {
                investment_id,
                recorded,
                ledger,
            } => vec![
                "profit_mismatch".into(),
                format!(
                    "investment #{}: recorded {:.2}, ROI entries {:.2}",
                    investment_id, recorded, ledger
                ),
            ],
        }
    }
}

/// Cross-checks stored balances and investment totals against the ledger.
pub fn reconcile(conn: &Connection) -> LedgerResult<Vec<Issue>> {
    let mut issues = Vec::new();
    let ledger = store::all_transactions(conn)?;

    let mut net: HashMap<i64, Decimal> = HashMap::new();
    let mut roi_by_investment: HashMap<i64, Decimal> = HashMap::new();
    for t in ledger.iter().filter(|t| t.status == TxStatus::Completed) {
        let delta = match t.kind {
            TxKind::Deposit | TxKind::Roi => t.amount,
            TxKind::Withdrawal => -t.amount,
        };
        *net.entry(t.user_id).or_default() += delta;
        if let (TxKind::Roi, Some(inv)) = (t.kind, t.investment_id) {
            *roi_by_investment.entry(inv).or_default() += t.amount;
        }
    }

    for user in store::all_users(conn)? {
        let expected = net.get(&user.id).copied().unwrap_or_default();
        if expected != user.balance {
            issues.push(Issue::BalanceDrift {
                user_id: user.id,
                stored: user.balance,
                ledger: expected,
            });
        }
    }

    let investments = store::list_investments(conn, None, false)?;
    let mut active: HashMap<i64, usize> = HashMap::new();
    for inv in &investments {
        if inv.status == InvestmentStatus::Active {
            *active.entry(inv.user_id).or_default() += 1;
        }
        let booked = roi_by_investment.get(&inv.id).copied().unwrap_or_default();
        if booked != inv.total_profit {
            issues.push(Issue::ProfitMismatch {
                investment_id: inv.id,
                recorded: inv.total_profit,
                ledger: booked,
            });
        }
    }
    let mut crowded: Vec<_> = active.into_iter().filter(|(_, n)| *n > 1).collect();
    crowded.sort();
    for (user_id, count) in crowded {
        issues.push(Issue::MultipleActiveInvestments { user_id, count });
    }

    Ok(issues)
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let issues = reconcile(conn)?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &issues)? {
        return Ok(());
    }
    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = issues.iter().map(Issue::row).collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
