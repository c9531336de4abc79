// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Plan catalog. Seeded once with the four tiers; read-only afterwards.

use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::models::{InvestmentPlan, PLAN_COLUMNS};

// (id, name, daily roi %, duration days, minimum investment)
const DEFAULT_PLANS: [(i64, &str, i64, u32, i64); 4] = [
    (1, "Silver", 2, 7, 100),
    (2, "Gold", 3, 14, 150),
    (3, "Platinum", 4, 21, 250),
    (4, "Diamond", 5, 28, 400),
];

pub fn seed_default_plans(conn: &Connection) -> Result<()> {
    for (id, name, roi, days, min) in DEFAULT_PLANS {
        conn.execute(
            "INSERT OR IGNORE INTO investment_plans(id, name, daily_roi, duration_days, min_investment, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, 1)",
            params![
                id,
                name,
                Decimal::from(roi).to_string(),
                days,
                crate::utils::to_money(Decimal::from(min)).to_string()
            ],
        )?;
    }
    Ok(())
}

pub fn get_plan(conn: &Connection, id: i64) -> Result<Option<InvestmentPlan>> {
    let sql = format!("SELECT {PLAN_COLUMNS} FROM investment_plans WHERE id=?1");
    Ok(conn
        .query_row(&sql, params![id], InvestmentPlan::from_row)
        .optional()?)
}

pub fn require_plan(conn: &Connection, id: i64) -> Result<InvestmentPlan> {
    get_plan(conn, id)?.ok_or(LedgerError::NotFound {
        entity: "Investment plan",
        id,
    })
}

pub fn all_plans(conn: &Connection) -> Result<Vec<InvestmentPlan>> {
    let sql = format!("SELECT {PLAN_COLUMNS} FROM investment_plans ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], InvestmentPlan::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Display name for a plan id, falling back to `plan #id` for unknown ids.
pub fn plan_name(conn: &Connection, id: i64) -> Result<String> {
    Ok(get_plan(conn, id)?
        .map(|p| p.name)
        .unwrap_or_else(|| format!("plan #{}", id)))
}
