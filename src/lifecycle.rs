// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Investment lifecycle: `active -> completed`, reached either when the term
//! runs out or when the owner enrolls in a new plan.

use chrono::{DateTime, Duration, Utc};
use log::info;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::models::{Investment, InvestmentPlan, InvestmentStatus, NewInvestment};
use crate::store;

/// The investment earns nothing on or after its end date.
pub fn is_matured(investment: &Investment, as_of: DateTime<Utc>) -> bool {
    as_of >= investment.end_date
}

pub fn end_date_for(start: DateTime<Utc>, duration_days: u32) -> DateTime<Utc> {
    start + Duration::days(i64::from(duration_days))
}

/// Marks an active investment completed. False if it was already completed.
pub fn complete(conn: &Connection, investment_id: i64) -> Result<bool> {
    store::update_investment_status(
        conn,
        investment_id,
        InvestmentStatus::Active,
        InvestmentStatus::Completed,
    )
}

#[derive(Debug, Clone)]
pub struct Enrollment {
    pub investment: Investment,
    /// The previously active investment, force-completed by this enrollment.
    pub superseded: Option<Investment>,
}

/// Starts a new active investment for `user_id` in `plan`.
///
/// Rate and duration are copied from the plan, so later catalog edits leave
/// the investment alone. A still-active investment is completed first with no
/// pro-rating of the remaining term. Run inside [`crate::db::write_tx`].
pub fn enroll(
    conn: &Connection,
    user_id: i64,
    plan: &InvestmentPlan,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<Enrollment> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }

    let superseded = match store::active_investment(conn, user_id)? {
        Some(prev) => {
            complete(conn, prev.id)?;
            info!(
                "investment #{} of user #{} completed early by a new {} enrollment",
                prev.id, user_id, plan.name
            );
            Some(store::require_investment(conn, prev.id)?)
        }
        None => None,
    };

    let investment = store::create_investment(
        conn,
        &NewInvestment {
            user_id,
            plan_id: plan.id,
            amount,
            daily_roi: plan.daily_roi,
            duration_days: plan.duration_days,
            start_date: now,
            end_date: end_date_for(now, plan.duration_days),
        },
        now,
    )?;
    info!(
        "user #{} enrolled in {} with {} (investment #{})",
        user_id, plan.name, investment.amount, investment.id
    );

    Ok(Enrollment {
        investment,
        superseded,
    })
}
