// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Daily ROI accrual.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cadence::Cadence;
use crate::db::write_tx;
use crate::error::{LedgerError, Result};
use crate::lifecycle;
use crate::models::{Investment, InvestmentStatus, NewTransaction, TxKind, TxStatus};
use crate::{plans, store};
use crate::utils::to_money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    NotActive,
    /// `as_of` lies before the investment's start date.
    NotStarted,
    /// ROI was already credited in this tick slot.
    AlreadyAccrued,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AccrualOutcome {
    Credited { amount: Decimal, transaction_id: i64 },
    Completed,
    Skipped(SkipReason),
}

impl AccrualOutcome {
    pub fn credited(&self) -> Decimal {
        match self {
            AccrualOutcome::Credited { amount, .. } => *amount,
            AccrualOutcome::Completed | AccrualOutcome::Skipped(_) => Decimal::ZERO,
        }
    }

    /// Investment status after the call.
    pub fn status(&self) -> InvestmentStatus {
        match self {
            AccrualOutcome::Credited { .. }
            | AccrualOutcome::Skipped(SkipReason::NotStarted | SkipReason::AlreadyAccrued) => {
                InvestmentStatus::Active
            }
            AccrualOutcome::Completed | AccrualOutcome::Skipped(SkipReason::NotActive) => {
                InvestmentStatus::Completed
            }
        }
    }
}

/// `amount * rate / 100`, rounded to cents. `rate` is a plain percentage.
pub fn daily_roi_amount(amount: Decimal, rate_percent: Decimal) -> Decimal {
    to_money(amount * rate_percent / Decimal::ONE_HUNDRED)
}

/// Credits one tick of ROI to `investment`, or completes it once `as_of`
/// reaches its end date.
///
/// The row is re-read under the write lock, so a stale `investment` snapshot
/// cannot credit a completed investment, and a second call inside the same
/// `cadence` slot is a no-op. The ROI entry, the investment update and the
/// balance credit commit together.
pub fn accrue_or_complete(
    conn: &Connection,
    investment: &Investment,
    as_of: DateTime<Utc>,
    cadence: &Cadence,
) -> Result<AccrualOutcome> {
    write_tx(conn, |c| {
        let current = store::get_investment(c, investment.id)?.ok_or(LedgerError::NotFound {
            entity: "Investment",
            id: investment.id,
        })?;

        if current.status != InvestmentStatus::Active {
            return Ok(AccrualOutcome::Skipped(SkipReason::NotActive));
        }

        if lifecycle::is_matured(&current, as_of) {
            lifecycle::complete(c, current.id)?;
            info!(
                "investment #{} for user #{} matured on {}, marked completed",
                current.id,
                current.user_id,
                current.end_date.format("%Y-%m-%d")
            );
            return Ok(AccrualOutcome::Completed);
        }

        if as_of < current.start_date {
            return Ok(AccrualOutcome::Skipped(SkipReason::NotStarted));
        }

        // Compared as instants so a change of period never strands the guard.
        let tick = cadence.slot_start(cadence.slot_of(as_of));
        if current.last_accrual_at.is_some_and(|last| last >= tick) {
            return Ok(AccrualOutcome::Skipped(SkipReason::AlreadyAccrued));
        }

        let credit = daily_roi_amount(current.amount, current.daily_roi);
        let plan_name = plans::plan_name(c, current.plan_id)?;
        let entry = store::create_transaction(
            c,
            &NewTransaction {
                note: Some(format!(
                    "Daily ROI ({}%) for {} plan",
                    current.daily_roi.normalize(),
                    plan_name
                )),
                plan_id: Some(current.plan_id),
                investment_id: Some(current.id),
                created_at: as_of,
                ..NewTransaction::new(current.user_id, TxKind::Roi, credit, TxStatus::Completed)
            },
        )?;
        store::record_accrual(c, current.id, current.total_profit + credit, tick)?;
        let balance = store::adjust_balance(c, current.user_id, credit, as_of)?;
        debug!(
            "credited {} ROI to user #{} from investment #{}, balance now {}",
            credit, current.user_id, current.id, balance
        );

        Ok(AccrualOutcome::Credited {
            amount: credit,
            transaction_id: entry.id,
        })
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub users_scanned: usize,
    pub credited: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_credited: Decimal,
}

/// One accrual pass over every user: at most one engine call per active
/// investment. A failing record is logged and skipped; only failing to list
/// the users aborts the sweep.
pub fn run_accrual_sweep(
    conn: &Connection,
    as_of: DateTime<Utc>,
    cadence: &Cadence,
) -> Result<SweepReport> {
    info!("running daily ROI sweep as of {}", as_of.to_rfc3339());
    let users = store::all_users(conn)?;
    let mut report = SweepReport::default();

    for user in &users {
        report.users_scanned += 1;
        let investment = match store::active_investment(conn, user.id) {
            Ok(Some(inv)) => inv,
            Ok(None) => continue,
            Err(e) => {
                warn!("skipping user #{}: cannot load active investment: {}", user.id, e);
                report.failed += 1;
                continue;
            }
        };

        match accrue_or_complete(conn, &investment, as_of, cadence) {
            Ok(outcome @ AccrualOutcome::Credited { .. }) => {
                report.credited += 1;
                report.total_credited += outcome.credited();
                info!(
                    "added daily ROI of ${:.2} to user #{} ({})",
                    outcome.credited(),
                    user.id,
                    user.full_name
                );
            }
            Ok(AccrualOutcome::Completed) => report.completed += 1,
            Ok(AccrualOutcome::Skipped(reason)) => {
                debug!("investment #{} skipped: {:?}", investment.id, reason);
                report.skipped += 1;
            }
            Err(e) => {
                warn!("accrual failed for investment #{}: {}", investment.id, e);
                report.failed += 1;
            }
        }
    }

    info!(
        "ROI sweep done: {} credited (${:.2}), {} completed, {} skipped, {} failed",
        report.credited, report.total_credited, report.completed, report.skipped, report.failed
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roi_is_rounded_only_at_crediting() {
        assert_eq!(
            daily_roi_amount(Decimal::from(1000), Decimal::from(3)).to_string(),
            "30.00"
        );
        // 333.33 * 2.5% = 8.33325
        assert_eq!(
            daily_roi_amount(Decimal::new(33333, 2), Decimal::new(25, 1)).to_string(),
            "8.33"
        );
    }

    #[test]
    fn outcome_reports_resulting_status() {
        assert_eq!(AccrualOutcome::Completed.status(), InvestmentStatus::Completed);
        assert_eq!(
            AccrualOutcome::Skipped(SkipReason::AlreadyAccrued).status(),
            InvestmentStatus::Active
        );
        assert!(AccrualOutcome::Skipped(SkipReason::NotActive).credited().is_zero());
    }
}
