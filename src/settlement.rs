// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Deposit settlement: pending deposits are treated as confirmed once they are
//! older than the confirmation delay.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::time::Duration;

use crate::db::write_tx;
use crate::error::Result;
use crate::lifecycle;
use crate::models::{Transaction, TxStatus};
use crate::notify::{DepositNotice, Notifier};
use crate::{plans, store};

pub const DEFAULT_CONFIRMATION_DELAY: Duration = Duration::from_secs(5 * 60);

const FALLBACK_PLAN_NAME: &str = "Investment Plan";

#[derive(Debug, Clone)]
pub struct SettledDeposit {
    pub transaction_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub balance: Decimal,
    /// Investment opened for the deposit's plan, if it named one.
    pub investment_id: Option<i64>,
    pub notice: DepositNotice,
}

/// True once `deposit` has waited at least `delay` at `now`.
pub fn is_confirmed(deposit: &Transaction, now: DateTime<Utc>, delay: Duration) -> bool {
    now.signed_duration_since(deposit.created_at)
        .to_std()
        .map(|age| age >= delay)
        .unwrap_or(false)
}

/// Settles a single pending deposit: completes it, credits the full amount and
/// enrolls the owner in the deposit's plan, all in one commit. Returns `None`
/// when the deposit was no longer pending, so it is credited at most once.
pub fn settle_deposit(
    conn: &Connection,
    deposit: &Transaction,
    now: DateTime<Utc>,
) -> Result<Option<SettledDeposit>> {
    write_tx(conn, |c| {
        if !store::transition_transaction(
            c,
            deposit.id,
            TxStatus::Pending,
            TxStatus::Completed,
            None,
            now,
        )? {
            return Ok(None);
        }

        let balance = store::adjust_balance(c, deposit.user_id, deposit.amount, now)?;

        let mut investment_id = None;
        let mut plan_name = FALLBACK_PLAN_NAME.to_string();
        if let Some(plan_id) = deposit.plan_id {
            match plans::get_plan(c, plan_id)? {
                Some(plan) => {
                    let enrollment =
                        lifecycle::enroll(c, deposit.user_id, &plan, deposit.amount, now)?;
                    investment_id = Some(enrollment.investment.id);
                    plan_name = plan.name;
                }
                None => warn!(
                    "deposit #{} names unknown plan #{}; crediting balance only",
                    deposit.id, plan_id
                ),
            }
        }

        let user = store::require_user(c, deposit.user_id)?;
        Ok(Some(SettledDeposit {
            transaction_id: deposit.id,
            user_id: user.id,
            amount: deposit.amount,
            balance,
            investment_id,
            notice: DepositNotice {
                email: user.email,
                name: user.full_name,
                amount: deposit.amount,
                plan_name,
            },
        }))
    })
}

/// Settles every pending deposit that has waited out `delay`; younger ones
/// stay pending for a later tick. Returns the settled transaction ids.
///
/// Notification failures are logged and never undo the credit. A deposit that
/// fails to settle is logged and left pending.
pub fn settle_pending_deposits(
    conn: &Connection,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
    delay: Duration,
) -> Result<Vec<i64>> {
    let pending = store::pending_deposits(conn)?;
    if pending.is_empty() {
        info!("no pending deposits found");
        return Ok(Vec::new());
    }
    info!("found {} pending deposits", pending.len());

    let mut settled = Vec::new();
    for deposit in pending.iter().filter(|d| is_confirmed(d, now, delay)) {
        match settle_deposit(conn, deposit, now) {
            Ok(Some(done)) => {
                info!(
                    "deposit #{} for user #{} ({}) confirmed - ${:.2}",
                    done.transaction_id, done.user_id, done.notice.name, done.amount
                );
                if let Err(e) = notifier.deposit_confirmed(&done.notice) {
                    warn!(
                        "deposit #{} settled but the confirmation was not delivered: {}",
                        done.transaction_id, e
                    );
                }
                settled.push(done.transaction_id);
            }
            Ok(None) => debug!("deposit #{} was settled elsewhere", deposit.id),
            Err(e) => warn!("deposit #{} left pending: {}", deposit.id, e),
        }
    }

    info!(
        "deposit confirmation done: {} settled, {} still pending",
        settled.len(),
        pending.len() - settled.len()
    );
    Ok(settled)
}
