// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::write_tx;
use crate::error::{LedgerError, Result as LedgerResult};
use crate::models::{Cryptocurrency, NewTransaction, Transaction, TxKind, TxStatus, UserStatus};
use crate::store;
use crate::utils::{fmt_money, parse_decimal, required, required_id, to_money};
use crate::wallets;
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;

const MIN_WITHDRAWAL: Decimal = Decimal::TEN;

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user_id = required_id(sub, "user")?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    let crypto: Cryptocurrency = required(sub, "crypto")?.parse()?;
    let address = required(sub, "address")?;
    let tx = withdraw(conn, user_id, amount, crypto, address, Utc::now())?;
    let balance = store::require_user(conn, user_id)?.balance;
    println!(
        "Withdrawal #{} of {} sent to {} ({}); balance now {}",
        tx.id,
        fmt_money(&tx.amount),
        address.trim(),
        crypto,
        fmt_money(&balance)
    );
    Ok(())
}

/// The larger of 10 and a tenth of the balance.
pub fn minimum_withdrawal(balance: Decimal) -> Decimal {
    to_money(MIN_WITHDRAWAL.max(balance / Decimal::TEN))
}

/// Debits `amount` from the user and records a completed withdrawal, both in
/// one commit. The amount is rounded to cents first, so the ledger row and the
/// debit always agree.
pub fn withdraw(
    conn: &Connection,
    user_id: i64,
    amount: Decimal,
    crypto: Cryptocurrency,
    address: &str,
    now: DateTime<Utc>,
) -> LedgerResult<Transaction> {
    let amount = to_money(amount);
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }
    wallets::validate_address(crypto, address)?;

    write_tx(conn, |c| {
        let user = store::require_user(c, user_id)?;
        if user.status != UserStatus::Active {
            return Err(LedgerError::InactiveUser(user.id));
        }
        if user.balance < amount {
            return Err(LedgerError::InsufficientBalance {
                available: user.balance,
                requested: amount,
            });
        }
        let minimum = minimum_withdrawal(user.balance);
        if amount < minimum {
            return Err(LedgerError::BelowMinimum { amount, minimum });
        }

        let tx = store::create_transaction(
            c,
            &NewTransaction {
                cryptocurrency: Some(crypto),
                wallet_address: Some(address.trim().to_string()),
                note: Some("Withdrawal request".to_string()),
                created_at: now,
                ..NewTransaction::new(user.id, TxKind::Withdrawal, amount, TxStatus::Completed)
            },
        )?;
        store::adjust_balance(c, user.id, -amount, now)?;
        Ok(tx)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_is_ten_or_a_tenth() {
        assert_eq!(minimum_withdrawal(Decimal::from(50)).to_string(), "10.00");
        assert_eq!(minimum_withdrawal(Decimal::new(123456, 2)).to_string(), "123.46");
    }
}
