// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::write_tx;
use crate::error::{LedgerError, Result as LedgerResult};
use crate::models::{
    Cryptocurrency, NewTransaction, Transaction, TxKind, TxStatus, UserStatus, Wallet,
};
use crate::store::{self, TxFilter};
use crate::utils::{maybe_print_json, parse_decimal, pretty_table, required, required_id, to_money};
use crate::{plans, wallets};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("request", sub)) => request(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("reject", sub)) => reject(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DepositRequest {
    pub transaction: Transaction,
    pub wallet: Wallet,
}

/// Issues a deposit address and records the deposit as pending. The balance
/// is untouched until the settlement job confirms it.
pub fn request_deposit<R: Rng + ?Sized>(
    conn: &Connection,
    user_id: i64,
    plan_id: i64,
    amount: Decimal,
    crypto: Cryptocurrency,
    now: DateTime<Utc>,
    rng: &mut R,
) -> LedgerResult<DepositRequest> {
    let amount = to_money(amount);
    write_tx(conn, |c| {
        let user = store::require_user(c, user_id)?;
        if user.status != UserStatus::Active {
            return Err(LedgerError::InactiveUser(user.id));
        }
        let plan = plans::require_plan(c, plan_id)?;
        if !plan.is_active {
            return Err(LedgerError::InactivePlan(plan.id));
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if amount < plan.min_investment {
            return Err(LedgerError::BelowMinimum {
                amount,
                minimum: plan.min_investment,
            });
        }

        let address = wallets::generate_address(crypto, rng);
        let wallet = store::create_wallet(c, user.id, crypto, &address, now)?;
        let transaction = store::create_transaction(
            c,
            &NewTransaction {
                cryptocurrency: Some(crypto),
                wallet_address: Some(address),
                note: Some(format!("Deposit for {} plan", plan.name)),
                plan_id: Some(plan.id),
                created_at: now,
                ..NewTransaction::new(user.id, TxKind::Deposit, amount, TxStatus::Pending)
            },
        )?;
        Ok(DepositRequest {
            transaction,
            wallet,
        })
    })
}

/// Fails a pending deposit. It never reaches the balance.
pub fn reject_deposit(
    conn: &Connection,
    id: i64,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> LedgerResult<Transaction> {
    let tx = store::require_transaction(conn, id)?;
    if tx.kind != TxKind::Deposit {
        return Err(LedgerError::InvalidStatus(format!(
            "transaction #{} is a {}, not a deposit",
            id, tx.kind
        )));
    }
    if !store::transition_transaction(conn, id, TxStatus::Pending, TxStatus::Failed, note, now)? {
        return Err(LedgerError::InvalidStatus(format!(
            "deposit #{} is {}, only pending deposits can be rejected",
            id, tx.status
        )));
    }
    store::require_transaction(conn, id)
}

fn request(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user_id = required_id(sub, "user")?;
    let plan_id = required_id(sub, "plan")?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    let crypto: Cryptocurrency = required(sub, "crypto")?.parse()?;
    let req = request_deposit(
        conn,
        user_id,
        plan_id,
        amount,
        crypto,
        Utc::now(),
        &mut rand::thread_rng(),
    )?;
    println!(
        "Send {:.2} worth of {} to {}",
        req.transaction.amount,
        crypto.as_str().to_uppercase(),
        req.wallet.address
    );
    println!(
        "Deposit #{} is pending confirmation",
        req.transaction.id
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let filter = TxFilter {
        kind: Some(TxKind::Deposit),
        status: sub.get_flag("pending").then_some(TxStatus::Pending),
        ..TxFilter::default()
    };
    let deposits = store::list_transactions(conn, &filter)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &deposits)? {
        let rows = deposits
            .iter()
            .map(|d| {
                vec![
                    d.id.to_string(),
                    d.user_id.to_string(),
                    format!("{:.2}", d.amount),
                    d.cryptocurrency.map(|c| c.to_string()).unwrap_or_default(),
                    d.wallet_address.clone().unwrap_or_default(),
                    d.status.to_string(),
                    d.created_at.format("%Y-%m-%d %H:%M").to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "User", "Amount", "Crypto", "Address", "Status", "Created"],
                rows
            )
        );
    }
    Ok(())
}

fn reject(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = required_id(sub, "id")?;
    let note = sub.get_one::<String>("note").map(|s| s.as_str());
    let tx = reject_deposit(conn, id, note, Utc::now())?;
    println!("Deposit #{} marked {}", tx.id, tx.status);
    Ok(())
}
