// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::admin;
use crate::error::{LedgerError, Result as LedgerResult};
use crate::models::{NewUser, User, UserStatus};
use crate::store;
use crate::utils::{maybe_print_json, pretty_table, required, required_id};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("suspend", sub)) => change_status(conn, sub, UserStatus::Suspended)?,
        Some(("activate", sub)) => change_status(conn, sub, UserStatus::Active)?,
        _ => {}
    }
    Ok(())
}

/// New users start active with a zero balance. Emails are unique ignoring case.
pub fn register(conn: &Connection, new: NewUser, now: DateTime<Utc>) -> LedgerResult<User> {
    let email = new.email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(LedgerError::Parse(format!("invalid email '{}'", email)));
    }
    if new.full_name.trim().is_empty() {
        return Err(LedgerError::Parse("name must not be empty".into()));
    }
    store::create_user(
        conn,
        &NewUser {
            full_name: new.full_name.trim().to_string(),
            email: email.to_string(),
            ..new.clone()
        },
        now,
    )
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = register(
        conn,
        NewUser {
            full_name: required(sub, "name")?.to_string(),
            email: required(sub, "email")?.to_string(),
            country: required(sub, "country")?.to_string(),
            gender: required(sub, "gender")?.to_string(),
            is_verified: sub.get_flag("verified"),
            is_admin: sub.get_flag("admin"),
        },
        Utc::now(),
    )?;
    println!("Registered user #{} {} <{}>", user.id, user.full_name, user.email);
    Ok(())
}

fn user_row(u: &User) -> Vec<String> {
    vec![
        u.id.to_string(),
        u.full_name.clone(),
        u.email.clone(),
        u.country.clone(),
        format!("{:.2}", u.balance),
        u.status.to_string(),
        if u.is_admin { "yes".into() } else { String::new() },
    ]
}

const HEADERS: [&str; 7] = ["ID", "Name", "Email", "Country", "Balance", "Status", "Admin"];

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let users = store::all_users(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &users)? {
        let rows = users.iter().map(user_row).collect();
        println!("{}", pretty_table(&HEADERS, rows));
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = store::require_user(conn, required_id(sub, "id")?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &user)? {
        println!("{}", pretty_table(&HEADERS, vec![user_row(&user)]));
        let wallets = store::wallets_for_user(conn, user.id)?;
        if !wallets.is_empty() {
            let rows = wallets
                .into_iter()
                .map(|w| vec![w.cryptocurrency.to_string(), w.address, w.created_at.to_rfc3339()])
                .collect();
            println!("{}", pretty_table(&["Crypto", "Deposit address", "Created"], rows));
        }
    }
    Ok(())
}

fn change_status(conn: &Connection, sub: &clap::ArgMatches, status: UserStatus) -> Result<()> {
    let user = admin::set_user_status(conn, required_id(sub, "id")?, status, Utc::now())?;
    println!("User #{} ({}) is now {}", user.id, user.full_name, user.status);
    Ok(())
}
