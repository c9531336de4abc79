// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Transaction, TxKind, TxStatus};
use crate::store::{self, TxFilter};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("list", sub)) = m.subcommand() {
        list(conn, sub)?;
    }
    Ok(())
}

pub fn filter_from_args(sub: &clap::ArgMatches) -> Result<TxFilter> {
    let kind = match sub.get_one::<String>("type") {
        Some(s) => Some(s.parse::<TxKind>()?),
        None => None,
    };
    let status = match sub.get_one::<String>("status") {
        Some(s) => Some(s.parse::<TxStatus>()?),
        None => None,
    };
    Ok(TxFilter {
        user_id: sub.get_one::<i64>("user").copied(),
        kind,
        status,
        limit: sub.get_one::<usize>("limit").copied(),
    })
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = store::list_transactions(conn, &filter_from_args(sub)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let names: HashMap<i64, String> = store::all_users(conn)?
            .into_iter()
            .map(|u| (u.id, u.full_name))
            .collect();
        let rows = data.iter().map(|t| tx_row(t, &names)).collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "User", "Type", "Amount", "Crypto", "Status", "Note"],
                rows,
            )
        );
    }
    Ok(())
}

fn tx_row(t: &Transaction, names: &HashMap<i64, String>) -> Vec<String> {
    vec![
        t.id.to_string(),
        t.created_at.format("%Y-%m-%d %H:%M").to_string(),
        names
            .get(&t.user_id)
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string()),
        t.kind.to_string(),
        format!("{:.2}", t.amount),
        t.cryptocurrency.map(|c| c.to_string()).unwrap_or_default(),
        t.status.to_string(),
        t.note.clone().unwrap_or_default(),
    ]
}
