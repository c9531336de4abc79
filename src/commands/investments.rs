// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("list", sub)) = m.subcommand() {
        let user = sub.get_one::<i64>("user").copied();
        let data = store::list_investments(conn, user, sub.get_flag("active"))?;
        if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
            let rows = data
                .iter()
                .map(|i| {
                    vec![
                        i.id.to_string(),
                        i.user_id.to_string(),
                        crate::plans::plan_name(conn, i.plan_id).unwrap_or_default(),
                        format!("{:.2}", i.amount),
                        format!("{}%", i.daily_roi.normalize()),
                        i.start_date.format("%Y-%m-%d").to_string(),
                        i.end_date.format("%Y-%m-%d").to_string(),
                        i.status.to_string(),
                        format!("{:.2}", i.total_profit),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(
                    &["ID", "User", "Plan", "Amount", "Daily", "Start", "End", "Status", "Profit"],
                    rows
                )
            );
        }
    }
    Ok(())
}
