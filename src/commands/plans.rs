// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::plans::all_plans;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("list", sub)) = m.subcommand() {
        let plans = all_plans(conn)?;
        if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &plans)? {
            let rows = plans
                .iter()
                .map(|p| {
                    vec![
                        p.id.to_string(),
                        p.name.clone(),
                        format!("{}%", p.daily_roi.normalize()),
                        format!("{} days", p.duration_days),
                        format!("{:.2}", p.min_investment),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["ID", "Plan", "Daily ROI", "Term", "Minimum"], rows)
            );
        }
    }
    Ok(())
}
