// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{self, Config};
use crate::utils::{pretty_table, required};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => show(conn)?,
        Some(("set", sub)) => {
            let key = required(sub, "key")?;
            let value = required(sub, "value")?;
            config::set_setting(conn, key, value)
                .with_context(|| format!("Cannot set {}", key))?;
            println!("{} = {}", key, value.trim());
        }
        _ => {}
    }
    Ok(())
}

fn show(conn: &Connection) -> Result<()> {
    let cfg = Config::load(conn)?;
    let rows = config::KEYS
        .iter()
        .map(|key| -> Result<Vec<String>> {
            let effective = match *key {
                config::CONFIRMATION_DELAY_SECS => cfg.confirmation_delay_secs,
                config::ACCRUAL_PERIOD_SECS => cfg.accrual_period_secs,
                config::SETTLEMENT_PERIOD_SECS => cfg.settlement_period_secs,
                _ => cfg.max_backfill_slots,
            };
            let source = if config::get_setting(conn, key)?.is_some() {
                "settings"
            } else {
                "default"
            };
            Ok(vec![key.to_string(), effective.to_string(), source.to_string()])
        })
        .collect::<Result<Vec<_>>>()?;
    println!("{}", pretty_table(&["Key", "Value", "Source"], rows));
    Ok(())
}
