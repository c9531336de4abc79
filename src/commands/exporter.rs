// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::required;
use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => bail!("Unknown format: {} (use csv|json)", other),
        }
    }
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("transactions", sub)) = m.subcommand() {
        let format: ExportFormat = required(sub, "format")?.parse()?;
        let out = required(sub, "out")?;
        let n = export_transactions(conn, format, Path::new(out))?;
        println!("Exported {} transactions to {}", n, out);
    }
    Ok(())
}

/// Writes the whole ledger, oldest first, and returns the row count.
pub fn export_transactions(conn: &Connection, format: ExportFormat, out: &Path) -> Result<usize> {
    let mut entries = store::all_transactions(conn)?;
    entries.reverse();

    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_path(out)
                .with_context(|| format!("Create {}", out.display()))?;
            wtr.write_record([
                "id",
                "created_at",
                "user_id",
                "type",
                "amount",
                "cryptocurrency",
                "wallet_address",
                "status",
                "plan_id",
                "investment_id",
                "note",
            ])?;
            for t in &entries {
                wtr.write_record([
                    t.id.to_string(),
                    t.created_at.to_rfc3339(),
                    t.user_id.to_string(),
                    t.kind.to_string(),
                    format!("{:.2}", t.amount),
                    t.cryptocurrency.map(|c| c.to_string()).unwrap_or_default(),
                    t.wallet_address.clone().unwrap_or_default(),
                    t.status.to_string(),
                    t.plan_id.map(|p| p.to_string()).unwrap_or_default(),
                    t.investment_id.map(|i| i.to_string()).unwrap_or_default(),
                    t.note.clone().unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        ExportFormat::Json => {
            std::fs::write(out, serde_json::to_string_pretty(&entries)?)
                .with_context(|| format!("Write {}", out.display()))?;
        }
    }
    Ok(entries.len())
}
