// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::accrual::run_accrual_sweep;
use crate::config::Config;
use crate::notify::LogNotifier;
use crate::scheduler::{Job, Scheduler, catch_up};
use crate::settlement::settle_pending_deposits;
use crate::store;
use crate::utils::{fmt_money, parse_timestamp, pretty_table};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

pub fn handle(conn: &Connection, m: &clap::ArgMatches, db_path: &Path) -> Result<()> {
    let config = Config::load(conn)?;
    match m.subcommand() {
        Some(("accrue", sub)) => accrue(conn, sub, &config)?,
        Some(("settle", sub)) => settle(conn, sub, &config)?,
        Some(("catch-up", _)) => catch_up_all(conn, &config)?,
        Some(("run", _)) => run(db_path, config)?,
        Some(("status", _)) => status(conn, &config)?,
        _ => {}
    }
    Ok(())
}

fn timestamp_arg(sub: &clap::ArgMatches, id: &str) -> Result<DateTime<Utc>> {
    match sub.get_one::<String>(id) {
        Some(s) => parse_timestamp(s),
        None => Ok(Utc::now()),
    }
}

fn accrue(conn: &Connection, sub: &clap::ArgMatches, config: &Config) -> Result<()> {
    let as_of = timestamp_arg(sub, "as-of")?;
    let report = run_accrual_sweep(conn, as_of, &config.accrual_cadence())?;
    println!(
        "Credited {} investment(s) for {}, completed {}, skipped {}, failed {}",
        report.credited,
        fmt_money(&report.total_credited),
        report.completed,
        report.skipped,
        report.failed
    );
    Ok(())
}

fn settle(conn: &Connection, sub: &clap::ArgMatches, config: &Config) -> Result<()> {
    let now = timestamp_arg(sub, "now")?;
    let settled = settle_pending_deposits(conn, &LogNotifier, now, config.confirmation_delay())?;
    println!("Settled {} deposit(s)", settled.len());
    Ok(())
}

fn catch_up_all(conn: &Connection, config: &Config) -> Result<()> {
    let now = Utc::now();
    for job in Job::ALL {
        let done = catch_up(conn, job, now, config, &LogNotifier)
            .with_context(|| format!("catching up {}", job.name()))?;
        println!(
            "{}: ran {} tick(s), dropped {}",
            job.name(),
            done.processed.len(),
            done.dropped
        );
    }
    Ok(())
}

/// Foreground scheduler; exits only when the process is killed.
fn run(db_path: &Path, config: Config) -> Result<()> {
    println!(
        "Running jobs against {} (Ctrl-C to stop)",
        db_path.display()
    );
    let handle = Scheduler::new(db_path.to_path_buf(), config, Arc::new(LogNotifier))
        .spawn()
        .context("starting scheduler threads")?;
    handle.join();
    Ok(())
}

fn status(conn: &Connection, config: &Config) -> Result<()> {
    let marks = store::watermarks(conn)?;
    let rows = Job::ALL
        .iter()
        .map(|job| {
            let cadence = job.cadence(config);
            let (tick, updated) = marks
                .iter()
                .find(|(name, _, _)| name == job.name())
                .map(|(_, tick, at)| {
                    (
                        tick.to_rfc3339(),
                        at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    )
                })
                .unwrap_or_else(|| ("never".to_string(), String::new()));
            vec![
                job.name().to_string(),
                format!("{}s", cadence.period().as_secs()),
                tick,
                updated,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Job", "Every", "Last tick", "Recorded at"], rows)
    );
    Ok(())
}
