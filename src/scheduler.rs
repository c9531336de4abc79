// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Periodic jobs. Each job runs on its own thread with its own connection and
//! keeps a persisted watermark (the last slot it fully processed), so ticks
//! missed while the process was down are replayed on the next start instead
//! of being lost.

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use rusqlite::Connection;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::accrual::run_accrual_sweep;
use crate::cadence::Cadence;
use crate::config::Config;
use crate::db;
use crate::error::Result;
use crate::notify::Notifier;
use crate::settlement::settle_pending_deposits;
use crate::store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Job {
    Accrual,
    DepositSettlement,
}

impl Job {
    pub const ALL: [Job; 2] = [Job::Accrual, Job::DepositSettlement];

    /// Watermark key.
    pub fn name(&self) -> &'static str {
        match self {
            Job::Accrual => "daily_roi",
            Job::DepositSettlement => "deposit_confirmation",
        }
    }

    pub fn cadence(&self, config: &Config) -> Cadence {
        match self {
            Job::Accrual => config.accrual_cadence(),
            Job::DepositSettlement => config.settlement_cadence(),
        }
    }

    /// Accrual replays every missed slot. Settlement only looks at current
    /// state, so one run covers any gap.
    fn backfills(&self) -> bool {
        matches!(self, Job::Accrual)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatchUp {
    /// Slots run by this call, oldest first.
    pub processed: Vec<i64>,
    /// Missed slots dropped because they exceeded the backfill cap.
    pub dropped: u64,
}

/// Runs one slot of `job`. Accrual is evaluated at the start of the slot;
/// settlement at `now`.
pub fn run_slot(
    conn: &Connection,
    job: Job,
    slot: i64,
    now: DateTime<Utc>,
    config: &Config,
    notifier: &dyn Notifier,
) -> Result<()> {
    match job {
        Job::Accrual => {
            let cadence = job.cadence(config);
            run_accrual_sweep(conn, cadence.slot_start(slot), &cadence)?;
        }
        Job::DepositSettlement => {
            settle_pending_deposits(conn, notifier, now, config.confirmation_delay())?;
        }
    }
    Ok(())
}

/// Brings `job` up to the slot containing `now`.
///
/// Without a watermark only the current slot runs. Otherwise every slot after
/// the watermark runs in order (at most `max_backfill_slots` of them) and the
/// watermark advances after each one, so a failure resumes where it stopped.
pub fn catch_up(
    conn: &Connection,
    job: Job,
    now: DateTime<Utc>,
    config: &Config,
    notifier: &dyn Notifier,
) -> Result<CatchUp> {
    let cadence = job.cadence(config);
    let current = cadence.slot_of(now);
    // The watermark is a tick start, re-mapped onto the current cadence, so a
    // changed period neither stalls the job nor replays covered ground.
    let mut first = match store::get_watermark(conn, job.name())? {
        Some(last) if cadence.slot_of(last) >= current => return Ok(CatchUp::default()),
        Some(last) if job.backfills() => cadence.slot_of(last) + 1,
        _ => current,
    };

    let mut out = CatchUp::default();
    let cap = i64::try_from(config.max_backfill_slots.max(1)).unwrap_or(i64::MAX);
    let missed = current - first + 1;
    if missed > cap {
        out.dropped = (missed - cap) as u64;
        warn!(
            "{}: {} missed ticks exceed the backfill limit of {}; dropping the oldest {}",
            job.name(),
            missed,
            cap,
            out.dropped
        );
        first = current - cap + 1;
    } else if missed > 1 {
        info!("{}: backfilling {} missed ticks", job.name(), missed - 1);
    }

    for slot in first..=current {
        run_slot(conn, job, slot, now, config, notifier)?;
        store::set_watermark(conn, job.name(), cadence.slot_start(slot), now)?;
        out.processed.push(slot);
    }
    Ok(out)
}

pub struct Scheduler {
    db_path: PathBuf,
    config: Config,
    notifier: Arc<dyn Notifier>,
}

impl Scheduler {
    pub fn new(db_path: PathBuf, config: Config, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db_path,
            config,
            notifier,
        }
    }

    /// Starts one worker thread per job. The workers share nothing but the
    /// database file, so a long accrual sweep never holds up settlement.
    pub fn spawn(self) -> std::io::Result<SchedulerHandle> {
        let mut workers = Vec::new();
        for job in Job::ALL {
            let (stop_tx, stop_rx) = mpsc::channel::<()>();
            let path = self.db_path.clone();
            let config = self.config.clone();
            let notifier = Arc::clone(&self.notifier);
            let handle = thread::Builder::new()
                .name(format!("job-{}", job.name()))
                .spawn(move || worker_loop(job, path, config, notifier, stop_rx))?;
            workers.push(Worker {
                job,
                stop: stop_tx,
                handle,
            });
        }
        info!("scheduled jobs have been set up");
        Ok(SchedulerHandle { workers })
    }
}

struct Worker {
    job: Job,
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

pub struct SchedulerHandle {
    workers: Vec<Worker>,
}

impl SchedulerHandle {
    /// Signals every worker and waits for them. A sweep in progress finishes
    /// first.
    pub fn shutdown(self) {
        for w in &self.workers {
            let _ = w.stop.send(());
        }
        self.join();
    }

    /// Blocks until the workers exit.
    pub fn join(self) {
        for w in self.workers {
            if w.handle.join().is_err() {
                error!("{} worker panicked", w.job.name());
            }
        }
    }
}

/// Settings as stored now, or `current` when they cannot be read. Changes
/// made with `config set` reach a running worker on its next tick.
pub fn refresh_config(conn: &Connection, job: Job, current: &Config) -> Config {
    match Config::load(conn) {
        Ok(fresh) => {
            if fresh != *current {
                info!("{}: settings changed, now {:?}", job.name(), fresh);
            }
            fresh
        }
        Err(e) => {
            warn!("{}: keeping previous settings: {}", job.name(), e);
            current.clone()
        }
    }
}

fn worker_loop(
    job: Job,
    db_path: PathBuf,
    mut config: Config,
    notifier: Arc<dyn Notifier>,
    stop: mpsc::Receiver<()>,
) {
    let conn = match db::open_at(&db_path) {
        Ok(c) => c,
        Err(e) => {
            error!("{}: cannot open {}: {:#}", job.name(), db_path.display(), e);
            return;
        }
    };
    info!("{}: running every {:?}", job.name(), job.cadence(&config).period());

    loop {
        config = refresh_config(&conn, job, &config);
        if let Err(e) = catch_up(&conn, job, Utc::now(), &config, notifier.as_ref()) {
            error!("{}: tick failed, will retry next tick: {}", job.name(), e);
        }

        let now = Utc::now();
        let wait = job
            .cadence(&config)
            .next_boundary(now)
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO);
        match stop.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    info!("{}: stopped", job.name());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{self, MAX_BACKFILL_SLOTS, SETTLEMENT_PERIOD_SECS};

    #[test]
    fn workers_pick_up_changed_settings() {
        let conn = db::open_in_memory().unwrap();
        let start = Config::default();
        config::set_setting(&conn, SETTLEMENT_PERIOD_SECS, "60").unwrap();
        config::set_setting(&conn, MAX_BACKFILL_SLOTS, "5").unwrap();

        let fresh = refresh_config(&conn, Job::DepositSettlement, &start);
        assert_eq!(fresh.settlement_period_secs, 60);
        assert_eq!(fresh.max_backfill_slots, 5);
        assert_eq!(
            Job::DepositSettlement.cadence(&fresh).period(),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn unreadable_settings_keep_the_previous_config() {
        let conn = db::open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO settings(key, value) VALUES ('accrual_period_secs', 'soon')",
            [],
        )
        .unwrap();
        let start = Config {
            max_backfill_slots: 7,
            ..Config::default()
        };
        assert_eq!(refresh_config(&conn, Job::Accrual, &start), start);
    }
}
