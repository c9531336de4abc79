// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime policy, stored as rows of the `settings` table.

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::time::Duration;

use crate::cadence::Cadence;
use crate::error::{LedgerError, Result};
use crate::settlement::DEFAULT_CONFIRMATION_DELAY;

pub const CONFIRMATION_DELAY_SECS: &str = "confirmation_delay_secs";
pub const ACCRUAL_PERIOD_SECS: &str = "accrual_period_secs";
pub const SETTLEMENT_PERIOD_SECS: &str = "settlement_period_secs";
pub const MAX_BACKFILL_SLOTS: &str = "max_backfill_slots";

pub const KEYS: [&str; 4] = [
    CONFIRMATION_DELAY_SECS,
    ACCRUAL_PERIOD_SECS,
    SETTLEMENT_PERIOD_SECS,
    MAX_BACKFILL_SLOTS,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub confirmation_delay_secs: u64,
    pub accrual_period_secs: u64,
    pub settlement_period_secs: u64,
    pub max_backfill_slots: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            confirmation_delay_secs: DEFAULT_CONFIRMATION_DELAY.as_secs(),
            accrual_period_secs: 24 * 60 * 60,
            settlement_period_secs: 10 * 60,
            max_backfill_slots: 30,
        }
    }
}

impl Config {
    /// Defaults overlaid with whatever the settings table holds.
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut cfg = Config::default();
        for key in KEYS {
            if let Some(raw) = get_setting(conn, key)? {
                cfg.apply(key, &raw)?;
            }
        }
        Ok(cfg)
    }

    fn apply(&mut self, key: &str, raw: &str) -> Result<()> {
        let value: u64 = raw
            .trim()
            .parse()
            .map_err(|_| LedgerError::Parse(format!("{} must be a whole number, got '{}'", key, raw)))?;
        let slot = match key {
            CONFIRMATION_DELAY_SECS => &mut self.confirmation_delay_secs,
            ACCRUAL_PERIOD_SECS => &mut self.accrual_period_secs,
            SETTLEMENT_PERIOD_SECS => &mut self.settlement_period_secs,
            MAX_BACKFILL_SLOTS => &mut self.max_backfill_slots,
            other => return Err(LedgerError::Parse(format!("unknown setting '{}'", other))),
        };
        if value == 0 && key != CONFIRMATION_DELAY_SECS {
            return Err(LedgerError::Parse(format!("{} must be positive", key)));
        }
        *slot = value;
        Ok(())
    }

    pub fn confirmation_delay(&self) -> Duration {
        Duration::from_secs(self.confirmation_delay_secs)
    }

    pub fn accrual_cadence(&self) -> Cadence {
        Cadence::every(Duration::from_secs(self.accrual_period_secs))
    }

    pub fn settlement_cadence(&self) -> Cadence {
        Cadence::every(Duration::from_secs(self.settlement_period_secs))
    }
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?)
}

/// Validates `value` for `key` before storing it.
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    Config::default().apply(key, value)?;
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value.trim()],
    )?;
    Ok(())
}
