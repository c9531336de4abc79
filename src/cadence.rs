// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// A fixed tick period aligned to the Unix epoch. Slot `n` covers
/// `[n * period, (n + 1) * period)`; a daily cadence therefore ticks at UTC
/// midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    period_secs: i64,
}

impl Cadence {
    /// Sub-second periods are rounded up to one second.
    pub fn every(period: Duration) -> Self {
        let secs = i64::try_from(period.as_secs()).unwrap_or(i64::MAX).max(1);
        Self { period_secs: secs }
    }

    pub fn daily() -> Self {
        Self::every(Duration::from_secs(24 * 60 * 60))
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs as u64)
    }

    pub fn slot_of(&self, ts: DateTime<Utc>) -> i64 {
        ts.timestamp().div_euclid(self.period_secs)
    }

    pub fn slot_start(&self, slot: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(slot.saturating_mul(self.period_secs), 0)
            .unwrap_or_default()
    }

    /// Start of the slot after the one containing `ts`.
    pub fn next_boundary(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        self.slot_start(self.slot_of(ts) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn daily_slots_break_at_utc_midnight() {
        let c = Cadence::daily();
        let late = Utc.with_ymd_and_hms(2025, 8, 1, 23, 59, 59).unwrap();
        let midnight = Utc.with_ymd_and_hms(2025, 8, 2, 0, 0, 0).unwrap();
        assert_eq!(c.slot_of(late) + 1, c.slot_of(midnight));
        assert_eq!(c.slot_start(c.slot_of(late)), Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap());
        assert_eq!(c.next_boundary(late), midnight);
    }

    #[test]
    fn ten_minute_slots() {
        let c = Cadence::every(Duration::from_secs(600));
        let t = Utc.with_ymd_and_hms(2025, 8, 1, 10, 7, 0).unwrap();
        assert_eq!(c.slot_start(c.slot_of(t)), Utc.with_ymd_and_hms(2025, 8, 1, 10, 0, 0).unwrap());
        assert_eq!(c.next_boundary(t), Utc.with_ymd_and_hms(2025, 8, 1, 10, 10, 0).unwrap());
    }
}
