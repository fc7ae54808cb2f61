//! Simulated real-time clock.
//!
//! The controller's only notion of "now". The clock never reads wall time:
//! it starts at a fixed epoch and moves forward through explicit
//! advancement or RTC register writes. Elapsed-time semantics everywhere in
//! the core are expressed against this value.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Simulated RTC epoch the controller boots with.
pub const RTC_EPOCH: (i32, u32, u32, u32, u32) = (2025, 9, 10, 11, 20);

/// Simulated real-time clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimClock {
    now: NaiveDateTime,
}

impl SimClock {
    /// Current instant.
    #[inline]
    pub const fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Advance by whole seconds.
    pub fn advance_secs(&mut self, seconds: i64) {
        self.now += Duration::seconds(seconds);
    }

    /// Replace a single RTC field. A value that does not form a valid
    /// date/time leaves the clock unchanged (clamp-not-reject policy).
    pub fn set_year(&mut self, year: i32) {
        if let Some(t) = self.now.with_year(year) {
            self.now = t;
        }
    }

    pub fn set_month(&mut self, month: u32) {
        if let Some(t) = self.now.with_month(month) {
            self.now = t;
        }
    }

    pub fn set_day(&mut self, day: u32) {
        if let Some(t) = self.now.with_day(day) {
            self.now = t;
        }
    }

    pub fn set_hour(&mut self, hour: u32) {
        if let Some(t) = self.now.with_hour(hour) {
            self.now = t;
        }
    }

    pub fn set_minute(&mut self, minute: u32) {
        if let Some(t) = self.now.with_minute(minute) {
            self.now = t;
        }
    }

    /// Weekday as reported on BACnet AI7 (1 = Monday).
    pub fn weekday_number(&self) -> u16 {
        self.now.weekday().number_from_monday() as u16
    }

    /// Log-entry timestamp form, `YYYY-MM-DD HH:MM:SS`.
    pub fn stamp(&self) -> String {
        self.now.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl Default for SimClock {
    fn default() -> Self {
        let (y, mo, d, h, mi) = RTC_EPOCH;
        let now = NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|date| date.and_hms_opt(h, mi, 0))
            .expect("RTC epoch is a valid date");
        Self { now }
    }
}
