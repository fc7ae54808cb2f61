//! Auto-test scheduling.
//!
//! Combines a time-of-day anchor with an hour interval to compute the next
//! unattended full test. The computed instant is always strictly in the
//! future relative to the clock at scheduling time, even when the anchor
//! has already passed today.

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use fdc_common::consts::{
    AUTO_TEST_INTERVAL_MAX_H, AUTO_TEST_INTERVAL_MIN_H, DEFAULT_AUTO_TEST_INTERVAL_H,
};

/// First instant at or after today's (`hour`,`minute`) anchor, pushed by
/// whole intervals until strictly after `now`.
pub fn schedule_next(now: NaiveDateTime, hour: u8, minute: u8, interval_hours: u32) -> NaiveDateTime {
    let interval = Duration::hours(i64::from(interval_hours.max(1)));
    let mut next = now
        .with_hour(u32::from(hour) % 24)
        .and_then(|t| t.with_minute(u32::from(minute) % 60))
        .and_then(|t| t.with_second(0))
        .unwrap_or(now);
    while next <= now {
        next += interval;
    }
    next
}

/// Auto-test configuration and the computed next firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoTest {
    pub enabled: bool,
    /// Hours between unattended tests.
    pub interval_hours: u32,
    /// Time-of-day anchor hour, 0-23.
    pub hour: u8,
    /// Time-of-day anchor minute, 0-59.
    pub minute: u8,
    /// Next scheduled firing, when enabled.
    pub next_at: Option<NaiveDateTime>,
}

impl Default for AutoTest {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_hours: DEFAULT_AUTO_TEST_INTERVAL_H,
            hour: 0,
            minute: 0,
            next_at: None,
        }
    }
}

impl AutoTest {
    /// Apply new parameters: interval clamped to the valid range, anchor
    /// fields wrapped modulo their ranges. Reschedules when enabling.
    pub fn set_params(
        &mut self,
        enabled: bool,
        interval_hours: u32,
        hour: u8,
        minute: u8,
        now: NaiveDateTime,
    ) {
        self.enabled = enabled;
        self.interval_hours =
            interval_hours.clamp(AUTO_TEST_INTERVAL_MIN_H, AUTO_TEST_INTERVAL_MAX_H);
        self.hour = hour % 24;
        self.minute = minute % 60;
        if enabled {
            self.reschedule(now);
        }
    }

    /// Recompute the next firing from `now`.
    pub fn reschedule(&mut self, now: NaiveDateTime) {
        self.next_at = Some(schedule_next(now, self.hour, self.minute, self.interval_hours));
    }

    /// Whether the scheduled instant has been reached.
    pub fn due(&self, now: NaiveDateTime) -> bool {
        self.enabled && self.next_at.is_some_and(|next| now >= next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn next_is_strictly_future() {
        for (h, m, interval) in [(0u8, 0u8, 24u32), (11, 20, 1), (23, 59, 12), (11, 19, 4464)] {
            let next = schedule_next(at(11, 20), h, m, interval);
            assert!(next > at(11, 20), "h={h} m={m} interval={interval}");
        }
    }

    #[test]
    fn anchor_later_today_is_taken_directly() {
        let next = schedule_next(at(11, 20), 15, 30, 24);
        assert_eq!(next, at(15, 30));
    }

    #[test]
    fn anchor_already_passed_pushes_by_interval() {
        let next = schedule_next(at(11, 20), 0, 0, 24);
        assert_eq!(
            next,
            NaiveDate::from_ymd_opt(2025, 9, 11)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn short_interval_lands_on_next_slot() {
        // Anchor 00:00, 4 h interval → slots at 00/04/08/12/16/20.
        let next = schedule_next(at(11, 20), 0, 0, 4);
        assert_eq!(next, at(12, 0));
    }

    #[test]
    fn anchor_equal_to_now_pushes_forward() {
        let next = schedule_next(at(11, 20), 11, 20, 2);
        assert_eq!(next, at(13, 20));
    }

    #[test]
    fn set_params_wraps_and_clamps() {
        let mut auto = AutoTest::default();
        auto.set_params(true, 0, 25, 61, at(11, 20));
        assert_eq!(auto.interval_hours, AUTO_TEST_INTERVAL_MIN_H);
        assert_eq!(auto.hour, 1);
        assert_eq!(auto.minute, 1);
        assert!(auto.next_at.is_some());

        auto.set_params(true, 99_999, 0, 0, at(11, 20));
        assert_eq!(auto.interval_hours, AUTO_TEST_INTERVAL_MAX_H);
    }

    #[test]
    fn disabling_keeps_schedule_but_not_due() {
        let mut auto = AutoTest::default();
        auto.set_params(true, 24, 12, 0, at(11, 20));
        assert!(!auto.due(at(11, 30)));
        assert!(auto.due(at(12, 0)));

        auto.set_params(false, 24, 12, 0, at(11, 20));
        assert!(!auto.due(at(12, 0)));
    }
}
