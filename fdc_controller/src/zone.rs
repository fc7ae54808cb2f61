//! Per-zone state: damper position, alarm source flags, temperature and a
//! bounded append-only log.
//!
//! A zone's `alarm_active` flag is set when any of its alarm sources trips
//! and cleared only by a reset targeting the zone. In the global
//! external-alarm profile the device-wide flag marks the zone named in the
//! trigger; the zone-local `external` flag is used by the per-zone profile.

use std::collections::VecDeque;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use fdc_common::consts::DEFAULT_TEMPERATURE_C;
use fdc_common::types::DamperPosition;

/// One timestamped zone-log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Simulated-clock instant of the event.
    pub at: NaiveDateTime,
    /// Event description.
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.at.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

/// An independently supervised damper + sensor group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Display name.
    pub name: String,
    /// Current damper position.
    pub position: DamperPosition,
    /// Smoke detector tripped.
    pub smoke: bool,
    /// Thermal sensor tripped.
    pub thermal: bool,
    /// External input tripped (per-zone scoping profile).
    #[serde(default)]
    pub external: bool,
    /// Aggregate: the zone has an active alarm.
    pub alarm_active: bool,
    /// Temperature reading in °C.
    pub temperature: f64,
    /// Bounded append-only event log, oldest first.
    #[serde(default)]
    pub log: VecDeque<LogEntry>,
}

impl Zone {
    /// Fresh zone: damper closed, no alarms, default temperature, empty log.
    pub fn new(index: u8) -> Self {
        Self {
            name: format!("Zone {index}"),
            position: DamperPosition::Closed,
            smoke: false,
            thermal: false,
            external: false,
            alarm_active: false,
            temperature: DEFAULT_TEMPERATURE_C,
            log: VecDeque::new(),
        }
    }

    /// Append a log line, evicting the oldest entry past `cap`.
    pub fn push_log(&mut self, cap: usize, at: NaiveDateTime, message: impl Into<String>) {
        self.log.push_back(LogEntry {
            at,
            message: message.into(),
        });
        while self.log.len() > cap {
            self.log.pop_front();
        }
    }

    /// Any zone-local alarm source tripped.
    pub fn any_source(&self) -> bool {
        self.smoke || self.thermal || self.external
    }

    /// Clear every alarm source flag and the aggregate flag.
    pub fn clear_alarms(&mut self) {
        self.smoke = false;
        self.thermal = false;
        self.external = false;
        self.alarm_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 10)
            .unwrap()
            .and_hms_opt(11, 20, 0)
            .unwrap()
    }

    #[test]
    fn new_zone_is_quiet_and_closed() {
        let zone = Zone::new(3);
        assert_eq!(zone.name, "Zone 3");
        assert_eq!(zone.position, DamperPosition::Closed);
        assert!(!zone.any_source());
        assert!(!zone.alarm_active);
        assert_eq!(zone.temperature, DEFAULT_TEMPERATURE_C);
        assert!(zone.log.is_empty());
    }

    #[test]
    fn log_evicts_oldest_past_cap() {
        let mut zone = Zone::new(1);
        for i in 0..7 {
            zone.push_log(5, ts(), format!("event {i}"));
        }
        assert_eq!(zone.log.len(), 5);
        assert_eq!(zone.log.front().unwrap().message, "event 2");
        assert_eq!(zone.log.back().unwrap().message, "event 6");
    }

    #[test]
    fn log_entry_renders_with_timestamp() {
        let mut zone = Zone::new(1);
        zone.push_log(10, ts(), "Damper moved to OPEN");
        assert_eq!(
            zone.log[0].to_string(),
            "[2025-09-10 11:20:00] Damper moved to OPEN"
        );
    }

    #[test]
    fn clear_alarms_resets_all_flags() {
        let mut zone = Zone::new(1);
        zone.smoke = true;
        zone.thermal = true;
        zone.external = true;
        zone.alarm_active = true;
        zone.clear_alarms();
        assert!(!zone.any_source());
        assert!(!zone.alarm_active);
    }
}
