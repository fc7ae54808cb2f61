//! System-wide constants for the FDC workspace.
//!
//! Single source of truth for numeric limits and defaults.
//! Imported by all crates — no duplication permitted.

/// Maximum number of supervised zones.
pub const MAX_ZONES: u8 = 16;

/// Maximum Modbus/BACnet slave ID.
pub const MAX_SLAVE_ID: u8 = 127;

/// Default damper travel time in seconds.
pub const DEFAULT_OPERATION_TIME_S: u16 = 90;

/// Default full-test time budget in seconds.
pub const DEFAULT_TEST_TIME_S: u16 = 120;

/// Default BMS communication timeout in seconds.
pub const DEFAULT_COMM_TIMEOUT_S: u16 = 120;

/// Lower clamp for the configurable timing registers.
pub const TIMING_MIN_S: u16 = 60;

/// Upper clamp for the configurable timing registers.
pub const TIMING_MAX_S: u16 = 360;

/// Minimum auto-test interval in hours.
pub const AUTO_TEST_INTERVAL_MIN_H: u32 = 1;

/// Maximum auto-test interval in hours (six months plus change).
pub const AUTO_TEST_INTERVAL_MAX_H: u32 = 4464;

/// Default auto-test interval in hours.
pub const DEFAULT_AUTO_TEST_INTERVAL_H: u32 = 24;

/// Rolling alarm-history depth (registers 501-520).
pub const ALARM_HISTORY_CAP: usize = 20;

/// Test-report history depth.
pub const TEST_REPORT_CAP: usize = 50;

/// Default per-zone log depth.
pub const DEFAULT_ZONE_LOG_CAP: usize = 100;

/// Zone temperature at which a thermal alarm auto-raises, in °C.
pub const THERMAL_TRIP_C: f64 = 72.0;

/// Default zone temperature reading in °C.
pub const DEFAULT_TEMPERATURE_C: f64 = 20.0;

// ─── Analog output tiers (fixed lookup, 0-10 V status line) ─────────

/// Controller unpowered.
pub const ANALOG_UNPOWERED: u8 = 0;
/// Powered, no alarm.
pub const ANALOG_IDLE: u8 = 2;
/// Single active alarm source other than smoke/thermal.
pub const ANALOG_SINGLE: u8 = 4;
/// Smoke alarm only.
pub const ANALOG_SMOKE: u8 = 6;
/// Thermal alarm only.
pub const ANALOG_THERMAL: u8 = 8;
/// Two or more active alarm source families.
pub const ANALOG_MULTI: u8 = 10;

/// Default simulator state file name.
pub const DEFAULT_STATE_FILE: &str = "fdc_state.json";
