//! Derived outputs: status LED, fault LED, relay and the 0-10 V analog
//! status line.
//!
//! All functions are pure; the controller recomputes them after every state
//! change that can affect an output. The analog tiers are a fixed lookup
//! table, not a computation.

use fdc_common::consts::{
    ANALOG_IDLE, ANALOG_MULTI, ANALOG_SINGLE, ANALOG_SMOKE, ANALOG_THERMAL, ANALOG_UNPOWERED,
};
use fdc_common::types::{LedPolicy, LedState, RelayMode, RelayState};

/// Device-wide alarm summary used by the output derivations.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlarmSummary {
    /// Any zone has an active alarm.
    pub any_active: bool,
    /// Any smoke source tripped.
    pub smoke: bool,
    /// Any thermal source tripped.
    pub thermal: bool,
    /// External source tripped (device-wide or any zone).
    pub external: bool,
}

impl AlarmSummary {
    /// Number of distinct active source families.
    pub fn source_families(&self) -> u8 {
        self.smoke as u8 + self.thermal as u8 + self.external as u8
    }
}

/// Status LED per the configured presentation profile.
pub fn derive_led(policy: LedPolicy, powered: bool, test_mode: bool, any_alarm: bool) -> LedState {
    match policy {
        LedPolicy::PowerTest => {
            if test_mode {
                LedState::Flash
            } else if powered {
                LedState::On
            } else {
                LedState::Off
            }
        }
        LedPolicy::AlarmFlash => {
            if test_mode || any_alarm {
                LedState::Flash
            } else {
                LedState::Off
            }
        }
    }
}

/// Fault LED: lit while any alarm is active.
pub fn derive_fault_led(any_alarm: bool) -> LedState {
    if any_alarm { LedState::On } else { LedState::Off }
}

/// Relay contact state.
///
/// `Alarm` mode closes on any active alarm. `Fan` mode does the same
/// unless the invert bit flips the polarity.
pub fn derive_relay(mode: RelayMode, invert: bool, any_alarm: bool) -> RelayState {
    let closed_on_alarm = match mode {
        RelayMode::Alarm => true,
        RelayMode::Fan => !invert,
    };
    if any_alarm == closed_on_alarm {
        RelayState::Closed
    } else {
        RelayState::Open
    }
}

/// Analog status tier.
pub fn derive_analog(powered: bool, summary: &AlarmSummary) -> u8 {
    if !powered {
        ANALOG_UNPOWERED
    } else if summary.any_active {
        if summary.source_families() > 1 {
            ANALOG_MULTI
        } else if summary.smoke {
            ANALOG_SMOKE
        } else if summary.thermal {
            ANALOG_THERMAL
        } else {
            ANALOG_SINGLE
        }
    } else {
        ANALOG_IDLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(smoke: bool, thermal: bool, external: bool) -> AlarmSummary {
        AlarmSummary {
            any_active: smoke || thermal || external,
            smoke,
            thermal,
            external,
        }
    }

    #[test]
    fn power_test_led_profile() {
        use LedPolicy::PowerTest;
        assert_eq!(derive_led(PowerTest, false, false, false), LedState::Off);
        assert_eq!(derive_led(PowerTest, true, false, false), LedState::On);
        assert_eq!(derive_led(PowerTest, true, true, false), LedState::Flash);
        // Alarms alone do not flash this profile.
        assert_eq!(derive_led(PowerTest, true, false, true), LedState::On);
    }

    #[test]
    fn alarm_flash_led_profile() {
        use LedPolicy::AlarmFlash;
        assert_eq!(derive_led(AlarmFlash, true, false, false), LedState::Off);
        assert_eq!(derive_led(AlarmFlash, false, true, false), LedState::Flash);
        assert_eq!(derive_led(AlarmFlash, false, false, true), LedState::Flash);
    }

    #[test]
    fn fault_led_tracks_alarms() {
        assert_eq!(derive_fault_led(false), LedState::Off);
        assert_eq!(derive_fault_led(true), LedState::On);
    }

    #[test]
    fn alarm_relay_closes_on_alarm() {
        assert_eq!(
            derive_relay(RelayMode::Alarm, false, true),
            RelayState::Closed
        );
        assert_eq!(derive_relay(RelayMode::Alarm, false, false), RelayState::Open);
        // Invert bit is a Fan-mode concern only.
        assert_eq!(
            derive_relay(RelayMode::Alarm, true, true),
            RelayState::Closed
        );
    }

    #[test]
    fn fan_relay_polarity_inverts() {
        assert_eq!(derive_relay(RelayMode::Fan, false, true), RelayState::Closed);
        assert_eq!(derive_relay(RelayMode::Fan, false, false), RelayState::Open);
        assert_eq!(derive_relay(RelayMode::Fan, true, true), RelayState::Open);
        assert_eq!(derive_relay(RelayMode::Fan, true, false), RelayState::Closed);
    }

    #[test]
    fn analog_zero_when_unpowered() {
        assert_eq!(derive_analog(false, &summary(true, true, true)), 0);
    }

    #[test]
    fn analog_idle_tier_when_quiet() {
        assert_eq!(derive_analog(true, &summary(false, false, false)), 2);
    }

    #[test]
    fn analog_single_source_tiers() {
        assert_eq!(derive_analog(true, &summary(true, false, false)), 6);
        assert_eq!(derive_analog(true, &summary(false, true, false)), 8);
        assert_eq!(derive_analog(true, &summary(false, false, true)), 4);
    }

    #[test]
    fn analog_multiple_sources_take_max_tier() {
        assert_eq!(derive_analog(true, &summary(true, true, false)), 10);
        assert_eq!(derive_analog(true, &summary(true, false, true)), 10);
        assert_eq!(derive_analog(true, &summary(true, true, true)), 10);
    }

    #[test]
    fn analog_single_tier_with_active_flag_only() {
        // A zone can be marked active while no source family is readable
        // (global external profile after a partial reset).
        let s = AlarmSummary {
            any_active: true,
            ..Default::default()
        };
        assert_eq!(derive_analog(true, &s), 4);
    }
}
