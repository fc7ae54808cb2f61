//! Damper-position policy.
//!
//! Pure mapping from (operating mode, invert flag, alarm condition) to the
//! commanded blade position. Fire mode rests open and drives closed on
//! alarm; smoke mode is the inverse; the invert flag flips either result.

use fdc_common::types::{DamperPosition, OperatingMode};

/// Resting position held while no alarm is active.
#[inline]
pub const fn working_position(mode: OperatingMode, invert: bool) -> DamperPosition {
    let pos = match mode {
        OperatingMode::Fire => DamperPosition::Open,
        OperatingMode::Smoke => DamperPosition::Closed,
    };
    if invert { pos.inverted() } else { pos }
}

/// Position commanded when an alarm trips.
#[inline]
pub const fn alarm_position(mode: OperatingMode, invert: bool) -> DamperPosition {
    working_position(mode, invert).inverted()
}
