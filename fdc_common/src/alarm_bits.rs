//! Active-alarm bitmask exposed in register 401 and BACnet AI1.
//!
//! Bit layout follows the device register map. `TEST` and `COMM` are
//! reserved by the map but never raised by the simulation model.

use bitflags::bitflags;

bitflags! {
    /// Aggregate alarm condition bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AlarmBits: u16 {
        /// External alarm input active.
        const EXTERNAL = 1 << 2;
        /// Smoke detector alarm active.
        const SMOKE = 1 << 3;
        /// Reserved: test in progress.
        const TEST = 1 << 4;
        /// Reserved: communication timeout.
        const COMM = 1 << 5;
    }
}

impl AlarmBits {
    /// Compose the bitmask from the device-wide alarm summary.
    pub fn from_summary(external: bool, smoke: bool) -> Self {
        let mut bits = Self::empty();
        if external {
            bits |= Self::EXTERNAL;
        }
        if smoke {
            bits |= Self::SMOKE;
        }
        bits
    }
}
