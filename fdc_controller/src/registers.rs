//! Modbus and BACnet mirrors of controller state.
//!
//! The address space is a fixed enumerated table per protocol — a typo in
//! an address is unrepresentable at the call sites — with a default-zero
//! read fallback only for genuinely unmapped addresses. Both mirrors are
//! recomputed from a [`MirrorSnapshot`] after every state mutation and are
//! never mutated independently; the momentary command slots (test start,
//! smoke reset, history clear) keep their last raw written value only.
//!
//! Register map:
//!
//! | Modbus     | Meaning                              |
//! |------------|--------------------------------------|
//! | 101-105    | Commands: test, smoke reset, invert, detector type, clear history |
//! | 300-314    | Device configuration and RTC block   |
//! | 401        | Active-alarm bitmask                 |
//! | 401+z      | Per-zone alarm (smoke or thermal)    |
//! | 501-520    | Rolling alarm-history codes          |
//!
//! BACnet exposes the subset relevant per object kind: AI1-10 read-only
//! status, AV1-3 timing values, BI per-zone alarms, BO1-3 writable
//! commands.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Modbus Address Table ───────────────────────────────────────────

/// First per-zone alarm register (zone z lives at `401 + z`).
const ZONE_ALARM_BASE: u16 = 401;
/// First rolling-history register.
const HISTORY_BASE: u16 = 501;
/// Number of rolling-history registers (501-520).
const HISTORY_SLOTS: u16 = 20;

/// Every mapped Modbus holding register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModbusRegister {
    /// 101: write 1 to start a full test.
    StartTest,
    /// 102: write 1 to reset the smoke detectors.
    SmokeReset,
    /// 103: invert damper position flag.
    InvertPosition,
    /// 104: smoke detector contact type (0=NO, 1=NC).
    DetectorContact,
    /// 105: write 1 to clear the alarm history.
    ClearHistory,
    /// 300: hardware type code.
    HardwareType,
    /// 301: slave ID.
    SlaveId,
    /// 302: communication timeout enable.
    CommTimeoutEnable,
    /// 303: communication timeout, seconds.
    CommTimeout,
    /// 304: damper operation time, seconds.
    OperationTime,
    /// 305: full-test time budget, seconds.
    TestTime,
    /// 306-310: RTC fields.
    RtcYear,
    RtcMonth,
    RtcDay,
    RtcHour,
    RtcMinute,
    /// 311-314: auto-test configuration.
    AutoTestInterval,
    AutoTestHour,
    AutoTestMinute,
    AutoTestEnable,
    /// 401: active-alarm bitmask.
    ActiveAlarms,
    /// 401+z — zone z alarm flag (smoke or thermal).
    ZoneAlarm(u8),
    /// 501-520: rolling history, slot 0 oldest.
    HistorySlot(u8),
}

impl ModbusRegister {
    /// Holding-register address of this slot.
    pub const fn address(self) -> u16 {
        match self {
            Self::StartTest => 101,
            Self::SmokeReset => 102,
            Self::InvertPosition => 103,
            Self::DetectorContact => 104,
            Self::ClearHistory => 105,
            Self::HardwareType => 300,
            Self::SlaveId => 301,
            Self::CommTimeoutEnable => 302,
            Self::CommTimeout => 303,
            Self::OperationTime => 304,
            Self::TestTime => 305,
            Self::RtcYear => 306,
            Self::RtcMonth => 307,
            Self::RtcDay => 308,
            Self::RtcHour => 309,
            Self::RtcMinute => 310,
            Self::AutoTestInterval => 311,
            Self::AutoTestHour => 312,
            Self::AutoTestMinute => 313,
            Self::AutoTestEnable => 314,
            Self::ActiveAlarms => ZONE_ALARM_BASE,
            Self::ZoneAlarm(z) => ZONE_ALARM_BASE + z as u16,
            Self::HistorySlot(slot) => HISTORY_BASE + slot as u16,
        }
    }

    /// Resolve an address against the table for a controller supervising
    /// `zones` zones. Unmapped addresses return `None`.
    pub fn from_address(address: u16, zones: u8) -> Option<Self> {
        let reg = match address {
            101 => Self::StartTest,
            102 => Self::SmokeReset,
            103 => Self::InvertPosition,
            104 => Self::DetectorContact,
            105 => Self::ClearHistory,
            300 => Self::HardwareType,
            301 => Self::SlaveId,
            302 => Self::CommTimeoutEnable,
            303 => Self::CommTimeout,
            304 => Self::OperationTime,
            305 => Self::TestTime,
            306 => Self::RtcYear,
            307 => Self::RtcMonth,
            308 => Self::RtcDay,
            309 => Self::RtcHour,
            310 => Self::RtcMinute,
            311 => Self::AutoTestInterval,
            312 => Self::AutoTestHour,
            313 => Self::AutoTestMinute,
            314 => Self::AutoTestEnable,
            a if a == ZONE_ALARM_BASE => Self::ActiveAlarms,
            a if a > ZONE_ALARM_BASE && a <= ZONE_ALARM_BASE + zones as u16 => {
                Self::ZoneAlarm((a - ZONE_ALARM_BASE) as u8)
            }
            a if (HISTORY_BASE..HISTORY_BASE + HISTORY_SLOTS).contains(&a) => {
                Self::HistorySlot((a - HISTORY_BASE) as u8)
            }
            _ => return None,
        };
        Some(reg)
    }
}

// ─── BACnet Object Table ────────────────────────────────────────────

/// BACnet object kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum BacnetKind {
    #[serde(rename = "AI")]
    AnalogInput,
    #[serde(rename = "AV")]
    AnalogValue,
    #[serde(rename = "BI")]
    BinaryInput,
    #[serde(rename = "BO")]
    BinaryOutput,
}

impl fmt::Display for BacnetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnalogInput => write!(f, "AI"),
            Self::AnalogValue => write!(f, "AV"),
            Self::BinaryInput => write!(f, "BI"),
            Self::BinaryOutput => write!(f, "BO"),
        }
    }
}

/// Every mapped BACnet object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacnetObject {
    /// AI1: active-alarm bitmask.
    ActiveAlarms,
    /// AI2: hardware type code.
    HardwareType,
    /// AI3: slave ID.
    SlaveId,
    /// AI4-6: RTC date fields.
    RtcYear,
    RtcMonth,
    RtcDay,
    /// AI7: weekday, 1 = Monday.
    RtcWeekday,
    /// AI10: communication timeout, seconds.
    CommTimeout,
    /// AV1: damper operation time, seconds.
    OperationTime,
    /// AV2: full-test time budget, seconds.
    TestTime,
    /// AV3: communication timeout enable.
    CommTimeoutEnable,
    /// BIz: zone z alarm flag.
    ZoneAlarm(u8),
    /// BO1: write 1 to start a full test.
    StartTest,
    /// BO2: write 1 to reset the smoke detectors.
    SmokeReset,
    /// BO3: invert damper position flag.
    InvertPosition,
}

impl BacnetObject {
    /// (kind, instance) pair of this object.
    pub const fn id(self) -> (BacnetKind, u16) {
        match self {
            Self::ActiveAlarms => (BacnetKind::AnalogInput, 1),
            Self::HardwareType => (BacnetKind::AnalogInput, 2),
            Self::SlaveId => (BacnetKind::AnalogInput, 3),
            Self::RtcYear => (BacnetKind::AnalogInput, 4),
            Self::RtcMonth => (BacnetKind::AnalogInput, 5),
            Self::RtcDay => (BacnetKind::AnalogInput, 6),
            Self::RtcWeekday => (BacnetKind::AnalogInput, 7),
            Self::CommTimeout => (BacnetKind::AnalogInput, 10),
            Self::OperationTime => (BacnetKind::AnalogValue, 1),
            Self::TestTime => (BacnetKind::AnalogValue, 2),
            Self::CommTimeoutEnable => (BacnetKind::AnalogValue, 3),
            Self::ZoneAlarm(z) => (BacnetKind::BinaryInput, z as u16),
            Self::StartTest => (BacnetKind::BinaryOutput, 1),
            Self::SmokeReset => (BacnetKind::BinaryOutput, 2),
            Self::InvertPosition => (BacnetKind::BinaryOutput, 3),
        }
    }

    /// Resolve a (kind, instance) pair for a controller supervising
    /// `zones` zones. Unmapped pairs return `None`.
    pub fn from_id(kind: BacnetKind, instance: u16, zones: u8) -> Option<Self> {
        let obj = match (kind, instance) {
            (BacnetKind::AnalogInput, 1) => Self::ActiveAlarms,
            (BacnetKind::AnalogInput, 2) => Self::HardwareType,
            (BacnetKind::AnalogInput, 3) => Self::SlaveId,
            (BacnetKind::AnalogInput, 4) => Self::RtcYear,
            (BacnetKind::AnalogInput, 5) => Self::RtcMonth,
            (BacnetKind::AnalogInput, 6) => Self::RtcDay,
            (BacnetKind::AnalogInput, 7) => Self::RtcWeekday,
            (BacnetKind::AnalogInput, 10) => Self::CommTimeout,
            (BacnetKind::AnalogValue, 1) => Self::OperationTime,
            (BacnetKind::AnalogValue, 2) => Self::TestTime,
            (BacnetKind::AnalogValue, 3) => Self::CommTimeoutEnable,
            (BacnetKind::BinaryInput, z) if z >= 1 && z <= zones as u16 => {
                Self::ZoneAlarm(z as u8)
            }
            (BacnetKind::BinaryOutput, 1) => Self::StartTest,
            (BacnetKind::BinaryOutput, 2) => Self::SmokeReset,
            (BacnetKind::BinaryOutput, 3) => Self::InvertPosition,
            _ => return None,
        };
        Some(obj)
    }
}

// ─── Snapshot & Mirrors ─────────────────────────────────────────────

/// One-way view of the controller state the mirrors are computed from.
#[derive(Debug, Clone, Default)]
pub struct MirrorSnapshot {
    pub hardware_type: u16,
    pub slave_id: u16,
    pub comm_timeout_enabled: bool,
    pub comm_timeout: u16,
    pub operation_time: u16,
    pub test_time: u16,
    pub rtc_year: u16,
    pub rtc_month: u16,
    pub rtc_day: u16,
    pub rtc_hour: u16,
    pub rtc_minute: u16,
    pub rtc_weekday: u16,
    pub auto_test_interval: u16,
    pub auto_test_hour: u16,
    pub auto_test_minute: u16,
    pub auto_test_enabled: bool,
    pub invert_position: bool,
    pub detector_contact: u16,
    pub alarm_bits: u16,
    /// Ascending zone index with its (smoke | thermal) flag.
    pub zone_alarms: Vec<(u8, bool)>,
    /// Rolling history codes, oldest first.
    pub history_codes: Vec<u16>,
}

/// Modbus holding-register mirror.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModbusMirror {
    values: BTreeMap<u16, u16>,
}

impl ModbusMirror {
    /// Mirrored value; unmapped or never-written addresses read zero.
    pub fn read(&self, address: u16) -> u16 {
        self.values.get(&address).copied().unwrap_or(0)
    }

    /// Raw value store (commands also land here after dispatch).
    pub fn store(&mut self, address: u16, value: u16) {
        self.values.insert(address, value);
    }

    /// Release a removed zone's register slot.
    pub fn release_zone(&mut self, zone: u8) {
        self.values.remove(&ModbusRegister::ZoneAlarm(zone).address());
    }

    /// Recompute every state-mapped register from the snapshot.
    ///
    /// Momentary command slots (101, 102, 105) are deliberately left
    /// holding their last raw written value.
    pub fn sync(&mut self, snap: &MirrorSnapshot) {
        use ModbusRegister as R;
        self.values
            .insert(R::InvertPosition.address(), snap.invert_position as u16);
        self.values
            .insert(R::DetectorContact.address(), snap.detector_contact);
        self.values
            .insert(R::HardwareType.address(), snap.hardware_type);
        self.values.insert(R::SlaveId.address(), snap.slave_id);
        self.values.insert(
            R::CommTimeoutEnable.address(),
            snap.comm_timeout_enabled as u16,
        );
        self.values.insert(R::CommTimeout.address(), snap.comm_timeout);
        self.values
            .insert(R::OperationTime.address(), snap.operation_time);
        self.values.insert(R::TestTime.address(), snap.test_time);
        self.values.insert(R::RtcYear.address(), snap.rtc_year);
        self.values.insert(R::RtcMonth.address(), snap.rtc_month);
        self.values.insert(R::RtcDay.address(), snap.rtc_day);
        self.values.insert(R::RtcHour.address(), snap.rtc_hour);
        self.values.insert(R::RtcMinute.address(), snap.rtc_minute);
        self.values
            .insert(R::AutoTestInterval.address(), snap.auto_test_interval);
        self.values
            .insert(R::AutoTestHour.address(), snap.auto_test_hour);
        self.values
            .insert(R::AutoTestMinute.address(), snap.auto_test_minute);
        self.values
            .insert(R::AutoTestEnable.address(), snap.auto_test_enabled as u16);
        self.values
            .insert(R::ActiveAlarms.address(), snap.alarm_bits);
        for &(zone, alarm) in &snap.zone_alarms {
            self.values
                .insert(R::ZoneAlarm(zone).address(), alarm as u16);
        }
        for slot in 0..HISTORY_SLOTS {
            let code = snap.history_codes.get(slot as usize).copied().unwrap_or(0);
            self.values.insert(HISTORY_BASE + slot, code);
        }
    }
}

/// BACnet object mirror, grouped by object kind as the BMS reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BacnetMirror {
    values: BTreeMap<BacnetKind, BTreeMap<u16, u16>>,
}

impl BacnetMirror {
    /// Mirrored value; unmapped or never-written objects read zero.
    pub fn read(&self, kind: BacnetKind, instance: u16) -> u16 {
        self.values
            .get(&kind)
            .and_then(|group| group.get(&instance))
            .copied()
            .unwrap_or(0)
    }

    /// Raw value store (commands also land here after dispatch).
    pub fn store(&mut self, kind: BacnetKind, instance: u16, value: u16) {
        self.values.entry(kind).or_default().insert(instance, value);
    }

    /// Release a removed zone's binary input.
    pub fn release_zone(&mut self, zone: u8) {
        if let Some(group) = self.values.get_mut(&BacnetKind::BinaryInput) {
            group.remove(&(zone as u16));
        }
    }

    fn set(&mut self, obj: BacnetObject, value: u16) {
        let (kind, instance) = obj.id();
        self.store(kind, instance, value);
    }

    /// Recompute every state-mapped object from the snapshot.
    ///
    /// Momentary command objects (BO1, BO2) keep their last raw value.
    pub fn sync(&mut self, snap: &MirrorSnapshot) {
        use BacnetObject as O;
        self.set(O::ActiveAlarms, snap.alarm_bits);
        self.set(O::HardwareType, snap.hardware_type);
        self.set(O::SlaveId, snap.slave_id);
        self.set(O::RtcYear, snap.rtc_year);
        self.set(O::RtcMonth, snap.rtc_month);
        self.set(O::RtcDay, snap.rtc_day);
        self.set(O::RtcWeekday, snap.rtc_weekday);
        self.set(O::CommTimeout, snap.comm_timeout);
        self.set(O::OperationTime, snap.operation_time);
        self.set(O::TestTime, snap.test_time);
        self.set(O::CommTimeoutEnable, snap.comm_timeout_enabled as u16);
        self.set(O::InvertPosition, snap.invert_position as u16);
        for &(zone, alarm) in &snap.zone_alarms {
            self.set(O::ZoneAlarm(zone), alarm as u16);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> MirrorSnapshot {
        MirrorSnapshot {
            hardware_type: 1,
            slave_id: 7,
            comm_timeout_enabled: true,
            comm_timeout: 120,
            operation_time: 90,
            test_time: 120,
            rtc_year: 2025,
            rtc_month: 9,
            rtc_day: 10,
            rtc_hour: 11,
            rtc_minute: 20,
            rtc_weekday: 3,
            auto_test_interval: 24,
            auto_test_hour: 0,
            auto_test_minute: 0,
            auto_test_enabled: false,
            invert_position: true,
            detector_contact: 0,
            alarm_bits: (1 << 2) | (1 << 3),
            zone_alarms: vec![(1, true), (2, false)],
            history_codes: vec![40, 30],
        }
    }

    #[test]
    fn modbus_addresses_round_trip() {
        for reg in [
            ModbusRegister::StartTest,
            ModbusRegister::ClearHistory,
            ModbusRegister::HardwareType,
            ModbusRegister::AutoTestEnable,
            ModbusRegister::ActiveAlarms,
            ModbusRegister::ZoneAlarm(2),
            ModbusRegister::HistorySlot(19),
        ] {
            assert_eq!(ModbusRegister::from_address(reg.address(), 4), Some(reg));
        }
    }

    #[test]
    fn unmapped_modbus_addresses_resolve_to_none() {
        for address in [0, 100, 106, 299, 315, 400, 521, 9999] {
            assert_eq!(ModbusRegister::from_address(address, 4), None);
        }
        // Zone registers past the supervised count are unmapped.
        assert_eq!(ModbusRegister::from_address(404, 2), None);
        assert_eq!(
            ModbusRegister::from_address(404, 4),
            Some(ModbusRegister::ZoneAlarm(3))
        );
    }

    #[test]
    fn bacnet_ids_round_trip() {
        for obj in [
            BacnetObject::ActiveAlarms,
            BacnetObject::RtcWeekday,
            BacnetObject::CommTimeout,
            BacnetObject::TestTime,
            BacnetObject::ZoneAlarm(1),
            BacnetObject::InvertPosition,
        ] {
            let (kind, instance) = obj.id();
            assert_eq!(BacnetObject::from_id(kind, instance, 2), Some(obj));
        }
    }

    #[test]
    fn unmapped_bacnet_ids_resolve_to_none() {
        assert_eq!(BacnetObject::from_id(BacnetKind::AnalogInput, 8, 2), None);
        assert_eq!(BacnetObject::from_id(BacnetKind::BinaryInput, 3, 2), None);
        assert_eq!(BacnetObject::from_id(BacnetKind::BinaryOutput, 4, 2), None);
    }

    #[test]
    fn unwritten_reads_default_to_zero() {
        let modbus = ModbusMirror::default();
        assert_eq!(modbus.read(9999), 0);
        assert_eq!(modbus.read(101), 0);
        let bacnet = BacnetMirror::default();
        assert_eq!(bacnet.read(BacnetKind::AnalogInput, 1), 0);
    }

    #[test]
    fn modbus_sync_fills_mapped_registers() {
        let mut mirror = ModbusMirror::default();
        mirror.sync(&snapshot());
        assert_eq!(mirror.read(300), 1);
        assert_eq!(mirror.read(301), 7);
        assert_eq!(mirror.read(303), 120);
        assert_eq!(mirror.read(306), 2025);
        assert_eq!(mirror.read(103), 1);
        assert_eq!(mirror.read(401), (1 << 2) | (1 << 3));
        assert_eq!(mirror.read(402), 1);
        assert_eq!(mirror.read(403), 0);
        assert_eq!(mirror.read(501), 40);
        assert_eq!(mirror.read(502), 30);
        assert_eq!(mirror.read(503), 0);
        assert_eq!(mirror.read(520), 0);
    }

    #[test]
    fn modbus_sync_preserves_momentary_slots() {
        let mut mirror = ModbusMirror::default();
        mirror.store(101, 1);
        mirror.sync(&snapshot());
        assert_eq!(mirror.read(101), 1);
    }

    #[test]
    fn bacnet_sync_fills_mapped_objects() {
        let mut mirror = BacnetMirror::default();
        mirror.sync(&snapshot());
        assert_eq!(mirror.read(BacnetKind::AnalogInput, 1), (1 << 2) | (1 << 3));
        assert_eq!(mirror.read(BacnetKind::AnalogInput, 7), 3);
        assert_eq!(mirror.read(BacnetKind::AnalogValue, 1), 90);
        assert_eq!(mirror.read(BacnetKind::BinaryInput, 1), 1);
        assert_eq!(mirror.read(BacnetKind::BinaryInput, 2), 0);
        assert_eq!(mirror.read(BacnetKind::BinaryOutput, 3), 1);
    }

    #[test]
    fn zone_release_clears_slots() {
        let mut modbus = ModbusMirror::default();
        let mut bacnet = BacnetMirror::default();
        modbus.sync(&snapshot());
        bacnet.sync(&snapshot());
        modbus.release_zone(1);
        bacnet.release_zone(1);
        assert_eq!(modbus.read(402), 0);
        assert_eq!(bacnet.read(BacnetKind::BinaryInput, 1), 0);
    }
}
