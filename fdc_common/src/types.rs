//! State enums for the damper controller.
//!
//! All enums use `#[repr(u8)]` (alarm kinds `#[repr(u16)]`, their register
//! history codes) for compact layout and lossless register transport.
//! Serde renames match the wire/document spellings of the device
//! (`"fire"`, `"NO"`, `"CLOSED"`, `"FDC-2KJ"`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─── Damper & Mode ──────────────────────────────────────────────────

/// Commanded blade position of a zone damper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DamperPosition {
    /// Blades closed, airflow blocked.
    Closed = 0,
    /// Blades open, airflow allowed.
    Open = 1,
}

impl DamperPosition {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Closed),
            1 => Some(Self::Open),
            _ => None,
        }
    }

    /// The opposite position.
    #[inline]
    pub const fn inverted(self) -> Self {
        match self {
            Self::Closed => Self::Open,
            Self::Open => Self::Closed,
        }
    }
}

impl Default for DamperPosition {
    fn default() -> Self {
        Self::Closed
    }
}

impl fmt::Display for DamperPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
        }
    }
}

/// Operating mode of the controller.
///
/// Determines the non-alarm resting position: `Fire` holds dampers open and
/// closes them on alarm, `Smoke` is the inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum OperatingMode {
    Fire = 0,
    Smoke = 1,
}

impl Default for OperatingMode {
    fn default() -> Self {
        Self::Fire
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fire => write!(f, "fire"),
            Self::Smoke => write!(f, "smoke"),
        }
    }
}

// ─── Alarms ─────────────────────────────────────────────────────────

/// Alarm source kind.
///
/// The discriminant is the rolling-history code exposed in registers
/// 501-520. `Position` and `Comm` are raised by hardware paths the
/// simulation does not model but remain addressable in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum AlarmKind {
    /// Damper failed to reach its commanded position.
    Position = 11,
    /// Communication timeout with the BMS.
    Comm = 12,
    /// Thermal sensor trip.
    Thermal = 20,
    /// External (dry-contact) alarm input.
    External = 30,
    /// Smoke detector trip.
    Smoke = 40,
    /// Full test exceeded its time budget.
    TestFailure = 50,
}

impl AlarmKind {
    /// History code stored in the register mirror.
    #[inline]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Convert from a history code. Returns `None` for unknown codes.
    #[inline]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            11 => Some(Self::Position),
            12 => Some(Self::Comm),
            20 => Some(Self::Thermal),
            30 => Some(Self::External),
            40 => Some(Self::Smoke),
            50 => Some(Self::TestFailure),
            _ => None,
        }
    }
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position => write!(f, "Position"),
            Self::Comm => write!(f, "Comm"),
            Self::Thermal => write!(f, "Thermal"),
            Self::External => write!(f, "External"),
            Self::Smoke => write!(f, "Smoke"),
            Self::TestFailure => write!(f, "Test failure"),
        }
    }
}

/// Smoke detector contact wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DetectorContact {
    /// Normally open contact.
    #[serde(rename = "NO")]
    NormallyOpen = 0,
    /// Normally closed contact.
    #[serde(rename = "NC")]
    NormallyClosed = 1,
}

impl DetectorContact {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::NormallyOpen),
            1 => Some(Self::NormallyClosed),
            _ => None,
        }
    }
}

impl Default for DetectorContact {
    fn default() -> Self {
        Self::NormallyOpen
    }
}

impl fmt::Display for DetectorContact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NormallyOpen => write!(f, "NO"),
            Self::NormallyClosed => write!(f, "NC"),
        }
    }
}

impl FromStr for DetectorContact {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NO" => Ok(Self::NormallyOpen),
            "NC" => Ok(Self::NormallyClosed),
            _ => Err(()),
        }
    }
}

// ─── Outputs ────────────────────────────────────────────────────────

/// Relay output wiring mode (DIP-selected on the hardware).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum RelayMode {
    /// Relay signals the aggregate alarm condition.
    Alarm = 0,
    /// Relay drives a fan interlock; polarity is configurable.
    Fan = 1,
}

impl Default for RelayMode {
    fn default() -> Self {
        Self::Alarm
    }
}

/// Relay contact state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum RelayState {
    Open = 0,
    Closed = 1,
}

impl Default for RelayState {
    fn default() -> Self {
        Self::Open
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Front-panel LED state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum LedState {
    Off = 0,
    On = 1,
    Flash = 2,
}

impl Default for LedState {
    fn default() -> Self {
        Self::Off
    }
}

impl fmt::Display for LedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "OFF"),
            Self::On => write!(f, "ON"),
            Self::Flash => write!(f, "FLASH"),
        }
    }
}

/// Status-LED derivation profile.
///
/// The two deployed front ends disagree on when the status LED flashes;
/// both presentations are selectable per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum LedPolicy {
    /// `FLASH` during a test, `ON` when powered, else `OFF`.
    PowerTest = 0,
    /// `FLASH` during a test or while any alarm is active, else `OFF`.
    AlarmFlash = 1,
}

impl Default for LedPolicy {
    fn default() -> Self {
        Self::PowerTest
    }
}

/// Outcome of a full damper test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum TestStatus {
    Passed = 0,
    Failed = 1,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "PASSED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

// ─── Device Variant ─────────────────────────────────────────────────

/// Device model variant.
///
/// The discriminant is the hardware type code reported in register 300 /
/// BACnet AI2. The middle digit is the supervised zone count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ModelType {
    #[serde(rename = "FDC-2KJ")]
    Fdc2Kj = 1,
    #[serde(rename = "FDC-2JJ")]
    Fdc2Jj = 2,
    #[serde(rename = "FDC-2KK")]
    Fdc2Kk = 3,
    #[serde(rename = "FDC-4KJ")]
    Fdc4Kj = 4,
    #[serde(rename = "FDC-4JJ")]
    Fdc4Jj = 5,
    #[serde(rename = "FDC-4KK")]
    Fdc4Kk = 6,
}

impl ModelType {
    /// Hardware type code exposed on the register mirrors.
    #[inline]
    pub const fn hardware_code(self) -> u16 {
        self as u16
    }

    /// Number of zones the variant supervises out of the box.
    #[inline]
    pub const fn zone_count(self) -> u8 {
        match self {
            Self::Fdc2Kj | Self::Fdc2Jj | Self::Fdc2Kk => 2,
            Self::Fdc4Kj | Self::Fdc4Jj | Self::Fdc4Kk => 4,
        }
    }
}

impl Default for ModelType {
    fn default() -> Self {
        Self::Fdc2Kj
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fdc2Kj => write!(f, "FDC-2KJ"),
            Self::Fdc2Jj => write!(f, "FDC-2JJ"),
            Self::Fdc2Kk => write!(f, "FDC-2KK"),
            Self::Fdc4Kj => write!(f, "FDC-4KJ"),
            Self::Fdc4Jj => write!(f, "FDC-4JJ"),
            Self::Fdc4Kk => write!(f, "FDC-4KK"),
        }
    }
}

impl FromStr for ModelType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FDC-2KJ" => Ok(Self::Fdc2Kj),
            "FDC-2JJ" => Ok(Self::Fdc2Jj),
            "FDC-2KK" => Ok(Self::Fdc2Kk),
            "FDC-4KJ" => Ok(Self::Fdc4Kj),
            "FDC-4JJ" => Ok(Self::Fdc4Jj),
            "FDC-4KK" => Ok(Self::Fdc4Kk),
            _ => Err(()),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
