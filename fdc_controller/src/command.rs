//! Command vocabulary of the line-oriented front end.
//!
//! The REPL loop itself lives in the `fdc_sim` binary; this module owns the
//! closed [`Command`] enum, the parser at the outermost text boundary and
//! the executor mapping each command onto a controller operation. Unknown
//! or malformed commands surface as [`CommandParseError`] — informational
//! output, never fatal.

use std::path::PathBuf;

use thiserror::Error;

use fdc_common::types::{AlarmKind, DetectorContact};

use crate::controller::Controller;

/// Every action the line front end can request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PowerOn,
    PowerOff,
    TriggerSmoke { zone: u8 },
    TriggerThermal { zone: u8 },
    TriggerExternal,
    ResetAlarms { zone: Option<u8> },
    ResetSmoke,
    PerformTest,
    SetInvert { invert: bool },
    SetDetectorType { contact: DetectorContact },
    ModbusWrite { register: u16, value: u16 },
    ModbusRead { register: u16 },
    SimulateTime { seconds: i64 },
    ResetDefaults,
    Status,
    EnableAutoTest { interval_hours: u32, hour: u8, minute: u8 },
    SetTemp { zone: Option<u8>, value: f64 },
    GetLogs { zone: u8 },
    SaveState { path: PathBuf },
    LoadState { path: PathBuf },
    Exit,
}

/// Parse failure at the text boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandParseError {
    #[error("Unknown command: {0}")]
    Unknown(String),
    #[error("empty command")]
    Empty,
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result of executing one command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Printable output; the loop continues.
    Continue(String),
    /// The front end should save state and terminate.
    Exit,
}

fn arg<'a>(parts: &[&'a str], index: usize, usage: &'static str) -> Result<&'a str, CommandParseError> {
    parts.get(index).copied().ok_or(CommandParseError::Usage(usage))
}

fn parse_num<T: std::str::FromStr>(raw: &str) -> Result<T, CommandParseError> {
    raw.parse()
        .map_err(|_| CommandParseError::InvalidArgument(raw.to_string()))
}

/// Parse one input line into a [`Command`].
pub fn parse(line: &str) -> Result<Command, CommandParseError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(&action) = parts.first() else {
        return Err(CommandParseError::Empty);
    };

    let command = match action {
        "power_on" => Command::PowerOn,
        "power_off" => Command::PowerOff,
        "trigger_smoke" => Command::TriggerSmoke {
            zone: parse_num(arg(&parts, 1, "trigger_smoke <zone>")?)?,
        },
        "trigger_thermal" => Command::TriggerThermal {
            zone: parse_num(arg(&parts, 1, "trigger_thermal <zone>")?)?,
        },
        "trigger_external" => Command::TriggerExternal,
        "reset_alarms" => Command::ResetAlarms {
            zone: parts.get(1).map(|raw| parse_num(raw)).transpose()?,
        },
        "reset_smoke" => Command::ResetSmoke,
        "perform_test" => Command::PerformTest,
        "set_invert" => Command::SetInvert {
            invert: parse_num::<u8>(arg(&parts, 1, "set_invert <0|1>")?)? != 0,
        },
        "set_detector_type" => {
            let raw = arg(&parts, 1, "set_detector_type <NO|NC>")?;
            Command::SetDetectorType {
                contact: raw
                    .parse::<DetectorContact>()
                    .map_err(|_| CommandParseError::InvalidArgument(raw.to_string()))?,
            }
        }
        "modbus_write" => Command::ModbusWrite {
            register: parse_num(arg(&parts, 1, "modbus_write <reg> <value>")?)?,
            value: parse_num(arg(&parts, 2, "modbus_write <reg> <value>")?)?,
        },
        "modbus_read" => Command::ModbusRead {
            register: parse_num(arg(&parts, 1, "modbus_read <reg>")?)?,
        },
        "simulate_time" => Command::SimulateTime {
            seconds: parse_num(arg(&parts, 1, "simulate_time <seconds>")?)?,
        },
        "reset_defaults" => Command::ResetDefaults,
        "status" => Command::Status,
        "enable_auto_test" => Command::EnableAutoTest {
            interval_hours: parse_num(arg(&parts, 1, "enable_auto_test <interval> <hour> <minute>")?)?,
            hour: parse_num(arg(&parts, 2, "enable_auto_test <interval> <hour> <minute>")?)?,
            minute: parse_num(arg(&parts, 3, "enable_auto_test <interval> <hour> <minute>")?)?,
        },
        "set_temp" => match parts.len() {
            // `set_temp <value>` targets zone 1.
            2 => Command::SetTemp {
                zone: None,
                value: parse_num(parts[1])?,
            },
            3 => Command::SetTemp {
                zone: Some(parse_num(parts[1])?),
                value: parse_num(parts[2])?,
            },
            _ => return Err(CommandParseError::Usage("set_temp [zone] <value>")),
        },
        "get_logs" => Command::GetLogs {
            zone: parse_num(arg(&parts, 1, "get_logs <zone>")?)?,
        },
        "save_state" => Command::SaveState {
            path: PathBuf::from(arg(&parts, 1, "save_state <path>")?),
        },
        "load_state" => Command::LoadState {
            path: PathBuf::from(arg(&parts, 1, "load_state <path>")?),
        },
        "exit" => Command::Exit,
        other => return Err(CommandParseError::Unknown(other.to_string())),
    };
    Ok(command)
}

/// Execute a parsed command against the controller.
pub fn execute(controller: &mut Controller, command: Command) -> CommandOutcome {
    let output = match command {
        Command::PowerOn => {
            controller.power_on();
            "Controller powered on.".to_string()
        }
        Command::PowerOff => {
            controller.power_off();
            "Controller powered off.".to_string()
        }
        Command::TriggerSmoke { zone } => {
            controller.trigger_alarm(AlarmKind::Smoke, zone);
            format!("Smoke alarm triggered in zone {zone}.")
        }
        Command::TriggerThermal { zone } => {
            controller.trigger_alarm(AlarmKind::Thermal, zone);
            format!("Thermal alarm triggered in zone {zone}.")
        }
        Command::TriggerExternal => {
            controller.trigger_alarm(AlarmKind::External, 1);
            "External alarm triggered.".to_string()
        }
        Command::ResetAlarms { zone } => {
            controller.reset_alarms(zone);
            "Alarms reset.".to_string()
        }
        Command::ResetSmoke => {
            controller.reset_smoke_detector();
            "Smoke detectors reset.".to_string()
        }
        Command::PerformTest => {
            let status = controller.perform_full_test();
            format!("Test {status}.")
        }
        Command::SetInvert { invert } => {
            controller.set_invert_position(invert);
            format!("Invert position set to {invert}")
        }
        Command::SetDetectorType { contact } => {
            controller.set_detector_contact(contact);
            format!("Smoke detector type set to {contact}")
        }
        Command::ModbusWrite { register, value } => {
            controller.modbus_write(register, value);
            format!("Modbus register {register} written with {value}.")
        }
        Command::ModbusRead { register } => {
            format!("Modbus register {register}: {}", controller.modbus_read(register))
        }
        Command::SimulateTime { seconds } => {
            controller.simulate_time(seconds);
            format!(
                "Time advanced by {seconds} seconds. Current RTC: {}",
                controller.clock().stamp()
            )
        }
        Command::ResetDefaults => {
            controller.reset_defaults();
            "Reset to defaults.".to_string()
        }
        Command::Status => serde_json::to_string_pretty(&controller.get_status())
            .unwrap_or_else(|e| format!("status unavailable: {e}")),
        Command::EnableAutoTest {
            interval_hours,
            hour,
            minute,
        } => {
            controller.set_auto_test_params(true, interval_hours, hour, minute);
            let next = controller
                .auto_test()
                .next_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            format!("Auto-test enabled: {interval_hours}h at {hour}:{minute:02}, next at {next}")
        }
        Command::SetTemp { zone, value } => {
            let zone = zone.unwrap_or(1);
            controller.set_temperature(zone, value);
            format!("Temperature set to {value}°C in zone {zone}")
        }
        Command::GetLogs { zone } => {
            let lines: Vec<String> = controller
                .get_logs(zone)
                .iter()
                .map(|entry| entry.to_string())
                .collect();
            serde_json::to_string_pretty(&lines)
                .unwrap_or_else(|e| format!("logs unavailable: {e}"))
        }
        Command::SaveState { path } => match controller.save_state(&path) {
            Ok(()) => format!("State saved to {}", path.display()),
            Err(e) => format!("State save failed: {e}"),
        },
        Command::LoadState { path } => match controller.load_state(&path) {
            Ok(()) => format!("State loaded from {}", path.display()),
            Err(e) => format!("State load failed: {e}"),
        },
        Command::Exit => return CommandOutcome::Exit,
    };
    CommandOutcome::Continue(output)
}
