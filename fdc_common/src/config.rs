//! TOML configuration loader with validation.
//!
//! Loads [`ControllerConfig`] from a TOML file. The configuration carries
//! the deployment-profile choices that unify the two historical front
//! ends: external-alarm scoping, status-LED policy and zone-log depth.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DEFAULT_ZONE_LOG_CAP, MAX_SLAVE_ID, MAX_ZONES};
use crate::types::{LedPolicy, ModelType, OperatingMode, RelayMode};

/// Configuration loading/validation error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("config I/O error: {0}")]
    Io(String),
    /// TOML parse error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Parameter validation error.
    #[error("config validation: {0}")]
    Validation(String),
}

/// Controller deployment configuration.
///
/// Every field has a default so an absent file or empty document yields a
/// working two-zone fire-mode controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Device model variant; fixes the hardware type code.
    pub model: ModelType,
    /// Operating mode (damper resting position).
    pub mode: OperatingMode,
    /// Zone count override. `None` takes the model's native count.
    pub zones: Option<u8>,
    /// `true`: a single device-wide external-alarm flag (line-command
    /// variant). `false`: one external flag per zone (display variant).
    pub external_alarm_is_global: bool,
    /// Status-LED derivation profile.
    pub led_policy: LedPolicy,
    /// Per-zone log depth.
    pub zone_log_cap: usize,
    /// Modbus/BACnet slave ID (DIP bank 1).
    pub slave_id: u8,
    /// Relay output mode (DIP 6).
    pub relay_mode: RelayMode,
    /// Invert relay polarity in `Fan` mode (DIP 7).
    pub relay_invert: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            model: ModelType::default(),
            mode: OperatingMode::default(),
            zones: None,
            external_alarm_is_global: true,
            led_policy: LedPolicy::default(),
            zone_log_cap: DEFAULT_ZONE_LOG_CAP,
            slave_id: 0,
            relay_mode: RelayMode::default(),
            relay_invert: false,
        }
    }
}

impl ControllerConfig {
    /// Effective zone count: the override, or the model's native count.
    pub fn zone_count(&self) -> u8 {
        self.zones.unwrap_or_else(|| self.model.zone_count())
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(zones) = self.zones {
            if zones == 0 || zones > MAX_ZONES {
                return Err(format!("zones {zones} out of range [1, {MAX_ZONES}]"));
            }
        }
        if self.slave_id > MAX_SLAVE_ID {
            return Err(format!(
                "slave_id {} out of range [0, {MAX_SLAVE_ID}]",
                self.slave_id
            ));
        }
        if self.zone_log_cap == 0 {
            return Err("zone_log_cap must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Load and validate the controller configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ControllerConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("failed to read {}: {e}", path.display())))?;
    load_config_from_str(&raw)
}

/// Load config from a TOML string (for testing).
pub fn load_config_from_str(raw: &str) -> Result<ControllerConfig, ConfigError> {
    let config: ControllerConfig =
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate().map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.zone_count(), 2);
        assert!(config.external_alarm_is_global);
        assert_eq!(config.led_policy, LedPolicy::PowerTest);
        assert_eq!(config.zone_log_cap, DEFAULT_ZONE_LOG_CAP);
    }

    #[test]
    fn display_profile_parses() {
        let config = load_config_from_str(
            r#"
model = "FDC-4KJ"
mode = "smoke"
external_alarm_is_global = false
led_policy = "alarm-flash"
zone_log_cap = 50
"#,
        )
        .unwrap();
        assert_eq!(config.model, ModelType::Fdc4Kj);
        assert_eq!(config.mode, OperatingMode::Smoke);
        assert_eq!(config.zone_count(), 4);
        assert!(!config.external_alarm_is_global);
        assert_eq!(config.led_policy, LedPolicy::AlarmFlash);
        assert_eq!(config.zone_log_cap, 50);
    }

    #[test]
    fn zone_override_wins_over_model() {
        let config = load_config_from_str("zones = 3").unwrap();
        assert_eq!(config.zone_count(), 3);
    }

    #[test]
    fn reject_zone_count_out_of_range() {
        let err = load_config_from_str("zones = 0").unwrap_err();
        assert!(err.to_string().contains("out of range"), "got: {err}");
        let err = load_config_from_str("zones = 17").unwrap_err();
        assert!(err.to_string().contains("out of range"), "got: {err}");
    }

    #[test]
    fn reject_slave_id_out_of_range() {
        let err = load_config_from_str("slave_id = 128").unwrap_err();
        assert!(err.to_string().contains("slave_id"), "got: {err}");
    }

    #[test]
    fn reject_zero_log_cap() {
        let err = load_config_from_str("zone_log_cap = 0").unwrap_err();
        assert!(err.to_string().contains("zone_log_cap"), "got: {err}");
    }

    #[test]
    fn reject_unknown_field() {
        assert!(load_config_from_str("zonnes = 2").is_err());
    }

    #[test]
    fn reject_malformed_toml() {
        assert!(load_config_from_str("this is not valid toml @@@@").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model = \"FDC-2KK\"\nrelay_mode = \"FAN\"").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.model, ModelType::Fdc2Kk);
        assert_eq!(config.relay_mode, RelayMode::Fan);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/fdc.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
