//! Runtime configuration for the monitor.
//!
//! Loaded from a TOML file; every field has a default matching the stock
//! Raspberry Pi + miniPiTFT install, so a missing file is not an error.

use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{MonitorError, Result};
use crate::phases::PHASE_COUNT;

const DEFAULT_CONFIG_RELATIVE_PATH: &str = ".config/trainer-monitor/monitor.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub trash: TrashConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub buttons: ButtonsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub power: PowerConfig,
    #[serde(default)]
    pub markers: MarkersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_logs_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_primary_pattern")]
    pub primary_pattern: String,
    #[serde(default = "default_secondary_pattern")]
    pub secondary_pattern: String,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            dir: default_logs_dir(),
            primary_pattern: default_primary_pattern(),
            secondary_pattern: default_secondary_pattern(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrashConfig {
    #[serde(default = "default_trash_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_trash_pattern")]
    pub pattern: String,
    #[serde(default = "default_trash_retain")]
    pub retain: usize,
}

impl TrashConfig {
    pub fn files_dir(&self) -> PathBuf {
        self.dir.join("files")
    }

    pub fn info_dir(&self) -> PathBuf {
        self.dir.join("info")
    }
}

impl Default for TrashConfig {
    fn default() -> Self {
        Self {
            dir: default_trash_dir(),
            pattern: default_trash_pattern(),
            retain: default_trash_retain(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Cadence while waiting for the first log file to appear.
    #[serde(default = "default_log_wait_ms")]
    pub log_wait_ms: u64,
    /// Cadence while phases are still advancing.
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
    /// Pause after each render so a human can read the change.
    #[serde(default = "default_render_dwell_ms")]
    pub render_dwell_ms: u64,
    /// Cadence once the last phase has been reached.
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,
}

impl TimingConfig {
    pub fn log_wait(&self) -> Duration {
        Duration::from_millis(self.log_wait_ms)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn render_dwell(&self) -> Duration {
        Duration::from_millis(self.render_dwell_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            log_wait_ms: default_log_wait_ms(),
            poll_ms: default_poll_ms(),
            render_dwell_ms: default_render_dwell_ms(),
            idle_poll_ms: default_idle_poll_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonsConfig {
    #[serde(default = "default_gpio_chip")]
    pub chip: PathBuf,
    #[serde(default = "default_lower_pin")]
    pub lower_pin: u32,
    #[serde(default = "default_upper_pin")]
    pub upper_pin: u32,
    /// Buttons pull the line low when pressed (miniPiTFT wiring).
    #[serde(default = "default_true")]
    pub active_low: bool,
    /// Consecutive gesture samples required before shutdown is latched.
    #[serde(default = "default_confirm_samples")]
    pub confirm_samples: u32,
}

impl Default for ButtonsConfig {
    fn default() -> Self {
        Self {
            chip: default_gpio_chip(),
            lower_pin: default_lower_pin(),
            upper_pin: default_upper_pin(),
            active_low: true,
            confirm_samples: default_confirm_samples(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_spi_device")]
    pub spi_device: PathBuf,
    #[serde(default = "default_dc_pin")]
    pub dc_pin: u32,
    #[serde(default = "default_backlight_pin")]
    pub backlight_pin: u32,
    #[serde(default = "default_panel_size")]
    pub width: u16,
    #[serde(default = "default_panel_size")]
    pub height: u16,
    #[serde(default)]
    pub offset_x: u16,
    #[serde(default = "default_offset_y")]
    pub offset_y: u16,
    #[serde(default = "default_spi_hz")]
    pub spi_hz: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            spi_device: default_spi_device(),
            dc_pin: default_dc_pin(),
            backlight_pin: default_backlight_pin(),
            width: default_panel_size(),
            height: default_panel_size(),
            offset_x: 0,
            offset_y: default_offset_y(),
            spi_hz: default_spi_hz(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerConfig {
    #[serde(default = "default_power_command")]
    pub command: Vec<String>,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            command: default_power_command(),
        }
    }
}

/// Overrides for the nine phase markers, in phase order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkersConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<String>>,
}

impl MonitorConfig {
    /// Rejects values that would stall or spin the poll loop.
    pub fn validate(&self) -> Result<()> {
        let timing = &self.timing;
        for (name, value) in [
            ("timing.log_wait_ms", timing.log_wait_ms),
            ("timing.poll_ms", timing.poll_ms),
            ("timing.idle_poll_ms", timing.idle_poll_ms),
        ] {
            if value == 0 {
                return Err(MonitorError::ConfigInvalid(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        if self.buttons.confirm_samples == 0 {
            return Err(MonitorError::ConfigInvalid(
                "buttons.confirm_samples must be at least 1".to_string(),
            ));
        }

        if self.buttons.lower_pin == self.buttons.upper_pin {
            return Err(MonitorError::ConfigInvalid(format!(
                "buttons.lower_pin and buttons.upper_pin are both {}",
                self.buttons.lower_pin
            )));
        }

        if self.power.command.is_empty() {
            return Err(MonitorError::ConfigInvalid(
                "power.command must not be empty".to_string(),
            ));
        }

        if let Some(list) = &self.markers.list {
            if list.len() != PHASE_COUNT {
                return Err(MonitorError::ConfigInvalid(format!(
                    "markers.list must contain {} entries, found {}",
                    PHASE_COUNT,
                    list.len()
                )));
            }
            if let Some(index) = list.iter().position(|marker| marker.is_empty()) {
                return Err(MonitorError::ConfigInvalid(format!(
                    "markers.list[{}] must not be empty",
                    index
                )));
            }
        }

        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_RELATIVE_PATH))
}

/// Loads the configuration, returning defaults if the file doesn't exist.
pub fn load_config(path: Option<&Path>) -> Result<MonitorConfig> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => return Ok(MonitorConfig::default()),
        },
    };

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config file; using defaults");
        return Ok(MonitorConfig::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|source| MonitorError::ConfigRead {
        path: config_path.clone(),
        source,
    })?;
    let config = toml::from_str::<MonitorConfig>(&content).map_err(|err| {
        MonitorError::ConfigMalformed {
            path: config_path.clone(),
            details: err.to_string(),
        }
    })?;
    config.validate()?;
    Ok(config)
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("/home/pi/FortiusANT/pythoncode")
}

fn default_primary_pattern() -> String {
    "FortiusAnt.*.log".to_string()
}

fn default_secondary_pattern() -> String {
    "FortiusAntGUI.*.log".to_string()
}

fn default_trash_dir() -> PathBuf {
    PathBuf::from("/home/pi/.local/share/Trash")
}

fn default_trash_pattern() -> String {
    "*.*".to_string()
}

fn default_trash_retain() -> usize {
    4
}

fn default_log_wait_ms() -> u64 {
    1_000
}

fn default_poll_ms() -> u64 {
    500
}

fn default_render_dwell_ms() -> u64 {
    1_500
}

fn default_idle_poll_ms() -> u64 {
    2_000
}

fn default_gpio_chip() -> PathBuf {
    PathBuf::from("/dev/gpiochip0")
}

fn default_lower_pin() -> u32 {
    23
}

fn default_upper_pin() -> u32 {
    24
}

fn default_true() -> bool {
    true
}

fn default_confirm_samples() -> u32 {
    1
}

fn default_spi_device() -> PathBuf {
    PathBuf::from("/dev/spidev0.0")
}

fn default_dc_pin() -> u32 {
    25
}

fn default_backlight_pin() -> u32 {
    22
}

fn default_panel_size() -> u16 {
    240
}

fn default_offset_y() -> u16 {
    80
}

fn default_spi_hz() -> u32 {
    64_000_000
}

fn default_power_command() -> Vec<String> {
    ["sudo", "-n", "shutdown", "-h", "now"]
        .iter()
        .map(|part| part.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_defaults_when_file_missing() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("missing.toml");
        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.logs.primary_pattern, "FortiusAnt.*.log");
        assert_eq!(config.trash.retain, 4);
        assert_eq!(config.timing.poll_ms, 500);
        assert_eq!(config.timing.idle_poll_ms, 2_000);
        assert_eq!(config.buttons.lower_pin, 23);
        assert_eq!(
            config.power.command,
            vec!["sudo", "-n", "shutdown", "-h", "now"]
        );
    }

    #[test]
    fn load_config_merges_partial_sections() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("monitor.toml");
        fs::write(
            &path,
            r#"
[logs]
dir = "/tmp/fortius"

[timing]
poll_ms = 250
"#,
        )
        .expect("write config");

        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.logs.dir, PathBuf::from("/tmp/fortius"));
        assert_eq!(config.logs.secondary_pattern, "FortiusAntGUI.*.log");
        assert_eq!(config.timing.poll_ms, 250);
        assert_eq!(config.timing.render_dwell_ms, 1_500);
    }

    #[test]
    fn load_config_rejects_malformed_toml() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("monitor.toml");
        fs::write(&path, "[timing\npoll_ms = ").expect("write config");

        let err = load_config(Some(&path)).expect_err("malformed config");
        assert!(matches!(err, MonitorError::ConfigMalformed { .. }));
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let mut config = MonitorConfig::default();
        config.timing.poll_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(MonitorError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn validate_rejects_wrong_marker_count() {
        let mut config = MonitorConfig::default();
        config.markers.list = Some(vec!["only one".to_string()]);
        assert!(matches!(
            config.validate(),
            Err(MonitorError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn trash_subdirectories_hang_off_trash_dir() {
        let trash = TrashConfig {
            dir: PathBuf::from("/srv/Trash"),
            ..TrashConfig::default()
        };
        assert_eq!(trash.files_dir(), PathBuf::from("/srv/Trash/files"));
        assert_eq!(trash.info_dir(), PathBuf::from("/srv/Trash/info"));
    }
}
