use crate::shared::paths::{get_settings_path, get_storage_dir};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Seconds between reminder sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// How far (either side) a reminder may be from "now" and still be caught by a sweep.
    #[serde(default = "default_reminder_tolerance_secs")]
    pub reminder_tolerance_secs: u64,
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,
    #[serde(default = "default_reminder_toast_duration_ms")]
    pub reminder_toast_duration_ms: u64,
    /// Overrides where task data is stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Upper bound for the sweep interval and the reminder tolerance: one day.
pub const MAX_PERIOD_SECS: u64 = 24 * 60 * 60;

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_reminder_tolerance_secs() -> u64 {
    60
}

fn default_toast_duration_ms() -> u64 {
    5000
}

fn default_reminder_toast_duration_ms() -> u64 {
    10000
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            reminder_tolerance_secs: default_reminder_tolerance_secs(),
            toast_duration_ms: default_toast_duration_ms(),
            reminder_toast_duration_ms: default_reminder_toast_duration_ms(),
            data_dir: None,
        }
    }
}

impl AppSettings {
    /// Clamped to `1..=MAX_PERIOD_SECS`; tokio's interval panics on zero and on
    /// periods that overflow an `Instant`.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.clamp(1, MAX_PERIOD_SECS))
    }

    /// Clamped to `MAX_PERIOD_SECS`.
    pub fn reminder_tolerance(&self) -> chrono::Duration {
        let secs = self.reminder_tolerance_secs.min(MAX_PERIOD_SECS);
        chrono::Duration::try_seconds(secs as i64)
            .unwrap_or_else(|| chrono::Duration::seconds(default_reminder_tolerance_secs() as i64))
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn reminder_toast_duration(&self) -> Duration {
        Duration::from_millis(self.reminder_toast_duration_ms)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(get_storage_dir)
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Loads settings from the default location, falling back to defaults.
pub fn load_settings() -> AppSettings {
    load_settings_from(&get_settings_path())
}

pub fn load_settings_from(path: &Path) -> AppSettings {
    if !path.exists() {
        return AppSettings::default();
    }

    match load_settings_from_file(path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(target: "system", "Using default settings: {}", e);
            AppSettings::default()
        }
    }
}

fn load_settings_from_file(path: &Path) -> Result<AppSettings, SettingsError> {
    let contents = std::fs::read_to_string(path)?;
    let settings = serde_json::from_str(&contents)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&tmp.path().join("settings.json"));
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.sweep_interval(), Duration::from_secs(60));
        assert_eq!(settings.reminder_tolerance(), chrono::Duration::minutes(1));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, r#"{"sweepIntervalSecs": 30}"#).unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.sweep_interval_secs, 30);
        assert_eq!(settings.toast_duration_ms, 5000);
        assert_eq!(settings.reminder_toast_duration_ms, 10000);
        assert!(settings.data_dir.is_none());
    }

    #[test]
    fn test_corrupt_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        assert_eq!(load_settings_from(&path), AppSettings::default());
    }

    #[test]
    fn test_data_dir_override() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        let data = tmp.path().join("data");
        let settings = AppSettings {
            data_dir: Some(data.clone()),
            ..AppSettings::default()
        };
        std::fs::write(&path, serde_json::to_string(&settings).unwrap()).unwrap();

        let loaded = load_settings_from(&path);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.data_dir(), data);
    }

    #[test]
    fn test_zero_sweep_interval_is_clamped() {
        let settings = AppSettings {
            sweep_interval_secs: 0,
            ..AppSettings::default()
        };
        assert_eq!(settings.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_huge_tolerance_is_clamped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, r#"{"reminderToleranceSecs": 18446744073709551615}"#).unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.reminder_tolerance_secs, u64::MAX);
        assert_eq!(
            settings.reminder_tolerance(),
            chrono::Duration::seconds(MAX_PERIOD_SECS as i64)
        );
    }

    #[test]
    fn test_huge_sweep_interval_is_clamped() {
        let settings = AppSettings {
            sweep_interval_secs: u64::MAX,
            ..AppSettings::default()
        };
        assert_eq!(settings.sweep_interval(), Duration::from_secs(MAX_PERIOD_SECS));
    }
}
