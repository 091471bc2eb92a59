use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::core::period::DashboardFilter;

fn default_debounce_ms() -> u64 {
    500
}

fn default_recompute_timeout_ms() -> u64 {
    5_000
}

fn default_leaderboard_size() -> usize {
    5
}

/// Tunables for the background recompute loop.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Quiet window after a change notification before recomputing, so bursts
    /// of updates cost one recomputation.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Upper bound on one recomputation cycle, store reads included.
    #[serde(default = "default_recompute_timeout_ms")]
    pub recompute_timeout_ms: u64,
}

impl SchedulerConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn recompute_timeout(&self) -> Duration {
        Duration::from_millis(self.recompute_timeout_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            debounce_ms: default_debounce_ms(),
            recompute_timeout_ms: default_recompute_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Period and display currency the background publisher starts with.
    #[serde(default)]
    pub default_filter: DashboardFilter,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Rows kept in the vehicle leaderboard.
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            default_filter: DashboardFilter::default(),
            scheduler: SchedulerConfig::default(),
            leaderboard_size: default_leaderboard_size(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "fleetboard")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::period::ReportingPeriod;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
default_filter:
  period:
    specific_month:
      year: 2026
      month: 3
  display_currency: "EUR"
scheduler:
  debounce_ms: 250
leaderboard_size: 10
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(
            config.default_filter.period,
            ReportingPeriod::month(2026, 3)
        );
        assert_eq!(config.default_filter.display_currency, "EUR");
        assert_eq!(config.scheduler.debounce_ms, 250);
        // Unspecified fields fall back to their defaults.
        assert_eq!(config.scheduler.recompute_timeout_ms, 5_000);
        assert_eq!(config.leaderboard_size, 10);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.default_filter.period, ReportingPeriod::AllTime);
        assert_eq!(config.default_filter.display_currency, "USD");
        assert_eq!(config.scheduler.debounce(), Duration::from_millis(500));
        assert_eq!(config.scheduler.recompute_timeout(), Duration::from_secs(5));
        assert_eq!(config.leaderboard_size, 5);
    }

    #[test]
    fn test_config_round_trips_through_yaml() {
        let mut config = AppConfig::default();
        config.default_filter.display_currency = "UGX".to_string();
        config.scheduler.debounce_ms = 100;
        let yaml = serde_yaml::to_string(&config).expect("Failed to serialize");
        let parsed: AppConfig = serde_yaml::from_str(&yaml).expect("Failed to deserialize");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_path() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "leaderboard_size: 3").expect("Failed to write config");
        let config = AppConfig::load_from_path(file.path()).expect("Failed to load config");
        assert_eq!(config.leaderboard_size, 3);
        assert_eq!(config.scheduler, SchedulerConfig::default());

        let missing = AppConfig::load_from_path("/nonexistent/fleetboard/config.yaml");
        assert!(missing.is_err());
    }
}
