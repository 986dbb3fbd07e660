//! Configuration management
//!
//! Manages storage location, catalog overrides, task generation tuning and
//! species reference settings.

use anyhow::{Result, Context};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Catalog overrides
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Experiment progression settings
    #[serde(default)]
    pub progression: ProgressionConfig,
    /// Observation task generation settings
    #[serde(default)]
    pub tasks: TasksConfig,
    /// Species reference service settings
    #[serde(default)]
    pub species: SpeciesConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for persisted state (defaults to the platform data dir)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the effective data directory
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(data_dir()?.join("state")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory containing experiments.yaml, templates.yaml and species.yaml.
    /// The built-in catalog is used when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Points credited for an experiment id missing from the catalog
    #[serde(default = "default_points")]
    pub default_points: u32,
}

fn default_points() -> u32 {
    100
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            default_points: default_points(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Days before a completed (category, focus) pair may resurface
    #[serde(default = "default_cooldown_days")]
    pub cooldown_days: i64,
    /// Days until a generated task expires
    #[serde(default = "default_expiry_days")]
    pub expiry_days: i64,
    /// Daily blend: easy tasks
    #[serde(default = "default_daily_easy")]
    pub daily_easy: usize,
    /// Daily blend: medium tasks
    #[serde(default = "default_daily_medium")]
    pub daily_medium: usize,
    /// Daily blend: hard tasks
    #[serde(default = "default_daily_hard")]
    pub daily_hard: usize,
}

/// Longest cooldown or expiry accepted from the config file
const MAX_TASK_DAYS: i64 = 36_500;

fn default_cooldown_days() -> i64 {
    60
}

fn default_expiry_days() -> i64 {
    7
}

fn default_daily_easy() -> usize {
    2
}

fn default_daily_medium() -> usize {
    2
}

fn default_daily_hard() -> usize {
    1
}

impl TasksConfig {
    /// Cooldown window, the default when the configured value is out of range
    pub fn cooldown(&self) -> TimeDelta {
        days_or_default("cooldown_days", self.cooldown_days, default_cooldown_days())
    }

    /// Task lifetime, the default when the configured value is out of range
    pub fn expiry(&self) -> TimeDelta {
        days_or_default("expiry_days", self.expiry_days, default_expiry_days())
    }
}

fn days_or_default(field: &str, days: i64, fallback: i64) -> TimeDelta {
    let delta = (0..=MAX_TASK_DAYS)
        .contains(&days)
        .then(|| TimeDelta::try_days(days))
        .flatten();
    delta.unwrap_or_else(|| {
        warn!("tasks.{} = {} is out of range, using {}", field, days, fallback);
        TimeDelta::days(fallback)
    })
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            cooldown_days: default_cooldown_days(),
            expiry_days: default_expiry_days(),
            daily_easy: default_daily_easy(),
            daily_medium: default_daily_medium(),
            daily_hard: default_daily_hard(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesConfig {
    /// Enable external species lookups
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Base URL of the species reference API
    #[serde(default = "default_species_url")]
    pub base_url: String,
    /// Minimum interval between two external requests
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_species_url() -> String {
    "https://api.inaturalist.org/v1".to_string()
}

fn default_min_interval_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    10
}

impl SpeciesConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SpeciesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_species_url(),
            min_interval_ms: default_min_interval_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: Config = toml::from_str(&contents)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = config_path()?;
        let parent = config_path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "nature-quest", "nature-quest")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "nature-quest", "nature-quest")
        .context("Failed to get project directories")?;
    Ok(base.data_dir().to_path_buf())
}

/// Get default configuration as TOML string
pub fn default_config_toml() -> String {
    let config = Config::default();
    toml::to_string_pretty(&config).unwrap_or_else(|_| "# Default configuration\n".to_string())
}
