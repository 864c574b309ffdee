//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::Workspace;
use crate::entities::CustomerDefaults;

pub const DEFAULT_MAX_ROWS: usize = 1000;
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Importer configuration with layered hierarchy
///
/// Built-in defaults < global `config.yaml` < workspace `.tsi/config.yaml`
/// < `TSI_*` environment variables.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CSV delimiter, `;` or `,`
    pub delimiter: Option<String>,

    /// Timezone for dates without an offset
    pub timezone: Option<String>,

    /// Language preference for created users
    pub language: Option<String>,

    /// Country code for created customers
    pub country: Option<String>,

    /// Currency code for created customers
    pub currency: Option<String>,

    /// Maximum number of rows per import file
    pub max_rows: Option<usize>,

    /// Create activities without a project
    pub global_activities: Option<bool>,

    /// Legacy imports flush after this many timesheet records
    pub batch_size: Option<usize>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let workspace = Workspace::discover().ok();
        Self::load_for(workspace.as_ref())
    }

    /// Load configuration for an explicit workspace
    pub fn load_for(workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        if let Some(workspace) = workspace {
            if let Some(local) = Self::read_file(&workspace.config_path()) {
                config.merge(local);
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "tsi")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("cannot read {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("ignoring invalid config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
        if other.timezone.is_some() {
            self.timezone = other.timezone;
        }
        if other.language.is_some() {
            self.language = other.language;
        }
        if other.country.is_some() {
            self.country = other.country;
        }
        if other.currency.is_some() {
            self.currency = other.currency;
        }
        if other.max_rows.is_some() {
            self.max_rows = other.max_rows;
        }
        if other.global_activities.is_some() {
            self.global_activities = other.global_activities;
        }
        if other.batch_size.is_some() {
            self.batch_size = other.batch_size;
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(delimiter) = var("TSI_DELIMITER") {
            self.delimiter = Some(delimiter);
        }
        if let Some(timezone) = var("TSI_TIMEZONE") {
            self.timezone = Some(timezone);
        }
        if let Some(max_rows) = var("TSI_MAX_ROWS").and_then(|v| v.parse().ok()) {
            self.max_rows = Some(max_rows);
        }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
            .as_deref()
            .and_then(|d| d.bytes().next())
            .unwrap_or(b';')
    }

    pub fn timezone(&self) -> String {
        self.timezone.clone().unwrap_or_else(|| "UTC".to_string())
    }

    pub fn language(&self) -> String {
        self.language.clone().unwrap_or_else(|| "en".to_string())
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows.unwrap_or(DEFAULT_MAX_ROWS)
    }

    pub fn global_activities(&self) -> bool {
        self.global_activities.unwrap_or(true)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1)
    }

    /// Country, currency and timezone for customers created by an import
    pub fn customer_defaults(&self) -> CustomerDefaults {
        let fallback = CustomerDefaults::default();
        CustomerDefaults {
            country: self
                .country
                .as_deref()
                .map(str::to_uppercase)
                .unwrap_or(fallback.country),
            currency: self
                .currency
                .as_deref()
                .map(str::to_uppercase)
                .unwrap_or(fallback.currency),
            timezone: self.timezone(),
        }
    }
}
