//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&paths.config_file)
    }

    /// Load configuration from a specific path.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&paths.config_file)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check values that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        self.ingest.validate()?;
        if self.search.index.trim().is_empty() {
            return Err(ConfigError::Invalid("search.index must not be empty".to_string()));
        }
        Ok(())
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &Path) -> ConfigResult<()> {
        let default_config = Self::default_config_string();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, default_config)?;
        Ok(())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# Leakdex Configuration

[search]
# Search engine address
url = "http://localhost:9200"

# Index that receives ingested records
index = "breach_data"

# Optional basic auth
# username = "elastic"
# password = "changeme"

# Request timeout in seconds
timeout_seconds = 30

[ingest]
# Longest accepted line for text dumps; longer lines are rejected
max_line_bytes = 10485760

# Lines shorter than this (after trimming) are dropped as noise
min_line_chars = 5

# Column separator for .csv uploads
csv_delimiter = ","

# How nested JSON keys are flattened:
#   "merge"    - inner keys land at the top level, later keys win on collision
#   "prefixed" - inner keys are written as parent.child
flatten = "merge"

# Records buffered between the reader and the upsert workers
queue_capacity = 1024

# Upserts allowed in flight at once
sink_concurrency = 8

# Wait for every upsert before reporting the final count
await_sink = true

# Add an upload_date field (YYYY-MM-DD) to every document
stamp_upload_date = false

[ui]
# Enable colored output
color = true
"#
        .to_string()
    }
}

/// Search engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub url: String,
    pub index: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index: "breach_data".to_string(),
            username: None,
            password: None,
            timeout_seconds: 30,
        }
    }
}

/// How nested objects are collapsed into a flat record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlattenPolicy {
    /// Inner keys are written unprefixed; the last visited key wins.
    #[default]
    Merge,
    /// Inner keys are written as `parent.child`.
    Prefixed,
}

impl std::str::FromStr for FlattenPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merge" => Ok(FlattenPolicy::Merge),
            "prefixed" => Ok(FlattenPolicy::Prefixed),
            other => Err(ConfigError::Invalid(format!("unknown flatten policy: {}", other))),
        }
    }
}

/// Ingestion pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub max_line_bytes: usize,
    pub min_line_chars: usize,
    pub csv_delimiter: char,
    pub flatten: FlattenPolicy,
    pub queue_capacity: usize,
    pub sink_concurrency: usize,
    pub await_sink: bool,
    pub stamp_upload_date: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: 10 * 1024 * 1024,
            min_line_chars: 5,
            csv_delimiter: ',',
            flatten: FlattenPolicy::Merge,
            queue_capacity: 1024,
            sink_concurrency: 8,
            await_sink: true,
            stamp_upload_date: false,
        }
    }
}

impl IngestConfig {
    /// Check the pipeline limits.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.csv_delimiter.is_ascii() {
            return Err(ConfigError::Invalid(format!(
                "ingest.csv_delimiter must be a single ASCII character, got {:?}",
                self.csv_delimiter
            )));
        }
        if self.max_line_bytes == 0 {
            return Err(ConfigError::Invalid(
                "ingest.max_line_bytes must be greater than zero".to_string(),
            ));
        }
        if self.queue_capacity == 0 || self.sink_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "ingest.queue_capacity and ingest.sink_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// UI/Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub color: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { color: true }
    }
}
