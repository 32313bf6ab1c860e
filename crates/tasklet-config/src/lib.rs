//! # tasklet-config
//!
//! Configuration management for the tailing/watermarking tasklet crates.
//!
//! Loads configuration from:
//! 1. `~/.tasklet/config.toml` (global)
//! 2. `.tasklet/config.toml` (project-local, overrides global)
//! 3. Environment variables (highest priority)

pub mod logging;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unknown charset {0:?}")]
    UnknownCharset(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Current config schema version.
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure, covering both the tail source and the watermarking
/// tasklet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub config_version: u32,
    pub source: SourceConfig,
    pub tasklet: TaskletConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            source: SourceConfig::default(),
            tasklet: TaskletConfig::default(),
        }
    }
}

impl Config {
    /// Load config from standard locations (CWD-relative project config).
    pub fn load() -> Result<Self> {
        Self::load_for_project(Path::new("."))
    }

    /// Load config for a specific project root directory.
    /// Resolution order: global → project → env vars.
    pub fn load_for_project(project_root: &Path) -> Result<Self> {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                tracing::debug!("loading global config from {:?}", global_path);
                let contents = std::fs::read_to_string(&global_path)?;
                config = toml::from_str(&contents)?;
            }
        }

        let project_config_path = project_root.join(".tasklet/config.toml");
        if project_config_path.exists() {
            tracing::debug!("loading project config from {:?}", project_config_path);
            let contents = std::fs::read_to_string(&project_config_path)?;
            let project_config: Config = toml::from_str(&contents)?;
            config.merge(project_config);
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Global config path: `~/.tasklet/config.toml`.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".tasklet/config.toml"))
    }

    /// Merge another config (project overrides global). Non-default values from `other`
    /// replace values in `self`.
    fn merge(&mut self, other: Config) {
        let default_source = SourceConfig::default();
        if other.source.directory != default_source.directory {
            self.source.directory = other.source.directory;
        }
        if other.source.glob != default_source.glob {
            self.source.glob = other.source.glob;
        }
        if other.source.charset != default_source.charset {
            self.source.charset = other.source.charset;
        }
        if other.source.parallelism != default_source.parallelism {
            self.source.parallelism = other.source.parallelism;
        }
        if other.source.id != default_source.id {
            self.source.id = other.source.id;
        }
        if other.source.lines_per_batch != default_source.lines_per_batch {
            self.source.lines_per_batch = other.source.lines_per_batch;
        }
        if other.source.watch_poll_seconds != default_source.watch_poll_seconds {
            self.source.watch_poll_seconds = other.source.watch_poll_seconds;
        }

        let default_tasklet = TaskletConfig::default();
        if other.tasklet.max_watermark_retain_millis != default_tasklet.max_watermark_retain_millis {
            self.tasklet.max_watermark_retain_millis = other.tasklet.max_watermark_retain_millis;
        }
    }

    /// Apply environment variable overrides (highest priority).
    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("TASKLET_DIRECTORY") {
            self.source.directory = PathBuf::from(dir);
        }
        if let Ok(glob) = std::env::var("TASKLET_GLOB") {
            self.source.glob = glob;
        }
        if let Ok(charset) = std::env::var("TASKLET_CHARSET") {
            self.source.charset = charset;
        }
        if let Ok(parallelism) = std::env::var("TASKLET_PARALLELISM") {
            if let Ok(n) = parallelism.parse() {
                self.source.parallelism = n;
            }
        }
        if let Ok(id) = std::env::var("TASKLET_ID") {
            if let Ok(n) = id.parse() {
                self.source.id = n;
            }
        }
        if let Ok(lines) = std::env::var("TASKLET_LINES_PER_BATCH") {
            if let Ok(n) = lines.parse() {
                self.source.lines_per_batch = n;
            }
        }
        if let Ok(secs) = std::env::var("TASKLET_WATCH_POLL_SECONDS") {
            if let Ok(n) = secs.parse() {
                self.source.watch_poll_seconds = n;
            }
        }
        if let Ok(retain) = std::env::var("TASKLET_MAX_WATERMARK_RETAIN_MILLIS") {
            if let Ok(n) = retain.parse() {
                self.tasklet.max_watermark_retain_millis = n;
            }
        }
    }
}

/// Configuration options for the directory-tailing source: `{directory, charset, glob,
/// parallelism, id, linesPerBatch, watchPollSeconds}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub directory: PathBuf,
    pub glob: String,
    /// Named charset, resolved to an [`encoding_rs::Encoding`] via [`SourceConfig::encoding`].
    pub charset: String,
    pub parallelism: u32,
    pub id: u32,
    pub lines_per_batch: usize,
    pub watch_poll_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            glob: "*".to_string(),
            charset: "UTF-8".to_string(),
            parallelism: 1,
            id: 0,
            lines_per_batch: 64,
            watch_poll_seconds: 1,
        }
    }
}

impl SourceConfig {
    /// Resolve [`SourceConfig::charset`] to a concrete encoding.
    pub fn encoding(&self) -> Result<&'static encoding_rs::Encoding> {
        encoding_rs::Encoding::for_label(self.charset.as_bytes())
            .ok_or_else(|| ConfigError::UnknownCharset(self.charset.clone()))
    }
}

/// Configuration options for the watermarking tasklet. Mirrors §6:
/// `{maxWatermarkRetainMillis: signed integer, −1 meaning infinite}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TaskletConfig {
    pub max_watermark_retain_millis: i64,
}

impl Default for TaskletConfig {
    fn default() -> Self {
        Self {
            max_watermark_retain_millis: -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn default_config_has_infinite_retention_and_batch_64() {
        let config = Config::default();
        assert_eq!(config.tasklet.max_watermark_retain_millis, -1);
        assert_eq!(config.source.lines_per_batch, 64);
        assert_eq!(config.source.watch_poll_seconds, 1);
    }

    #[test]
    fn source_config_resolves_named_charset() {
        let config = SourceConfig::default();
        assert_eq!(config.encoding().unwrap(), encoding_rs::UTF_8);
    }

    #[test]
    fn source_config_rejects_unknown_charset() {
        let mut config = SourceConfig::default();
        config.charset = "NOT-A-REAL-CHARSET".to_string();
        assert!(matches!(config.encoding(), Err(ConfigError::UnknownCharset(_))));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[source]
glob = "*.log"
"#;
        let config: Config = toml::from_str(partial).unwrap();
        assert_eq!(config.source.glob, "*.log");
        assert_eq!(config.source.parallelism, 1);
    }

    #[test]
    fn merge_overrides_non_default_source_fields_only() {
        let mut base = Config::default();
        let mut overlay = Config::default();
        overlay.source.glob = "*.csv".to_string();

        base.merge(overlay);

        assert_eq!(base.source.glob, "*.csv");
        assert_eq!(base.source.parallelism, 1);
    }

    #[test]
    fn env_override_parallelism_and_id() {
        let _guard = ENV_LOCK.lock().unwrap();
        let mut config = Config::default();

        std::env::set_var("TASKLET_PARALLELISM", "4");
        std::env::set_var("TASKLET_ID", "2");
        config.apply_env_overrides();
        std::env::remove_var("TASKLET_PARALLELISM");
        std::env::remove_var("TASKLET_ID");

        assert_eq!(config.source.parallelism, 4);
        assert_eq!(config.source.id, 2);
    }

    #[test]
    fn env_override_invalid_value_is_ignored() {
        let _guard = ENV_LOCK.lock().unwrap();
        let mut config = Config::default();

        std::env::set_var("TASKLET_PARALLELISM", "not_a_number");
        config.apply_env_overrides();
        std::env::remove_var("TASKLET_PARALLELISM");

        assert_eq!(config.source.parallelism, 1);
    }

    #[test]
    fn load_for_project_reads_project_file() {
        let temp = tempfile::tempdir().unwrap();
        let tasklet_dir = temp.path().join(".tasklet");
        std::fs::create_dir_all(&tasklet_dir).unwrap();
        std::fs::write(
            tasklet_dir.join("config.toml"),
            "[source]\nglob = \"*.ndjson\"\n",
        )
        .unwrap();

        let config = Config::load_for_project(temp.path()).unwrap();
        assert_eq!(config.source.glob, "*.ndjson");
    }
}
