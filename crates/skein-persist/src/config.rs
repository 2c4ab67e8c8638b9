use std::path::{Path, PathBuf};

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

use crate::compaction::CompactionPolicy;
use crate::store::DEFAULT_THREADS_DIR;

/// Settings for a file-backed thread store
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoreConfig {
    /// Directory on disk the store is sandboxed to
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Directory below `root_dir` holding the thread files
    #[serde(default = "default_threads_dir")]
    pub threads_dir: PathBuf,

    #[serde(default)]
    pub compaction: CompactionPolicy,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `json` or `pretty`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            threads_dir: default_threads_dir(),
            compaction: CompactionPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_threads_dir() -> PathBuf {
    PathBuf::from(DEFAULT_THREADS_DIR)
}

impl StoreConfig {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. `SKEIN_*` environment variables, `__` separating nested keys
    ///    (e.g. `SKEIN_COMPACTION__MAX_CONTEXT_TOKENS=8000`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("SKEIN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a specific file (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml_str = r#"
            root_dir = "/var/lib/skein"
            threads_dir = "threads"

            [compaction]
            max_context_tokens = 8000
            reserved_output_tokens = 1000

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: StoreConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.root_dir, PathBuf::from("/var/lib/skein"));
        assert_eq!(config.threads_dir, PathBuf::from("threads"));
        assert_eq!(config.compaction.max_context_tokens, 8000);
        assert_eq!(config.compaction.reserved_output_tokens, 1000);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.threads_dir, PathBuf::from(".threads"));
        assert_eq!(config.compaction.reserved_output_tokens, 0);
    }

    #[test]
    fn test_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("skein.toml");
        std::fs::write(&path, "[compaction]\nmax_context_tokens = 512\n").unwrap();

        let config = StoreConfig::from_file(&path).unwrap();
        assert_eq!(config.compaction.max_context_tokens, 512);
        assert_eq!(config.logging, LoggingConfig::default());
    }
}
