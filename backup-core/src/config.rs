//! Configuration for the backup core.
//!
//! Loads configuration from a TOML file; every field has a sensible default
//! so embedding processes can also construct it directly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub registry: RegistryConfig,
    pub observer: ObserverConfig,
    pub journal: JournalConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path of the shared registry file
    pub file: PathBuf,

    /// Attempts before a read/write gives up
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Lower bound of the randomized backoff between attempts (ms)
    #[serde(default = "default_backoff_min_ms")]
    pub backoff_min_ms: u64,

    /// Upper bound of the randomized backoff between attempts (ms)
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Poll period of the registry observer (ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Path of the append-only event log
    pub file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_retry_attempts() -> u32 {
    5
}

fn default_backoff_min_ms() -> u64 {
    100
}

fn default_backoff_max_ms() -> u64 {
    150
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RegistryConfig {
    /// Draw a randomized backoff duration from the configured window.
    pub fn backoff(&self) -> Duration {
        use rand::Rng;

        let min = self.backoff_min_ms.min(self.backoff_max_ms);
        let max = self.backoff_min_ms.max(self.backoff_max_ms);
        let ms = if min == max {
            min
        } else {
            rand::thread_rng().gen_range(min..=max)
        };
        Duration::from_millis(ms)
    }
}

impl CoreConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CoreConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Configuration rooted at a data directory, with default tuning.
    pub fn with_data_dir(data_dir: &Path) -> Self {
        CoreConfig {
            registry: RegistryConfig {
                file: data_dir.join("running_backups.json"),
                retry_attempts: default_retry_attempts(),
                backoff_min_ms: default_backoff_min_ms(),
                backoff_max_ms: default_backoff_max_ms(),
            },
            observer: ObserverConfig {
                poll_interval_ms: default_poll_interval_ms(),
            },
            journal: JournalConfig {
                file: data_dir.join("backup_events.log"),
            },
            log: LogConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_data_dir() {
        let config = CoreConfig::with_data_dir(std::path::Path::new("/var/lib/backups"));
        assert_eq!(config.registry.retry_attempts, 5);
        assert_eq!(config.registry.backoff_min_ms, 100);
        assert_eq!(config.registry.backoff_max_ms, 150);
        assert_eq!(config.observer.poll_interval_ms, 1000);
        assert_eq!(config.log.level, "info");
        assert!(config.registry.file.ends_with("running_backups.json"));
    }

    #[test]
    fn test_backoff_stays_in_window() {
        let config = CoreConfig::with_data_dir(std::path::Path::new("/tmp"));
        for _ in 0..50 {
            let d = config.registry.backoff();
            assert!(d >= Duration::from_millis(100));
            assert!(d <= Duration::from_millis(150));
        }
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [registry]
            file = "/data/registry.json"
            retry_attempts = 3

            [observer]
            poll_interval_ms = 2000

            [journal]
            file = "/data/events.log"
        "#;
        let config: CoreConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.registry.retry_attempts, 3);
        // unspecified fields fall back to defaults
        assert_eq!(config.registry.backoff_min_ms, 100);
        assert_eq!(config.observer.poll_interval_ms, 2000);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("core.toml");
        std::fs::write(
            &path,
            r#"
            [registry]
            file = "/data/registry.json"

            [observer]

            [journal]
            file = "/data/events.log"

            [log]
            level = "debug"
            "#,
        )
        .unwrap();

        let config = CoreConfig::from_file(&path).unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.registry.file, PathBuf::from("/data/registry.json"));
    }
}
