use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub scanner: ScannerConfig,
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Number of concurrent scan workers.
    pub workers: usize,
    /// Queue bound; enqueue attempts beyond it are dropped.
    pub max_queue_size: usize,
    /// Global ceiling on scan completions per minute.
    pub scans_per_minute: u32,
    /// Candidate file cap per repository.
    pub max_files_per_repo: usize,
    /// Batch size for concurrent file content fetches.
    pub fetch_concurrency: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            workers: 16,
            max_queue_size: 1000,
            scans_per_minute: 500,
            max_files_per_repo: 50,
            fetch_concurrency: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub archive_base_url: String,
    /// Safety lag behind "now" when replaying archive hours.
    pub catchup_lag_hours: i64,
    /// Cap on events read from one archive hour file.
    pub max_events_per_hour: usize,
    /// Floor for the live-poll interval; the server may ask for more.
    pub min_poll_interval_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            archive_base_url: "https://data.gharchive.org".to_string(),
            catchup_lag_hours: 3,
            max_events_per_hour: 200_000,
            min_poll_interval_secs: 60,
        }
    }
}

impl Config {
    /// Loads the first config file found, falling back to defaults.
    pub fn load() -> Result<Self> {
        let config_paths = ["config/default.toml", "keyscan.toml", ".keyscan.toml"];

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(Path::new(path)) {
                    Ok(config) => {
                        info!("Loaded config from {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        warn!("Failed to load config from {}: {}", path, e);
                    }
                }
            }
        }

        warn!("No config file found, using defaults");
        Ok(Config::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| super::error::ScanError::Config(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_tuning() {
        let config = Config::default();
        assert_eq!(config.scanner.workers, 16);
        assert_eq!(config.scanner.max_queue_size, 1000);
        assert_eq!(config.scanner.scans_per_minute, 500);
        assert_eq!(config.scanner.max_files_per_repo, 50);
        assert_eq!(config.discovery.catchup_lag_hours, 3);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scanner]
            workers = 4
            scans_per_minute = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.scanner.workers, 4);
        assert_eq!(config.scanner.scans_per_minute, 60);
        assert_eq!(config.scanner.max_queue_size, 1000);
        assert_eq!(config.github.base_url, "https://api.github.com");
    }

    #[test]
    fn loads_from_a_toml_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyscan.toml");
        fs::write(
            &path,
            r#"
            [discovery]
            catchup_lag_hours = 6
            "#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.discovery.catchup_lag_hours, 6);
        assert_eq!(config.scanner.workers, 16);
    }

    #[test]
    fn rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyscan.toml");
        fs::write(&path, "not = [valid").unwrap();

        assert!(Config::from_file(&path).is_err());
    }
}
