use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
pub const DEFAULT_LOG_ARCHIVE_PATTERN: &str = "logs/golf-handicap.{}.log.gz";
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 60 * 60;
pub const DEFAULT_COURSE_CACHE_TTL_SECS: u64 = 10 * 60;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive whole number of seconds, got '{value}'")]
    InvalidSeconds { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// Without a file path only stderr logging is set up.
    pub file_path: Option<String>,
    pub archive_pattern: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub database_url: String,
    pub log: LogConfig,
    pub reconcile_interval: Duration,
    pub course_cache_ttl: Duration,
}

impl ServerConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Ok(Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            log: LogConfig {
                file_path: non_empty("LOG_FILE_PATH"),
                archive_pattern: non_empty("LOG_ARCHIVE_PATTERN")
                    .unwrap_or_else(|| DEFAULT_LOG_ARCHIVE_PATTERN.to_string()),
            },
            reconcile_interval: seconds(
                "HANDICAP_RECONCILE_INTERVAL_SECS",
                non_empty("HANDICAP_RECONCILE_INTERVAL_SECS"),
                DEFAULT_RECONCILE_INTERVAL_SECS,
            )?,
            course_cache_ttl: seconds(
                "COURSE_CACHE_TTL_SECS",
                non_empty("COURSE_CACHE_TTL_SECS"),
                DEFAULT_COURSE_CACHE_TTL_SECS,
            )?,
        })
    }
}

fn seconds(name: &'static str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(Duration::from_secs(default));
    };
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidSeconds { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.log.file_path, None);
        assert_eq!(config.log.archive_pattern, DEFAULT_LOG_ARCHIVE_PATTERN);
        assert_eq!(config.reconcile_interval, Duration::from_secs(3600));
        assert_eq!(config.course_cache_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("DATABASE_URL", "sqlite://golf.db"),
            ("LOG_FILE_PATH", "logs/golf.log"),
            ("HANDICAP_RECONCILE_INTERVAL_SECS", " 120 "),
            ("COURSE_CACHE_TTL_SECS", ""),
        ])
        .unwrap();
        assert_eq!(config.database_url, "sqlite://golf.db");
        assert_eq!(config.log.file_path.as_deref(), Some("logs/golf.log"));
        assert_eq!(config.reconcile_interval, Duration::from_secs(120));
        assert_eq!(config.course_cache_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_invalid_seconds() {
        for value in ["0", "-5", "hourly"] {
            assert_eq!(
                config(&[("COURSE_CACHE_TTL_SECS", value)]),
                Err(ConfigError::InvalidSeconds {
                    name: "COURSE_CACHE_TTL_SECS",
                    value: value.to_string(),
                })
            );
        }
    }
}
