use std::path::PathBuf;
use std::time::Duration;

use crate::dispatcher::DispatcherConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Worker process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub max_workers: usize,
    pub poll_interval: Duration,
    /// Pause between two launches within one poll tick.
    pub launch_pause: Duration,
    /// Root of the local image cache.
    pub data_dir: PathBuf,
    pub log_format: LogFormat,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default    |
    /// |----------------------|------------|
    /// | `DATABASE_URL`       | required   |
    /// | `MAX_WORKERS`        | `10`       |
    /// | `POLL_INTERVAL_SECS` | `10`       |
    /// | `LAUNCH_PAUSE_MS`    | `1000`     |
    /// | `DATA_DIR`           | `data`     |
    /// | `LOG_FORMAT`         | `text`     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let number = |name: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(name) {
                None => Ok(default),
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid { name, value }),
            }
        };

        let max_workers = number("MAX_WORKERS", 10)?;
        if max_workers == 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_WORKERS",
                value: "0".into(),
            });
        }

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            database_url,
            max_workers: max_workers as usize,
            poll_interval: Duration::from_secs(number("POLL_INTERVAL_SECS", 10)?),
            launch_pause: Duration::from_millis(number("LAUNCH_PAUSE_MS", 1_000)?),
            data_dir: lookup("DATA_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            log_format,
        })
    }

    pub fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig {
            max_workers: self.max_workers,
            poll_interval: self.poll_interval,
            launch_pause: self.launch_pause,
        }
    }
}
