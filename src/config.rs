use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use logscope_logs::LIVE_CAPACITY;

/// Errors reading the config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings loaded from `config.toml`; every key is optional
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the `*.log` files
    pub logs_dir: PathBuf,

    /// Maximum lines kept while streaming
    pub live_capacity: usize,

    /// How often the followed file is checked for new lines
    pub poll_interval_ms: u64,

    /// File streamed when no file is loaded
    pub default_stream_file: String,

    /// Where exports are written
    pub export_dir: PathBuf,

    /// Fail a live stream that produces no line within this time
    pub connect_timeout_secs: Option<u64>,

    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("./logs"),
            live_capacity: LIVE_CAPACITY,
            poll_interval_ms: 1000,
            default_stream_file: "application.log".to_string(),
            export_dir: PathBuf::from("."),
            connect_timeout_secs: None,
            tick_rate_ms: 100,
        }
    }
}

impl Config {
    /// Default location, `<config dir>/logscope/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("logscope").join("config.toml"))
    }

    /// Load the config
    ///
    /// An explicit path must exist. Without one the default location is
    /// tried, and a missing default file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => {
                    debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let config = Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(1))
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
