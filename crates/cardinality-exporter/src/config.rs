//! Exporter configuration.
//!
//! Values come from command-line flags, an optional TOML file, and
//! built-in defaults, in that order of precedence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_UPSTREAM_URL: &str = "http://localhost:9090";
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "cardinality-exporter",
    version,
    about = "Republishes TSDB cardinality statistics as Prometheus gauges"
)]
pub struct Cli {
    /// TOML config file. Flags given on the command line take precedence.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the upstream TSDB [default: http://localhost:9090].
    #[arg(long)]
    pub upstream_url: Option<String>,

    /// Address to serve the scrape endpoint on [default: 0.0.0.0:8080].
    #[arg(long)]
    pub listen_address: Option<String>,

    /// Path of the scrape endpoint [default: /metrics].
    #[arg(long)]
    pub metrics_path: Option<String>,

    /// Time between probes, e.g. 30s, 5m, 1h [default: 1h].
    #[arg(long)]
    pub interval: Option<String>,

    /// Per-request timeout for a probe [default: 60s].
    #[arg(long)]
    pub timeout: Option<String>,

    /// Log output format [default: text].
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Contents of the optional config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub upstream_url: Option<String>,
    pub listen_address: Option<String>,
    pub metrics_path: Option<String>,
    pub interval: Option<String>,
    pub timeout: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved exporter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    pub upstream_url: String,
    /// `host:port`; the host may be a name, resolved when binding.
    pub listen_address: String,
    pub metrics_path: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub log_format: LogFormat,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            metrics_path: cardinality_api::DEFAULT_METRICS_PATH.to_string(),
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            log_format: LogFormat::Text,
        }
    }
}

impl ExporterConfig {
    /// Merge flags over the config file (if any) over defaults, then validate.
    pub fn resolve(cli: Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        let defaults = Self::default();

        let listen_address = cli
            .listen_address
            .or(file.listen_address)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string());
        let interval = match cli.interval.or(file.interval) {
            Some(s) => parse_positive_duration("interval", &s)?,
            None => defaults.interval,
        };
        let timeout = match cli.timeout.or(file.timeout) {
            Some(s) => parse_positive_duration("timeout", &s)?,
            None => defaults.timeout,
        };

        let config = Self {
            upstream_url: cli
                .upstream_url
                .or(file.upstream_url)
                .unwrap_or(defaults.upstream_url),
            listen_address: parse_listen_address(&listen_address)?,
            metrics_path: cli
                .metrics_path
                .or(file.metrics_path)
                .unwrap_or(defaults.metrics_path),
            interval,
            timeout,
            log_format: cli.log_format.or(file.log_format).unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.metrics_path.starts_with('/') || self.metrics_path == "/" {
            return Err(ConfigError::Invalid {
                field: "metrics_path",
                reason: format!("{:?} must start with '/' and not be the root path", self.metrics_path),
            });
        }
        if self.upstream_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "upstream_url",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Accepts `host:port` (IP literal or host name), or `:port` for all
/// interfaces. Names are resolved later, when the listener binds.
fn parse_listen_address(s: &str) -> Result<String, ConfigError> {
    let s = s.trim();
    let invalid = |reason: &str| ConfigError::Invalid {
        field: "listen_address",
        reason: format!("{s:?}: {reason}"),
    };

    let (host, port) = s.rsplit_once(':').ok_or_else(|| invalid("expected host:port"))?;
    port.parse::<u16>().map_err(|_| invalid("invalid port"))?;

    let host = if host.is_empty() { "0.0.0.0" } else { host };
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.is_empty() || bare.contains(char::is_whitespace) || (bare.contains(':') && !host.starts_with('[')) {
        return Err(invalid("invalid host"));
    }

    Ok(format!("{host}:{port}"))
}

fn parse_positive_duration(field: &'static str, s: &str) -> Result<Duration, ConfigError> {
    match parse_duration(s) {
        Some(d) if !d.is_zero() => Ok(d),
        Some(_) => Err(ConfigError::Invalid {
            field,
            reason: "must be greater than zero".to_string(),
        }),
        None => Err(ConfigError::Invalid {
            field,
            reason: format!("{s:?} is not a duration (expected e.g. 500ms, 30s, 5m, 1h)"),
        }),
    }
}

/// Parse a duration string like "500ms", "5s", "1m", "1h".
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok()?.checked_mul(60).map(Duration::from_secs)
    } else if let Some(hours) = s.strip_suffix('h') {
        hours.parse::<u64>().ok()?.checked_mul(60 * 60).map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
