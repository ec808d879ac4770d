//! Daemon configuration.
//!
//! Read from a `key = value` file, then overridden by `ARPWATCH_<KEY>`
//! environment variables. A missing file means defaults.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

use crate::capture::{CaptureFilter, CaptureOptions};
use crate::dissector::VlanContext;
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/arpwatch.conf";
const DEFAULT_BUFFER_SIZE: usize = 10000;
const DEFAULT_READ_TIMEOUT_MS: u64 = 100;
const DEFAULT_STATS_INTERVAL_SECS: u64 = 120;
pub const DEFAULT_LOG_FILTER: &str = "info";
const ENV_PREFIX: &str = "ARPWATCH_";

const KEYS: &[&str] = &[
    "interface",
    "native_vlan",
    "ignore_tagged",
    "buffer_size",
    "ring",
    "filter",
    "read_timeout_ms",
    "stats_interval_secs",
    "location",
    "label",
    "sink",
    "sql_output",
    "reverse_dns",
    "log_filter",
];

/// Where drained observations go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SinkKind {
    #[default]
    Console,
    Sql,
}

impl FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "console" => Ok(Self::Console),
            "sql" => Ok(Self::Sql),
            other => Err(format!("unknown sink '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Interface to watch; the first usable one when unset.
    pub interface: Option<String>,
    pub native_vlan: Option<u16>,
    pub ignore_tagged: bool,
    pub buffer_size: usize,
    pub ring: bool,
    pub filter: CaptureFilter,
    pub read_timeout: Duration,
    pub stats_interval: Duration,
    pub location: String,
    pub label: String,
    pub sink: SinkKind,
    /// SQL output file; stdout when unset.
    pub sql_output: Option<PathBuf>,
    /// Fill the SQL `hostname` column from reverse DNS.
    pub reverse_dns: bool,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interface: None,
            native_vlan: None,
            ignore_tagged: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            ring: true,
            filter: CaptureFilter::default(),
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            stats_interval: Duration::from_secs(DEFAULT_STATS_INTERVAL_SECS),
            location: String::new(),
            label: String::new(),
            sink: SinkKind::default(),
            sql_output: None,
            reverse_dns: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load from `path` (if it exists) and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::parse(&content)?
        } else {
            debug!("No config at {:?}, using defaults", path);
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse config file contents.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                config.set(key.trim(), value.trim())?;
            }
        }
        Ok(config)
    }

    /// Apply `ARPWATCH_<KEY>` overrides found by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in KEYS {
            let var = format!("{}{}", ENV_PREFIX, key.to_uppercase());
            if let Some(value) = lookup(&var) {
                self.set(key, value.trim())?;
            }
        }
        Ok(())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "interface" => self.interface = non_empty(value).map(str::to_string),
            "native_vlan" => {
                let vlan: u16 = parse_value(key, value)?;
                if vlan > 4095 {
                    return Err(invalid(key, value));
                }
                self.native_vlan = (vlan != 0).then_some(vlan);
            }
            "ignore_tagged" => self.ignore_tagged = parse_bool(key, value)?,
            "buffer_size" => {
                let size: usize = parse_value(key, value)?;
                if size < 2 {
                    return Err(invalid(key, value));
                }
                self.buffer_size = size;
            }
            "ring" => self.ring = parse_bool(key, value)?,
            "filter" => self.filter = parse_value(key, value)?,
            "read_timeout_ms" => {
                let ms: u64 = parse_value(key, value)?;
                if ms == 0 {
                    return Err(invalid(key, value));
                }
                self.read_timeout = Duration::from_millis(ms);
            }
            "stats_interval_secs" => {
                self.stats_interval = Duration::from_secs(parse_value(key, value)?);
            }
            "location" => self.location = value.to_string(),
            "label" => self.label = value.to_string(),
            "sink" => self.sink = parse_value(key, value)?,
            "sql_output" => self.sql_output = non_empty(value).map(PathBuf::from),
            "reverse_dns" => self.reverse_dns = parse_bool(key, value)?,
            "log_filter" => self.log_filter = value.to_string(),
            _ => warn!("Ignoring unknown config key '{}'", key),
        }
        Ok(())
    }

    pub fn vlan_context(&self) -> VlanContext {
        VlanContext {
            native_vlan: self.native_vlan,
            ignore_tagged: self.ignore_tagged,
        }
    }

    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            read_timeout: self.read_timeout,
            filter: self.filter,
            ..CaptureOptions::default()
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| invalid(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}
