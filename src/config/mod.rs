//! Configuration layer: typed settings with layered precedence (file → env).
//!
//! Settings come from an optional `tagweave.toml` next to the process,
//! overridden by `TAGWEAVE_`-prefixed environment variables
//! (`TAGWEAVE_CACHE__TTL_SECS=120`). Raw values deserialize into option
//! fields and are validated into typed settings, so a zero TTL or page cap
//! fails loading instead of surfacing later as a cache that never holds
//! anything.

use std::path::Path;
use std::str::FromStr;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const LOCAL_CONFIG_BASENAME: &str = "tagweave";
const DEFAULT_CACHE_TTL_SECS: u64 = 600;
const DEFAULT_CACHE_ENTRY_LIMIT: usize = 1024;
const DEFAULT_MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub cache: CacheSettings,
    pub list: ListSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Expiry applied to tag cache entries, in seconds.
    pub ttl_secs: u64,
    /// Entry bound for the in-memory cache backend.
    pub entry_limit: usize,
}

#[derive(Debug, Clone)]
pub struct ListSettings {
    /// Hard cap on caller-supplied list page sizes.
    pub max_page_size: u64,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Copy)]
pub struct LogLevel(LevelFilter);

impl LogLevel {
    pub fn level_filter(&self) -> LevelFilter {
        self.0
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache: CacheSettings {
                ttl_secs: DEFAULT_CACHE_TTL_SECS,
                entry_limit: DEFAULT_CACHE_ENTRY_LIMIT,
            },
            list: ListSettings {
                max_page_size: DEFAULT_MAX_PAGE_SIZE,
            },
            logging: LoggingSettings {
                level: LogLevel(LevelFilter::INFO),
                format: LogFormat::Compact,
            },
        }
    }
}

impl Settings {
    /// Load settings using the configured precedence (file → environment).
    pub fn load(config_file: Option<&Path>) -> Result<Self, LoadError> {
        let mut builder =
            Config::builder().add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Numeric settings arrive as strings from the environment source.
        builder = builder.add_source(
            Environment::with_prefix("TAGWEAVE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let raw: RawSettings = builder.build()?.try_deserialize()?;
        Settings::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        Ok(Self {
            cache: build_cache_settings(raw.cache)?,
            list: build_list_settings(raw.list)?,
            logging: build_logging_settings(raw.logging)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    cache: RawCacheSettings,
    list: RawListSettings,
    logging: RawLoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    ttl_secs: Option<u64>,
    entry_limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawListSettings {
    max_page_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl_secs = cache.ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if ttl_secs == 0 {
        return Err(LoadError::invalid(
            "cache.ttl_secs",
            "must be greater than zero",
        ));
    }

    let entry_limit = cache.entry_limit.unwrap_or(DEFAULT_CACHE_ENTRY_LIMIT);
    if entry_limit == 0 {
        return Err(LoadError::invalid(
            "cache.entry_limit",
            "must be greater than zero",
        ));
    }

    Ok(CacheSettings {
        ttl_secs,
        entry_limit,
    })
}

fn build_list_settings(list: RawListSettings) -> Result<ListSettings, LoadError> {
    let max_page_size = list.max_page_size.unwrap_or(DEFAULT_MAX_PAGE_SIZE);
    if max_page_size == 0 {
        return Err(LoadError::invalid(
            "list.max_page_size",
            "must be greater than zero",
        ));
    }

    Ok(ListSettings { max_page_size })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map(LogLevel).map_err(
            |err| LoadError::invalid("logging.level", format!("failed to parse: {err}")),
        )?,
        None => LogLevel(LevelFilter::INFO),
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}
