use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const DEFAULT_SYMBOL_SUFFIX: &str = ".SA";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36";
// sec min hour day month weekday, after the B3 close
const DEFAULT_COLLECT_SCHEDULE: &str = "0 0 22 * * MON-FRI";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Settings for the chart endpoint client.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub base_url: String,
    pub symbol_suffix: String,
    pub user_agent: String,
    /// Pause taken before every request.
    pub request_delay: Duration,
}

/// Settings for the batch orchestrator.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// Symbols processed concurrently; groups run one after another.
    pub group_size: usize,
    /// Optional pause between two groups.
    pub group_delay: Duration,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            group_size: 3,
            group_delay: Duration::ZERO,
        }
    }
}

/// Process-wide configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub run_migrations: bool,
    pub scheduler_enabled: bool,
    pub collect_schedule: String,
    pub test_mode: bool,
    pub fetcher: FetcherConfig,
    pub collector: CollectorSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let group_size: usize = parse_or(&lookup, "GROUP_SIZE", 3)?;
        if group_size == 0 {
            return Err(ConfigError::Invalid {
                key: "GROUP_SIZE",
                value: "0".to_string(),
            });
        }

        let bind_addr = match lookup("BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: raw,
            })?,
            None => SocketAddr::from_str(DEFAULT_BIND_ADDR).map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: DEFAULT_BIND_ADDR.to_string(),
            })?,
        };

        Ok(Self {
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            bind_addr,
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
            scheduler_enabled: parse_or(&lookup, "SCHEDULER_ENABLED", true)?,
            collect_schedule: lookup("COLLECT_SCHEDULE")
                .unwrap_or_else(|| DEFAULT_COLLECT_SCHEDULE.to_string()),
            test_mode: parse_or(&lookup, "COLLECT_TEST_MODE", false)?,
            fetcher: FetcherConfig {
                base_url: lookup("CHART_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_CHART_BASE_URL.to_string()),
                symbol_suffix: lookup("SYMBOL_SUFFIX")
                    .unwrap_or_else(|| DEFAULT_SYMBOL_SUFFIX.to_string()),
                user_agent: lookup("USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                request_delay: Duration::from_millis(parse_or(&lookup, "REQUEST_DELAY_MS", 500)?),
            },
            collector: CollectorSettings {
                group_size,
                group_delay: Duration::from_millis(parse_or(&lookup, "GROUP_DELAY_MS", 0)?),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
