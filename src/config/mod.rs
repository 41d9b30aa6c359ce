//! Runtime configuration for the refresh subsystem.
//!
//! Everything is read from environment variables with development defaults.
//! `Config::from_env` validates numeric and URL values and reports the first
//! offending variable as a `ConfigError`.

use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Environment variable names.
pub const ENV_WORKER_POOL_SIZE: &str = "WORKER_POOL_SIZE";
pub const ENV_JOB_QUEUE_CAPACITY: &str = "JOB_QUEUE_CAPACITY";
pub const ENV_HTTP_CLIENT_TIMEOUT: &str = "HTTP_CLIENT_TIMEOUT";
pub const ENV_HTTP_CLIENT_MAX_BODY_SIZE: &str = "HTTP_CLIENT_MAX_BODY_SIZE";
pub const ENV_HTTP_CLIENT_USER_AGENT: &str = "HTTP_CLIENT_USER_AGENT";
pub const ENV_HTTP_CLIENT_PROXY: &str = "HTTP_CLIENT_PROXY";
pub const ENV_METRICS_COLLECTOR: &str = "METRICS_COLLECTOR";
pub const ENV_FEED_URLS: &str = "FEED_URLS";

const DEFAULT_WORKER_POOL_SIZE: usize = 5;
const DEFAULT_JOB_QUEUE_CAPACITY: usize = 100;
const DEFAULT_HTTP_CLIENT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_HTTP_CLIENT_MAX_BODY_SIZE_MIB: u64 = 15;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; Feedcore/0.1; +https://github.com/feedcore/feedcore)";

/// Settings for outgoing HTTP requests made while scraping pages and
/// downloading feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub max_body_size: u64,
    pub user_agent: String,
    pub proxy: Option<Url>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_CLIENT_TIMEOUT_SECS),
            max_body_size: DEFAULT_HTTP_CLIENT_MAX_BODY_SIZE_MIB * 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
        }
    }
}

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    worker_pool_size: usize,
    job_queue_capacity: usize,
    http_client: HttpClientConfig,
    metrics_collector: bool,
    feed_urls: Vec<String>,
}

impl Config {
    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let worker_pool_size =
            parse_positive(ENV_WORKER_POOL_SIZE, DEFAULT_WORKER_POOL_SIZE as u64)? as usize;
        let job_queue_capacity =
            parse_positive(ENV_JOB_QUEUE_CAPACITY, DEFAULT_JOB_QUEUE_CAPACITY as u64)? as usize;
        let timeout_secs =
            parse_positive(ENV_HTTP_CLIENT_TIMEOUT, DEFAULT_HTTP_CLIENT_TIMEOUT_SECS)?;
        let max_body_mib = parse_positive(
            ENV_HTTP_CLIENT_MAX_BODY_SIZE,
            DEFAULT_HTTP_CLIENT_MAX_BODY_SIZE_MIB,
        )?;

        let user_agent = env::var(ENV_HTTP_CLIENT_USER_AGENT)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let proxy = match env::var(ENV_HTTP_CLIENT_PROXY) {
            Ok(raw) if !raw.trim().is_empty() => {
                Some(Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidValue {
                    field: ENV_HTTP_CLIENT_PROXY,
                    reason: e.to_string(),
                })?)
            }
            _ => None,
        };

        let metrics_collector = parse_bool(ENV_METRICS_COLLECTOR)?;

        let feed_urls = env::var(ENV_FEED_URLS)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            worker_pool_size,
            job_queue_capacity,
            http_client: HttpClientConfig {
                timeout: Duration::from_secs(timeout_secs),
                max_body_size: max_body_mib * 1024 * 1024,
                user_agent,
                proxy,
            },
            metrics_collector,
            feed_urls,
        })
    }

    /// Number of concurrent refresh workers.
    pub fn worker_pool_size(&self) -> usize {
        self.worker_pool_size
    }
    /// Capacity of the channel feeding the worker pool.
    pub fn job_queue_capacity(&self) -> usize {
        self.job_queue_capacity
    }
    pub fn http_client(&self) -> &HttpClientConfig {
        &self.http_client
    }
    /// Whether refresh durations are recorded through the metrics facade.
    pub fn has_metrics_collector(&self) -> bool {
        self.metrics_collector
    }
    pub fn feed_urls(&self) -> &[String] {
        &self.feed_urls
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            job_queue_capacity: DEFAULT_JOB_QUEUE_CAPACITY,
            http_client: HttpClientConfig::default(),
            metrics_collector: false,
            feed_urls: Vec::new(),
        }
    }
}

fn parse_positive(field: &'static str, default: u64) -> Result<u64, ConfigError> {
    let Ok(raw) = env::var(field) else {
        return Ok(default);
    };

    let value: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field,
        reason: format!("'{}' is not a number", raw),
    })?;

    if value == 0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(value)
}

fn parse_bool(field: &'static str) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(field) else {
        return Ok(false);
    };

    match raw.trim().to_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field,
            reason: format!("'{}' is not a boolean", other),
        }),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Ensure environment-variable manipulating tests run serially.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            ENV_WORKER_POOL_SIZE,
            ENV_JOB_QUEUE_CAPACITY,
            ENV_HTTP_CLIENT_TIMEOUT,
            ENV_HTTP_CLIENT_MAX_BODY_SIZE,
            ENV_HTTP_CLIENT_USER_AGENT,
            ENV_HTTP_CLIENT_PROXY,
            ENV_METRICS_COLLECTOR,
            ENV_FEED_URLS,
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn defaults_when_env_missing() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.worker_pool_size(), 5);
        assert_eq!(cfg.http_client().timeout, Duration::from_secs(20));
        assert!(!cfg.has_metrics_collector());
        assert!(cfg.feed_urls().is_empty());
    }

    #[test]
    fn overrides_when_env_present() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_WORKER_POOL_SIZE, "12");
            env::set_var(ENV_HTTP_CLIENT_TIMEOUT, "3");
            env::set_var(ENV_HTTP_CLIENT_USER_AGENT, "TestAgent/1.0");
            env::set_var(ENV_HTTP_CLIENT_PROXY, "http://proxy.local:3128");
            env::set_var(ENV_METRICS_COLLECTOR, "true");
            env::set_var(ENV_FEED_URLS, "https://a.example.com/feed, ,https://b.example.com/rss");
        }
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.worker_pool_size(), 12);
        assert_eq!(cfg.http_client().timeout, Duration::from_secs(3));
        assert_eq!(cfg.http_client().user_agent, "TestAgent/1.0");
        assert_eq!(
            cfg.http_client().proxy.as_ref().map(Url::as_str),
            Some("http://proxy.local:3128/")
        );
        assert!(cfg.has_metrics_collector());
        assert_eq!(
            cfg.feed_urls(),
            ["https://a.example.com/feed", "https://b.example.com/rss"]
        );
        clear_env();
    }

    #[test]
    fn rejects_zero_workers() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_WORKER_POOL_SIZE, "0");
        }
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_WORKER_POOL_SIZE));
        clear_env();
    }

    #[test]
    fn rejects_garbage_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_METRICS_COLLECTOR, "maybe");
        }
        assert!(Config::from_env().is_err());

        clear_env();
        unsafe {
            env::set_var(ENV_HTTP_CLIENT_TIMEOUT, "soon");
        }
        assert!(Config::from_env().is_err());
        clear_env();
    }
}
