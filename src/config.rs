// src/config.rs
// =============================================================================
// Service configuration.
//
// Every value has a default, so the service runs with no environment at all.
// `Config::from_env()` overrides the defaults from environment variables
// (a local .env file is loaded first by main.rs).
//
//   BIND_ADDR                     0.0.0.0:8080
//   STORAGE_FILE                  data/seo-tracker.json
//   TARGET_DOMAIN                 mying.vercel.app
//   CHECK_TIMEOUT_SECS            30
//   CHECK_USER_AGENT              a desktop Chrome user agent
//   RATE_LIMIT_MAX                5
//   RATE_LIMIT_WINDOW_SECS        3600
//   RATE_LIMIT_CLEANUP_THRESHOLD  1000
//   CRON_SECRET                   (unset = cron endpoint is open)
//   ADMIN_PASSWORD                (unset = admin endpoints only in development)
//   APP_ENV                       production
// =============================================================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Top-level configuration for the service and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub checker: CheckerConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// How backlinks are fetched and matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Domain every scanned page is searched for
    #[serde(default = "default_target_domain")]
    pub target_domain: String,

    /// Per-request deadline in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Fixed-window limits for the public contact form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Tracked identifiers above which expired windows are swept
    #[serde(default = "default_cleanup_threshold")]
    pub cleanup_threshold: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_file")]
    pub file: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token required by the cron endpoint
    #[serde(default)]
    pub cron_secret: Option<String>,

    /// Bearer token required by the tracker admin endpoints
    #[serde(default)]
    pub admin_password: Option<String>,

    /// Development mode lets admin calls through when no password is set
    #[serde(default)]
    pub development: bool,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_target_domain() -> String {
    "mying.vercel.app".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_max_requests() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    60 * 60
}

fn default_cleanup_threshold() -> usize {
    1000
}

fn default_storage_file() -> PathBuf {
    PathBuf::from("data").join("seo-tracker.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            checker: CheckerConfig::default(),
            rate_limit: RateLimitConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            target_domain: default_target_domain(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            cleanup_threshold: default_cleanup_threshold(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file: default_storage_file(),
        }
    }
}

impl CheckerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Config {
    /// Build a config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup (the environment, or a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset, like an empty CRON_SECRET= line in .env
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let defaults = Config::default();

        Config {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            checker: CheckerConfig {
                target_domain: get("TARGET_DOMAIN").unwrap_or(defaults.checker.target_domain),
                timeout_secs: parse_number(get("CHECK_TIMEOUT_SECS"))
                    .unwrap_or(defaults.checker.timeout_secs),
                user_agent: get("CHECK_USER_AGENT").unwrap_or(defaults.checker.user_agent),
            },
            rate_limit: RateLimitConfig {
                max_requests: parse_number(get("RATE_LIMIT_MAX"))
                    .unwrap_or(defaults.rate_limit.max_requests),
                window_secs: parse_number(get("RATE_LIMIT_WINDOW_SECS"))
                    .unwrap_or(defaults.rate_limit.window_secs),
                cleanup_threshold: parse_number(get("RATE_LIMIT_CLEANUP_THRESHOLD"))
                    .unwrap_or(defaults.rate_limit.cleanup_threshold),
            },
            storage: StorageConfig {
                file: get("STORAGE_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.file),
            },
            auth: AuthConfig {
                cron_secret: get("CRON_SECRET"),
                admin_password: get("ADMIN_PASSWORD"),
                development: get("APP_ENV").is_some_and(|v| v == "development"),
            },
        }
    }
}

// Unparseable numbers fall back to the default, like unset ones
fn parse_number<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}
