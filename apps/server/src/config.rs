use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;
use tickerboard_market_data::{
    cache::{DEFAULT_HISTORY_TTL, DEFAULT_QUOTE_TTL, DEFAULT_SWEEP_INTERVAL},
    fundamentals,
    provider::{alpha_vantage, yahoo, DEFAULT_RATE_LIMIT_COOLDOWN, DEFAULT_TIMEOUT},
    registry::DEFAULT_MIN_INTERVAL,
};

/// Free tier allows 5 requests a minute.
const SECONDARY_MIN_INTERVAL: Duration = Duration::from_millis(12_000);

pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub holdings_path: Option<PathBuf>,

    pub primary_base_url: String,
    pub secondary_base_url: String,
    pub secondary_api_key: Option<String>,
    pub secondary_enabled: bool,
    pub fundamentals_base_url: String,

    pub quote_ttl: Duration,
    pub history_ttl: Duration,
    pub cache_sweep_interval: Duration,

    pub primary_min_interval: Duration,
    pub secondary_min_interval: Duration,
    pub fetch_timeout: Duration,
    pub rate_limit_cooldown: Duration,

    pub retry_attempts: u32,
    pub retry_base_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(60_000),
            holdings_path: None,
            primary_base_url: yahoo::DEFAULT_BASE_URL.to_string(),
            secondary_base_url: alpha_vantage::DEFAULT_BASE_URL.to_string(),
            secondary_api_key: None,
            secondary_enabled: true,
            fundamentals_base_url: fundamentals::DEFAULT_BASE_URL.to_string(),
            quote_ttl: DEFAULT_QUOTE_TTL,
            history_ttl: DEFAULT_HISTORY_TTL,
            cache_sweep_interval: DEFAULT_SWEEP_INTERVAL,
            primary_min_interval: DEFAULT_MIN_INTERVAL,
            secondary_min_interval: SECONDARY_MIN_INTERVAL,
            fetch_timeout: DEFAULT_TIMEOUT,
            rate_limit_cooldown: DEFAULT_RATE_LIMIT_COOLDOWN,
            retry_attempts: 3,
            retry_base_delay: Duration::from_millis(1_000),
        }
    }
}

impl Config {
    /// Read `TB_*` variables (after loading `.env`), falling back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let listen_addr = match get("TB_LISTEN_ADDR") {
            Some(addr) => addr
                .parse()
                .with_context(|| format!("Invalid TB_LISTEN_ADDR '{}'", addr))?,
            None => defaults.listen_addr,
        };
        let cors_allow = get("TB_CORS_ALLOW_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_allow);

        Ok(Self {
            listen_addr,
            cors_allow,
            request_timeout: millis(&get, "TB_REQUEST_TIMEOUT_MS", defaults.request_timeout)?,
            holdings_path: get("TB_HOLDINGS_PATH").map(PathBuf::from),
            primary_base_url: get("TB_PRIMARY_BASE_URL").unwrap_or(defaults.primary_base_url),
            secondary_base_url: get("TB_SECONDARY_BASE_URL")
                .unwrap_or(defaults.secondary_base_url),
            secondary_api_key: get("TB_SECONDARY_API_KEY"),
            secondary_enabled: parse(&get, "TB_SECONDARY_ENABLED", defaults.secondary_enabled)?,
            fundamentals_base_url: get("TB_FUNDAMENTALS_BASE_URL")
                .unwrap_or(defaults.fundamentals_base_url),
            quote_ttl: secs(&get, "TB_QUOTE_TTL_SECS", defaults.quote_ttl)?,
            history_ttl: secs(&get, "TB_HISTORY_TTL_SECS", defaults.history_ttl)?,
            cache_sweep_interval: secs(&get, "TB_CACHE_SWEEP_SECS", defaults.cache_sweep_interval)?,
            primary_min_interval: millis(
                &get,
                "TB_PRIMARY_MIN_INTERVAL_MS",
                defaults.primary_min_interval,
            )?,
            secondary_min_interval: millis(
                &get,
                "TB_SECONDARY_MIN_INTERVAL_MS",
                defaults.secondary_min_interval,
            )?,
            fetch_timeout: millis(&get, "TB_FETCH_TIMEOUT_MS", defaults.fetch_timeout)?,
            rate_limit_cooldown: millis(
                &get,
                "TB_RATE_LIMIT_COOLDOWN_MS",
                defaults.rate_limit_cooldown,
            )?,
            retry_attempts: parse(&get, "TB_RETRY_ATTEMPTS", defaults.retry_attempts)?,
            retry_base_delay: millis(&get, "TB_RETRY_BASE_DELAY_MS", defaults.retry_base_delay)?,
        })
    }
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid {} '{}'", key, raw)),
        None => Ok(default),
    }
}

fn millis(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> anyhow::Result<Duration> {
    match get(key) {
        Some(_) => parse(get, key, 0u64).map(Duration::from_millis),
        None => Ok(default),
    }
}

fn secs(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> anyhow::Result<Duration> {
    match get(key) {
        Some(_) => parse(get, key, 0u64).map(Duration::from_secs),
        None => Ok(default),
    }
}
