use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use tickerboard_core::{HoldingsValuationService, HoldingsValuationServiceTrait};
use tickerboard_market_data::{
    provider::{alpha_vantage, yahoo},
    registry::Backoff,
    AlphaVantageProvider, CacheTtls, FundamentalsScraper, MarketCache, ProviderSettings,
    QuoteRegistry, RateLimitConfig, RateLimiter, RetryPolicy, YahooProvider,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub registry: Arc<QuoteRegistry>,
    pub valuation_service: Arc<dyn HoldingsValuationServiceTrait>,
    pub fundamentals: Arc<FundamentalsScraper>,
    /// Re-read on every request so edits apply without a restart.
    pub holdings_path: Option<PathBuf>,
}

pub fn init_tracing() {
    let log_format = std::env::var("TB_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let cache = Arc::new(MarketCache::new(CacheTtls {
        quote: config.quote_ttl,
        history: config.history_ttl,
    }));

    let settings = |base_url: &str| {
        ProviderSettings::new(base_url)
            .with_timeout(config.fetch_timeout)
            .with_rate_limit_cooldown(config.rate_limit_cooldown)
    };

    let primary_limiter = Arc::new(RateLimiter::with_config(
        yahoo::PROVIDER_ID,
        RateLimitConfig {
            min_interval: config.primary_min_interval,
        },
    ));
    log_limiter(&primary_limiter);
    let primary = YahooProvider::new(settings(&config.primary_base_url), primary_limiter)?;

    let mut registry = QuoteRegistry::new(Arc::new(primary), cache).with_retry_policy(
        RetryPolicy {
            max_attempts: config.retry_attempts,
            base_delay: config.retry_base_delay,
            backoff: Backoff::Linear,
        },
    );

    if config.secondary_enabled {
        let secondary_limiter = Arc::new(RateLimiter::with_config(
            alpha_vantage::PROVIDER_ID,
            RateLimitConfig {
                min_interval: config.secondary_min_interval,
            },
        ));
        log_limiter(&secondary_limiter);
        let secondary = AlphaVantageProvider::new(
            settings(&config.secondary_base_url),
            config.secondary_api_key.clone(),
            secondary_limiter,
        )?;
        registry = registry.with_secondary(Arc::new(secondary));
    } else {
        tracing::info!("Secondary quote source disabled");
    }

    tracing::info!(
        "Quote registry: {} attempt(s), up to {:?} of retry backoff, secondary {}",
        registry.retry_policy().attempts(),
        registry.retry_policy().total_delay(),
        if registry.has_secondary() { "on" } else { "off" }
    );

    let fundamentals = FundamentalsScraper::new(settings(&config.fundamentals_base_url))?;

    match &config.holdings_path {
        Some(path) => tracing::info!("Holdings document: {}", path.display()),
        None => tracing::info!("No holdings document configured"),
    }

    Ok(state_from_parts(
        config,
        Arc::new(registry),
        Arc::new(fundamentals),
    ))
}

fn log_limiter(limiter: &RateLimiter) {
    tracing::info!(
        "Rate limit for {}: one call per {:?}",
        limiter.provider(),
        limiter.min_interval()
    );
}

/// Assemble state around an already-built registry.
pub fn state_from_parts(
    config: &Config,
    registry: Arc<QuoteRegistry>,
    fundamentals: Arc<FundamentalsScraper>,
) -> Arc<AppState> {
    let valuation_service = Arc::new(HoldingsValuationService::new(registry.clone()));
    Arc::new(AppState {
        registry,
        valuation_service,
        fundamentals,
        holdings_path: config.holdings_path.clone(),
    })
}
