//! HTTP plumbing shared by the adapters.

use reqwest::{header, Client, RequestBuilder, StatusCode};
use tracing::{debug, warn};

use super::settings::ProviderSettings;
use crate::errors::MarketDataError;

/// Browser-like agent; some finance endpoints reject library defaults.
pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Build a client whose timeout bounds the whole exchange.
pub(crate) fn build_client(settings: &ProviderSettings) -> Result<Client, MarketDataError> {
    Ok(Client::builder()
        .timeout(settings.timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

/// Send `request` and return the body of a 2xx response.
///
/// An HTTP 429 sleeps the configured cooldown before failing, so a caller
/// that retries does not immediately hit the same wall.
pub(crate) async fn send_text(
    provider: &str,
    settings: &ProviderSettings,
    request: RequestBuilder,
) -> Result<String, MarketDataError> {
    let response = request
        .header(header::ACCEPT, "application/json, text/html;q=0.9")
        .send()
        .await
        .map_err(|e| MarketDataError::from_transport(provider, e))?;

    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        warn!(
            "{} answered 429, cooling down for {:?}",
            provider, settings.rate_limit_cooldown
        );
        tokio::time::sleep(settings.rate_limit_cooldown).await;
        return Err(MarketDataError::RateLimited {
            provider: provider.to_string(),
        });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!("{} returned HTTP {}: {}", provider, status, truncate(&body, 200));
        return Err(MarketDataError::ProviderError {
            provider: provider.to_string(),
            message: format!("HTTP {}", status),
        });
    }

    response
        .text()
        .await
        .map_err(|e| MarketDataError::from_transport(provider, e))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
