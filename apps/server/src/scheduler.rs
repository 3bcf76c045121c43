//! Background sweeper that drops expired cache entries.
//!
//! Reads never depend on it: an expired entry is already treated as a miss,
//! and is kept only until the next sweep as a stale fallback.

use std::sync::Arc;
use tokio::time::{interval_at, Duration, Instant};
use tracing::{debug, info};

use crate::main_lib::AppState;

/// Starts the periodic cache sweep. The first sweep runs one `period` after start.
pub fn start_cache_sweeper(state: Arc<AppState>, period: Duration) {
    tokio::spawn(async move {
        info!("Cache sweeper started ({}s interval)", period.as_secs());

        let mut ticker = interval_at(Instant::now() + period, period);
        loop {
            ticker.tick().await;
            run_sweep(&state);
        }
    });
}

fn run_sweep(state: &AppState) {
    let cache = state.registry.cache();
    let removed = cache.sweep_expired();
    debug!(
        "Cache sweep removed {} expired entries, {} remain",
        removed,
        cache.len()
    );
}
