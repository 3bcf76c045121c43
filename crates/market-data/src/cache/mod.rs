//! Ephemeral market data cache.
//!
//! Everything here lives for the lifetime of the process; a restart starts
//! cold and callers treat that as normal. Expiry is evaluated against a
//! [`Clock`] so tests can drive time by hand.

mod clock;
mod ephemeral;
mod market_cache;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ephemeral::{EphemeralCache, Lookup};
pub use market_cache::{
    history_key, quote_key, CacheTtls, MarketCache, DEFAULT_HISTORY_TTL, DEFAULT_QUOTE_TTL,
    DEFAULT_SWEEP_INTERVAL,
};
