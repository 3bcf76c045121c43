use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use super::symbol::Symbol;
use super::types::{Currency, ProviderId};
use crate::errors::MarketDataError;

/// Look-back window for a historical series, named the way charting
/// front-ends (and the Yahoo chart API) name them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HistoryRange {
    OneDay,
    FiveDays,
    #[default]
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl HistoryRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::TenYears => "10y",
            Self::YearToDate => "ytd",
            Self::Max => "max",
        }
    }

    /// First calendar date covered by this range, relative to `today`.
    /// `None` means unbounded.
    pub fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        let days = match self {
            Self::OneDay => 1,
            // Five trading days, padded over a weekend.
            Self::FiveDays => 7,
            Self::OneMonth => 31,
            Self::ThreeMonths => 92,
            Self::SixMonths => 183,
            Self::OneYear => 366,
            Self::TwoYears => 731,
            Self::FiveYears => 1827,
            Self::TenYears => 3653,
            Self::YearToDate => return NaiveDate::from_ymd_opt(today.year(), 1, 1),
            Self::Max => return None,
        };
        Some(today - Duration::days(days))
    }
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryRange {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1d" => Ok(Self::OneDay),
            "5d" => Ok(Self::FiveDays),
            "1mo" => Ok(Self::OneMonth),
            "3mo" => Ok(Self::ThreeMonths),
            "6mo" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "2y" => Ok(Self::TwoYears),
            "5y" => Ok(Self::FiveYears),
            "10y" => Ok(Self::TenYears),
            "ytd" => Ok(Self::YearToDate),
            "max" => Ok(Self::Max),
            other => Err(MarketDataError::ValidationFailed {
                message: format!("unknown range '{}'", other),
            }),
        }
    }
}

impl Serialize for HistoryRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One daily OHLCV bar.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoricalBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// Daily series for a symbol, ordered by date ascending.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceHistory {
    pub symbol: Symbol,
    pub range: HistoryRange,
    pub currency: Currency,
    pub provider: ProviderId,
    pub bars: Vec<HistoricalBar>,
}

impl PriceHistory {
    /// Build a series, sorting bars and dropping any with a negative close.
    pub fn new(
        symbol: Symbol,
        range: HistoryRange,
        currency: Currency,
        provider: ProviderId,
        mut bars: Vec<HistoricalBar>,
    ) -> Self {
        bars.retain(|bar| !bar.close.is_sign_negative());
        bars.sort_by_key(|bar| bar.date);
        Self {
            symbol,
            range,
            currency,
            provider,
            bars,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
