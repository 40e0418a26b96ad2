// src/services/provider.rs
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::FetchError;
use crate::models::{EquitySnapshot, MacroSeries};

/// Equity price history and company fundamentals.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// One year of daily bars plus the company field map, as a single unit.
    async fn fetch_snapshot(&self, ticker: &str) -> Result<EquitySnapshot, FetchError>;
}

/// Named economic time series.
#[async_trait]
pub trait MacroDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_series(&self, series_id: &str, start: NaiveDate)
        -> Result<MacroSeries, FetchError>;
}
