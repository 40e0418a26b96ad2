// src/services/macro_data.rs
use chrono::{Duration, NaiveDate};
use log::{error, info};
use std::sync::Arc;

use crate::config::{macro_start_date, macro_ttl, INFLATION_SERIES_ID, YIELD_SERIES_ID};
use crate::error::FetchError;
use crate::models::{MacroBundle, MacroSeries};
use crate::services::cache::TtlCache;
use crate::services::provider::MacroDataProvider;

const BUNDLE_KEY: &str = "macro";

/// Yield series then inflation series.
pub type MacroPair = (MacroSeries, MacroSeries);

/// Yield and inflation series, fetched and cached as one bundle.
pub struct MacroService {
    provider: Arc<dyn MacroDataProvider>,
    cache: TtlCache<&'static str, MacroPair>,
    ttl: Duration,
    start: NaiveDate,
}

impl MacroService {
    pub fn new(provider: Arc<dyn MacroDataProvider>) -> Self {
        Self::with_cache(provider, TtlCache::new("macro"), macro_ttl())
    }

    pub fn with_cache(
        provider: Arc<dyn MacroDataProvider>,
        cache: TtlCache<&'static str, MacroPair>,
        ttl: Duration,
    ) -> Self {
        MacroService {
            provider,
            cache,
            ttl,
            start: macro_start_date(),
        }
    }

    /// Both series or the first failure. Never a half-filled bundle.
    pub async fn try_fetch_macro(&self) -> Result<MacroPair, FetchError> {
        let provider = self.provider.clone();
        let start = self.start;
        self.cache
            .get_or_fetch(BUNDLE_KEY, self.ttl, || async move {
                let yield_series = provider.fetch_series(YIELD_SERIES_ID, start).await?;
                let inflation_series = provider.fetch_series(INFLATION_SERIES_ID, start).await?;
                info!(
                    "Fetched macro bundle from {}: {} {} points, {} {} points",
                    provider.name(),
                    YIELD_SERIES_ID,
                    yield_series.observations.len(),
                    INFLATION_SERIES_ID,
                    inflation_series.observations.len()
                );
                Ok((yield_series, inflation_series))
            })
            .await
    }

    /// Bundle of both series; the empty sentinel if either fetch fails.
    pub async fn fetch_macro(&self) -> MacroBundle {
        match self.try_fetch_macro().await {
            Ok((yield_series, inflation_series)) => MacroBundle::new(yield_series, inflation_series),
            Err(e) => {
                error!("Error fetching FRED data: {}", e);
                MacroBundle::empty()
            }
        }
    }
}
