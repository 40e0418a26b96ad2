// src/services/equity.rs
use chrono::Duration;
use log::{error, info};
use std::sync::Arc;

use crate::config::snapshot_ttl;
use crate::error::FetchError;
use crate::models::EquitySnapshot;
use crate::services::cache::TtlCache;
use crate::services::provider::MarketDataProvider;

/// Per-ticker snapshots served through a one-hour cache.
pub struct EquityService {
    provider: Arc<dyn MarketDataProvider>,
    cache: TtlCache<String, EquitySnapshot>,
    ttl: Duration,
}

impl EquityService {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self::with_cache(provider, TtlCache::new("snapshot"), snapshot_ttl())
    }

    pub fn with_cache(
        provider: Arc<dyn MarketDataProvider>,
        cache: TtlCache<String, EquitySnapshot>,
        ttl: Duration,
    ) -> Self {
        EquityService {
            provider,
            cache,
            ttl,
        }
    }

    /// Cached snapshot, or the reason it could not be fetched.
    pub async fn try_fetch_snapshot(&self, ticker: &str) -> Result<EquitySnapshot, FetchError> {
        let provider = self.provider.clone();
        self.cache
            .get_or_fetch(ticker.to_string(), self.ttl, || async move {
                let snapshot = provider.fetch_snapshot(ticker).await?;
                info!(
                    "Fetched {} from {}: {} bars, {} info fields",
                    ticker,
                    provider.name(),
                    snapshot.history.len(),
                    snapshot.info.len()
                );
                Ok(snapshot)
            })
            .await
    }

    /// Cached snapshot; empty history and info when the provider fails.
    pub async fn fetch_snapshot(&self, ticker: &str) -> EquitySnapshot {
        match self.try_fetch_snapshot(ticker).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Error fetching data for {}: {}", ticker, e);
                EquitySnapshot::default()
            }
        }
    }
}
