// src/services/mod.rs
use std::sync::Arc;

use crate::config::Config;

pub mod cache;
pub mod deep_dive;
pub mod equity;
pub mod fred;
pub mod macro_data;
pub mod provider;
pub mod valuation;
pub mod yahoo;

use equity::EquityService;
use fred::FredClient;
use macro_data::MacroService;
use provider::{MacroDataProvider, MarketDataProvider};
use yahoo::YahooClient;

/// Session-scoped services shared by every route. Owns both caches.
pub struct Dashboard {
    pub equity: EquityService,
    pub macro_data: MacroService,
}

impl Dashboard {
    pub fn new(market: Arc<dyn MarketDataProvider>, macro_provider: Arc<dyn MacroDataProvider>) -> Self {
        Dashboard {
            equity: EquityService::new(market),
            macro_data: MacroService::new(macro_provider),
        }
    }

    /// Yahoo for equities, FRED for macro series.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let market = Arc::new(YahooClient::new(
            &config.yahoo_base_url,
            &config.yahoo_cookie_url,
        )?);
        let fred = Arc::new(FredClient::new(
            config.fred_api_key.clone(),
            &config.fred_base_url,
        )?);
        Ok(Self::new(market, fred))
    }
}
