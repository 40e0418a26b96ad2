// src/config.rs
use chrono::{Duration, NaiveDate};
use log::{info, warn};
use std::env;

/// The "Magnificent 7".
pub const WATCHLIST: [&str; 7] = ["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "TSLA", "META"];

pub const PAGE_TITLE: &str = "US Tech & AI Sector Investment Dashboard";

pub const ANALYST_NOTE: &str = "While high-growth tech (e.g., NVDA) continues to dominate headlines, \
the current high interest rate environment (see Macro tab) historically compresses valuations \
for \"long-duration\" assets. This dashboard analyses which 'Magnificent 7' stocks are priced \
for perfection vs. which may offer more reasonable risk-adjusted returns based on \
P/E-to-Growth and ROE.";

/// 10-Year Treasury constant maturity yield.
pub const YIELD_SERIES_ID: &str = "DGS10";
/// CPI for all urban consumers, seasonally adjusted.
pub const INFLATION_SERIES_ID: &str = "CPIAUCSL";

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_YAHOO_COOKIE_URL: &str = "https://fc.yahoo.com";
pub const DEFAULT_FRED_BASE_URL: &str = "https://api.stlouisfed.org";

/// Both macro series start here so they share one time axis.
pub fn macro_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or_default()
}

pub fn snapshot_ttl() -> Duration {
    Duration::hours(1)
}

pub fn macro_ttl() -> Duration {
    Duration::hours(6)
}

/// Case-insensitive watchlist lookup returning the canonical symbol.
pub fn watchlist_symbol(symbol: &str) -> Option<&'static str> {
    WATCHLIST
        .iter()
        .copied()
        .find(|ticker| ticker.eq_ignore_ascii_case(symbol.trim()))
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub fred_api_key: Option<String>,
    pub yahoo_base_url: String,
    pub yahoo_cookie_url: String,
    pub fred_base_url: String,
}

impl Config {
    /// Reads the process environment. Call `dotenv().ok()` first to pick up a `.env` file.
    pub fn from_env() -> anyhow::Result<Self> {
        // Get port from the environment, default to 3030
        let port = match env::var("PORT") {
            Ok(port_str) => port_str
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("PORT must be a number, got {:?}: {}", port_str, e))?,
            Err(_) => {
                warn!("$PORT not set, defaulting to 3030");
                3030
            }
        };

        let fred_api_key = env::var("FRED_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        if fred_api_key.is_none() {
            warn!("FRED_API_KEY not set; the macro view will report the data as unavailable");
        }

        let config = Config {
            port,
            fred_api_key,
            yahoo_base_url: env::var("YAHOO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_YAHOO_BASE_URL.to_string()),
            yahoo_cookie_url: env::var("YAHOO_COOKIE_URL")
                .unwrap_or_else(|_| DEFAULT_YAHOO_COOKIE_URL.to_string()),
            fred_base_url: env::var("FRED_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_FRED_BASE_URL.to_string()),
        };
        info!(
            "Configuration loaded: port={}, yahoo={}, fred={}",
            config.port, config.yahoo_base_url, config.fred_base_url
        );
        Ok(config)
    }
}
