#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tech_alpha_monitor::error::FetchError;
use tech_alpha_monitor::models::{
    CompanyInfo, EquitySnapshot, InfoValue, MacroSeries, Observation, PriceBar,
};
use tech_alpha_monitor::services::provider::{MacroDataProvider, MarketDataProvider};

/// Market provider backed by canned snapshots; unknown tickers fail.
#[derive(Default)]
pub struct StubMarket {
    snapshots: HashMap<String, EquitySnapshot>,
    calls: Mutex<Vec<String>>,
    pub fail_everything: bool,
}

impl StubMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        StubMarket {
            fail_everything: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, ticker: &str, pe: Option<f64>, growth: Option<f64>) -> Self {
        self.snapshots
            .insert(ticker.to_string(), snapshot(ticker, pe, growth));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataProvider for StubMarket {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn fetch_snapshot(&self, ticker: &str) -> Result<EquitySnapshot, FetchError> {
        self.calls.lock().unwrap().push(ticker.to_string());
        if self.fail_everything {
            return Err(FetchError::unavailable("stub", "connection refused"));
        }
        self.snapshots
            .get(ticker)
            .cloned()
            .ok_or_else(|| FetchError::UnknownSymbol(ticker.to_string()))
    }
}

pub fn snapshot(ticker: &str, pe: Option<f64>, growth: Option<f64>) -> EquitySnapshot {
    let mut info = CompanyInfo::new();
    info.insert("longName", InfoValue::Text(format!("{} Inc.", ticker)));
    info.insert("sector", InfoValue::Text("Technology".into()));
    if let Some(pe) = pe {
        info.insert("trailingPE", InfoValue::Number(pe));
    }
    if let Some(growth) = growth {
        info.insert("revenueGrowth", InfoValue::Number(growth));
    }
    EquitySnapshot {
        history: vec![PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 99.0,
            close: 104.0,
            volume: 1_000_000,
        }],
        info,
    }
}

/// Macro provider where each series can be made to fail on its own.
#[derive(Default)]
pub struct StubMacro {
    pub failing_series: Vec<&'static str>,
    calls: AtomicUsize,
}

impl StubMacro {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(series: &[&'static str]) -> Self {
        StubMacro {
            failing_series: series.to_vec(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MacroDataProvider for StubMacro {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn fetch_series(
        &self,
        series_id: &str,
        start: NaiveDate,
    ) -> Result<MacroSeries, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_series.iter().any(|s| *s == series_id) {
            return Err(FetchError::unavailable("stub", "HTTP 500"));
        }
        Ok(MacroSeries {
            series_id: series_id.to_string(),
            observations: vec![
                Observation { date: start, value: 2.66 },
                Observation {
                    date: start.succ_opt().unwrap(),
                    value: 2.56,
                },
            ],
        })
    }
}
