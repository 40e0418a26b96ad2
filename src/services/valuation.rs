// src/services/valuation.rs
use log::{debug, info};
use serde::Serialize;

use crate::models::{CompanyInfo, ValuationRow};
use crate::services::equity::EquityService;

pub const PE_FIELD: &str = "trailingPE";
pub const GROWTH_FIELD: &str = "revenueGrowth";

/// Reported once per ticker while the table is being built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationProgress {
    pub completed: usize,
    pub total: usize,
    pub ticker: String,
}

impl ValuationProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// P/E and growth for one ticker, if both are usable.
///
/// A missing, zero or non-finite value skips the ticker; growth is
/// converted from a fraction to a percentage.
pub fn valuation_row(ticker: &str, info: &CompanyInfo) -> Option<ValuationRow> {
    let pe = info.nonzero_number(PE_FIELD)?;
    let growth = info.nonzero_number(GROWTH_FIELD)?;
    Some(ValuationRow {
        ticker: ticker.to_string(),
        pe,
        growth_pct: growth * 100.0,
    })
}

/// Walks `tickers` in order and keeps those with valid P/E and growth.
/// Rows come back in input order.
pub async fn build_valuation_table<S, F>(
    equity: &EquityService,
    tickers: &[S],
    mut on_progress: F,
) -> Vec<ValuationRow>
where
    S: AsRef<str>,
    F: FnMut(&ValuationProgress),
{
    let total = tickers.len();
    let mut rows = Vec::with_capacity(total);

    for (i, ticker) in tickers.iter().enumerate() {
        let ticker = ticker.as_ref();
        let snapshot = equity.fetch_snapshot(ticker).await;

        match valuation_row(ticker, &snapshot.info) {
            Some(row) => rows.push(row),
            None => debug!("Skipping {}: no usable {} / {}", ticker, PE_FIELD, GROWTH_FIELD),
        }

        on_progress(&ValuationProgress {
            completed: i + 1,
            total,
            ticker: ticker.to_string(),
        });
    }

    info!("Valuation table built: {} of {} tickers usable", rows.len(), total);
    rows
}
