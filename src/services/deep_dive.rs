// src/services/deep_dive.rs
use serde::Serialize;

use crate::models::{EquitySnapshot, PriceHistory};

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundamentalMetrics {
    pub pe_ratio: String,
    pub return_on_equity: String,
    pub debt_to_equity: String,
}

/// Everything the "Ticker Deep Dive" tab shows for one company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepDive {
    pub ticker: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub sector: String,
    pub industry: String,
    pub website: String,
    pub summary: String,
    pub metrics: FundamentalMetrics,
    pub candles: PriceHistory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_warning: Option<String>,
}

/// Shapes a snapshot into the deep dive, or `None` when the provider gave
/// us nothing that identifies the company.
pub fn build_deep_dive(ticker: &str, snapshot: &EquitySnapshot) -> Option<DeepDive> {
    let info = &snapshot.info;
    let name = info.text("longName")?.to_string();
    let text_or_na = |field: &str| info.text(field).unwrap_or(NOT_AVAILABLE).to_string();

    let metrics = FundamentalMetrics {
        pe_ratio: format_metric(info.nonzero_number("trailingPE"), 1.0, ""),
        return_on_equity: format_metric(info.nonzero_number("returnOnEquity"), 100.0, "%"),
        debt_to_equity: format_metric(info.nonzero_number("debtToEquity"), 1.0, ""),
    };

    let history_warning = snapshot
        .history
        .is_empty()
        .then(|| "No price history found.".to_string());

    Some(DeepDive {
        ticker: ticker.to_string(),
        name,
        logo_url: info.text("logo_url").map(str::to_string),
        sector: text_or_na("sector"),
        industry: text_or_na("industry"),
        website: text_or_na("website"),
        summary: info
            .text("longBusinessSummary")
            .unwrap_or("No summary available.")
            .to_string(),
        metrics,
        candles: snapshot.history.clone(),
        history_warning,
    })
}

fn format_metric(value: Option<f64>, scale: f64, suffix: &str) -> String {
    match value {
        Some(v) => format!("{:.2}{}", v * scale, suffix),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn unavailable_message(ticker: &str) -> String {
    format!(
        "Could not retrieve data for {}. The ticker might be invalid or delisted.",
        ticker
    )
}
