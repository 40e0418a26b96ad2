// src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One daily OHLC bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

pub type PriceHistory = Vec<PriceBar>;

/// A scalar field from the provider's company profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InfoValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

/// Sparse field map describing one company. Every lookup is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyInfo {
    fields: BTreeMap<String, InfoValue>,
}

impl CompanyInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: InfoValue) {
        self.fields.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&InfoValue> {
        self.fields.get(field)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        match self.fields.get(field) {
            Some(InfoValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Number that is present, finite and non-zero.
    pub fn nonzero_number(&self, field: &str) -> Option<f64> {
        self.number(field).filter(|n| n.is_finite() && *n != 0.0)
    }

    /// Text that is present and not blank.
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(InfoValue::Text(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, InfoValue)> for CompanyInfo {
    fn from_iter<I: IntoIterator<Item = (K, InfoValue)>>(iter: I) -> Self {
        CompanyInfo {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Price history and company info for one ticker, always fetched together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquitySnapshot {
    pub history: PriceHistory,
    pub info: CompanyInfo,
}

impl EquitySnapshot {
    pub fn is_empty(&self) -> bool {
        self.history.is_empty() && self.info.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroSeries {
    pub series_id: String,
    pub observations: Vec<Observation>,
}

/// The yield and inflation series, fetched as one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_series: Option<MacroSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_series: Option<MacroSeries>,
}

impl MacroBundle {
    pub fn new(yield_series: MacroSeries, inflation_series: MacroSeries) -> Self {
        MacroBundle {
            yield_series: Some(yield_series),
            inflation_series: Some(inflation_series),
        }
    }

    /// The "nothing fetched" sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.yield_series.is_none() || self.inflation_series.is_none()
    }
}

/// One point of the P/E vs. revenue growth scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRow {
    pub ticker: String,
    pub pe: f64,
    pub growth_pct: f64,
}
