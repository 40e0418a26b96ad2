// src/services/fred.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{error, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde_json::Value;

use crate::error::FetchError;
use crate::models::{MacroSeries, Observation};
use crate::services::provider::MacroDataProvider;

const PROVIDER: &str = "fred";

/// St. Louis Fed series observations endpoint.
pub struct FredClient {
    api_key: Option<String>,
    client: Client,
    base_url: String,
}

impl FredClient {
    pub fn new(api_key: Option<String>, base_url: &str) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("TechAlphaMonitor/0.1"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| {
                error!("Failed to build FRED HTTP client: {}", e);
                FetchError::from(e)
            })?;

        Ok(FredClient {
            api_key,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MacroDataProvider for FredClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_series(
        &self,
        series_id: &str,
        start: NaiveDate,
    ) -> Result<MacroSeries, FetchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| FetchError::unavailable(PROVIDER, "FRED API key is not configured"))?;

        if api_key.len() != 32 {
            // Never log the key itself.
            warn!("FRED API key length is {}, not 32; the request will likely fail", api_key.len());
        }

        info!("Fetching FRED series {} from {}", series_id, start);
        let start = start.format("%Y-%m-%d").to_string();
        let resp = self
            .client
            .get(format!("{}/fred/series/observations", self.base_url))
            .query(&[
                ("series_id", series_id),
                ("api_key", api_key),
                ("file_type", "json"),
                ("observation_start", start.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body: Value = resp.json().await.unwrap_or(Value::Null);
            let message = body["error_message"].as_str().unwrap_or("no error message");
            return Err(FetchError::unavailable(
                PROVIDER,
                format!("HTTP {} for {}: {}", status, series_id, message),
            ));
        }

        let json: Value = resp.json().await?;
        let observations = parse_observations(&json)?;
        if observations.is_empty() {
            return Err(FetchError::EmptySeries(series_id.to_string()));
        }

        Ok(MacroSeries {
            series_id: series_id.to_string(),
            observations,
        })
    }
}

fn parse_observations(json: &Value) -> Result<Vec<Observation>, FetchError> {
    let observations = json["observations"]
        .as_array()
        .ok_or_else(|| FetchError::unavailable(PROVIDER, "no observations in response"))?;

    let mut points = Vec::with_capacity(observations.len());
    for obs in observations {
        // "date": "2023-01-01", "value": "123.45"; FRED sends "." for a missing value
        let (Some(date_str), Some(value_str)) = (obs["date"].as_str(), obs["value"].as_str()) else {
            continue;
        };
        if value_str == "." {
            continue;
        }
        let (Ok(date), Ok(value)) = (
            NaiveDate::parse_from_str(date_str, "%Y-%m-%d"),
            value_str.parse::<f64>(),
        ) else {
            continue;
        };
        points.push(Observation { date, value });
    }
    points.sort_by_key(|p| p.date);
    Ok(points)
}
