// src/services/yahoo.rs
use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use log::{debug, error, info, warn};
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use urlencoding::encode;

use crate::error::FetchError;
use crate::models::{CompanyInfo, EquitySnapshot, InfoValue, PriceBar, PriceHistory};
use crate::services::provider::MarketDataProvider;

const PROVIDER: &str = "yahoo";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const SUMMARY_MODULES: &str = "assetProfile,summaryDetail,financialData,defaultKeyStatistics,price";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    result: Option<Vec<serde_json::Map<String, Value>>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Clone)]
struct Crumb {
    cookie: String,
    value: String,
}

/// Yahoo Finance client: chart endpoint for bars, quoteSummary for fundamentals.
pub struct YahooClient {
    client: Client,
    base_url: String,
    cookie_url: String,
    crumb: Mutex<Option<Crumb>>,
}

impl YahooClient {
    pub fn new(base_url: &str, cookie_url: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                error!("Failed to build Yahoo HTTP client: {}", e);
                FetchError::from(e)
            })?;
        Ok(YahooClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_url: cookie_url.to_string(),
            crumb: Mutex::new(None),
        })
    }

    pub async fn fetch_history(&self, ticker: &str) -> Result<PriceHistory, FetchError> {
        let url = format!(
            "{}/v8/finance/chart/{}?range=1y&interval=1d&includePrePost=false",
            self.base_url,
            encode(ticker)
        );
        info!("Fetching 1y daily history for {}", ticker);

        let response = self.client.get(&url).send().await?;
        let response = self.check_status(response, ticker).await?;
        let body: Value = response.json().await?;
        parse_chart(ticker, body)
    }

    pub async fn fetch_info(&self, ticker: &str) -> Result<CompanyInfo, FetchError> {
        let crumb = self.ensure_crumb().await?;
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules={}&crumb={}",
            self.base_url,
            encode(ticker),
            SUMMARY_MODULES,
            encode(&crumb.value)
        );
        info!("Fetching company profile for {}", ticker);

        let response = self
            .client
            .get(&url)
            .header(header::COOKIE, &crumb.cookie)
            .send()
            .await?;
        let response = self.check_status(response, ticker).await?;
        let body: Value = response.json().await?;
        parse_quote_summary(ticker, body)
    }

    async fn check_status(&self, response: Response, ticker: &str) -> Result<Response, FetchError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(FetchError::UnknownSymbol(ticker.to_string())),
            StatusCode::UNAUTHORIZED => {
                warn!("Yahoo rejected the crumb, clearing it");
                *self.crumb.lock().await = None;
                Err(FetchError::unavailable(PROVIDER, "authentication expired"))
            }
            status => Err(FetchError::unavailable(
                PROVIDER,
                format!("HTTP {} for {}", status, ticker),
            )),
        }
    }

    async fn ensure_crumb(&self) -> Result<Crumb, FetchError> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        debug!("Requesting Yahoo cookie from {}", self.cookie_url);
        let response = self.client.get(&self.cookie_url).send().await?;
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(';').next())
            .map(|s| s.to_string())
            .ok_or_else(|| FetchError::unavailable(PROVIDER, "no cookie in response"))?;

        let value = self
            .client
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .header(header::COOKIE, &cookie)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        if value.trim().is_empty() {
            return Err(FetchError::unavailable(PROVIDER, "empty crumb"));
        }

        let crumb = Crumb {
            cookie,
            value: value.trim().to_string(),
        };
        *guard = Some(crumb.clone());
        Ok(crumb)
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_snapshot(&self, ticker: &str) -> Result<EquitySnapshot, FetchError> {
        let history = self.fetch_history(ticker).await?;
        let info = self.fetch_info(ticker).await?;
        Ok(EquitySnapshot { history, info })
    }
}

fn malformed(what: &str, err: impl std::fmt::Display) -> FetchError {
    FetchError::unavailable(PROVIDER, format!("malformed {} response: {}", what, err))
}

fn yahoo_error(ticker: &str, err: YahooError) -> FetchError {
    if err.code.eq_ignore_ascii_case("not found") {
        FetchError::UnknownSymbol(ticker.to_string())
    } else {
        FetchError::unavailable(PROVIDER, format!("{}: {}", err.code, err.description.unwrap_or_default()))
    }
}

/// Turns a chart payload into daily bars dated in the exchange's own time zone.
fn parse_chart(ticker: &str, body: Value) -> Result<PriceHistory, FetchError> {
    let response: ChartResponse = serde_json::from_value(body).map_err(|e| malformed("chart", e))?;
    if let Some(err) = response.chart.error {
        return Err(yahoo_error(ticker, err));
    }
    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::UnknownSymbol(ticker.to_string()))?;

    let to_date = exchange_date_fn(&result.meta);
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut history = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let field = |series: &Vec<Option<f64>>| series.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        ) else {
            continue;
        };
        let Some(date) = to_date(*ts) else {
            continue;
        };
        history.push(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }
    history.sort_by_key(|bar| bar.date);
    debug!("Parsed {} bars for {}", history.len(), ticker);
    Ok(history)
}

fn exchange_date_fn(meta: &ChartMeta) -> Box<dyn Fn(i64) -> Option<NaiveDate>> {
    if let Some(tz) = meta
        .exchange_timezone_name
        .as_deref()
        .and_then(|name| name.parse::<Tz>().ok())
    {
        return Box::new(move |ts| {
            Utc.timestamp_opt(ts, 0)
                .single()
                .map(|dt| dt.with_timezone(&tz).date_naive())
        });
    }
    let offset = FixedOffset::east_opt(meta.gmtoffset).unwrap_or(Utc.fix());
    Box::new(move |ts| {
        Utc.timestamp_opt(ts, 0)
            .single()
            .map(|dt| dt.with_timezone(&offset).date_naive())
    })
}

/// Flattens the quoteSummary modules into one field map, the shape
/// `yfinance`'s `Ticker.info` exposes.
fn parse_quote_summary(ticker: &str, body: Value) -> Result<CompanyInfo, FetchError> {
    let response: QuoteSummaryResponse =
        serde_json::from_value(body).map_err(|e| malformed("quoteSummary", e))?;
    if let Some(err) = response.quote_summary.error {
        return Err(yahoo_error(ticker, err));
    }
    let modules = response
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::UnknownSymbol(ticker.to_string()))?;

    let mut info = CompanyInfo::new();
    for module in modules.values() {
        let Some(fields) = module.as_object() else {
            continue;
        };
        for (name, value) in fields {
            if name == "maxAge" || info.get(name).is_some() {
                continue;
            }
            if let Some(scalar) = scalar_value(value) {
                info.insert(name.clone(), scalar);
            }
        }
    }
    Ok(info)
}

fn scalar_value(value: &Value) -> Option<InfoValue> {
    match value {
        Value::Number(n) => n.as_f64().map(InfoValue::Number),
        Value::String(s) => Some(InfoValue::Text(s.clone())),
        Value::Bool(b) => Some(InfoValue::Flag(*b)),
        // {"raw": 28.5, "fmt": "28.50"}; `{}` means no data
        Value::Object(obj) => obj.get("raw").and_then(Value::as_f64).map(InfoValue::Number),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn chart_bars_use_exchange_dates_and_skip_gaps() {
        // 2024-01-02 14:30 UTC and 2024-01-03 14:30 UTC, plus a null bar
        let body = json!({
            "chart": {
                "result": [{
                    "meta": { "exchangeTimezoneName": "America/New_York", "gmtoffset": -18000 },
                    "timestamp": [1704205800, 1704292200, 1704378600],
                    "indicators": { "quote": [{
                        "open":   [187.15, 184.22, null],
                        "high":   [188.44, 185.88, null],
                        "low":    [183.89, 183.43, null],
                        "close":  [185.64, 184.25, null],
                        "volume": [82488700, 58414500, null]
                    }]}
                }],
                "error": null
            }
        });

        let bars = parse_chart("AAPL", body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].close, 185.64);
        assert_eq!(bars[1].volume, 58414500);
    }

    #[test]
    fn chart_falls_back_to_gmt_offset() {
        // 2024-01-02 03:00 UTC is still Jan 1 at UTC-5
        let body = json!({
            "chart": {
                "result": [{
                    "meta": { "gmtoffset": -18000 },
                    "timestamp": [1704164400],
                    "indicators": { "quote": [{
                        "open": [1.0], "high": [2.0], "low": [0.5], "close": [1.5], "volume": [10]
                    }]}
                }],
                "error": null
            }
        });
        let bars = parse_chart("X", body).unwrap();
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn chart_not_found_is_unknown_symbol() {
        let body = json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        });
        assert_eq!(
            parse_chart("ZZZZ", body),
            Err(FetchError::UnknownSymbol("ZZZZ".into()))
        );
    }

    #[test]
    fn chart_garbage_is_provider_unavailable() {
        let err = parse_chart("AAPL", json!({ "unexpected": true })).unwrap_err();
        assert!(matches!(err, FetchError::ProviderUnavailable { .. }));
    }

    #[test]
    fn quote_summary_is_flattened() {
        let body = json!({
            "quoteSummary": {
                "result": [{
                    "assetProfile": {
                        "sector": "Technology",
                        "industry": "Consumer Electronics",
                        "website": "https://www.apple.com",
                        "longBusinessSummary": "Apple Inc. designs...",
                        "fullTimeEmployees": 161000,
                        "companyOfficers": [{ "name": "Tim Cook" }],
                        "maxAge": 86400
                    },
                    "summaryDetail": {
                        "trailingPE": { "raw": 28.5, "fmt": "28.50" },
                        "dividendYield": {}
                    },
                    "financialData": {
                        "revenueGrowth": { "raw": 0.061, "fmt": "6.10%" },
                        "returnOnEquity": { "raw": 1.5, "fmt": "150.00%" },
                        "debtToEquity": { "raw": 181.3, "fmt": "181.30%" }
                    },
                    "price": { "longName": "Apple Inc.", "currency": "USD" }
                }],
                "error": null
            }
        });

        let info = parse_quote_summary("AAPL", body).unwrap();
        assert_eq!(info.number("trailingPE"), Some(28.5));
        assert_eq!(info.number("revenueGrowth"), Some(0.061));
        assert_eq!(info.number("fullTimeEmployees"), Some(161000.0));
        assert_eq!(info.text("longName"), Some("Apple Inc."));
        assert_eq!(info.text("sector"), Some("Technology"));
        assert!(info.get("dividendYield").is_none());
        assert!(info.get("companyOfficers").is_none());
        assert!(info.get("maxAge").is_none());
    }

    #[test]
    fn quote_summary_not_found_is_unknown_symbol() {
        let body = json!({
            "quoteSummary": {
                "result": null,
                "error": { "code": "Not Found", "description": "Quote not found for ticker symbol: ZZZZ" }
            }
        });
        assert_eq!(
            parse_quote_summary("ZZZZ", body),
            Err(FetchError::UnknownSymbol("ZZZZ".into()))
        );
    }

    fn chart_body() -> String {
        json!({
            "chart": {
                "result": [{
                    "meta": { "exchangeTimezoneName": "America/New_York", "gmtoffset": -18000 },
                    "timestamp": [1704205800],
                    "indicators": { "quote": [{
                        "open": [187.15], "high": [188.44], "low": [183.89],
                        "close": [185.64], "volume": [82488700]
                    }]}
                }],
                "error": null
            }
        })
        .to_string()
    }

    fn summary_body() -> String {
        json!({
            "quoteSummary": {
                "result": [{
                    "summaryDetail": { "trailingPE": { "raw": 28.5, "fmt": "28.50" } },
                    "price": { "longName": "Apple Inc." }
                }],
                "error": null
            }
        })
        .to_string()
    }

    async fn mock_cookie(server: &mut mockito::ServerGuard, hits: usize) -> mockito::Mock {
        // fc.yahoo.com answers 404 but still sets the session cookie
        server
            .mock("GET", "/cookie")
            .with_status(404)
            .with_header("set-cookie", "A3=abc; Max-Age=31557600; Domain=.yahoo.com; Path=/")
            .expect(hits)
            .create_async()
            .await
    }

    async fn mock_crumb(server: &mut mockito::ServerGuard, hits: usize) -> mockito::Mock {
        server
            .mock("GET", "/v1/test/getcrumb")
            .match_header("cookie", "A3=abc")
            .with_body("crumb1\n")
            .expect(hits)
            .create_async()
            .await
    }

    fn client_for(server: &mockito::ServerGuard) -> YahooClient {
        YahooClient::new(&server.url(), &format!("{}/cookie", server.url())).unwrap()
    }

    #[tokio::test]
    async fn snapshot_runs_the_cookie_and_crumb_flow_once() {
        let mut server = mockito::Server::new_async().await;
        let cookie = mock_cookie(&mut server, 1).await;
        let crumb = mock_crumb(&mut server, 1).await;
        let chart = server
            .mock("GET", "/v8/finance/chart/AAPL")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("range".into(), "1y".into()),
                Matcher::UrlEncoded("interval".into(), "1d".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(chart_body())
            .expect(2)
            .create_async()
            .await;
        let summary = server
            .mock("GET", "/v10/finance/quoteSummary/AAPL")
            .match_query(Matcher::UrlEncoded("crumb".into(), "crumb1".into()))
            .match_header("cookie", "A3=abc")
            .with_header("content-type", "application/json")
            .with_body(summary_body())
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server);
        let snapshot = client.fetch_snapshot("AAPL").await.unwrap();
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.history[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(snapshot.info.number("trailingPE"), Some(28.5));
        assert_eq!(snapshot.info.text("longName"), Some("Apple Inc."));

        // The crumb is reused for the next snapshot.
        client.fetch_snapshot("AAPL").await.unwrap();

        cookie.assert_async().await;
        crumb.assert_async().await;
        chart.assert_async().await;
        summary.assert_async().await;
    }

    #[tokio::test]
    async fn chart_404_is_unknown_symbol() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v8/finance/chart/ZZZZ")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "chart": {
                        "result": null,
                        "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(
            client.fetch_snapshot("ZZZZ").await,
            Err(FetchError::UnknownSymbol("ZZZZ".into()))
        );
    }

    #[tokio::test]
    async fn chart_not_found_body_with_200_is_unknown_symbol() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v8/finance/chart/ZZZZ")
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "chart": { "result": null, "error": { "code": "Not Found", "description": null } }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(
            client.fetch_history("ZZZZ").await,
            Err(FetchError::UnknownSymbol("ZZZZ".into()))
        );
    }

    #[tokio::test]
    async fn server_error_is_provider_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v8/finance/chart/MSFT")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.fetch_history("MSFT").await.unwrap_err();
        assert!(matches!(err, FetchError::ProviderUnavailable { provider: "yahoo", .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn unauthorized_clears_the_crumb_so_the_next_call_requests_a_new_one() {
        let mut server = mockito::Server::new_async().await;
        let cookie = mock_cookie(&mut server, 2).await;
        let crumb = mock_crumb(&mut server, 2).await;
        let summary = server
            .mock("GET", "/v10/finance/quoteSummary/AAPL")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"finance":{"result":null,"error":{"code":"Unauthorized","description":"Invalid Crumb"}}}"#)
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server);
        for _ in 0..2 {
            let err = client.fetch_info("AAPL").await.unwrap_err();
            assert_eq!(err, FetchError::unavailable(PROVIDER, "authentication expired"));
        }

        cookie.assert_async().await;
        crumb.assert_async().await;
        summary.assert_async().await;
    }

    #[tokio::test]
    async fn missing_cookie_is_provider_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/cookie").with_status(404).create_async().await;

        let client = client_for(&server);
        let err = client.fetch_info("AAPL").await.unwrap_err();
        assert!(err.to_string().contains("no cookie"));
    }
}
