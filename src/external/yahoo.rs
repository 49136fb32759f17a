use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::FetcherConfig;
use crate::external::price_provider::{ChartSeries, PriceHistoryProvider, PriceProviderError};

const LAST_SECOND_OF_DAY: i64 = 86_399;

/// Yahoo Finance v8 chart client.
///
/// No API key is needed, but requests without browser-like headers are
/// regularly rejected, so every request carries them.
pub struct YahooChartProvider {
    client: reqwest::Client,
    config: FetcherConfig,
}

impl YahooChartProvider {
    pub fn new(config: FetcherConfig) -> Result<Self, PriceProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json,text/html;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9,pt-BR;q=0.8,pt;q=0.7"),
        );
        headers.insert(REFERER, HeaderValue::from_static("https://finance.yahoo.com"));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            vendor_ticker(symbol, &self.config.symbol_suffix)
        )
    }
}

/// Appends the market suffix unless the symbol already carries it.
pub fn vendor_ticker(symbol: &str, suffix: &str) -> String {
    if symbol.ends_with(suffix) {
        symbol.to_string()
    } else {
        format!("{symbol}{suffix}")
    }
}

/// Requested time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartWindow {
    /// Everything the vendor has.
    Max,
    Period {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl ChartWindow {
    /// Start is moved to the first instant of its day and the end is the last
    /// instant of today. A start after the end (watermark in the future) is
    /// replaced by the start of today.
    pub fn resolve(symbol: &str, start: Option<NaiveDate>, now: DateTime<Utc>) -> Self {
        let Some(start) = start else {
            return ChartWindow::Max;
        };

        let today = start_of_day(now.date_naive());
        let end = today + Duration::seconds(LAST_SECOND_OF_DAY);
        let mut start = start_of_day(start);

        if start > end {
            warn!(
                "Start {} for {} is after {}, falling back to {}",
                start, symbol, end, today
            );
            start = today;
        }

        ChartWindow::Period { start, end }
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        match self {
            ChartWindow::Max => vec![("range", "max".to_string())],
            ChartWindow::Period { start, end } => vec![
                ("period1", start.timestamp().to_string()),
                ("period2", end.timestamp().to_string()),
            ],
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    meta: Option<YahooMeta>,
    // Absent when the window holds no sessions.
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    symbol: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

/// Turns a chart response body into a series.
///
/// Unknown symbols come back as 404 with a JSON error descriptor, so the body
/// is inspected before the status code.
pub fn parse_chart_response(
    symbol: &str,
    status: StatusCode,
    body: &str,
) -> Result<ChartSeries, PriceProviderError> {
    let parsed: YahooChartResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) if !status.is_success() => {
            return Err(PriceProviderError::BadResponse(format!("HTTP {}", status)));
        }
        Err(e) => return Err(PriceProviderError::Parse(e.to_string())),
    };

    if let Some(error) = parsed.chart.error {
        let description = if error.description.is_empty() {
            error.code.unwrap_or_else(|| "unknown error".to_string())
        } else {
            error.description
        };
        return Err(PriceProviderError::Vendor(description));
    }

    let result = parsed
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| PriceProviderError::BadResponse("No results in response".into()))?;

    let name = result
        .meta
        .and_then(|m| m.long_name.or(m.short_name).or(m.symbol))
        .unwrap_or_else(|| symbol.to_string());

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    Ok(ChartSeries {
        name,
        timestamps: result.timestamp,
        open: quote.open,
        high: quote.high,
        low: quote.low,
        close: quote.close,
        volume: quote.volume,
    })
}

#[async_trait]
impl PriceHistoryProvider for YahooChartProvider {
    async fn fetch_history(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
    ) -> Result<ChartSeries, PriceProviderError> {
        tokio::time::sleep(self.config.request_delay).await;

        let window = ChartWindow::resolve(symbol, start, Utc::now());
        let url = self.chart_url(symbol);
        debug!("GET {} {:?}", url, window);

        let resp = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("events", "history")])
            .query(&window.query_params())
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        // Read as text: a 404 still carries the JSON error descriptor.
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        parse_chart_response(symbol, status, &body)
    }
}
