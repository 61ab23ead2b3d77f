use crate::config;
use crate::error::AnalyzerError;
use crate::models::PriceBar;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::Retry;
use tracing::debug;

/// Intraday bars from the Yahoo v8 chart API
pub struct YahooClient {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

/// Column-major OHLCV, null where the minute had no trade
#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl YahooClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(config::USER_AGENT)
            .timeout(config::HTTP_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// Today's one-minute bars for `ticker`, in exchange time
    pub async fn fetch_intraday_bars(&self, ticker: &str) -> Result<Vec<PriceBar>> {
        let url = config::yahoo_chart_url(ticker);

        let backoff = ExponentialBackoff::from_millis(config::RETRY_BASE_DELAY_MS)
            .factor(config::RETRY_FACTOR)
            .max_delay(Duration::from_secs(config::RETRY_MAX_DELAY_SECS))
            .take(config::RETRY_MAX_ATTEMPTS);

        let text = Retry::spawn(backoff, || async {
            let res = self
                .client
                .get(&url)
                .send()
                .await
                .context("Request send failed")?;

            let status = res.status();
            debug!(url = %url, status = status.as_u16(), "Yahoo response");

            if status.is_success() {
                res.text().await.context("Failed to read body")
            } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                anyhow::bail!("Retryable error: {}", status)
            } else {
                anyhow::bail!("Yahoo API returned {} for {}", status, ticker)
            }
        })
        .await?;

        let bars = parse_chart(&text).with_context(|| format!("Failed to parse chart for {}", ticker))?;
        Ok(bars)
    }
}

/// Turn a chart response body into chronological bars.
///
/// Rows with any null field are dropped.
pub fn parse_chart(text: &str) -> Result<Vec<PriceBar>, AnalyzerError> {
    let response: ChartResponse = serde_json::from_str(text)?;

    if let Some(err) = response.chart.error {
        if !err.is_null() {
            return Err(AnalyzerError::Parse(format!("Yahoo error: {}", err)));
        }
    }

    let data = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| AnalyzerError::Parse("No chart results".to_string()))?;

    let offset_secs = data.meta.gmtoffset.unwrap_or(config::IST_OFFSET_SECS);
    let offset = FixedOffset::east_opt(offset_secs)
        .ok_or_else(|| AnalyzerError::Parse(format!("Invalid gmtoffset {}", offset_secs)))?;

    let Some(columns) = data.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut bars: Vec<PriceBar> = data
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let at = |col: &Vec<Option<f64>>| col.get(i).copied().flatten();
            Some(PriceBar {
                timestamp: DateTime::from_timestamp(ts, 0)?.with_timezone(&offset),
                open: at(&columns.open)?,
                high: at(&columns.high)?,
                low: at(&columns.low)?,
                close: at(&columns.close)?,
                volume: at(&columns.volume).unwrap_or(0.0),
            })
        })
        .collect();

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_chart_converts_to_ist_and_drops_nulls() {
        // 2024-03-28 03:45:00 UTC == 09:15 IST
        let body = r#"{
            "chart": {
                "result": [{
                    "meta": { "symbol": "NIFTYBEES.NS", "gmtoffset": 19800 },
                    "timestamp": [1711597500, 1711597560, 1711597620],
                    "indicators": { "quote": [{
                        "open":   [250.1, null, 250.4],
                        "high":   [250.3, 250.5, 250.6],
                        "low":    [250.0, 250.2, 250.3],
                        "close":  [250.2, 250.4, 250.5],
                        "volume": [1200, 800, null]
                    }]}
                }],
                "error": null
            }
        }"#;

        let bars = parse_chart(body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp.hour(), 9);
        assert_eq!(bars[0].timestamp.minute(), 15);
        assert_eq!(bars[0].open, 250.1);
        assert_eq!(bars[1].timestamp.minute(), 17);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn test_parse_chart_error_payload() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found"}}}"#;
        assert!(matches!(parse_chart(body), Err(AnalyzerError::Parse(_))));
    }

    #[test]
    fn test_parse_chart_without_rows() {
        let body = r#"{"chart": {"result": [{"meta": {}, "indicators": {"quote": []}}], "error": null}}"#;
        assert!(parse_chart(body).unwrap().is_empty());
    }
}
