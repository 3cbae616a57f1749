//! Yahoo Finance data fetcher
//!
//! Spot prices come from the chart endpoint (last daily close), option
//! expirations and chains from the options endpoint.
//!
//! Note: This is for educational/research purposes. Yahoo Finance
//! data is delayed ~15 minutes and intended for personal use.

use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::{OptionQuote, OptionType, QuoteChain, SurfaceError, SurfaceResult};

use super::gateway::{no_history_message, MarketDataGateway};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance API client
pub struct YahooClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> SurfaceResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| SurfaceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at another host (mirrors, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> SurfaceResult<T> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| SurfaceError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SurfaceError::not_found(format!("{} returned 404", url)));
        }

        response
            .error_for_status()
            .map_err(|e| SurfaceError::Network(e.to_string()))?
            .json()
            .map_err(|e| SurfaceError::Serialization(format!("Failed to parse response: {}", e)))
    }

    fn options_url(&self, symbol: &str) -> String {
        format!("{}/v7/finance/options/{}", self.base_url, symbol)
    }

    fn fetch_options(&self, url: &str) -> SurfaceResult<YahooOptionChainData> {
        let response: YahooOptionsResponse = self.get_json(url)?;

        response
            .option_chain
            .result
            .into_iter()
            .next()
            .ok_or_else(|| SurfaceError::unavailable("No options data returned"))
    }
}

impl MarketDataGateway for YahooClient {
    /// Last daily close
    fn spot_price(&self, ticker: &str) -> SurfaceResult<f64> {
        let url = format!(
            "{}/v8/finance/chart/{}?range=1d&interval=1d",
            self.base_url, ticker
        );

        let response: YahooChartResponse = match self.get_json(&url) {
            Ok(r) => r,
            Err(SurfaceError::NotFound(_)) => {
                return Err(SurfaceError::not_found(no_history_message(ticker)))
            }
            Err(e) => return Err(e),
        };

        response
            .chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|r| r.last_close())
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| SurfaceError::not_found(no_history_message(ticker)))
    }

    fn expirations(&self, ticker: &str) -> SurfaceResult<Vec<NaiveDate>> {
        let chain = self.fetch_options(&self.options_url(ticker))?;

        let mut expiries: Vec<NaiveDate> = chain
            .expiration_dates
            .iter()
            .filter_map(|&ts| DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()))
            .collect();
        expiries.sort();
        expiries.dedup();

        Ok(expiries)
    }

    fn option_chain(&self, ticker: &str, expiry: NaiveDate) -> SurfaceResult<QuoteChain> {
        // Yahoo keys expirations by midnight UTC
        let expiry_ts = expiry
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| SurfaceError::invalid_input(format!("Bad expiry {}", expiry)))?
            .and_utc()
            .timestamp();

        let url = format!("{}?date={}", self.options_url(ticker), expiry_ts);
        let data = self
            .fetch_options(&url)
            .map_err(|e| SurfaceError::unavailable(format!("{} {}: {}", ticker, expiry, e)))?;

        Ok(convert_chain(expiry, &data))
    }
}

fn convert_chain(expiry: NaiveDate, data: &YahooOptionChainData) -> QuoteChain {
    let mut chain = QuoteChain::new(expiry);

    if let Some(options) = data.options.first() {
        let sides = [
            (&options.calls, OptionType::Call),
            (&options.puts, OptionType::Put),
        ];
        for (quotes, option_type) in sides {
            for q in quotes {
                if let Some(strike) = q.strike {
                    chain.add(OptionQuote::new(strike, q.ask, option_type));
                }
            }
        }
    }

    chain
}

// Yahoo Finance API response structures

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooChartResult>>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    meta: YahooChartMeta,
    #[serde(default)]
    indicators: Option<YahooIndicators>,
}

impl YahooChartResult {
    /// Last non-null close, else the regular market price
    fn last_close(&self) -> Option<f64> {
        self.indicators
            .as_ref()
            .and_then(|i| i.quote.first())
            .and_then(|q| q.close.iter().rev().flatten().next().copied())
            .or(self.meta.regular_market_price)
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooIndicatorQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooIndicatorQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: YahooOptionChain,
}

#[derive(Debug, Deserialize)]
struct YahooOptionChain {
    #[serde(default)]
    result: Vec<YahooOptionChainData>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionChainData {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<YahooOptions>,
}

#[derive(Debug, Deserialize)]
struct YahooOptions {
    #[serde(default)]
    calls: Vec<YahooOptionData>,
    #[serde(default)]
    puts: Vec<YahooOptionData>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionData {
    strike: Option<f64>,
    ask: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_override() {
        let client = YahooClient::new()
            .unwrap()
            .with_base_url("http://localhost:8080/");
        assert_eq!(
            client.options_url("NFLX"),
            "http://localhost:8080/v7/finance/options/NFLX"
        );
        assert_eq!(
            YahooClient::new().unwrap().options_url("SPY"),
            "https://query1.finance.yahoo.com/v7/finance/options/SPY"
        );
    }

    #[test]
    fn test_parse_chart_last_close() {
        let json = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":101.0},
            "indicators":{"quote":[{"close":[99.5,100.25,null]}]}}],"error":null}}"#;
        let response: YahooChartResponse = serde_json::from_str(json).unwrap();
        let result = response.chart.result.unwrap();
        assert_eq!(result[0].last_close(), Some(100.25));
    }

    #[test]
    fn test_parse_chart_without_history() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let response: YahooChartResponse = serde_json::from_str(json).unwrap();
        assert!(response.chart.result.is_none());
    }

    #[test]
    fn test_convert_chain() {
        let json = r#"{"optionChain":{"result":[{"expirationDates":[1742515200],
            "options":[{"calls":[{"strike":100.0,"ask":5.1},{"strike":105.0}],
                        "puts":[{"strike":95.0,"ask":1.2},{"ask":3.0}]}]}]}}"#;
        let response: YahooOptionsResponse = serde_json::from_str(json).unwrap();
        let data = &response.option_chain.result[0];

        let expiry = NaiveDate::from_ymd_opt(2025, 3, 21).unwrap();
        let chain = convert_chain(expiry, data);

        assert_eq!(chain.calls.len(), 2);
        assert_eq!(chain.calls[1].ask, None);
        // Put without a strike is skipped
        assert_eq!(chain.puts, vec![OptionQuote::put(95.0, 1.2)]);

        let ts = data.expiration_dates[0];
        assert_eq!(DateTime::from_timestamp(ts, 0).unwrap().date_naive(), expiry);
    }

    #[test]
    #[ignore] // Requires network
    fn test_spot_price() {
        let client = YahooClient::new().unwrap();
        let spot = client.spot_price("SPY").unwrap();

        assert!(spot > 0.0);
        println!("SPY spot: {}", spot);
    }

    #[test]
    #[ignore] // Requires network
    fn test_get_option_chain() {
        let client = YahooClient::new().unwrap();
        let expiries = client.expirations("SPY").unwrap();

        if let Some(&expiry) = expiries.first() {
            let chain = client.option_chain("SPY", expiry).unwrap();

            println!("Chain for {}: {} calls, {} puts",
                expiry, chain.calls.len(), chain.puts.len());

            assert!(!chain.is_empty());
        }
    }
}
