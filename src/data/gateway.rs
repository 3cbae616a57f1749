//! Market data gateway
//!
//! The pipeline only needs three reads: a spot price, the listed expirations,
//! and one chain per expiration. [`StaticGateway`] serves them from memory for
//! offline runs and tests.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::core::{QuoteChain, SurfaceError, SurfaceResult};

/// Read-only source of spot prices and option chains
pub trait MarketDataGateway {
    /// Latest spot price; `NotFound` when the ticker has no price history
    fn spot_price(&self, ticker: &str) -> SurfaceResult<f64>;

    /// Listed option expirations, ascending
    fn expirations(&self, ticker: &str) -> SurfaceResult<Vec<NaiveDate>>;

    /// Calls and puts for one expiration; `Unavailable` if it cannot be read
    fn option_chain(&self, ticker: &str, expiry: NaiveDate) -> SurfaceResult<QuoteChain>;
}

/// Message shown when a ticker has no price history
pub fn no_history_message(ticker: &str) -> String {
    format!(
        "No historical data found for {}. Please check the ticker symbol.",
        ticker
    )
}

/// Market snapshot for one ticker
#[derive(Debug, Clone, Default)]
pub struct TickerSnapshot {
    pub spot: Option<f64>,
    pub chains: BTreeMap<NaiveDate, QuoteChain>,
    /// Listed expirations whose chain fails to load
    pub unavailable: Vec<NaiveDate>,
}

/// In-memory gateway
#[derive(Debug, Clone, Default)]
pub struct StaticGateway {
    tickers: BTreeMap<String, TickerSnapshot>,
}

impl StaticGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spot price for a ticker
    pub fn with_spot(mut self, ticker: &str, spot: f64) -> Self {
        self.entry(ticker).spot = Some(spot);
        self
    }

    /// Register a chain; its expiry becomes a listed expiration
    pub fn with_chain(mut self, ticker: &str, chain: QuoteChain) -> Self {
        self.entry(ticker).chains.insert(chain.expiry, chain);
        self
    }

    /// List an expiration whose chain read fails
    pub fn with_unavailable_chain(mut self, ticker: &str, expiry: NaiveDate) -> Self {
        self.entry(ticker).unavailable.push(expiry);
        self
    }

    fn entry(&mut self, ticker: &str) -> &mut TickerSnapshot {
        self.tickers.entry(ticker.to_uppercase()).or_default()
    }

    fn snapshot(&self, ticker: &str) -> Option<&TickerSnapshot> {
        self.tickers.get(&ticker.to_uppercase())
    }
}

impl MarketDataGateway for StaticGateway {
    fn spot_price(&self, ticker: &str) -> SurfaceResult<f64> {
        self.snapshot(ticker)
            .and_then(|s| s.spot)
            .ok_or_else(|| SurfaceError::not_found(no_history_message(ticker)))
    }

    fn expirations(&self, ticker: &str) -> SurfaceResult<Vec<NaiveDate>> {
        let snapshot = self
            .snapshot(ticker)
            .ok_or_else(|| SurfaceError::not_found(format!("No options listed for {}", ticker)))?;

        let mut expirations: Vec<NaiveDate> = snapshot
            .chains
            .keys()
            .copied()
            .chain(snapshot.unavailable.iter().copied())
            .collect();
        expirations.sort();
        expirations.dedup();
        Ok(expirations)
    }

    fn option_chain(&self, ticker: &str, expiry: NaiveDate) -> SurfaceResult<QuoteChain> {
        self.snapshot(ticker)
            .and_then(|s| s.chains.get(&expiry))
            .cloned()
            .ok_or_else(|| {
                SurfaceError::unavailable(format!("No chain for {} expiring {}", ticker, expiry))
            })
    }
}
