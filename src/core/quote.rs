//! Option quote data
//!
//! Raw market quotes as returned by a market data gateway, before filtering.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::option::OptionType;

/// Option market quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    /// Strike price
    pub strike: f64,
    /// Ask price, absent when the venue shows no offer
    pub ask: Option<f64>,
    /// Option type (Call/Put)
    pub option_type: OptionType,
}

impl OptionQuote {
    pub fn new(strike: f64, ask: Option<f64>, option_type: OptionType) -> Self {
        Self {
            strike,
            ask,
            option_type,
        }
    }

    pub fn call(strike: f64, ask: f64) -> Self {
        Self::new(strike, Some(ask), OptionType::Call)
    }

    pub fn put(strike: f64, ask: f64) -> Self {
        Self::new(strike, Some(ask), OptionType::Put)
    }

    /// Usable ask: present, finite, non-negative
    pub fn usable_ask(&self) -> Option<f64> {
        self.ask.filter(|a| a.is_finite() && *a >= 0.0)
    }
}

/// Chain of quotes for a single expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteChain {
    /// Expiry date
    pub expiry: NaiveDate,
    /// Call quotes
    pub calls: Vec<OptionQuote>,
    /// Put quotes
    pub puts: Vec<OptionQuote>,
}

impl QuoteChain {
    pub fn new(expiry: NaiveDate) -> Self {
        Self {
            expiry,
            calls: Vec::new(),
            puts: Vec::new(),
        }
    }

    /// Add a quote to the side matching its option type
    pub fn add(&mut self, quote: OptionQuote) {
        match quote.option_type {
            OptionType::Call => self.calls.push(quote),
            OptionType::Put => self.puts.push(quote),
        }
    }

    /// Calls first, then puts
    pub fn quotes(&self) -> impl Iterator<Item = &OptionQuote> {
        self.calls.iter().chain(self.puts.iter())
    }

    pub fn len(&self) -> usize {
        self.calls.len() + self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }
}
