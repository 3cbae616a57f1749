//! Contract filter
//!
//! Narrows raw chains to the contracts worth pricing: strikes inside the
//! absolute band, expiries inside the window. Both bounds are inclusive.

use chrono::NaiveDate;

use crate::core::{days_to_expiry, Contract, QuoteChain};

use super::ExpirationWindow;

/// Expirations inside the window, ascending and de-duplicated
pub fn select_expirations(
    expirations: &[NaiveDate],
    evaluation_date: NaiveDate,
    window: &ExpirationWindow,
) -> Vec<NaiveDate> {
    let mut selected: Vec<NaiveDate> = expirations
        .iter()
        .copied()
        .filter(|&expiry| window.contains_days(days_to_expiry(evaluation_date, expiry)))
        .collect();
    selected.sort();
    selected.dedup();
    selected
}

/// Strike and expiry filter for one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContractFilter {
    /// Lowest admitted strike
    pub lower: f64,
    /// Highest admitted strike
    pub upper: f64,
    pub window: ExpirationWindow,
    pub evaluation_date: NaiveDate,
}

impl ContractFilter {
    pub fn new(
        (lower, upper): (f64, f64),
        window: ExpirationWindow,
        evaluation_date: NaiveDate,
    ) -> Self {
        Self {
            lower,
            upper,
            window,
            evaluation_date,
        }
    }

    pub fn accepts_strike(&self, strike: f64) -> bool {
        strike >= self.lower && strike <= self.upper
    }

    pub fn accepts_expiry(&self, expiry: NaiveDate) -> bool {
        self.window
            .contains_days(days_to_expiry(self.evaluation_date, expiry))
    }

    /// Contracts from one chain, calls before puts
    pub fn filter_chain(&self, chain: &QuoteChain) -> Vec<Contract> {
        if !self.accepts_expiry(chain.expiry) {
            return Vec::new();
        }

        chain
            .quotes()
            .filter(|q| self.accepts_strike(q.strike))
            .filter_map(|q| {
                let ask = q.usable_ask()?;
                Some(Contract::new(
                    q.strike,
                    ask,
                    chain.expiry,
                    self.evaluation_date,
                    q.option_type,
                ))
            })
            .collect()
    }

    /// Contracts from every chain, in chain order
    pub fn filter(&self, chains: &[QuoteChain]) -> Vec<Contract> {
        chains.iter().flat_map(|c| self.filter_chain(c)).collect()
    }
}
