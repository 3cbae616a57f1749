//! Option contract definitions
//!
//! A [`Contract`] is a quote that survived filtering, stamped with its time
//! to maturity relative to the evaluation date. A [`PricedContract`] carries
//! the implied volatility recovered from its ask, if any.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Days per year used for time to maturity
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Days per week used for the surface's time axis
pub const DAYS_PER_WEEK: f64 = 7.0;

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Intrinsic value at given spot
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }

    /// Single-letter code, `c` or `p`
    pub fn code(&self) -> char {
        match self {
            OptionType::Call => 'c',
            OptionType::Put => 'p',
        }
    }
}

/// A filtered option contract ready for pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Strike price
    pub strike: f64,
    /// Ask price
    pub ask: f64,
    /// Expiration date
    pub expiry: NaiveDate,
    /// Time to maturity in years
    pub time_to_maturity_years: f64,
    /// Time to maturity in weeks
    pub time_to_maturity_weeks: f64,
    /// Option type (Call/Put)
    pub option_type: OptionType,
}

impl Contract {
    /// Build a contract, deriving maturities from the evaluation date
    pub fn new(
        strike: f64,
        ask: f64,
        expiry: NaiveDate,
        evaluation_date: NaiveDate,
        option_type: OptionType,
    ) -> Self {
        let days = days_to_expiry(evaluation_date, expiry) as f64;

        Self {
            strike,
            ask,
            expiry,
            time_to_maturity_years: days / DAYS_PER_YEAR,
            time_to_maturity_weeks: days / DAYS_PER_WEEK,
            option_type,
        }
    }
}

/// Whole days from `from` to `expiry` (negative once expired)
pub fn days_to_expiry(from: NaiveDate, expiry: NaiveDate) -> i64 {
    (expiry - from).num_days()
}

/// A contract together with its implied volatility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedContract {
    pub contract: Contract,
    /// `None` when the inversion failed
    pub implied_vol: Option<f64>,
}

impl PricedContract {
    pub fn new(contract: Contract, implied_vol: Option<f64>) -> Self {
        Self {
            contract,
            implied_vol,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.implied_vol.is_some()
    }
}
